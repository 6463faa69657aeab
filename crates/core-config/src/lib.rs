//! Persisted editor configuration.
//!
//! Parses `pixel-portal.toml`: a sectioned key/value file covering undo
//! depth, new-document defaults, animation behavior, and the last AI prompt.
//! Unknown fields are ignored so older builds tolerate newer files; a missing
//! or unparseable file falls back to defaults rather than failing startup.
//! The `number_of_undos` entry is read once at startup (the history capacity
//! is fixed per session), everything else applies immediately.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Command history capacity. Applied at startup.
    #[serde(default = "GeneralConfig::default_number_of_undos")]
    pub number_of_undos: usize,
    #[serde(default)]
    pub mirror_around_pixel_center: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            number_of_undos: Self::default_number_of_undos(),
            mirror_around_pixel_center: false,
        }
    }
}

impl GeneralConfig {
    const fn default_number_of_undos() -> usize {
        100
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocumentConfig {
    #[serde(default = "NewDocumentConfig::default_dimension")]
    pub width: u32,
    #[serde(default = "NewDocumentConfig::default_dimension")]
    pub height: u32,
    /// Integer view scale a fresh canvas opens at.
    #[serde(default = "NewDocumentConfig::default_pixel_size")]
    pub pixel_size: u32,
    #[serde(default = "NewDocumentConfig::default_layers")]
    pub layers: u32,
    /// Hex color (`#rrggbb` or `#rrggbbaa`) the first layer is filled with.
    #[serde(default = "NewDocumentConfig::default_fill")]
    pub first_layer_fill_color: String,
}

impl Default for NewDocumentConfig {
    fn default() -> Self {
        Self {
            width: Self::default_dimension(),
            height: Self::default_dimension(),
            pixel_size: Self::default_pixel_size(),
            layers: Self::default_layers(),
            first_layer_fill_color: Self::default_fill(),
        }
    }
}

impl NewDocumentConfig {
    const fn default_dimension() -> u32 {
        64
    }
    const fn default_pixel_size() -> u32 {
        8
    }
    const fn default_layers() -> u32 {
        1
    }
    fn default_fill() -> String {
        "#00000000".into()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default = "AnimationConfig::default_fps")]
    pub fps: u32,
    #[serde(default = "AnimationConfig::default_total_frames")]
    pub total_frames: usize,
    /// After inserting a key, step the current frame to the next one.
    #[serde(default)]
    pub key_insert_move_to_next: bool,
    /// Hide the layers of the previously keyed frame.
    #[serde(default)]
    pub key_insert_hide_current: bool,
    /// Seed the new key with a copy of the current frame.
    #[serde(default = "AnimationConfig::default_true")]
    pub key_insert_duplicate: bool,
    /// Add a fresh blank layer on top of the new key's stack. When combined
    /// with `key_insert_duplicate`, duplication runs first.
    #[serde(default)]
    pub key_insert_new_layer: bool,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: Self::default_fps(),
            total_frames: Self::default_total_frames(),
            key_insert_move_to_next: false,
            key_insert_hide_current: false,
            key_insert_duplicate: true,
            key_insert_new_layer: false,
        }
    }
}

impl AnimationConfig {
    const fn default_fps() -> u32 {
        8
    }
    const fn default_total_frames() -> usize {
        8
    }
    const fn default_true() -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub last_prompt: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub new_document: NewDocumentConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub ai: AiConfig,
}

/// Loaded configuration plus the path it persists to.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub file: ConfigFile,
    path: Option<PathBuf>,
}

/// Best-effort config path: `pixel-portal.toml` in the working directory
/// first, then the platform config dir.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("pixel-portal.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("pixel-portal").join("pixel-portal.toml");
    }
    PathBuf::from("pixel-portal.toml")
}

/// Load from `path` (or the discovered location). Missing files and parse
/// errors yield defaults; parse errors are logged.
pub fn load_from(path: Option<PathBuf>) -> Config {
    let path = path.unwrap_or_else(discover);
    let file = match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str::<ConfigFile>(&content) {
            Ok(file) => file,
            Err(err) => {
                warn!(target: "config", path = %path.display(), %err, "parse_failed_using_defaults");
                ConfigFile::default()
            }
        },
        Err(_) => ConfigFile::default(),
    };
    Config {
        file,
        path: Some(path),
    }
}

impl Config {
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the current values back to the loaded path (creating parent
    /// directories as needed).
    pub fn save(&self) -> Result<()> {
        let path = self
            .path
            .as_ref()
            .context("configuration has no backing path")?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(&self.file).context("serializing configuration")?;
        fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
        info!(target: "config", path = %path.display(), "saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml")));
        assert_eq!(cfg.file.general.number_of_undos, 100);
        assert_eq!(cfg.file.new_document.width, 64);
        assert_eq!(cfg.file.animation.fps, 8);
        assert!(cfg.file.animation.key_insert_duplicate);
        assert_eq!(cfg.file.ai.last_prompt, "");
    }

    #[test]
    fn parses_all_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            r##"
[general]
number_of_undos = 50
mirror_around_pixel_center = true

[new_document]
width = 32
height = 48
pixel_size = 4
layers = 2
first_layer_fill_color = "#ffffff"

[animation]
fps = 12
total_frames = 24
key_insert_move_to_next = true

[ai]
last_prompt = "pixel art castle"
"##,
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf()));
        assert_eq!(cfg.file.general.number_of_undos, 50);
        assert!(cfg.file.general.mirror_around_pixel_center);
        assert_eq!(cfg.file.new_document.height, 48);
        assert_eq!(cfg.file.new_document.first_layer_fill_color, "#ffffff");
        assert_eq!(cfg.file.animation.total_frames, 24);
        assert!(cfg.file.animation.key_insert_move_to_next);
        assert!(cfg.file.animation.key_insert_duplicate, "default survives partial section");
        assert_eq!(cfg.file.ai.last_prompt, "pixel art castle");
    }

    #[test]
    fn parse_error_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[general]\nnumber_of_undos = \"many\"\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf()));
        assert_eq!(cfg.file.general.number_of_undos, 100);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[general]\nfuture_flag = true\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf()));
        assert_eq!(cfg.file.general.number_of_undos, 100);
    }

    #[test]
    fn save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixel-portal.toml");
        let mut cfg = load_from(Some(path.clone()));
        cfg.file.ai.last_prompt = "tiny dragon".into();
        cfg.file.general.number_of_undos = 7;
        cfg.save().unwrap();
        let back = load_from(Some(path));
        assert_eq!(back.file.ai.last_prompt, "tiny dragon");
        assert_eq!(back.file.general.number_of_undos, 7);
    }
}
