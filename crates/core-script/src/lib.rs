//! User-scripting surface.
//!
//! Scripts drive the document through a narrow, undo-aware API object: layer
//! access, layer creation, in-place image edits, typed parameter requests,
//! and message boxes. The host supplies a [`ScriptHost`] that renders the
//! parameter dialog and message boxes however it likes (a CLI host may answer
//! from flags); the core routes every mutation through the command history so
//! a script run undoes like any other edit.

use anyhow::{Context, Result};
use core_doc::{Document, Layer};
use core_history::History;
use core_history::commands::{AddLayer, LayerEdit};
use core_raster::{Color, RasterBuffer};
use std::collections::HashMap;
use tracing::info;

/// A value a script parameter can take.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamValue {
    Number(f64),
    Color(Color),
    Bool(bool),
}

/// Widget family for one parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamKind {
    Number { min: Option<f64>, max: Option<f64> },
    Color,
    Checkbox,
    Slider { min: f64, max: f64 },
}

/// One entry of the parameter list a script hands to
/// [`ScriptApi::get_parameters`].
#[derive(Clone, Debug, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub label: String,
    pub kind: ParamKind,
    pub default: ParamValue,
}

impl ParamSpec {
    pub fn number(name: impl Into<String>, label: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ParamKind::Number { min: None, max: None },
            default: ParamValue::Number(default),
        }
    }

    pub fn number_in(
        name: impl Into<String>,
        label: impl Into<String>,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            kind: ParamKind::Number {
                min: Some(min),
                max: Some(max),
            },
            ..Self::number(name, label, default)
        }
    }

    pub fn color(name: impl Into<String>, label: impl Into<String>, default: Color) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ParamKind::Color,
            default: ParamValue::Color(default),
        }
    }

    pub fn checkbox(name: impl Into<String>, label: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ParamKind::Checkbox,
            default: ParamValue::Bool(default),
        }
    }

    pub fn slider(
        name: impl Into<String>,
        label: impl Into<String>,
        default: f64,
        min: f64,
        max: f64,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ParamKind::Slider { min, max },
            default: ParamValue::Number(default),
        }
    }
}

pub type ParamValues = HashMap<String, ParamValue>;

/// Host-side services a running script can call out to.
pub trait ScriptHost {
    /// Ask the user to confirm the parameter values. `None` means the user
    /// cancelled and the script should stop.
    fn get_parameters(&mut self, specs: &[ParamSpec]) -> Option<ParamValues>;

    fn show_message_box(&mut self, title: &str, message: &str);
}

/// Host that confirms every parameter at its default and swallows message
/// boxes. Useful for batch runs and tests.
#[derive(Default)]
pub struct DefaultsHost;

impl ScriptHost for DefaultsHost {
    fn get_parameters(&mut self, specs: &[ParamSpec]) -> Option<ParamValues> {
        Some(
            specs
                .iter()
                .map(|s| (s.name.clone(), s.default))
                .collect(),
        )
    }

    fn show_message_box(&mut self, title: &str, message: &str) {
        info!(target: "script", title, message, "message_box");
    }
}

/// The `api` object handed to a running script.
pub struct ScriptApi<'a> {
    doc: &'a mut Document,
    history: &'a mut History,
    host: &'a mut dyn ScriptHost,
}

impl<'a> ScriptApi<'a> {
    pub fn new(
        doc: &'a mut Document,
        history: &'a mut History,
        host: &'a mut dyn ScriptHost,
    ) -> Self {
        Self { doc, history, host }
    }

    pub fn active_layer(&self) -> &Layer {
        self.doc.active_layer()
    }

    pub fn active_layer_index(&self) -> usize {
        self.doc.layers().active_index()
    }

    pub fn all_layers(&self) -> Vec<&Layer> {
        self.doc.layers().iter().collect()
    }

    /// Create a new layer on top of the stack; it becomes active. Returns its
    /// index. Undoable.
    pub fn create_layer(&mut self, name: &str) -> Result<usize> {
        let cmd = AddLayer::new(self.doc, name, None);
        self.history
            .push(self.doc, Box::new(cmd))
            .with_context(|| format!("creating layer {name:?}"))?;
        Ok(self.doc.layers().active_index())
    }

    /// Run `edit` over the image of the layer at `index`, as one undoable
    /// history entry.
    pub fn modify_layer(
        &mut self,
        index: usize,
        edit: impl FnMut(&mut RasterBuffer) + 'static,
    ) -> Result<()> {
        let cmd = LayerEdit::new(self.doc, index, edit);
        self.history
            .push(self.doc, Box::new(cmd))
            .with_context(|| format!("modifying layer {index}"))?;
        Ok(())
    }

    /// Ask the host to confirm script parameters. `None` means cancelled.
    pub fn get_parameters(&mut self, specs: &[ParamSpec]) -> Option<ParamValues> {
        self.host.get_parameters(specs)
    }

    pub fn show_message_box(&mut self, title: &str, message: &str) {
        self.host.show_message_box(title, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_raster::Rect;

    #[test]
    fn checkered_pattern_script_runs_and_undoes() {
        // The classic demo script: ask for two colors and a size, draw a
        // checkerboard onto a fresh layer.
        let mut doc = Document::new(8, 8);
        let mut history = History::new();
        let mut host = DefaultsHost;
        let mut api = ScriptApi::new(&mut doc, &mut history, &mut host);

        let specs = [
            ParamSpec::color("color1", "First Color", Color::rgb(255, 0, 0)),
            ParamSpec::color("color2", "Second Color", Color::rgb(0, 0, 255)),
            ParamSpec::number_in("size", "Square Size", 2.0, 1.0, 100.0),
        ];
        let values = api.get_parameters(&specs).expect("defaults host confirms");
        let (ParamValue::Color(c1), ParamValue::Color(c2), ParamValue::Number(size)) =
            (values["color1"], values["color2"], values["size"])
        else {
            panic!("typed defaults round-trip");
        };
        let size = size as i32;

        let layer = api.create_layer("Checkered Pattern").unwrap();
        api.modify_layer(layer, move |img| {
            for y in (0..img.height() as i32).step_by(size as usize) {
                for x in (0..img.width() as i32).step_by(size as usize) {
                    let c = if (x / size) % 2 == (y / size) % 2 { c1 } else { c2 };
                    img.fill_rect(Rect::new(x, y, size as u32, size as u32), c);
                }
            }
        })
        .unwrap();
        api.show_message_box("Script Finished", "Checkered pattern created.");

        assert_eq!(doc.layers().len(), 2);
        let img = &doc.layers().get(1).unwrap().image;
        assert_eq!(img.pixel(0, 0), Some(Color::rgb(255, 0, 0)));
        assert_eq!(img.pixel(2, 0), Some(Color::rgb(0, 0, 255)));
        assert_eq!(img.pixel(2, 2), Some(Color::rgb(255, 0, 0)));

        // Both script mutations unwind through the shared history.
        assert!(history.undo(&mut doc));
        assert!(doc.layers().get(1).unwrap().image.pixels().all(|c| c.is_transparent()));
        assert!(history.undo(&mut doc));
        assert_eq!(doc.layers().len(), 1);
    }

    #[test]
    fn all_layers_lists_in_stack_order() {
        let mut doc = Document::new(4, 4);
        let mut history = History::new();
        let mut host = DefaultsHost;
        let mut api = ScriptApi::new(&mut doc, &mut history, &mut host);
        api.create_layer("top").unwrap();
        let names: Vec<_> = api.all_layers().iter().map(|l| l.name().to_string()).collect();
        assert_eq!(names, vec!["Background", "top"]);
        assert_eq!(api.active_layer().name(), "top");
        assert_eq!(api.active_layer_index(), 1);
    }
}
