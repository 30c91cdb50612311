//! Recorded draw calls

use glam::Vec2;

use super::{Font, RenderSurface};
use crate::Color;
use crate::sim::{Rect, VisualId};

/// Average glyph advance as a fraction of font size, for text measurement
const GLYPH_ADVANCE: f32 = 0.6;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect { rect: Rect, color: Color },
    FillText { text: String, pos: Vec2, font: Font, color: Color },
    Image { visual: VisualId, rect: Rect },
}

/// A surface that only records what was drawn
#[derive(Debug, Clone)]
pub struct CommandList {
    size: Vec2,
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop recorded commands, typically once per frame
    pub fn clear_commands(&mut self) {
        self.commands.clear();
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn images(&self) -> impl Iterator<Item = (VisualId, Rect)> + '_ {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Image { visual, rect } => Some((*visual, *rect)),
            _ => None,
        })
    }
}

impl RenderSurface for CommandList {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect { rect, color });
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, font: Font, color: Color) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            pos,
            font,
            color,
        });
    }

    fn measure_text(&mut self, text: &str, font: Font) -> f32 {
        text.chars().count() as f32 * font.size_px * GLYPH_ADVANCE
    }

    fn draw_image(&mut self, visual: VisualId, rect: Rect) {
        self.commands.push(DrawCommand::Image { visual, rect });
    }
}
