//! Rendering
//!
//! The game draws through [`RenderSurface`]: rectangle fills, text and image
//! blits in a fixed-size pixel space. A Canvas2D surface backs the web build;
//! [`CommandList`] records draw calls for headless runs.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod commands;
pub mod hud;
pub mod visuals;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;
pub use commands::{CommandList, DrawCommand};

use glam::Vec2;
use thiserror::Error;

use crate::Color;
use crate::sim::{Rect, VisualId};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no element with id `{0}`")]
    MissingElement(String),
    #[error("element `{0}` is not a canvas")]
    NotACanvas(String),
    #[error("2d context unavailable")]
    NoContext,
}

/// Font used for text fills
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Font {
    pub size_px: f32,
    pub family: &'static str,
}

impl Font {
    pub fn new(size_px: f32, family: &'static str) -> Self {
        Self { size_px, family }
    }

    /// CSS shorthand, e.g. `20px serif`
    pub fn to_css(&self) -> String {
        format!("{}px {}", self.size_px, self.family)
    }
}

/// A fixed-size 2D drawing target
pub trait RenderSurface {
    fn size(&self) -> Vec2;
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn fill_text(&mut self, text: &str, pos: Vec2, font: Font, color: Color);
    fn measure_text(&mut self, text: &str, font: Font) -> f32;
    fn draw_image(&mut self, visual: VisualId, rect: Rect);

    /// Paint the whole surface
    fn clear(&mut self, color: Color) {
        let size = self.size();
        self.fill_rect(Rect::new(0.0, 0.0, size.x, size.y), color);
    }
}
