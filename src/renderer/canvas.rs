//! Canvas2D render surface (WASM only)

use std::collections::HashMap;

use glam::Vec2;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

use super::{Font, RenderSurface, SurfaceError, visuals};
use crate::Color;
use crate::sim::{Rect, VisualId};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    images: HashMap<VisualId, HtmlImageElement>,
}

impl CanvasSurface {
    /// Look up the game canvas. Failing here means the game cannot run at all.
    pub fn from_element_id(id: &str) -> Result<Self, SurfaceError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| SurfaceError::MissingElement(id.to_string()))?;
        let canvas: HtmlCanvasElement = document
            .get_element_by_id(id)
            .ok_or_else(|| SurfaceError::MissingElement(id.to_string()))?
            .dyn_into()
            .map_err(|_| SurfaceError::NotACanvas(id.to_string()))?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .ok_or(SurfaceError::NoContext)?
            .dyn_into()
            .map_err(|_| SurfaceError::NoContext)?;

        Ok(Self {
            canvas,
            ctx,
            images: HashMap::new(),
        })
    }

    /// Resize the backing store to the viewport
    pub fn resize(&self, width: f32, height: f32) {
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
    }

    /// Start loading every image in the manifest. Images that fail to load
    /// are simply not drawn.
    pub fn load_images(&mut self) {
        for &(visual, path) in visuals::MANIFEST {
            match HtmlImageElement::new() {
                Ok(image) => {
                    image.set_src(path);
                    self.images.insert(visual, image);
                }
                Err(err) => log::warn!("Could not create image for {path}: {err:?}"),
            }
        }
        log::info!("Loading {} images", self.images.len());
    }
}

impl RenderSurface for CanvasSurface {
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            rect.pos.x as f64,
            rect.pos.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, font: Font, color: Color) {
        self.ctx.set_font(&font.to_css());
        self.ctx.set_fill_style_str(&color.to_css());
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }

    fn measure_text(&mut self, text: &str, font: Font) -> f32 {
        self.ctx.set_font(&font.to_css());
        self.ctx
            .measure_text(text)
            .map(|m| m.width() as f32)
            .unwrap_or(0.0)
    }

    fn draw_image(&mut self, visual: VisualId, rect: Rect) {
        let Some(image) = self.images.get(&visual) else {
            return;
        };
        if !image.complete() {
            return;
        }
        let _ = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            rect.pos.x as f64,
            rect.pos.y as f64,
            rect.size.x as f64,
            rect.size.y as f64,
        );
    }
}
