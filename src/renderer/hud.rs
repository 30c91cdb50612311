//! Score line and full-screen prompts

use glam::Vec2;

use super::{Font, RenderSurface};
use crate::Color;

pub const HUD_TEXT: Color = Color::rgb(82, 82, 80);

pub const GAME_OVER_TEXT: &str = "GAME OVER";
pub const START_TEXT: &str = "Tap Screen or Press Space To Start";

/// What the score line shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudState {
    pub score: f64,
    pub high_score: u64,
    pub stage: u32,
}

/// Whole score, zero-padded to six digits
pub fn pad_score(score: u64) -> String {
    format!("{score:06}")
}

/// Score, best and stage across the top right
pub fn draw_hud(surface: &mut dyn RenderSurface, hud: &HudState, scale_ratio: f32) {
    let font = Font::new(20.0 * scale_ratio, "serif");
    let y = 20.0 * scale_ratio;

    let score_x = surface.size().x - 75.0 * scale_ratio;
    let high_score_x = score_x - 200.0 * scale_ratio;
    let stage_x = score_x - 115.0 * scale_ratio;

    let score = hud.score.max(0.0).floor() as u64;
    surface.fill_text(&pad_score(score), Vec2::new(score_x, y), font, HUD_TEXT);
    surface.fill_text(
        &format!("HI {}", pad_score(hud.high_score)),
        Vec2::new(high_score_x, y),
        font,
        HUD_TEXT,
    );
    surface.fill_text(
        &format!("Stage: {}", hud.stage),
        Vec2::new(stage_x, y),
        font,
        HUD_TEXT,
    );
}

pub fn draw_game_over(surface: &mut dyn RenderSurface, scale_ratio: f32) {
    draw_centered(surface, GAME_OVER_TEXT, Font::new(70.0 * scale_ratio, "Verdana"));
}

pub fn draw_start_prompt(surface: &mut dyn RenderSurface, scale_ratio: f32) {
    draw_centered(surface, START_TEXT, Font::new(40.0 * scale_ratio, "Verdana"));
}

fn draw_centered(surface: &mut dyn RenderSurface, text: &str, font: Font) {
    let size = surface.size();
    let x = (size.x - surface.measure_text(text, font)) / 2.0;
    surface.fill_text(text, Vec2::new(x, size.y / 2.0), font, Color::GREY);
}
