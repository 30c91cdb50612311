//! The runner: jump physics, run animation, collision box

use glam::Vec2;

use super::entity::{Collidable, Rect, VisualId};
use crate::Viewport;
use crate::tuning::Tuning;

pub const PLAYER_STANDING: VisualId = VisualId(1);
pub const PLAYER_RUN_1: VisualId = VisualId(2);
pub const PLAYER_RUN_2: VisualId = VisualId(3);

/// Gap between the player's feet and the floor (unscaled)
const STANDING_GAP: f32 = 1.5;

#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    standing_y: f32,
    /// A jump always rises at least to here
    min_jump_y: f32,
    /// Holding jump rises up to here
    max_jump_y: f32,
    jump_speed: f32,
    gravity: f32,
    scale_ratio: f32,
    jump_pressed: bool,
    jump_in_progress: bool,
    falling: bool,
    walk_frame_ms: f32,
    walk_timer: f32,
    visual: VisualId,
}

impl Player {
    pub fn new(tuning: &Tuning, viewport: Viewport) -> Self {
        let scale = viewport.scale_ratio;
        let size = Vec2::new(tuning.player_width, tuning.player_height) * scale;
        let standing_y = viewport.height - size.y - STANDING_GAP * scale;
        Self {
            pos: Vec2::new(10.0 * scale, standing_y),
            size,
            standing_y,
            min_jump_y: viewport.height - tuning.min_jump_height * scale,
            max_jump_y: viewport.height - tuning.max_jump_height * scale,
            jump_speed: tuning.jump_speed,
            gravity: tuning.gravity,
            scale_ratio: scale,
            jump_pressed: false,
            jump_in_progress: false,
            falling: false,
            walk_frame_ms: tuning.walk_frame_ms,
            walk_timer: tuning.walk_frame_ms,
            visual: PLAYER_STANDING,
        }
    }

    pub fn set_jump_pressed(&mut self, pressed: bool) {
        self.jump_pressed = pressed;
    }

    pub fn is_airborne(&self) -> bool {
        self.jump_in_progress
    }

    pub fn update(&mut self, game_speed: f32, delta_time: f32) {
        self.animate(game_speed, delta_time);
        self.jump(delta_time);
    }

    pub fn reset(&mut self) {
        self.pos.y = self.standing_y;
        self.jump_pressed = false;
        self.jump_in_progress = false;
        self.falling = false;
        self.walk_timer = self.walk_frame_ms;
        self.visual = PLAYER_STANDING;
    }

    fn animate(&mut self, game_speed: f32, delta_time: f32) {
        if self.jump_in_progress {
            self.visual = PLAYER_STANDING;
            return;
        }
        if self.walk_timer <= 0.0 {
            self.visual = if self.visual == PLAYER_RUN_1 {
                PLAYER_RUN_2
            } else {
                PLAYER_RUN_1
            };
            self.walk_timer = self.walk_frame_ms;
        }
        self.walk_timer -= delta_time * game_speed;
    }

    fn jump(&mut self, delta_time: f32) {
        if self.jump_pressed {
            self.jump_in_progress = true;
        }

        if self.jump_in_progress && !self.falling {
            let below_min = self.pos.y > self.min_jump_y;
            let can_extend = self.jump_pressed && self.pos.y > self.max_jump_y;
            if below_min || can_extend {
                self.pos.y -= self.jump_speed * delta_time * self.scale_ratio;
            } else {
                self.falling = true;
            }
        } else if self.pos.y < self.standing_y {
            self.pos.y =
                (self.pos.y + self.gravity * delta_time * self.scale_ratio).min(self.standing_y);
        } else {
            self.falling = false;
            self.jump_in_progress = false;
        }
    }
}

impl Collidable for Player {
    fn bounding_box(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    fn visual(&self) -> VisualId {
        self.visual
    }
}
