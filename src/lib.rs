//! Dash Runner - A side-scrolling endless runner
//!
//! Core modules:
//! - `sim`: Frame-driven simulation (spawning, scrolling, collisions, progression)
//! - `catalog`: Item/obstacle catalogs and the stage unlock map
//! - `telemetry`: Fire-and-forget gameplay events
//! - `renderer`: Render surface abstraction, HUD and overlays
//! - `platform`: Browser input mapping
//! - `persistence`: Key/value storage and local player identity
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod catalog;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod telemetry;
pub mod tuning;

pub use highscores::HighScore;
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical playfield size (everything is authored against this)
    pub const GAME_WIDTH: f32 = 800.0;
    pub const GAME_HEIGHT: f32 = 200.0;

    /// Game speed multiplier at session start
    pub const GAME_SPEED_START: f64 = 1.0;
    /// Game speed gained per millisecond of play
    pub const GAME_SPEED_INCREMENT: f64 = 0.000_000_1;

    /// Base scroll speed shared by ground, obstacles and items
    pub const BASE_SPEED: f32 = 0.5;

    /// Ground tile
    pub const GROUND_WIDTH: f32 = 2400.0;
    pub const GROUND_HEIGHT: f32 = 24.0;

    /// Player sprite is authored at 88x94 and shrunk to fit the 200px field
    pub const PLAYER_WIDTH: f32 = 88.0 / 1.5;
    pub const PLAYER_HEIGHT: f32 = 94.0 / 1.5;
    pub const MIN_JUMP_HEIGHT: f32 = 150.0;
    pub const MAX_JUMP_HEIGHT: f32 = GAME_HEIGHT;
    pub const JUMP_SPEED: f32 = 0.6;
    pub const GRAVITY: f32 = 0.4;
    /// Run animation frame duration (ms)
    pub const WALK_FRAME_MS: f32 = 200.0;

    /// Score gained per millisecond survived
    pub const SCORE_RATE: f64 = 0.01;
    /// Score needed per stage
    pub const STAGE_SCORE_INCREMENT: f64 = 500.0;

    /// Wall-clock delay before a restart input is honoured (ms)
    pub const RESTART_DEBOUNCE_MS: f64 = 1000.0;

    /// Spawn intervals (ms, inclusive)
    pub const OBSTACLE_INTERVAL_MIN: u32 = 500;
    pub const OBSTACLE_INTERVAL_MAX: u32 = 2000;
    pub const ITEM_INTERVAL_MIN: u32 = 0;
    pub const ITEM_INTERVAL_MAX: u32 = 12000;

    /// New entities appear this far right, as a multiple of viewport width
    pub const SPAWN_X_FACTOR: f32 = 1.5;
    /// Lowest y a floating item may spawn at
    pub const MIN_SPAWN_Y: f32 = 10.0;
}

/// Pixel-space playfield: the logical field scaled to fit the screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    /// Device scale applied to every authored size and speed
    pub scale_ratio: f32,
}

impl Viewport {
    /// Viewport at an explicit scale ratio
    pub fn with_scale(scale_ratio: f32) -> Self {
        Self {
            width: consts::GAME_WIDTH * scale_ratio,
            height: consts::GAME_HEIGHT * scale_ratio,
            scale_ratio,
        }
    }

    /// Fit the logical field into a screen, limited by whichever axis is tighter
    pub fn fit(screen_width: f32, screen_height: f32) -> Self {
        let scale_ratio = if screen_height <= 0.0 {
            1.0
        } else if screen_width / screen_height < consts::GAME_WIDTH / consts::GAME_HEIGHT {
            screen_width / consts::GAME_WIDTH
        } else {
            screen_height / consts::GAME_HEIGHT
        };
        Self::with_scale(scale_ratio)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::with_scale(1.0)
    }
}

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GREY: Color = Color::rgb(128, 128, 128);
    pub const LIGHT_BLUE: Color = Color::rgb(173, 216, 230);
    pub const LIGHT_GREEN: Color = Color::rgb(144, 238, 144);
    pub const LIGHT_CORAL: Color = Color::rgb(240, 128, 128);
    pub const LIGHT_GOLDENROD_YELLOW: Color = Color::rgb(250, 250, 210);
    pub const LIGHT_PINK: Color = Color::rgb(255, 182, 193);
    pub const LIGHT_YELLOW: Color = Color::rgb(255, 255, 224);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS `rgb()` form for canvas fill styles
    pub fn to_css(&self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_screen_limited_by_height() {
        let vp = Viewport::fit(2000.0, 400.0);
        assert_eq!(vp.scale_ratio, 2.0);
        assert_eq!(vp.width, 1600.0);
        assert_eq!(vp.height, 400.0);
    }

    #[test]
    fn test_color_css() {
        assert_eq!(Color::LIGHT_BLUE.to_css(), "rgb(173, 216, 230)");
    }

    #[test]
    fn test_fit_narrow_screen_limited_by_width() {
        let vp = Viewport::fit(400.0, 800.0);
        assert_eq!(vp.scale_ratio, 0.5);
        assert_eq!(vp.height, 100.0);
    }
}
