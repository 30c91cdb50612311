//! Scrolling ground strip

use super::entity::{Rect, VisualId, scroll_distance};
use crate::Viewport;
use crate::tuning::Tuning;

/// Ground image
pub const GROUND_VISUAL: VisualId = VisualId(5);

/// A tile wide enough to cover the screen, drawn twice so the seam never shows
#[derive(Debug, Clone)]
pub struct Ground {
    /// Left edge of the first tile (always in `(-width, 0]`)
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    base_speed: f32,
    scale_ratio: f32,
}

impl Ground {
    pub fn new(tuning: &Tuning, viewport: Viewport) -> Self {
        let height = tuning.ground_height * viewport.scale_ratio;
        Self {
            x: 0.0,
            y: viewport.height - height,
            width: tuning.ground_width * viewport.scale_ratio,
            height,
            base_speed: tuning.base_speed,
            scale_ratio: viewport.scale_ratio,
        }
    }

    pub fn update(&mut self, game_speed: f32, delta_time: f32) {
        self.x -= scroll_distance(self.base_speed, game_speed, delta_time, self.scale_ratio);
        if self.width > 0.0 && self.x < -self.width {
            self.x = self.x.rem_euclid(self.width) - self.width;
        }
    }

    /// Both tiles, left to right
    pub fn tiles(&self) -> [Rect; 2] {
        [
            Rect::new(self.x, self.y, self.width, self.height),
            Rect::new(self.x + self.width, self.y, self.width, self.height),
        ]
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrolls_with_shared_formula() {
        let mut ground = Ground::new(&Tuning::default(), Viewport::with_scale(2.0));
        ground.update(1.0, 10.0);
        // (0.5 + 1.0) * 10 * 2
        assert_eq!(ground.x, -30.0);
        assert_eq!(ground.y, 400.0 - 48.0);
    }

    #[test]
    fn test_wraps_after_a_full_tile() {
        let mut ground = Ground::new(&Tuning::default(), Viewport::default());
        ground.x = -2390.0;
        ground.update(0.5, 20.0);
        // Moved 20px to -2410, wrapped by one tile
        assert!((ground.x - (-10.0)).abs() < 1e-3);
        let [a, b] = ground.tiles();
        assert_eq!(b.pos.x, a.pos.x + 2400.0);
    }

    #[test]
    fn test_reset() {
        let mut ground = Ground::new(&Tuning::default(), Viewport::default());
        ground.update(1.0, 100.0);
        ground.reset();
        assert_eq!(ground.x, 0.0);
    }
}
