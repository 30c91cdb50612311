//! Scrolling entities and axis-aligned boxes

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Non-owning handle to an image held by the render layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisualId(pub u32);

/// Axis-aligned rectangle covering `[x, x+w) × [y, y+h)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Half-open intersection test on both axes
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.pos.x < other.right()
            && other.pos.x < self.right()
            && self.pos.y < other.bottom()
            && other.pos.y < self.bottom()
    }
}

/// What a scrolling entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Ends the run on contact; id indexes the obstacle catalog
    Obstacle { id: u32 },
    /// Credited on contact; id indexes the item catalog
    Item { id: u32 },
}

impl EntityKind {
    pub fn id(&self) -> u32 {
        match *self {
            EntityKind::Obstacle { id } | EntityKind::Item { id } => id,
        }
    }
}

/// Anything the player can touch and the renderer can draw
pub trait Collidable {
    fn bounding_box(&self) -> Rect;
    fn visual(&self) -> VisualId;
}

/// A positioned, sized rectangle scrolled leftward each tick
#[derive(Debug, Clone, PartialEq)]
pub struct MovableEntity {
    pub kind: EntityKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub visual: VisualId,
}

impl MovableEntity {
    pub fn new(kind: EntityKind, pos: Vec2, size: Vec2, visual: VisualId) -> Self {
        Self {
            kind,
            pos,
            size,
            visual,
        }
    }

    /// Scroll left by the shared world speed
    #[inline]
    pub fn advance(&mut self, base_speed: f32, game_speed: f32, delta_time: f32, scale_ratio: f32) {
        self.pos.x -= scroll_distance(base_speed, game_speed, delta_time, scale_ratio);
    }

    /// Fully past the left edge
    #[inline]
    pub fn is_off_screen(&self) -> bool {
        self.pos.x <= -self.size.x
    }

    pub fn overlaps(&self, other: &impl Collidable) -> bool {
        self.bounding_box().overlaps(&other.bounding_box())
    }
}

impl Collidable for MovableEntity {
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

/// Horizontal distance every scrolling layer moves in one tick.
///
/// Ground, obstacles and items must all use this so they stay in lockstep.
#[inline]
pub fn scroll_distance(base_speed: f32, game_speed: f32, delta_time: f32, scale_ratio: f32) -> f32 {
    (base_speed + game_speed) * delta_time * scale_ratio
}
