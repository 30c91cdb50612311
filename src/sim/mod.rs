//! Frame-driven simulation module
//!
//! All gameplay logic lives here:
//! - Variable timestep: every update takes the frame's `delta_time` in ms
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - Drawing goes through [`crate::renderer::RenderSurface`] only

pub mod entity;
pub mod ground;
pub mod player;
pub mod progression;
pub mod session;
pub mod spawner;

pub use entity::{Collidable, EntityKind, MovableEntity, Rect, VisualId, scroll_distance};
pub use ground::{GROUND_VISUAL, Ground};
pub use player::{PLAYER_RUN_1, PLAYER_RUN_2, PLAYER_STANDING, Player};
pub use progression::{DEFAULT_BACKGROUND, ProgressionEngine, STAGE_COLORS, StageChange};
pub use session::{Collaborators, Session, SessionConfig, SessionPhase, TickReport};
pub use spawner::{Placement, SpawnController, SpawnFamily, SpawnerConfig, UnlockSource};
