//! Randomized spawning, scrolling and pruning of obstacles and items
//!
//! One controller per entity family. Each owns a countdown in simulation
//! milliseconds; when it runs out the controller asks an [`UnlockSource`]
//! which ids are eligible at the current stage, picks one uniformly and
//! places it off-screen to the right.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;

use super::entity::{Collidable, EntityKind, MovableEntity};
use crate::Viewport;
use crate::catalog::{ObstacleCatalog, SpawnTemplate};
use crate::tuning::{IntervalRange, Tuning};

/// Answers "which ids may spawn at this stage?"
pub trait UnlockSource {
    fn unlocked_ids(&self, stage: u32) -> &[u32];
}

impl UnlockSource for ObstacleCatalog {
    fn unlocked_ids(&self, _stage: u32) -> &[u32] {
        self.ids()
    }
}

/// Vertical placement of freshly spawned entities
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    /// Bottom edge resting on the viewport floor
    Ground,
    /// Uniform in `[min_y, viewport height - entity height]`
    Random { min_y: f32 },
}

/// Which family a controller spawns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnFamily {
    Obstacle,
    Item,
}

impl SpawnFamily {
    fn kind(self, id: u32) -> EntityKind {
        match self {
            SpawnFamily::Obstacle => EntityKind::Obstacle { id },
            SpawnFamily::Item => EntityKind::Item { id },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnerConfig {
    pub family: SpawnFamily,
    pub interval: IntervalRange,
    pub placement: Placement,
    pub base_speed: f32,
    pub spawn_x_factor: f32,
}

impl SpawnerConfig {
    pub fn obstacles(tuning: &Tuning) -> Self {
        Self {
            family: SpawnFamily::Obstacle,
            interval: tuning.obstacle_interval,
            placement: Placement::Ground,
            base_speed: tuning.base_speed,
            spawn_x_factor: tuning.spawn_x_factor,
        }
    }

    pub fn items(tuning: &Tuning) -> Self {
        Self {
            family: SpawnFamily::Item,
            interval: tuning.item_interval,
            placement: Placement::Random {
                min_y: tuning.min_spawn_y,
            },
            base_speed: tuning.base_speed,
            spawn_x_factor: tuning.spawn_x_factor,
        }
    }
}

pub struct SpawnController {
    config: SpawnerConfig,
    viewport: Viewport,
    /// Scaled templates by id
    templates: BTreeMap<u32, SpawnTemplate>,
    /// Milliseconds until the next spawn attempt
    countdown: f32,
    /// Active entities in spawn order
    entities: Vec<MovableEntity>,
}

impl SpawnController {
    pub fn new(config: SpawnerConfig, viewport: Viewport, rng: &mut impl Rng) -> Self {
        let mut spawner = Self {
            config,
            viewport,
            templates: BTreeMap::new(),
            countdown: 0.0,
            entities: Vec::new(),
        };
        spawner.reroll_countdown(rng);
        spawner
    }

    /// Install authored templates; they are scaled to the viewport here
    pub fn set_templates(&mut self, templates: BTreeMap<u32, SpawnTemplate>) {
        let scale = self.viewport.scale_ratio;
        self.templates = templates
            .into_iter()
            .map(|(id, t)| (id, t.scaled(scale)))
            .collect();
    }

    pub fn entities(&self) -> &[MovableEntity] {
        &self.entities
    }

    pub fn countdown(&self) -> f32 {
        self.countdown
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    /// Advance one tick: spawn when due, scroll everything, prune what left the screen
    pub fn update(
        &mut self,
        game_speed: f32,
        delta_time: f32,
        current_stage: u32,
        unlocks: &impl UnlockSource,
        rng: &mut impl Rng,
    ) {
        self.countdown -= delta_time;
        if self.countdown <= 0.0 {
            self.try_spawn(unlocks.unlocked_ids(current_stage), rng);
            self.reroll_countdown(rng);
        }

        let scale = self.viewport.scale_ratio;
        for entity in &mut self.entities {
            entity.advance(self.config.base_speed, game_speed, delta_time, scale);
        }
        self.entities.retain(|e| !e.is_off_screen());
    }

    /// Resolve at most one collision: the oldest overlapping entity is removed
    /// and its kind returned.
    pub fn collide_with(&mut self, other: &impl Collidable) -> Option<EntityKind> {
        let target = other.bounding_box();
        let index = self
            .entities
            .iter()
            .position(|e| e.bounding_box().overlaps(&target))?;
        Some(self.entities.remove(index).kind)
    }

    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.entities.clear();
        self.reroll_countdown(rng);
    }

    fn try_spawn(&mut self, eligible: &[u32], rng: &mut impl Rng) {
        let Some(&id) = eligible.choose(rng) else {
            log::debug!("{:?} spawn skipped: nothing unlocked", self.config.family);
            return;
        };
        let Some(template) = self.templates.get(&id).copied() else {
            log::warn!("{:?} spawn skipped: no template for id {id}", self.config.family);
            return;
        };

        let x = self.viewport.width * self.config.spawn_x_factor;
        let y = match self.config.placement {
            Placement::Ground => self.viewport.height - template.height,
            Placement::Random { min_y } => {
                let max_y = (self.viewport.height - template.height).max(min_y);
                rng.random_range(min_y..=max_y)
            }
        };

        log::debug!("Spawned {:?} {id} at ({x:.1}, {y:.1})", self.config.family);
        self.entities.push(MovableEntity::new(
            self.config.family.kind(id),
            Vec2::new(x, y),
            Vec2::new(template.width, template.height),
            template.visual,
        ));
    }

    fn reroll_countdown(&mut self, rng: &mut impl Rng) {
        let IntervalRange { min, max } = self.config.interval;
        self.countdown = rng.random_range(min..=max) as f32;
    }

    #[cfg(test)]
    pub(crate) fn push_entity(&mut self, entity: MovableEntity) {
        self.entities.push(entity);
    }
}
