#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Explicit game session that owns every system and steps them per frame.
//!
//! Frame order is fixed: seed growth, then enemies, then the player. Enemies
//! see the player where the previous frame left it.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use sprout_core::{BlockValue, EnemyId, Event};
use sprout_system_behavior::{BehaviorTuning, Enemy, EnemyKind, PlayerView};
use sprout_system_inventory::{Inventory, InventoryError};
use sprout_system_movement::{MovementController, MovementTuning};
use sprout_system_pathfinding::{Connectivity, PathFinder};
use sprout_system_player::{Player, PlayerError, PlayerTuning};
use sprout_world::{GridWorld, WorldError, WorldOrigin, WorldStore, WorldTuning};
use thiserror::Error;

pub use sprout_system_player::PlayerIntent as FrameInput;

/// Everything needed to start a session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seed for every random decision made during the session.
    pub seed: u64,
    /// Levels allocated in the grid.
    pub levels: u32,
    /// Requested grid rows, overridden by the loaded dataset.
    pub rows: u32,
    /// Requested grid columns, overridden by the loaded dataset.
    pub columns: u32,
    /// World opened, or created, when the session starts.
    pub start_world: String,
    /// Neighbourhood used by enemy path searches.
    pub connectivity: Connectivity,
    /// World tunables.
    pub world: WorldTuning,
    /// Movement tunables.
    pub movement: MovementTuning,
    /// Enemy tunables.
    pub behavior: BehaviorTuning,
    /// Player tunables.
    pub player: PlayerTuning,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            levels: 1,
            rows: 24,
            columns: 32,
            start_world: "START".to_owned(),
            connectivity: Connectivity::Four,
            world: WorldTuning::default(),
            movement: MovementTuning::default(),
            behavior: BehaviorTuning::default(),
            player: PlayerTuning::default(),
        }
    }
}

/// Failures raised while starting or reshaping a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The world layer failed.
    #[error(transparent)]
    World(#[from] WorldError),
    /// The configured starting inventory is invalid.
    #[error("invalid starting inventory: {0}")]
    Inventory(#[from] InventoryError),
    /// The world has no player spawn marker.
    #[error("world `{world}` has no player spawn marker")]
    MissingSpawnMarker {
        /// World that was searched.
        world: String,
    },
}

/// Result of one [`Session::update`].
#[derive(Debug, Default)]
pub struct FrameReport {
    /// Events raised during the frame, in the order they happened.
    pub events: Vec<Event>,
    /// First world write that failed during the frame. The change is kept in
    /// memory and retried by a later write.
    pub persistence_error: Option<WorldError>,
    /// First interaction that named an item the inventory does not track.
    /// The interaction left the world unchanged.
    pub inventory_error: Option<InventoryError>,
}

/// A running game.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    world: GridWorld,
    pathfinder: PathFinder,
    movement: MovementController,
    inventory: Inventory,
    player: Player,
    enemies: Vec<Enemy>,
    rng: ChaCha8Rng,
    last_seen: PlayerView,
    frame: u64,
}

impl Session {
    /// Loads the template dataset, opens the starting world and spawns every
    /// actor found in it.
    pub fn new(config: SessionConfig, store: Box<dyn WorldStore>) -> Result<Self, SessionError> {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut world = GridWorld::init(
            config.levels,
            config.rows,
            config.columns,
            store,
            &config.world.generation.template,
        )?;
        world.set_tuning(config.world.clone());
        let origin = world.open_or_create(&config.start_world, &mut rng)?;
        tracing::info!(world = %config.start_world, ?origin, seed = config.seed, "session started");

        let inventory = Inventory::from_specs(&config.player.starting_items)?;
        let movement = MovementController::new(config.movement.clone());
        let pathfinder = PathFinder::new(config.connectivity);
        let (player, enemies) = spawn_actors(&mut world, &config)?;
        let last_seen = view_of(&player, &movement);

        Ok(Self {
            config,
            world,
            pathfinder,
            movement,
            inventory,
            player,
            enemies,
            rng,
            last_seen,
            frame: 0,
        })
    }

    /// Configuration the session was started with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The active world.
    #[must_use]
    pub fn world(&self) -> &GridWorld {
        &self.world
    }

    /// Mutable access to the active world, for tools and tests.
    pub fn world_mut(&mut self) -> &mut GridWorld {
        &mut self.world
    }

    /// The player.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Every enemy spawned in the active world, defeated ones included.
    #[must_use]
    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    /// The player's items.
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Frames simulated so far.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advances the simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: &FrameInput) -> FrameReport {
        let mut report = FrameReport::default();

        let growth = self.world.update_growth_timers(dt, &mut report.events);
        note(&mut report, growth);

        if !self.player.is_defeated() {
            for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_active()) {
                let outcome = enemy.update(
                    &self.world,
                    &mut self.pathfinder,
                    &self.movement,
                    self.last_seen,
                    dt,
                    &self.config.behavior,
                );
                let Some(damage) = outcome.contact_damage else {
                    continue;
                };
                if self.player.receive_hit(damage, &self.config.player) {
                    report.events.push(Event::PlayerHit {
                        enemy: enemy.id(),
                        damage,
                    });
                }
            }

            let player = self.player.update(
                &mut self.world,
                &mut self.inventory,
                &self.movement,
                input,
                dt,
                &mut self.rng,
                &self.config.player,
                &mut report.events,
            );
            match player {
                Ok(()) => {}
                Err(PlayerError::World(error)) => note(&mut report, Err(error)),
                Err(PlayerError::Inventory(error)) => {
                    let _ = report.inventory_error.get_or_insert(error);
                }
            }

            if input.attack {
                self.resolve_attack(&mut report.events);
            }
            if self.player.is_defeated() {
                tracing::info!(frame = self.frame, "player defeated");
                report.events.push(Event::PlayerDefeated);
            }
        }

        self.last_seen = view_of(&self.player, &self.movement);
        self.frame += 1;
        report
    }

    /// Leaves the active world for `name`, creating it when unknown, and
    /// spawns the actors found there. Health and inventory carry over.
    ///
    /// The player arrives on the world's door when it has one, otherwise on
    /// the spawn marker. A failed switch leaves the session in the world it
    /// was in.
    pub fn switch_world(&mut self, name: &str) -> Result<WorldOrigin, SessionError> {
        let origin = self.world.open_or_create(name, &mut self.rng)?;
        tracing::info!(world = name, ?origin, "switched world");

        let (spawned, enemies) = spawn_actors(&mut self.world, &self.config)?;
        let arrival = self
            .world
            .find_first(BlockValue::DOOR)
            .unwrap_or_else(|| spawned.cell());
        self.player.relocate(arrival);
        self.enemies = enemies;
        self.last_seen = view_of(&self.player, &self.movement);
        Ok(origin)
    }

    fn resolve_attack(&mut self, events: &mut Vec<Event>) {
        let tuning = &self.config.player;
        let origin = self.player.body().position(self.movement.tuning());
        for enemy in self.enemies.iter_mut().filter(|enemy| enemy.is_active()) {
            let position = enemy.body().position(self.movement.tuning());
            if origin.distance(position) > tuning.attack_reach {
                continue;
            }
            if enemy.take_damage(tuning.attack_damage) {
                events.push(Event::EnemyDefeated { enemy: enemy.id() });
            }
        }
    }
}

fn spawn_actors(
    world: &mut GridWorld,
    config: &SessionConfig,
) -> Result<(Player, Vec<Enemy>), SessionError> {
    let spawn = world
        .consume_marker(BlockValue::PLAYER_SPAWN)
        .ok_or_else(|| SessionError::MissingSpawnMarker {
            world: world.active_world().to_owned(),
        })?;
    let player = Player::spawn(spawn, &config.player);

    let mut enemies = Vec::new();
    for (marker, kind) in [
        (BlockValue::ENEMY_SPAWN, EnemyKind::Default),
        (BlockValue::BOSS_SPAWN, EnemyKind::Boss),
    ] {
        while let Some(cell) = world.consume_marker(marker) {
            let id = EnemyId::new(u32::try_from(enemies.len()).unwrap_or(u32::MAX));
            enemies.push(Enemy::spawn(id, kind, cell, spawn, &config.behavior));
        }
    }
    tracing::debug!(
        world = world.active_world(),
        player = %spawn,
        enemies = enemies.len(),
        "spawned actors"
    );
    Ok((player, enemies))
}

fn view_of(player: &Player, movement: &MovementController) -> PlayerView {
    PlayerView {
        cell: player.cell(),
        position: player.body().position(movement.tuning()),
    }
}

fn note(report: &mut FrameReport, result: sprout_world::Result<()>) {
    if let Err(error) = result {
        let _ = report.persistence_error.get_or_insert(error);
    }
}
