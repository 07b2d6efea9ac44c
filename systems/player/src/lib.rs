#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player movement and the block interactions driven by input.

use glam::IVec2;
use rand::Rng;
use serde::Deserialize;
use sprout_core::{AxisDirection, BlockValue, BlockedRange, CellCoord, Event, ItemKind, TileQuery};
use sprout_system_inventory::{InventoryError, ItemSpec, ItemStore};
use sprout_system_movement::{Body, MovementController, VerticalState};
use sprout_world::{GridWorld, Persistence, WorldError};
use thiserror::Error;

/// Failures raised while the player interacts with the world.
#[derive(Debug, Error)]
pub enum PlayerError {
    /// A world write failed to persist. Its in-memory effect is kept.
    #[error(transparent)]
    World(#[from] WorldError),
    /// An interaction named an item the inventory does not track. The world
    /// is left untouched.
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// Tunables for the player.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Initial velocity of a jump.
    pub jump_velocity: f32,
    /// Whether one extra jump is allowed while airborne.
    pub double_jump: bool,
    /// Health at spawn.
    pub max_health: f32,
    /// Health drained per second while touching lava.
    pub lava_damage_per_second: f32,
    /// Distance, in tiles, at which an attack reaches enemies.
    pub attack_reach: f32,
    /// Health an attack removes from each enemy in reach.
    pub attack_damage: f32,
    /// Health an attack removes from the solid block the player faces.
    pub block_damage: f32,
    /// Seconds after a hit during which further hits are ignored.
    pub hit_cooldown_secs: f32,
    /// Inventory contents at the start of a session.
    pub starting_items: Vec<ItemSpec>,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        let stock = |kind: ItemKind, count| ItemSpec {
            name: kind.name().to_owned(),
            max: 64,
            count,
        };
        Self {
            jump_velocity: 2.0,
            double_jump: true,
            max_health: 100.0,
            lava_damage_per_second: 20.0,
            attack_reach: 3.0,
            attack_damage: 1.0,
            block_damage: 25.0,
            hit_cooldown_secs: 1.0,
            starting_items: vec![
                stock(ItemKind::GrassBlock, 10),
                stock(ItemKind::DirtBlock, 10),
                stock(ItemKind::GrassSeed, 10),
                stock(ItemKind::DirtSeed, 10),
                stock(ItemKind::Stone, 0),
                stock(ItemKind::Cheese, 0),
            ],
        }
    }
}

/// Player input for one frame.
///
/// `jump`, `attack` and `interact` are edges: they are set only on the frame
/// the button went down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayerIntent {
    /// Walk left.
    pub left: bool,
    /// Walk right.
    pub right: bool,
    /// Jump pressed.
    pub jump: bool,
    /// Attack pressed.
    pub attack: bool,
    /// Interact pressed.
    pub interact: bool,
    /// Cell to place the selected item into.
    pub place: Option<CellCoord>,
    /// Cell to harvest.
    pub harvest: Option<CellCoord>,
    /// Item used by `place`.
    pub selected_item: ItemKind,
}

impl Default for PlayerIntent {
    fn default() -> Self {
        Self {
            left: false,
            right: false,
            jump: false,
            attack: false,
            interact: false,
            place: None,
            harvest: None,
            selected_item: ItemKind::DirtBlock,
        }
    }
}

/// The player actor.
#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    body: Body,
    facing: IVec2,
    health: f32,
    max_health: f32,
    air_jump_used: bool,
    hit_cooldown: f32,
}

impl Player {
    /// Places a full-health player on `cell`, facing right.
    #[must_use]
    pub fn spawn(cell: CellCoord, tuning: &PlayerTuning) -> Self {
        Self {
            body: Body::new(cell),
            facing: IVec2::X,
            health: tuning.max_health,
            max_health: tuning.max_health,
            air_jump_used: false,
            hit_cooldown: 0.0,
        }
    }

    /// Body used for movement.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Tile the player is anchored to.
    #[must_use]
    pub fn cell(&self) -> CellCoord {
        self.body.index()
    }

    /// Unit direction of the last horizontal move.
    #[must_use]
    pub fn facing(&self) -> IVec2 {
        self.facing
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health at spawn.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether the player has run out of health.
    #[must_use]
    pub fn is_defeated(&self) -> bool {
        self.health <= 0.0
    }

    /// Moves the player onto `cell`, aligned and falling, keeping health.
    pub fn relocate(&mut self, cell: CellCoord) {
        self.body.reset(cell);
        self.air_jump_used = false;
    }

    /// Applies an enemy hit unless one landed within the cooldown window.
    pub fn receive_hit(&mut self, damage: f32, tuning: &PlayerTuning) -> bool {
        if self.hit_cooldown > 0.0 || self.is_defeated() {
            return false;
        }
        self.health -= damage;
        self.hit_cooldown = tuning.hit_cooldown_secs;
        tracing::debug!(damage, health = self.health, "player hit");
        true
    }

    /// Runs one frame of movement and block interaction.
    ///
    /// World writes that fail to persist keep their in-memory effect. The
    /// rest of the frame still runs and the first failure is returned.
    /// Interactions whose item is not in the inventory change nothing.
    #[allow(clippy::too_many_arguments)]
    pub fn update<S, R>(
        &mut self,
        world: &mut GridWorld,
        inventory: &mut S,
        movement: &MovementController,
        intent: &PlayerIntent,
        dt: f32,
        rng: &mut R,
        tuning: &PlayerTuning,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlayerError>
    where
        S: ItemStore + ?Sized,
        R: Rng,
    {
        self.hit_cooldown = (self.hit_cooldown - dt).max(0.0);
        self.walk(world, movement, intent);

        if intent.jump {
            self.jump(movement, tuning);
        }
        if movement.update_vertical(&mut self.body, world, dt, BlockedRange::SOLID)
            == VerticalState::Idle
        {
            self.air_jump_used = false;
        }

        let mut failure = None;
        let mut record = |result: Result<(), PlayerError>| {
            if let Err(error) = result {
                let _ = failure.get_or_insert(error);
            }
        };

        if intent.attack {
            record(self.strike(world, tuning, out_events));
        }
        if intent.interact {
            record(self.interact(world, rng, out_events));
        }
        if let Some(cell) = intent.place {
            record(self.place(world, inventory, cell, intent.selected_item, out_events));
        }
        if let Some(cell) = intent.harvest {
            record(harvest(world, inventory, cell, rng, out_events));
        }
        record(self.pick_up(world, inventory, out_events));

        if movement.touches(&self.body, world, BlockedRange::LAVA) {
            self.health -= tuning.lava_damage_per_second * dt;
        }

        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn walk(&mut self, world: &GridWorld, movement: &MovementController, intent: &PlayerIntent) {
        let direction = match (intent.left, intent.right) {
            (true, false) => AxisDirection::Left,
            (false, true) => AxisDirection::Right,
            _ => return,
        };
        self.facing = if direction == AxisDirection::Left {
            IVec2::NEG_X
        } else {
            IVec2::X
        };
        let _ = movement.move_axis(&mut self.body, world, direction, BlockedRange::SOLID);
        if self.body.state() == VerticalState::Idle && movement.is_mid_air(&self.body, world) {
            movement.fall(&mut self.body);
        }
    }

    fn jump(&mut self, movement: &MovementController, tuning: &PlayerTuning) {
        match self.body.state() {
            VerticalState::Idle => movement.jump(&mut self.body, tuning.jump_velocity),
            VerticalState::Jump | VerticalState::Fall if tuning.double_jump && !self.air_jump_used => {
                self.air_jump_used = true;
                movement.jump(&mut self.body, tuning.jump_velocity);
            }
            VerticalState::Jump | VerticalState::Fall => {}
        }
    }

    fn strike(
        &self,
        world: &mut GridWorld,
        tuning: &PlayerTuning,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlayerError> {
        let cell = self.body.index().offset(self.facing.x, 0);
        let value = world.block_at(cell);
        if !BlockedRange::SOLID.contains(value) || value == BlockValue::BEDROCK {
            return Ok(());
        }
        if world.damage_cell(cell, tuning.block_damage, out_events)? {
            tracing::debug!(%cell, %value, "block broken");
        }
        Ok(())
    }

    fn interact<R: Rng>(
        &self,
        world: &mut GridWorld,
        rng: &mut R,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlayerError> {
        let here = self.body.index();
        let candidates = [here.offset(self.facing.x, 0), here.offset(0, -1)];
        for cell in candidates {
            if world.open_chest(cell, rng, out_events)? {
                break;
            }
        }
        Ok(())
    }

    fn place<S>(
        &self,
        world: &mut GridWorld,
        inventory: &mut S,
        cell: CellCoord,
        item: ItemKind,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlayerError>
    where
        S: ItemStore + ?Sized,
    {
        let Some(value) = item.placed_block() else {
            return Ok(());
        };
        if cell == self.body.index() || !world.block_at(cell).is_empty() {
            return Ok(());
        }
        if !inventory.check_available(item.name()) {
            let _ = inventory.quantity(item.name())?;
            return Ok(());
        }

        let written = world.set_block(cell, value, Persistence::Sync);
        if matches!(written, Ok(false)) {
            return Ok(());
        }
        let _ = inventory.remove(item.name(), 1)?;
        out_events.push(Event::BlockPlaced { cell, value });
        let _ = written?;
        Ok(())
    }

    fn pick_up<S>(
        &self,
        world: &mut GridWorld,
        inventory: &mut S,
        out_events: &mut Vec<Event>,
    ) -> Result<(), PlayerError>
    where
        S: ItemStore + ?Sized,
    {
        let cell = self.body.index();
        let Some(item) = ItemKind::from_collectable(world.block_at(cell)) else {
            return Ok(());
        };
        let _ = inventory.add(item.name(), 1)?;
        out_events.push(Event::ItemCollected { item, quantity: 1 });
        let _ = world.set_block(cell, BlockValue::EMPTY, Persistence::Sync)?;
        Ok(())
    }
}

/// Yield of harvesting a cell: the item and its inclusive quantity range.
#[must_use]
pub fn harvest_yield(value: BlockValue) -> Option<(ItemKind, u32, u32)> {
    match value {
        BlockValue::GRASS_TREE => Some((ItemKind::GrassBlock, 1, 4)),
        BlockValue::DIRT_TREE => Some((ItemKind::DirtBlock, 1, 4)),
        BlockValue::GRASS => Some((ItemKind::GrassSeed, 1, 2)),
        BlockValue::DIRT => Some((ItemKind::DirtSeed, 1, 2)),
        _ => None,
    }
}

fn harvest<S, R>(
    world: &mut GridWorld,
    inventory: &mut S,
    cell: CellCoord,
    rng: &mut R,
    out_events: &mut Vec<Event>,
) -> Result<(), PlayerError>
where
    S: ItemStore + ?Sized,
    R: Rng,
{
    let previous = world.block_at(cell);
    let Some((item, low, high)) = harvest_yield(previous) else {
        return Ok(());
    };
    let quantity = rng.gen_range(low..=high);
    let _ = inventory.add(item.name(), quantity)?;
    out_events.push(Event::BlockHarvested { cell, previous });
    out_events.push(Event::ItemCollected { item, quantity });
    let _ = world.set_block(cell, BlockValue::EMPTY, Persistence::Sync)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{harvest_yield, Player, PlayerTuning};
    use sprout_core::{BlockValue, CellCoord, ItemKind};

    #[test]
    fn harvest_yields_blocks_from_trees_and_seeds_from_ground() {
        assert_eq!(
            harvest_yield(BlockValue::DIRT_TREE),
            Some((ItemKind::DirtBlock, 1, 4))
        );
        assert_eq!(
            harvest_yield(BlockValue::GRASS),
            Some((ItemKind::GrassSeed, 1, 2))
        );
        assert_eq!(harvest_yield(BlockValue::GRASS_SEED), None);
        assert_eq!(harvest_yield(BlockValue::BEDROCK), None);
    }

    #[test]
    fn hits_respect_the_cooldown() {
        let tuning = PlayerTuning::default();
        let mut player = Player::spawn(CellCoord::new(1, 1), &tuning);
        assert!(player.receive_hit(10.0, &tuning));
        assert!(!player.receive_hit(10.0, &tuning));
        assert_eq!(player.health(), 90.0);
    }

    #[test]
    fn default_stock_covers_every_placeable_block() {
        let tuning = PlayerTuning::default();
        let stocked: Vec<_> = tuning
            .starting_items
            .iter()
            .filter(|spec| spec.count > 0)
            .filter_map(|spec| ItemKind::from_name(&spec.name))
            .collect();
        assert_eq!(
            stocked,
            [
                ItemKind::GrassBlock,
                ItemKind::DirtBlock,
                ItemKind::GrassSeed,
                ItemKind::DirtSeed
            ]
        );
    }
}
