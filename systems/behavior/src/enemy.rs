use glam::{IVec2, Vec2};
use sprout_core::{AxisDirection, BlockedRange, CellCoord, EnemyId, TileQuery};
use sprout_system_movement::{Body, MoveOutcome, MovementController, VerticalState};
use sprout_system_pathfinding::PathFinder;

use crate::{commit_direction, direction_toward, Action, BehaviorTuning, EnemyKind, FsmState, Perception};

/// Where the player was when the enemy looked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerView {
    /// Tile the player is anchored to.
    pub cell: CellCoord,
    /// Fractional position of the player in tiles.
    pub position: Vec2,
}

/// Side effects of one enemy tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EnemyOutcome {
    /// Damage dealt to the player by contact this tick.
    pub contact_damage: Option<f32>,
}

/// An enemy actor with its body, health and behaviour state.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    kind: EnemyKind,
    body: Body,
    state: FsmState,
    counter: u32,
    facing: IVec2,
    health: f32,
    max_health: f32,
    active: bool,
}

impl Enemy {
    /// Spawns an idle enemy on `cell`, facing the player.
    #[must_use]
    pub fn spawn(
        id: EnemyId,
        kind: EnemyKind,
        cell: CellCoord,
        player: CellCoord,
        tuning: &BehaviorTuning,
    ) -> Self {
        let max_health = kind.max_health(tuning);
        Self {
            id,
            kind,
            body: Body::new(cell),
            state: FsmState::Idle,
            counter: 0,
            facing: direction_toward(cell, player),
            health: max_health,
            max_health,
            active: true,
        }
    }

    /// Identifier within the session.
    #[must_use]
    pub fn id(&self) -> EnemyId {
        self.id
    }

    /// Variant of the enemy.
    #[must_use]
    pub fn kind(&self) -> EnemyKind {
        self.kind
    }

    /// Body used for movement.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Current behaviour state.
    #[must_use]
    pub fn state(&self) -> FsmState {
        self.state
    }

    /// Ticks spent in the current state.
    #[must_use]
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// Unit direction the enemy is walking.
    #[must_use]
    pub fn facing(&self) -> IVec2 {
        self.facing
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Health the enemy started with.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether the enemy still takes part in the simulation.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Removes health and reports whether this hit defeated the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.active {
            return false;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.active = false;
            tracing::debug!(enemy = self.id.get(), "enemy defeated");
            return true;
        }
        false
    }

    /// Runs one behaviour tick followed by the vertical physics.
    ///
    /// `player` is the position the session last recorded, so an enemy reacts
    /// to where the player stood at the end of the previous frame.
    pub fn update<W>(
        &mut self,
        world: &W,
        pathfinder: &mut PathFinder,
        movement: &MovementController,
        player: PlayerView,
        dt: f32,
        tuning: &BehaviorTuning,
    ) -> EnemyOutcome
    where
        W: TileQuery + ?Sized,
    {
        if !self.active {
            return EnemyOutcome::default();
        }

        let perception = Perception {
            distance_to_player: self.body.index().distance(player.cell),
            health: self.health,
            max_health: self.max_health,
        };
        let decision = (self.kind.strategy())(self.state, self.counter, &perception, tuning);
        if decision.state != self.state {
            tracing::debug!(
                enemy = self.id.get(),
                from = ?self.state,
                to = ?decision.state,
                "enemy changed state"
            );
        }
        self.state = decision.state;
        self.counter = decision.counter;

        match decision.action {
            Action::Hold => {}
            Action::Wander => self.advance(world, movement, tuning),
            Action::Approach => {
                self.facing = direction_toward(self.body.index(), player.cell);
                self.advance(world, movement, tuning);
            }
            Action::Pursue => {
                if self.steer(world, pathfinder, player.cell, tuning) {
                    self.advance(world, movement, tuning);
                }
            }
            Action::Flee => {
                let retreat = self.retreat_target(world, player.cell, tuning);
                if self.steer(world, pathfinder, retreat, tuning) {
                    self.advance(world, movement, tuning);
                }
            }
            Action::Recover(amount) => {
                self.health = (self.health + amount).min(self.max_health);
            }
        }

        let outcome = EnemyOutcome {
            contact_damage: self.contact(player, movement, tuning),
        };
        let _ = movement.update_vertical(&mut self.body, world, dt, BlockedRange::SOLID);
        outcome
    }

    /// Faces along the first straight run of a path to `goal`. Returns
    /// `false`, leaving the facing alone, when there is no path to follow.
    fn steer<W>(
        &mut self,
        world: &W,
        pathfinder: &mut PathFinder,
        goal: CellCoord,
        tuning: &BehaviorTuning,
    ) -> bool
    where
        W: TileQuery + ?Sized,
    {
        let current = self.body.index();
        let path = pathfinder.find_path(world, current, goal, tuning.heuristic, tuning.path_weight);
        match commit_direction(current, &path) {
            Some(commit) => {
                self.facing = commit.direction;
                true
            }
            None => false,
        }
    }

    fn retreat_target<W>(&self, world: &W, player: CellCoord, tuning: &BehaviorTuning) -> CellCoord
    where
        W: TileQuery + ?Sized,
    {
        let current = self.body.index();
        let away = match (current.column() - player.column()).signum() {
            0 => 1,
            sign => sign,
        };
        let last_column = i32::try_from(world.dimensions().columns()).unwrap_or(i32::MAX) - 1;
        let column = (current.column() + away * tuning.flee_distance).clamp(0, last_column.max(0));
        CellCoord::new(column, current.row())
    }

    fn advance<W>(&mut self, world: &W, movement: &MovementController, tuning: &BehaviorTuning)
    where
        W: TileQuery + ?Sized,
    {
        let direction = match self.facing.x.signum() {
            -1 => Some(AxisDirection::Left),
            1 => Some(AxisDirection::Right),
            _ => None,
        };
        if let Some(direction) = direction {
            let outcome = movement.move_axis(&mut self.body, world, direction, BlockedRange::SOLID);
            if outcome == MoveOutcome::Blocked {
                self.facing.x = -self.facing.x;
            }
            if self.body.state() == VerticalState::Idle && movement.is_mid_air(&self.body, world) {
                movement.fall(&mut self.body);
            }
        }
        if self.facing.y > 0 && self.body.state() == VerticalState::Idle {
            movement.jump(&mut self.body, tuning.jump_velocity);
        }
    }

    fn contact(
        &mut self,
        player: PlayerView,
        movement: &MovementController,
        tuning: &BehaviorTuning,
    ) -> Option<f32> {
        if self.state != FsmState::Attack {
            return None;
        }
        let gap = (self.body.position(movement.tuning()) - player.position).abs();
        if gap.x > tuning.contact_reach || gap.y > tuning.contact_reach {
            return None;
        }
        self.state = FsmState::Patrol;
        self.counter = 0;
        Some(tuning.contact_damage)
    }
}
