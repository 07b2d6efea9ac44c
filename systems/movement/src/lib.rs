#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic microstep movement and collision shared by every actor.
//!
//! Each actor sits on a tile index plus a per-axis microstep counter. An actor
//! whose counter on an axis is non-zero spans two tiles along that axis, and
//! every collision check then tests both of them.

use glam::{IVec2, Vec2};
use serde::Deserialize;
use sprout_core::{AxisDirection, BlockedRange, CellCoord, Dimensions, TileQuery};

/// Tunables for the movement engine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    /// Microsteps per tile along the column axis.
    pub steps_per_tile_x: i32,
    /// Microsteps per tile along the row axis.
    pub steps_per_tile_y: i32,
    /// Vertical distance covered by one microstep, in physics units.
    pub micro_step_height: f32,
    /// Vertical acceleration applied while jumping or falling.
    pub gravity: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            steps_per_tile_x: 8,
            steps_per_tile_y: 8,
            micro_step_height: 2.0 / 24.0 / 8.0,
            gravity: -10.0,
        }
    }
}

/// Vertical sub-state of an actor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalState {
    /// Standing on something.
    Idle,
    /// Rising after a jump.
    Jump,
    /// Dropping under gravity.
    #[default]
    Fall,
}

/// Kinematics of the current vertical state.
///
/// Time accumulates from the moment the state was entered. Every update folds
/// the final velocity back into the initial velocity, so a jump slows down
/// faster the longer it lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VerticalMotion {
    state: VerticalState,
    initial_velocity: Vec2,
    final_velocity: Vec2,
    displacement: Vec2,
    elapsed: f32,
}

impl VerticalMotion {
    /// Current sub-state.
    #[must_use]
    pub const fn state(&self) -> VerticalState {
        self.state
    }

    /// Velocity the next integration starts from.
    #[must_use]
    pub const fn initial_velocity(&self) -> Vec2 {
        self.initial_velocity
    }

    /// Displacement produced by the last integration.
    #[must_use]
    pub const fn displacement(&self) -> Vec2 {
        self.displacement
    }

    /// Switches state, clearing the kinematics when the state changes.
    pub fn set_state(&mut self, state: VerticalState) {
        if self.state != state {
            *self = Self {
                state,
                ..Self::default()
            };
        }
    }

    /// Enters [`VerticalState::Jump`] with a fresh upward velocity, even when
    /// already jumping.
    pub fn launch(&mut self, velocity: f32) {
        *self = Self {
            state: VerticalState::Jump,
            initial_velocity: Vec2::new(0.0, velocity),
            ..Self::default()
        };
    }

    fn integrate(&mut self, dt: f32, gravity: Vec2) {
        self.elapsed += dt;
        let t = self.elapsed;
        self.final_velocity = self.initial_velocity + gravity * t;
        self.displacement = self.final_velocity * t - 0.5 * gravity * t * t;
        self.initial_velocity = self.final_velocity;
    }
}

/// Position and vertical motion of one actor.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
    index: CellCoord,
    micro_steps: IVec2,
    motion: VerticalMotion,
}

impl Body {
    /// Places a body on a tile, aligned and falling.
    #[must_use]
    pub fn new(index: CellCoord) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Tile the body is anchored to.
    #[must_use]
    pub const fn index(&self) -> CellCoord {
        self.index
    }

    /// Microstep counters along the column and row axes.
    #[must_use]
    pub const fn micro_steps(&self) -> IVec2 {
        self.micro_steps
    }

    /// Current vertical sub-state.
    #[must_use]
    pub const fn state(&self) -> VerticalState {
        self.motion.state
    }

    /// Vertical kinematics.
    #[must_use]
    pub const fn motion(&self) -> &VerticalMotion {
        &self.motion
    }

    /// Teleports the body onto a tile, aligned and falling.
    pub fn reset(&mut self, index: CellCoord) {
        *self = Self::new(index);
    }

    /// Position in fractional tiles, useful for distance checks.
    #[must_use]
    pub fn position(&self, tuning: &MovementTuning) -> Vec2 {
        Vec2::new(
            self.index.column() as f32
                + self.micro_steps.x as f32 / tuning.steps_per_tile_x.max(1) as f32,
            self.index.row() as f32
                + self.micro_steps.y as f32 / tuning.steps_per_tile_y.max(1) as f32,
        )
    }
}

/// Result of a single microstep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The step was taken.
    Moved,
    /// The destination was obstructed and the axis was snapped back.
    Blocked,
}

/// Tests whether the cells an actor occupies are free of obstructions.
///
/// `index` and `micro_steps` describe the actor after the step. The leading
/// edge in `direction` is tested, and both cells along the orthogonal axis
/// are tested when the orthogonal microstep counter is non-zero.
#[must_use]
pub fn check_position<W>(
    world: &W,
    index: CellCoord,
    micro_steps: IVec2,
    direction: AxisDirection,
    range: BlockedRange,
) -> bool
where
    W: TileQuery + ?Sized,
{
    let leading = match direction {
        AxisDirection::Left | AxisDirection::Down => index,
        AxisDirection::Right => index.offset(i32::from(micro_steps.x != 0), 0),
        AxisDirection::Up => index.offset(0, i32::from(micro_steps.y != 0)),
    };
    let straddle = if direction.is_horizontal() {
        (micro_steps.y != 0).then(|| leading.offset(0, 1))
    } else {
        (micro_steps.x != 0).then(|| leading.offset(1, 0))
    };

    std::iter::once(leading)
        .chain(straddle)
        .all(|cell| !range.contains(world.block_at(cell)))
}

/// Applies microstep moves and vertical physics against a tile world.
#[derive(Clone, Debug, Default)]
pub struct MovementController {
    tuning: MovementTuning,
}

impl MovementController {
    /// Creates a controller with the provided tunables.
    #[must_use]
    pub fn new(tuning: MovementTuning) -> Self {
        Self { tuning }
    }

    /// Tunables in effect.
    #[must_use]
    pub fn tuning(&self) -> &MovementTuning {
        &self.tuning
    }

    /// Advances the body one microstep along `direction`.
    ///
    /// When the occupied cells after the step fall inside `range` the tile
    /// index is restored and the axis counter zeroed. The index is clamped to
    /// the grid afterwards in every case. Callers that patrol flip their
    /// facing on [`MoveOutcome::Blocked`].
    pub fn move_axis<W>(
        &self,
        body: &mut Body,
        world: &W,
        direction: AxisDirection,
        range: BlockedRange,
    ) -> MoveOutcome
    where
        W: TileQuery + ?Sized,
    {
        let previous = body.index;
        let steps = IVec2::new(
            self.tuning.steps_per_tile_x.max(1),
            self.tuning.steps_per_tile_y.max(1),
        );

        match direction {
            AxisDirection::Left => {
                body.micro_steps.x -= 1;
                if body.micro_steps.x < 0 {
                    body.micro_steps.x = steps.x - 1;
                    body.index = body.index.offset(-1, 0);
                }
            }
            AxisDirection::Right => {
                body.micro_steps.x += 1;
                if body.micro_steps.x >= steps.x {
                    body.micro_steps.x = 0;
                    body.index = body.index.offset(1, 0);
                }
            }
            AxisDirection::Up => {
                body.micro_steps.y += 1;
                if body.micro_steps.y >= steps.y {
                    body.micro_steps.y = 0;
                    body.index = body.index.offset(0, 1);
                }
            }
            AxisDirection::Down => {
                body.micro_steps.y -= 1;
                if body.micro_steps.y < 0 {
                    body.micro_steps.y = steps.y - 1;
                    body.index = body.index.offset(0, -1);
                }
            }
        }

        let feasible = check_position(world, body.index, body.micro_steps, direction, range);
        if !feasible {
            body.index = previous;
            if direction.is_horizontal() {
                body.micro_steps.x = 0;
            } else {
                body.micro_steps.y = 0;
            }
        }
        self.constraint(body, direction, world.dimensions());

        if feasible {
            MoveOutcome::Moved
        } else {
            MoveOutcome::Blocked
        }
    }

    /// Clamps the tile index on the axis of `direction` to the grid, zeroing
    /// that axis counter when clamped.
    pub fn constraint(&self, body: &mut Body, direction: AxisDirection, dimensions: Dimensions) {
        let last_column = i32::try_from(dimensions.columns()).unwrap_or(i32::MAX) - 1;
        let last_row = i32::try_from(dimensions.rows()).unwrap_or(i32::MAX) - 1;
        let column = body.index.column();
        let row = body.index.row();

        match direction {
            AxisDirection::Left if column < 0 => {
                body.index = CellCoord::new(0, row);
                body.micro_steps.x = 0;
            }
            AxisDirection::Right if column >= last_column => {
                body.index = CellCoord::new(last_column.max(0), row);
                body.micro_steps.x = 0;
            }
            AxisDirection::Up if row >= last_row => {
                body.index = CellCoord::new(column, last_row.max(0));
                body.micro_steps.y = 0;
            }
            AxisDirection::Down if row < 0 => {
                body.index = CellCoord::new(column, 0);
                body.micro_steps.y = 0;
            }
            _ => {}
        }
    }

    /// Reports whether the body stands aligned above an empty cell.
    #[must_use]
    pub fn is_mid_air<W>(&self, body: &Body, world: &W) -> bool
    where
        W: TileQuery + ?Sized,
    {
        body.index.row() != 0
            && body.micro_steps.x == 0
            && world.block_at(body.index.offset(0, -1)).is_empty()
    }

    /// Reports whether any cell the body occupies or stands on lies in
    /// `range`.
    #[must_use]
    pub fn touches<W>(&self, body: &Body, world: &W, range: BlockedRange) -> bool
    where
        W: TileQuery + ?Sized,
    {
        let inside = !check_position(world, body.index, body.micro_steps, AxisDirection::Down, range);
        let below = body.micro_steps.y == 0
            && !check_position(
                world,
                body.index.offset(0, -1),
                body.micro_steps,
                AxisDirection::Down,
                range,
            );
        inside || below
    }

    /// Starts a jump with the provided upward velocity.
    pub fn jump(&self, body: &mut Body, velocity: f32) {
        body.motion.launch(velocity);
    }

    /// Starts falling unless already falling.
    pub fn fall(&self, body: &mut Body) {
        body.motion.set_state(VerticalState::Fall);
    }

    /// Integrates the vertical physics for `dt` seconds and resolves the
    /// resulting climb or drop against `range`.
    pub fn update_vertical<W>(
        &self,
        body: &mut Body,
        world: &W,
        dt: f32,
        range: BlockedRange,
    ) -> VerticalState
    where
        W: TileQuery + ?Sized,
    {
        let gravity = Vec2::new(0.0, self.tuning.gravity);
        match body.motion.state {
            VerticalState::Idle => {}
            VerticalState::Jump => {
                body.motion.integrate(dt, gravity);
                self.rise(body, world, range);
            }
            VerticalState::Fall => {
                body.motion.integrate(dt, gravity);
                self.descend(body, world, range);
            }
        }
        body.motion.state
    }

    fn displacement_steps(&self, body: &Body) -> i32 {
        let height = self.tuning.micro_step_height;
        if height <= 0.0 {
            return 0;
        }
        (body.motion.displacement.y / height) as i32
    }

    fn rise<W>(&self, body: &mut Body, world: &W, range: BlockedRange)
    where
        W: TileQuery + ?Sized,
    {
        let steps = self.tuning.steps_per_tile_y.max(1);
        let old_row = body.index.row();
        body.micro_steps.y += self.displacement_steps(body).max(0);
        while body.micro_steps.y >= steps {
            body.micro_steps.y -= steps;
            body.index = body.index.offset(0, 1);
        }
        self.constraint(body, AxisDirection::Up, world.dimensions());

        let column = body.index.column();
        for row in old_row..=body.index.row() {
            let crossed = CellCoord::new(column, row);
            if !check_position(world, crossed, body.micro_steps, AxisDirection::Up, range) {
                // An aligned body occupies `row` itself, so the hit is in that row.
                let top = if body.micro_steps.y == 0 && row > old_row {
                    row - 1
                } else {
                    row
                };
                body.index = CellCoord::new(column, top);
                body.micro_steps.y = 0;
                body.motion.set_state(VerticalState::Fall);
                break;
            }
        }

        if body.motion.state == VerticalState::Jump && body.motion.initial_velocity.y <= 0.0 {
            body.motion.set_state(VerticalState::Fall);
        }
    }

    fn descend<W>(&self, body: &mut Body, world: &W, range: BlockedRange)
    where
        W: TileQuery + ?Sized,
    {
        let steps = self.tuning.steps_per_tile_y.max(1);
        let old_row = body.index.row();
        body.micro_steps.y -= self.displacement_steps(body).abs();
        while body.micro_steps.y < 0 {
            body.micro_steps.y += steps;
            body.index = body.index.offset(0, -1);
        }
        self.constraint(body, AxisDirection::Down, world.dimensions());

        let column = body.index.column();
        for row in (body.index.row()..=old_row).rev() {
            let crossed = CellCoord::new(column, row);
            if !check_position(world, crossed, body.micro_steps, AxisDirection::Down, range) {
                let landed = if row == old_row { row } else { row + 1 };
                self.land(body, CellCoord::new(column, landed));
                return;
            }
        }

        let resting = body.micro_steps.y == 0
            && (body.index.row() == 0
                || !check_position(
                    world,
                    body.index.offset(0, -1),
                    body.micro_steps,
                    AxisDirection::Down,
                    range,
                ));
        if resting {
            self.land(body, body.index);
        }
    }

    fn land(&self, body: &mut Body, index: CellCoord) {
        body.index = index;
        body.micro_steps.y = 0;
        body.motion.set_state(VerticalState::Idle);
    }
}
