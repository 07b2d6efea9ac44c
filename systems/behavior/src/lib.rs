#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Enemy decision making.
//!
//! State transitions are pure functions of the current state, the tick
//! counter and what the enemy perceives. Each [`EnemyKind`] owns one such
//! function. [`Enemy`] executes the resulting [`Action`] against the world.

mod enemy;

use glam::IVec2;
use serde::Deserialize;
use sprout_core::CellCoord;
use sprout_system_pathfinding::Heuristic;

pub use enemy::{Enemy, EnemyOutcome, PlayerView};

/// Tunables shared by every enemy.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Ticks a counter-gated state lasts before it moves on.
    pub max_fsm_counter: u32,
    /// Distance at which a regular enemy starts chasing.
    pub attack_radius: f32,
    /// Distance at which the boss starts its melee attack.
    pub boss_attack_radius: f32,
    /// Distance inside which the boss defends instead of resting.
    pub boss_guard_radius: f32,
    /// Fraction of maximum health below which the boss defends.
    pub boss_defend_health_ratio: f32,
    /// Health the boss regains per counter interval while healing.
    pub heal_amount: f32,
    /// Largest per-axis gap, in tiles, at which an attacking enemy hits.
    pub contact_reach: f32,
    /// Health removed from the player by a hit.
    pub contact_damage: f32,
    /// Heuristic weight used for chase paths.
    pub path_weight: u32,
    /// Heuristic used for chase paths.
    pub heuristic: Heuristic,
    /// Columns the boss tries to put between itself and the player.
    pub flee_distance: i32,
    /// Initial velocity of an enemy jump.
    pub jump_velocity: f32,
    /// Starting health of a regular enemy.
    pub default_health: f32,
    /// Starting health of the boss.
    pub boss_health: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            max_fsm_counter: 60,
            attack_radius: 10.0,
            boss_attack_radius: 2.0,
            boss_guard_radius: 5.0,
            boss_defend_health_ratio: 0.5,
            heal_amount: 1.0,
            contact_reach: 0.9,
            contact_damage: 10.0,
            path_weight: 10,
            heuristic: Heuristic::Euclidean,
            flee_distance: 6,
            jump_velocity: 3.5,
            default_health: 5.0,
            boss_health: 10.0,
        }
    }
}

/// Enemy variants, each with its own transition table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyKind {
    /// Idles, patrols and chases the player.
    Default,
    /// Fights at melee range, retreats when hurt and heals while alone.
    Boss,
}

/// Transition function owned by an [`EnemyKind`].
pub type Strategy = fn(FsmState, u32, &Perception, &BehaviorTuning) -> Decision;

impl EnemyKind {
    /// Transition function for the variant.
    #[must_use]
    pub fn strategy(self) -> Strategy {
        match self {
            EnemyKind::Default => default_strategy,
            EnemyKind::Boss => boss_strategy,
        }
    }

    /// Starting health for the variant.
    #[must_use]
    pub fn max_health(self, tuning: &BehaviorTuning) -> f32 {
        match self {
            EnemyKind::Default => tuning.default_health,
            EnemyKind::Boss => tuning.boss_health,
        }
    }
}

/// Behaviour states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FsmState {
    /// Standing still.
    #[default]
    Idle,
    /// Walking back and forth.
    Patrol,
    /// Chasing the player.
    Attack,
    /// Retreating from the player. Boss only.
    Defend,
    /// Regaining health. Boss only.
    Heal,
}

/// What an enemy knows about the current tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Perception {
    /// Straight-line distance to the player in tiles.
    pub distance_to_player: f32,
    /// Current health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
}

/// Work an enemy performs this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Stay put.
    Hold,
    /// Keep walking the current facing, turning around at obstacles.
    Wander,
    /// Face the player directly and walk.
    Approach,
    /// Follow a path to the player.
    Pursue,
    /// Follow a path away from the player.
    Flee,
    /// Regain health.
    Recover(f32),
}

/// Outcome of a transition function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Decision {
    /// State after the tick.
    pub state: FsmState,
    /// Counter after the tick.
    pub counter: u32,
    /// Work to perform.
    pub action: Action,
}

impl Decision {
    const fn new(state: FsmState, counter: u32, action: Action) -> Self {
        Self {
            state,
            counter,
            action,
        }
    }

    const fn enter(state: FsmState) -> Self {
        Self::new(state, 0, Action::Hold)
    }
}

fn default_strategy(
    state: FsmState,
    counter: u32,
    perception: &Perception,
    tuning: &BehaviorTuning,
) -> Decision {
    let expired = counter > tuning.max_fsm_counter;
    let near = perception.distance_to_player < tuning.attack_radius;

    match state {
        FsmState::Idle if expired => Decision::enter(FsmState::Patrol),
        FsmState::Idle => Decision::new(FsmState::Idle, counter + 1, Action::Hold),
        FsmState::Patrol if expired => Decision::enter(FsmState::Idle),
        FsmState::Patrol if near => Decision::enter(FsmState::Attack),
        FsmState::Patrol => Decision::new(FsmState::Patrol, counter + 1, Action::Wander),
        FsmState::Attack if near => Decision::new(FsmState::Attack, counter, Action::Pursue),
        FsmState::Attack if expired => Decision::enter(FsmState::Patrol),
        FsmState::Attack => Decision::new(FsmState::Attack, counter + 1, Action::Hold),
        FsmState::Defend | FsmState::Heal => Decision::enter(FsmState::Idle),
    }
}

fn boss_strategy(
    state: FsmState,
    counter: u32,
    perception: &Perception,
    tuning: &BehaviorTuning,
) -> Decision {
    let expired = counter > tuning.max_fsm_counter;
    let distance = perception.distance_to_player;
    let in_melee = distance < tuning.boss_attack_radius;
    let guarded = distance < tuning.boss_guard_radius;
    let hurt = perception.health < perception.max_health;
    let weak = perception.health < perception.max_health * tuning.boss_defend_health_ratio;

    match state {
        FsmState::Idle if expired && hurt => Decision::enter(FsmState::Heal),
        FsmState::Idle if expired => Decision::enter(FsmState::Patrol),
        FsmState::Idle => Decision::new(FsmState::Idle, counter + 1, Action::Hold),
        FsmState::Patrol if expired => Decision::enter(FsmState::Idle),
        FsmState::Patrol if in_melee => Decision::enter(FsmState::Attack),
        FsmState::Patrol => Decision::new(FsmState::Patrol, counter + 1, Action::Approach),
        FsmState::Attack if in_melee && weak => Decision::enter(FsmState::Defend),
        FsmState::Attack if in_melee => Decision::new(FsmState::Attack, counter, Action::Pursue),
        FsmState::Attack if expired => Decision::enter(FsmState::Patrol),
        FsmState::Attack => Decision::new(FsmState::Attack, counter + 1, Action::Hold),
        FsmState::Defend if guarded => Decision::new(FsmState::Defend, counter, Action::Flee),
        FsmState::Defend => Decision::enter(FsmState::Idle),
        FsmState::Heal if guarded => Decision::enter(FsmState::Defend),
        FsmState::Heal if !hurt => Decision::enter(FsmState::Idle),
        FsmState::Heal if expired => {
            Decision::new(FsmState::Heal, 0, Action::Recover(tuning.heal_amount))
        }
        FsmState::Heal => Decision::new(FsmState::Heal, counter + 1, Action::Hold),
    }
}

/// Direction and furthest cell an enemy commits to along a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Commit {
    /// Last consecutive path cell reached by repeating `direction`.
    pub destination: CellCoord,
    /// Unit step from the current tile to the first path cell.
    pub direction: IVec2,
}

/// Extracts the straight run at the start of `path`.
///
/// The first cell fixes the direction; later cells extend the destination
/// only while each one lies exactly one `direction` step beyond it.
#[must_use]
pub fn commit_direction(current: CellCoord, path: &[CellCoord]) -> Option<Commit> {
    let (&first, rest) = path.split_first()?;
    let direction = IVec2::new(first.column() - current.column(), first.row() - current.row());
    let mut destination = first;
    for &cell in rest {
        let step = IVec2::new(
            cell.column() - destination.column(),
            cell.row() - destination.row(),
        );
        if step != direction {
            break;
        }
        destination = cell;
    }
    Some(Commit {
        destination,
        direction,
    })
}

/// Rounded unit direction from one tile toward another.
#[must_use]
pub fn direction_toward(from: CellCoord, to: CellCoord) -> IVec2 {
    let delta = IVec2::new(to.column() - from.column(), to.row() - from.row()).as_vec2();
    let distance = delta.length();
    if distance < 0.01 {
        return IVec2::ZERO;
    }
    (delta / distance).round().as_ivec2()
}

#[cfg(test)]
mod tests {
    use super::{
        commit_direction, direction_toward, Action, BehaviorTuning, Commit, EnemyKind, FsmState,
        Perception,
    };
    use glam::IVec2;
    use sprout_core::CellCoord;

    fn perceive(distance: f32, health: f32, max_health: f32) -> Perception {
        Perception {
            distance_to_player: distance,
            health,
            max_health,
        }
    }

    #[test]
    fn idle_waits_for_the_counter_before_patrolling() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Default.strategy();
        let far = perceive(20.0, 5.0, 5.0);

        let waiting = step(FsmState::Idle, 60, &far, &tuning);
        assert_eq!(waiting.state, FsmState::Idle);
        assert_eq!(waiting.counter, 61);

        let moving = step(FsmState::Idle, 61, &far, &tuning);
        assert_eq!(moving.state, FsmState::Patrol);
        assert_eq!(moving.counter, 0);
    }

    #[test]
    fn patrol_switches_to_attack_inside_radius() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Default.strategy();

        let wander = step(FsmState::Patrol, 3, &perceive(10.0, 5.0, 5.0), &tuning);
        assert_eq!(wander.state, FsmState::Patrol);
        assert_eq!(wander.action, Action::Wander);

        let attack = step(FsmState::Patrol, 3, &perceive(9.9, 5.0, 5.0), &tuning);
        assert_eq!(attack.state, FsmState::Attack);
        assert_eq!(attack.counter, 0);

        let chase = step(FsmState::Attack, 0, &perceive(4.0, 5.0, 5.0), &tuning);
        assert_eq!(chase.action, Action::Pursue);
    }

    #[test]
    fn lost_target_falls_back_to_patrol_after_counter() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Default.strategy();
        let far = perceive(15.0, 5.0, 5.0);

        let mut state = FsmState::Attack;
        let mut counter = 0;
        let mut ticks = 0;
        while state == FsmState::Attack {
            let decision = step(state, counter, &far, &tuning);
            state = decision.state;
            counter = decision.counter;
            ticks += 1;
        }
        assert_eq!(state, FsmState::Patrol);
        assert_eq!(ticks, 62);
    }

    #[test]
    fn boss_heals_when_hurt_and_alone() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Boss.strategy();
        let hurt = perceive(20.0, 6.0, 10.0);

        assert_eq!(step(FsmState::Idle, 61, &hurt, &tuning).state, FsmState::Heal);
        assert_eq!(
            step(FsmState::Idle, 61, &perceive(20.0, 10.0, 10.0), &tuning).state,
            FsmState::Patrol
        );

        let rest = step(FsmState::Heal, 10, &hurt, &tuning);
        assert_eq!(rest.action, Action::Hold);
        let recover = step(FsmState::Heal, 61, &hurt, &tuning);
        assert_eq!(recover.action, Action::Recover(1.0));
        assert_eq!(recover.counter, 0);

        let healed = step(FsmState::Heal, 5, &perceive(20.0, 10.0, 10.0), &tuning);
        assert_eq!(healed.state, FsmState::Idle);
    }

    #[test]
    fn boss_defends_when_weak_or_disturbed() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Boss.strategy();

        let weak = step(FsmState::Attack, 0, &perceive(1.0, 4.0, 10.0), &tuning);
        assert_eq!(weak.state, FsmState::Defend);

        let strong = step(FsmState::Attack, 0, &perceive(1.0, 8.0, 10.0), &tuning);
        assert_eq!(strong.action, Action::Pursue);

        let flee = step(FsmState::Defend, 0, &perceive(3.0, 4.0, 10.0), &tuning);
        assert_eq!(flee.action, Action::Flee);

        let calm = step(FsmState::Defend, 0, &perceive(6.0, 4.0, 10.0), &tuning);
        assert_eq!(calm.state, FsmState::Idle);

        let interrupted = step(FsmState::Heal, 0, &perceive(3.0, 4.0, 10.0), &tuning);
        assert_eq!(interrupted.state, FsmState::Defend);
    }

    #[test]
    fn boss_patrol_approaches_until_melee_range() {
        let tuning = BehaviorTuning::default();
        let step = EnemyKind::Boss.strategy();
        assert_eq!(
            step(FsmState::Patrol, 0, &perceive(5.0, 10.0, 10.0), &tuning).action,
            Action::Approach
        );
        assert_eq!(
            step(FsmState::Patrol, 0, &perceive(1.5, 10.0, 10.0), &tuning).state,
            FsmState::Attack
        );
    }

    #[test]
    fn commit_extends_along_the_first_direction() {
        let current = CellCoord::new(10, 10);
        let path = [
            CellCoord::new(11, 10),
            CellCoord::new(12, 10),
            CellCoord::new(13, 10),
            CellCoord::new(13, 11),
            CellCoord::new(14, 11),
        ];
        assert_eq!(
            commit_direction(current, &path),
            Some(Commit {
                destination: CellCoord::new(13, 10),
                direction: IVec2::new(1, 0),
            })
        );
        assert_eq!(commit_direction(current, &[]), None);
    }

    #[test]
    fn direction_toward_rounds_each_axis() {
        let origin = CellCoord::new(0, 0);
        assert_eq!(direction_toward(origin, CellCoord::new(3, 4)), IVec2::new(1, 1));
        assert_eq!(direction_toward(origin, CellCoord::new(10, 1)), IVec2::new(1, 0));
        assert_eq!(direction_toward(origin, CellCoord::new(-2, 0)), IVec2::new(-1, 0));
        assert_eq!(direction_toward(origin, origin), IVec2::ZERO);
    }
}
