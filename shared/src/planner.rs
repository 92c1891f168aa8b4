use std::f64::consts::TAU;

use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    MAX_BRACKET_EXPANSIONS, MAX_EXTRA_ROTATIONS, MAX_SEARCH_ITERATIONS, MAX_VELOCITY, MIN_EXTRA_ROTATIONS,
    MIN_VELOCITY, STOP_THRESHOLD, TRAVEL_TOLERANCE,
};
use crate::error::WheelError;
use crate::physics::travel_distance;
use crate::wheel_math::{angle_for_index, normalize_angle};

/// Where a spin has to end and how hard to launch it.
///
/// `initial_velocity` is a positive magnitude. The live wheel spins with the
/// negated value, which makes its angle increase towards `target_angle`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetPlan {
    pub target_index: usize,
    pub target_angle: f64,
    pub initial_velocity: f64,
    /// Distance the simulation covers at `initial_velocity`.
    pub expected_travel: f64,
    /// The search got within tolerance of the requested distance.
    pub converged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinPlanner {
    pub min_extra_rotations: u32,
    pub max_extra_rotations: u32,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub min_velocity: f64,
    pub max_velocity: f64,
}

impl Default for SpinPlanner {
    fn default() -> Self {
        Self {
            min_extra_rotations: MIN_EXTRA_ROTATIONS,
            max_extra_rotations: MAX_EXTRA_ROTATIONS,
            tolerance: TRAVEL_TOLERANCE,
            max_iterations: MAX_SEARCH_ITERATIONS,
            min_velocity: MIN_VELOCITY,
            max_velocity: MAX_VELOCITY,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Probe {
    speed: f64,
    travel: f64,
    error: f64,
}

impl Probe {
    fn at(speed: f64, goal: f64) -> Self {
        let travel = travel_distance(speed).distance;
        Self {
            speed,
            travel,
            error: travel - goal,
        }
    }
}

impl SpinPlanner {
    /// Plans a spin that stops on `target_index`, with a random number of
    /// whole extra turns.
    ///
    /// # Panics
    ///
    /// Panics if `target_index >= prize_count` on a non-empty wheel.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        current_angle: f64,
        target_index: usize,
        prize_count: usize,
        rng: &mut R,
    ) -> Result<TargetPlan, WheelError> {
        let low = self.min_extra_rotations;
        let extra = rng.gen_range(low..=self.max_extra_rotations.max(low));
        self.plan_with_rotations(current_angle, target_index, prize_count, extra)
    }

    pub fn plan_with_rotations(
        &self,
        current_angle: f64,
        target_index: usize,
        prize_count: usize,
        extra_rotations: u32,
    ) -> Result<TargetPlan, WheelError> {
        if prize_count == 0 {
            return Err(WheelError::NoPrizes);
        }

        let base_angle = angle_for_index(target_index, prize_count);
        let extra = extra_rotations.max(self.min_extra_rotations);
        let offset = normalize_angle(base_angle - normalize_angle(current_angle));
        let travel_goal = offset + TAU * f64::from(extra);

        let best = self.solve_speed(travel_goal);
        let converged = best.error.abs() < self.tolerance;
        if !converged {
            debug!(
                "Speed search stopped {:.4} rad off a {:.3} rad spin, using {:.4} rad/s",
                best.error, travel_goal, best.speed
            );
        }

        Ok(TargetPlan {
            target_index,
            target_angle: current_angle + travel_goal,
            initial_velocity: best.speed,
            expected_travel: best.travel,
            converged,
        })
    }

    /// Bisects the launch speed whose simulated travel matches `goal`.
    ///
    /// Travel grows with speed but jumps slightly each time the stop happens
    /// one step later, so an exact hit is not always possible. The closest
    /// candidate seen is returned either way.
    fn solve_speed(&self, goal: f64) -> Probe {
        let mut low = Probe::at(self.min_velocity.max(STOP_THRESHOLD), goal);
        let mut high = Probe::at(self.max_velocity.max(low.speed), goal);

        let mut expansions = 0;
        while high.error < 0.0 && expansions < MAX_BRACKET_EXPANSIONS {
            low = high;
            high = Probe::at(high.speed * 2.0, goal);
            expansions += 1;
        }
        while low.error > 0.0 && low.speed > STOP_THRESHOLD && expansions < MAX_BRACKET_EXPANSIONS {
            high = low;
            low = Probe::at(low.speed * 0.5, goal);
            expansions += 1;
        }

        let mut best = if low.error.abs() <= high.error.abs() { low } else { high };
        for _ in 0..self.max_iterations {
            if best.error.abs() < self.tolerance {
                break;
            }
            let mid = Probe::at(0.5 * (low.speed + high.speed), goal);
            if mid.error.abs() < best.error.abs() {
                best = mid;
            }
            if mid.error < 0.0 {
                low = mid;
            } else {
                high = mid;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SIMULATION_DT;
    use crate::physics::step;
    use crate::wheel_math::index_from_angle;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Runs the live integrator from `angle` at the planned launch speed.
    fn land(angle: f64, plan: &TargetPlan) -> f64 {
        let mut angle = angle;
        let mut velocity = -plan.initial_velocity;
        loop {
            let next = step(angle, velocity, SIMULATION_DT);
            angle = next.angle;
            velocity = next.velocity;
            if next.stopped {
                return angle;
            }
        }
    }

    #[test]
    fn test_plan_lands_on_target() {
        let planner = SpinPlanner::default();
        let plan = planner.plan_with_rotations(0.0, 4, 11, 5).unwrap();
        assert_eq!(plan.target_index, 4);
        assert!(plan.target_angle > 0.0);
        assert!(plan.initial_velocity > 0.0);

        let final_angle = land(0.0, &plan);
        assert_eq!(index_from_angle(final_angle, 11), Some(4));
        assert!((final_angle - plan.target_angle).abs() < 0.01);
    }

    #[test]
    fn test_plan_always_spins_forward_several_turns() {
        let planner = SpinPlanner::default();
        for current in [-25.0, -1.0, 0.0, 3.3, 400.0] {
            for target in 0..11 {
                let plan = planner.plan_with_rotations(current, target, 11, 0).unwrap();
                assert!(plan.target_angle - current >= TAU * f64::from(MIN_EXTRA_ROTATIONS));
                assert!(plan.target_angle - current < TAU * f64::from(MIN_EXTRA_ROTATIONS + 1));
            }
        }
    }

    #[test]
    fn test_randomized_spins_stop_on_target() {
        let planner = SpinPlanner::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let prize_count = 11;
        let mut hits = 0;
        for _ in 0..1000 {
            let current: f64 = rng.gen_range(-50.0..50.0);
            let target = rng.gen_range(0..prize_count);
            let plan = planner.plan(current, target, prize_count, &mut rng).unwrap();
            if index_from_angle(land(current, &plan), prize_count) == Some(target) {
                hits += 1;
            }
        }
        assert!(hits >= 950, "only {hits} of 1000 spins landed on target");
    }

    #[test]
    fn test_small_sectors_still_land() {
        let planner = SpinPlanner::default();
        let mut rng = StdRng::seed_from_u64(9);
        for prize_count in [1, 2, 25, 50] {
            for target in 0..prize_count {
                let plan = planner.plan(1.25, target, prize_count, &mut rng).unwrap();
                assert_eq!(index_from_angle(land(1.25, &plan), prize_count), Some(target));
            }
        }
    }

    #[test]
    fn test_unreachable_tolerance_still_returns_a_plan() {
        let planner = SpinPlanner {
            tolerance: 0.0,
            max_iterations: 5,
            ..SpinPlanner::default()
        };
        let plan = planner.plan_with_rotations(0.0, 2, 8, 4).unwrap();
        assert!(!plan.converged);
        assert!(plan.initial_velocity.is_finite());
        assert!(plan.initial_velocity > 0.0);
    }

    #[test]
    fn test_narrow_bracket_expands() {
        let planner = SpinPlanner {
            min_velocity: 30.0,
            max_velocity: 31.0,
            ..SpinPlanner::default()
        };
        // Three turns need well under 30 rad/s, many turns well over 31.
        let short = planner.plan_with_rotations(0.0, 0, 4, 3).unwrap();
        let long = planner.plan_with_rotations(0.0, 0, 4, 12).unwrap();
        assert!(short.initial_velocity < 30.0);
        assert!(long.initial_velocity > 31.0);
    }

    #[test]
    fn test_empty_wheel_is_an_error() {
        let planner = SpinPlanner::default();
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(planner.plan(0.0, 0, 0, &mut rng), Err(WheelError::NoPrizes)));
    }

    #[test]
    #[should_panic]
    fn test_target_out_of_range_panics() {
        let _ = SpinPlanner::default().plan_with_rotations(0.0, 11, 11, 3);
    }
}
