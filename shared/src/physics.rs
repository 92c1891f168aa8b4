use crate::constants::{FRICTION, MAX_SIMULATION_STEPS, MAX_STEP_DT, SIMULATION_DT, STOP_THRESHOLD};

/// Result of one integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub angle: f64,
    pub velocity: f64,
    /// The new velocity is below [`STOP_THRESHOLD`]; no further steps should run.
    pub stopped: bool,
}

/// Advances the wheel by `dt` seconds under constant relative friction.
///
/// The angle moves opposite to the velocity's sign, so a spinning wheel
/// carries a negative velocity while its angle grows. `dt` is clamped to
/// `[0, MAX_STEP_DT]`.
pub fn step(angle: f64, velocity: f64, dt: f64) -> Step {
    let dt = dt.clamp(0.0, MAX_STEP_DT);
    let velocity_next = velocity * (1.0 - dt * FRICTION);
    Step {
        angle: angle - velocity * dt,
        velocity: velocity_next,
        stopped: velocity_next.abs() < STOP_THRESHOLD,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// Total forward rotation until the wheel stops.
    pub distance: f64,
    pub steps: usize,
}

/// Distance a wheel launched at `speed` rad/s covers before it stops, using
/// the same fixed `SIMULATION_DT` steps the live animation runs.
pub fn travel_distance(speed: f64) -> Trajectory {
    let mut angle = 0.0;
    let mut velocity = -speed.abs();
    let mut steps = 0;
    while steps < MAX_SIMULATION_STEPS {
        let next = step(angle, velocity, SIMULATION_DT);
        angle = next.angle;
        velocity = next.velocity;
        steps += 1;
        if next.stopped {
            break;
        }
    }
    Trajectory { distance: angle, steps }
}
