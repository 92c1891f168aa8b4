//! Winner selection and wheel physics shared by the relay server and the
//! display clients.
//!
//! A spin picks its prize first (`weights` + `selector`), then `planner`
//! searches for the launch speed that makes the `physics` integrator coast
//! to a stop over that prize's sector (`wheel_math`).

pub mod constants;
pub mod error;
pub mod physics;
pub mod planner;
pub mod prize;
pub mod rate_limit;
pub mod selector;
pub mod shared_wheel_game;
pub mod validation;
pub mod weights;
pub mod wheel_math;

pub use error::WheelError;
pub use planner::{SpinPlanner, TargetPlan};
pub use prize::Prize;
pub use shared_wheel_game::{RelayMessage, SpinEvent, SpinState, WheelGame, Winner};
pub use weights::{compute_distribution, WeightedDistribution, WeightingMode};
