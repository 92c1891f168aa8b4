// Physics
pub const FRICTION: f64 = 0.8; // relative velocity loss per second
pub const STOP_THRESHOLD: f64 = 0.8; // rad/s
pub const MIN_VELOCITY: f64 = 8.0;
pub const MAX_VELOCITY: f64 = 20.0;
pub const MAX_STEP_DT: f64 = 0.033; // seconds, longest single integration step
pub const SIMULATION_DT: f64 = 1.0 / 60.0; // fixed step shared by planner and animation
pub const MAX_SIMULATION_STEPS: usize = 10_000;
pub const MAX_FRAME_SECONDS: f64 = 0.25; // most wall time one advance() call will consume
pub const TICK_INTERVAL: f64 = 0.15; // radians between pointer ticks

// Planner
pub const MIN_EXTRA_ROTATIONS: u32 = 3;
pub const MAX_EXTRA_ROTATIONS: u32 = 7;
pub const TRAVEL_TOLERANCE: f64 = 0.005; // radians
pub const MAX_SEARCH_ITERATIONS: u32 = 200;
pub const MAX_BRACKET_EXPANSIONS: u32 = 16;

// Prize lists
pub const MAX_PRIZES: usize = 64;
