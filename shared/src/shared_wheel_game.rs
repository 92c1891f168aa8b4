use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::constants::{MAX_FRAME_SECONDS, SIMULATION_DT, TICK_INTERVAL};
use crate::error::WheelError;
use crate::physics::step;
use crate::planner::{SpinPlanner, TargetPlan};
use crate::prize::{default_prizes, Prize};
use crate::rate_limit::JackpotLimiter;
use crate::selector::select;
use crate::weights::{compute_distribution, WeightingMode};
use crate::wheel_math::index_from_angle;

/// Messages exchanged with the relay server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Admin → relay: replace the prize list.
    UpdatePrizes { prizes: Vec<Prize> },
    /// Admin → relay → displays: start a spin.
    SpinWheel,
    /// Relay → displays: the current prize list.
    PrizesUpdate { prizes: Vec<Prize> },
    /// Display → relay: one unit of a stocked prize was handed out.
    DecrementPrize {
        #[serde(rename = "prizeName")]
        prize_name: String,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Winner {
    pub index: usize,
    pub prize: Prize,
}

/// Live state of one wheel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct SpinState {
    /// Accumulated rotation in radians. Never wrapped.
    pub angle: f64,
    /// Negative while spinning forward.
    pub velocity: f64,
    pub spinning: bool,
    pub winner: Option<Winner>,
}

/// What the rendering surface needs for one frame.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct WheelFrame<'a> {
    pub angle: f64,
    pub prizes: &'a [Prize],
    pub winner_index: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpinEvent {
    Idle,
    Moving {
        angle: f64,
        velocity: f64,
        /// Pointer ticks since the previous call.
        ticks: u32,
    },
    Stopped(Winner),
}

/// Display-side wheel: owns the prize list and the one [`SpinState`] that
/// the animation loop drives.
pub struct WheelGame {
    prizes: Vec<Prize>,
    pending_prizes: Option<Vec<Prize>>,
    state: SpinState,
    weighting: WeightingMode,
    planner: SpinPlanner,
    jackpot: Option<JackpotLimiter>,
    plan: Option<TargetPlan>,
    accumulator: f64,
    last_tick_angle: f64,
    rng: StdRng,
}

impl WheelGame {
    pub fn new(prizes: Vec<Prize>) -> Self {
        Self::with_rng(prizes, StdRng::from_entropy())
    }

    pub fn with_rng(prizes: Vec<Prize>, rng: StdRng) -> Self {
        Self {
            prizes,
            pending_prizes: None,
            state: SpinState::default(),
            weighting: WeightingMode::default(),
            planner: SpinPlanner::default(),
            jackpot: None,
            plan: None,
            accumulator: 0.0,
            last_tick_angle: 0.0,
            rng,
        }
    }

    pub fn with_weighting(mut self, weighting: WeightingMode) -> Self {
        self.weighting = weighting;
        self
    }

    pub fn with_jackpot_limiter(mut self, limiter: JackpotLimiter) -> Self {
        self.jackpot = Some(limiter);
        self
    }

    pub fn with_planner(mut self, planner: SpinPlanner) -> Self {
        self.planner = planner;
        self
    }

    pub fn prizes(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn state(&self) -> &SpinState {
        &self.state
    }

    pub fn plan(&self) -> Option<&TargetPlan> {
        self.plan.as_ref()
    }

    pub fn is_spinning(&self) -> bool {
        self.state.spinning
    }

    /// Picks the winner up front and launches the wheel so that it coasts
    /// to a stop on it.
    pub fn start_spin(&mut self) -> Result<TargetPlan, WheelError> {
        if self.state.spinning {
            return Err(WheelError::AlreadySpinning);
        }
        if self.prizes.is_empty() {
            return Err(WheelError::NoPrizes);
        }

        let now = Instant::now();
        let jackpot = self.jackpot.as_ref();
        let distribution = compute_distribution(&self.prizes, &self.weighting, |prize| {
            jackpot.map_or(false, |limiter| limiter.excludes(prize, now))
        });
        let target = select(&distribution, &mut self.rng).ok_or(WheelError::NoPrizes)?;
        let plan = self
            .planner
            .plan(self.state.angle, target, self.prizes.len(), &mut self.rng)?;

        self.state.velocity = -plan.initial_velocity;
        self.state.spinning = true;
        self.state.winner = None;
        self.accumulator = 0.0;
        self.last_tick_angle = self.state.angle;
        self.plan = Some(plan);

        info!(
            "🎡 Spinning towards {} ({} of {}) at {:.2} rad/s",
            self.prizes[target].name,
            target,
            self.prizes.len(),
            plan.initial_velocity
        );
        Ok(plan)
    }

    /// Feeds `elapsed` seconds of wall time to the simulation.
    ///
    /// Time is consumed in fixed `SIMULATION_DT` steps, the same steps the
    /// planner simulated, so frame timing never changes where the wheel
    /// stops. Leftover time carries into the next call; at most
    /// `MAX_FRAME_SECONDS` is taken per call.
    pub fn advance(&mut self, elapsed: f64) -> SpinEvent {
        if !self.state.spinning {
            return SpinEvent::Idle;
        }

        self.accumulator += elapsed.clamp(0.0, MAX_FRAME_SECONDS);
        let mut ticks = 0;
        while self.accumulator >= SIMULATION_DT {
            self.accumulator -= SIMULATION_DT;
            let next = step(self.state.angle, self.state.velocity, SIMULATION_DT);
            self.state.angle = next.angle;
            self.state.velocity = next.velocity;

            // One tick per whole interval crossed; a fast step can cross several.
            let travelled = self.state.angle - self.last_tick_angle;
            let crossed = (travelled.abs() / TICK_INTERVAL).floor();
            if crossed >= 1.0 {
                ticks += crossed as u32;
                self.last_tick_angle += crossed * TICK_INTERVAL * travelled.signum();
            }

            if next.stopped {
                return match self.finish() {
                    Some(winner) => SpinEvent::Stopped(winner),
                    None => SpinEvent::Idle,
                };
            }
        }

        SpinEvent::Moving {
            angle: self.state.angle,
            velocity: self.state.velocity,
            ticks,
        }
    }

    fn finish(&mut self) -> Option<Winner> {
        self.state.spinning = false;
        self.state.velocity = 0.0;
        self.accumulator = 0.0;
        let plan = self.plan.take();

        let winner = index_from_angle(self.state.angle, self.prizes.len()).and_then(|index| {
            self.prizes.get(index).map(|prize| Winner {
                index,
                prize: prize.clone(),
            })
        });

        if let (Some(winner), Some(plan)) = (&winner, plan) {
            if winner.index != plan.target_index {
                warn!(
                    "Wheel stopped on {} but the plan chose {} (angle {:.4}, planned {:.4})",
                    winner.index, plan.target_index, self.state.angle, plan.target_angle
                );
            }
        }

        if let Some(winner) = &winner {
            info!("🎉 Wheel stopped on {}", winner.prize.name);
            if let Some(limiter) = self.jackpot.as_mut() {
                limiter.record_win(&winner.prize, Instant::now());
            }
        }

        self.state.winner = winner.clone();
        self.apply_pending_prizes();
        winner
    }

    /// Stops the wheel where it is without naming a winner.
    pub fn cancel(&mut self) {
        if !self.state.spinning {
            return;
        }
        self.state.spinning = false;
        self.state.velocity = 0.0;
        self.accumulator = 0.0;
        self.plan = None;
        debug!("Spin abandoned at angle {:.4}", self.state.angle);
        self.apply_pending_prizes();
    }

    /// Replaces the prize list, or queues it until the running spin ends.
    pub fn set_prizes(&mut self, prizes: Vec<Prize>) {
        if self.state.spinning {
            debug!("Prize list arrived mid-spin, holding {} prizes until the wheel stops", prizes.len());
            self.pending_prizes = Some(prizes);
        } else {
            self.prizes = prizes;
        }
    }

    fn apply_pending_prizes(&mut self) {
        if let Some(prizes) = self.pending_prizes.take() {
            self.prizes = prizes;
        }
    }

    /// Reacts to a message from the relay. Returns the plan when it started a spin.
    pub fn apply_message(&mut self, message: RelayMessage) -> Option<TargetPlan> {
        match message {
            RelayMessage::PrizesUpdate { prizes } | RelayMessage::UpdatePrizes { prizes } => {
                self.set_prizes(prizes);
                None
            }
            RelayMessage::SpinWheel => match self.start_spin() {
                Ok(plan) => Some(plan),
                Err(e) => {
                    info!("Ignoring spin command: {}", e);
                    None
                }
            },
            RelayMessage::DecrementPrize { prize_name } => {
                debug!("Display ignoring decrement for {}", prize_name);
                None
            }
        }
    }

    /// Falls back to the built-in prizes so the wheel stays playable offline.
    pub fn connection_lost(&mut self) {
        warn!("Relay connection lost, using the built-in prize list");
        self.set_prizes(default_prizes());
    }

    /// Stock update to send to the relay after a stocked prize was won.
    pub fn decrement_request(&self) -> Option<RelayMessage> {
        let winner = self.state.winner.as_ref()?;
        winner.prize.quantity?;
        Some(RelayMessage::DecrementPrize {
            prize_name: winner.prize.name.clone(),
        })
    }

    pub fn frame(&self) -> WheelFrame<'_> {
        let winner_index = self
            .state
            .winner
            .as_ref()
            .filter(|w| self.prizes.get(w.index).map(|p| &p.name) == Some(&w.prize.name))
            .map(|w| w.index);
        WheelFrame {
            angle: self.state.angle,
            prizes: &self.prizes,
            winner_index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::JACKPOT_PRIZE;
    use rand::Rng;
    use std::time::Duration;

    fn game(seed: u64) -> WheelGame {
        WheelGame::with_rng(default_prizes(), StdRng::seed_from_u64(seed))
    }

    fn run_to_stop(game: &mut WheelGame, frame: f64) -> Winner {
        for _ in 0..100_000 {
            if let SpinEvent::Stopped(winner) = game.advance(frame) {
                return winner;
            }
        }
        panic!("wheel never stopped");
    }

    #[test]
    fn test_winner_matches_plan() {
        let mut game = game(11);
        for _ in 0..100 {
            let plan = game.start_spin().unwrap();
            let winner = run_to_stop(&mut game, SIMULATION_DT);
            assert_eq!(winner.index, plan.target_index);
            assert_eq!(game.state().winner.as_ref(), Some(&winner));
            assert!(!game.is_spinning());
        }
    }

    #[test]
    fn test_ticks_follow_travel() {
        let mut game = game(17);
        for _ in 0..20 {
            let start = game.state().angle;
            game.start_spin().unwrap();
            let mut ticks = 0;
            loop {
                match game.advance(SIMULATION_DT) {
                    SpinEvent::Moving { ticks: t, .. } => ticks += t,
                    SpinEvent::Stopped(_) => break,
                    SpinEvent::Idle => panic!("spin ended without a winner"),
                }
            }
            let expected = ((game.state().angle - start) / TICK_INTERVAL).floor() as u32;
            // The stopping step reports no ticks, and it moves far less than one interval.
            assert!(ticks + 1 >= expected && ticks <= expected, "ticks {ticks}, expected {expected}");
        }
    }

    #[test]
    fn test_custom_planner_is_used() {
        let planner = SpinPlanner {
            min_extra_rotations: 5,
            max_extra_rotations: 5,
            tolerance: 0.001,
            ..SpinPlanner::default()
        };
        let mut game = game(23).with_planner(planner);
        for _ in 0..10 {
            let start = game.state().angle;
            let plan = game.start_spin().unwrap();
            let turns = plan.expected_travel / std::f64::consts::TAU;
            assert!((4.99..6.01).contains(&turns), "{turns} turns");
            let winner = run_to_stop(&mut game, SIMULATION_DT);
            assert_eq!(winner.index, plan.target_index);
            assert!((game.state().angle - start - plan.expected_travel).abs() < 1e-9);
        }
    }

    #[test]
    fn test_frame_jitter_does_not_move_the_stop() {
        let mut game = game(5);
        let mut jitter = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let plan = game.start_spin().unwrap();
            let winner = loop {
                let frame = jitter.gen_range(0.001..0.4);
                if let SpinEvent::Stopped(winner) = game.advance(frame) {
                    break winner;
                }
            };
            assert_eq!(winner.index, plan.target_index);
        }
    }

    #[test]
    fn test_cannot_start_twice() {
        let mut game = game(1);
        game.start_spin().unwrap();
        assert_eq!(game.start_spin(), Err(WheelError::AlreadySpinning));
        assert!(game.apply_message(RelayMessage::SpinWheel).is_none());
    }

    #[test]
    fn test_empty_wheel() {
        let mut game = WheelGame::with_rng(Vec::new(), StdRng::seed_from_u64(1));
        assert_eq!(game.start_spin(), Err(WheelError::NoPrizes));
        assert_eq!(game.advance(1.0), SpinEvent::Idle);
    }

    #[test]
    fn test_cancel_leaves_no_winner() {
        let mut game = game(2);
        game.start_spin().unwrap();
        game.advance(0.2);
        game.cancel();
        assert!(!game.is_spinning());
        assert!(game.state().winner.is_none());
        assert!(game.plan().is_none());
        assert_eq!(game.advance(0.2), SpinEvent::Idle);

        let plan = game.start_spin().unwrap();
        assert_eq!(run_to_stop(&mut game, 0.05).index, plan.target_index);
    }

    #[test]
    fn test_prize_update_waits_for_stop() {
        let mut game = game(3);
        game.start_spin().unwrap();
        let replacement = vec![Prize::named("Only")];
        game.apply_message(RelayMessage::PrizesUpdate {
            prizes: replacement.clone(),
        });
        assert_eq!(game.prizes().len(), 11);

        run_to_stop(&mut game, SIMULATION_DT);
        assert_eq!(game.prizes(), replacement.as_slice());
    }

    #[test]
    fn test_spin_message_starts_spin() {
        let mut game = game(4);
        let plan = game.apply_message(RelayMessage::SpinWheel).unwrap();
        assert!(game.is_spinning());
        assert!(game.state().velocity < 0.0);
        assert_eq!(game.state().velocity, -plan.initial_velocity);
    }

    #[test]
    fn test_connection_lost_restores_defaults() {
        let mut game = WheelGame::with_rng(vec![Prize::named("X")], StdRng::seed_from_u64(8));
        game.connection_lost();
        assert_eq!(game.prizes(), default_prizes().as_slice());
    }

    #[test]
    fn test_decrement_request_only_for_stocked_prizes() {
        let mut game = WheelGame::with_rng(vec![Prize::named("Cap").with_quantity(2)], StdRng::seed_from_u64(6));
        game.start_spin().unwrap();
        run_to_stop(&mut game, SIMULATION_DT);
        assert_eq!(
            game.decrement_request(),
            Some(RelayMessage::DecrementPrize {
                prize_name: "Cap".to_string()
            })
        );

        let mut unlimited = WheelGame::with_rng(vec![Prize::named("Mug")], StdRng::seed_from_u64(6));
        unlimited.start_spin().unwrap();
        run_to_stop(&mut unlimited, SIMULATION_DT);
        assert_eq!(unlimited.decrement_request(), None);
    }

    #[test]
    fn test_frame_hides_stale_winner() {
        let mut game = game(12);
        game.start_spin().unwrap();
        let winner = run_to_stop(&mut game, SIMULATION_DT);
        assert_eq!(game.frame().winner_index, Some(winner.index));

        game.set_prizes(vec![Prize::named("Something else")]);
        assert_eq!(game.frame().winner_index, None);
    }

    #[test]
    fn test_jackpot_limiter_blocks_repeat() {
        let mut game = game(21).with_jackpot_limiter(JackpotLimiter::new(JACKPOT_PRIZE, Duration::from_secs(3600), 1));
        let mut jackpot_won = false;
        for _ in 0..300 {
            game.start_spin().unwrap();
            let winner = run_to_stop(&mut game, SIMULATION_DT);
            if winner.prize.name == JACKPOT_PRIZE {
                assert!(!jackpot_won, "jackpot won twice inside its window");
                jackpot_won = true;
            }
        }
        assert!(jackpot_won);
    }

    #[test]
    fn test_message_wire_format() {
        let msg: RelayMessage = serde_json::from_str(r#"{"type":"decrement_prize","prizeName":"Mug"}"#).unwrap();
        assert_eq!(
            msg,
            RelayMessage::DecrementPrize {
                prize_name: "Mug".to_string()
            }
        );

        let msg: RelayMessage =
            serde_json::from_str(r#"{"type":"update_prizes","prizes":["A",{"name":"B","quantity":2}]}"#).unwrap();
        assert_eq!(
            msg,
            RelayMessage::UpdatePrizes {
                prizes: vec![Prize::named("A"), Prize::named("B").with_quantity(2)]
            }
        );

        let spin = serde_json::to_string(&RelayMessage::SpinWheel).unwrap();
        assert_eq!(spin, r#"{"type":"spin_wheel"}"#);
    }
}
