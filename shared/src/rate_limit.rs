use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::prize::Prize;
use crate::weights::JACKPOT_PRIZE;

pub const JACKPOT_WINDOW: Duration = Duration::from_secs(3600);
pub const RELAY_MESSAGE_WINDOW: Duration = Duration::from_secs(1);

pub const JACKPOT_MAX_WINS: u32 = 1;
pub const RELAY_MAX_MESSAGES: u32 = 50;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum RateLimitType {
    Jackpot,
    RelayMessages,
}

impl RateLimitType {
    pub fn get_window(&self) -> Duration {
        match self {
            Self::Jackpot => JACKPOT_WINDOW,
            Self::RelayMessages => RELAY_MESSAGE_WINDOW,
        }
    }

    pub fn get_max_attempts(&self) -> u32 {
        match self {
            Self::Jackpot => JACKPOT_MAX_WINS,
            Self::RelayMessages => RELAY_MAX_MESSAGES,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RateLimitCheck {
    pub current_attempts: u32,
    pub is_locked: bool,
}

impl RateLimitCheck {
    pub fn new(attempts: u32, max_attempts: u32) -> Self {
        Self {
            current_attempts: attempts,
            is_locked: attempts >= max_attempts,
        }
    }
}

/// Caps how often the rare prize may come up.
///
/// Wins are remembered over a sliding window. While the window already holds
/// `max_wins` of them the prize is excluded from the draw, which hands its
/// share to the other prizes.
#[derive(Debug, Clone)]
pub struct JackpotLimiter {
    prize_name: String,
    window: Duration,
    max_wins: u32,
    wins: VecDeque<Instant>,
}

impl JackpotLimiter {
    pub fn new(prize_name: impl Into<String>, window: Duration, max_wins: u32) -> Self {
        Self {
            prize_name: prize_name.into(),
            window,
            max_wins,
            wins: VecDeque::new(),
        }
    }

    pub fn prize_name(&self) -> &str {
        &self.prize_name
    }

    fn recent_wins(&self, now: Instant) -> u32 {
        self.wins
            .iter()
            .filter(|&&at| now.saturating_duration_since(at) < self.window)
            .count() as u32
    }

    pub fn check(&self, now: Instant) -> RateLimitCheck {
        RateLimitCheck::new(self.recent_wins(now), self.max_wins)
    }

    /// Exclusion predicate for the weight model.
    pub fn excludes(&self, prize: &Prize, now: Instant) -> bool {
        prize.name == self.prize_name && self.check(now).is_locked
    }

    /// Remembers a win. Wins of other prizes are ignored.
    pub fn record_win(&mut self, prize: &Prize, now: Instant) {
        if prize.name != self.prize_name {
            return;
        }
        let window = self.window;
        self.wins.retain(|&at| now.saturating_duration_since(at) < window);
        self.wins.push_back(now);
    }
}

impl Default for JackpotLimiter {
    fn default() -> Self {
        let limit = RateLimitType::Jackpot;
        Self::new(JACKPOT_PRIZE, limit.get_window(), limit.get_max_attempts())
    }
}
