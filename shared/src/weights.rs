use std::collections::HashMap;

use log::debug;

use crate::prize::Prize;

/// The rare prize the default multiplier table singles out.
pub const JACKPOT_PRIZE: &str = "PeraWallet";
pub const JACKPOT_MULTIPLIER: f64 = 0.4;

/// How a prize's selection weight is derived.
///
/// A deployment picks exactly one of these. The two are never blended.
#[derive(Debug, Clone, PartialEq)]
pub enum WeightingMode {
    /// Every prize weighs 1.0 unless the table names it.
    Multiplier(HashMap<String, f64>),
    /// A prize weighs its remaining quantity, or 1.0 when it is unlimited.
    RemainingQuantity,
}

impl WeightingMode {
    pub fn default_multipliers() -> Self {
        Self::Multiplier(HashMap::from([(JACKPOT_PRIZE.to_string(), JACKPOT_MULTIPLIER)]))
    }

    fn weight_of(&self, prize: &Prize) -> f64 {
        let weight = match self {
            Self::Multiplier(table) => table.get(&prize.name).copied().unwrap_or(1.0),
            Self::RemainingQuantity => prize.quantity.map_or(1.0, |q| q as f64),
        };
        if weight.is_finite() {
            weight.max(0.0)
        } else {
            0.0
        }
    }
}

impl Default for WeightingMode {
    fn default() -> Self {
        Self::default_multipliers()
    }
}

/// A prize that can be drawn, identified by its position in the caller's list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub index: usize,
    pub weight: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedDistribution {
    pub(crate) candidates: Vec<Candidate>,
    fallback: bool,
}

impl WeightedDistribution {
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.candidates.iter().map(|c| c.probability).collect()
    }

    pub fn eligible_prizes<'a>(&self, prizes: &'a [Prize]) -> Vec<&'a Prize> {
        self.candidates.iter().filter_map(|c| prizes.get(c.index)).collect()
    }

    /// Probability of drawing the prize at `index` of the original list.
    pub fn probability_of(&self, index: usize) -> f64 {
        self.candidates
            .iter()
            .find(|c| c.index == index)
            .map_or(0.0, |c| c.probability)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// True when every weight was zero and the uniform fallback was used.
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}

/// Builds the selection distribution for one spin.
///
/// Prizes that are excluded or out of stock get weight zero and are left out.
/// If nothing positive remains, every prize the predicate did not exclude is
/// given an equal share, and if the predicate excluded everything, every
/// prize is. An empty prize list yields an empty distribution.
pub fn compute_distribution<F>(prizes: &[Prize], mode: &WeightingMode, excluded: F) -> WeightedDistribution
where
    F: Fn(&Prize) -> bool,
{
    let weights: Vec<(usize, f64)> = prizes
        .iter()
        .enumerate()
        .map(|(index, prize)| {
            let weight = if excluded(prize) || !prize.is_available() {
                0.0
            } else {
                mode.weight_of(prize)
            };
            (index, weight)
        })
        .filter(|&(_, weight)| weight > 0.0)
        .collect();

    let total: f64 = weights.iter().map(|&(_, w)| w).sum();
    if total > 0.0 && total.is_finite() {
        let candidates = weights
            .into_iter()
            .map(|(index, weight)| Candidate {
                index,
                weight,
                probability: weight / total,
            })
            .collect();
        return WeightedDistribution {
            candidates,
            fallback: false,
        };
    }

    let mut pool: Vec<usize> = (0..prizes.len()).filter(|&i| !excluded(&prizes[i])).collect();
    if pool.is_empty() {
        pool = (0..prizes.len()).collect();
    }
    if !pool.is_empty() {
        debug!("All {} prize weights are zero, using a uniform draw over {}", prizes.len(), pool.len());
    }
    let share = 1.0 / pool.len().max(1) as f64;
    WeightedDistribution {
        candidates: pool
            .into_iter()
            .map(|index| Candidate {
                index,
                weight: 1.0,
                probability: share,
            })
            .collect(),
        fallback: true,
    }
}
