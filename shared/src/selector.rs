use rand::Rng;

use crate::weights::WeightedDistribution;

/// Inverse-CDF lookup over `probabilities` for a sample `r` in `[0, 1)`.
///
/// Entry `i` owns the right-open interval `[c(i-1), c(i))` of the running sum,
/// so an `r` sitting exactly on a boundary goes to the later entry. A sample
/// past the final sum (rounding drift) lands on the last entry.
pub fn pick_from_probabilities(probabilities: &[f64], r: f64) -> Option<usize> {
    let last = probabilities.len().checked_sub(1)?;
    let mut cumulative = 0.0;
    for (i, p) in probabilities.iter().enumerate() {
        cumulative += p;
        if r < cumulative {
            return Some(i);
        }
    }
    Some(last)
}

impl WeightedDistribution {
    /// Index into the caller's original prize list for sample `r`.
    pub fn pick(&self, r: f64) -> Option<usize> {
        let probabilities = self.probabilities();
        pick_from_probabilities(&probabilities, r).map(|pos| self.candidates[pos].index)
    }
}

pub fn select<R: Rng + ?Sized>(distribution: &WeightedDistribution, rng: &mut R) -> Option<usize> {
    distribution.pick(rng.gen::<f64>())
}
