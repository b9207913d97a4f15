use log::warn;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::sync::atomic::{AtomicBool, Ordering};

/// A rejection-sampling budget for mutations that
/// can propose out-of-bounds values.
///
/// Candidates are drawn until one is accepted or
/// `limit` attempts have been rejected, at which point
/// a uniform value over the gene's bounds is used instead.
/// A `limit` of zero never gives up.
///
/// Exhaustion is reported once per budget instance. The
/// report flag is atomic, so a budget (and the mutator
/// holding it) can be shared between threads.
#[derive(Debug, Serialize, Deserialize)]
pub struct RetryBudget {
    limit: u32,
    #[serde(skip)]
    exhausted: AtomicBool,
}

impl RetryBudget {
    /// Number of attempts used when none is configured.
    pub const DEFAULT_LIMIT: u32 = 100;

    /// Creates a budget allowing `limit` attempts (0 = unlimited).
    ///
    /// # Examples
    /// ```
    /// use oxivec::mutators::RetryBudget;
    ///
    /// let budget = RetryBudget::new(10);
    ///
    /// assert_eq!(budget.limit(), 10);
    /// assert!(!budget.is_unlimited());
    /// assert!(RetryBudget::new(0).is_unlimited());
    /// ```
    pub fn new(limit: u32) -> RetryBudget {
        RetryBudget {
            limit,
            exhausted: AtomicBool::new(false),
        }
    }

    /// Returns the configured attempt limit.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Returns whether sampling never falls back.
    pub fn is_unlimited(&self) -> bool {
        self.limit == 0
    }

    /// Returns whether this budget has ever run out.
    pub fn has_been_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// Draws candidates with `draw` until `accept` holds, falling
    /// back to a uniform draw over `[min, max]` once the budget
    /// is spent.
    pub(crate) fn sample<R, D, A>(
        &self,
        rng: &mut R,
        (min, max): (f64, f64),
        mutation: &str,
        mut draw: D,
        accept: A,
    ) -> f64
    where
        R: Rng + ?Sized,
        D: FnMut(&mut R) -> f64,
        A: Fn(f64) -> bool,
    {
        let mut attempts = 0;
        loop {
            let candidate = draw(&mut *rng);
            if accept(candidate) {
                return candidate;
            }
            attempts += 1;
            if !self.is_unlimited() && attempts >= self.limit {
                self.report_exhaustion(mutation);
                return super::uniform_closed(rng, min, max);
            }
        }
    }

    fn report_exhaustion(&self, mutation: &str) {
        if !self.exhausted.swap(true, Ordering::Relaxed) {
            warn!(
                "the limit of out-of-range retries for {} mutation ({}) was reached, \
                falling back to a uniform draw within bounds",
                mutation, self.limit
            );
        }
    }
}

impl Default for RetryBudget {
    fn default() -> RetryBudget {
        RetryBudget::new(RetryBudget::DEFAULT_LIMIT)
    }
}

// A cloned budget belongs to a new operator instance,
// so it starts out unreported.
impl Clone for RetryBudget {
    fn clone(&self) -> RetryBudget {
        RetryBudget::new(self.limit)
    }
}

impl PartialEq for RetryBudget {
    fn eq(&self, other: &RetryBudget) -> bool {
        self.limit == other.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn accepted_candidate_is_returned() {
        let budget = RetryBudget::new(5);
        let mut rng = StdRng::seed_from_u64(42);
        let v = budget.sample(&mut rng, (0.0, 1.0), "test", |_| 0.25, |v| v < 0.5);
        assert_eq!(v, 0.25);
        assert!(!budget.has_been_exhausted());
    }

    #[test]
    fn exhaustion_falls_back_within_bounds() {
        let budget = RetryBudget::new(3);
        let mut rng = StdRng::seed_from_u64(42);
        let mut draws = 0;
        let v = budget.sample(
            &mut rng,
            (10.0, 20.0),
            "test",
            |_| {
                draws += 1;
                100.0
            },
            |v| (10.0..=20.0).contains(&v),
        );
        assert_eq!(draws, 3);
        assert!((10.0..=20.0).contains(&v));
        assert!(budget.has_been_exhausted());
    }

    #[test]
    fn unlimited_budget_keeps_drawing() {
        let budget = RetryBudget::new(0);
        let mut rng = StdRng::seed_from_u64(7);
        let mut draws = 0;
        let v = budget.sample(
            &mut rng,
            (0.0, 1.0),
            "test",
            |_| {
                draws += 1;
                if draws < 1000 {
                    -1.0
                } else {
                    0.5
                }
            },
            |v| v >= 0.0,
        );
        assert_eq!(v, 0.5);
        assert_eq!(draws, 1000);
        assert!(!budget.has_been_exhausted());
    }

    #[test]
    fn clones_are_separate_instances() {
        let budget = RetryBudget::new(1);
        let mut rng = StdRng::seed_from_u64(1);
        budget.sample(&mut rng, (0.0, 1.0), "test", |_| 2.0, |_| false);
        assert!(budget.has_been_exhausted());

        let copy = budget.clone();
        assert_eq!(copy, budget);
        assert!(!copy.has_been_exhausted());
    }
}
