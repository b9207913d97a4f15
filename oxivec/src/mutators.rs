//! Per-gene mutation operators.
//!
//! A [`Mutator`] holds the fully-resolved configuration
//! of a single gene: its legal bounds, whether mutation
//! must respect them, and one of five mutation algorithms
//! with that algorithm's own parameters.
mod resolve;
mod retry;

pub use resolve::{resolve, Defaulted, Layer, MutatorOverrides, Resolved};
pub use retry::RetryBudget;

use crate::species::SpeciesError;
use crate::Gene;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Largest integer such that it and all smaller
/// integers are exactly representable in an `f64`.
/// Used as the walk limit for unbounded random walks.
pub const MAXIMUM_INTEGER_IN_DOUBLE: f64 = 9.007199254740992E15;

/// Identifies a mutation algorithm.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MutationType {
    /// Uniform redraw over the gene's bounds.
    Reset,
    /// Gaussian perturbation of the current value.
    Gauss,
    /// Deb's polynomial perturbation of the current value.
    Polynomial,
    /// Uniform integer redraw over the gene's bounds.
    IntegerReset,
    /// ±1 random walk from the current (truncated) value.
    IntegerRandomWalk,
}

impl MutationType {
    pub const ALL: [MutationType; 5] = [
        MutationType::Reset,
        MutationType::Gauss,
        MutationType::Polynomial,
        MutationType::IntegerReset,
        MutationType::IntegerRandomWalk,
    ];

    /// Returns the configuration identifier of the type.
    ///
    /// # Examples
    /// ```
    /// use oxivec::mutators::MutationType;
    ///
    /// assert_eq!(MutationType::IntegerRandomWalk.as_str(), "integer-random-walk");
    /// assert_eq!("gauss".parse::<MutationType>().unwrap(), MutationType::Gauss);
    /// assert!("gaussian".parse::<MutationType>().is_err());
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reset => "reset",
            Self::Gauss => "gauss",
            Self::Polynomial => "polynomial",
            Self::IntegerReset => "integer-reset",
            Self::IntegerRandomWalk => "integer-random-walk",
        }
    }

    /// Returns whether genes mutated by this type only
    /// ever take integer values.
    pub fn is_integer_type(&self) -> bool {
        matches!(self, Self::IntegerReset | Self::IntegerRandomWalk)
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error type indicating an unrecognized
/// mutation type identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mutation type '{0}'")]
pub struct UnknownMutationType(pub String);

impl FromStr for MutationType {
    type Err = UnknownMutationType;

    fn from_str(s: &str) -> Result<MutationType, UnknownMutationType> {
        let s = s.trim();
        MutationType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownMutationType(s.to_owned()))
    }
}

/// A mutation algorithm together with
/// its algorithm-specific parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MutationKind {
    Reset,
    Gauss {
        stdev: f64,
        retries: RetryBudget,
    },
    Polynomial {
        distribution_index: u32,
        alternative: bool,
        retries: RetryBudget,
    },
    IntegerReset,
    IntegerRandomWalk {
        probability: f64,
    },
}

impl MutationKind {
    /// Returns the kind's mutation type discriminant.
    pub fn mutation_type(&self) -> MutationType {
        match self {
            Self::Reset => MutationType::Reset,
            Self::Gauss { .. } => MutationType::Gauss,
            Self::Polynomial { .. } => MutationType::Polynomial,
            Self::IntegerReset => MutationType::IntegerReset,
            Self::IntegerRandomWalk { .. } => MutationType::IntegerRandomWalk,
        }
    }
}

/// The resolved, immutable mutation operator of a single gene.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mutator {
    min_gene: f64,
    max_gene: f64,
    mutation_is_bounded: bool,
    kind: MutationKind,
}

impl Mutator {
    /// Creates a mutator, validating its parameters.
    ///
    /// # Errors
    /// Returns an error if the bounds are not finite or
    /// `max_gene < min_gene`, or if the kind's parameters
    /// are out of range (negative standard deviation, random
    /// walk probability outside [0, 1], or bounds too narrow
    /// for a bounded random walk step).
    ///
    /// # Examples
    /// ```
    /// use oxivec::mutators::{Mutator, MutationKind, MutationType};
    ///
    /// let mutator = Mutator::new(-1.0, 1.0, true, MutationKind::Reset).unwrap();
    ///
    /// assert_eq!(mutator.mutation_type(), MutationType::Reset);
    /// assert!(Mutator::new(1.0, -1.0, true, MutationKind::Reset).is_err());
    /// ```
    pub fn new(
        min_gene: f64,
        max_gene: f64,
        mutation_is_bounded: bool,
        kind: MutationKind,
    ) -> Result<Mutator, SpeciesError> {
        Self::build(min_gene, max_gene, mutation_is_bounded, kind, Layer::Global)
    }

    pub(crate) fn build(
        min_gene: f64,
        max_gene: f64,
        mutation_is_bounded: bool,
        kind: MutationKind,
        layer: Layer,
    ) -> Result<Mutator, SpeciesError> {
        if !min_gene.is_finite() || !max_gene.is_finite() {
            return Err(SpeciesError::UnrepresentableBounds {
                layer,
                min: min_gene,
                max: max_gene,
            });
        }
        if max_gene < min_gene {
            return Err(SpeciesError::InvertedBounds {
                layer,
                min: min_gene,
                max: max_gene,
            });
        }
        if !(max_gene - min_gene).is_finite() {
            return Err(SpeciesError::UnrepresentableBounds {
                layer,
                min: min_gene,
                max: max_gene,
            });
        }
        match &kind {
            MutationKind::Gauss { stdev, .. } if !(*stdev >= 0.0 && stdev.is_finite()) => {
                return Err(SpeciesError::InvalidStdev {
                    layer,
                    value: *stdev,
                })
            }
            MutationKind::IntegerRandomWalk { probability } => {
                if !(0.0..=1.0).contains(probability) {
                    return Err(SpeciesError::InvalidProbability {
                        layer,
                        name: crate::names::RANDOM_WALK_PROBABILITY,
                        value: *probability,
                    });
                }
                // At least two integers must lie within the bounds.
                if mutation_is_bounded && max_gene.floor() - min_gene.ceil() < 1.0 {
                    return Err(SpeciesError::NarrowRandomWalkBounds {
                        layer,
                        min: min_gene,
                        max: max_gene,
                    });
                }
            }
            _ => {}
        }
        Ok(Mutator {
            min_gene,
            max_gene,
            mutation_is_bounded,
            kind,
        })
    }

    /// Returns the minimum legal gene value.
    pub fn min_gene(&self) -> f64 {
        self.min_gene
    }

    /// Returns the maximum legal gene value.
    pub fn max_gene(&self) -> f64 {
        self.max_gene
    }

    /// Returns whether mutation must keep the
    /// gene within `[min_gene, max_gene]`.
    pub fn mutation_is_bounded(&self) -> bool {
        self.mutation_is_bounded
    }

    /// Returns the mutation algorithm and its parameters.
    pub fn kind(&self) -> &MutationKind {
        &self.kind
    }

    /// Returns the mutation type discriminant.
    pub fn mutation_type(&self) -> MutationType {
        self.kind.mutation_type()
    }

    /// Returns whether the gene only takes integer values.
    pub fn is_integer_type(&self) -> bool {
        self.mutation_type().is_integer_type()
    }

    /// Mutates `genome[index]` in place.
    ///
    /// Bounded mutations always leave the gene within
    /// `[min_gene, max_gene]`, falling back to a uniform
    /// draw if the retry budget runs out. Mutation never fails.
    ///
    /// Bounds are compared at the storage precision of `T`:
    /// an `f32` gene on `[0, 0.1]` may hold `0.1f32`, which
    /// is the nearest `f32` to the bound but slightly above it.
    ///
    /// # Panics
    /// Panics if `index` is out of range for `genome`.
    ///
    /// # Examples
    /// ```
    /// use oxivec::mutators::{Mutator, MutationKind, RetryBudget};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mutator = Mutator::new(
    ///     0.0,
    ///     10.0,
    ///     true,
    ///     MutationKind::Gauss { stdev: 1.0, retries: RetryBudget::default() },
    /// )
    /// .unwrap();
    ///
    /// let mut genome = vec![5.0f64, 5.0];
    /// mutator.mutate(&mut genome, 1, &mut StdRng::seed_from_u64(3));
    ///
    /// assert_eq!(genome[0], 5.0);
    /// assert!((0.0..=10.0).contains(&genome[1]));
    /// ```
    pub fn mutate<T, R>(&self, genome: &mut [T], index: usize, rng: &mut R)
    where
        T: Gene,
        R: Rng + ?Sized,
    {
        let value = match &self.kind {
            MutationKind::Reset => uniform_closed(rng, self.min_gene, self.max_gene),
            MutationKind::IntegerReset => {
                let (min, max) = (self.min_gene.floor(), self.max_gene.floor());
                uniform_integer(rng, min as i64, max as i64) as f64
            }
            MutationKind::Gauss { stdev, retries } => {
                self.gaussian::<T, R>(T::get(genome, index), *stdev, retries, rng)
            }
            MutationKind::Polynomial {
                distribution_index,
                alternative,
                retries,
            } => self.polynomial::<T, R>(
                T::get(genome, index),
                *distribution_index,
                *alternative,
                retries,
                rng,
            ),
            MutationKind::IntegerRandomWalk { probability } => {
                self.random_walk(T::get(genome, index), *probability, rng).0 as f64
            }
        };
        T::set(genome, index, value);
    }

    /// Returns a random initial value for the gene, drawn
    /// within bounds regardless of [`mutation_is_bounded`].
    /// Integer types only draw integers.
    ///
    /// [`mutation_is_bounded`]: Mutator::mutation_is_bounded
    pub fn random_value<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.is_integer_type() {
            // Prefer integers within the bounds; if there
            // are none, draw as integer reset would.
            let (mut min, max) = (self.min_gene.ceil(), self.max_gene.floor());
            if min > max {
                min = self.min_gene.floor();
            }
            uniform_integer(rng, min as i64, max as i64) as f64
        } else {
            uniform_closed(rng, self.min_gene, self.max_gene)
        }
    }

    /// Checks `value` against the bounds once both are
    /// rounded to the storage precision of `T`.
    fn within_bounds<T: Gene>(&self, value: f64) -> bool {
        let value = T::narrow(value);
        value >= T::narrow(self.min_gene) && value <= T::narrow(self.max_gene)
    }

    fn gaussian<T: Gene, R: Rng + ?Sized>(
        &self,
        current: f64,
        stdev: f64,
        retries: &RetryBudget,
        rng: &mut R,
    ) -> f64 {
        retries.sample(
            rng,
            (self.min_gene, self.max_gene),
            MutationType::Gauss.as_str(),
            |rng| {
                let noise: f64 = StandardNormal.sample(rng);
                current + noise * stdev
            },
            |candidate| !self.mutation_is_bounded || self.within_bounds::<T>(candidate),
        )
    }

    fn polynomial<T: Gene, R: Rng + ?Sized>(
        &self,
        current: f64,
        distribution_index: u32,
        alternative: bool,
        retries: &RetryBudget,
        rng: &mut R,
    ) -> f64 {
        let (yl, yu) = (self.min_gene, self.max_gene);
        // The kernel is scaled by the range width;
        // a degenerate range pins the gene.
        if yu == yl {
            return yl;
        }
        let delta1 = (current - yl) / (yu - yl);
        let delta2 = (yu - current) / (yu - yl);
        let exponent = distribution_index as f64 + 1.0;
        let mut_pow = 1.0 / exponent;

        retries.sample(
            rng,
            (yl, yu),
            MutationType::Polynomial.as_str(),
            |rng| {
                let rnd: f64 = rng.gen();
                let deltaq = if rnd <= 0.5 {
                    let xy = 1.0 - delta1;
                    let val = 2.0 * rnd
                        + if alternative {
                            (1.0 - 2.0 * rnd) * xy.powf(exponent)
                        } else {
                            0.0
                        };
                    val.powf(mut_pow) - 1.0
                } else {
                    let xy = 1.0 - delta2;
                    let val = 2.0 * (1.0 - rnd)
                        + if alternative {
                            2.0 * (rnd - 0.5) * xy.powf(exponent)
                        } else {
                            0.0
                        };
                    1.0 - val.powf(mut_pow)
                };
                current + deltaq * (yu - yl)
            },
            |candidate| {
                candidate.is_finite()
                    && (!self.mutation_is_bounded || self.within_bounds::<T>(candidate))
            },
        )
    }

    /// Walks from the truncated `current` value in ±1 steps,
    /// continuing with chance `probability` after each step.
    /// Returns the final position and the number of steps taken.
    fn random_walk<R: Rng + ?Sized>(
        &self,
        current: f64,
        probability: f64,
        rng: &mut R,
    ) -> (i64, usize) {
        let (min, max) = if self.mutation_is_bounded {
            (self.min_gene, self.max_gene)
        } else {
            (-MAXIMUM_INTEGER_IN_DOUBLE, MAXIMUM_INTEGER_IN_DOUBLE)
        };
        // A step is legal if it lands within bounds, or if it
        // moves an out-of-bounds gene back towards them.
        let legal = |position: i64, step: i64| {
            let next = position.saturating_add(step) as f64;
            (min..=max).contains(&next)
                || (step > 0 && (position as f64) < min)
                || (step < 0 && (position as f64) > max)
        };
        let mut position = current.trunc() as i64;
        let mut steps = 0;
        loop {
            let step: i64 = if rng.gen::<bool>() { 1 } else { -1 };
            if legal(position, step) {
                position = position.saturating_add(step);
            } else if legal(position, -step) {
                position = position.saturating_add(-step);
            } else {
                unreachable!(
                    "random walk bounds [{}, {}] admit no step from {}",
                    min, max, position
                );
            }
            steps += 1;
            if !rng.gen_bool(probability) {
                break;
            }
        }
        (position, steps)
    }
}

impl fmt::Display for Mutator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}, {}]{}",
            self.mutation_type(),
            self.min_gene,
            self.max_gene,
            if self.mutation_is_bounded {
                ""
            } else {
                " (unbounded)"
            }
        )?;
        match &self.kind {
            MutationKind::Gauss { stdev, retries } => {
                write!(f, " stdev: {}, retries: {}", stdev, retries.limit())
            }
            MutationKind::Polynomial {
                distribution_index,
                alternative,
                retries,
            } => write!(
                f,
                " index: {}, alternative: {}, retries: {}",
                distribution_index,
                alternative,
                retries.limit()
            ),
            MutationKind::IntegerRandomWalk { probability } => {
                write!(f, " walk probability: {}", probability)
            }
            MutationKind::Reset | MutationKind::IntegerReset => Ok(()),
        }
    }
}

/// Uniform integer over `[min, max]`.
fn uniform_integer<R: Rng + ?Sized>(rng: &mut R, min: i64, max: i64) -> i64 {
    match max.checked_sub(min) {
        Some(span) => min + rng.gen_range(0..=span),
        // The width overflows: reject over the whole domain.
        None => loop {
            let candidate: i64 = rng.gen();
            if (min..=max).contains(&candidate) {
                break candidate;
            }
        },
    }
}

/// Uniform draw over the closed interval `[min, max]`.
/// Scales a unit draw so that spans near `f64::MAX` stay finite.
pub(crate) fn uniform_closed<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    if min == max {
        return min;
    }
    let unit: f64 = rng.gen_range(0.0..=1.0);
    (min + unit * (max - min)).clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TRIALS: usize = 10_000;

    fn gauss(min: f64, max: f64, bounded: bool, stdev: f64, retries: u32) -> Mutator {
        Mutator::new(
            min,
            max,
            bounded,
            MutationKind::Gauss {
                stdev,
                retries: RetryBudget::new(retries),
            },
        )
        .unwrap()
    }

    fn polynomial(min: f64, max: f64, bounded: bool, index: u32, alternative: bool) -> Mutator {
        Mutator::new(
            min,
            max,
            bounded,
            MutationKind::Polynomial {
                distribution_index: index,
                alternative,
                retries: RetryBudget::default(),
            },
        )
        .unwrap()
    }

    fn walk(min: f64, max: f64, bounded: bool, probability: f64) -> Mutator {
        Mutator::new(
            min,
            max,
            bounded,
            MutationKind::IntegerRandomWalk { probability },
        )
        .unwrap()
    }

    #[test]
    fn reset_stays_within_closed_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = Mutator::new(-3.0, 7.5, false, MutationKind::Reset).unwrap();
        let mut genome = vec![100.0f64; 4];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 2, &mut rng);
            assert!((-3.0..=7.5).contains(&genome[2]));
        }
        assert_eq!(genome[0], 100.0);
    }

    #[test]
    fn reset_on_single_precision_genome() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = Mutator::new(-5.0, 5.0, true, MutationKind::Reset).unwrap();
        let mut genome = vec![0.0f32; 1];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((-5.0..=5.0).contains(&genome[0]));
        }
    }

    #[test]
    fn reset_on_degenerate_range() {
        let mut rng = StdRng::seed_from_u64(1);
        let mutator = Mutator::new(2.0, 2.0, true, MutationKind::Reset).unwrap();
        let mut genome = vec![0.0f64];
        mutator.mutate(&mut genome, 0, &mut rng);
        assert_eq!(genome[0], 2.0);
    }

    #[test]
    fn integer_reset_draws_integers_within_floors() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = Mutator::new(-2.5, 3.7, true, MutationKind::IntegerReset).unwrap();
        let mut genome = vec![0.0f64];
        let mut seen = [false; 7];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 0, &mut rng);
            let v = genome[0];
            assert_eq!(v, v.trunc());
            assert!((-3.0..=3.0).contains(&v));
            seen[(v + 3.0) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn integer_reset_survives_overflowing_width() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_negative = false;
        for _ in 0..100 {
            let v = uniform_integer(&mut rng, i64::MIN + 1, i64::MAX - 1);
            assert!(v != i64::MIN && v != i64::MAX);
            seen_negative |= v < 0;
        }
        assert!(seen_negative);
    }

    #[test]
    fn bounded_gaussian_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = gauss(0.0, 1.0, true, 0.3, 100);
        let mut genome = vec![0.5f64];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((0.0..=1.0).contains(&genome[0]));
        }
    }

    #[test]
    fn unbounded_gaussian_with_zero_stdev_is_identity() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = gauss(0.0, 1.0, false, 0.0, 100);
        let mut genome = vec![123.456f64, -7.25];
        for _ in 0..100 {
            mutator.mutate(&mut genome, 0, &mut rng);
            mutator.mutate(&mut genome, 1, &mut rng);
        }
        assert_eq!(genome, vec![123.456, -7.25]);
    }

    #[test]
    fn unbounded_gaussian_may_leave_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = gauss(0.0, 1.0, false, 10.0, 100);
        let mut genome = vec![0.5f64];
        let mut escaped = false;
        for _ in 0..100 {
            mutator.mutate(&mut genome, 0, &mut rng);
            escaped |= !(0.0..=1.0).contains(&genome[0]);
        }
        assert!(escaped);
    }

    #[test]
    fn exhausted_retries_fall_back_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = gauss(0.0, 1.0, true, 1e9, 1);
        let mut genome = vec![0.5f64];
        for _ in 0..1000 {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((0.0..=1.0).contains(&genome[0]));
        }
        match mutator.kind() {
            MutationKind::Gauss { retries, .. } => assert!(retries.has_been_exhausted()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn polynomial_stays_within_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for alternative in [true, false] {
            let mutator = polynomial(-1.0, 1.0, true, 20, alternative);
            let mut genome = vec![0.9f64];
            for _ in 0..TRIALS {
                mutator.mutate(&mut genome, 0, &mut rng);
                assert!((-1.0..=1.0).contains(&genome[0]));
            }
        }
    }

    #[test]
    fn polynomial_index_zero_is_uniform_kernel() {
        let mutator = polynomial(0.0, 4.0, false, 0, false);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let mut replay = rng.clone();
            let rnd: f64 = replay.gen();
            let mut genome = vec![1.0f64];
            mutator.mutate(&mut genome, 0, &mut rng);
            let expected = 1.0 + (2.0 * rnd - 1.0) * 4.0;
            assert!((genome[0] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn alternative_polynomial_follows_both_kernel_branches() {
        let (yl, yu, y, eta) = (-2.0, 6.0, 1.0, 5.0);
        let mutator = polynomial(yl, yu, false, 5, true);
        let delta1 = (y - yl) / (yu - yl);
        let delta2 = (yu - y) / (yu - yl);
        let mut rng = StdRng::seed_from_u64(7);
        let (mut lower, mut upper) = (0, 0);
        for _ in 0..1000 {
            let rnd: f64 = rng.clone().gen();
            let deltaq = if rnd <= 0.5 {
                lower += 1;
                let val = 2.0 * rnd + (1.0 - 2.0 * rnd) * (1.0 - delta1).powf(eta + 1.0);
                val.powf(1.0 / (eta + 1.0)) - 1.0
            } else {
                upper += 1;
                let val = 2.0 * (1.0 - rnd) + 2.0 * (rnd - 0.5) * (1.0 - delta2).powf(eta + 1.0);
                1.0 - val.powf(1.0 / (eta + 1.0))
            };
            let mut genome = vec![y];
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((genome[0] - (y + deltaq * (yu - yl))).abs() < 1e-12);
            // The alternative kernel maps onto the range even when unbounded.
            assert!(genome[0] >= yl - 1e-12 && genome[0] <= yu + 1e-12);
        }
        assert!(lower > 0 && upper > 0);
    }

    #[test]
    fn uniform_draws_survive_spans_near_double_max() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = Mutator::new(0.0, f64::MAX, true, MutationKind::Reset).unwrap();
        let mut genome = vec![0.0f64];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((0.0..=f64::MAX).contains(&genome[0]));
            assert!((0.0..=f64::MAX).contains(&mutator.random_value(&mut rng)));
        }

        // Exhausting the budget falls back to the same draw.
        let mutator = gauss(0.0, f64::MAX, true, f64::MAX, 1);
        for _ in 0..100 {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((0.0..=f64::MAX).contains(&genome[0]));
        }
        match mutator.kind() {
            MutationKind::Gauss { retries, .. } => assert!(retries.has_been_exhausted()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn single_precision_gene_on_its_bound_is_accepted() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = gauss(0.0, 0.1, true, 1e-12, 1);
        let mut genome = vec![0.1f32];
        assert!(f32::get(&genome, 0) > 0.1);
        for _ in 0..100 {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert_eq!(genome[0], 0.1f32);
        }
        match mutator.kind() {
            MutationKind::Gauss { retries, .. } => assert!(!retries.has_been_exhausted()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn single_precision_reset_stays_within_narrowed_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = Mutator::new(0.0, 0.1, true, MutationKind::Reset).unwrap();
        let mut genome = vec![0.0f32];
        for _ in 0..TRIALS {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!((0.0..=0.1f32).contains(&genome[0]));
        }
        let pinned = Mutator::new(0.1, 0.1, true, MutationKind::Reset).unwrap();
        pinned.mutate(&mut genome, 0, &mut rng);
        assert_eq!(genome[0], 0.1f32);
    }

    #[test]
    fn polynomial_on_degenerate_range_pins_gene() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = polynomial(3.0, 3.0, false, 5, true);
        let mut genome = vec![3.0f64];
        mutator.mutate(&mut genome, 0, &mut rng);
        assert_eq!(genome[0], 3.0);
    }

    #[test]
    fn random_walk_steps_are_unit_sized() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = walk(-1000.0, 1000.0, true, 0.0);
        let mut genome = vec![10.0f64];
        for _ in 0..1000 {
            let before = genome[0];
            mutator.mutate(&mut genome, 0, &mut rng);
            assert_eq!(genome[0], genome[0].trunc());
            assert_eq!((genome[0] - before).abs(), 1.0);
        }
    }

    #[test]
    fn random_walk_truncates_start_and_tracks_parity() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = walk(0.0, 0.0, false, 0.7);
        for _ in 0..1000 {
            let (end, steps) = mutator.random_walk(5.9, 0.7, &mut rng);
            let distance = (end - 5).unsigned_abs() as usize;
            assert!(distance <= steps);
            assert_eq!(distance % 2, steps % 2);
        }
    }

    #[test]
    fn random_walk_length_is_geometric() {
        let mut rng = StdRng::seed_from_u64(42);
        let p = 0.5;
        let mutator = walk(0.0, 0.0, false, p);
        let mut counts = [0usize; 4];
        let trials = 20_000;
        for _ in 0..trials {
            let (_, steps) = mutator.random_walk(0.0, p, &mut rng);
            if steps <= counts.len() {
                counts[steps - 1] += 1;
            }
        }
        for (i, count) in counts.iter().enumerate() {
            let k = i as i32 + 1;
            let expected = p.powi(k - 1) * (1.0 - p);
            let observed = *count as f64 / trials as f64;
            assert!(
                (observed - expected).abs() < 0.02,
                "length {}: observed {}, expected {}",
                k,
                observed,
                expected
            );
        }
    }

    #[test]
    fn random_walk_reflects_at_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        let mutator = walk(0.0, 1.0, true, 0.9);
        let mut genome = vec![0.0f64];
        for _ in 0..1000 {
            mutator.mutate(&mut genome, 0, &mut rng);
            assert!(genome[0] == 0.0 || genome[0] == 1.0);
        }
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            Mutator::new(1.0, 0.0, true, MutationKind::Reset),
            Err(SpeciesError::InvertedBounds { .. })
        ));
        assert!(matches!(
            Mutator::new(0.0, f64::INFINITY, true, MutationKind::Reset),
            Err(SpeciesError::UnrepresentableBounds { .. })
        ));
        assert!(matches!(
            Mutator::new(-f64::MAX, f64::MAX, true, MutationKind::Reset),
            Err(SpeciesError::UnrepresentableBounds { .. })
        ));
        assert!(matches!(
            Mutator::new(
                0.0,
                1.0,
                true,
                MutationKind::Gauss {
                    stdev: -1.0,
                    retries: RetryBudget::default()
                }
            ),
            Err(SpeciesError::InvalidStdev { .. })
        ));
        assert!(matches!(
            Mutator::new(0.0, 10.0, true, MutationKind::IntegerRandomWalk { probability: 1.5 }),
            Err(SpeciesError::InvalidProbability { .. })
        ));
        assert!(matches!(
            Mutator::new(0.2, 0.8, true, MutationKind::IntegerRandomWalk { probability: 0.5 }),
            Err(SpeciesError::NarrowRandomWalkBounds { .. })
        ));
        assert!(
            Mutator::new(0.2, 0.8, false, MutationKind::IntegerRandomWalk { probability: 0.5 })
                .is_ok()
        );
    }

    #[test]
    fn mutators_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Mutator>();
    }
}
