use serde::{Deserialize, Serialize};

use std::fmt;

/// A scalar gene storage type.
///
/// Mutation algorithms always compute in `f64`;
/// the storage precision is applied when a value
/// is written back through [`Gene::set`] and when
/// it is checked against the gene bounds.
pub trait Gene: Copy + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Largest finite magnitude representable by the storage type.
    const MAX: f64;

    /// Widens the stored value.
    fn to_f64(self) -> f64;

    /// Narrows a computed value to the storage precision.
    fn from_f64(value: f64) -> Self;

    /// Reads the gene at `index` as an `f64`.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Gene;
    ///
    /// let genome = [1.5f32, -2.0, 8.25];
    ///
    /// assert_eq!(f32::get(&genome, 2), 8.25);
    /// ```
    fn get(genome: &[Self], index: usize) -> f64 {
        genome[index].to_f64()
    }

    /// Writes `value` to the gene at `index`, truncating
    /// to the storage precision.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Gene;
    ///
    /// let mut genome = [0.0f32; 3];
    /// f32::set(&mut genome, 1, 0.1);
    ///
    /// assert_eq!(genome[1], 0.1f32);
    /// assert_ne!(f32::get(&genome, 1), 0.1f64);
    /// ```
    fn set(genome: &mut [Self], index: usize, value: f64) {
        debug_assert!(!value.is_nan(), "attempted to store NaN in gene {}", index);
        genome[index] = Self::from_f64(value);
    }

    /// Rounds `value` to the storage precision and widens it back.
    /// Monotonic, so a value within `[min, max]` narrows into
    /// `[narrow(min), narrow(max)]`.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Gene;
    ///
    /// assert_eq!(f32::narrow(0.1), 0.1f32 as f64);
    /// assert_eq!(f64::narrow(0.1), 0.1);
    /// ```
    fn narrow(value: f64) -> f64 {
        Self::from_f64(value).to_f64()
    }

    /// Returns whether `value` can be stored without
    /// overflowing to an infinity.
    fn in_numerical_range(value: f64) -> bool {
        value.is_finite() && value.abs() <= Self::MAX
    }
}

impl Gene for f32 {
    const MAX: f64 = f32::MAX as f64;

    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> f32 {
        value as f32
    }
}

impl Gene for f64 {
    const MAX: f64 = f64::MAX;

    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> f64 {
        value
    }
}

/// A fixed-length real-valued genome together
/// with its (optional) fitness.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorIndividual<T> {
    pub genome: Vec<T>,
    pub fitness: Option<f64>,
}

impl<T: Gene> VectorIndividual<T> {
    /// Wraps a genome in an unevaluated individual.
    ///
    /// # Examples
    /// ```
    /// use oxivec::VectorIndividual;
    ///
    /// let individual = VectorIndividual::new(vec![0.5f64, 1.0]);
    ///
    /// assert_eq!(individual.fitness, None);
    /// assert_eq!(individual.len(), 2);
    /// ```
    pub fn new(genome: Vec<T>) -> VectorIndividual<T> {
        VectorIndividual {
            genome,
            fitness: None,
        }
    }

    /// Returns the genome length.
    pub fn len(&self) -> usize {
        self.genome.len()
    }

    /// Returns whether the genome is empty.
    pub fn is_empty(&self) -> bool {
        self.genome.is_empty()
    }
}

impl<T: Gene> fmt::Display for VectorIndividual<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}]",
            self.genome
                .iter()
                .map(|g| format!("{:.4}", g.to_f64()))
                .collect::<Vec<_>>()
                .join(", ")
        )?;
        match self.fitness {
            Some(fitness) => write!(f, " fitness: {:.6}", fitness),
            None => write!(f, " (unevaluated)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_precision_truncates_on_write() {
        let mut genome = vec![0.0f32; 2];
        f32::set(&mut genome, 0, 1.0 / 3.0);
        assert_eq!(genome[0], (1.0f64 / 3.0) as f32);
        assert!((f32::get(&genome, 0) - 1.0 / 3.0).abs() < 1e-7);
        assert_ne!(f32::get(&genome, 0), 1.0 / 3.0);
    }

    #[test]
    fn double_precision_is_exact() {
        let mut genome = vec![0.0f64; 2];
        f64::set(&mut genome, 1, 1.0 / 3.0);
        assert_eq!(f64::get(&genome, 1), 1.0 / 3.0);
    }

    #[test]
    fn narrowing_preserves_order() {
        let (min, max) = (0.0, 0.1);
        for value in [0.0, 0.05, 0.099_999_999_9, 0.1] {
            let narrowed = f32::narrow(value);
            assert!(narrowed >= f32::narrow(min) && narrowed <= f32::narrow(max));
        }
        assert!(f32::narrow(0.1) > 0.1);
    }

    #[test]
    fn numerical_range() {
        assert!(f32::in_numerical_range(1e38));
        assert!(!f32::in_numerical_range(1e39));
        assert!(f64::in_numerical_range(1e300));
        assert!(!f64::in_numerical_range(f64::INFINITY));
        assert!(!f64::in_numerical_range(f64::NAN));
    }
}
