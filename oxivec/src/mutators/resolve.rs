use super::{MutationKind, MutationType, Mutator, RetryBudget};
use crate::names;
use crate::species::{Lookup, SpeciesError};
use crate::{Parameter, ParameterSource};

use serde::{Deserialize, Serialize};

use std::fmt;

/// A level of the configuration hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Applies to the whole genome.
    Global,
    /// Applies to every gene of the `k`th segment.
    Segment(usize),
    /// Applies to a single gene index.
    Gene(usize),
}

impl Layer {
    /// Returns the key under which `name` is
    /// configured for this layer.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{mutators::Layer, Parameter};
    ///
    /// let base = Parameter::new("species");
    ///
    /// assert_eq!(Layer::Global.key(&base, "min-gene").as_str(), "species.min-gene");
    /// assert_eq!(Layer::Segment(2).key(&base, "min-gene").as_str(), "species.segment.2.min-gene");
    /// assert_eq!(Layer::Gene(7).key(&base, "min-gene").as_str(), "species.min-gene.7");
    /// ```
    pub fn key(&self, base: &Parameter, name: &str) -> Parameter {
        match self {
            Layer::Global => base.push(name),
            Layer::Segment(k) => base.push(names::SEGMENT).push(k).push(name),
            Layer::Gene(i) => base.push(name).push(i),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Global => write!(f, "global"),
            Layer::Segment(k) => write!(f, "segment {}", k),
            Layer::Gene(i) => write!(f, "gene {}", i),
        }
    }
}

/// The parameters a single layer explicitly sets.
/// Unset (`None`) fields are inherited during [`resolve`].
///
/// Integer counts are kept signed so that negative
/// configured values can be reported rather than
/// rejected as unparsable.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutatorOverrides {
    pub mutation_type: Option<MutationType>,
    pub min_gene: Option<f64>,
    pub max_gene: Option<f64>,
    pub mutation_is_bounded: Option<bool>,
    pub stdev: Option<f64>,
    pub distribution_index: Option<i64>,
    pub alternative: Option<bool>,
    pub walk_probability: Option<f64>,
    pub out_of_bounds_retries: Option<i64>,
}

impl MutatorOverrides {
    /// Reads every mutation parameter configured at `layer`.
    pub(crate) fn load<P>(lookup: &Lookup<'_, P>, layer: Layer) -> Result<MutatorOverrides, SpeciesError>
    where
        P: ParameterSource + ?Sized,
    {
        let mutation_type = match lookup.string(layer, names::MUTATION_TYPE) {
            None => None,
            Some(value) => Some(value.parse::<MutationType>().map_err(|_| {
                SpeciesError::UnknownMutationType {
                    key: lookup.find(layer, names::MUTATION_TYPE),
                    value,
                }
            })?),
        };
        Ok(MutatorOverrides {
            mutation_type,
            min_gene: lookup.f64(layer, names::MIN_GENE)?,
            max_gene: lookup.f64(layer, names::MAX_GENE)?,
            mutation_is_bounded: lookup.bool(layer, names::MUTATION_BOUNDED)?,
            stdev: lookup.f64(layer, names::MUTATION_STDEV)?,
            distribution_index: lookup.i64(layer, names::DISTRIBUTION_INDEX)?,
            alternative: lookup.bool(layer, names::ALTERNATIVE_POLYNOMIAL)?,
            walk_probability: lookup.f64(layer, names::RANDOM_WALK_PROBABILITY)?,
            out_of_bounds_retries: lookup.i64(layer, names::OUT_OF_BOUNDS_RETRIES)?,
        })
    }

    /// Returns whether the layer sets nothing.
    pub fn is_empty(&self) -> bool {
        *self == MutatorOverrides::default()
    }
}

/// A parameter which was given its hardcoded
/// default because nothing configured or inherited it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Defaulted {
    MutationType,
    MutationBounded,
    AlternativePolynomial,
    Stdev,
}

impl Defaulted {
    /// Returns the parameter name.
    pub fn name(&self) -> &'static str {
        match self {
            Defaulted::MutationType => names::MUTATION_TYPE,
            Defaulted::MutationBounded => names::MUTATION_BOUNDED,
            Defaulted::AlternativePolynomial => names::ALTERNATIVE_POLYNOMIAL,
            Defaulted::Stdev => names::MUTATION_STDEV,
        }
    }

    /// Returns the default value's display form.
    pub fn value(&self) -> &'static str {
        match self {
            Defaulted::MutationType => "reset",
            Defaulted::MutationBounded | Defaulted::AlternativePolynomial => "true",
            Defaulted::Stdev => "0",
        }
    }
}

/// The outcome of [`resolve`].
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub mutator: Mutator,
    pub defaulted: Vec<Defaulted>,
}

/// Merges a layer's overrides onto its already-resolved ancestors.
///
/// `ancestors` is ordered nearest first (for a gene: its segment's
/// mutator, then the global one; empty for the global layer).
/// Shared parameters come from the nearest ancestor. Parameters
/// specific to the resolved mutation type come from the nearest
/// ancestor of that same type, so a layer switching type never
/// picks up an unrelated parent's payload. Anything left unset
/// takes its hardcoded default, reported in [`Resolved::defaulted`].
///
/// # Errors
/// Returns an error if a required parameter is neither set nor
/// inheritable, if a count is negative, or if the merged mutator
/// fails validation.
///
/// # Examples
/// ```
/// use oxivec::mutators::{
///     resolve, Defaulted, Layer, MutationKind, MutationType, MutatorOverrides,
/// };
///
/// let global = resolve(
///     &[],
///     &MutatorOverrides {
///         mutation_type: Some(MutationType::Gauss),
///         min_gene: Some(-1.0),
///         max_gene: Some(1.0),
///         mutation_is_bounded: Some(true),
///         stdev: Some(0.25),
///         ..MutatorOverrides::default()
///     },
///     Layer::Global,
/// )
/// .unwrap();
/// assert!(global.defaulted.is_empty());
///
/// let gene = resolve(
///     &[&global.mutator],
///     &MutatorOverrides {
///         max_gene: Some(5.0),
///         ..MutatorOverrides::default()
///     },
///     Layer::Gene(3),
/// )
/// .unwrap()
/// .mutator;
///
/// assert_eq!(gene.min_gene(), -1.0);
/// assert_eq!(gene.max_gene(), 5.0);
/// assert!(matches!(gene.kind(), MutationKind::Gauss { stdev, .. } if *stdev == 0.25));
/// ```
pub fn resolve(
    ancestors: &[&Mutator],
    overrides: &MutatorOverrides,
    layer: Layer,
) -> Result<Resolved, SpeciesError> {
    let parent = ancestors.first().copied();
    let mut defaulted = Vec::new();

    let mutation_type = match (overrides.mutation_type, parent) {
        (Some(t), _) => t,
        (None, Some(p)) => p.mutation_type(),
        (None, None) => {
            defaulted.push(Defaulted::MutationType);
            MutationType::Reset
        }
    };
    let min_gene = overrides
        .min_gene
        .or_else(|| parent.map(Mutator::min_gene))
        .unwrap_or(0.0);
    let max_gene = overrides
        .max_gene
        .or_else(|| parent.map(Mutator::max_gene))
        .unwrap_or(min_gene);
    let mutation_is_bounded = match (overrides.mutation_is_bounded, parent) {
        (Some(b), _) => b,
        (None, Some(p)) => p.mutation_is_bounded(),
        (None, None) => {
            defaulted.push(Defaulted::MutationBounded);
            true
        }
    };

    let same_typed = ancestors
        .iter()
        .map(|a| a.kind())
        .find(|k| k.mutation_type() == mutation_type);

    let kind = match mutation_type {
        MutationType::Reset => MutationKind::Reset,
        MutationType::IntegerReset => MutationKind::IntegerReset,
        MutationType::Gauss => {
            let stdev = match (overrides.stdev, same_typed) {
                (Some(s), _) => s,
                (None, Some(MutationKind::Gauss { stdev, .. })) => *stdev,
                _ => {
                    defaulted.push(Defaulted::Stdev);
                    0.0
                }
            };
            MutationKind::Gauss {
                stdev,
                retries: retries(ancestors, overrides, layer)?,
            }
        }
        MutationType::Polynomial => {
            let distribution_index = match (overrides.distribution_index, same_typed) {
                (Some(i), _) => u32::try_from(i).map_err(|_| {
                    SpeciesError::NegativeDistributionIndex { layer, value: i }
                })?,
                (None, Some(MutationKind::Polynomial {
                    distribution_index, ..
                })) => *distribution_index,
                _ => {
                    return Err(SpeciesError::MissingVariantParameter {
                        layer,
                        name: names::DISTRIBUTION_INDEX,
                        mutation_type,
                    })
                }
            };
            let alternative = match (overrides.alternative, same_typed) {
                (Some(a), _) => a,
                (None, Some(MutationKind::Polynomial { alternative, .. })) => *alternative,
                _ => {
                    defaulted.push(Defaulted::AlternativePolynomial);
                    true
                }
            };
            MutationKind::Polynomial {
                distribution_index,
                alternative,
                retries: retries(ancestors, overrides, layer)?,
            }
        }
        MutationType::IntegerRandomWalk => {
            let probability = match (overrides.walk_probability, same_typed) {
                (Some(p), _) => p,
                (None, Some(MutationKind::IntegerRandomWalk { probability })) => *probability,
                _ => {
                    return Err(SpeciesError::MissingVariantParameter {
                        layer,
                        name: names::RANDOM_WALK_PROBABILITY,
                        mutation_type,
                    })
                }
            };
            MutationKind::IntegerRandomWalk { probability }
        }
    };

    let mutator = Mutator::build(min_gene, max_gene, mutation_is_bounded, kind, layer)?;
    Ok(Resolved { mutator, defaulted })
}

/// The retry budget is shared by both rejection-sampling
/// variants, so it is inherited from the nearest ancestor
/// that has one, whichever of the two it is.
fn retries(
    ancestors: &[&Mutator],
    overrides: &MutatorOverrides,
    layer: Layer,
) -> Result<RetryBudget, SpeciesError> {
    if let Some(limit) = overrides.out_of_bounds_retries {
        return u32::try_from(limit)
            .map(RetryBudget::new)
            .map_err(|_| SpeciesError::NegativeRetries { layer, value: limit });
    }
    let inherited = ancestors.iter().find_map(|a| match a.kind() {
        MutationKind::Gauss { retries, .. } | MutationKind::Polynomial { retries, .. } => {
            Some(RetryBudget::new(retries.limit()))
        }
        _ => None,
    });
    Ok(inherited.unwrap_or_default())
}
