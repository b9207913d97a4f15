//! Species setup: one resolved [`Mutator`] per gene.
mod errors;
mod lookup;
mod segments;

pub use errors::SpeciesError;
pub(crate) use lookup::Lookup;
pub use segments::Segments;

use crate::mutators::{resolve, Defaulted, Layer, MutationKind, MutationType, Mutator, MutatorOverrides};
use crate::names;
use crate::{Gene, Parameter, ParameterSource, VectorIndividual};

use ahash::RandomState;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::marker::PhantomData;

/// The mutation configuration of a real-valued genome
/// stored at precision `T`.
///
/// Built once by [`setup`] from a parameter source, after
/// which it is immutable and may be shared between threads
/// mutating different genomes.
///
/// [`setup`]: FloatVectorSpecies::setup
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct FloatVectorSpecies<T> {
    genome_size: usize,
    mutators: Vec<Mutator>,
    mutation_probability: Vec<f64>,
    segments: Option<Segments>,
    #[serde(skip)]
    precision: PhantomData<T>,
}

impl<T: Gene> FloatVectorSpecies<T> {
    /// Resolves every gene's mutation operator from the
    /// parameters under `base`, falling back to the
    /// `vector.species` base for absent keys.
    ///
    /// Resolution runs global, then per segment, then per gene;
    /// each layer inherits whatever it leaves unset from the
    /// layer above.
    ///
    /// # Errors
    /// Returns an error on any malformed, missing or
    /// inconsistent configuration.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{FloatVectorSpecies, MutationType, Parameter};
    /// use oxivec_params::ParameterDatabase;
    ///
    /// let params = ParameterDatabase::parse(
    ///     "
    ///     species.genome-size = 3
    ///     species.min-gene = -1
    ///     species.max-gene = 1
    ///     species.mutation-type = gauss
    ///     species.mutation-stdev = 0.1
    ///     species.mutation-bounded = true
    ///     species.mutation-type.2 = polynomial
    ///     species.mutation-distribution-index.2 = 20
    ///     species.alternative-polynomial-version.2 = false
    ///     ",
    /// )
    /// .unwrap();
    ///
    /// let species = FloatVectorSpecies::<f64>::setup(&params, &Parameter::new("species")).unwrap();
    ///
    /// assert_eq!(species.genome_size(), 3);
    /// assert_eq!(species.mutation_type(1), MutationType::Gauss);
    /// assert_eq!(species.mutation_type(2), MutationType::Polynomial);
    /// assert_eq!(species.gauss_mutation_stdev(2), None);
    /// assert_eq!(species.mutation_probability(0), 1.0 / 3.0);
    /// ```
    pub fn setup<P>(params: &P, base: &Parameter) -> Result<FloatVectorSpecies<T>, SpeciesError>
    where
        P: ParameterSource + ?Sized,
    {
        let lookup = Lookup::new(params, base.clone());
        let genome_size = lookup
            .usize(Layer::Global, names::GENOME_SIZE)?
            .ok_or_else(|| SpeciesError::MissingParameter {
                key: lookup.find(Layer::Global, names::GENOME_SIZE),
            })?;
        if genome_size == 0 {
            return Err(SpeciesError::InvalidGenomeSize(genome_size));
        }

        let mut warnings = DefaultWarnings::new(base);

        let global = resolve(
            &[],
            &MutatorOverrides::load(&lookup, Layer::Global)?,
            Layer::Global,
        )?;
        warnings.report(Layer::Global, &global.defaulted);
        let global_mutator = global.mutator;
        let global_probability =
            mutation_probability(&lookup, Layer::Global)?.unwrap_or(1.0 / genome_size as f64);

        let segments = Segments::load(&lookup, genome_size)?;
        let mut segment_mutators = Vec::new();
        let mut segment_probabilities = Vec::new();
        for k in 0..segments.as_ref().map_or(0, Segments::len) {
            let layer = Layer::Segment(k);
            let resolved = resolve(
                &[&global_mutator],
                &MutatorOverrides::load(&lookup, layer)?,
                layer,
            )?;
            warnings.report(layer, &resolved.defaulted);
            segment_mutators.push(resolved.mutator);
            segment_probabilities
                .push(mutation_probability(&lookup, layer)?.unwrap_or(global_probability));
        }

        let mut mutators = Vec::with_capacity(genome_size);
        let mut probabilities = Vec::with_capacity(genome_size);
        for i in 0..genome_size {
            let layer = Layer::Gene(i);
            let segment = segments.as_ref().and_then(|s| s.segment_of(i));
            let ancestors = match segment {
                Some(k) => vec![&segment_mutators[k], &global_mutator],
                None => vec![&global_mutator],
            };
            let overrides = MutatorOverrides::load(&lookup, layer)?;
            let mutator = if overrides.is_empty() {
                ancestors[0].clone()
            } else {
                let resolved = resolve(&ancestors, &overrides, layer)?;
                warnings.report(layer, &resolved.defaulted);
                resolved.mutator
            };

            if !T::in_numerical_range(mutator.min_gene())
                || !T::in_numerical_range(mutator.max_gene())
            {
                return Err(SpeciesError::BoundsOutOfNumericalRange {
                    gene: i,
                    min: mutator.min_gene(),
                    max: mutator.max_gene(),
                    precision: std::any::type_name::<T>(),
                });
            }
            debug!("{}: {}", layer, mutator);

            let inherited = segment.map_or(global_probability, |k| segment_probabilities[k]);
            probabilities.push(mutation_probability(&lookup, layer)?.unwrap_or(inherited));
            mutators.push(mutator);
        }

        if let Some(t) = mutators
            .iter()
            .map(Mutator::mutation_type)
            .find(MutationType::is_integer_type)
        {
            info!(
                "{} mutation used in {}; these genes are only initialized to integer values",
                t, base
            );
        }

        Ok(FloatVectorSpecies {
            genome_size,
            mutators,
            mutation_probability: probabilities,
            segments,
            precision: PhantomData,
        })
    }

    /// Builds a species directly from per-gene mutators,
    /// each mutated with the same probability.
    ///
    /// # Errors
    /// Returns an error if `mutators` is empty, if the
    /// probability is outside [0, 1], or if any bound
    /// cannot be stored at precision `T`.
    pub fn from_mutators(
        mutators: Vec<Mutator>,
        mutation_probability: f64,
    ) -> Result<FloatVectorSpecies<T>, SpeciesError> {
        if mutators.is_empty() {
            return Err(SpeciesError::InvalidGenomeSize(0));
        }
        if !(0.0..=1.0).contains(&mutation_probability) {
            return Err(SpeciesError::InvalidProbability {
                layer: Layer::Global,
                name: names::MUTATION_PROBABILITY,
                value: mutation_probability,
            });
        }
        if let Some((gene, m)) = mutators.iter().enumerate().find(|(_, m)| {
            !T::in_numerical_range(m.min_gene()) || !T::in_numerical_range(m.max_gene())
        }) {
            return Err(SpeciesError::BoundsOutOfNumericalRange {
                gene,
                min: m.min_gene(),
                max: m.max_gene(),
                precision: std::any::type_name::<T>(),
            });
        }
        Ok(FloatVectorSpecies {
            genome_size: mutators.len(),
            mutation_probability: vec![mutation_probability; mutators.len()],
            mutators,
            segments: None,
            precision: PhantomData,
        })
    }

    /// Returns the number of genes.
    pub fn genome_size(&self) -> usize {
        self.genome_size
    }

    /// Returns the mutator of gene `index`.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutator(&self, index: usize) -> &Mutator {
        &self.mutators[index]
    }

    /// Returns all per-gene mutators.
    pub fn mutators(&self) -> &[Mutator] {
        &self.mutators
    }

    /// Returns the segmentation, if one was configured.
    pub fn segments(&self) -> Option<&Segments> {
        self.segments.as_ref()
    }

    /// Returns the segment of gene `index`, if any.
    pub fn segment_of(&self, index: usize) -> Option<usize> {
        self.segments.as_ref().and_then(|s| s.segment_of(index))
    }

    /// Returns the minimum value of gene `index`.
    /// Indices past the end refer to the last gene.
    pub fn min_gene(&self, index: usize) -> f64 {
        self.clamped(index).min_gene()
    }

    /// Returns the maximum value of gene `index`.
    /// Indices past the end refer to the last gene.
    pub fn max_gene(&self, index: usize) -> f64 {
        self.clamped(index).max_gene()
    }

    fn clamped(&self, index: usize) -> &Mutator {
        &self.mutators[index.min(self.genome_size - 1)]
    }

    /// Returns whether mutation of gene `index` must respect its bounds.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutation_is_bounded(&self, index: usize) -> bool {
        self.mutators[index].mutation_is_bounded()
    }

    /// Returns the mutation type of gene `index`.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutation_type(&self, index: usize) -> MutationType {
        self.mutators[index].mutation_type()
    }

    /// Returns whether gene `index` only takes integer values.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn is_integer_type(&self, index: usize) -> bool {
        self.mutators[index].is_integer_type()
    }

    /// Returns the chance that [`mutate_genome`] mutates gene `index`.
    ///
    /// [`mutate_genome`]: FloatVectorSpecies::mutate_genome
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutation_probability(&self, index: usize) -> f64 {
        self.mutation_probability[index]
    }

    /// Returns the Gaussian standard deviation of gene
    /// `index`, or `None` if it is not Gaussian-mutated.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn gauss_mutation_stdev(&self, index: usize) -> Option<f64> {
        match self.mutators[index].kind() {
            MutationKind::Gauss { stdev, .. } => Some(*stdev),
            _ => None,
        }
    }

    /// Returns the polynomial distribution index of gene
    /// `index`, or `None` if it is not polynomially mutated.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutation_distribution_index(&self, index: usize) -> Option<u32> {
        match self.mutators[index].kind() {
            MutationKind::Polynomial {
                distribution_index, ..
            } => Some(*distribution_index),
            _ => None,
        }
    }

    /// Returns whether gene `index` uses the alternative polynomial
    /// kernel, or `None` if it is not polynomially mutated.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn polynomial_is_alternative(&self, index: usize) -> Option<bool> {
        match self.mutators[index].kind() {
            MutationKind::Polynomial { alternative, .. } => Some(*alternative),
            _ => None,
        }
    }

    /// Returns the walk continuation chance of gene `index`,
    /// or `None` if it is not mutated by integer random walk.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn random_walk_probability(&self, index: usize) -> Option<f64> {
        match self.mutators[index].kind() {
            MutationKind::IntegerRandomWalk { probability } => Some(*probability),
            _ => None,
        }
    }

    /// Returns the retry budget of gene `index`, or `None`
    /// if its mutation never proposes out-of-bounds values.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn out_of_bounds_retries(&self, index: usize) -> Option<u32> {
        match self.mutators[index].kind() {
            MutationKind::Gauss { retries, .. } | MutationKind::Polynomial { retries, .. } => {
                Some(retries.limit())
            }
            _ => None,
        }
    }

    /// Mutates gene `index` of `genome` with that gene's operator.
    ///
    /// # Panics
    /// Panics if `index >= genome_size()`.
    pub fn mutate<R: Rng + ?Sized>(&self, genome: &mut [T], index: usize, rng: &mut R) {
        self.mutators[index].mutate(genome, index, rng);
    }

    /// Mutates each gene of `genome` with its own mutation
    /// probability. Returns the number of genes mutated.
    ///
    /// # Examples
    /// ```
    /// use oxivec::{FloatVectorSpecies, Mutator, MutationKind};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let reset = Mutator::new(0.0, 1.0, true, MutationKind::Reset).unwrap();
    /// let species = FloatVectorSpecies::<f32>::from_mutators(vec![reset; 4], 1.0).unwrap();
    ///
    /// let mut genome = vec![5.0f32; 4];
    /// let mutated = species.mutate_genome(&mut genome, &mut StdRng::seed_from_u64(0));
    ///
    /// assert_eq!(mutated, 4);
    /// assert!(species.in_bounds(&genome));
    /// ```
    pub fn mutate_genome<R: Rng + ?Sized>(&self, genome: &mut [T], rng: &mut R) -> usize {
        debug_assert_eq!(genome.len(), self.genome_size);
        let mut mutated = 0;
        for (index, (mutator, &p)) in self
            .mutators
            .iter()
            .zip(&self.mutation_probability)
            .enumerate()
            .take(genome.len())
        {
            if rng.gen_bool(p) {
                mutator.mutate(genome, index, rng);
                mutated += 1;
            }
        }
        mutated
    }

    /// Creates an unevaluated individual with every
    /// gene drawn uniformly within its bounds.
    pub fn new_individual<R: Rng + ?Sized>(&self, rng: &mut R) -> VectorIndividual<T> {
        VectorIndividual::new(
            self.mutators
                .iter()
                .map(|m| T::from_f64(m.random_value(rng)))
                .collect(),
        )
    }

    /// Returns whether every gene of `genome` lies within its
    /// bounds, compared at precision `T`.
    pub fn in_bounds(&self, genome: &[T]) -> bool {
        genome.len() == self.genome_size
            && genome.iter().zip(&self.mutators).all(|(&g, m)| {
                g >= T::from_f64(m.min_gene()) && g <= T::from_f64(m.max_gene())
            })
    }
}

fn mutation_probability<P>(lookup: &Lookup<'_, P>, layer: Layer) -> Result<Option<f64>, SpeciesError>
where
    P: ParameterSource + ?Sized,
{
    match lookup.f64(layer, names::MUTATION_PROBABILITY)? {
        Some(p) if !(0.0..=1.0).contains(&p) => Err(SpeciesError::InvalidProbability {
            layer,
            name: names::MUTATION_PROBABILITY,
            value: p,
        }),
        p => Ok(p),
    }
}

/// Warns about each defaulted parameter once per setup.
struct DefaultWarnings<'a> {
    base: &'a Parameter,
    seen: HashSet<Defaulted, RandomState>,
}

impl<'a> DefaultWarnings<'a> {
    fn new(base: &'a Parameter) -> DefaultWarnings<'a> {
        DefaultWarnings {
            base,
            seen: HashSet::default(),
        }
    }

    /// Returns how many warnings were emitted.
    fn report(&mut self, layer: Layer, defaulted: &[Defaulted]) -> usize {
        let mut emitted = 0;
        for d in defaulted {
            if self.seen.insert(*d) {
                emitted += 1;
                warn!(
                    "no {} given for {} ({}), assuming {}",
                    d.name(),
                    self.base,
                    layer,
                    d.value()
                );
            }
        }
        emitted
    }
}
