//! Per-gene mutation for fixed-length real-valued genomes.
//!
//! Each gene of a [`FloatVectorSpecies`] owns an immutable [`Mutator`]:
//! its legal bounds, whether mutation must respect them, and one of five
//! mutation algorithms (`reset`, `gauss`, `polynomial`, `integer-reset`,
//! `integer-random-walk`). Mutators are resolved once from a hierarchical
//! configuration where every parameter may be set globally, per segment
//! of the genome, or per gene, with each layer inheriting what it leaves
//! unset from the layer above.
//!
//! Configuration is read through the [`ParameterSource`] trait. Plain
//! `HashMap<String, String>`s implement it; file-backed parameter databases
//! are supplied by the [`OxiVec-Params`](https://crates.io/crates/oxivec-params) crate.
//!
//! Genomes may be stored in single (`f32`) or double (`f64`) precision.
//! All computation happens in `f64` and is narrowed only when written back.
//!
//! # Example usage: a segmented genome
//! ```
//! use oxivec::{FloatVectorSpecies, MutationType, Parameter};
//! use oxivec_params::ParameterDatabase;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let params = ParameterDatabase::parse(
//!     "
//!     ## Ten genes, Gaussian mutation within [-5.12, 5.12].
//!     vector.species.genome-size = 10
//!     vector.species.min-gene = -5.12
//!     vector.species.max-gene = 5.12
//!     vector.species.mutation-type = gauss
//!     vector.species.mutation-stdev = 0.3
//!     vector.species.mutation-bounded = true
//!     vector.species.mutation-prob = 0.2
//!
//!     ## The last four genes are integer-valued.
//!     vector.species.num-segments = 2
//!     vector.species.segment.0.start = 0
//!     vector.species.segment.1.start = 6
//!     vector.species.segment.1.mutation-type = integer-random-walk
//!     vector.species.segment.1.random-walk-probability = 0.5
//!     vector.species.segment.1.min-gene = -5
//!     vector.species.segment.1.max-gene = 5
//!     ",
//! )
//! .unwrap();
//!
//! let species =
//!     FloatVectorSpecies::<f32>::setup(&params, &Parameter::new("vector.species")).unwrap();
//! assert_eq!(species.mutation_type(3), MutationType::Gauss);
//! assert_eq!(species.mutation_type(8), MutationType::IntegerRandomWalk);
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let mut individual = species.new_individual(&mut rng);
//! for _ in 0..100 {
//!     species.mutate_genome(&mut individual.genome, &mut rng);
//!     assert!(species.in_bounds(&individual.genome));
//! }
//! assert!(individual.genome[6..].iter().all(|g| g.fract() == 0.0));
//! ```

mod genome;
pub mod mutators;
mod parameters;
mod species;

pub use genome::*;
pub use mutators::{MutationKind, MutationType, Mutator};
pub use parameters::*;
pub use species::*;
