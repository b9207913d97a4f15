//! Parameter names recognised by [`FloatVectorSpecies`].
//!
//! [`FloatVectorSpecies`]: crate::FloatVectorSpecies

/// Base under which every name is looked up when it is
/// absent from the species' own base.
pub const DEFAULT_BASE: &str = "vector.species";

pub const GENOME_SIZE: &str = "genome-size";
pub const MIN_GENE: &str = "min-gene";
pub const MAX_GENE: &str = "max-gene";
pub const MUTATION_TYPE: &str = "mutation-type";
pub const MUTATION_STDEV: &str = "mutation-stdev";
pub const DISTRIBUTION_INDEX: &str = "mutation-distribution-index";
pub const ALTERNATIVE_POLYNOMIAL: &str = "alternative-polynomial-version";
pub const RANDOM_WALK_PROBABILITY: &str = "random-walk-probability";
pub const OUT_OF_BOUNDS_RETRIES: &str = "out-of-bounds-retries";
pub const MUTATION_BOUNDED: &str = "mutation-bounded";
pub const MUTATION_PROBABILITY: &str = "mutation-prob";

pub const NUM_SEGMENTS: &str = "num-segments";
pub const SEGMENT_TYPE: &str = "segment-type";
/// Prefix of every segment-layer key, as in `segment.<k>.min-gene`.
pub const SEGMENT: &str = "segment";
pub const SEGMENT_START: &str = "start";
pub const SEGMENT_END: &str = "end";
