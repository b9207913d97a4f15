use crate::mutators::{Layer, MutationType};
use crate::{Parameter, ParameterError};

use thiserror::Error;

/// An error type indicating a species could not be
/// set up from its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpeciesError {
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error("missing required parameter {key}")]
    MissingParameter { key: Parameter },
    #[error("parameter {key} has unknown mutation type '{value}'")]
    UnknownMutationType { key: Parameter, value: String },
    #[error("{layer}: max-gene {max} is less than min-gene {min}")]
    InvertedBounds { layer: Layer, min: f64, max: f64 },
    #[error("{layer}: bounds [{min}, {max}] do not span a finite range")]
    UnrepresentableBounds { layer: Layer, min: f64, max: f64 },
    #[error("gene {gene}: bounds [{min}, {max}] are outside the range of {precision}")]
    BoundsOutOfNumericalRange {
        gene: usize,
        min: f64,
        max: f64,
        precision: &'static str,
    },
    #[error("{layer}: out-of-bounds-retries must be non-negative, got {value}")]
    NegativeRetries { layer: Layer, value: i64 },
    #[error("{layer}: mutation-distribution-index must be non-negative, got {value}")]
    NegativeDistributionIndex { layer: Layer, value: i64 },
    #[error("{layer}: mutation-stdev must be a non-negative number, got {value}")]
    InvalidStdev { layer: Layer, value: f64 },
    #[error("{layer}: {name} must be within [0, 1], got {value}")]
    InvalidProbability {
        layer: Layer,
        name: &'static str,
        value: f64,
    },
    #[error("{layer}: {mutation_type} mutation requires {name}, which is neither set nor inherited")]
    MissingVariantParameter {
        layer: Layer,
        name: &'static str,
        mutation_type: MutationType,
    },
    #[error("{layer}: bounded integer random walk needs at least two integers within [{min}, {max}]")]
    NarrowRandomWalkBounds { layer: Layer, min: f64, max: f64 },
    #[error("genome-size must be at least 1, got {0}")]
    InvalidGenomeSize(usize),
    #[error("segment-type must be 'start' or 'end', got '{0}'")]
    InvalidSegmentType(String),
    #[error("num-segments must be between 1 and the genome size {genome_size}, got {value}")]
    InvalidSegmentCount { value: usize, genome_size: usize },
    #[error("segment {segment}: index {index} is outside a genome of size {genome_size}")]
    SegmentIndexOutOfRange {
        segment: usize,
        index: usize,
        genome_size: usize,
    },
    #[error("segment {segment}: index {index} does not follow the previous segment's {previous}")]
    UnorderedSegments {
        segment: usize,
        index: usize,
        previous: usize,
    },
}
