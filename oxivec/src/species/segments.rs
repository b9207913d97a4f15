use super::{Lookup, SpeciesError};
use crate::names;
use crate::ParameterSource;

use log::warn;
use serde::{Deserialize, Serialize};

use std::ops::Range;

/// Contiguous gene ranges which share a segment-level configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segments {
    ranges: Vec<Range<usize>>,
}

impl Segments {
    /// Builds segments from strictly increasing start indices.
    /// Each segment runs until the next start; the last one
    /// runs to the end of the genome.
    ///
    /// # Errors
    /// Returns an error if the starts are empty, unordered,
    /// or not within the genome.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Segments;
    ///
    /// let segments = Segments::from_starts(&[0, 2, 5], 8).unwrap();
    ///
    /// assert_eq!(segments.segment_of(1), Some(0));
    /// assert_eq!(segments.segment_of(4), Some(1));
    /// assert_eq!(segments.segment_of(7), Some(2));
    /// ```
    pub fn from_starts(starts: &[usize], genome_size: usize) -> Result<Segments, SpeciesError> {
        check_indices(starts, genome_size)?;
        let ranges = starts
            .iter()
            .enumerate()
            .map(|(k, &start)| start..starts.get(k + 1).copied().unwrap_or(genome_size))
            .collect();
        Ok(Segments { ranges })
    }

    /// Builds segments from strictly increasing, inclusive end
    /// indices. The first segment starts at gene 0; genes past
    /// the last end belong to no segment.
    ///
    /// # Errors
    /// Returns an error if the ends are empty, unordered,
    /// or not within the genome.
    ///
    /// # Examples
    /// ```
    /// use oxivec::Segments;
    ///
    /// let segments = Segments::from_ends(&[1, 4], 8).unwrap();
    ///
    /// assert_eq!(segments.segment_of(0), Some(0));
    /// assert_eq!(segments.segment_of(4), Some(1));
    /// assert_eq!(segments.segment_of(5), None);
    /// ```
    pub fn from_ends(ends: &[usize], genome_size: usize) -> Result<Segments, SpeciesError> {
        check_indices(ends, genome_size)?;
        let ranges = ends
            .iter()
            .enumerate()
            .map(|(k, &end)| if k == 0 { 0 } else { ends[k - 1] + 1 }..end + 1)
            .collect();
        Ok(Segments { ranges })
    }

    /// Reads `num-segments`, `segment-type` and the
    /// per-segment indices. Returns `None` if the genome
    /// is not segmented.
    pub(crate) fn load<P>(
        lookup: &Lookup<'_, P>,
        genome_size: usize,
    ) -> Result<Option<Segments>, SpeciesError>
    where
        P: ParameterSource + ?Sized,
    {
        use crate::mutators::Layer::Global;

        let count = match lookup.usize(Global, names::NUM_SEGMENTS)? {
            None => return Ok(None),
            Some(count) => count,
        };
        if count == 0 || count > genome_size {
            return Err(SpeciesError::InvalidSegmentCount {
                value: count,
                genome_size,
            });
        }
        let which = match lookup.string(Global, names::SEGMENT_TYPE) {
            None => names::SEGMENT_START,
            Some(t) if t == names::SEGMENT_START => names::SEGMENT_START,
            Some(t) if t == names::SEGMENT_END => names::SEGMENT_END,
            Some(t) => return Err(SpeciesError::InvalidSegmentType(t)),
        };
        let indices = (0..count)
            .map(|k| {
                lookup
                    .segment_index(k, which)?
                    .ok_or_else(|| SpeciesError::MissingParameter {
                        key: lookup
                            .find(crate::mutators::Layer::Segment(k), which),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let segments = if which == names::SEGMENT_START {
            Segments::from_starts(&indices, genome_size)?
        } else {
            Segments::from_ends(&indices, genome_size)?
        };
        let covered = segments.ranges.last().map_or(0, |r| r.end);
        if covered < genome_size {
            warn!(
                "genes {} to {} lie past the last segment and use the global configuration",
                covered,
                genome_size - 1
            );
        }
        Ok(Some(segments))
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Returns the gene range of segment `k`.
    pub fn range(&self, k: usize) -> Option<Range<usize>> {
        self.ranges.get(k).cloned()
    }

    /// Returns the segment containing `gene`, if any.
    pub fn segment_of(&self, gene: usize) -> Option<usize> {
        self.ranges.iter().position(|r| r.contains(&gene))
    }
}

fn check_indices(indices: &[usize], genome_size: usize) -> Result<(), SpeciesError> {
    if indices.is_empty() || indices.len() > genome_size {
        return Err(SpeciesError::InvalidSegmentCount {
            value: indices.len(),
            genome_size,
        });
    }
    for (segment, &index) in indices.iter().enumerate() {
        if index >= genome_size {
            return Err(SpeciesError::SegmentIndexOutOfRange {
                segment,
                index,
                genome_size,
            });
        }
        if segment > 0 && index <= indices[segment - 1] {
            return Err(SpeciesError::UnorderedSegments {
                segment,
                index,
                previous: indices[segment - 1],
            });
        }
    }
    Ok(())
}
