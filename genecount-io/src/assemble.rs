use std::collections::BTreeMap;

use genecount_core::models::{Feature, IntervalList};

use crate::error::Result;
use crate::gtf::GtfSegment;

///
/// Groups consecutive segments sharing an id (on the same chromosome) into one [`Feature`].
///
/// Every group is sorted and merged, so overlapping or touching exons collapse into one range.
/// Segments with a non-positive length are dropped and a group left without ranges yields no
/// feature at all. The input must present each feature's segments contiguously, which GTF
/// files sorted by gene do.
pub struct FeatureAssembler<I> {
    segments: I,
    pending: Option<GtfSegment>,
}

impl<I> FeatureAssembler<I>
where
    I: Iterator<Item = Result<GtfSegment>>,
{
    pub fn new(segments: I) -> Self {
        FeatureAssembler {
            segments,
            pending: None,
        }
    }

    fn next_segment(&mut self) -> Option<Result<GtfSegment>> {
        match self.pending.take() {
            Some(segment) => Some(Ok(segment)),
            None => self.segments.next(),
        }
    }
}

impl<I> Iterator for FeatureAssembler<I>
where
    I: Iterator<Item = Result<GtfSegment>>,
{
    type Item = Result<Feature>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let first = match self.next_segment()? {
                Ok(segment) => segment,
                Err(e) => return Some(Err(e)),
            };

            let mut ranges = IntervalList::new();
            if !first.is_empty() {
                ranges.add(first.start, first.len(), false);
            }

            loop {
                match self.segments.next() {
                    None => break,
                    Some(Err(e)) => return Some(Err(e)),
                    Some(Ok(segment)) => {
                        if segment.id == first.id && segment.chromosome == first.chromosome {
                            if !segment.is_empty() {
                                ranges.add(segment.start, segment.len(), false);
                            }
                        } else {
                            self.pending = Some(segment);
                            break;
                        }
                    }
                }
            }

            if ranges.is_empty() {
                continue;
            }
            if ranges.len() > 1 {
                ranges.merge();
            }

            return Some(Ok(Feature::new(
                first.id,
                first.chromosome,
                first.reverse,
                ranges,
            )));
        }
    }
}

///
/// Check, per chromosome, whether features arrive sorted by start.
///
/// A chromosome counts as sorted only if its features form one contiguous block with
/// non-decreasing starts, which is what streaming them through an
/// [`AmbiguityWindow`](crate::ambiguity::AmbiguityWindow) requires.
pub fn prescan<I>(features: I) -> Result<BTreeMap<String, bool>>
where
    I: Iterator<Item = Result<Feature>>,
{
    let mut sorted: BTreeMap<String, bool> = BTreeMap::new();
    let mut current: Option<(String, i64)> = None;

    for feature in features {
        let feature = feature?;
        let start = feature.start();

        let same_block = matches!(&current, Some((chromosome, _)) if *chromosome == feature.chromosome);
        if same_block {
            if let Some((_, last_start)) = current.as_mut() {
                if start < *last_start {
                    sorted.insert(feature.chromosome.clone(), false);
                }
                *last_start = start;
            }
        } else {
            // a chromosome seen before in another block cannot be streamed
            sorted
                .entry(feature.chromosome.clone())
                .and_modify(|s| *s = false)
                .or_insert(true);
            current = Some((feature.chromosome, start));
        }
    }

    Ok(sorted)
}
