use super::geometry::{group_by_label, overlap};
use super::{MatchContext, MatchStrategy, SpeakerMapping};
use crate::diarize::Segment;

/// Ties each new run's labels to the previous run's stabilized identities
/// by total segment overlap, minting a fresh identity when nothing overlaps.
///
/// Commitment is per current label, in first-encountered order: each label
/// takes the best still-unclaimed previous identity at the moment it is
/// examined, and earlier commitments are never revisited. A label can
/// therefore claim an identity that a later label overlaps even more;
/// consumers depend on this exact order, so it stays as is.
pub struct OverlapStabilizer;

impl OverlapStabilizer {
    fn mint(next_stable_id: &mut u32) -> String {
        let id = format!("SPK_{:02}", *next_stable_id);
        *next_stable_id += 1;
        id
    }
}

impl MatchStrategy for OverlapStabilizer {
    fn name(&self) -> &'static str {
        "overlap"
    }

    fn uses_anchors(&self) -> bool {
        false
    }

    fn resolve(&self, context: &mut MatchContext<'_>, segments: &[Segment]) -> SpeakerMapping {
        let current = group_by_label(segments);
        let previous = group_by_label(context.previous);

        let mut mapping = SpeakerMapping::new();
        let mut used_previous = vec![false; previous.len()];

        for (label, group) in &current {
            let mut best_index = None;
            let mut best_overlap = 0.0_f64;

            for (index, (_, previous_group)) in previous.iter().enumerate() {
                if used_previous[index] {
                    continue;
                }

                let mut total = 0.0;
                for new_segment in group {
                    for old_segment in previous_group {
                        total += overlap(new_segment, old_segment);
                    }
                }

                // Strictly greater: the first-encountered identity keeps a tie.
                if total > best_overlap {
                    best_overlap = total;
                    best_index = Some(index);
                }
            }

            let identity = match best_index {
                Some(index) => {
                    used_previous[index] = true;
                    let identity = previous[index].0.to_string();
                    tracing::debug!(
                        "Stabilized {} -> {} (overlap {:.2}s)",
                        label,
                        identity,
                        best_overlap
                    );
                    identity
                }
                None => {
                    let identity = Self::mint(context.next_stable_id);
                    tracing::debug!("New speaker: {} -> {}", label, identity);
                    identity
                }
            };

            mapping.insert((*label).to_string(), identity);
        }

        mapping
    }
}
