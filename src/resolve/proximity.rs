use super::geometry::{distance_to_group, group_by_label};
use super::{MatchContext, MatchStrategy, SpeakerMapping};
use crate::diarize::Segment;
use std::collections::HashSet;

/// Ties raw diarization labels to user-named anchors by timecode proximity.
///
/// Builds the full (anchor, label-group) cost cross-product, sorts it by
/// cost ascending, and commits pairings greedily. This approximates
/// minimum-cost bipartite matching rather than solving it: anchors are
/// placed at moments expected to fall inside the right speaker's segment,
/// so the winning cost is usually zero and near-ties are rare.
pub struct ProximityMatcher;

impl MatchStrategy for ProximityMatcher {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn uses_anchors(&self) -> bool {
        true
    }

    fn resolve(&self, context: &mut MatchContext<'_>, segments: &[Segment]) -> SpeakerMapping {
        let anchors = context.anchors;
        let mut mapping = SpeakerMapping::new();

        if anchors.is_empty() {
            return mapping;
        }

        let groups = group_by_label(segments);

        let mut costs = Vec::with_capacity(anchors.len() * groups.len());
        for (anchor_index, anchor) in anchors.iter().enumerate() {
            for (label, group) in &groups {
                let cost = distance_to_group(anchor.timecode, group);
                costs.push((cost, anchor_index, *label));
            }
        }

        // Stable sort: cost ties keep cross-product iteration order.
        costs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut used_anchors: HashSet<usize> = HashSet::new();
        let mut used_labels: HashSet<&str> = HashSet::new();

        for (cost, anchor_index, label) in costs {
            if used_anchors.contains(&anchor_index) || used_labels.contains(label) {
                continue;
            }

            let anchor = &anchors[anchor_index];
            tracing::info!(
                "Matched {} (timecode {:.1}s) -> {} (cost: {:.1}s)",
                anchor.name,
                anchor.timecode,
                label,
                cost
            );

            mapping.insert(label.to_string(), anchor.name.clone());
            used_anchors.insert(anchor_index);
            used_labels.insert(label);

            // Stop when all anchors are mapped.
            if mapping.len() == anchors.len() {
                break;
            }
        }

        mapping
    }
}
