use crate::diarize::Segment;

/// Seconds of overlap between two segments.
pub fn overlap(a: &Segment, b: &Segment) -> f64 {
    (a.end.min(b.end) - a.start.max(b.start)).max(0.0)
}

/// Minimum distance in seconds from a timecode to any segment of a group.
///
/// Zero when the timecode falls within a segment. Infinite for an empty
/// group, so the matcher never selects one. Groups are small; every segment
/// is scanned.
pub fn distance_to_group(timecode: f64, segments: &[&Segment]) -> f64 {
    let mut min_distance = f64::INFINITY;

    for segment in segments {
        if segment.start <= timecode && timecode <= segment.end {
            return 0.0;
        }

        let distance = if timecode < segment.start {
            segment.start - timecode
        } else {
            timecode - segment.end
        };

        min_distance = min_distance.min(distance);
    }

    min_distance
}

/// Group segments by speaker label, preserving first-encountered label order.
pub fn group_by_label(segments: &[Segment]) -> Vec<(&str, Vec<&Segment>)> {
    let mut groups: Vec<(&str, Vec<&Segment>)> = Vec::new();

    for segment in segments {
        match groups.iter_mut().find(|(label, _)| *label == segment.speaker) {
            Some((_, group)) => group.push(segment),
            None => groups.push((segment.speaker.as_str(), vec![segment])),
        }
    }

    groups
}
