use super::geometry::group_by_label;
use super::{MatchContext, MatchStrategy, SpeakerMapping};
use crate::diarize::Segment;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Name is required")]
    NameRequired,
}

/// A user-asserted fact: "this name is the speaker at this timecode".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedAnchor {
    pub id: String,
    pub name: String,
    pub timecode: f64,
    /// Insertion sequence. A display hint only, never used for matching.
    pub order: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerEntry {
    pub id: String,
    pub name: String,
    pub seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerReport {
    pub speakers: Vec<SpeakerEntry>,
    pub total_seconds: f64,
    pub timeline: Vec<Segment>,
}

/// Owns everything one tracking session accumulates: named anchors, the
/// latest run's resolved segments, the label mapping, display-name
/// overrides, and the id counters.
///
/// The session has two phases. Before the first diarization result,
/// speakers are the registered anchors with zero time and no timeline.
/// After one, the view is derived entirely from the latest run. `reset`
/// returns to the first phase.
///
/// Mutation is confined to these methods; callers serialize access with one
/// lock acquisition per operation so a query never observes a half-updated
/// mapping.
pub struct ResolutionSession {
    strategy: Box<dyn MatchStrategy>,
    anchors: Vec<NamedAnchor>,
    anchor_counter: u32,
    stable_counter: u32,
    /// Most recent run, rewritten with resolved identities. A rolling
    /// snapshot, not an append-only log.
    history: Vec<Segment>,
    mapping: SpeakerMapping,
    custom_names: HashMap<String, String>,
}

impl ResolutionSession {
    pub fn new(strategy: Box<dyn MatchStrategy>) -> Self {
        tracing::info!("Resolution session using {} matching", strategy.name());

        Self {
            strategy,
            anchors: Vec::new(),
            anchor_counter: 0,
            stable_counter: 0,
            history: Vec::new(),
            mapping: SpeakerMapping::new(),
            custom_names: HashMap::new(),
        }
    }

    /// Anchor count when the active strategy matches against anchors,
    /// `None` otherwise. Doubles as the provider's speaker-count hint.
    pub fn speaker_hint(&self) -> Option<usize> {
        self.strategy.uses_anchors().then(|| self.anchors.len())
    }

    /// Register a named anchor. Only the proximity strategy consults
    /// anchors; under the overlap strategy they merely stay listed as
    /// zero-time speakers.
    pub fn add_anchor(&mut self, name: &str, timecode: f64) -> Result<NamedAnchor, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::NameRequired);
        }

        let anchor = NamedAnchor {
            id: format!("MANUAL_{:02}", self.anchor_counter),
            name: name.to_string(),
            timecode,
            order: self.anchors.len(),
        };
        self.anchor_counter += 1;

        tracing::info!(
            "Added speaker anchor: {} - {} at {}s",
            anchor.id,
            anchor.name,
            anchor.timecode
        );

        self.anchors.push(anchor.clone());
        Ok(anchor)
    }

    /// Record a completed diarization run: resolve its raw labels, replace
    /// the history snapshot with the relabeled segments, and store the new
    /// mapping. Infallible; degenerate input yields an empty view.
    pub fn record_result(&mut self, segments: Vec<Segment>) {
        let distinct: HashSet<&str> = segments.iter().map(|s| s.speaker.as_str()).collect();
        tracing::info!("Received diarization with {} speakers", distinct.len());

        let mut context = MatchContext {
            anchors: &self.anchors,
            previous: &self.history,
            next_stable_id: &mut self.stable_counter,
        };
        let mapping = self.strategy.resolve(&mut context, &segments);

        self.history = segments
            .into_iter()
            .map(|segment| Segment {
                speaker: mapping
                    .get(&segment.speaker)
                    .cloned()
                    .unwrap_or(segment.speaker),
                start: segment.start,
                end: segment.end,
            })
            .collect();

        tracing::info!("Final mapping: {:?}", mapping);
        self.mapping = mapping;
    }

    /// Current speakers with accumulated seconds, the total, and the
    /// labeled timeline. Aggregation is recomputed from the history
    /// snapshot on every call, so it can never drift from the latest run.
    pub fn speakers(&self) -> SpeakerReport {
        if self.history.is_empty() {
            // No diarization yet: list anchors with zero time.
            let speakers = self
                .anchors
                .iter()
                .map(|anchor| SpeakerEntry {
                    id: anchor.id.clone(),
                    name: self.display_name(&anchor.id, &anchor.name),
                    seconds: 0.0,
                })
                .collect();

            return SpeakerReport {
                speakers,
                total_seconds: 0.0,
                timeline: Vec::new(),
            };
        }

        let mut speakers: Vec<SpeakerEntry> = group_by_label(&self.history)
            .into_iter()
            .map(|(identity, group)| SpeakerEntry {
                id: identity.to_string(),
                name: self.display_name(identity, identity),
                seconds: group.iter().map(|segment| segment.duration()).sum(),
            })
            .collect();

        // Anchors the matcher left unmatched stay visible with zero time.
        let resolved: HashSet<&str> = self.mapping.values().map(String::as_str).collect();
        for anchor in &self.anchors {
            if !resolved.contains(anchor.name.as_str()) {
                speakers.push(SpeakerEntry {
                    id: anchor.id.clone(),
                    name: self.display_name(&anchor.id, &anchor.name),
                    seconds: 0.0,
                });
            }
        }

        let total_seconds = speakers.iter().map(|speaker| speaker.seconds).sum();

        SpeakerReport {
            speakers,
            total_seconds,
            timeline: self.history.clone(),
        }
    }

    /// Override the display name for a resolved identity. Presentation
    /// only; matching is unaffected.
    pub fn rename(&mut self, id: &str, name: &str) {
        self.custom_names.insert(id.to_string(), name.to_string());
    }

    /// Wipe all accumulated state in one step. The next operations behave
    /// as a fresh session.
    pub fn reset(&mut self) {
        self.anchors.clear();
        self.anchor_counter = 0;
        self.stable_counter = 0;
        self.history.clear();
        self.mapping.clear();
        self.custom_names.clear();

        tracing::info!("Session reset");
    }

    fn display_name(&self, id: &str, fallback: &str) -> String {
        self.custom_names
            .get(id)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }
}
