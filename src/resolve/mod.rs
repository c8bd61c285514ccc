// Speaker identity resolution engine.
//
// The external diarization service labels speakers per job (SPEAKER_00,
// SPEAKER_01, ...) with no consistency across jobs. The matchers here turn
// those throwaway labels into identities a user can follow: either names
// anchored to a timecode, or stable ids carried from run to run.

mod geometry;
mod proximity;
mod session;
mod stability;

pub use geometry::{distance_to_group, overlap};
pub use proximity::ProximityMatcher;
pub use session::{
    NamedAnchor, ResolutionSession, SessionError, SpeakerEntry, SpeakerReport,
};
pub use stability::OverlapStabilizer;

use crate::diarize::Segment;
use std::collections::HashMap;

/// Raw per-job label -> resolved identity. Always injective: the matchers
/// commit one-to-one pairings only.
pub type SpeakerMapping = HashMap<String, String>;

/// State a strategy may consult when resolving a new run. Each strategy
/// reads only its own slice of this.
pub struct MatchContext<'a> {
    /// User-asserted name/timecode anchors (proximity matching).
    pub anchors: &'a [NamedAnchor],
    /// The previous run's segments, already rewritten with resolved
    /// identities (overlap stabilization). Empty before the first run.
    pub previous: &'a [Segment],
    /// Session-owned counter for minting stable identities.
    pub next_stable_id: &'a mut u32,
}

/// One of the two resolution strategies, selected per deployment.
///
/// The strategies have different semantics and are never merged: proximity
/// ties labels to manually placed anchors, overlap ties them to the previous
/// run's labels and ignores manual naming entirely.
pub trait MatchStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy consults named anchors. Callers use this to
    /// require anchors before submitting audio and to pass the anchor count
    /// as a speaker-count hint to the provider.
    fn uses_anchors(&self) -> bool;

    /// Map each raw label of `segments` to a resolved identity. The mapping
    /// may be partial; callers fall back to the raw label itself. Never
    /// fails: degenerate input yields a possibly-empty mapping.
    fn resolve(&self, context: &mut MatchContext<'_>, segments: &[Segment]) -> SpeakerMapping;
}
