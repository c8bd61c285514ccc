pub mod audio;
pub mod config;
pub mod diarize;
pub mod resolve;
pub mod server;

pub use diarize::{DiarizationProvider, DiarizeError, Segment};
pub use resolve::{MatchStrategy, ResolutionSession, SpeakerMapping};
