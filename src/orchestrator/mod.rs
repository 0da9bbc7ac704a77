//! Tool-augmented chat orchestration.
//!
//! A [`ChatSession`] streams model output through an [`EnvelopeDetector`],
//! hands completed tool-call envelopes to the extractor and dispatcher, feeds
//! outcomes back into the history and resumes generation, up to a depth
//! bound. Progress is reported as [`StreamEvent`]s.

pub mod detector;
pub mod events;
pub mod prompt;
pub mod session;

pub use detector::{Detection, DetectorState, EnvelopeDetector};
pub use events::{EventTag, StreamEvent};
pub use prompt::build_system_prompt;
pub use session::{ChatSession, SessionSettings};
