//! Incremental detection of a tool-call envelope in streamed model output.

use crate::extract::{find_envelope, ENVELOPE_CLOSE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// No close marker seen yet; fragments are narration.
    Scanning,
    /// A close marker arrived. Later fragments are ignored.
    EnvelopeFound,
}

/// What one fragment turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Plain model text, to be shown as-is.
    Narration(String),
    /// The buffer now holds a complete envelope. `raw` is the verbatim
    /// envelope when an opening marker precedes the close marker.
    Envelope { raw: Option<String> },
    /// Empty fragment, or anything after the envelope.
    Ignored,
}

/// Accumulates fragments of one generation segment.
#[derive(Debug, Clone)]
pub struct EnvelopeDetector {
    buffer: String,
    state: DetectorState,
}

impl Default for EnvelopeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvelopeDetector {
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
            state: DetectorState::Scanning,
        }
    }

    pub fn push(&mut self, fragment: &str) -> Detection {
        if fragment.is_empty() || self.state == DetectorState::EnvelopeFound {
            return Detection::Ignored;
        }

        // Only the tail can hold a marker that was not there before.
        let mut search_from = self.buffer.len().saturating_sub(ENVELOPE_CLOSE.len() - 1);
        while !self.buffer.is_char_boundary(search_from) {
            search_from -= 1;
        }
        self.buffer.push_str(fragment);

        if !self.buffer[search_from..].contains(ENVELOPE_CLOSE) {
            return Detection::Narration(fragment.to_string());
        }

        self.state = DetectorState::EnvelopeFound;
        Detection::Envelope {
            raw: find_envelope(&self.buffer).map(|e| e.trim().to_string()),
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    pub fn envelope_found(&self) -> bool {
        self.state == DetectorState::EnvelopeFound
    }

    /// Everything accumulated so far, narration and envelope alike.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn into_buffer(self) -> String {
        self.buffer
    }
}
