//! Observers for a turn in progress.

use std::fmt;

use ragchat_retrieval::RetrievedDocument;

use crate::citation::Citation;
use crate::error::ChatError;

/// Appended to every render while the answer is still streaming.
pub const STREAMING_INDICATOR: &str = "■";

/// Stages of a chat turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnState {
    Idle,
    Contextualizing,
    Retrieving,
    Generating,
    Citing,
    Committed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Contextualizing => "contextualizing",
            Self::Retrieving => "retrieving",
            Self::Generating => "generating",
            Self::Citing => "citing",
            Self::Committed => "committed",
        };
        f.write_str(name)
    }
}

/// Receives the progress of a turn, e.g. to render it in a terminal.
///
/// All methods default to doing nothing.
pub trait ResponseDisplay: Send {
    fn on_state(&mut self, _state: TurnState) {}

    /// The answer so far, followed by [`STREAMING_INDICATOR`].
    fn on_partial(&mut self, _rendered: &str) {}

    /// The complete answer, without indicator.
    fn on_final(&mut self, _response: &str) {}

    fn on_citations(&mut self, _citations: &[Citation]) {}

    /// The passages the answer was grounded on, in retrieval order.
    fn on_documents(&mut self, _documents: &[RetrievedDocument]) {}

    /// The turn failed; anything rendered for it should be discarded.
    fn on_abort(&mut self, _error: &ChatError) {}
}

/// Display that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopDisplay;

impl ResponseDisplay for NoopDisplay {}

/// One callback received by a [`RecordingDisplay`].
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    State(TurnState),
    Partial(String),
    Final(String),
    Citations(Vec<Citation>),
    Documents(Vec<RetrievedDocument>),
    Abort(String),
}

/// Display that records every callback, for tests and diagnostics.
#[derive(Debug, Default, Clone)]
pub struct RecordingDisplay {
    events: Vec<DisplayEvent>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[DisplayEvent] {
        &self.events
    }

    pub fn states(&self) -> Vec<TurnState> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::State(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn partials(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Partial(p) => Some(p.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn final_render(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Final(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn documents(&self) -> Option<&[RetrievedDocument]> {
        self.events.iter().rev().find_map(|e| match e {
            DisplayEvent::Documents(docs) => Some(docs.as_slice()),
            _ => None,
        })
    }

    pub fn aborted(&self) -> bool {
        self.events.iter().any(|e| matches!(e, DisplayEvent::Abort(_)))
    }
}

impl ResponseDisplay for RecordingDisplay {
    fn on_state(&mut self, state: TurnState) {
        self.events.push(DisplayEvent::State(state));
    }

    fn on_partial(&mut self, rendered: &str) {
        self.events.push(DisplayEvent::Partial(rendered.to_string()));
    }

    fn on_final(&mut self, response: &str) {
        self.events.push(DisplayEvent::Final(response.to_string()));
    }

    fn on_citations(&mut self, citations: &[Citation]) {
        self.events.push(DisplayEvent::Citations(citations.to_vec()));
    }

    fn on_documents(&mut self, documents: &[RetrievedDocument]) {
        self.events.push(DisplayEvent::Documents(documents.to_vec()));
    }

    fn on_abort(&mut self, error: &ChatError) {
        self.events.push(DisplayEvent::Abort(error.to_string()));
    }
}
