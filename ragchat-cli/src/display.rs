//! Streaming answer rendering for a terminal.

use std::io::{self, Write};

use ragchat_retrieval::RetrievedDocument;
use ragchat_runner::{
    ChatError, Citation, ResponseDisplay, STREAMING_INDICATOR, TurnState, render_citations,
};
use tracing::debug;

/// DECSC: remember where the indicator starts.
const SAVE_CURSOR: &str = "\u{1b}7";
/// DECRC, then clear to end of line. Independent of how many columns the
/// terminal gives the indicator (ambiguous-width glyphs take two in CJK locales).
const ERASE_INDICATOR: &str = "\u{1b}8\u{1b}[K";

/// Prints only the new part of each render, followed by the streaming
/// indicator, which is erased again before the next fragment.
pub struct TerminalDisplay<W: Write + Send> {
    out: W,
    printed: usize,
    indicator_shown: bool,
}

impl<W: Write + Send> TerminalDisplay<W> {
    pub fn new(out: W) -> Self {
        Self { out, printed: 0, indicator_shown: false }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            debug!(error = %e, "terminal write failed");
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            debug!(error = %e, "terminal flush failed");
        }
    }

    fn erase_indicator(&mut self) {
        if self.indicator_shown {
            self.emit(ERASE_INDICATOR);
            self.indicator_shown = false;
        }
    }

    fn write_new_text(&mut self, text: &str) {
        let fresh = text.get(self.printed..).unwrap_or_default().to_string();
        self.emit(&fresh);
        self.printed = text.len();
    }
}

impl<W: Write + Send> ResponseDisplay for TerminalDisplay<W> {
    fn on_state(&mut self, state: TurnState) {
        debug!(%state, "turn state");
        if state == TurnState::Generating {
            self.printed = 0;
            self.indicator_shown = false;
            self.emit("assistant> ");
        }
    }

    fn on_partial(&mut self, rendered: &str) {
        let text = rendered.strip_suffix(STREAMING_INDICATOR).unwrap_or(rendered);
        self.erase_indicator();
        self.write_new_text(text);
        self.emit(SAVE_CURSOR);
        self.emit(STREAMING_INDICATOR);
        self.indicator_shown = true;
        self.flush();
    }

    fn on_final(&mut self, response: &str) {
        self.erase_indicator();
        self.write_new_text(response);
        self.emit("\n");
        self.flush();
    }

    fn on_citations(&mut self, citations: &[Citation]) {
        if !citations.is_empty() {
            self.emit(&format!("{}\n", render_citations(citations)));
            self.flush();
        }
    }

    fn on_documents(&mut self, documents: &[RetrievedDocument]) {
        if !documents.is_empty() {
            self.emit(&format!("({} passage(s) retrieved; /refs shows them)\n", documents.len()));
            self.flush();
        }
    }

    fn on_abort(&mut self, error: &ChatError) {
        self.erase_indicator();
        if self.printed > 0 {
            self.emit("\n[answer discarded]\n");
        }
        debug!(error = %error, "display discarded turn output");
        self.printed = 0;
        self.flush();
    }
}

/// Number and print the passages of a turn, one block per passage.
pub fn write_references(out: &mut impl Write, documents: &[RetrievedDocument]) -> io::Result<()> {
    if documents.is_empty() {
        return writeln!(out, "No passages were retrieved for the last answer.");
    }
    for (i, doc) in documents.iter().enumerate() {
        writeln!(
            out,
            "[ref{}] {} (score {:.2})",
            i + 1,
            doc.source().unwrap_or("unknown source"),
            doc.score
        )?;
        for line in doc.text().lines() {
            writeln!(out, "    {line}")?;
        }
    }
    Ok(())
}
