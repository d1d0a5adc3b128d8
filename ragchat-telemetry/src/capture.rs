//! In-memory span capture keyed by chat session.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use serde::Serialize;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Id, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Span field that names the chat session a span belongs to.
pub const SESSION_ID_FIELD: &str = "session.id";

/// A closed span.
#[derive(Debug, Clone, Serialize)]
pub struct CapturedSpan {
    pub span_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Nanoseconds since the Unix epoch.
    pub start_time: u128,
    pub end_time: u128,
    pub fields: HashMap<String, serde_json::Value>,
}

impl CapturedSpan {
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// Shared store of closed spans, grouped by [`SESSION_ID_FIELD`].
///
/// Spans without a session id (directly or through an ancestor) are not kept.
#[derive(Debug, Clone, Default)]
pub struct SpanCapture {
    spans: Arc<RwLock<HashMap<String, Vec<CapturedSpan>>>>,
}

impl SpanCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A layer feeding this store.
    pub fn layer(&self) -> SpanCaptureLayer {
        SpanCaptureLayer { capture: self.clone() }
    }

    /// A standalone subscriber feeding this store, for use with
    /// [`tracing::subscriber::set_default`] in tests.
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync + 'static {
        tracing_subscriber::registry().with(self.layer())
    }

    /// Spans of `session_id` in the order they closed.
    pub fn spans_for(&self, session_id: &str) -> Vec<CapturedSpan> {
        self.spans
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn span_names(&self, session_id: &str) -> Vec<String> {
        self.spans_for(session_id).into_iter().map(|s| s.name).collect()
    }

    pub fn sessions(&self) -> Vec<String> {
        self.spans.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }

    /// Drop everything captured for `session_id`.
    pub fn clear(&self, session_id: &str) {
        self.spans.write().unwrap_or_else(PoisonError::into_inner).remove(session_id);
    }

    fn add(&self, session_id: String, span: CapturedSpan) {
        self.spans
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id)
            .or_default()
            .push(span);
    }
}

/// Layer recording closed spans into a [`SpanCapture`].
pub struct SpanCaptureLayer {
    capture: SpanCapture,
}

struct StartTime(u128);

struct SpanFields(HashMap<String, serde_json::Value>);

fn now_nanos() -> u128 {
    SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default().as_nanos()
}

impl<S> Layer<S> for SpanCaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };

        let mut visitor = JsonVisitor::default();
        attrs.record(&mut visitor);
        let mut fields = visitor.0;

        // Children inherit the session of their parent.
        if !fields.contains_key(SESSION_ID_FIELD) {
            if let Some(parent) = span.parent() {
                if let Some(session) = parent
                    .extensions()
                    .get::<SpanFields>()
                    .and_then(|f| f.0.get(SESSION_ID_FIELD).cloned())
                {
                    fields.insert(SESSION_ID_FIELD.to_string(), session);
                }
            }
        }

        let mut extensions = span.extensions_mut();
        extensions.insert(StartTime(now_nanos()));
        extensions.insert(SpanFields(fields));
    }

    fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        if let Some(fields) = extensions.get_mut::<SpanFields>() {
            let mut visitor = JsonVisitor::default();
            values.record(&mut visitor);
            fields.0.extend(visitor.0);
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let extensions = span.extensions();

        let fields = extensions.get::<SpanFields>().map(|f| f.0.clone()).unwrap_or_default();
        let Some(session_id) =
            fields.get(SESSION_ID_FIELD).and_then(|v| v.as_str()).map(str::to_string)
        else {
            return;
        };

        let captured = CapturedSpan {
            span_id: format!("{:016x}", id.into_u64()),
            name: span.metadata().name().to_string(),
            parent_id: span.parent().map(|p| format!("{:016x}", p.id().into_u64())),
            start_time: extensions.get::<StartTime>().map(|s| s.0).unwrap_or_default(),
            end_time: now_nanos(),
            fields,
        };
        self.capture.add(session_id, captured);
    }
}

#[derive(Default)]
struct JsonVisitor(HashMap<String, serde_json::Value>);

impl Visit for JsonVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::Value::Bool(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }
}

#[cfg(test)]
mod tests {
    use tracing::info_span;

    use super::*;

    #[test]
    fn children_are_stored_under_the_parent_session() {
        let capture = SpanCapture::new();
        tracing::subscriber::with_default(capture.subscriber(), || {
            let turn = info_span!("rag.turn", session.id = "s-1", history_len = 0u64);
            turn.in_scope(|| {
                info_span!("rag.cite").in_scope(|| {});
            });
            drop(turn);
            info_span!("unrelated").in_scope(|| {});
        });

        let spans = capture.spans_for("s-1");
        let names: Vec<&str> = spans.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["rag.cite", "rag.turn"]);
        assert_eq!(spans[0].field_str(SESSION_ID_FIELD), Some("s-1"));
        assert_eq!(spans[0].parent_id.as_deref(), Some(spans[1].span_id.as_str()));
        assert_eq!(spans[1].fields.get("history_len"), Some(&serde_json::json!(0)));
        assert_eq!(capture.sessions(), vec!["s-1".to_string()]);
    }

    #[test]
    fn recorded_values_are_merged() {
        let capture = SpanCapture::new();
        tracing::subscriber::with_default(capture.subscriber(), || {
            let span = info_span!("rag.retrieve", session.id = "s-2", documents = tracing::field::Empty);
            span.record("documents", 3u64);
        });

        let spans = capture.spans_for("s-2");
        assert_eq!(spans[0].fields.get("documents"), Some(&serde_json::json!(3)));

        capture.clear("s-2");
        assert!(capture.spans_for("s-2").is_empty());
    }
}
