use tracing::{Level, Span};

use super::TraceId;

/// Root span for one evaluation pass (manual trigger or timer tick).
pub fn eval_span(owner: &str, trace_id: &TraceId) -> Span {
    tracing::span!(
        Level::INFO,
        "evaluate",
        owner = %owner,
        trace_id = %trace_id
    )
}
