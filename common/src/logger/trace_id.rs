use uuid::Uuid;

/// Correlation ID that follows a single evaluation pass end-to-end.
#[derive(Clone, Debug)]
pub struct TraceId(Uuid);

impl Default for TraceId {
    fn default() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}
