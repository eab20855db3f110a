//! SSE frame type

/// One `\n\n`-terminated SSE frame
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    /// Value of an `event:` line, if present
    pub event_type: Option<String>,
    /// `data:` lines joined with `\n`
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            event_type: None,
            data: data.into(),
            id: None,
        }
    }

    /// Check if this is the `[DONE]` end marker
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}
