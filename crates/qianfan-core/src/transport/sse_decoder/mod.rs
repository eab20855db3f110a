//! Incremental Server-Sent Events decoder
//!
//! Bytes arrive in arbitrary chunks; a frame or a multi-byte UTF-8
//! character may be split across chunk boundaries.

mod event;

pub use event::SseEvent;

/// Buffered SSE decoder
///
/// Frames look like:
/// ```text
/// event: optional_type\n
/// data: {"result": "..."}\n
/// \n
/// ```
/// Frames without any `data:` line (comments, keep-alives, blank lines) are
/// skipped.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: String,
    /// Trailing bytes of an unfinished UTF-8 sequence
    incomplete_utf8: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return every frame completed by them
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut bytes = std::mem::take(&mut self.incomplete_utf8);
        bytes.extend_from_slice(chunk);

        // An unfinished sequence at the end waits for the next chunk;
        // invalid bytes elsewhere are replaced
        let split = match std::str::from_utf8(&bytes) {
            Ok(_) => bytes.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => {
                tracing::warn!(position = e.valid_up_to(), "invalid UTF-8 in event stream");
                bytes.len()
            }
        };
        self.incomplete_utf8 = bytes.split_off(split);
        self.buffer.push_str(&String::from_utf8_lossy(&bytes));

        let mut events = Vec::new();
        while let Some((end, delimiter_len)) = self.find_frame_end() {
            let frame: String = self.buffer.drain(..end).collect();
            self.buffer.drain(..delimiter_len);
            if let Some(event) = parse_frame(&frame) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a final frame left without its terminating blank line
    ///
    /// Called once the connection has closed.
    pub fn finish(&mut self) -> Option<SseEvent> {
        let frame = std::mem::take(&mut self.buffer);
        self.incomplete_utf8.clear();
        parse_frame(&frame)
    }

    /// Check if there's remaining data in the buffer
    pub fn has_remaining(&self) -> bool {
        !self.buffer.trim().is_empty() || !self.incomplete_utf8.is_empty()
    }

    fn find_frame_end(&self) -> Option<(usize, usize)> {
        let lf = self.buffer.find("\n\n").map(|pos| (pos, 2));
        let crlf = self.buffer.find("\r\n\r\n").map(|pos| (pos, 4));
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
            (a, b) => a.or(b),
        }
    }
}

fn parse_frame(text: &str) -> Option<SseEvent> {
    let mut event_type = None;
    let mut id = None;
    let mut data_lines: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => data_lines.push(value),
            "event" => event_type = Some(value.trim().to_string()),
            "id" => id = Some(value.trim().to_string()),
            _ => {}
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        event_type,
        data: data_lines.join("\n"),
        id,
    })
}

#[cfg(test)]
mod tests;
