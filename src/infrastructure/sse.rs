// Server-sent events decoding over a chunked byte stream
use bytes::{Buf, BytesMut};

/// One dispatched server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Events without a name (or named `message`) are the ones delivered to a
    /// plain message handler.
    pub fn is_message(&self) -> bool {
        matches!(self.event.as_deref(), None | Some("message"))
    }
}

/// Longest line kept in memory; anything longer is dropped.
pub const MAX_LINE_BYTES: usize = 1024 * 1024;

/// Incremental decoder: feed it chunks as they arrive, get back the events
/// completed by each chunk. Lines end in `\n`, `\r\n` or a bare `\r` and
/// may be split across chunks at any byte.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: BytesMut,
    event: Option<String>,
    data: Vec<String>,
    line_limit: usize,
    /// Previous line ended in `\r`; a leading `\n` belongs to it
    after_cr: bool,
    /// Dropping the rest of an overlong line
    discarding: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self::with_line_limit(MAX_LINE_BYTES)
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_line_limit(line_limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            event: None,
            data: Vec::new(),
            line_limit,
            after_cr: false,
            discarding: false,
        }
    }

    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        loop {
            if self.after_cr && !self.buffer.is_empty() {
                if self.buffer[0] == b'\n' {
                    self.buffer.advance(1);
                }
                self.after_cr = false;
            }
            let Some(pos) = self.buffer.iter().position(|b| *b == b'\n' || *b == b'\r') else {
                break;
            };
            self.after_cr = self.buffer[pos] == b'\r';
            let line = self.buffer.split_to(pos);
            self.buffer.advance(1);

            if std::mem::take(&mut self.discarding) || line.len() > self.line_limit {
                tracing::warn!(limit = self.line_limit, "dropping overlong event stream line");
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > self.line_limit {
            self.buffer.clear();
            self.discarding = true;
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            // id and retry only matter for reconnection, which is not done
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseEvent { event, data })
    }
}
