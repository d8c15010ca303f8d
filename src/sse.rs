use std::io::BufRead;

use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub id: Option<String>,
    pub data: String,
}

/// Line-oriented text/event-stream decoder. Feed it one line at a time (without
/// the trailing newline); a blank line dispatches the buffered event.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: Vec<String>,
    event: Option<String>,
    id: Option<String>,
    seen_first_line: bool,
    pending: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_line(&mut self, line: &str) -> Option<SseMessage> {
        let mut line = line.strip_suffix('\r').unwrap_or(line);
        if !self.seen_first_line {
            self.seen_first_line = true;
            line = line.strip_prefix('\u{feff}').unwrap_or(line);
        }

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
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            // retry and unknown fields carry nothing for a non-reconnecting client
            _ => {}
        }
        None
    }

    /// Feeds raw body bytes, which may split lines anywhere. Complete lines are
    /// decoded as UTF-8 with invalid sequences replaced, the way a browser
    /// EventSource reads them.
    pub fn push_bytes(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line = self.pending.drain(..=pos).collect::<Vec<u8>>();
            if let Some(msg) = self.push_raw_line(&line[..pos]) {
                out.push(msg);
            }
        }
        out
    }

    fn push_raw_line(&mut self, raw: &[u8]) -> Option<SseMessage> {
        let line = String::from_utf8_lossy(raw);
        self.push_line(&line)
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseMessage {
            event,
            id: self.id.clone(),
            data,
        })
    }
}

/// Reads a whole stream, handing every decoded message to `on_message`. Stops early
/// when the callback returns `false`; the return value says whether that happened.
pub fn read_messages<R, F>(mut reader: R, mut on_message: F) -> Result<bool>
where
    R: BufRead,
    F: FnMut(SseMessage) -> bool,
{
    let mut decoder = SseDecoder::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .context("failed reading event stream")?;
        if read == 0 {
            break;
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf[..]);
        if let Some(msg) = decoder.push_raw_line(line) {
            if !on_message(msg) {
                return Ok(true);
            }
        }
    }
    // an event without its terminating blank line is incomplete and dropped
    Ok(false)
}
