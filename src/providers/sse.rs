/*!
 * Incremental server-sent-event decoding.
 *
 * Network chunks do not respect line boundaries, so the decoder buffers
 * bytes until a full line is available and dispatches an event on each
 * blank line.
 */

use bytes::Bytes;
use futures::StreamExt;
use futures::stream;
use std::fmt::Display;

use crate::errors::ProviderError;
use crate::providers::DeltaStream;

/// A dispatched server-sent event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseEvent {
    /// Value of the `event:` field, if any
    pub event: Option<String>,
    /// Joined `data:` lines
    pub data: String,
}

/// Line-buffering SSE decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every event completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line_bytes);
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r'])) {
                events.push(event);
            }
        }
        events
    }

    /// Flush a trailing event that was not terminated by a blank line
    pub fn finish(&mut self) -> Option<SseEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest).into_owned();
            if let Some(event) = self.process_line(line.trim_end_matches('\r')) {
                return Some(event);
            }
        }
        self.dispatch()
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
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = self.data.join("\n");
        self.data.clear();
        Some(SseEvent { event, data })
    }
}

/// Turn a byte stream into a delta stream using a per-event mapper
///
/// The mapper returns `None` for events that carry no text. When the
/// transport closes, an event still pending in the decoder is flushed.
pub fn decode_stream<S, E, F>(bytes: S, on_event: F) -> DeltaStream
where
    S: futures::Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(&SseEvent) -> Option<Result<String, ProviderError>> + Send + 'static,
{
    // `None` marks the end of the transport
    let chunks = bytes
        .map(Some)
        .chain(stream::once(futures::future::ready(None)));

    let deltas = chunks
        .scan((SseDecoder::new(), on_event), |(decoder, on_event), chunk| {
            let items: Vec<Result<String, ProviderError>> = match chunk {
                Some(Ok(bytes)) => decoder
                    .push(&bytes)
                    .iter()
                    .filter_map(|event| on_event(event))
                    .collect(),
                Some(Err(e)) => vec![Err(ProviderError::StreamError(e.to_string()))],
                None => decoder
                    .finish()
                    .iter()
                    .filter_map(|event| on_event(event))
                    .collect(),
            };
            futures::future::ready(Some(items))
        })
        .flat_map(stream::iter);

    Box::pin(deltas)
}
