//! Incremental line decoder for SSE bodies

use super::event::{parse_line, SseEvent};

/// Turns network reads into SSE events
///
/// Reads can end anywhere, including inside a line or inside a UTF-8
/// sequence. The trailing partial line is kept as raw bytes and prefixed
/// to the next read, so nothing is parsed before its newline arrives.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    lines_seen: usize,
}

impl SseDecoder {
    /// Create an empty decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network read, returning the events it completed
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseEvent> {
        self.pending.extend_from_slice(bytes);

        let mut events = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            if let Some(event) = self.decode_line(start, end) {
                events.push(event);
            }
            start = end + 1;
        }
        self.pending.drain(..start);
        events
    }

    /// Flush a final line that was not newline-terminated
    pub fn finish(&mut self) -> Vec<SseEvent> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let end = self.pending.len();
        let event = self.decode_line(0, end);
        self.pending.clear();
        event.into_iter().collect()
    }

    /// Bytes held over from the last read
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Number of complete lines decoded so far
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    fn decode_line(&mut self, start: usize, end: usize) -> Option<SseEvent> {
        self.lines_seen += 1;
        // A complete line never ends inside a UTF-8 sequence; lossy only replaces invalid bytes
        let line = String::from_utf8_lossy(&self.pending[start..end]);
        parse_line(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deltas(events: &[SseEvent]) -> Vec<&str> {
        events
            .iter()
            .filter_map(|e| match e {
                SseEvent::Delta(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_whole_events_in_one_read() {
        let mut decoder = SseDecoder::new();
        let body = "data: {\"choices\":[{\"delta\":{\"content\":\"Bonjour\"}}]}\n\n\
                    data: {\"choices\":[{\"delta\":{\"content\":\"!\"}}]}\n\n\
                    data: [DONE]\n\n";
        let events = decoder.feed(body.as_bytes());
        assert_eq!(deltas(&events), vec!["Bonjour", "!"]);
        assert_eq!(events.last(), Some(&SseEvent::Done));
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_partial_line_is_held_over() {
        let mut decoder = SseDecoder::new();

        let first = decoder.feed(b"data: {\"choices\":");
        assert!(first.is_empty());
        assert!(decoder.pending_len() > 0);

        let second = decoder.feed(b"[{\"delta\":{\"content\":\"Hi\"}}]}\n\n");
        assert_eq!(second, vec![SseEvent::Delta("Hi".to_string())]);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_utf8_split_across_reads() {
        let mut decoder = SseDecoder::new();
        let body = "data: {\"content\":\"caf\u{e9} \u{1f600}\"}\n".as_bytes();
        // Split inside the 4-byte emoji
        let split = body.len() - 5;

        assert!(decoder.feed(&body[..split]).is_empty());
        let events = decoder.feed(&body[split..]);
        assert_eq!(deltas(&events), vec!["caf\u{e9} \u{1f600}"]);
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut decoder = SseDecoder::new();
        let body = "data: {\"text\":\"a\"}\r\n\r\ndata: {\"text\":\"b\"}\r\n\r\ndata: [DONE]\r\n\r\n";
        let mut events = Vec::new();
        for byte in body.as_bytes() {
            events.extend(decoder.feed(std::slice::from_ref(byte)));
        }
        assert_eq!(deltas(&events), vec!["a", "b"]);
        assert_eq!(events.last(), Some(&SseEvent::Done));
    }

    #[test]
    fn test_finish_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"data: {\"text\":\"tail\"}").is_empty());
        assert_eq!(decoder.finish(), vec![SseEvent::Delta("tail".to_string())]);
        assert!(decoder.finish().is_empty());
    }

    #[test]
    fn test_malformed_line_does_not_stop_decoding() {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(b"data: {oops\n\ndata: {\"text\":\"ok\"}\n\n");
        assert!(matches!(events[0], SseEvent::Malformed { .. }));
        assert_eq!(deltas(&events), vec!["ok"]);
        assert_eq!(decoder.lines_seen(), 4);
    }
}
