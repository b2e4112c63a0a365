//! Server-Sent-Events contract shared with the proxy functions
//!
//! Proxies frame every payload as `data: <json>\n\n` and end with
//! `data: [DONE]\n\n` (or simply close the stream).

mod event;
mod decoder;

pub use event::{
    encode_data, encode_delta, encode_done, extract_delta, extract_error, parse_line,
    parse_payload, SseEvent, DONE_SENTINEL,
};
pub use decoder::SseDecoder;
