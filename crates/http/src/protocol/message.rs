use bytes::{Buf, Bytes};
use http_body::SizeHint;

/// Represents an item in an HTTP message payload stream.
///
/// Payload encoders consume a sequence of these: any number of data chunks
/// followed by a single EOF marker that tells stateful encoders to flush.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem<Data: Buf = Bytes> {
    /// A chunk of payload data
    Chunk(Data),
    /// Marks the end of the payload stream
    Eof,
}

/// Represents the size information of an HTTP payload.
///
/// This enum is used to determine how the payload should be framed on the wire:
/// - Known length: declare a Content-Length
/// - Chunked: size unknown, use chunked transfer encoding
/// - Empty: No payload to send
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PayloadSize {
    /// Payload with known length in bytes
    Length(u64),
    /// Payload using chunked transfer encoding
    Chunked,
    /// Empty payload (no body)
    Empty,
}

impl PayloadSize {
    /// The Content-Length to declare, if any.
    #[inline]
    pub fn content_length(&self) -> Option<u64> {
        match self {
            PayloadSize::Length(length) => Some(*length),
            PayloadSize::Chunked => None,
            PayloadSize::Empty => Some(0),
        }
    }
}

impl From<Option<u64>> for PayloadSize {
    fn from(size: Option<u64>) -> Self {
        match size {
            Some(0) => PayloadSize::Empty,
            Some(length) => PayloadSize::Length(length),
            None => PayloadSize::Chunked,
        }
    }
}

impl From<PayloadSize> for SizeHint {
    fn from(payload_size: PayloadSize) -> Self {
        match payload_size {
            PayloadSize::Length(length) => SizeHint::with_exact(length),
            PayloadSize::Chunked => SizeHint::new(),
            PayloadSize::Empty => SizeHint::with_exact(0),
        }
    }
}
