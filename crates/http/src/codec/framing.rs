//! Transfer framing of outbound bodies.
//!
//! A body with a known size is written as is after a `Content-Length` header;
//! one without is written with the chunked transfer coding
//! ([RFC 9112 section 7.1](https://www.rfc-editor.org/rfc/rfc9112#section-7.1)).
//! [`PayloadEncoder`] picks the framing from a [`PayloadSize`] and
//! [`encode_body`] drives a [`BodyWriter`] through it.

use std::borrow::BorrowMut;
use std::fmt::Write;

use bytes::{Buf, BytesMut};
use tokio_util::codec::Encoder;
use tracing::{trace, warn};

use crate::ensure;
use crate::protocol::body::{BodyWriter, HttpBody};
use crate::protocol::{PayloadItem, PayloadSize, SendError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadEncoder {
    kind: Kind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Kind {
    /// Bytes still owed to the declared `Content-Length`
    Length(u64),
    Chunked { eof: bool },
    NoBody,
}

impl PayloadEncoder {
    pub fn new(size: PayloadSize) -> Self {
        match size {
            PayloadSize::Length(length) => Self::fix_length(length),
            PayloadSize::Chunked => Self::chunked(),
            PayloadSize::Empty => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self { kind: Kind::NoBody }
    }

    pub fn chunked() -> Self {
        Self { kind: Kind::Chunked { eof: false } }
    }

    pub fn fix_length(length: u64) -> Self {
        Self { kind: Kind::Length(length) }
    }

    pub fn is_finish(&self) -> bool {
        match self.kind {
            Kind::Length(remaining) => remaining == 0,
            Kind::Chunked { eof } => eof,
            Kind::NoBody => true,
        }
    }
}

impl<D: Buf> Encoder<PayloadItem<D>> for PayloadEncoder {
    type Error = SendError;

    fn encode(&mut self, item: PayloadItem<D>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match (&mut self.kind, item) {
            (Kind::Length(remaining), PayloadItem::Chunk(bytes)) => {
                let size = bytes.remaining() as u64;
                ensure!(size <= *remaining, SendError::invalid_body("body is longer than its content length"));
                put_buf(bytes, dst);
                *remaining -= size;
                Ok(())
            }
            (Kind::Length(remaining), PayloadItem::Eof) => {
                ensure!(*remaining == 0, SendError::invalid_body("body is shorter than its content length"));
                Ok(())
            }

            (Kind::Chunked { eof: true }, _) => {
                warn!("encode payload_item but no need to encode anymore");
                Ok(())
            }
            (Kind::Chunked { .. }, PayloadItem::Chunk(bytes)) => {
                let size = bytes.remaining();
                // a zero sized chunk would end the body
                if size == 0 {
                    return Ok(());
                }
                write!(dst, "{size:X}\r\n").map_err(SendError::invalid_body)?;
                dst.reserve(size + 2);
                put_buf(bytes, dst);
                dst.extend_from_slice(b"\r\n");
                trace!(size, "wrote chunk");
                Ok(())
            }
            (Kind::Chunked { eof }, PayloadItem::Eof) => {
                *eof = true;
                dst.extend_from_slice(b"0\r\n\r\n");
                Ok(())
            }

            (Kind::NoBody, PayloadItem::Chunk(bytes)) => {
                ensure!(!bytes.has_remaining(), SendError::invalid_body("body declared empty has content"));
                Ok(())
            }
            (Kind::NoBody, PayloadItem::Eof) => Ok(()),
        }
    }
}

fn put_buf<D: Buf>(mut bytes: D, dst: &mut BytesMut) {
    while bytes.has_remaining() {
        let chunk = bytes.chunk();
        let len = chunk.len();
        dst.extend_from_slice(chunk);
        bytes.advance(len);
    }
}

/// Writes the whole body of `writer` into `dst`, framed by its transfer size.
///
/// The body is pulled in pieces of at most `max_size` source bytes. Returns the
/// framing that was used so the caller can write the matching header.
pub fn encode_body<B: BorrowMut<HttpBody>>(
    writer: &mut BodyWriter<B>,
    max_size: usize,
    dst: &mut BytesMut,
) -> Result<PayloadSize, SendError> {
    ensure!(max_size > 0, SendError::invalid_body("max chunk size must not be zero"));

    let size = writer.body().transfer_size();
    let mut encoder = PayloadEncoder::new(size);
    writer.init()?;

    loop {
        let (chunk, has_more) = writer.get_with_max_size(max_size)?;
        encoder.encode(PayloadItem::Chunk(chunk), dst)?;
        if !has_more {
            break;
        }
    }
    encoder.encode(PayloadItem::<&[u8]>::Eof, dst)?;

    trace!(?size, len = dst.len(), "encoded body");
    Ok(size)
}
