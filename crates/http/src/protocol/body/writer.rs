use std::borrow::{Borrow, BorrowMut};
use std::cmp;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use http_body::{Body, Frame, SizeHint};
use tracing::{error, trace};

use crate::codec::{Base64Encoder, encoded_size};
use crate::ensure;
use crate::protocol::SendError;
use crate::protocol::body::value::Kind;
use crate::protocol::body::{EncodingType, HttpBody};

/// Size of the scratch buffer a file-backed body is read through.
pub const DEFAULT_READ_BUF_SIZE: usize = 4096;

const EMPTY: &[u8] = &[];

/// Pulls an [`HttpBody`] out in bounded chunks.
///
/// In-memory bodies are handed out as slices of their buffer. File bodies are read
/// through a fixed scratch buffer, one read per call, and optionally Base64 encoded
/// on the way; memory use never depends on the file size.
///
/// The writer works on anything that can lend it a `&mut HttpBody`, so it can borrow
/// a body for one transfer or own it for the lifetime of a response.
pub struct BodyWriter<B = HttpBody> {
    body: B,
    sent: usize,
    read_buf: Box<[u8]>,
    encoder: Base64Encoder,
    encoded: BytesMut,
    eof: bool,
    failed: bool,
}

impl<B> std::fmt::Debug for BodyWriter<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BodyWriter")
            .field("sent", &self.sent)
            .field("read_buf_size", &self.read_buf.len())
            .field("encoder", &self.encoder)
            .field("eof", &self.eof)
            .field("failed", &self.failed)
            .finish_non_exhaustive()
    }
}

impl<B: BorrowMut<HttpBody>> BodyWriter<B> {
    pub fn new(body: B) -> Self {
        Self::with_buffer_size(body, DEFAULT_READ_BUF_SIZE)
    }

    /// Creates a writer whose file reads are at most `size` bytes.
    pub fn with_buffer_size(body: B, size: usize) -> Self {
        Self {
            body,
            sent: 0,
            read_buf: vec![0; size.max(1)].into_boxed_slice(),
            encoder: Base64Encoder::new(),
            encoded: BytesMut::new(),
            eof: false,
            failed: false,
        }
    }

    pub fn init(&mut self) -> Result<(), SendError> {
        Ok(())
    }

    pub fn body(&self) -> &HttpBody {
        Borrow::<HttpBody>::borrow(&self.body)
    }

    pub fn into_inner(self) -> B {
        self.body
    }

    /// Returns the next chunk without any caller-imposed size limit.
    pub fn get(&mut self) -> Result<(&[u8], bool), SendError> {
        self.get_with_max_size(usize::MAX)
    }

    /// Returns the next chunk and whether more chunks follow.
    ///
    /// `max_size` bounds the bytes taken from the source. For a Base64 body that is
    /// the number of bytes read from the file, so the encoded chunk can be larger.
    /// The returned slice is valid until the next call.
    ///
    /// A failed file read returns the error and no data. The transfer can not be
    /// resumed after that: every later call fails too.
    pub fn get_with_max_size(&mut self, max_size: usize) -> Result<(&[u8], bool), SendError> {
        let encoding = self.body().encoding();

        match BorrowMut::<HttpBody>::borrow_mut(&mut self.body).kind_mut() {
            Kind::InMemory(buf) => {
                let remain = buf.len() - self.sent;
                let to_return = cmp::min(max_size, remain);
                let start = self.sent;

                self.sent += to_return;
                let has_more = self.sent < buf.len();
                trace!(size = to_return, has_more, "returning in-memory chunk");
                Ok((&buf[start..start + to_return], has_more))
            }

            Kind::File { file, .. } => {
                ensure!(!self.failed, SendError::invalid_body("body read already failed"));
                if self.eof {
                    return Ok((EMPTY, false));
                }

                let read_req = cmp::min(self.read_buf.len(), max_size);
                let read = match read_full(file, &mut self.read_buf[..read_req]) {
                    Ok(read) => read,
                    Err(e) => {
                        error!(cause = %e, "failed to read from file");
                        self.failed = true;
                        return Err(SendError::io(e));
                    }
                };

                // a short read only happens at the end of the file
                let has_more = read == read_req;
                self.eof = !has_more;
                trace!(size = read, has_more, "read chunk from file");

                match encoding {
                    EncodingType::Raw => Ok((&self.read_buf[..read], has_more)),
                    EncodingType::Base64 => {
                        self.encoded.clear();
                        self.encoded.reserve(encoded_size(read as u64 + 2) as usize);
                        self.encoder.encode(&self.read_buf[..read], &mut self.encoded);
                        if !has_more {
                            self.encoder.finalize(&mut self.encoded);
                        }
                        Ok((&self.encoded[..], has_more))
                    }
                }
            }
        }
    }

    fn is_exhausted(&self) -> bool {
        if self.failed {
            return false;
        }
        let body = self.body();
        if body.is_file() { self.eof } else { self.sent >= body.as_bytes().len() }
    }
}

/// Reads until `buf` is full or the file reports EOF.
fn read_full(mut file: &File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Lets an `http_body` transport drain the body frame by frame.
///
/// Each poll performs at most one scratch-buffer sized file read, so a poll never
/// blocks for long.
impl<B> Body for BodyWriter<B>
where
    B: BorrowMut<HttpBody> + Unpin,
{
    type Data = Bytes;
    type Error = SendError;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();

        loop {
            if this.is_exhausted() {
                return Poll::Ready(None);
            }

            let (chunk, has_more) = match this.get() {
                Ok(chunk) => chunk,
                Err(e) => return Poll::Ready(Some(Err(e))),
            };

            if chunk.is_empty() {
                if has_more {
                    continue;
                }
                return Poll::Ready(None);
            }

            return Poll::Ready(Some(Ok(Frame::data(Bytes::copy_from_slice(chunk)))));
        }
    }

    fn is_end_stream(&self) -> bool {
        self.is_exhausted()
    }

    fn size_hint(&self) -> SizeHint {
        let body = self.body();
        if body.is_file() {
            return body.transfer_size().into();
        }
        SizeHint::with_exact((body.as_bytes().len() - self.sent) as u64)
    }
}
