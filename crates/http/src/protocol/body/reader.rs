use bytes::Buf;
use tracing::trace;

use crate::protocol::ParseError;
use crate::protocol::body::HttpBody;

/// Upper bound on the capacity reserved up front from a declared content length.
///
/// The declared length comes from the peer; anything above this grows on demand.
pub const MAX_RESERVE_BYTES: usize = 8 * 1024 * 1024;

/// Appends incoming body chunks to the in-memory buffer of an [`HttpBody`].
///
/// Every call consumes all of its input; the returned count lets the transport
/// check that nothing was left behind.
#[derive(Debug)]
pub struct BodyReader<'a> {
    body: &'a mut HttpBody,
}

impl<'a> BodyReader<'a> {
    pub fn new(body: &'a mut HttpBody) -> Self {
        Self { body }
    }

    /// Prepares the buffer for a body of `content_length` bytes, when it is known.
    pub fn init(&mut self, content_length: Option<u64>) -> Result<(), ParseError> {
        if let Some(length) = content_length
            && !self.body.is_file()
        {
            let reserve = usize::try_from(length).unwrap_or(usize::MAX).min(MAX_RESERVE_BYTES);
            self.body.buffer_mut().reserve(reserve);
        }
        Ok(())
    }

    /// Appends every chunk of `buf` and returns the number of bytes consumed.
    pub fn put<B: Buf>(&mut self, mut buf: B) -> usize {
        let extra = buf.remaining();
        let dst = self.body.buffer_mut();
        dst.reserve(extra);

        while buf.has_remaining() {
            let chunk = buf.chunk();
            let len = chunk.len();
            dst.extend_from_slice(chunk);
            buf.advance(len);
        }

        trace!(size = extra, "appended body chunk");
        extra
    }

    /// Appends `bytes` and returns its length.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        self.put(bytes)
    }

    pub fn finish(&mut self) -> Result<(), ParseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_append_reports_each_length() {
        let mut body = HttpBody::new();
        let mut reader = BodyReader::new(&mut body);
        reader.init(None).unwrap();

        assert_eq!(reader.append(b"hello"), 5);
        assert_eq!(reader.append(b""), 0);
        assert_eq!(reader.append(b", world"), 7);
        reader.finish().unwrap();

        assert_eq!(body.as_bytes(), b"hello, world");
        assert_eq!(body.as_bytes().len(), 12);
    }

    #[test]
    fn test_put_buffer_sequence() {
        let mut body = HttpBody::from("head:");
        let mut reader = BodyReader::new(&mut body);

        let sequence = Bytes::from_static(b"one,").chain(Bytes::from_static(b"two"));
        assert_eq!(reader.put(sequence), 7);

        assert_eq!(body.as_bytes(), b"head:one,two");
    }

    #[test]
    fn test_init_reserves_declared_length() {
        let mut body = HttpBody::new();
        BodyReader::new(&mut body).init(Some(1024)).unwrap();
        assert!(body.buffer_mut().capacity() >= 1024);
    }

    #[test]
    fn test_init_caps_huge_declared_length() {
        let mut body = HttpBody::new();
        BodyReader::new(&mut body).init(Some(u64::MAX)).unwrap();
        assert!(body.buffer_mut().capacity() >= MAX_RESERVE_BYTES);
        assert!(body.as_bytes().is_empty());
    }
}
