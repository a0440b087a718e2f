use std::fs::File;
use std::io;
use std::os::fd::OwnedFd;
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tracing::{info, warn};

use crate::codec::encoded_size;
use crate::protocol::PayloadSize;

/// How the bytes of a file-backed body are put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingType {
    /// The file content as is.
    #[default]
    Raw,
    /// The file content Base64 encoded while it is streamed.
    Base64,
}

/// A message body that is either held in memory or read from an open file.
///
/// Only one source is ever active: opening a file replaces the in-memory buffer and
/// [`clear`](Self::clear) drops the file. Response handlers build one of these; the
/// transport drains it through a [`BodyWriter`](super::BodyWriter) and fills it
/// through a [`BodyReader`](super::BodyReader).
#[derive(Debug, Default)]
pub struct HttpBody {
    kind: Kind,
    encoding: EncodingType,
}

#[derive(Debug)]
pub(crate) enum Kind {
    InMemory(BytesMut),
    File { file: File, size: Option<u64> },
}

impl Default for Kind {
    fn default() -> Self {
        Kind::InMemory(BytesMut::new())
    }
}

impl HttpBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(encoding: EncodingType) -> Self {
        Self { kind: Kind::default(), encoding }
    }

    pub fn encoding(&self) -> EncodingType {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: EncodingType) {
        self.encoding = encoding;
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, Kind::File { .. })
    }

    /// The open file, if this body is file-backed.
    pub fn file(&self) -> Option<&File> {
        match &self.kind {
            Kind::File { file, .. } => Some(file),
            Kind::InMemory(_) => None,
        }
    }

    /// The in-memory content; empty for a file-backed body.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.kind {
            Kind::InMemory(buf) => buf,
            Kind::File { .. } => &[],
        }
    }

    /// Mutable access to the in-memory buffer.
    ///
    /// A file-backed body gives up its file and becomes an empty in-memory body.
    pub fn buffer_mut(&mut self) -> &mut BytesMut {
        if self.is_file() {
            self.kind = Kind::default();
        }
        match &mut self.kind {
            Kind::InMemory(buf) => buf,
            Kind::File { .. } => unreachable!("file-backed body should be replaced"),
        }
    }

    pub(crate) fn kind_mut(&mut self) -> &mut Kind {
        &mut self.kind
    }

    /// The number of bytes this body will produce, if known.
    ///
    /// For a Base64 file body with a known size this is the encoded size, so it can
    /// be declared as Content-Length as is. `None` means the file size could not be
    /// determined and the body has to be sent chunked.
    pub fn payload_size(&self) -> Option<u64> {
        match &self.kind {
            Kind::InMemory(buf) => Some(buf.len() as u64),
            Kind::File { size: Some(size), .. } => match self.encoding {
                EncodingType::Raw => Some(*size),
                EncodingType::Base64 => Some(encoded_size(*size)),
            },
            Kind::File { size: None, .. } => None,
        }
    }

    /// How the transport should frame this body.
    pub fn transfer_size(&self) -> PayloadSize {
        self.payload_size().into()
    }

    /// Resets to an empty raw body, closing the file if one is open.
    pub fn clear(&mut self) {
        self.kind = Kind::default();
        self.encoding = EncodingType::Raw;
    }

    /// Opens `path` for reading and makes it the body source.
    ///
    /// Failing to open the file is an error; failing to read its size is not, the
    /// size is then unknown.
    pub fn open<P: AsRef<Path>>(&mut self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let size = match file.metadata() {
            Ok(metadata) => {
                info!(path = %path.display(), size = metadata.len(), "opened file body");
                Some(metadata.len())
            }
            Err(e) => {
                warn!(path = %path.display(), cause = %e, "failed to read file size");
                None
            }
        };

        self.kind = Kind::File { file, size };
        Ok(())
    }

    /// Takes ownership of an already open descriptor and makes it the body source.
    ///
    /// A reported size of zero is treated as unknown: pipes and sockets report zero
    /// even though they still carry data.
    pub fn set_fd(&mut self, fd: OwnedFd) {
        self.set_file(File::from(fd));
    }

    pub fn set_file(&mut self, file: File) {
        let size = file.metadata().ok().map(|metadata| metadata.len()).filter(|size| *size != 0);
        self.kind = Kind::File { file, size };
    }

    /// Duplicates this body.
    ///
    /// A file-backed body gets its own descriptor (`dup(2)`), so dropping one copy
    /// never closes the file under the other. Like any duplicated descriptor, both
    /// still share one file offset.
    pub fn try_clone(&self) -> io::Result<Self> {
        let kind = match &self.kind {
            Kind::InMemory(buf) => Kind::InMemory(buf.clone()),
            Kind::File { file, size } => Kind::File { file: file.try_clone()?, size: *size },
        };
        Ok(Self { kind, encoding: self.encoding })
    }
}

impl From<BytesMut> for HttpBody {
    fn from(buf: BytesMut) -> Self {
        Self { kind: Kind::InMemory(buf), encoding: EncodingType::Raw }
    }
}

impl From<Bytes> for HttpBody {
    fn from(bytes: Bytes) -> Self {
        Self::from(BytesMut::from(bytes))
    }
}

impl From<Vec<u8>> for HttpBody {
    fn from(vec: Vec<u8>) -> Self {
        Self::from(BytesMut::from(&vec[..]))
    }
}

impl From<String> for HttpBody {
    fn from(value: String) -> Self {
        Self::from(value.into_bytes())
    }
}

impl From<&str> for HttpBody {
    fn from(value: &str) -> Self {
        Self::from(BytesMut::from(value))
    }
}
