//! Body streaming and `multipart/form-data` parsing for a BMC web service
//!
//! This crate holds the two pieces of an embedded management web server that
//! touch every byte of a payload:
//!
//! - a body value that is either an in-memory buffer or an open file, with a
//!   pull-based producer that hands a transport bounded chunks and can Base64
//!   encode file content on the fly in constant memory
//! - a single pass scanner that splits a fully buffered multipart upload into
//!   parts, rejecting malformed framing with a specific error
//!
//! # Example
//!
//! ```
//! use bmc_http::codec::decode_base64;
//! use bmc_http::multipart::Multipart;
//! use bmc_http::protocol::body::{BodyWriter, EncodingType, HttpBody};
//! use bytes::BytesMut;
//! use std::io::Write;
//!
//! // an upload handler picks the file part out of the request body
//! let body = b"--X\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.bin\"\r\n\r\n\x00\x01\x02\r\n--X--";
//! let multipart = Multipart::parse("multipart/form-data; boundary=X", body).unwrap();
//! let upload = multipart.part("file").unwrap();
//! assert_eq!(upload.file_name(), Some("a.bin"));
//!
//! // a response handler serves a file as Base64
//! let mut file = tempfile::NamedTempFile::new().unwrap();
//! file.write_all(upload.content()).unwrap();
//!
//! let mut response = HttpBody::with_encoding(EncodingType::Base64);
//! response.open(file.path()).unwrap();
//! assert_eq!(response.payload_size(), Some(4));
//!
//! // the transport pulls chunks until there are no more
//! let mut writer = BodyWriter::new(response);
//! let mut encoded = BytesMut::new();
//! loop {
//!     let (chunk, has_more) = writer.get_with_max_size(1000).unwrap();
//!     encoded.extend_from_slice(chunk);
//!     if !has_more {
//!         break;
//!     }
//! }
//! assert_eq!(&encoded[..], b"AAEC");
//!
//! let mut decoded = BytesMut::new();
//! decode_base64(&encoded, &mut decoded).unwrap();
//! assert_eq!(&decoded[..], &upload.content()[..]);
//! ```
//!
//! # Architecture
//!
//! - [`protocol`]: payload types, errors, and the [`protocol::body`] value with
//!   its [`BodyWriter`](protocol::body::BodyWriter) and
//!   [`BodyReader`](protocol::body::BodyReader)
//! - [`codec`]: the streaming Base64 encoder and transfer framing
//! - [`multipart`]: boundary extraction and the multipart scanner
//!
//! # Error Handling
//!
//! - [`protocol::HttpError`]: Top-level error type
//! - [`protocol::ParseError`]: inbound errors; every multipart framing problem
//!   has its own variant and maps to `400 Bad Request`
//! - [`protocol::SendError`]: outbound errors, such as a file read failing
//!   mid-stream
//!
//! # Limitations
//!
//! - Multipart bodies are parsed from one complete buffer, not as a stream
//! - Boundary tokens are limited to 70 characters (RFC 2046)
//! - File-backed bodies are Unix only (`OwnedFd`)

pub mod codec;
pub mod multipart;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;
