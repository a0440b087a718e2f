//! Stateful byte transformers used on the body path.
//!
//! - [`Base64Encoder`]: streaming Base64 with at most two bytes carried between
//!   calls, plus [`encoded_size`] and the strict [`decode_base64`]
//! - [`PayloadEncoder`]: Content-Length or chunked framing of outbound bodies,
//!   driven over a whole [`BodyWriter`](crate::protocol::body::BodyWriter) by
//!   [`encode_body`]
//!
//! Both implement `tokio_util::codec::Encoder` over
//! [`PayloadItem`](crate::protocol::PayloadItem), so they plug into a
//! `FramedWrite` as well as being called directly.
//!
//! # Example
//!
//! ```
//! use bmc_http::codec::Base64Encoder;
//! use bytes::BytesMut;
//!
//! let mut encoder = Base64Encoder::new();
//! let mut dst = BytesMut::new();
//! encoder.encode(b"sample", &mut dst);
//! encoder.encode(b" text", &mut dst);
//! encoder.finalize(&mut dst);
//!
//! assert_eq!(&dst[..], b"c2FtcGxlIHRleHQ=");
//! ```

mod base64;
mod framing;

pub use base64::Base64Encoder;
pub use base64::decode_base64;
pub use base64::encoded_size;
pub use framing::PayloadEncoder;
pub use framing::encode_body;
