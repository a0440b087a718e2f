//! HTTP message body handling.
//!
//! This module provides a body value that can be backed either by memory or by an
//! open file, together with the two halves a transport drives it through:
//!
//! - [`HttpBody`]: the body value, tagged as in-memory or file-backed, with an
//!   [`EncodingType`] that selects Base64 transcoding of file content
//! - [`BodyWriter`]: the producer side, handing out bounded chunks and
//!   implementing `http_body::Body` for streaming responses
//! - [`BodyReader`]: the consumer side, appending inbound chunks to memory
//!
//! # Design Goals
//!
//! 1. **Memory Efficiency**
//!    - File content is streamed through a fixed scratch buffer
//!    - Base64 encoding is done chunk by chunk, never on the whole payload
//!
//! 2. **Protocol Correctness**
//!    - The declared size of a Base64 body is the exact encoded size
//!    - A body whose size is unknown is reported as chunked
//!
//! 3. **Clean Abstractions**
//!    - Handlers only build an [`HttpBody`]; the transport drives the writer/reader

mod value;
mod reader;
mod writer;

pub use value::EncodingType;
pub use value::HttpBody;
pub use reader::BodyReader;
pub use reader::MAX_RESERVE_BYTES;
pub use writer::BodyWriter;
pub use writer::DEFAULT_READ_BUF_SIZE;

use http_body::Body;
use http_body_util::BodyExt;
use std::error::Error;
use tracing::{debug, error};

use crate::protocol::ParseError;

/// Reads every data frame of `body` into the in-memory buffer of `dst`.
///
/// Returns the number of bytes appended. Trailer frames are ignored.
pub async fn read_body<B>(mut body: B, dst: &mut HttpBody) -> Result<usize, ParseError>
where
    B: Body + Unpin,
    B::Error: Into<Box<dyn Error + Send + Sync>>,
{
    let mut reader = BodyReader::new(dst);
    reader.init(body.size_hint().exact())?;

    let mut total = 0;
    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(|e| {
            let cause = e.into();
            error!(cause = %cause, "failed to read request body");
            ParseError::invalid_body(cause)
        })?;

        if let Ok(data) = frame.into_data() {
            total += reader.put(data);
        }
    }

    reader.finish()?;
    debug!(size = total, "read request body");
    Ok(total)
}
