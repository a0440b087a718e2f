//! Core protocol types shared by the body codec and the multipart scanner.
//!
//! - **Message Handling** (`message`): payload stream items and sizes
//!   - [`PayloadItem`]: a payload chunk or the end-of-payload marker
//!   - [`PayloadSize`]: how a body is framed on the wire
//!
//! - **Body Streaming** ([`body`]): the body value and its producer/consumer
//!   - [`HttpBody`](body::HttpBody): in-memory or file-backed body
//!   - [`BodyWriter`](body::BodyWriter): pulls bounded chunks out of a body
//!   - [`BodyReader`](body::BodyReader): appends inbound chunks to a body
//!
//! - **Error Handling** (`error`): error types for both directions
//!   - [`HttpError`]: Top-level error type
//!   - [`ParseError`]: inbound errors, including every multipart framing error
//!   - [`SendError`]: outbound errors

mod message;
pub use message::PayloadItem;
pub use message::PayloadSize;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

pub mod body;
