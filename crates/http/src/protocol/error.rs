use http::StatusCode;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request error: {source}")]
    RequestError {
        #[from]
        source: ParseError,
    },

    #[error("response error: {source}")]
    ResponseError {
        #[from]
        source: SendError,
    },
}

/// Errors raised while taking a request body apart.
///
/// Every multipart framing violation has its own variant, so callers can tell a
/// broken boundary line from a broken header block without matching on strings.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("malformed boundary: {reason}")]
    BoundaryFormat { reason: String },

    #[error("malformed boundary: expected CR after boundary")]
    BoundaryCr,

    #[error("malformed boundary: expected LF after boundary CR")]
    BoundaryLf,

    #[error("malformed boundary: found different boundary data than the given one")]
    BoundaryData,

    #[error("malformed header: empty header name")]
    EmptyHeaderName,

    #[error("malformed header name")]
    MalformedHeaderName,

    #[error("malformed header value")]
    MalformedHeaderValue,

    #[error("malformed header ending: LF expected after CR")]
    MalformedHeaderEnding,

    #[error("multipart body ended before the closing boundary")]
    IncompleteBody,

    #[error("invalid base64 input at byte {position}")]
    InvalidBase64 { position: usize },

    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },
}

impl ParseError {
    pub fn boundary_format<S: ToString>(str: S) -> Self {
        Self::BoundaryFormat { reason: str.to_string() }
    }

    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    /// Returns true if the error comes from the multipart framing rather than from the body content.
    pub fn is_framing(&self) -> bool {
        !matches!(self, Self::InvalidBody { .. } | Self::InvalidBase64 { .. })
    }

    /// The status a server should answer with when a request fails with this error.
    ///
    /// Every variant describes input the client sent, so this is always `400`.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("invalid body: {reason}")]
    InvalidBody { reason: String },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

impl SendError {
    pub fn invalid_body<S: ToString>(str: S) -> Self {
        Self::InvalidBody { reason: str.to_string() }
    }

    pub fn io<E: Into<io::Error>>(e: E) -> Self {
        Self::Io { source: e.into() }
    }
}
