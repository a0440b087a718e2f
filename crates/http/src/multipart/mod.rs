//! `multipart/form-data` bodies (RFC 7578, framing per RFC 2046).
//!
//! The body must already be fully buffered. [`Multipart::parse`] extracts the
//! boundary token from the Content-Type value and splits the body into
//! [`Part`]s in one pass. Any framing violation rejects the whole body.
//!
//! # Example
//!
//! ```
//! use bmc_http::multipart::Multipart;
//!
//! let body = b"\r\n--X\r\nContent-Disposition: form-data; name=\"a\"\r\n\r\nhello\r\n--X--";
//! let multipart = Multipart::parse("multipart/form-data; boundary=X", body).unwrap();
//!
//! assert_eq!(multipart.len(), 1);
//! let part = multipart.part("a").unwrap();
//! assert_eq!(part.header("content-disposition"), Some("form-data; name=\"a\""));
//! assert_eq!(&part.content()[..], b"hello");
//! ```

mod parser;
mod part;

pub use part::Part;

use http::HeaderMap;
use http::header::CONTENT_TYPE;
use mime::Mime;
use std::slice;
use std::vec;

use crate::ensure;
use crate::protocol::ParseError;
use parser::MultipartParser;

/// The longest boundary token RFC 2046 allows.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Extra room in the lookbehind buffer beyond the delimiter itself.
pub(crate) const LOOKBEHIND_SLACK: usize = 8;

/// Extracts the boundary token from a `multipart/form-data` Content-Type value.
pub fn parse_boundary(content_type: &str) -> Result<String, ParseError> {
    let mime: Mime = content_type
        .parse()
        .map_err(|_| ParseError::boundary_format(format!("invalid content type: {content_type}")))?;

    ensure!(
        mime.type_() == mime::MULTIPART && mime.subtype() == mime::FORM_DATA,
        ParseError::boundary_format(format!("not a multipart/form-data content type: {mime}"))
    );

    let boundary = mime
        .get_param(mime::BOUNDARY)
        .ok_or_else(|| ParseError::boundary_format("missing boundary parameter"))?
        .as_str();

    validate_boundary(boundary)?;
    Ok(boundary.to_owned())
}

/// Checks that `boundary` is 1..=70 `bchars` and does not end in a space.
///
/// The scanner relies on this: a token without CR or LF can not overlap a
/// delimiter that starts inside a failed match.
fn validate_boundary(boundary: &str) -> Result<(), ParseError> {
    ensure!(
        !boundary.is_empty() && boundary.len() <= MAX_BOUNDARY_LEN,
        ParseError::boundary_format(format!("boundary length {} is not in 1..={MAX_BOUNDARY_LEN}", boundary.len()))
    );
    ensure!(
        boundary.bytes().all(is_bchar) && !boundary.ends_with(' '),
        ParseError::boundary_format("boundary contains characters outside the RFC 2046 set")
    );
    Ok(())
}

/// `bchars` from RFC 2046 section 5.1.1.
fn is_bchar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"'()+_,-./:=? ".contains(&b)
}

/// The parts of one `multipart/form-data` body, in input order.
#[derive(Debug, Clone, Default)]
pub struct Multipart {
    parts: Vec<Part>,
}

impl Multipart {
    /// Parses `body` using the boundary declared in `content_type`.
    pub fn parse(content_type: &str, body: &[u8]) -> Result<Self, ParseError> {
        let boundary = parse_boundary(content_type)?;
        Self::with_boundary(&boundary, body)
    }

    /// Parses `body` with an already extracted boundary token.
    pub fn with_boundary(boundary: &str, body: &[u8]) -> Result<Self, ParseError> {
        validate_boundary(boundary)?;

        let parts = MultipartParser::new(boundary).parse(body)?;
        Ok(Self { parts })
    }

    /// Parses `body` using the Content-Type found in `headers`.
    pub fn from_headers(headers: &HeaderMap, body: &[u8]) -> Result<Self, ParseError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .ok_or_else(|| ParseError::boundary_format("missing content type"))?
            .to_str()
            .map_err(|_| ParseError::boundary_format("content type is not visible ascii"))?;

        Self::parse(content_type, body)
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The first part whose Content-Disposition carries `name="<name>"`.
    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name() == Some(name))
    }

    pub fn into_parts(self) -> Vec<Part> {
        self.parts
    }
}

impl IntoIterator for Multipart {
    type Item = Part;
    type IntoIter = vec::IntoIter<Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.into_iter()
    }
}

impl<'a> IntoIterator for &'a Multipart {
    type Item = &'a Part;
    type IntoIter = slice::Iter<'a, Part>;

    fn into_iter(self) -> Self::IntoIter {
        self.parts.iter()
    }
}
