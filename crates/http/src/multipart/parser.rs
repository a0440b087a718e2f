//! The multipart scanner: a byte state machine over a complete body.
//!
//! Header states advance one byte at a time. Part data is scanned with a
//! Boyer-Moore style skip: while the byte at the end of the current window can
//! not occur in the delimiter, the window moves by the full delimiter length.
//! Bytes that look like the start of a delimiter are held in a lookbehind
//! buffer and handed back to the part content if the match fails, so content
//! is never scanned twice.

use bytes::BytesMut;
use http::{HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, trace};
use State::*;

use crate::ensure;
use crate::multipart::{LOOKBEHIND_SLACK, Part};
use crate::protocol::ParseError;

const CR: u8 = b'\r';
const LF: u8 = b'\n';
const HYPHEN: u8 = b'-';
const COLON: u8 = b':';
const SPACE: u8 = b' ';
const TAB: u8 = b'\t';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum State {
    /// Before the first byte
    Start,
    /// Matching the leading delimiter
    StartBoundary,
    /// Read the terminal hyphen of a leading `--token--`
    StartBoundaryEnd,
    /// Mark the start of a header line
    HeaderFieldStart,
    /// Read a header name up to the colon
    HeaderField,
    /// Skip whitespace before the header value
    HeaderValueStart,
    /// Read a header value up to CR
    HeaderValue,
    /// Read LF after a header value
    HeaderValueAlmostDone,
    /// Read LF after the empty line closing the headers
    HeadersAlmostDone,
    /// Mark the start of the part content
    PartDataStart,
    /// Scan the part content for the next delimiter
    PartData,
    /// The terminal delimiter has been read
    End,
    /// A framing error has been reported
    Error,
}

/// What the bytes following a matched delimiter announced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoundaryKind {
    /// `\r`, another part follows
    Part,
    /// `-`, this may be the terminal delimiter
    Last,
}

/// Splits one complete `multipart/form-data` body into parts.
#[derive(Debug)]
pub(crate) struct MultipartParser {
    /// `\r\n--` followed by the boundary token
    boundary: Vec<u8>,
    boundary_index: [bool; 256],
    lookbehind: Vec<u8>,
    state: State,
    index: usize,
    boundary_kind: Option<BoundaryKind>,
    header_field_mark: Option<usize>,
    header_value_mark: Option<usize>,
    part_data_mark: Option<usize>,
    header_name: Option<HeaderName>,
    headers: HeaderMap,
    content: BytesMut,
    parts: Vec<Part>,
}

impl MultipartParser {
    pub(crate) fn new(token: &str) -> Self {
        let mut boundary = Vec::with_capacity(token.len() + 4);
        boundary.extend_from_slice(b"\r\n--");
        boundary.extend_from_slice(token.as_bytes());

        let mut boundary_index = [false; 256];
        for &b in &boundary {
            boundary_index[b as usize] = true;
        }

        let lookbehind = vec![0; boundary.len() + LOOKBEHIND_SLACK];

        Self {
            boundary,
            boundary_index,
            lookbehind,
            state: Start,
            index: 0,
            boundary_kind: None,
            header_field_mark: None,
            header_value_mark: None,
            part_data_mark: None,
            header_name: None,
            headers: HeaderMap::new(),
            content: BytesMut::new(),
            parts: Vec::new(),
        }
    }

    /// Runs the whole body through the state machine and returns the parts in order.
    pub(crate) fn parse(mut self, body: &[u8]) -> Result<Vec<Part>, ParseError> {
        debug!(size = body.len(), boundary_len = self.boundary.len() - 4, "parsing multipart body");

        let mut i = 0;
        while i < body.len() && self.state != End {
            i = match self.step(body, i) {
                Ok(next) => next,
                Err(e) => {
                    debug!(cause = %e, position = i, "malformed multipart body");
                    self.state = Error;
                    return Err(e);
                }
            };
        }

        ensure!(self.state == End, ParseError::IncompleteBody);

        debug!(parts = self.parts.len(), "parsed multipart body");
        Ok(self.parts)
    }

    /// Consumes input starting at `i` according to the current state.
    ///
    /// Returns the position of the next byte to look at. A state that only
    /// records a mark returns `i` itself, so the same byte is seen again by
    /// the state it switched to.
    pub(crate) fn step(&mut self, input: &[u8], i: usize) -> Result<usize, ParseError> {
        match self.state {
            Start => Ok(self.read_start(input[i], i)),
            StartBoundary => self.read_start_boundary(input[i], i),
            StartBoundaryEnd => self.read_start_boundary_end(input[i], i),
            HeaderFieldStart => Ok(self.read_header_field_start(i)),
            HeaderField => self.read_header_field(input, i),
            HeaderValueStart => Ok(self.read_header_value_start(input[i], i)),
            HeaderValue => self.read_header_value(input, i),
            HeaderValueAlmostDone => self.read_header_value_almost_done(input[i], i),
            HeadersAlmostDone => self.read_headers_almost_done(input[i], i),
            PartDataStart => Ok(self.read_part_data_start(i)),
            PartData => Ok(self.read_part_data(input, i)),
            End => Ok(input.len()),
            Error => Err(ParseError::invalid_body("multipart parser already failed")),
        }
    }

    /// The leading CRLF of the first delimiter is optional.
    fn read_start(&mut self, c: u8, i: usize) -> usize {
        self.state = StartBoundary;
        if c == CR {
            self.index = 1;
            i + 1
        } else {
            self.index = 2;
            i
        }
    }

    fn read_start_boundary(&mut self, c: u8, i: usize) -> Result<usize, ParseError> {
        let len = self.boundary.len();

        if self.index < len {
            if c != self.boundary[self.index] {
                return Err(if self.index == 1 { ParseError::BoundaryLf } else { ParseError::BoundaryData });
            }
            self.index += 1;
        } else if self.index == len {
            match c {
                CR => self.index += 1,
                HYPHEN => self.state = StartBoundaryEnd,
                _ => return Err(ParseError::BoundaryCr),
            }
        } else {
            ensure!(c == LF, ParseError::BoundaryLf);
            self.index = 0;
            self.state = HeaderFieldStart;
            trace!("matched leading boundary");
        }

        Ok(i + 1)
    }

    fn read_start_boundary_end(&mut self, c: u8, i: usize) -> Result<usize, ParseError> {
        ensure!(c == HYPHEN, ParseError::BoundaryData);
        self.state = End;
        Ok(i + 1)
    }

    fn read_header_field_start(&mut self, i: usize) -> usize {
        self.header_field_mark = Some(i);
        self.index = 0;
        self.state = HeaderField;
        i
    }

    fn read_header_field(&mut self, input: &[u8], i: usize) -> Result<usize, ParseError> {
        match input[i] {
            CR => {
                // an empty line closes the header block
                ensure!(self.index == 0, ParseError::MalformedHeaderName);
                self.header_field_mark = None;
                self.state = HeadersAlmostDone;
            }
            COLON => {
                ensure!(self.index > 0, ParseError::EmptyHeaderName);
                let mark = self.header_field_mark.take().unwrap_or(i);
                let name = HeaderName::from_bytes(&input[mark..i]).map_err(|_| ParseError::MalformedHeaderName)?;
                self.header_name = Some(name);
                self.state = HeaderValueStart;
            }
            c if c == HYPHEN || c.is_ascii_alphabetic() => self.index += 1,
            _ => return Err(ParseError::MalformedHeaderName),
        }

        Ok(i + 1)
    }

    fn read_header_value_start(&mut self, c: u8, i: usize) -> usize {
        if c == SPACE || c == TAB {
            return i + 1;
        }

        self.header_value_mark = Some(i);
        self.state = HeaderValue;
        i
    }

    fn read_header_value(&mut self, input: &[u8], i: usize) -> Result<usize, ParseError> {
        let Some(offset) = input[i..].iter().position(|&b| b == CR) else {
            // the body ends inside this value
            return Ok(input.len());
        };
        let end = i + offset;

        let mark = self.header_value_mark.take().unwrap_or(i);
        let value = HeaderValue::from_bytes(&input[mark..end]).map_err(|_| ParseError::MalformedHeaderValue)?;
        let name = self.header_name.take().ok_or(ParseError::MalformedHeaderName)?;

        trace!(name = %name, value = ?value, "read part header");
        self.headers.insert(name, value);
        self.state = HeaderValueAlmostDone;

        Ok(end + 1)
    }

    fn read_header_value_almost_done(&mut self, c: u8, i: usize) -> Result<usize, ParseError> {
        ensure!(c == LF, ParseError::MalformedHeaderValue);
        self.state = HeaderFieldStart;
        Ok(i + 1)
    }

    fn read_headers_almost_done(&mut self, c: u8, i: usize) -> Result<usize, ParseError> {
        ensure!(c == LF, ParseError::MalformedHeaderEnding);
        self.state = PartDataStart;
        Ok(i + 1)
    }

    fn read_part_data_start(&mut self, i: usize) -> usize {
        self.part_data_mark = Some(i);
        self.index = 0;
        self.state = PartData;
        i
    }

    fn read_part_data(&mut self, input: &[u8], mut i: usize) -> usize {
        let len = self.boundary.len();
        let prev_index = self.index;

        if self.index == 0 {
            while i + len <= input.len() && !self.boundary_index[input[i + len - 1] as usize] {
                i += len;
            }
            if i == input.len() {
                return i;
            }
        }

        let c = input[i];

        if self.index < len {
            if self.boundary[self.index] == c {
                if self.index == 0 {
                    self.flush_part_data(input, i);
                }
                self.index += 1;
            } else {
                self.index = 0;
            }
        } else if self.index == len {
            self.index += 1;
            match c {
                CR => self.boundary_kind = Some(BoundaryKind::Part),
                HYPHEN => self.boundary_kind = Some(BoundaryKind::Last),
                _ => self.index = 0,
            }
        } else {
            match (self.boundary_kind, c) {
                (Some(BoundaryKind::Part), LF) => {
                    self.finish_part();
                    self.state = HeaderFieldStart;
                    return i + 1;
                }
                (Some(BoundaryKind::Last), HYPHEN) => {
                    self.finish_part();
                    self.state = End;
                    return i + 1;
                }
                _ => self.index = 0,
            }
        }

        if self.index > 0 {
            self.lookbehind[self.index - 1] = c;
            i + 1
        } else if prev_index > 0 {
            // not a delimiter after all, the held bytes are content
            self.content.extend_from_slice(&self.lookbehind[..prev_index]);
            self.boundary_kind = None;
            self.part_data_mark = Some(i);
            // the current byte may start a new match
            i
        } else {
            i + 1
        }
    }

    fn flush_part_data(&mut self, input: &[u8], i: usize) {
        if let Some(mark) = self.part_data_mark.take() {
            self.content.extend_from_slice(&input[mark..i]);
        }
    }

    fn finish_part(&mut self) {
        let headers = std::mem::take(&mut self.headers);
        let content = self.content.split().freeze();
        trace!(headers = headers.len(), size = content.len(), "finished part");

        self.parts.push(Part::new(headers, content));
        self.index = 0;
        self.boundary_kind = None;
    }
}
