use bytes::Bytes;
use http::{HeaderMap, HeaderValue};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use mime::Mime;

/// One part of a `multipart/form-data` body: its headers and its raw content.
#[derive(Debug, Clone, Default)]
pub struct Part {
    headers: HeaderMap,
    content: Bytes,
}

impl Part {
    pub(crate) fn new(headers: HeaderMap, content: Bytes) -> Self {
        Self { headers, content }
    }

    /// The part headers. Lookups are case-insensitive.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The value of header `name`, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        utf8_value(self.headers.get(name)?)
    }

    pub fn content(&self) -> &Bytes {
        &self.content
    }

    pub fn into_content(self) -> Bytes {
        self.content
    }

    /// The `name` parameter of the Content-Disposition header.
    pub fn name(&self) -> Option<&str> {
        self.disposition_param("name")
    }

    /// The `filename` parameter of the Content-Disposition header.
    pub fn file_name(&self) -> Option<&str> {
        self.disposition_param("filename")
    }

    /// The declared Content-Type of this part.
    pub fn content_type(&self) -> Option<Mime> {
        utf8_value(self.headers.get(CONTENT_TYPE)?)?.parse().ok()
    }

    fn disposition_param(&self, key: &str) -> Option<&str> {
        let disposition = utf8_value(self.headers.get(CONTENT_DISPOSITION)?)?;
        disposition_param(disposition, key)
    }
}

// part headers may carry raw UTF-8, which `HeaderValue::to_str` rejects
fn utf8_value(value: &HeaderValue) -> Option<&str> {
    std::str::from_utf8(value.as_bytes()).ok()
}

/// Finds parameter `key` in a header value like `form-data; name="a"; filename="b.txt"`.
fn disposition_param<'a>(value: &'a str, key: &str) -> Option<&'a str> {
    // skip the disposition type
    let mut rest = &value[value.find(';')? + 1..];

    loop {
        rest = rest.trim_start_matches([' ', '\t', ';']);
        let eq = rest.find('=')?;
        let name = rest[..eq].trim();
        let after = rest[eq + 1..].trim_start();

        let (param, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted.find('"')?;
            (&quoted[..end], &quoted[end + 1..])
        } else {
            let end = after.find(';').unwrap_or(after.len());
            (after[..end].trim_end(), &after[end..])
        };

        if name.eq_ignore_ascii_case(key) {
            return Some(param);
        }
        rest = remaining;
    }
}
