/// One benchmark input: a multipart body whose file part size depends on the group.
#[derive(Debug, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    boundary: &'static str,
    body: Vec<u8>,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, boundary: &'static str) -> Self {
        let file = binary_payload(group.part_size());
        let body = multipart_body(boundary, &[("description", b"firmware image"), ("UpdateFile", &file)]);
        Self { name, group, boundary, body }
    }

    pub fn small(name: &'static str, boundary: &'static str) -> Self {
        Self::new(name, TestGroup::Small, boundary)
    }

    pub fn normal(name: &'static str, boundary: &'static str) -> Self {
        Self::new(name, TestGroup::Normal, boundary)
    }

    pub fn large(name: &'static str, boundary: &'static str) -> Self {
        Self::new(name, TestGroup::Large, boundary)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn boundary(&self) -> &'static str {
        self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}

impl TestGroup {
    pub fn part_size(self) -> usize {
        match self {
            TestGroup::Small => 1024,
            TestGroup::Normal => 64 * 1024,
            TestGroup::Large => 4 * 1024 * 1024,
        }
    }
}

/// Builds a `multipart/form-data` body with one part per `(name, content)` pair.
pub fn multipart_body(boundary: &str, parts: &[(&str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, content) in parts {
        body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{boundary}--\r\n").as_bytes());
    body
}

/// Deterministic pseudo-random bytes, so CR, LF and `-` show up inside part content.
pub fn binary_payload(size: usize) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    (0..size)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state.to_le_bytes()[0]
        })
        .collect()
}
