//! Hand-assembled `multipart/form-data` bodies.
//!
//! The import API turned out to be sensitive to the order of form fields, so
//! bodies are built byte by byte with parts emitted exactly in the order they
//! are added. Field names and file names are written as given: nothing is
//! escaped and the boundary is not checked against the payload.

use std::time::{SystemTime, UNIX_EPOCH};

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Returns `<prefix><unix seconds>`, e.g. `----TestBoundary1718000000`.
pub fn boundary(prefix: &str) -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{prefix}{secs}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Field {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

impl Part {
    pub fn name(&self) -> &str {
        match self {
            Part::Field { name, .. } | Part::File { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MultipartBody {
    boundary: String,
    parts: Vec<Part>,
}

impl MultipartBody {
    pub fn new(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(Part::Field {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        self.parts.push(Part::File {
            name: name.into(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn finish(self) -> Vec<u8> {
        let mut body = Vec::new();

        for part in &self.parts {
            body.extend_from_slice(format!("--{}\r\n", self.boundary).as_bytes());
            match part {
                Part::Field { name, value } => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File {
                    name,
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                    body.extend_from_slice(bytes);
                }
            }
            body.extend_from_slice(b"\r\n");
        }

        body.extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        body
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::parse;
    use super::*;

    #[test]
    fn test_boundary_has_prefix_and_timestamp() {
        let boundary = boundary("----TestBoundary");
        let suffix = boundary.strip_prefix("----TestBoundary").unwrap();
        assert!(!suffix.is_empty());
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_finish_exact_bytes() {
        let body = MultipartBody::new("XYZ")
            .text("name", "a.txt")
            .file("file", "a.txt", OCTET_STREAM, b"hi".to_vec())
            .finish();

        let expected = "--XYZ\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            a.txt\r\n\
            --XYZ\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
            Content-Type: application/octet-stream\r\n\r\n\
            hi\r\n\
            --XYZ--\r\n";
        assert_eq!(String::from_utf8(body).unwrap(), expected);
    }

    #[test]
    fn test_empty_body_is_only_closing_boundary() {
        let body = MultipartBody::new("B").finish();
        assert_eq!(body, b"--B--\r\n");
    }

    #[test]
    fn test_content_type_header() {
        let body = MultipartBody::new("----TestBoundary1");
        assert_eq!(
            body.content_type(),
            "multipart/form-data; boundary=----TestBoundary1"
        );
    }

    #[tokio::test]
    async fn test_round_trip_through_multipart_parser() {
        let binary = vec![0u8, 1, 2, 13, 10, 45, 45, 255];
        let body = MultipartBody::new("----TestBoundary42")
            .text("path", "/")
            .file("file", "blob.bin", OCTET_STREAM, binary.clone())
            .text("note", "second field")
            .file("file", "id.json", "application/json", b"{\"a\":1}".to_vec());
        let parts_in = body.parts().to_vec();

        let parsed = parse(body.finish(), "----TestBoundary42").await;

        assert_eq!(parsed.len(), parts_in.len());
        for (parsed, original) in parsed.iter().zip(&parts_in) {
            assert_eq!(parsed.name, original.name());
            match original {
                Part::Field { value, .. } => {
                    assert_eq!(parsed.text(), *value);
                    assert_eq!(parsed.file_name, None);
                }
                Part::File {
                    file_name,
                    content_type,
                    bytes,
                    ..
                } => {
                    assert_eq!(parsed.file_name.as_deref(), Some(file_name.as_str()));
                    assert_eq!(parsed.content_type.as_deref(), Some(content_type.as_str()));
                    assert_eq!(&parsed.bytes, bytes);
                }
            }
        }
    }
}
