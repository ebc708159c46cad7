use md5::{Digest, Md5};

/// Integrity token sent as `content_hash` with every uploaded file.
///
/// The digest covers the file bytes followed by the UTF-8 file name, so the
/// same bytes uploaded under another name produce a different hash.
pub fn content_hash(bytes: &[u8], file_name: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hasher.update(file_name.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_is_md5_of_bytes_then_name() {
        // md5("hello")
        assert_eq!(
            content_hash(b"hel", "lo"),
            "5d41402abc4b2a76b9719d911017c592"
        );
    }

    #[test]
    fn test_content_hash_empty_input() {
        assert_eq!(content_hash(b"", ""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_content_hash_is_lowercase_hex() {
        let hash = content_hash(b"\x00\xff binary", "Identification.crc");
        assert_eq!(hash.len(), 32);
        assert!(
            hash.chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_content_hash_binds_file_name() {
        let bytes = b"same bytes";
        assert_ne!(
            content_hash(bytes, "Identification.json"),
            content_hash(bytes, "Identification.crc")
        );
    }

    #[test]
    fn test_content_hash_binds_bytes() {
        assert_ne!(
            content_hash(b"first", "id.json"),
            content_hash(b"second", "id.json")
        );
    }

    #[test]
    fn test_content_hash_is_deterministic() {
        assert_eq!(
            content_hash(b"0123456789", "id.json"),
            content_hash(b"0123456789", "id.json")
        );
    }
}
