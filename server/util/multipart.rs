/// One part of a `multipart/form-data` body.
#[derive(Debug, PartialEq)]
pub struct Part<'a> {
    pub name: Option<String>,
    pub filename: Option<String>,
    pub data: &'a [u8],
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
        .filter(|b| !b.is_empty())
}

/// Splits a multipart body into its parts. Preamble, epilogue and parts
/// without a header block are skipped.
pub fn parse_parts<'a>(body: &'a [u8], boundary: &str) -> Vec<Part<'a>> {
    let delimiter = format!("--{}", boundary);
    let sep = b"\r\n\r\n";

    split_on(body, delimiter.as_bytes())
        .into_iter()
        .filter_map(|part| {
            let sep_pos = find_subsequence(part, sep)?;
            let headers = String::from_utf8_lossy(&part[..sep_pos]);
            let raw = &part[sep_pos + sep.len()..];
            let data = raw.strip_suffix(b"\r\n").unwrap_or(raw);
            Some(Part {
                name: disposition_param(&headers, "name"),
                filename: disposition_param(&headers, "filename"),
                data,
            })
        })
        .collect()
}

/// Raw bytes of the file part whose field name is `field_name`.
pub fn file_field<'a>(body: &'a [u8], boundary: &str, field_name: &str) -> Option<&'a [u8]> {
    parse_parts(body, boundary)
        .into_iter()
        .find(|p| p.filename.is_some() && p.name.as_deref() == Some(field_name))
        .map(|p| p.data)
}

/// Parses `key="..."` out of a Content-Disposition header block. Parameters
/// are matched whole, so `name` never matches inside `filename`.
fn disposition_param(headers: &str, key: &str) -> Option<String> {
    let line = headers
        .lines()
        .find(|l| l.to_ascii_lowercase().starts_with("content-disposition"))?;
    line.split(';')
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix(key)?.strip_prefix('='))
        .map(|v| v.trim_matches('"').to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDARY: &str = "----formBoundary42";

    fn body() -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"------formBoundary42\r\n");
        b.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
        b.extend_from_slice(b"------formBoundary42\r\n");
        b.extend_from_slice(b"Content-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\n");
        b.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
        b.extend_from_slice(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x00]);
        b.extend_from_slice(b"\r\n------formBoundary42--\r\n");
        b
    }

    #[test]
    fn extracts_boundary() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=----formBoundary42"),
            Some(BOUNDARY.to_string())
        );
        assert_eq!(extract_boundary("multipart/form-data; boundary=\"abc\""), Some("abc".into()));
        assert_eq!(extract_boundary("application/json"), None);
    }

    #[test]
    fn finds_named_file_with_embedded_crlf() {
        let body = body();
        let data = file_field(&body, BOUNDARY, "image").unwrap();
        assert_eq!(data, &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x00]);
    }

    #[test]
    fn text_fields_are_not_files() {
        let body = body();
        assert!(file_field(&body, BOUNDARY, "note").is_none());
        assert!(file_field(&body, BOUNDARY, "other").is_none());
        let parts = parse_parts(&body, BOUNDARY);
        let note = parts.iter().find(|p| p.name.as_deref() == Some("note")).unwrap();
        assert_eq!(note.data, b"hello");
        assert_eq!(note.filename, None);
    }

    #[test]
    fn name_does_not_match_inside_filename() {
        let headers = "Content-Disposition: form-data; filename=\"x.png\"; name=\"image\"";
        assert_eq!(disposition_param(headers, "name"), Some("image".into()));
        assert_eq!(disposition_param(headers, "filename"), Some("x.png".into()));
    }
}
