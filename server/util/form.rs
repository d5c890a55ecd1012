/// Decodes a form value: `+` is a space, then `%XX` escapes are resolved.
pub fn url_decode(s: &str) -> String {
    percent_decode(&s.replace('+', " "))
}

/// Decodes `%XX` escapes only; `+` is kept, as in URL path segments.
///
/// Decoded bytes are reassembled as UTF-8 so multi-byte characters in URLs
/// survive; invalid sequences are replaced rather than rejected.
pub fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => {
                let hi = (bytes[i + 1] as char).to_digit(16);
                let lo = (bytes[i + 2] as char).to_digit(16);
                match (hi, lo) {
                    (Some(h), Some(l)) => {
                        out.push(((h << 4) | l) as u8);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses `key=value&key2=value2` into a `Vec` of `(key, value)` pairs.
pub fn parse_form(body: &str) -> Vec<(String, String)> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut it = pair.splitn(2, '=');
            let k = it.next()?.to_owned();
            let v = it.next().unwrap_or("").to_owned();
            Some((url_decode(&k), url_decode(&v)))
        })
        .collect()
}

/// Looks up a key in parsed form pairs, returning the value if found.
pub fn form_get<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_percent_and_plus() {
        assert_eq!(url_decode("a+b%20c"), "a b c");
        assert_eq!(url_decode("https%3A%2F%2Fexample.com%2Fcat.jpg"), "https://example.com/cat.jpg");
        assert_eq!(url_decode("caf%C3%A9"), "café");
        assert_eq!(url_decode("1%2B1"), "1+1");
    }

    #[test]
    fn path_decoding_keeps_plus() {
        assert_eq!(percent_decode("a+b%20c"), "a+b c");
    }

    #[test]
    fn keeps_malformed_escapes() {
        assert_eq!(url_decode("100%"), "100%");
        assert_eq!(url_decode("%zz"), "%zz");
        assert_eq!(url_decode("%4"), "%4");
    }

    #[test]
    fn parses_pairs_and_missing_values() {
        let pairs = parse_form("vp=2500&rho=2.4&flag");
        assert_eq!(form_get(&pairs, "vp"), Some("2500"));
        assert_eq!(form_get(&pairs, "rho"), Some("2.4"));
        assert_eq!(form_get(&pairs, "flag"), Some(""));
        assert_eq!(form_get(&pairs, "missing"), None);
        assert!(parse_form("").is_empty());
    }
}
