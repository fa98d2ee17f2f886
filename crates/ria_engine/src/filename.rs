use ria_core::JobId;

const ARTIFACT_EXTENSION: &str = "xlsx";

/// Extract the file name from a `Content-Disposition` header value.
/// Prefers the RFC 5987 `filename*=` form over plain `filename=`.
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    for part in header.split(';').map(str::trim) {
        if let Some(value) = strip_prefix_ignore_case(part, "filename*=") {
            // UTF-8''percent-encoded
            let encoded = value.split("''").nth(1).unwrap_or(value);
            let decoded = percent_decode(encoded.trim_matches('"'));
            if !decoded.is_empty() {
                return Some(decoded);
            }
        } else if let Some(value) = strip_prefix_ignore_case(part, "filename=") {
            let value = value.trim_matches('"');
            if !value.is_empty() {
                plain = Some(value.to_string());
            }
        }
    }
    plain
}

/// Safe local file name for a downloaded artifact: the server's suggestion
/// when usable, `{job_id}.xlsx` otherwise.
pub fn artifact_filename(suggested: Option<&str>, job_id: &JobId) -> String {
    if let Some(name) = suggested.map(sanitize).filter(|name| !name.is_empty()) {
        return name;
    }
    let stem = sanitize(job_id.as_str());
    let stem = if stem.is_empty() { "artifact" } else { &stem };
    format!("{stem}.{ARTIFACT_EXTENSION}")
}

fn sanitize(input: &str) -> String {
    // Only the last path component; servers must not pick our directory.
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    if compacted.len() > 120 {
        let mut end = 120;
        while !compacted.is_char_boundary(end) {
            end -= 1;
        }
        compacted.truncate(end);
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn strip_prefix_ignore_case<'a>(input: &'a str, prefix: &str) -> Option<&'a str> {
    let head = input.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &input[prefix.len()..])
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(byte) = hex.and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
