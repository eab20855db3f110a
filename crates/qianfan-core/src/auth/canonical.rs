//! Canonical request construction for `bce-auth-v1`

use crate::transport::PreparedRequest;
use std::collections::BTreeSet;

/// Headers covered by the signature
pub const SIGNED_HEADERS: &[&str] = &["host", "x-bce-date"];

/// Percent-encode everything except `A-Z a-z 0-9 - _ . ~`
pub fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Encode each path segment, keeping the `/` separators
pub fn canonical_uri(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }
    path.split('/')
        .map(|segment| {
            let raw = urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string());
            encode(&raw)
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `k=v` pairs, encoded and sorted, without `authorization`
pub fn canonical_query(query: &[(String, String)]) -> String {
    let mut pairs: Vec<String> = query
        .iter()
        .filter(|(k, _)| !k.eq_ignore_ascii_case("authorization"))
        .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
        .collect();
    pairs.sort();
    pairs.join("&")
}

/// Signed headers as `encode(name):encode(value)` lines plus the sorted
/// `;`-joined list of their names
pub fn canonical_headers<'a>(
    headers: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> (String, String) {
    let mut lines = Vec::new();
    let mut names = BTreeSet::new();

    for (name, value) in headers {
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if value.is_empty() || !SIGNED_HEADERS.contains(&name.as_str()) {
            continue;
        }
        lines.push(format!("{}:{}", encode(&name), encode(value)));
        names.insert(name);
    }
    lines.sort();

    (
        lines.join("\n"),
        names.into_iter().collect::<Vec<_>>().join(";"),
    )
}

/// Canonical request text and the signed header names
pub fn canonical_request(request: &PreparedRequest, path: &str) -> (String, String) {
    let (headers, signed_names) = canonical_headers(&request.headers);
    let text = format!(
        "{}\n{}\n{}\n{}",
        request.method.as_str().to_ascii_uppercase(),
        canonical_uri(path),
        canonical_query(&request.query),
        headers
    );
    (text, signed_names)
}
