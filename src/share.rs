//! Shareable input state: the six raw fields as URL query parameters.
//!
//! Values are written verbatim (percent-encoded only), never re-formatted,
//! so a shared link reproduces exactly what the sender typed.

use std::collections::HashMap;

use crate::validate::{Field, RawInputs};

/// Percent-decoding for URL query parameters. `+` decodes to a space.
pub fn url_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => {
                let decoded = s
                    .get(i + 1..i + 3)
                    .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
                    .and_then(|hex| u8::from_str_radix(hex, 16).ok());
                match decoded {
                    Some(byte) => {
                        out.push(byte);
                        i += 2;
                    }
                    None => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
pub fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

/// Parse a query string into key-value pairs. Duplicate keys: last wins.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?;
            let val = parts.next().unwrap_or("");
            Some((url_decode(key), url_decode(val)))
        })
        .collect()
}

/// Lay the non-blank `params` over `base`. Absent and blank keys keep the
/// base value; unknown keys are ignored.
pub fn overlay(base: RawInputs, params: &HashMap<String, String>) -> RawInputs {
    overlay_where(base, params, |value| !value.trim().is_empty())
}

/// Lay every present `params` key over `base`, blank values included.
pub fn overlay_verbatim(base: RawInputs, params: &HashMap<String, String>) -> RawInputs {
    overlay_where(base, params, |_| true)
}

fn overlay_where(
    mut base: RawInputs,
    params: &HashMap<String, String>,
    keep: impl Fn(&str) -> bool,
) -> RawInputs {
    for field in Field::ALL {
        if let Some(value) = params.get(field.key()).filter(|v| keep(v.as_str())) {
            base.set(field, value.clone());
        }
    }
    base
}

/// Read the six inputs from already-parsed query params. Absent or blank
/// values fall back to the defaults; unknown keys are ignored.
pub fn from_params(params: &HashMap<String, String>) -> RawInputs {
    overlay(RawInputs::default(), params)
}

/// Read the six inputs from a query string such as `baselineRatePct=8&powerPct=90`.
pub fn from_query(query: &str) -> RawInputs {
    from_params(&parse_query(query))
}

/// Encode all six inputs in field order.
pub fn to_query(raw: &RawInputs) -> String {
    Field::ALL
        .iter()
        .map(|f| format!("{}={}", f.key(), url_encode(raw.get(*f))))
        .collect::<Vec<_>>()
        .join("&")
}

/// Full shareable link: `base` with the encoded inputs appended.
pub fn share_url(base: &str, raw: &RawInputs) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}{}", to_query(raw))
}
