//! `Content-Disposition` filename extraction.

use std::borrow::Cow;
use std::path::Path;

/// Extract the filename from a `Content-Disposition` value.
///
/// The RFC 5987 form `filename*=UTF-8''<pct-encoded>` wins when present;
/// otherwise a quoted or bare `filename=` parameter is used. Percent escapes
/// are decoded in both forms. The result is not yet safe to join onto a
/// directory, see [`sanitize_filename`].
pub fn parse_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;

    for param in split_params(header) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.eq_ignore_ascii_case("filename*") {
            extended = decode_extended(value);
        } else if key.eq_ignore_ascii_case("filename") {
            let raw = unquote(value);
            plain = Some(match urlencoding::decode(&raw.replace('+', " ")) {
                Ok(decoded) => decoded.into_owned(),
                Err(_) => raw.into_owned(),
            });
        }
    }

    extended.or(plain).filter(|name| !name.is_empty())
}

/// Reduce a server-supplied name to a bare file name.
///
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if last.is_empty() || last == "." || last == ".." {
        return None;
    }
    let cleaned: String = last
        .chars()
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    Path::new(&cleaned)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
}

/// Split on `;` outside of double quotes.
fn split_params(header: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in header.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&header[start..]);
    parts
}

fn unquote(value: &str) -> Cow<'_, str> {
    match value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        Some(inner) if inner.contains('\\') => {
            let mut out = String::with_capacity(inner.len());
            let mut chars = inner.chars();
            while let Some(c) = chars.next() {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else {
                    out.push(c);
                }
            }
            Cow::Owned(out)
        }
        Some(inner) => Cow::Borrowed(inner),
        None => Cow::Borrowed(value),
    }
}

/// `charset'lang'pct-encoded`; only UTF-8 is understood.
fn decode_extended(value: &str) -> Option<String> {
    let value = unquote(value);
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _lang = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    urlencoding::decode(encoded).ok().map(Cow::into_owned)
}
