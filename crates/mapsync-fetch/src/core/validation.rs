/// Only a plain 200 carries a complete body; 206 and friends do not.
pub fn is_success(status: u16) -> bool {
    status == 200
}

/// Returns `true` if the content type can carry an archive.
///
/// Any `application/*` type qualifies; parameters are ignored and the match
/// is case-insensitive. A missing header does not qualify.
///
/// # Examples
///
/// ```
/// use mapsync_fetch::core::is_acceptable_content_type;
///
/// assert!(is_acceptable_content_type(Some("application/octet-stream")));
/// assert!(is_acceptable_content_type(Some("Application/x-osu-beatmap-archive; charset=binary")));
/// assert!(!is_acceptable_content_type(Some("text/html; charset=utf-8")));
/// assert!(!is_acceptable_content_type(None));
/// ```
pub fn is_acceptable_content_type(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    let Some((kind, subtype)) = essence.split_once('/') else {
        return false;
    };
    kind.eq_ignore_ascii_case("application") && !subtype.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_success() {
        assert!(is_success(200));
        assert!(!is_success(201));
        assert!(!is_success(204));
        assert!(!is_success(206));
        assert!(!is_success(199));
        assert!(!is_success(302));
        assert!(!is_success(404));
        assert!(!is_success(503));
    }

    #[test]
    fn test_content_types() {
        assert!(is_acceptable_content_type(Some("application/octet-stream")));
        assert!(is_acceptable_content_type(Some("application/zip")));
        assert!(is_acceptable_content_type(Some(" APPLICATION/ZIP ")));
        assert!(!is_acceptable_content_type(Some("application/")));
        assert!(!is_acceptable_content_type(Some("application")));
        assert!(!is_acceptable_content_type(Some("text/plain")));
        assert!(!is_acceptable_content_type(Some("")));
    }
}
