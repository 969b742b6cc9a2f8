use crate::data::Variant;
use crate::data::job::ARCHIVE_EXT;

/// Substitute `{variant}` and `{id}` into a mirror template.
pub fn mirror_url(template: &str, variant: Variant, set_id: u64) -> String {
    template
        .replace("{variant}", variant.as_str())
        .replace("{id}", &set_id.to_string())
}

/// Returns `true` if `file_name` is an archive already holding `set_id`.
///
/// Both the fallback name `<id>.osz` and mirror-provided names of the form
/// `<id> <artist> - <title>.osz` count.
pub fn matches_set(file_name: &str, set_id: u64) -> bool {
    let Some(stem) = file_name
        .strip_suffix(ARCHIVE_EXT)
        .and_then(|s| s.strip_suffix('.'))
    else {
        return false;
    };
    let id = set_id.to_string();
    match stem.strip_prefix(id.as_str()) {
        Some("") => true,
        Some(rest) => rest.starts_with(' '),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DEFAULT_MIRROR;

    #[test]
    fn test_mirror_url() {
        assert_eq!(
            mirror_url(DEFAULT_MIRROR, Variant::NoVideo, 42),
            "https://dl.sayobot.cn/beatmaps/download/novideo/42"
        );
        assert_eq!(
            mirror_url("http://m/{id}?v={variant}&again={id}", Variant::Mini, 7),
            "http://m/7?v=mini&again=7"
        );
    }

    #[test]
    fn test_matches_set() {
        assert!(matches_set("42.osz", 42));
        assert!(matches_set("42 Artist - Title.osz", 42));
        assert!(!matches_set("421 Artist - Title.osz", 42));
        assert!(!matches_set("421.osz", 42));
        assert!(!matches_set("42.osz.tmp", 42));
        assert!(!matches_set("42 Artist - Title.zip", 42));
        assert!(!matches_set("x42.osz", 42));
    }
}
