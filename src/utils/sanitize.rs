//! Filename sanitization utilities

/// Characters that are unsafe in filenames on at least one major filesystem
const HOSTILE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Sanitize a title for use inside a filename
///
/// Strips the characters `<>:"/\|?*` and keeps everything else as-is,
/// including surrounding whitespace, so names stay predictable across runs.
pub fn sanitize_title(title: &str) -> String {
    title.chars().filter(|c| !HOSTILE_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_slashes() {
        assert_eq!(sanitize_title("BOTHERED / UNBOTHERED"), "BOTHERED  UNBOTHERED");
        assert_eq!(sanitize_title("R/Edgelord"), "REdgelord");
    }

    #[test]
    fn test_sanitize_colon() {
        assert_eq!(
            sanitize_title("Transistor: Original Soundtrack"),
            "Transistor Original Soundtrack"
        );
    }

    #[test]
    fn test_sanitize_quotes_and_wildcards() {
        assert_eq!(sanitize_title("\"Why?\" <live> *|*"), "Why live ");
    }

    #[test]
    fn test_no_changes_needed() {
        assert_eq!(sanitize_title("Part Two"), "Part Two");
    }

    #[test]
    fn test_unicode_preserved() {
        assert_eq!(sanitize_title("Ночь: часть 1"), "Ночь часть 1");
    }
}
