//! String canonicalisation shared by the naming and duplicate-detection code.

const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', '<', '>', '?', '*', ':', '|', '"'];
const FILENAME_REPLACEMENTS: [char; 9] = ['+', '+', '{', '}', '!', '@', '-', '#', '`'];

/// Removes characters that cannot appear in a filename.
///
/// With `replace_chars` each illegal character is swapped for a stand-in
/// (the same substitution the download queue applies to job names),
/// otherwise it is dropped.
#[must_use]
pub fn clean_string(name: &str, replace_chars: bool) -> String {
    let cleaned: String = name
        .chars()
        .filter_map(|c| {
            ILLEGAL_FILENAME_CHARS
                .iter()
                .position(|&bad| bad == c)
                .map_or(Some(c), |i| replace_chars.then(|| FILENAME_REPLACEMENTS[i]))
        })
        .collect();
    cleaned.trim().to_string()
}

/// Matching key used by every duplicate check: lower-cased, filename-illegal
/// characters dropped, `-` `.` `_` folded to spaces, whitespace collapsed.
#[must_use]
pub fn canonical_key(value: &str) -> String {
    value
        .to_lowercase()
        .chars()
        .filter(|&c| {
            !ILLEGAL_FILENAME_CHARS.contains(&c)
                && (c == '-' || !FILENAME_REPLACEMENTS.contains(&c))
        })
        .map(|c| match c {
            '-' | '.' | '_' => ' ',
            _ => c,
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_string_replace() {
        assert_eq!(clean_string("CSI: Miami", true), "CSI- Miami");
        assert_eq!(clean_string("Who? Me/You", true), "Who! Me+You");
    }

    #[test]
    fn test_clean_string_strip() {
        assert_eq!(clean_string("CSI: Miami", false), "CSI Miami");
        assert_eq!(clean_string(" \"Quoted\" ", false), "Quoted");
    }

    #[test]
    fn test_canonical_key_folds_punctuation() {
        assert_eq!(
            canonical_key("Show.Name.S01E02.720p-GROUP"),
            "show name s01e02 720p group"
        );
        assert_eq!(
            canonical_key("Show_Name - 1x02 - Pilot"),
            canonical_key("show name 1x02 pilot")
        );
    }

    #[test]
    fn test_canonical_key_ignores_filename_substitutions() {
        assert_eq!(
            canonical_key("CSI: Miami - 1x02 - Pilot"),
            canonical_key(&clean_string("CSI: Miami - 1x02 - Pilot", true))
        );
        assert_eq!(
            canonical_key("CSI: Miami - 1x02 - Pilot"),
            canonical_key(&clean_string("CSI: Miami - 1x02 - Pilot", false))
        );
    }
}
