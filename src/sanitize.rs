//! File name cleanup for names built from catalog metadata

const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Makes `name` safe to use as a single path component on any platform
pub fn file_name(name: &str) -> String {
    let cleaned = name
        .chars()
        .map(|c| {
            if INVALID.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect::<String>();

    let trimmed = cleaned.trim().trim_end_matches(['.', ' ']);
    if trimmed.is_empty() || trimmed.chars().all(|c| c == '_') {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::file_name;

    #[test]
    fn replaces_separators_and_reserved_characters() {
        assert_eq!(file_name("AC/DC - T.N.T."), "AC_DC - T.N.T");
        assert_eq!(file_name(r#"What? "Why": <no>|*\"#), "What_ _Why__ _no____");
    }

    #[test]
    fn strips_control_characters() {
        assert_eq!(file_name("a\tb\nc"), "a_b_c");
    }

    #[test]
    fn trims_trailing_dots_and_spaces() {
        assert_eq!(file_name("  Song ... "), "Song");
    }

    #[test]
    fn keeps_unicode() {
        assert_eq!(file_name("Sigur Rós - Hoppípolla"), "Sigur Rós - Hoppípolla");
    }

    #[test]
    fn empty_names_get_a_placeholder() {
        assert_eq!(file_name(""), "untitled");
        assert_eq!(file_name(" . "), "untitled");
        assert_eq!(file_name("///"), "untitled");
    }
}
