// Pre-clean pass for payloads that failed to parse as-is.
//
// Folds typographic quotes to ASCII, turns non-breaking and line-separator
// spaces into plain spaces, drops zero-width characters and strips control
// characters below U+0020. Tab, CR and LF become spaces so tokens on either
// side stay separated.

pub fn preclean(text: &str) -> String {
    text.chars()
        .filter_map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => Some('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => Some('"'),
            '\u{00A0}' | '\u{2007}' | '\u{202F}' | '\u{2028}' | '\u{2029}' => Some(' '),
            '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}' => None,
            '\t' | '\n' | '\r' => Some(' '),
            c if (c as u32) < 0x20 => None,
            c => Some(c),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curly_quotes_fold() {
        assert_eq!(
            preclean("{\u{201C}topic\u{201D}: \u{2018}sport\u{2019}}"),
            "{\"topic\": 'sport'}"
        );
    }

    #[test]
    fn test_invisible_characters() {
        assert_eq!(preclean("a\u{00A0}b\u{200B}c\u{FEFF}"), "a bc");
    }

    #[test]
    fn test_control_characters() {
        assert_eq!(preclean("a\u{0}b\u{7}c\nd\te"), "abc d e");
    }

    #[test]
    fn test_plain_text_unchanged() {
        let text = "{\"città\": \"Forlì\"}";
        assert_eq!(preclean(text), text);
    }
}
