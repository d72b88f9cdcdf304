use std::borrow::Cow;

/// Typographic dashes the display font has no glyphs for (U+2010 HYPHEN
/// through U+2015 HORIZONTAL BAR).
fn is_unsupported_dash(c: char) -> bool {
    matches!(c, '\u{2010}'..='\u{2015}')
}

/// Replace unsupported dashes with ASCII `-`.
///
/// Borrows the input when there is nothing to replace.
pub fn clean_unicode(input: &str) -> Cow<'_, str> {
    if !input.chars().any(is_unsupported_dash) {
        return Cow::Borrowed(input);
    }

    Cow::Owned(
        input
            .chars()
            .map(|c| if is_unsupported_dash(c) { '-' } else { c })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn true_hyphen_becomes_ascii() {
        assert_eq!(clean_unicode("Jay\u{2010}Z"), "Jay-Z");
    }

    #[test]
    fn dash_family_is_replaced() {
        assert_eq!(
            clean_unicode("a\u{2011}b\u{2013}c\u{2014}d"),
            "a-b-c-d"
        );
    }

    #[test]
    fn only_dashes_are_rewritten() {
        let cleaned = clean_unicode("Sigur Rós \u{2013} Hoppípolla");
        assert_eq!(cleaned, "Sigur Rós - Hoppípolla");

        let untouched = clean_unicode("Björk");
        assert!(matches!(untouched, Cow::Borrowed("Björk")));
    }
}
