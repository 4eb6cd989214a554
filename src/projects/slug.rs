/// Canonical slug for a project title.
///
/// Lowercases, drops apostrophes and quotes, turns every other run of
/// non-alphanumeric characters into a single hyphen and trims hyphens from
/// both ends. Applied identically to relational and content records.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_sep = false;

    for c in title.chars() {
        if matches!(c, '\'' | '"' | '\u{2019}' | '\u{2018}' | '`') {
            continue;
        }
        if c.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('-');
            }
            pending_sep = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_and_case_collapse() {
        assert_eq!(slugify("Pitch Summit"), "pitch-summit");
        assert_eq!(slugify("pitch   summit"), "pitch-summit");
        assert_eq!(slugify("  PITCH\tSummit  "), "pitch-summit");
    }

    #[test]
    fn punctuation_becomes_single_hyphen() {
        assert_eq!(slugify("Acme Bot!"), "acme-bot");
        assert_eq!(slugify("--Deis__Hacks  2024--"), "deis-hacks-2024");
        assert_eq!(slugify("A.I. Tutor"), "a-i-tutor");
    }

    #[test]
    fn apostrophes_are_dropped_not_hyphenated() {
        assert_eq!(slugify("Bob's Bagels"), "bobs-bagels");
        assert_eq!(slugify("Bob\u{2019}s Bagels"), "bobs-bagels");
    }

    #[test]
    fn symbols_only_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
