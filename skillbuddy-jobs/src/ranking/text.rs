//! Text helpers for lexical skill matching.

use crate::types::NormalizedPosting;

/// Lower-cased title and description, the text skills are matched against.
pub fn posting_text(posting: &NormalizedPosting) -> String {
    let mut text = String::with_capacity(posting.title.len() + posting.description.len() + 1);
    text.push_str(&posting.title);
    text.push('\n');
    text.push_str(&posting.description);
    text.to_lowercase()
}

/// Whether `term` occurs in `text` with no alphanumeric character directly
/// on either side.
///
/// Both arguments are expected to be lower-cased already. `"sql"` matches
/// `"sql, python"` and `"(sql)"` but not `"mysql"` or `"sqlite"`.
pub fn contains_term(text: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    text.match_indices(term).any(|(start, matched)| {
        let before = text[..start].chars().next_back();
        let after = text[start + matched.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_words_match() {
        assert!(contains_term("python developer", "python"));
        assert!(contains_term("we use python", "python"));
        assert!(contains_term("python", "python"));
    }

    #[test]
    fn punctuation_is_a_boundary() {
        assert!(contains_term("skills: sql, python.", "sql"));
        assert!(contains_term("(sql)", "sql"));
        assert!(contains_term("c++ and rust", "c++"));
        assert!(contains_term("node.js/react", "node.js"));
    }

    #[test]
    fn embedded_terms_do_not_match() {
        assert!(!contains_term("mysql administrator", "sql"));
        assert!(!contains_term("sqlite embedded", "sql"));
        assert!(!contains_term("javascript", "java"));
    }

    #[test]
    fn later_occurrence_can_match() {
        assert!(contains_term("mysql and plain sql", "sql"));
    }

    #[test]
    fn multi_word_terms() {
        assert!(contains_term("strong machine learning background", "machine learning"));
        assert!(!contains_term("machine learnings", "machine learning"));
    }

    #[test]
    fn empty_term_never_matches() {
        assert!(!contains_term("anything", ""));
    }

    #[test]
    fn non_ascii_boundaries() {
        assert!(contains_term("entwickler für rust", "rust"));
        assert!(!contains_term("rustó", "rust"));
    }

    #[test]
    fn posting_text_is_lowercased_title_and_description() {
        let posting = NormalizedPosting {
            title: "Senior PYTHON Engineer".into(),
            company: "Acme".into(),
            location: "Remote".into(),
            description: "Work with SQL".into(),
            url: "https://example.com/1".into(),
            posted_date: None,
            provider_id: "1".into(),
        };
        let text = posting_text(&posting);
        assert!(text.contains("senior python engineer"));
        assert!(text.contains("work with sql"));
        assert!(!text.contains("acme"));
    }
}
