//! Identifier extraction: find the payee's 13-digit taxpayer id on a page.
//!
//! A withholding certificate prints two 13-digit ids, the payer's and the
//! payee's, and text extraction often breaks them up with spaces or dashes
//! (`1 2345 67890 12 3`, `1-2345-67890-12-3`). Extraction runs in two steps:
//!
//! 1. [`find_candidates`] locates every 13-digit run (separators allowed
//!    between digits) and normalises it to bare digits.
//! 2. An [`IdentifierStrategy`] picks the one that belongs to the payee.
//!    [`PayeeMarkerStrategy`] encodes the 50 Tawi layout; other layouts can
//!    plug in their own strategy without touching the splitter.
//!
//! Output filenames depend on the choice, so the default strategy's tie-break
//! order is fixed and covered by tests.

use crate::config::DEFAULT_PAYEE_MARKER;
use once_cell::sync::Lazy;
use regex::Regex;

/// Classification used for pages with no identifier.
pub const UNKNOWN_IDENTIFIER: &str = "unknown";

/// Number of digits in a taxpayer identifier.
pub const IDENTIFIER_LEN: usize = 13;

/// A digit followed by 12 × (optional spaces, optional dash, optional spaces,
/// digit). Word boundaries are checked separately, see [`find_candidates`].
static RE_CANDIDATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d(?:\s*-?\s*\d){12}").unwrap());

/// Letters, numbers and `_`. Combining marks (Thai vowel and tone signs) are
/// not word characters, so an id glued to `ภาษี` still starts on a boundary.
static RE_WORD_CHAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\p{L}\p{N}_]$").unwrap());

static RE_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]").unwrap());

/// A 13-digit match located in page text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Byte offset of the match start in the page text.
    pub start: usize,
    /// The match with separators removed.
    pub identifier: String,
}

/// Strip spaces and dashes from a raw match.
///
/// Idempotent: normalising an already-normalised id returns it unchanged.
pub fn normalize(raw: &str) -> String {
    RE_SEPARATORS.replace_all(raw, "").into_owned()
}

fn is_word_char(c: char) -> bool {
    let mut buf = [0u8; 4];
    RE_WORD_CHAR.is_match(c.encode_utf8(&mut buf))
}

/// Every 13-digit candidate in `text`, in document order.
///
/// A match must not touch a word character on either side, so it never
/// starts or ends inside a longer digit run or a word. A rejected match is
/// retried from the next character; accepted matches do not overlap.
pub fn find_candidates(text: &str) -> Vec<Candidate> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(m) = RE_CANDIDATE.find_at(text, pos) {
        let before = text[..m.start()].chars().next_back();
        let after = text[m.end()..].chars().next();
        let bounded = !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char);

        if !bounded {
            // Step past the first digit of the rejected match.
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
            continue;
        }

        let identifier = normalize(m.as_str());
        if identifier.chars().count() == IDENTIFIER_LEN {
            found.push(Candidate {
                start: m.start(),
                identifier,
            });
        }
        pos = m.end();
    }
    found
}

/// Picks the payee identifier for one page.
pub trait IdentifierStrategy: Send + Sync {
    /// Return the payee's identifier, or `None` if the page has none.
    fn classify(&self, text: &str) -> Option<String>;
}

/// Positional heuristic for the 50 Tawi certificate layout.
///
/// 1. If the marker phrase occurs, take the first candidate starting after
///    its first occurrence.
/// 2. Otherwise, with two or more candidates, take the second (payer first,
///    payee second).
/// 3. Otherwise take the first candidate.
///
/// A marker with no candidate after it falls through to rules 2 and 3.
#[derive(Debug, Clone)]
pub struct PayeeMarkerStrategy {
    marker: String,
}

impl PayeeMarkerStrategy {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for PayeeMarkerStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_PAYEE_MARKER)
    }
}

impl IdentifierStrategy for PayeeMarkerStrategy {
    fn classify(&self, text: &str) -> Option<String> {
        if text.is_empty() {
            return None;
        }

        let mut candidates = find_candidates(text);
        if candidates.is_empty() {
            return None;
        }

        if let Some(marker_at) = text.find(&self.marker) {
            if let Some(pos) = candidates.iter().position(|c| c.start > marker_at) {
                return Some(candidates.swap_remove(pos).identifier);
            }
        }

        let pick = if candidates.len() >= 2 { 1 } else { 0 };
        Some(candidates.swap_remove(pick).identifier)
    }
}

/// Classify a page's text, mapping "no identifier" (or no text) to
/// [`UNKNOWN_IDENTIFIER`].
pub fn classify_page(strategy: &dyn IdentifierStrategy, text: Option<&str>) -> String {
    text.and_then(|t| strategy.classify(t))
        .unwrap_or_else(|| UNKNOWN_IDENTIFIER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYER: &str = "0105551234567";
    const PAYEE: &str = "3101700123456";

    fn classify(text: &str) -> Option<String> {
        PayeeMarkerStrategy::default().classify(text)
    }

    #[test]
    fn finds_plain_spaced_and_dashed_ids() {
        let text = "a 0105551234567 b 0 1055 51234 56 7 c 0-1055-51234-56-7 d";
        let found = find_candidates(text);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|c| c.identifier == PAYER));
        assert!(found[0].start < found[1].start && found[1].start < found[2].start);
    }

    #[test]
    fn ignores_longer_and_shorter_digit_runs() {
        assert!(find_candidates("01055512345678").is_empty());
        assert!(find_candidates("010555123456").is_empty());
        assert!(find_candidates("x01055512345678y").is_empty());
    }

    #[test]
    fn id_glued_to_a_trailing_combining_mark_is_found() {
        // ี (U+0E35) is a combining mark, not a word character.
        let found = find_candidates(&format!("ผู้ถูกหักภาษี{PAYEE}"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier, PAYEE);
        assert_eq!(found[0].start, "ผู้ถูกหักภาษี".len());
    }

    #[test]
    fn id_glued_to_a_letter_is_ignored() {
        assert!(find_candidates(&format!("ร{PAYEE}")).is_empty());
        assert!(find_candidates(&format!("{PAYEE}ก")).is_empty());
        assert!(find_candidates(&format!("_{PAYEE}")).is_empty());
        assert_eq!(find_candidates(&format!("ภาษี {PAYEE}")).len(), 1);
    }

    #[test]
    fn rejected_match_is_retried_from_the_next_character() {
        // The run starting at "x1" is rejected; the separated id after it is kept.
        let text = format!("x1 {PAYEE}");
        let found = find_candidates(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier, PAYEE);
        assert_eq!(found[0].start, 3);
    }

    #[test]
    fn marker_glued_to_payee_id_selects_it() {
        let text = format!("ผู้จ่ายเงิน {PAYER} ผู้ถูกหักภาษี{PAYEE}");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn double_dash_breaks_a_candidate() {
        assert!(find_candidates("0105551--234567").is_empty());
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = normalize("3 1017-00123 45 6");
        assert_eq!(once, PAYEE);
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn marker_selects_first_candidate_after_it() {
        let text = format!("ผู้จ่ายเงิน {PAYER} ผู้ถูกหักภาษี ณ ที่จ่าย {PAYEE}");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn marker_wins_over_position() {
        // Payee printed first, then marker, then a third id.
        let other = "1111111111111";
        let text = format!("{PAYEE} {PAYER} ผู้ถูกหักภาษี {other}");
        assert_eq!(classify(&text).as_deref(), Some(other));
    }

    #[test]
    fn marker_without_later_candidate_falls_back_to_second() {
        let text = format!("{PAYER} {PAYEE} ผู้ถูกหักภาษี");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn no_marker_two_candidates_takes_second() {
        let text = format!("payer {PAYER} payee {PAYEE}");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn no_marker_three_candidates_still_takes_second() {
        let text = format!("{PAYER} {PAYEE} 1111111111111");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn single_candidate_is_returned() {
        let text = format!("only {PAYEE} here");
        assert_eq!(classify(&text).as_deref(), Some(PAYEE));
    }

    #[test]
    fn nothing_found_is_none_and_unknown() {
        assert_eq!(classify("no ids on this page 12345"), None);
        assert_eq!(classify(""), None);
        let strategy = PayeeMarkerStrategy::default();
        assert_eq!(classify_page(&strategy, Some("nothing")), UNKNOWN_IDENTIFIER);
        assert_eq!(classify_page(&strategy, None), UNKNOWN_IDENTIFIER);
    }

    #[test]
    fn custom_marker() {
        let strategy = PayeeMarkerStrategy::new("Payee:");
        let text = format!("Payer: {PAYER}\nPayee: {PAYEE}");
        assert_eq!(strategy.classify(&text).as_deref(), Some(PAYEE));
        assert_eq!(strategy.marker(), "Payee:");
    }
}
