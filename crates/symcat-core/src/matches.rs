use once_cell::sync::Lazy;
use regex::Regex;

use crate::TextMatch;

/// `NUMBER.NUMBER NAME` entry lines. The name stops at the first character
/// outside letters, digits, spaces, slashes, parentheses and hyphens, which
/// includes the line break.
static ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+\.\d+)\s+([\w /()\-]+)").unwrap());

/// Scan a page's plain text for reference/name pairs, in text order.
///
/// The order is assumed to follow the page's image order; nothing here
/// checks that.
pub fn scan_text_matches(text: &str) -> Vec<TextMatch> {
    ENTRY_RE
        .captures_iter(text)
        .map(|caps| TextMatch::new(&caps[1], &caps[2]))
        .collect()
}
