//! Text and identifier normalization shared by every stage of the pipeline.
//!
//! The same canonical form is used to compare sheet names, to compare column
//! names, and to build join keys, so all three agree on what "the same" means.

use std::sync::OnceLock;

use regex::Regex;
use unicode_normalization::char::canonical_combining_class;
use unicode_normalization::UnicodeNormalization as _;

/// Width of a person key (CPF) after zero-padding.
pub const PERSON_KEY_LEN: usize = 11;

/// Width of a branch code after zero-padding.
pub const BRANCH_CODE_LEN: usize = 2;

/// Branch code meaning "not budgeted" or "not realized".
pub const SENTINEL_BRANCH: &str = "00";

/// Which characters survive [`clean_text_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanMode {
    /// Keep word characters (letters, digits, underscore).
    Value,
    /// Keep ASCII letters only; digits and punctuation are dropped.
    ColumnName,
}

fn word_filter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s]").expect("static pattern"))
}

fn letter_filter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z\s]").expect("static pattern"))
}

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static pattern"))
}

fn numeric_residue() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.,]").expect("static pattern"))
}

fn digit_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d+").expect("static pattern"))
}

/// Canonical form of `text` in [`CleanMode::Value`] mode.
///
/// `clean_text("Olá, mundo! Tudo bem?") == "OlamundoTudobem"`.
pub fn clean_text(text: &str) -> String {
    clean_text_with(text, CleanMode::Value)
}

/// Decompose (NFKD), drop combining marks, drop disallowed characters, then
/// drop all whitespace. Idempotent for both modes.
pub fn clean_text_with(text: &str, mode: CleanMode) -> String {
    let stripped: String = text.nfkd().filter(|c| canonical_combining_class(*c) == 0).collect();
    let filtered = match mode {
        CleanMode::Value => word_filter().replace_all(&stripped, ""),
        CleanMode::ColumnName => letter_filter().replace_all(&stripped, ""),
    };
    whitespace().replace_all(&filtered, "").into_owned()
}

/// Upper-cased canonical form used for sheet and column matching.
pub fn match_token(text: &str) -> String {
    clean_text(text).to_uppercase()
}

/// Parse a cell into a number using a chain of increasingly lax attempts.
///
/// Empty input is `Some(0.0)`. `None` means "unparseable", which is distinct
/// from zero: callers decide whether to coerce it.
///
/// The chain is: plain parse, comma swapped for a period, then strip
/// everything except digits, commas and periods and swap again. A value with
/// both thousands and decimal separators (`"1.234,56"`) ends up with two
/// periods and fails every step.
pub fn convert_to_float(value: &str) -> Option<f64> {
    if value.is_empty() {
        return Some(0.0);
    }

    if let Some(n) = parse_plain(value) {
        return Some(n);
    }

    if let Some(n) = parse_plain(&value.replace(',', ".")) {
        return Some(n);
    }

    let cleaned = numeric_residue().replace_all(value, "").replace(',', ".");
    parse_plain(&cleaned)
}

/// Float parse that tolerates surrounding whitespace.
fn parse_plain(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Left-pad `s` with zeros to `width` characters. Longer inputs are returned
/// unchanged.
pub fn zero_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        return s.to_string();
    }
    let mut out = "0".repeat(width - len);
    out.push_str(s);
    out
}

/// Reduce a raw branch label to a two-digit code.
///
/// `"31 - CABEDELO"` → `"31"`, `"CD3"` → `"03"`. Labels with no digits before
/// the `" - "` separator yield `None`.
pub fn format_branch(value: &str) -> Option<String> {
    let head = value.split(" - ").next().unwrap_or("");
    digit_run()
        .find(head)
        .map(|m| zero_pad(m.as_str(), BRANCH_CODE_LEN))
}

/// Person key as read from a benefit sheet: the cleaned text, or `None` for a
/// blank cell.
pub fn sheet_person_key(value: &str) -> Option<String> {
    if value.is_empty() {
        return None;
    }
    Some(clean_text(value))
}

/// Whether a cleaned key is long enough to identify a person.
pub fn is_valid_person_key(key: &str) -> bool {
    key.chars().count() >= PERSON_KEY_LEN
}

/// Person key as read from the budget table: `.` and `-` removed, then padded.
pub fn budget_person_key(value: &str) -> String {
    let stripped: String = value.chars().filter(|c| *c != '.' && *c != '-').collect();
    zero_pad(&stripped, PERSON_KEY_LEN)
}

/// Person key as read from a roster: digits only, then padded.
pub fn roster_person_key(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    zero_pad(&digits, PERSON_KEY_LEN)
}

/// Round to cents, ties to even.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}
