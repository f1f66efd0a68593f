//! Number recognition for string leaves.
//!
//! Plain mode accepts whatever `f64::from_str` accepts after trimming, as
//! long as the result is finite. International mode additionally folds
//! non-ASCII digit scripts, thousands separators, a leading currency symbol
//! and CJK numerals into plain numbers.

use once_cell::sync::Lazy;
use regex::Regex;

static THOUSANDS_SEPARATED: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$")
        .expect("Hard-coded regex pattern should be valid")
});

const CURRENCY_SYMBOLS: [char; 7] = ['$', '¥', '￥', '€', '£', '₹', '₩'];

/// Parses a string leaf into a finite number.
pub fn parse_number(text: &str, international: bool) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(value) = parse_plain(trimmed) {
        return Some(value);
    }
    if international {
        parse_international(trimmed)
    } else {
        None
    }
}

fn parse_plain(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_international(text: &str) -> Option<f64> {
    let folded = fold_digits(text);
    let (negative, unsigned) = split_sign(&folded);
    let unsigned = unsigned
        .strip_prefix(CURRENCY_SYMBOLS)
        .map(str::trim_start)
        .unwrap_or(unsigned);

    let magnitude = if THOUSANDS_SEPARATED.is_match(unsigned) {
        parse_plain(&unsigned.replace(',', ""))
    } else {
        parse_plain(unsigned).or_else(|| parse_kanji(unsigned))
    }?;

    Some(if negative { -magnitude } else { magnitude })
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest.trim_start())
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest.trim_start())
    } else {
        (false, text)
    }
}

/// Maps full-width, Arabic-Indic, Extended Arabic-Indic and Devanagari
/// digits (and full-width punctuation) to ASCII.
fn fold_digits(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let code = ch as u32;
            let digit = match code {
                0xFF10..=0xFF19 => Some(code - 0xFF10),
                0x0660..=0x0669 => Some(code - 0x0660),
                0x06F0..=0x06F9 => Some(code - 0x06F0),
                0x0966..=0x096F => Some(code - 0x0966),
                _ => None,
            };
            match (digit, ch) {
                (Some(d), _) => char::from_digit(d, 10).unwrap_or(ch),
                (None, '．') => '.',
                (None, '，') => ',',
                (None, '－') => '-',
                (None, '＋') => '+',
                (None, other) => other,
            }
        })
        .collect()
}

fn kanji_digit(ch: char) -> Option<u32> {
    match ch {
        '〇' | '零' => Some(0),
        '一' => Some(1),
        '二' => Some(2),
        '三' => Some(3),
        '四' => Some(4),
        '五' => Some(5),
        '六' => Some(6),
        '七' => Some(7),
        '八' => Some(8),
        '九' => Some(9),
        _ => ch.to_digit(10),
    }
}

fn small_unit(ch: char) -> Option<f64> {
    match ch {
        '十' => Some(10.0),
        '百' => Some(100.0),
        '千' => Some(1_000.0),
        _ => None,
    }
}

fn large_unit(ch: char) -> Option<f64> {
    match ch {
        '万' => Some(1e4),
        '億' => Some(1e8),
        '兆' => Some(1e12),
        _ => None,
    }
}

/// Positional and multiplicative CJK numerals, e.g. `三千五百`, `1万2千`, `二〇二四`.
///
/// Requires at least one CJK character so plain digit strings never land here.
fn parse_kanji(text: &str) -> Option<f64> {
    if !text.chars().any(|ch| !ch.is_ascii()) {
        return None;
    }

    let mut total = 0.0;
    let mut section = 0.0;
    let mut digits: Option<f64> = None;

    for ch in text.chars() {
        if let Some(d) = kanji_digit(ch) {
            digits = Some(digits.unwrap_or(0.0) * 10.0 + f64::from(d));
        } else if let Some(unit) = small_unit(ch) {
            section += digits.take().unwrap_or(1.0) * unit;
        } else if let Some(unit) = large_unit(ch) {
            section += digits.take().unwrap_or(0.0);
            if section == 0.0 {
                section = 1.0;
            }
            total += section * unit;
            section = 0.0;
        } else {
            return None;
        }
    }

    let value = total + section + digits.unwrap_or(0.0);
    value.is_finite().then_some(value)
}
