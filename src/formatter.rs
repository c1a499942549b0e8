//! Display formatting for cell and chart values.
//!
//! Format patterns are a small mask grammar: `0` and `#` digit
//! placeholders, `,` for thousands grouping, `.` for the decimal point,
//! and `'...'` quoted literal text. Example: `#,##0.00'%'`.
//!
//! Formatting never fails: an empty or unparseable pattern, or a
//! non-numeric value, falls back to the value's natural text form.

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    multi::many1,
    sequence::delimited,
    IResult,
};

use crate::record::FieldValue;
use crate::resolve::{Resolved, PLACEHOLDER};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Mask(Mask),
    Literal(String),
}

/// Digit-mask section of a pattern.
#[derive(Debug, Clone, PartialEq)]
struct Mask {
    min_int_digits: usize,
    grouped: bool,
    frac_total: usize,
    frac_min: usize,
}

impl Mask {
    fn from_pattern(raw: &str) -> Mask {
        let (int_part, frac_part) = match raw.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (raw, None),
        };
        Mask {
            min_int_digits: int_part.chars().filter(|&c| c == '0').count().max(1),
            grouped: int_part.contains(','),
            frac_total: frac_part
                .map(|f| f.chars().filter(|&c| c == '0' || c == '#').count())
                .unwrap_or(0),
            frac_min: frac_part
                .map(|f| f.chars().filter(|&c| c == '0').count())
                .unwrap_or(0),
        }
    }
}

fn quoted(input: &str) -> IResult<&str, Token> {
    let (rest, inner) = delimited(char('\''), take_while(|c| c != '\''), char('\''))(input)?;
    Ok((rest, Token::Literal(inner.to_string())))
}

fn mask(input: &str) -> IResult<&str, Token> {
    let (rest, raw) = take_while1(|c| matches!(c, '0' | '#' | ',' | '.'))(input)?;
    Ok((rest, Token::Mask(Mask::from_pattern(raw))))
}

fn bare(input: &str) -> IResult<&str, Token> {
    let (rest, raw) = take_while1(|c| !matches!(c, '0' | '#' | ',' | '.' | '\''))(input)?;
    Ok((rest, Token::Literal(raw.to_string())))
}

fn tokens(input: &str) -> IResult<&str, Vec<Token>> {
    many1(alt((quoted, mask, bare)))(input)
}

/// A parsed format pattern. Exactly one digit mask is required; patterns
/// with none (or several) are rejected and callers fall back to natural
/// text.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberFormat {
    parts: Vec<Token>,
}

impl NumberFormat {
    pub fn parse(pattern: &str) -> Option<NumberFormat> {
        let (rest, parts) = tokens(pattern).ok()?;
        if !rest.is_empty() {
            return None;
        }
        let masks = parts
            .iter()
            .filter(|t| matches!(t, Token::Mask(_)))
            .count();
        if masks != 1 {
            return None;
        }
        Some(NumberFormat { parts })
    }

    pub fn apply(&self, value: f64) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Token::Literal(text) => out.push_str(text),
                Token::Mask(mask) => out.push_str(&apply_mask(value, mask)),
            }
        }
        out
    }
}

fn apply_mask(value: f64, mask: &Mask) -> String {
    let negative = value < 0.0;
    let rendered = format!("{:.*}", mask.frac_total, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (rendered, String::new()),
    };

    let mut frac = frac_part;
    while frac.len() > mask.frac_min && frac.ends_with('0') {
        frac.pop();
    }

    let mut int_digits = int_part;
    while int_digits.len() < mask.min_int_digits {
        int_digits.insert(0, '0');
    }
    if mask.grouped {
        int_digits = group_thousands(&int_digits);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&int_digits);
    if !frac.is_empty() {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

/// Format a bare number with a pattern, natural text when the pattern
/// is empty or invalid.
pub fn format_number(value: f64, pattern: &str) -> String {
    if pattern.is_empty() {
        return natural(value);
    }
    match NumberFormat::parse(pattern) {
        Some(fmt) => fmt.apply(value),
        None => natural(value),
    }
}

/// Format a resolved cell value. Null and unresolved values render as the
/// fixed placeholder; numeric text gets the pattern applied; everything
/// else keeps its natural text form.
pub fn format_cell(value: &Resolved, pattern: &str) -> String {
    let Some(text) = value.text() else {
        return PLACEHOLDER.to_string();
    };
    if pattern.is_empty() {
        return text;
    }
    match text.trim().parse::<f64>() {
        Ok(n) => match NumberFormat::parse(pattern) {
            Some(fmt) => fmt.apply(n),
            None => text,
        },
        Err(_) => text,
    }
}

fn natural(value: f64) -> String {
    FieldValue::Number(value).text().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_decimals_with_suffix() {
        assert_eq!(format_number(12.3456, "0.00'%'"), "12.35%");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(format_number(1234567.0, "#,##0"), "1,234,567");
        assert_eq!(format_number(42.0, "#,##0"), "42");
    }

    #[test]
    fn test_optional_fraction_digits() {
        assert_eq!(format_number(1.5, "0.##"), "1.5");
        assert_eq!(format_number(2.0, "0.##"), "2");
        assert_eq!(format_number(2.0, "0.00"), "2.00");
    }

    #[test]
    fn test_min_integer_digits() {
        assert_eq!(format_number(5.0, "00"), "05");
    }

    #[test]
    fn test_negative_value() {
        assert_eq!(format_number(-42.0, "0.00"), "-42.00");
        assert_eq!(format_number(-1234.5, "#,##0.0"), "-1,234.5");
    }

    #[test]
    fn test_invalid_pattern_falls_back() {
        // No digit mask at all: natural text form.
        assert_eq!(format_number(3.25, "'abc'"), "3.25");
        assert_eq!(format_number(3.0, ""), "3");
    }

    #[test]
    fn test_format_cell_non_numeric_keeps_text() {
        let value = Resolved::Literal("north branch".to_string());
        assert_eq!(format_cell(&value, "0.00"), "north branch");
    }

    #[test]
    fn test_format_cell_null_placeholder() {
        assert_eq!(format_cell(&Resolved::Missing, "0.00"), "-");
        assert_eq!(
            format_cell(&Resolved::Value(crate::record::FieldValue::Null), ""),
            "-"
        );
    }

    #[test]
    fn test_format_cell_numeric_text() {
        let value = Resolved::Literal("17.239".to_string());
        assert_eq!(format_cell(&value, "0.0"), "17.2");
    }
}
