//! Normalization and validation helpers shared by the field extractors.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{DATE_DMY, EDGE_PUNCTUATION, ONLY_DIGITS_AND_PUNCTUATION, WHITESPACE_RUN};

/// Labels that are never a payee name on their own.
const PAYEE_STOP_WORDS: &[&str] = &[
    "AUTENTICAÇÃO",
    "AUTENTICACAO",
    "AUTENTICAÇÃO MECÂNICA",
    "AUTENTICACAO MECANICA",
    "RECIBO DO SACADO",
    "RECIBO DO PAGADOR",
    "BENEFICIÁRIO",
    "BENEFICIARIO",
    "PAGADOR",
    "SACADO",
    "ENDEREÇO",
    "ENDERECO",
    "LOCAL DE PAGAMENTO",
    "VENCIMENTO",
    "AGÊNCIA",
    "AGENCIA",
    "CÓDIGO",
    "CODIGO",
    "NÚMERO",
    "NUMERO",
    "DOCUMENTO",
    "DATA",
    "VALOR",
];

/// Minimum length of an accepted payee name, in characters.
pub const MIN_PAYEE_LEN: usize = 5;

/// Parse a slip-formatted amount (e.g., "1.234,56", "1234,56" or "1,234.56").
///
/// The separator before the last two digits is the decimal separator; any
/// other `.`/`,` is a thousands separator.
pub fn parse_brl_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let normalized = match cleaned.rfind([',', '.']) {
        Some(pos) => {
            let (integer_part, decimal_part) = cleaned.split_at(pos);
            let integer_part: String = integer_part.chars().filter(char::is_ascii_digit).collect();
            format!("{}.{}", integer_part, &decimal_part[1..])
        }
        None => cleaned,
    };

    Decimal::from_str(&normalized).ok()
}

/// Format amount in Brazilian style (1.234,56).
pub fn format_brl_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs());
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    // Add thousand separators
    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}{},{}", sign, formatted, decimal_part)
}

/// Expand a two-digit year: below 50 is 20xx, otherwise 19xx.
pub fn expand_year(year: i32) -> i32 {
    if year < 100 {
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

/// Parse a `DD?MM?YY(YY)` date where both separators are the same character.
pub fn parse_slip_date(s: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY.captures(s.trim())?;
    if caps[2] != caps[4] {
        return None;
    }

    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[3].parse().ok()?;
    let year: i32 = caps[5].parse().ok()?;

    NaiveDate::from_ymd_opt(expand_year(year), month, day)
}

/// Collapse whitespace runs into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RUN.replace_all(s.trim(), " ").into_owned()
}

/// Normalize a payee candidate: collapse whitespace, strip edge dots and hyphens.
pub fn clean_payee(s: &str) -> String {
    let collapsed = collapse_whitespace(s);
    EDGE_PUNCTUATION.replace_all(&collapsed, "").into_owned()
}

/// Check whether a cleaned payee candidate is acceptable.
pub fn is_valid_payee(s: &str) -> bool {
    if s.chars().count() < MIN_PAYEE_LEN {
        return false;
    }

    if ONLY_DIGITS_AND_PUNCTUATION.is_match(s) {
        return false;
    }

    let upper = s.to_uppercase();
    !PAYEE_STOP_WORDS.iter().any(|w| upper == *w)
}

/// Keep only ASCII digits.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_brl_amount() {
        assert_eq!(parse_brl_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_brl_amount("1234,56"), Some(dec("1234.56")));
        assert_eq!(parse_brl_amount("1,234.56"), Some(dec("1234.56")));
        assert_eq!(parse_brl_amount("12.345.678,90"), Some(dec("12345678.90")));
        assert_eq!(parse_brl_amount("123,45"), Some(dec("123.45")));
        assert_eq!(parse_brl_amount(""), None);
    }

    #[test]
    fn test_format_brl_amount() {
        assert_eq!(format_brl_amount(dec("1234.56")), "1.234,56");
        assert_eq!(format_brl_amount(dec("12345678.9")), "12.345.678,90");
        assert_eq!(format_brl_amount(dec("5")), "5,00");
        assert_eq!(format_brl_amount(dec("-100.10")), "-100,10");
    }

    #[test]
    fn test_expand_year() {
        assert_eq!(expand_year(26), 2026);
        assert_eq!(expand_year(49), 2049);
        assert_eq!(expand_year(50), 1950);
        assert_eq!(expand_year(2026), 2026);
    }

    #[test]
    fn test_parse_slip_date() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 5);
        assert_eq!(parse_slip_date("05/03/2026"), expected);
        assert_eq!(parse_slip_date("05.03.2026"), expected);
        assert_eq!(parse_slip_date("05-03-26"), expected);
        assert_eq!(parse_slip_date("05/03-2026"), None);
        assert_eq!(parse_slip_date("31/02/2026"), None);
    }

    #[test]
    fn test_clean_payee() {
        assert_eq!(clean_payee("  - ACME   LTDA. "), "ACME LTDA");
        assert_eq!(clean_payee("ACME\tCOMERCIO\nLTDA"), "ACME COMERCIO LTDA");
    }

    #[test]
    fn test_is_valid_payee() {
        assert!(is_valid_payee("ACME LTDA"));
        assert!(!is_valid_payee("ACME"));
        assert!(!is_valid_payee("123.456.789-00"));
        assert!(!is_valid_payee("Vencimento"));
        assert!(!is_valid_payee("local de pagamento"));
        assert!(!is_valid_payee("Beneficiário"));
    }

    #[test]
    fn test_digits_only() {
        assert_eq!(digits_only("23790.12345 6"), "23790123456");
    }
}
