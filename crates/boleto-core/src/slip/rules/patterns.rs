//! Common regex patterns for payment-slip extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Amount patterns (Brazilian format: 1.234,56; the reverse 1,234.56 is tolerated)
    pub static ref AMOUNT_LABEL: Regex = Regex::new(
        r"(?i)(?:\(=\)\s*)?VALOR\s+(?:DO\s+)?DOCUMENTO[:\s]*R?\$?\s*((?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]\d{2})\b"
    ).unwrap();

    pub static ref AMOUNT_WITH_CURRENCY: Regex = Regex::new(
        r"(?i)R\$?\s*((?:\d{1,3}(?:[.,]\d{3})+|\d+)[.,]\d{2})\b"
    ).unwrap();

    // Date patterns (DD/MM/YYYY, DD.MM.YY, DD-MM-YYYY, ...)
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{2})([/.\-])(\d{2})([/.\-])(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DUE_DATE_LABEL: Regex = Regex::new(
        r"(?i)VENC(?:IMENTO|TO)?\.?[:\s]*(\d{2}[/.\-]\d{2}[/.\-](?:\d{4}|\d{2}))\b"
    ).unwrap();

    // Payee patterns
    pub static ref PAYEE_LABEL: Regex = Regex::new(
        r"(?i)(?:BENEFICI[AÁ]RIO|CEDENTE)[ \t]*:?[ \t]*(?:\r?\n\s*)?([^\n]{5,100})"
    ).unwrap();

    pub static ref PAYEE_STOP_LINE: Regex = Regex::new(
        r"(?i)RECIBO|PAGADOR|SACADO|DOCUMENTO|LOCAL|VENCIMENTO|AG[EÊ]NCIA|BENEFICI[AÁ]RIO"
    ).unwrap();

    pub static ref LONG_DIGIT_RUN: Regex = Regex::new(r"\d{4,}").unwrap();

    pub static ref UPPERCASE_RUN: Regex = Regex::new(
        r"\b\p{Lu}[\p{Lu} &.\-]{9,79}\b"
    ).unwrap();

    pub static ref ONLY_DIGITS_AND_PUNCTUATION: Regex = Regex::new(r"^[\d\s.,\-]+$").unwrap();

    pub static ref EDGE_PUNCTUATION: Regex = Regex::new(r"^[-\s.]+|[-\s.]+$").unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();

    // Reference code patterns (digitable line: 5.5 5.6 5.6 1 14)
    pub static ref DIGITABLE_LINE_STRICT: Regex = Regex::new(
        r"\b(\d{5}\.\d{5})\s+(\d{5}\.\d{6})\s+(\d{5}\.\d{6})\s+(\d)\s+(\d{14})\b"
    ).unwrap();

    pub static ref DIGITABLE_LINE_FLEXIBLE: Regex = Regex::new(
        r"\b(\d{5})[.\s]?(\d{5})\s*(\d{5})[.\s]?(\d{6})\s*(\d{5})[.\s]?(\d{6})\s*(\d)\s*(\d{14})\b"
    ).unwrap();

    pub static ref RAW_BARCODE: Regex = Regex::new(r"\b\d{44,48}\b").unwrap();

    pub static ref DIGITABLE_LINE_NOISY: Regex = Regex::new(
        r"\b\d{5,6}(?:[.,\s]+\d{5,6}){5}[.,\s]+\d[.,\s]+\d{14}\b"
    ).unwrap();
}
