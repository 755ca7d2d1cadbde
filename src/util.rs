use crate::reference::{AMOUNT_DIGITS, CURRENCY};
use chrono::{DateTime, FixedOffset};
use rand::Rng;

pub fn random_digits<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let digit = rng.gen_range(0..10);
        out.push(char::from(b'0' + digit as u8));
    }
    out
}

pub fn random_alphanum_upper<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut out = String::with_capacity(len);
    for _ in 0..len {
        let idx = rng.gen_range(0..CHARSET.len());
        out.push(char::from(CHARSET[idx]));
    }
    out
}

/// `HUF` followed by the amount zero-padded to 12 digits. Wider amounts are
/// written in full.
pub fn format_amount(amount: i64) -> String {
    format!("{}{:0width$}", CURRENCY, amount, width = AMOUNT_DIGITS)
}

/// Local wall-clock time as `YYYYMMDDhhmmss` followed by the signed offset in
/// whole hours (`+0`, `+1`, `-5`). Minutes of the offset are dropped.
pub fn format_valid_until(ts: &DateTime<FixedOffset>) -> String {
    format!(
        "{}{:+}",
        ts.format("%Y%m%d%H%M%S"),
        offset_hours(ts.offset())
    )
}

pub fn offset_hours(offset: &FixedOffset) -> i32 {
    offset.local_minus_utc() / 3600
}

pub fn has_partial_hour_offset(offset: &FixedOffset) -> bool {
    offset.local_minus_utc() % 3600 != 0
}

pub fn is_valid_bic(bic: &str) -> bool {
    let bic = bic.trim();
    if !(bic.len() == 8 || bic.len() == 11) {
        return false;
    }
    if !bic.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return false;
    }
    let country = &bic[4..6];
    country.chars().all(|ch| ch.is_ascii_alphabetic())
}

pub fn iban_check_digits(country: &str, bban: &str) -> Result<String, String> {
    if country.len() != 2 {
        return Err("IBAN country code must be 2 letters".to_string());
    }
    let mut remainder: u32 = 0;
    let combined = format!("{}{}00", bban, country);
    for ch in combined.chars() {
        let chunk = if ch.is_ascii_digit() {
            ch.to_string()
        } else if ch.is_ascii_alphabetic() {
            let val = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 10;
            val.to_string()
        } else {
            return Err("IBAN contains invalid character".to_string());
        };
        for digit in chunk.chars() {
            let d = digit.to_digit(10).ok_or_else(|| "invalid digit".to_string())?;
            remainder = (remainder * 10 + d) % 97;
        }
    }

    let check = 98 - remainder;
    Ok(format!("{:02}", check))
}
