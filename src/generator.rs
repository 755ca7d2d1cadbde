use crate::models::{QrCodeDetails, QrKind, RequestRow};
use crate::reference::{HU_BANK_CODES, HU_IBAN_LENGTH, MAX_DESCRIPTION_LENGTH};
use crate::util::{iban_check_digits, random_alphanum_upper, random_digits};

use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct GeneratorConfig {
    pub requests: usize,
    pub rtp_ratio: f64,
    pub amount_ratio: f64,
    pub expiry_ratio: f64,
    pub issued_at: DateTime<FixedOffset>,
}

const NAME_PREFIX: &[&str] = &[
    "Duna", "Tisza", "Balaton", "Mecsek", "Matra", "Bakony", "Alfold", "Zemplen", "Hortobagy",
    "Buda", "Pest", "Szeged", "Gyor", "Eger", "Pecs",
];

const NAME_NOUN: &[&str] = &[
    "Kereskedelmi", "Szerviz", "Pekseg", "Kavezo", "Konyvesbolt", "Virag", "Epito", "Logisztika",
    "Szoftver", "Nyomda",
];

const LEGAL_SUFFIXES: &[&str] = &["Kft", "Bt", "Zrt", "Kkt", "Ev"];

const PURPOSE_CODES: &[&str] = &["ACCT", "GDDS", "SCVE", "SUPP", "OTHR"];

const DESCRIPTIONS: &[&str] = &[
    "Szamla kiegyenlitese",
    "Rendeles",
    "Elofizetes",
    "Szolgaltatasi dij",
    "Eloleg",
];

// Expiries are spread over the week after issue.
const MAX_EXPIRY_SECS: i64 = 7 * 24 * 3600;

pub fn generate_requests(config: &GeneratorConfig, seed: u64) -> Result<Vec<RequestRow>, String> {
    validate_config(config)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut rows = Vec::with_capacity(config.requests);
    for idx in 0..config.requests {
        let kind = if rng.gen_bool(config.rtp_ratio) {
            QrKind::PaymentRequest
        } else {
            QrKind::TransferInitiation
        };
        let (bic, bank_code) = HU_BANK_CODES
            .choose(&mut rng)
            .copied()
            .unwrap_or(("OTPVHUHB", "117"));

        let name = build_name(&mut rng);
        let iban = generate_iban(&mut rng, bank_code);
        let mut details = QrCodeDetails::new(bic, name, iban);
        if rng.gen_bool(config.amount_ratio) {
            details.amount = Some(rng.gen_range(100..2_000_000));
        }
        if rng.gen_bool(config.expiry_ratio) {
            let secs = rng.gen_range(3600..MAX_EXPIRY_SECS);
            details.valid_until = Some(config.issued_at + Duration::seconds(secs));
        }
        if kind == QrKind::PaymentRequest {
            details.description = Some(build_description(&mut rng, idx));
            details.invoice_id = Some(format!("INV-{}", random_digits(&mut rng, 8)));
            let tran_id = uuid::Builder::from_random_bytes(rng.gen()).into_uuid();
            details.cred_tran_id = Some(tran_id.simple().to_string());
        } else if rng.gen_bool(0.5) {
            details.purpose = PURPOSE_CODES.choose(&mut rng).map(|code| code.to_string());
        }
        if rng.gen_bool(0.2) {
            details.shop_id = Some(random_alphanum_upper(&mut rng, 6));
            details.merch_dev_id = Some(random_alphanum_upper(&mut rng, 8));
        }

        rows.push(RequestRow::from_parts(kind, details));
    }

    log::debug!("generated {} requests with seed {}", rows.len(), seed);
    Ok(rows)
}

/// Midnight in Budapest winter time, the default issue time for generated
/// requests.
pub fn default_issued_at(year: i32, month: u32, day: u32) -> Result<DateTime<FixedOffset>, String> {
    FixedOffset::east_opt(3600)
        .ok_or_else(|| "invalid offset".to_string())?
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| format!("invalid issue date {}-{}-{}", year, month, day))
}

fn validate_config(config: &GeneratorConfig) -> Result<(), String> {
    if config.requests == 0 {
        return Err("requests must be greater than 0".to_string());
    }
    if !(0.0..=1.0).contains(&config.rtp_ratio) {
        return Err("rtp_ratio must be 0..1".to_string());
    }
    if !(0.0..=1.0).contains(&config.amount_ratio) {
        return Err("amount_ratio must be 0..1".to_string());
    }
    if !(0.0..=1.0).contains(&config.expiry_ratio) {
        return Err("expiry_ratio must be 0..1".to_string());
    }
    Ok(())
}

fn build_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let prefix = NAME_PREFIX.choose(rng).unwrap_or(&"Duna");
    let noun = NAME_NOUN.choose(rng).unwrap_or(&"Kereskedelmi");
    let legal = LEGAL_SUFFIXES.choose(rng).unwrap_or(&"Kft");
    format!("{} {} {}", prefix, noun, legal)
}

fn build_description<R: Rng + ?Sized>(rng: &mut R, idx: usize) -> String {
    let text = DESCRIPTIONS.choose(rng).unwrap_or(&"Rendeles");
    let mut description = format!("{} #{}", text, idx + 1);
    description.truncate(MAX_DESCRIPTION_LENGTH);
    description
}

// Hungarian BBAN: 3-digit bank code, 4-digit branch, check digit, 16-digit account.
fn generate_iban<R: Rng + ?Sized>(rng: &mut R, bank_code: &str) -> String {
    let bban_len = HU_IBAN_LENGTH.saturating_sub(4);
    let bban = format!(
        "{}{}",
        bank_code,
        random_digits(rng, bban_len.saturating_sub(bank_code.len()))
    );
    let check = iban_check_digits("HU", &bban).unwrap_or_else(|_| "00".to_string());
    format!("HU{}{}", check, bban)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::InstantTransferQr;
    use crate::reference::FIELD_COUNT;

    fn config(requests: usize) -> GeneratorConfig {
        GeneratorConfig {
            requests,
            rtp_ratio: 0.5,
            amount_ratio: 0.7,
            expiry_ratio: 0.5,
            issued_at: default_issued_at(2024, 3, 1).unwrap(),
        }
    }

    #[test]
    fn same_seed_same_requests() {
        let a = generate_requests(&config(25), 7).unwrap();
        let b = generate_requests(&config(25), 7).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, generate_requests(&config(25), 8).unwrap());
    }

    #[test]
    fn generated_requests_build_valid_payloads() {
        for row in generate_requests(&config(200), 42).unwrap() {
            let (kind, details) = row.into_parts();
            let qr = InstantTransferQr::new(kind, details).unwrap();
            let payload = qr.payload().unwrap();
            assert_eq!(payload.matches('\n').count(), FIELD_COUNT);
            assert!(payload.starts_with(kind.code()));
        }
    }

    #[test]
    fn generated_ibans_have_valid_check_digits() {
        for row in generate_requests(&config(50), 3).unwrap() {
            assert_eq!(row.iban.len(), HU_IBAN_LENGTH);
            let expected = iban_check_digits("HU", &row.iban[4..]).unwrap();
            assert_eq!(&row.iban[2..4], expected);
        }
    }

    #[test]
    fn rejects_bad_ratios() {
        let mut bad = config(1);
        bad.rtp_ratio = 1.5;
        assert!(generate_requests(&bad, 1).is_err());
        assert!(generate_requests(&config(0), 1).is_err());
    }
}
