//! Instant transfer QR content as defined by the MNB QR-code guide.
//!
//! A record is built once through [`InstantTransferQr::transfer_initiation`]
//! or [`InstantTransferQr::payment_request`], validated there, and can then be
//! serialized any number of times with [`InstantTransferQr::payload`].

use crate::error::QrError;
use crate::models::{QrCodeDetails, QrKind};
use crate::reference::{
    CHARSET_ID, FIELD_COUNT, MAX_DESCRIPTION_LENGTH, MAX_PAYLOAD_LENGTH, STANDARD_VERSION,
};
use crate::util::{format_amount, format_valid_until};
use chrono::{DateTime, FixedOffset};
use std::borrow::Cow;
use std::fmt;

/// Positional fields of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Kind,
    Version,
    Charset,
    Bic,
    Name,
    Iban,
    Amount,
    ValidUntil,
    Purpose,
    Description,
    ShopId,
    MerchDevId,
    InvoiceId,
    CustomerId,
    CredTranId,
    LoyaltyId,
    NavCheckId,
}

/// Line order of the payload.
pub const FIELD_ORDER: [Field; FIELD_COUNT] = [
    Field::Kind,
    Field::Version,
    Field::Charset,
    Field::Bic,
    Field::Name,
    Field::Iban,
    Field::Amount,
    Field::ValidUntil,
    Field::Purpose,
    Field::Description,
    Field::ShopId,
    Field::MerchDevId,
    Field::InvoiceId,
    Field::CustomerId,
    Field::CredTranId,
    Field::LoyaltyId,
    Field::NavCheckId,
];

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Kind => "kind",
            Field::Version => "version",
            Field::Charset => "charset",
            Field::Bic => "bic",
            Field::Name => "name",
            Field::Iban => "iban",
            Field::Amount => "amount",
            Field::ValidUntil => "valid_until",
            Field::Purpose => "purpose",
            Field::Description => "description",
            Field::ShopId => "shop_id",
            Field::MerchDevId => "merch_dev_id",
            Field::InvoiceId => "invoice_id",
            Field::CustomerId => "customer_id",
            Field::CredTranId => "cred_tran_id",
            Field::LoyaltyId => "loyalty_id",
            Field::NavCheckId => "nav_check_id",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstantTransferQr {
    kind: QrKind,
    details: QrCodeDetails,
}

impl InstantTransferQr {
    /// QR code the payer scans to initiate a transfer (`HCT`).
    pub fn transfer_initiation(details: QrCodeDetails) -> Result<Self, QrError> {
        Self::new(QrKind::TransferInitiation, details)
    }

    /// QR code the beneficiary presents as a payment request (`RTP`).
    pub fn payment_request(details: QrCodeDetails) -> Result<Self, QrError> {
        Self::new(QrKind::PaymentRequest, details)
    }

    pub fn new(kind: QrKind, details: QrCodeDetails) -> Result<Self, QrError> {
        if let Some(amount) = details.amount {
            if amount <= 0 {
                return Err(QrError::InvalidAmount(amount));
            }
        }
        if let Some(description) = details.description.as_deref() {
            let len = description.chars().count();
            if len > MAX_DESCRIPTION_LENGTH {
                return Err(QrError::DescriptionTooLong(len));
            }
        }
        log::debug!("built {} QR-code for IBAN {}", kind, details.iban);
        Ok(Self { kind, details })
    }

    pub fn kind(&self) -> QrKind {
        self.kind
    }

    pub fn version(&self) -> &'static str {
        STANDARD_VERSION
    }

    pub fn charset(&self) -> &'static str {
        CHARSET_ID
    }

    pub fn bic(&self) -> &str {
        &self.details.bic
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn iban(&self) -> &str {
        &self.details.iban
    }

    pub fn amount(&self) -> Option<i64> {
        self.details.amount
    }

    pub fn valid_until(&self) -> Option<&DateTime<FixedOffset>> {
        self.details.valid_until.as_ref()
    }

    pub fn details(&self) -> &QrCodeDetails {
        &self.details
    }

    pub fn render_field(&self, field: Field) -> Cow<'_, str> {
        let d = &self.details;
        match field {
            Field::Kind => Cow::Borrowed(self.kind.code()),
            Field::Version => Cow::Borrowed(STANDARD_VERSION),
            Field::Charset => Cow::Borrowed(CHARSET_ID),
            Field::Bic => Cow::Borrowed(&d.bic),
            Field::Name => Cow::Borrowed(&d.name),
            Field::Iban => Cow::Borrowed(&d.iban),
            Field::Amount => d
                .amount
                .map_or(Cow::Borrowed(""), |amount| Cow::Owned(format_amount(amount))),
            Field::ValidUntil => d
                .valid_until
                .as_ref()
                .map_or(Cow::Borrowed(""), |ts| Cow::Owned(format_valid_until(ts))),
            Field::Purpose => optional(&d.purpose),
            Field::Description => optional(&d.description),
            Field::ShopId => optional(&d.shop_id),
            Field::MerchDevId => optional(&d.merch_dev_id),
            Field::InvoiceId => optional(&d.invoice_id),
            Field::CustomerId => optional(&d.customer_id),
            Field::CredTranId => optional(&d.cred_tran_id),
            Field::LoyaltyId => optional(&d.loyalty_id),
            Field::NavCheckId => optional(&d.nav_check_id),
        }
    }

    /// Rendered values in payload order.
    pub fn fields(&self) -> Vec<(Field, Cow<'_, str>)> {
        FIELD_ORDER
            .iter()
            .map(|field| (*field, self.render_field(*field)))
            .collect()
    }

    /// Text to hand to a QR encoder: one line per field, each terminated by
    /// `\n`, empty lines for absent fields.
    pub fn payload(&self) -> Result<String, QrError> {
        let mut out = String::with_capacity(MAX_PAYLOAD_LENGTH);
        for field in FIELD_ORDER {
            out.push_str(&self.render_field(field));
            out.push('\n');
        }

        let len = out.chars().count();
        if len > MAX_PAYLOAD_LENGTH {
            return Err(QrError::PayloadTooLong(len));
        }
        Ok(out)
    }
}

impl fmt::Display for InstantTransferQr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} QR-code (BIC: {}, IBAN: {}, Name: {})",
            self.kind, self.details.bic, self.details.iban, self.details.name
        )
    }
}

fn optional(value: &Option<String>) -> Cow<'_, str> {
    Cow::Borrowed(value.as_deref().unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BIC: &str = "OTPVHUHB";
    const IBAN: &str = "HU42117730161111101800000000";

    fn details() -> QrCodeDetails {
        QrCodeDetails::new(BIC, "Kovacs Kft", IBAN)
    }

    fn lines(payload: &str) -> Vec<&str> {
        payload.split_terminator('\n').collect()
    }

    #[test]
    fn minimal_transfer_initiation_payload() {
        let qr = InstantTransferQr::transfer_initiation(details()).unwrap();
        let payload = qr.payload().unwrap();

        assert_eq!(
            payload,
            format!("HCT\n001\n1\n{BIC}\nKovacs Kft\n{IBAN}\n\n\n\n\n\n\n\n\n\n\n\n")
        );
        assert_eq!(payload.matches('\n').count(), FIELD_COUNT);
    }

    #[test]
    fn payment_request_starts_with_rtp() {
        let qr = InstantTransferQr::payment_request(details()).unwrap();
        let payload = qr.payload().unwrap();
        assert!(payload.starts_with("RTP\n001\n1\n"));
        assert_eq!(qr.kind(), QrKind::PaymentRequest);
    }

    #[test]
    fn full_payload_keeps_field_order() {
        let valid_until = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2023, 1, 5, 8, 3, 7)
            .unwrap();
        let qr = InstantTransferQr::payment_request(QrCodeDetails {
            amount: Some(1500),
            valid_until: Some(valid_until),
            purpose: Some("ACCT".to_string()),
            description: Some("Invoice 42".to_string()),
            shop_id: Some("SHOP1".to_string()),
            merch_dev_id: Some("DEV1".to_string()),
            invoice_id: Some("INV42".to_string()),
            customer_id: Some("CUST7".to_string()),
            cred_tran_id: Some("TRX9".to_string()),
            loyalty_id: Some("LOY3".to_string()),
            nav_check_id: Some("NAV5".to_string()),
            ..details()
        })
        .unwrap();

        let payload = qr.payload().unwrap();
        assert_eq!(
            lines(&payload),
            vec![
                "RTP",
                "001",
                "1",
                BIC,
                "Kovacs Kft",
                IBAN,
                "HUF000000001500",
                "20230105080307+1",
                "ACCT",
                "Invoice 42",
                "SHOP1",
                "DEV1",
                "INV42",
                "CUST7",
                "TRX9",
                "LOY3",
                "NAV5",
            ]
        );
        assert!(payload.ends_with("NAV5\n"));
    }

    #[test]
    fn absent_amount_and_expiry_leave_empty_lines() {
        let qr = InstantTransferQr::transfer_initiation(QrCodeDetails {
            purpose: Some("ACCT".to_string()),
            ..details()
        })
        .unwrap();
        let payload = qr.payload().unwrap();
        assert!(payload.contains(&format!("{IBAN}\n\n\nACCT\n")));
        assert_eq!(lines(&payload)[8], "ACCT");
    }

    #[test]
    fn payload_is_repeatable() {
        let qr = InstantTransferQr::transfer_initiation(QrCodeDetails {
            amount: Some(990),
            ..details()
        })
        .unwrap();
        assert_eq!(qr.payload().unwrap(), qr.payload().unwrap());
    }

    #[test]
    fn rejects_non_positive_amounts() {
        for amount in [0, -1, -1500, i64::MIN] {
            let result = InstantTransferQr::transfer_initiation(QrCodeDetails {
                amount: Some(amount),
                ..details()
            });
            assert_eq!(result, Err(QrError::InvalidAmount(amount)));
        }
        assert!(InstantTransferQr::transfer_initiation(QrCodeDetails {
            amount: Some(1),
            ..details()
        })
        .is_ok());
    }

    #[test]
    fn description_limit_is_seventy_characters() {
        let ok = InstantTransferQr::payment_request(QrCodeDetails {
            description: Some("d".repeat(70)),
            ..details()
        });
        assert!(ok.is_ok());

        let too_long = InstantTransferQr::payment_request(QrCodeDetails {
            description: Some("d".repeat(71)),
            ..details()
        });
        assert_eq!(too_long, Err(QrError::DescriptionTooLong(71)));
    }

    #[test]
    fn description_limit_counts_characters_not_bytes() {
        let qr = InstantTransferQr::payment_request(QrCodeDetails {
            description: Some("á".repeat(70)),
            ..details()
        });
        assert!(qr.is_ok());
    }

    #[test]
    fn payload_limit_is_inclusive() {
        // Kind, version and charset plus 17 line feeds take 24 characters.
        let at_limit = InstantTransferQr::transfer_initiation(QrCodeDetails::new(
            "",
            "n".repeat(321),
            "",
        ))
        .unwrap();
        assert_eq!(at_limit.payload().unwrap().chars().count(), 345);

        let over = InstantTransferQr::transfer_initiation(QrCodeDetails::new(
            "",
            "n".repeat(322),
            "",
        ))
        .unwrap();
        assert_eq!(over.payload(), Err(QrError::PayloadTooLong(346)));
    }

    #[test]
    fn empty_identifiers_are_accepted() {
        let qr = InstantTransferQr::transfer_initiation(QrCodeDetails::default()).unwrap();
        assert_eq!(qr.payload().unwrap(), "HCT\n001\n1\n\n\n\n\n\n\n\n\n\n\n\n\n\n\n");
    }

    #[test]
    fn fields_follow_payload_order() {
        let qr = InstantTransferQr::transfer_initiation(details()).unwrap();
        let fields = qr.fields();
        assert_eq!(fields.len(), FIELD_COUNT);
        assert_eq!(fields[0], (Field::Kind, Cow::Borrowed("HCT")));
        assert_eq!(fields[5].0, Field::Iban);
        assert_eq!(fields[16].0, Field::NavCheckId);
    }

    #[test]
    fn display_summarises_identifiers() {
        let qr = InstantTransferQr::payment_request(details()).unwrap();
        assert_eq!(
            qr.to_string(),
            format!("RTP QR-code (BIC: {BIC}, IBAN: {IBAN}, Name: Kovacs Kft)")
        );
    }
}
