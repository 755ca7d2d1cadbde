use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Payload type written on the first line of the QR content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrKind {
    /// Scanning initiates a transfer to the beneficiary.
    #[serde(rename = "HCT")]
    TransferInitiation,
    /// The beneficiary requests a payment from the scanner.
    #[serde(rename = "RTP")]
    PaymentRequest,
}

impl QrKind {
    pub fn code(self) -> &'static str {
        match self {
            QrKind::TransferInitiation => "HCT",
            QrKind::PaymentRequest => "RTP",
        }
    }
}

impl fmt::Display for QrKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for QrKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "HCT" => Ok(QrKind::TransferInitiation),
            "RTP" => Ok(QrKind::PaymentRequest),
            other => Err(format!("unknown QR kind '{}' (expected HCT or RTP)", other)),
        }
    }
}

/// Caller-supplied fields of a QR code, everything except the kind and the
/// fixed protocol markers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QrCodeDetails {
    pub bic: String,
    pub name: String,
    pub iban: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub valid_until: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default)]
    pub merch_dev_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub cred_tran_id: Option<String>,
    #[serde(default)]
    pub loyalty_id: Option<String>,
    #[serde(default)]
    pub nav_check_id: Option<String>,
}

impl QrCodeDetails {
    pub fn new(bic: impl Into<String>, name: impl Into<String>, iban: impl Into<String>) -> Self {
        Self {
            bic: bic.into(),
            name: name.into(),
            iban: iban.into(),
            ..Self::default()
        }
    }
}

/// One row of a request CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRow {
    pub kind: QrKind,
    pub bic: String,
    pub name: String,
    pub iban: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub valid_until: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub purpose: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default)]
    pub merch_dev_id: Option<String>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub cred_tran_id: Option<String>,
    #[serde(default)]
    pub loyalty_id: Option<String>,
    #[serde(default)]
    pub nav_check_id: Option<String>,
}

impl RequestRow {
    pub fn from_parts(kind: QrKind, details: QrCodeDetails) -> Self {
        Self {
            kind,
            bic: details.bic,
            name: details.name,
            iban: details.iban,
            amount: details.amount,
            valid_until: details.valid_until,
            purpose: details.purpose,
            description: details.description,
            shop_id: details.shop_id,
            merch_dev_id: details.merch_dev_id,
            invoice_id: details.invoice_id,
            customer_id: details.customer_id,
            cred_tran_id: details.cred_tran_id,
            loyalty_id: details.loyalty_id,
            nav_check_id: details.nav_check_id,
        }
    }

    pub fn into_parts(self) -> (QrKind, QrCodeDetails) {
        let details = QrCodeDetails {
            bic: self.bic,
            name: self.name,
            iban: self.iban,
            amount: self.amount,
            valid_until: self.valid_until,
            purpose: self.purpose,
            description: self.description,
            shop_id: self.shop_id,
            merch_dev_id: self.merch_dev_id,
            invoice_id: self.invoice_id,
            customer_id: self.customer_id,
            cred_tran_id: self.cred_tran_id,
            loyalty_id: self.loyalty_id,
            nav_check_id: self.nav_check_id,
        };
        (self.kind, details)
    }
}
