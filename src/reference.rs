// MNB QR-code guide, 2019-07-12 revision.
pub const STANDARD_VERSION: &str = "001";
pub const CHARSET_ID: &str = "1";
pub const CURRENCY: &str = "HUF";
pub const AMOUNT_DIGITS: usize = 12;
pub const MAX_DESCRIPTION_LENGTH: usize = 70;
pub const MAX_PAYLOAD_LENGTH: usize = 345;
pub const FIELD_COUNT: usize = 17;

pub const HU_IBAN_LENGTH: usize = 28;

pub const HU_BANK_CODES: &[(&str, &str)] = &[
    ("OTPVHUHB", "117"),
    ("GIBAHUHB", "116"),
    ("OKHBHUHB", "104"),
    ("BUDAHUHB", "101"),
    ("CIBHHUHB", "107"),
    ("UBRTHUHB", "109"),
    ("MKKBHUHB", "103"),
    ("HBWEHUHB", "120"),
];
