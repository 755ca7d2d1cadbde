pub mod error;
pub mod generator;
pub mod models;
pub mod payload;
pub mod preflight;
pub mod reference;
pub mod render;
pub mod util;

pub use error::QrError;
pub use models::{QrCodeDetails, QrKind};
pub use payload::{Field, InstantTransferQr, FIELD_ORDER};
