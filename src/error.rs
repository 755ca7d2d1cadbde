use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QrError {
    #[error("amount has to be greater than 0 (got {0})")]
    InvalidAmount(i64),
    #[error("description cannot be longer than 70 characters (got {0})")]
    DescriptionTooLong(usize),
    #[error("maximum length of 345 characters reached (got {0}), reduce the content of the fields")]
    PayloadTooLong(usize),
}
