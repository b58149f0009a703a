use thiserror::Error;

#[derive(Error, PartialEq, Debug)]
pub enum BLSError {
    #[error("Invalid hex string")]
    InvalidHexString,
    #[error("Invalid byte length")]
    InvalidByteLength,
}
