use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    #[error("Attestation has {set_bits} aggregation bits set, expected exactly one")]
    AlreadyAggregated { set_bits: usize },

    #[error("Attestation data cannot be fingerprinted: {0}")]
    MalformedIdentityInput(String),

    #[error("Seen aggregation bits have length {expected} but the attestation has {actual}")]
    BitLengthMismatch { expected: usize, actual: usize },

    #[error("Invalid aggregation bits: {0}")]
    Bitfield(String),

    #[error("{} attestations failed to save: {}", .0.len(), format_batch_failures(.0))]
    Batch(Vec<(usize, PoolError)>),
}

fn format_batch_failures(failures: &[(usize, PoolError)]) -> String {
    failures
        .iter()
        .map(|(index, err)| format!("[{index}] {err}"))
        .collect::<Vec<_>>()
        .join("; ")
}
