pub mod attestation;
pub mod phase0;
pub mod single_attestation;
pub mod versioned_attestation;
