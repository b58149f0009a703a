use std::fmt;

use alloy_primitives::hex;
use ream_consensus_beacon::versioned_attestation::VersionedAttestation;
use sha2::{Digest, Sha256};
use tree_hash::TreeHash;

use crate::errors::PoolError;

pub const ATTESTATION_ID_LENGTH: usize = 33;

/// Fingerprint of the vote an attestation carries: a fork version byte followed by a digest of
/// the attestation data and, after Electra, the committee bits. Aggregation bits and signature
/// never contribute, so every participation pattern of the same vote shares one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttestationId([u8; ATTESTATION_ID_LENGTH]);

impl AttestationId {
    pub fn compute(attestation: &VersionedAttestation) -> Result<Self, PoolError> {
        let data_root = attestation.data().tree_hash_root();

        let mut id = [0u8; ATTESTATION_ID_LENGTH];
        id[0] = attestation.fork_name().version_byte();

        match attestation {
            VersionedAttestation::Phase0(_) => id[1..].copy_from_slice(data_root.as_slice()),
            VersionedAttestation::Electra(attestation) => {
                if attestation.data.index != 0 {
                    return Err(PoolError::MalformedIdentityInput(format!(
                        "electra attestation data has committee index {}, expected 0",
                        attestation.data.index
                    )));
                }
                if attestation.committee_bits.is_zero() {
                    return Err(PoolError::MalformedIdentityInput(
                        "electra attestation has no committee bits set".to_string(),
                    ));
                }

                let mut hasher = Sha256::new();
                hasher.update(data_root.as_slice());
                hasher.update(attestation.committee_bits.as_slice());
                id[1..].copy_from_slice(&hasher.finalize());
            }
        }

        Ok(Self(id))
    }

    pub fn as_bytes(&self) -> &[u8; ATTESTATION_ID_LENGTH] {
        &self.0
    }
}

impl fmt::Display for AttestationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
