use std::fmt;

use ream_consensus_misc::attestation_data::AttestationData;
use ssz_types::{BitList, typenum::U131072};

use crate::{attestation::Attestation, phase0::attestation::Attestation as Phase0Attestation};

/// Aggregation bits widened to the largest attestation bitlist so that both wire formats can be
/// compared against each other.
pub type AggregationBits = BitList<U131072>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ForkName {
    Phase0,
    Electra,
}

impl ForkName {
    pub fn version_byte(self) -> u8 {
        match self {
            ForkName::Phase0 => 0,
            ForkName::Electra => 1,
        }
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkName::Phase0 => write!(f, "phase0"),
            ForkName::Electra => write!(f, "electra"),
        }
    }
}

/// Either attestation wire format.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum VersionedAttestation {
    Phase0(Phase0Attestation),
    Electra(Attestation),
}

impl VersionedAttestation {
    pub fn fork_name(&self) -> ForkName {
        match self {
            VersionedAttestation::Phase0(_) => ForkName::Phase0,
            VersionedAttestation::Electra(_) => ForkName::Electra,
        }
    }

    pub fn data(&self) -> &AttestationData {
        match self {
            VersionedAttestation::Phase0(attestation) => &attestation.data,
            VersionedAttestation::Electra(attestation) => &attestation.data,
        }
    }

    pub fn slot(&self) -> u64 {
        self.data().slot
    }

    pub fn num_set_aggregation_bits(&self) -> usize {
        match self {
            VersionedAttestation::Phase0(attestation) => {
                attestation.aggregation_bits.num_set_bits()
            }
            VersionedAttestation::Electra(attestation) => {
                attestation.aggregation_bits.num_set_bits()
            }
        }
    }

    pub fn aggregation_bits(&self) -> Result<AggregationBits, ssz::BitfieldError> {
        match self {
            VersionedAttestation::Phase0(attestation) => {
                let mut aggregation_bits =
                    AggregationBits::with_capacity(attestation.aggregation_bits.len())?;
                for (index, bit) in attestation.aggregation_bits.iter().enumerate() {
                    if bit {
                        aggregation_bits.set(index, true)?;
                    }
                }
                Ok(aggregation_bits)
            }
            VersionedAttestation::Electra(attestation) => Ok(attestation.aggregation_bits.clone()),
        }
    }

    /// Whether both attestations carry exactly the same participation pattern. Attestations of
    /// different forks never match.
    pub fn has_same_aggregation_bits(&self, other: &VersionedAttestation) -> bool {
        match (self, other) {
            (VersionedAttestation::Phase0(a), VersionedAttestation::Phase0(b)) => {
                a.aggregation_bits == b.aggregation_bits
            }
            (VersionedAttestation::Electra(a), VersionedAttestation::Electra(b)) => {
                a.aggregation_bits == b.aggregation_bits
            }
            _ => false,
        }
    }

    /// Whether the attestation speaks for `committee_index`. An Electra attestation can match
    /// several committees.
    pub fn matches_committee(&self, committee_index: u64) -> bool {
        match self {
            VersionedAttestation::Phase0(attestation) => attestation.data.index == committee_index,
            VersionedAttestation::Electra(attestation) => attestation
                .committee_bits
                .get(committee_index as usize)
                .unwrap_or(false),
        }
    }
}

impl From<Phase0Attestation> for VersionedAttestation {
    fn from(attestation: Phase0Attestation) -> Self {
        VersionedAttestation::Phase0(attestation)
    }
}

impl From<Attestation> for VersionedAttestation {
    fn from(attestation: Attestation) -> Self {
        VersionedAttestation::Electra(attestation)
    }
}
