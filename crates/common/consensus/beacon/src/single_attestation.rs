use anyhow::anyhow;
use ream_bls::BLSSignature;
use ream_consensus_misc::attestation_data::AttestationData;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{BitList, BitVector};
use tree_hash_derive::TreeHash;

use crate::attestation::Attestation;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct SingleAttestation {
    #[serde(with = "serde_utils::quoted_u64")]
    pub committee_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub attester_index: u64,
    pub data: AttestationData,
    pub signature: BLSSignature,
}

impl SingleAttestation {
    /// Expand into the one-bit Electra [Attestation] the pools store. `committee` is the
    /// ordered list of validator indices of the beacon committee `committee_index` at
    /// `data.slot`.
    pub fn to_attestation(&self, committee: &[u64]) -> anyhow::Result<Attestation> {
        let position = committee
            .iter()
            .position(|validator_index| *validator_index == self.attester_index)
            .ok_or_else(|| {
                anyhow!(
                    "Attester {} is not a member of committee {} at slot {}",
                    self.attester_index,
                    self.committee_index,
                    self.data.slot
                )
            })?;

        let mut aggregation_bits = BitList::with_capacity(committee.len())
            .map_err(|err| anyhow!("Committee is too large for aggregation bits: {err:?}"))?;
        aggregation_bits
            .set(position, true)
            .map_err(|err| anyhow!("Failed to set aggregation bit {position}: {err:?}"))?;

        let mut committee_bits = BitVector::new();
        committee_bits
            .set(self.committee_index as usize, true)
            .map_err(|err| {
                anyhow!(
                    "Committee index {} is out of range: {err:?}",
                    self.committee_index
                )
            })?;

        Ok(Attestation {
            aggregation_bits,
            data: self.data.clone(),
            signature: self.signature.clone(),
            committee_bits,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_attestation(committee_index: u64, attester_index: u64) -> SingleAttestation {
        SingleAttestation {
            committee_index,
            attester_index,
            data: AttestationData {
                slot: 5,
                ..Default::default()
            },
            signature: BLSSignature::infinity(),
        }
    }

    #[test]
    fn test_to_attestation_sets_position_and_committee() {
        let committee = [10, 42, 7, 99];
        let attestation = single_attestation(3, 7)
            .to_attestation(&committee)
            .expect("attester is in the committee");

        assert_eq!(attestation.aggregation_bits.len(), committee.len());
        assert_eq!(attestation.aggregation_bits.num_set_bits(), 1);
        assert_eq!(attestation.aggregation_bits.get(2).ok(), Some(true));
        assert_eq!(attestation.committee_bits.num_set_bits(), 1);
        assert_eq!(attestation.committee_bits.get(3).ok(), Some(true));
        assert_eq!(attestation.data.slot, 5);
    }

    #[test]
    fn test_to_attestation_rejects_non_member() {
        assert!(single_attestation(0, 1).to_attestation(&[2, 3, 4]).is_err());
    }

    #[test]
    fn test_to_attestation_rejects_out_of_range_committee() {
        assert!(single_attestation(64, 2).to_attestation(&[2, 3, 4]).is_err());
    }
}
