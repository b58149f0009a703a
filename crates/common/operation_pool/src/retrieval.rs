use ream_consensus_beacon::versioned_attestation::VersionedAttestation;

use crate::unaggregated_store::UnaggregatedStore;

/// Slot and committee views used by block packing.
impl UnaggregatedStore {
    /// Phase0 attestations for `committee_index` at `slot`.
    pub fn by_slot_and_committee(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> Vec<VersionedAttestation> {
        self.attestations_at_slot(slot)
            .filter(|attestation| {
                matches!(attestation, VersionedAttestation::Phase0(_))
                    && attestation.matches_committee(committee_index)
            })
            .cloned()
            .collect()
    }

    /// Electra attestations at `slot` whose committee bits include `committee_index`.
    pub fn by_slot_and_committee_multi_committee(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> Vec<VersionedAttestation> {
        self.attestations_at_slot(slot)
            .filter(|attestation| {
                matches!(attestation, VersionedAttestation::Electra(_))
                    && attestation.matches_committee(committee_index)
            })
            .cloned()
            .collect()
    }

    fn attestations_at_slot(&self, slot: u64) -> impl Iterator<Item = &VersionedAttestation> {
        self.slot_index
            .get(&slot)
            .into_iter()
            .flatten()
            .filter_map(|id| self.get(id))
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use ream_bls::BLSSignature;
    use ream_consensus_beacon::{
        attestation::Attestation, phase0::attestation::Attestation as Phase0Attestation,
    };
    use ream_consensus_misc::attestation_data::AttestationData;
    use ssz_types::{BitList, BitVector};

    use super::*;
    use crate::attestation_id::AttestationId;

    fn phase0(slot: u64, index: u64, position: usize) -> VersionedAttestation {
        let mut aggregation_bits = BitList::with_capacity(8).expect("valid bitlist length");
        aggregation_bits.set(position, true).expect("position within bitlist");

        Phase0Attestation {
            aggregation_bits,
            data: AttestationData {
                slot,
                index,
                ..Default::default()
            },
            signature: BLSSignature::default(),
        }
        .into()
    }

    fn electra(slot: u64, committees: &[usize], position: usize) -> VersionedAttestation {
        let mut committee_bits = BitVector::new();
        for committee in committees {
            committee_bits.set(*committee, true).expect("committee within bitvector");
        }
        let mut aggregation_bits = BitList::with_capacity(8).expect("valid bitlist length");
        aggregation_bits.set(position, true).expect("position within bitlist");

        Attestation {
            aggregation_bits,
            data: AttestationData {
                slot,
                ..Default::default()
            },
            signature: BLSSignature::default(),
            committee_bits,
        }
        .into()
    }

    fn store_of(attestations: &[VersionedAttestation]) -> UnaggregatedStore {
        let mut store = UnaggregatedStore::default();
        for attestation in attestations {
            let id = AttestationId::compute(attestation).expect("well formed attestation");
            store
                .insert(id, attestation.clone())
                .expect("unaggregated attestation");
        }
        store
    }

    #[test]
    fn test_by_slot_and_committee_is_exact() {
        let store = store_of(&[
            phase0(1, 1, 0),
            phase0(1, 1, 4),
            phase0(1, 2, 0),
            phase0(2, 1, 0),
            electra(1, &[1], 0),
        ]);

        let found = store.by_slot_and_committee(1, 1);
        assert_eq!(found, vec![phase0(1, 1, 0), phase0(1, 1, 4)]);
        assert_eq!(store.by_slot_and_committee(1, 2), vec![phase0(1, 2, 0)]);
        assert!(store.by_slot_and_committee(3, 1).is_empty());
    }

    #[test]
    fn test_multi_committee_matches_any_set_committee_bit() {
        let spanning = electra(4, &[0, 3], 2);
        let store = store_of(&[spanning.clone(), electra(4, &[1], 2), phase0(4, 3, 0)]);

        assert_eq!(store.by_slot_and_committee_multi_committee(4, 0), vec![spanning.clone()]);
        assert_eq!(store.by_slot_and_committee_multi_committee(4, 3), vec![spanning]);
        assert_eq!(store.by_slot_and_committee_multi_committee(4, 1).len(), 1);
        assert!(store.by_slot_and_committee_multi_committee(4, 2).is_empty());
        assert!(store.by_slot_and_committee_multi_committee(5, 0).is_empty());
    }

    #[test]
    fn test_results_do_not_alias_the_store() {
        let mut store = store_of(&[phase0(1, 1, 0)]);
        let mut found = store.by_slot_and_committee(1, 1);
        found.clear();

        let attestation = phase0(1, 1, 0);
        let id = AttestationId::compute(&attestation).expect("phase0 id");
        assert_eq!(store.by_slot_and_committee(1, 1).len(), 1);
        assert!(store.remove(&id, &attestation));
        assert!(store.by_slot_and_committee(1, 1).is_empty());
    }
}
