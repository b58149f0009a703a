use std::collections::{BTreeMap, HashMap, HashSet};

use ream_consensus_beacon::versioned_attestation::VersionedAttestation;

use crate::{attestation_id::AttestationId, errors::PoolError};

/// Single-validator attestations awaiting aggregation, grouped by identity. Each group keeps
/// insertion order and holds at most one attestation per aggregation bit pattern. Not
/// synchronised: the pool wraps it in a lock.
#[derive(Debug, Default)]
pub struct UnaggregatedStore {
    attestations: HashMap<AttestationId, Vec<VersionedAttestation>>,
    pub(crate) slot_index: BTreeMap<u64, HashSet<AttestationId>>,
}

impl UnaggregatedStore {
    /// Returns `false` when an attestation with the same bit pattern is already held.
    pub fn insert(
        &mut self,
        id: AttestationId,
        attestation: VersionedAttestation,
    ) -> Result<bool, PoolError> {
        let set_bits = attestation.num_set_aggregation_bits();
        if set_bits != 1 {
            return Err(PoolError::AlreadyAggregated { set_bits });
        }

        let slot = attestation.slot();
        let attestations = self.attestations.entry(id).or_default();
        if attestations
            .iter()
            .any(|existing| existing.has_same_aggregation_bits(&attestation))
        {
            return Ok(false);
        }

        attestations.push(attestation);
        self.slot_index.entry(slot).or_default().insert(id);
        Ok(true)
    }

    /// Removes the attestation with exactly `attestation`'s bit pattern. The identity is dropped
    /// once its last attestation is gone.
    pub fn remove(&mut self, id: &AttestationId, attestation: &VersionedAttestation) -> bool {
        let Some(attestations) = self.attestations.get_mut(id) else {
            return false;
        };

        let Some(position) = attestations
            .iter()
            .position(|existing| existing.has_same_aggregation_bits(attestation))
        else {
            return false;
        };

        let removed = attestations.remove(position);
        if attestations.is_empty() {
            self.drop_identity(id, removed.slot());
        }
        true
    }

    /// Keeps only the attestations for which `keep` returns true, returning how many were
    /// removed.
    pub fn retain(
        &mut self,
        mut keep: impl FnMut(&AttestationId, &VersionedAttestation) -> bool,
    ) -> usize {
        let mut removed = 0;
        let mut emptied = vec![];

        for (id, attestations) in self.attestations.iter_mut() {
            let Some(slot) = attestations.first().map(VersionedAttestation::slot) else {
                continue;
            };
            let before = attestations.len();
            attestations.retain(|attestation| keep(id, attestation));
            removed += before - attestations.len();
            if attestations.is_empty() {
                emptied.push((*id, slot));
            }
        }

        for (id, slot) in emptied {
            self.drop_identity(&id, slot);
        }

        removed
    }

    /// Drops every attestation whose slot is below `slot`, returning how many were removed.
    pub fn remove_before_slot(&mut self, slot: u64) -> usize {
        let retained = self.slot_index.split_off(&slot);
        let stale = std::mem::replace(&mut self.slot_index, retained);

        stale
            .into_values()
            .flatten()
            .filter_map(|id| self.attestations.remove(&id))
            .map(|attestations| attestations.len())
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AttestationId, &VersionedAttestation)> {
        self.attestations.iter().flat_map(|(id, attestations)| {
            attestations
                .iter()
                .map(move |attestation| (id, attestation))
        })
    }

    pub fn all(&self) -> Vec<VersionedAttestation> {
        self.attestations.values().flatten().cloned().collect()
    }

    /// Number of identities held, not of attestations.
    pub fn count_identities(&self) -> usize {
        self.attestations.len()
    }

    pub fn count_attestations(&self) -> usize {
        self.attestations.values().map(Vec::len).sum()
    }

    pub(crate) fn get(&self, id: &AttestationId) -> Option<&Vec<VersionedAttestation>> {
        self.attestations.get(id)
    }

    fn drop_identity(&mut self, id: &AttestationId, slot: u64) {
        self.attestations.remove(id);
        if let Some(ids) = self.slot_index.get_mut(&slot) {
            ids.remove(id);
            if ids.is_empty() {
                self.slot_index.remove(&slot);
            }
        }
    }
}
