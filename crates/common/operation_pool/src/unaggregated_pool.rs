use parking_lot::RwLock;
use ream_consensus_beacon::versioned_attestation::{AggregationBits, VersionedAttestation};
use ream_consensus_misc::misc::{compute_epoch_at_slot, compute_start_slot_at_epoch};
use ream_metrics::{
    UNAGGREGATED_ATTESTATION_POOL_ATTESTATIONS, UNAGGREGATED_ATTESTATION_POOL_EVENTS,
    UNAGGREGATED_ATTESTATION_POOL_IDENTITIES, inc_int_counter_vec, set_int_gauge_vec,
};
use tracing::{debug, trace, warn};

use crate::{
    attestation_id::AttestationId, config::UnaggregatedPoolConfig, errors::PoolError,
    seen_bits::SeenBitIndex, unaggregated_store::UnaggregatedStore,
};

/// Pool of single-validator attestations waiting to be aggregated or packed into a block.
///
/// Gossip ingestion calls [UnaggregatedAttestationPool::save], block packing reads through the
/// slot and committee queries and calls [UnaggregatedAttestationPool::delete] for every vote it
/// includes, which records the vote's bits as seen. [UnaggregatedAttestationPool::delete_seen]
/// reclaims votes that became seen through other paths.
///
/// Lock order is the store lock, then the seen index lock.
#[derive(Debug)]
pub struct UnaggregatedAttestationPool {
    store: RwLock<UnaggregatedStore>,
    seen_bits: SeenBitIndex,
}

impl Default for UnaggregatedAttestationPool {
    fn default() -> Self {
        Self::new(&UnaggregatedPoolConfig::default())
    }
}

impl UnaggregatedAttestationPool {
    pub fn new(config: &UnaggregatedPoolConfig) -> Self {
        Self {
            store: RwLock::new(UnaggregatedStore::default()),
            seen_bits: SeenBitIndex::new(config.seen_bits_ttl, config.seen_bits_policy),
        }
    }

    /// The seen index, shared with components that absorb votes through other paths.
    pub fn seen_bits(&self) -> &SeenBitIndex {
        &self.seen_bits
    }

    /// Stores a single-validator attestation. Votes whose bits are already seen are dropped
    /// without an error.
    pub fn save(&self, attestation: &VersionedAttestation) -> Result<(), PoolError> {
        let set_bits = attestation.num_set_aggregation_bits();
        if set_bits != 1 {
            record_event("rejected_aggregated");
            return Err(PoolError::AlreadyAggregated { set_bits });
        }

        let id = AttestationId::compute(attestation).inspect_err(|err| {
            record_event("malformed_identity");
            debug!("Rejecting attestation at slot {}: {err}", attestation.slot());
        })?;

        let mut store = self.store.write();

        if self.is_seen(&id, attestation) {
            record_event("seen_skip");
            trace!("Skipping already seen attestation {id}");
            return Ok(());
        }

        if store.insert(id, attestation.clone())? {
            record_event("inserted");
            debug!(
                "Saved unaggregated {} attestation {id} at slot {}",
                attestation.fork_name(),
                attestation.slot()
            );
        } else {
            record_event("duplicate");
            trace!("Attestation {id} is already in the pool");
        }
        update_size_gauges(&store);

        Ok(())
    }

    /// Saves every attestation independently. Failures do not stop the batch and are returned
    /// together with their position.
    pub fn save_batch(&self, attestations: &[VersionedAttestation]) -> Result<(), PoolError> {
        let failures = attestations
            .iter()
            .enumerate()
            .filter_map(|(index, attestation)| self.save(attestation).err().map(|err| (index, err)))
            .collect::<Vec<_>>();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(PoolError::Batch(failures))
        }
    }

    /// Marks the attestation's bits as seen and removes it from the pool. Removal happens even
    /// when the seen index cannot be updated.
    pub fn delete(&self, attestation: &VersionedAttestation) -> Result<(), PoolError> {
        let set_bits = attestation.num_set_aggregation_bits();
        if set_bits > 1 {
            record_event("rejected_aggregated");
            return Err(PoolError::AlreadyAggregated { set_bits });
        }

        let id = AttestationId::compute(attestation)?;

        // An empty pattern would replace a real seen record with nothing.
        if set_bits == 0 {
            return Ok(());
        }

        let mut store = self.store.write();

        if let Err(err) =
            widened_bits(attestation).and_then(|bits| self.seen_bits.record_seen(id, &bits))
        {
            if matches!(err, PoolError::BitLengthMismatch { .. }) {
                record_event("bit_length_mismatch");
            }
            warn!("Failed to record seen bits for attestation {id}: {err}");
        }

        if store.remove(&id, attestation) {
            record_event("deleted");
            debug!("Deleted attestation {id} at slot {}", attestation.slot());
        }
        update_size_gauges(&store);

        Ok(())
    }

    /// Removes every attestation whose bits are seen, or whose seen state cannot be determined,
    /// returning how many were removed.
    pub fn delete_seen(&self) -> Result<usize, PoolError> {
        let mut store = self.store.write();
        let removed = store.retain(|id, attestation| !self.is_seen(id, attestation));

        if removed > 0 {
            inc_int_counter_vec(&UNAGGREGATED_ATTESTATION_POOL_EVENTS, removed as u64, &[
                "deleted_seen",
            ]);
            debug!("Deleted {removed} seen attestations");
        }
        update_size_gauges(&store);

        Ok(removed)
    }

    /// Every attestation in the pool that is not seen. Attestations whose seen state cannot be
    /// determined are left out as well.
    pub fn all(&self) -> Vec<VersionedAttestation> {
        self.store
            .read()
            .iter()
            .filter(|(id, attestation)| !self.is_seen(id, attestation))
            .map(|(_, attestation)| attestation.clone())
            .collect()
    }

    /// Number of distinct identities in the pool.
    pub fn count_identities(&self) -> usize {
        self.store.read().count_identities()
    }

    pub fn by_slot_and_committee(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> Vec<VersionedAttestation> {
        self.store.read().by_slot_and_committee(slot, committee_index)
    }

    pub fn by_slot_and_committee_multi_committee(
        &self,
        slot: u64,
        committee_index: u64,
    ) -> Vec<VersionedAttestation> {
        self.store
            .read()
            .by_slot_and_committee_multi_committee(slot, committee_index)
    }

    /// Drops attestations that can no longer be included in a block at `current_slot`, that is
    /// every attestation from before the previous epoch.
    pub fn prune_stale(&self, current_slot: u64) -> usize {
        let previous_epoch = compute_epoch_at_slot(current_slot).saturating_sub(1);
        let mut store = self.store.write();
        let removed = store.remove_before_slot(compute_start_slot_at_epoch(previous_epoch));

        if removed > 0 {
            inc_int_counter_vec(&UNAGGREGATED_ATTESTATION_POOL_EVENTS, removed as u64, &[
                "pruned_stale",
            ]);
            debug!("Pruned {removed} stale attestations at slot {current_slot}");
        }
        update_size_gauges(&store);

        removed
    }

    /// Evicts expired seen records.
    pub fn prune_expired_seen(&self) -> usize {
        self.seen_bits.prune_expired()
    }

    /// A bit length mismatch counts as seen so that a broken record can never keep a vote
    /// alive.
    fn is_seen(&self, id: &AttestationId, attestation: &VersionedAttestation) -> bool {
        let bits = match widened_bits(attestation) {
            Ok(bits) => bits,
            Err(err) => {
                warn!("Treating attestation {id} as seen: {err}");
                return true;
            }
        };

        match self.seen_bits.is_covered(id, &bits) {
            Ok(covered) => covered,
            Err(err) => {
                record_event("bit_length_mismatch");
                warn!(
                    "Seen bit length mismatch for attestation {id} at slot {}: {err}",
                    attestation.slot()
                );
                true
            }
        }
    }
}

fn widened_bits(attestation: &VersionedAttestation) -> Result<AggregationBits, PoolError> {
    attestation
        .aggregation_bits()
        .map_err(|err| PoolError::Bitfield(format!("{err:?}")))
}

fn record_event(event: &str) {
    inc_int_counter_vec(&UNAGGREGATED_ATTESTATION_POOL_EVENTS, 1, &[event]);
}

fn update_size_gauges(store: &UnaggregatedStore) {
    set_int_gauge_vec(
        &UNAGGREGATED_ATTESTATION_POOL_IDENTITIES,
        store.count_identities() as i64,
        &[],
    );
    set_int_gauge_vec(
        &UNAGGREGATED_ATTESTATION_POOL_ATTESTATIONS,
        store.count_attestations() as i64,
        &[],
    );
}
