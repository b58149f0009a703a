use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use parking_lot::Mutex;
use ream_consensus_beacon::versioned_attestation::AggregationBits;

use crate::{attestation_id::AttestationId, config::SeenBitsPolicy, errors::PoolError};

#[derive(Debug)]
struct SeenBitRecord {
    bits: Vec<AggregationBits>,
    /// `None` when the TTL does not fit in an [Instant]; such records never expire.
    expires_at: Option<Instant>,
}

impl SeenBitRecord {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

/// Aggregation bit patterns already absorbed elsewhere (usually on chain), keyed by attestation
/// identity. Records expire `ttl` after their last write; expired records read as absent and
/// are evicted lazily or by [SeenBitIndex::prune_expired].
#[derive(Debug)]
pub struct SeenBitIndex {
    records: Mutex<HashMap<AttestationId, SeenBitRecord>>,
    ttl: Duration,
    policy: SeenBitsPolicy,
}

impl SeenBitIndex {
    pub fn new(ttl: Duration, policy: SeenBitsPolicy) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
            policy,
        }
    }

    pub fn record_seen(&self, id: AttestationId, bits: &AggregationBits) -> Result<(), PoolError> {
        self.record_seen_at(id, bits, Instant::now())
    }

    pub(crate) fn record_seen_at(
        &self,
        id: AttestationId,
        bits: &AggregationBits,
        now: Instant,
    ) -> Result<(), PoolError> {
        let expires_at = now.checked_add(self.ttl);
        let mut records = self.records.lock();

        if let Some(record) = records.get_mut(&id).filter(|record| {
            self.policy == SeenBitsPolicy::Accumulate && record.is_live(now)
        }) {
            // Every pattern of an accumulated record has the same length.
            let mut already_recorded = false;
            for seen in &record.bits {
                if contains_bits(seen, bits)? {
                    already_recorded = true;
                    break;
                }
            }
            if !already_recorded {
                record.bits.push(bits.clone());
            }
            record.expires_at = expires_at;
            return Ok(());
        }

        records.insert(
            id,
            SeenBitRecord {
                bits: vec![bits.clone()],
                expires_at,
            },
        );

        Ok(())
    }

    /// Whether every set bit of `bits` is already part of a recorded pattern for `id`. A record
    /// whose length differs from `bits` yields [PoolError::BitLengthMismatch]; callers must
    /// treat that as covered.
    pub fn is_covered(
        &self,
        id: &AttestationId,
        bits: &AggregationBits,
    ) -> Result<bool, PoolError> {
        self.is_covered_at(id, bits, Instant::now())
    }

    pub(crate) fn is_covered_at(
        &self,
        id: &AttestationId,
        bits: &AggregationBits,
        now: Instant,
    ) -> Result<bool, PoolError> {
        let mut records = self.records.lock();

        let Some(record) = records.get(id) else {
            return Ok(false);
        };

        if !record.is_live(now) {
            records.remove(id);
            return Ok(false);
        }

        for seen in &record.bits {
            if contains_bits(seen, bits)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Evict every expired record, returning how many were dropped.
    pub fn prune_expired(&self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    pub(crate) fn prune_expired_at(&self, now: Instant) -> usize {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, record| record.is_live(now));
        before - records.len()
    }

    /// Number of unexpired records.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.records
            .lock()
            .values()
            .filter(|record| record.is_live(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether `seen` has every bit of `candidate` set.
pub fn contains_bits(
    seen: &AggregationBits,
    candidate: &AggregationBits,
) -> Result<bool, PoolError> {
    if seen.len() != candidate.len() {
        return Err(PoolError::BitLengthMismatch {
            expected: seen.len(),
            actual: candidate.len(),
        });
    }

    Ok(candidate
        .iter()
        .zip(seen.iter())
        .all(|(candidate_bit, seen_bit)| !candidate_bit || seen_bit))
}
