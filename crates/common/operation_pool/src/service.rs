use std::{
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use ream_consensus_misc::constants::beacon::SECONDS_PER_SLOT;
use ream_metrics::{UNAGGREGATED_ATTESTATION_POOL_SWEEP_TIME, start_timer_vec, stop_timer};
use tokio::{sync::oneshot, time::interval};
use tracing::{info, warn};

use crate::{config::UnaggregatedPoolConfig, unaggregated_pool::UnaggregatedAttestationPool};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepSummary {
    pub pruned_stale: usize,
    pub deleted_seen: usize,
    pub expired_seen: usize,
}

/// UnaggregatedPoolService keeps the [UnaggregatedAttestationPool] bounded. Every sweep:
/// 1. Drops attestations too old to be included at the current slot.
/// 2. Deletes attestations whose bits became seen.
/// 3. Evicts expired seen records.
pub struct UnaggregatedPoolService {
    pool: Arc<UnaggregatedAttestationPool>,
    genesis_time: u64,
    sweep_interval: Duration,
}

impl UnaggregatedPoolService {
    pub fn new(
        pool: Arc<UnaggregatedAttestationPool>,
        genesis_time: u64,
        config: &UnaggregatedPoolConfig,
    ) -> Self {
        UnaggregatedPoolService {
            pool,
            genesis_time,
            sweep_interval: config.sweep_interval,
        }
    }

    pub async fn start(self, mut shutdown: oneshot::Receiver<()>) -> anyhow::Result<()> {
        info!(
            "UnaggregatedPoolService started with genesis_time: {}, sweep interval: {:?}",
            self.genesis_time, self.sweep_interval
        );

        let mut interval = interval(self.sweep_interval);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sweep(current_slot(self.genesis_time));
                }
                _ = &mut shutdown => {
                    info!("UnaggregatedPoolService stopped");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one housekeeping pass. Stale pruning is skipped before genesis.
    pub fn sweep(&self, current_slot: Option<u64>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        if let Some(current_slot) = current_slot {
            let timer = start_timer_vec(&UNAGGREGATED_ATTESTATION_POOL_SWEEP_TIME, &["stale"]);
            summary.pruned_stale = self.pool.prune_stale(current_slot);
            stop_timer(timer);
        }

        let timer = start_timer_vec(&UNAGGREGATED_ATTESTATION_POOL_SWEEP_TIME, &["seen"]);
        match self.pool.delete_seen() {
            Ok(deleted) => summary.deleted_seen = deleted,
            Err(err) => warn!("Failed to delete seen attestations: {err}"),
        }
        stop_timer(timer);

        let timer = start_timer_vec(&UNAGGREGATED_ATTESTATION_POOL_SWEEP_TIME, &["expired"]);
        summary.expired_seen = self.pool.prune_expired_seen();
        stop_timer(timer);

        if summary != SweepSummary::default() {
            info!(
                "Swept pool at slot {current_slot:?}: {} stale, {} seen, {} expired seen records",
                summary.pruned_stale, summary.deleted_seen, summary.expired_seen
            );
        }

        summary
    }
}

/// `None` before genesis.
pub fn current_slot(genesis_time: u64) -> Option<u64> {
    slot_at(genesis_time, SystemTime::now())
}

pub fn slot_at(genesis_time: u64, now: SystemTime) -> Option<u64> {
    let genesis_instant = UNIX_EPOCH + Duration::from_secs(genesis_time);
    let elapsed = now.duration_since(genesis_instant).ok()?;

    Some(elapsed.as_secs() / SECONDS_PER_SLOT)
}

#[cfg(test)]
mod tests {
    use ream_bls::BLSSignature;
    use ream_consensus_beacon::{
        phase0::attestation::Attestation as Phase0Attestation,
        versioned_attestation::{AggregationBits, VersionedAttestation},
    };
    use ream_consensus_misc::attestation_data::AttestationData;
    use ssz_types::BitList;

    use super::*;
    use crate::attestation_id::AttestationId;

    fn attestation(slot: u64, position: usize) -> VersionedAttestation {
        let mut aggregation_bits = BitList::with_capacity(8).expect("valid bitlist length");
        aggregation_bits.set(position, true).expect("position within bitlist");

        Phase0Attestation {
            aggregation_bits,
            data: AttestationData {
                slot,
                ..Default::default()
            },
            signature: BLSSignature::default(),
        }
        .into()
    }

    fn seed_pool() -> Arc<UnaggregatedAttestationPool> {
        let pool = Arc::new(UnaggregatedAttestationPool::default());
        pool.save(&attestation(1, 0)).expect("single bit");
        pool.save(&attestation(100, 0)).expect("single bit");
        pool.save(&attestation(100, 1)).expect("single bit");

        let id = AttestationId::compute(&attestation(100, 0)).expect("phase0 id");
        let mut seen = AggregationBits::with_capacity(8).expect("valid bitlist length");
        seen.set(1, true).expect("position within bitlist");
        pool.seen_bits().record_seen(id, &seen).expect("first record");

        pool
    }

    #[test]
    fn test_slot_at() {
        let genesis = UNIX_EPOCH + Duration::from_secs(1_000);

        assert_eq!(slot_at(1_000, genesis), Some(0));
        assert_eq!(slot_at(1_000, genesis + Duration::from_secs(25)), Some(2));
        assert_eq!(slot_at(1_000, genesis - Duration::from_secs(1)), None);
    }

    #[test]
    fn test_sweep() {
        let pool = seed_pool();
        let service =
            UnaggregatedPoolService::new(pool.clone(), 0, &UnaggregatedPoolConfig::default());

        let summary = service.sweep(Some(100));

        assert_eq!(
            summary,
            SweepSummary {
                pruned_stale: 1,
                deleted_seen: 1,
                expired_seen: 0,
            }
        );
        assert_eq!(pool.all(), vec![attestation(100, 0)]);
        assert_eq!(service.sweep(Some(100)), SweepSummary::default());
    }

    #[test]
    fn test_sweep_before_genesis_keeps_old_attestations() {
        let pool = seed_pool();
        let service =
            UnaggregatedPoolService::new(pool.clone(), 0, &UnaggregatedPoolConfig::default());

        let summary = service.sweep(None);

        assert_eq!(summary.pruned_stale, 0);
        assert_eq!(summary.deleted_seen, 1);
        assert_eq!(pool.count_identities(), 2);
    }

    #[tokio::test]
    async fn test_service_sweeps_until_shutdown() {
        let pool = seed_pool();
        let config = UnaggregatedPoolConfig {
            sweep_interval: Duration::from_millis(10),
            ..Default::default()
        };
        let service = UnaggregatedPoolService::new(pool.clone(), 0, &config);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(service.start(shutdown_rx));

        for _ in 0..100 {
            if pool.count_identities() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        shutdown_tx.send(()).expect("service is running");
        handle
            .await
            .expect("service task completes")
            .expect("service stops cleanly");
        assert_eq!(pool.count_identities(), 0);
    }
}
