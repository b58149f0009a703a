use std::time::Duration;

use ream_consensus_misc::constants::beacon::{SECONDS_PER_SLOT, SLOTS_PER_EPOCH};

/// How [crate::seen_bits::SeenBitIndex] treats a new seen pattern for an identity that already
/// has a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeenBitsPolicy {
    /// Keep only the most recent pattern.
    #[default]
    Replace,
    /// Keep every distinct pattern that is not contained in one already recorded.
    Accumulate,
}

#[derive(Debug, Clone)]
pub struct UnaggregatedPoolConfig {
    pub seen_bits_ttl: Duration,
    pub seen_bits_policy: SeenBitsPolicy,
    pub sweep_interval: Duration,
}

impl Default for UnaggregatedPoolConfig {
    fn default() -> Self {
        Self {
            seen_bits_ttl: Duration::from_secs(2 * SLOTS_PER_EPOCH * SECONDS_PER_SLOT),
            seen_bits_policy: SeenBitsPolicy::default(),
            sweep_interval: Duration::from_secs(SECONDS_PER_SLOT),
        }
    }
}
