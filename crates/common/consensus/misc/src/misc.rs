use crate::constants::beacon::SLOTS_PER_EPOCH;

/// Return the epoch number at `slot`.
pub fn compute_epoch_at_slot(slot: u64) -> u64 {
    slot / SLOTS_PER_EPOCH
}

/// Return the start slot of `epoch`.
pub fn compute_start_slot_at_epoch(epoch: u64) -> u64 {
    epoch * SLOTS_PER_EPOCH
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_boundaries() {
        assert_eq!(compute_epoch_at_slot(0), 0);
        assert_eq!(compute_epoch_at_slot(SLOTS_PER_EPOCH - 1), 0);
        assert_eq!(compute_epoch_at_slot(SLOTS_PER_EPOCH), 1);
        assert_eq!(compute_start_slot_at_epoch(3), 3 * SLOTS_PER_EPOCH);
        assert_eq!(compute_epoch_at_slot(compute_start_slot_at_epoch(7)), 7);
    }
}
