pub mod attestation_id;
pub mod config;
pub mod errors;
pub mod retrieval;
pub mod seen_bits;
pub mod service;
pub mod unaggregated_pool;
pub mod unaggregated_store;

pub use attestation_id::AttestationId;
pub use config::{SeenBitsPolicy, UnaggregatedPoolConfig};
pub use errors::PoolError;
pub use seen_bits::SeenBitIndex;
pub use service::{SweepSummary, UnaggregatedPoolService};
pub use unaggregated_pool::UnaggregatedAttestationPool;
pub use unaggregated_store::UnaggregatedStore;
