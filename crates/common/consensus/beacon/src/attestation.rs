use ream_bls::BLSSignature;
use ream_consensus_misc::attestation_data::AttestationData;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    BitList, BitVector,
    typenum::{U64, U131072},
};
use tree_hash_derive::TreeHash;

/// The Electra attestation. `data.index` is always 0, the committees the attestation speaks for
/// are the set bits of `committee_bits` and `aggregation_bits` is the concatenation of their
/// participation bits.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Attestation {
    pub aggregation_bits: BitList<U131072>,
    pub data: AttestationData,
    pub signature: BLSSignature,
    pub committee_bits: BitVector<U64>,
}
