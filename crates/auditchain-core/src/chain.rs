//! Hash-chain primitive: the FNV-1a 64-bit link between records.
//!
//! Hash input layout: the UTF-8 bytes of `"{seq}|{prev_hash}|{event_json}"`,
//! where `event_json` is the canonical serialization of the record without
//! its `chain_hash`.  Output is 16 lowercase hex digits.
//!
//! FNV-1a is not collision resistant.  The chain detects accidental and
//! incidental tampering and is trivial to reimplement byte-for-byte in any
//! language; it does not stop an attacker who can rewrite the whole file.

/// FNV-1a 64-bit offset basis.
pub const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a 64-bit prime.
pub const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64-bit over `bytes`.
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |h, &b| {
        (h ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Compute the chain hash linking a record at `seq` to `prev_hash`.
///
/// Pure and deterministic: identical inputs give identical output on every
/// platform.
pub fn chain_hash(seq: u64, prev_hash: &str, canonical_event_json: &str) -> String {
    let input = format!("{seq}|{prev_hash}|{canonical_event_json}");
    hex::encode(fnv1a64(input.as_bytes()).to_be_bytes())
}
