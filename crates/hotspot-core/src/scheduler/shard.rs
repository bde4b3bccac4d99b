use crate::consts::BUCKET_HASH_SEED;

/// Bucket folder name for a base filename.
///
/// Polynomial hash (`hash * 31 + byte`) over the filename bytes, taken
/// modulo `num_folders` and rendered as at least two lowercase hex digits.
/// Reducing at every step gives the same bucket as the unbounded hash for
/// any folder count. Independent of platform and process.
pub fn distributed_folder(name: &str, num_folders: u64) -> String {
    let modulus = u128::from(num_folders.max(1));
    let hash = name.bytes().fold(0u128, |hash, byte| {
        (hash * u128::from(BUCKET_HASH_SEED) + u128::from(byte)) % modulus
    });
    format!("{hash:02x}")
}
