//! Utilities for cryptographic operations.

use ring::{
    constant_time,
    digest::{digest, Digest, SHA256},
};

/// Hashes the input using SHA-256.
///
/// The admin key is compared through digests rather than directly, so the
/// comparison's timing doesn't depend on where the inputs differ.
pub(crate) fn hash_without_salt<T: AsRef<[u8]>>(bytes: &T) -> Digest {
    digest(&SHA256, bytes.as_ref())
}

/// Checks whether two digests are equal, in constant time.
pub(crate) fn digests_match(a: &Digest, b: &Digest) -> bool {
    constant_time::verify_slices_are_equal(a.as_ref(), b.as_ref()).is_ok()
}
