use sha2::{Digest, Sha256};

const USER_ID_HASH_SALT: &[u8] = b"leadsync-user-id-log-salt";

/// Stable, non-reversible tag for a user id in log fields.
#[must_use]
pub fn redact_user_id(user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(USER_ID_HASH_SALT);
    hasher.update(user_id.as_bytes());
    let digest = hasher.finalize();
    format!("user_hash={}", hex::encode(&digest[..8]))
}
