//! Local-origin identifiers
//!
//! Tasks created while offline get a client-minted id carrying the
//! `offline_` prefix until the server has issued its own.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Reserved prefix of local-origin identifiers
pub const LOCAL_ID_PREFIX: &str = "offline_";

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Mint a process-unique local-origin identifier
///
/// The sequence number keeps ids unique even if two are minted in the same
/// millisecond; the random suffix keeps them unique across restarts.
pub fn mint_local_id() -> String {
    let sequence = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}{}_{}_{}",
        LOCAL_ID_PREFIX,
        chrono::Utc::now().timestamp_millis(),
        sequence,
        &random[..8]
    )
}

/// Whether `id` was minted locally
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}
