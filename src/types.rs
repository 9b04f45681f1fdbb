use std::sync::Arc;

use tokio::sync::Mutex;

use crate::session::PicksService;

// ── Constants ──────────────────────────────────────────────────────────

/// Sentinel player name for a slot that has not been decided yet.
pub const TBD_NAME: &str = "TBD";

/// Tour-level singles default.
pub const DEFAULT_BEST_OF: u32 = 3;

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedPicksService<S> = Arc<Mutex<PicksService<S>>>;
