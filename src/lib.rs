pub mod bracket;
pub mod config;
pub mod engine;
pub mod error;
pub mod scoring;
pub mod seed;
pub mod session;
pub mod store;
pub mod types;

pub use bracket::{BracketData, Match, Player, Round, SetScore, Side};
pub use engine::{apply_selection, auto_pick, is_bracket_complete, PickRng};
pub use error::PicksError;
pub use scoring::{is_match_complete, match_winner};
pub use session::{BracketSession, PicksService};
pub use store::{BracketStore, JsonFileBracketStore, MemoryBracketStore};
pub use types::SharedPicksService;

use std::fs;

use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{load_env_file, repo_root};

/// Initialize tracing with file + stderr output. The returned guard must
/// stay alive for the lifetime of the process or buffered log lines are
/// dropped on exit.
pub fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    load_env_file();

    let logs_dir = repo_root().join("logs");
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "picks.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .init();
    info!("Bracket picks engine starting");
    guard
}
