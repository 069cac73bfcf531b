// Sales Bot - Core Library
// Command interpreter and CSV ledger, shared by the terminal and web shells

pub mod aggregator;
pub mod config;
pub mod error;
pub mod intent;
pub mod interpreter;
pub mod ledger;
pub mod logging;
pub mod session;

#[cfg(feature = "tui")]
pub mod ui;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use aggregator::{summarize, total_sales, SalesSummary};
pub use config::{Config, ConfigArgs};
pub use error::{LedgerError, Result};
pub use intent::{classify, Intent};
pub use interpreter::{Interpreter, Reply, ReplyStatus};
pub use ledger::{CustomerRecord, Ledger, ProductRecord, SaleRecord, Table};
pub use session::{ChatMessage, Role, Session};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
