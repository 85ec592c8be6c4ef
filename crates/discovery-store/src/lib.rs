pub mod answers;
pub mod config;
pub mod error;
pub mod schema;
pub mod session;
pub mod store;

pub use answers::{ANSWERS_KEY, AnswerStore, TIMESTAMP_KEY};
pub use config::{CONFIG_FILE, DATABASE_FILE, DiscoveryConfig, MessagingConfig, default_base_dir};
pub use error::{Result, StoreError};
pub use session::{DiscoverySession, SUMMARY_TITLE, SubmitOutcome};
pub use store::{MemoryStorage, SqliteStorage, Storage};
