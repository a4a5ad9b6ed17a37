//! Fluency - progression engine for a conversational language tutor
//!
//! Tracks what a learner has earned across sessions: experience and levels,
//! daily and weekly streaks, a rotating pool of daily missions, badges,
//! seasonal events and streak reminders.
//!
//! ## Transactions
//!
//! Every operation on [`ProgressEngine`] loads the persisted blob, sanitizes
//! it into a [`ProgressState`], applies its changes to that draft and saves
//! the repaired result through a [`StateStore`]. A malformed blob never
//! fails an operation; it is read back as defaults section by section.

mod atomic_file;
pub mod config;
pub mod progress;
pub mod store;

pub use config::EngineConfig;
pub use progress::{ProgressEngine, ProgressState, Session};
pub use store::{JsonFileStore, MemoryStore, StateStore, StoreError};
