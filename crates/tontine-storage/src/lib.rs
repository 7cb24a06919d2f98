//! Persistence adapters for the tontine ledger.
//!
//! Two worlds, no transaction across them: every category except tasks
//! persists to a local JSON slot (one file per category, malformed content
//! silently resets); tasks persist through an account-scoped remote backend
//! with a best-effort local snapshot when the remote side fails.

#![deny(unsafe_code)]

pub mod error;
pub mod persist;
pub mod remote;
pub mod slot;
pub mod tasks;

pub use error::{StorageError, StorageResult};
pub use persist::LedgerStorage;
pub use remote::{RemoteConfig, RemoteTaskClient, Session, SignUpOutcome};
pub use slot::{Slot, SlotStore};
pub use tasks::{PersistOutcome, TaskBackend, TaskPersistence};
