//! Session persistence
//!
//! One directory per session:
//!
//! | File | Content |
//! |---|---|
//! | `config.json` | session configuration, written once |
//! | `visited.txt` | `mark<:>url` per line |
//! | `unvisited.txt` | one URL per line; absent once the session is drained |
//! | `session_buffer.ndjson` | append-only result log |
//! | `session.json` | consolidated results, written at clean termination |
//! | `session.log` | operational log |
//!
//! Downloaded resources live in category subdirectories next to these.

mod directory;
pub mod layout;
mod traits;

pub use directory::SessionDirectory;
pub use traits::{Storage, StorageError, StorageResult};
