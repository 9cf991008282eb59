//! # Storage Layer
//!
//! The Record Store: row-level CRUD over one flat Collection File per entity
//! type. This layer never looks inside a row beyond its first column (the key)
//! and, for column searches, the position named by the header line.
//!
//! ## File Format
//!
//! ```text
//! <data_dir>/
//! ├── patients.csv        # header line, then one row per patient
//! ├── doctors.csv
//! ├── medicines.csv
//! ├── ...
//! └── config.json         # see crate::config
//! ```
//!
//! - The header is written once, when the file is created, and is never
//!   rewritten by normal operation.
//! - Every row lives on its own line and the file always ends with a line break.
//! - Blank lines are ignored on read. Lines that are not valid UTF-8 are
//!   skipped by row reads and reported by [`RecordStore::read_lines`].
//! - A rewrite copies the header and every untouched line back byte for byte,
//!   line terminators included. New lines use the header's terminator.
//!
//! ## Write Paths
//!
//! - **Append** (`append`, `append_all`): opens the file in append mode. It adds a
//!   missing trailing line break first so two rows never end up on one line.
//! - **Rewrite** (`write_all`, `replace_by_key`, `delete_by_key`): the new
//!   content goes to a temporary sibling file that is then renamed over the
//!   collection. A crash leaves either the old or the new file, never half of one.
//!
//! Both paths hold the per-file [`lock::PathLock`], so within one process a
//! rewrite cannot discard a concurrent append. There is no cross-process
//! locking: two processes writing the same collection is undefined, and the
//! last rewrite wins.
//!
//! ## Cost
//!
//! There is no index. Every lookup is a linear scan, and every update or delete
//! rewrites the whole file.

pub mod file;
pub mod lock;
pub mod row;

pub use file::RecordStore;
pub use row::{Line, Row, DELIMITER};
