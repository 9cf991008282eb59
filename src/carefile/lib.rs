//! # Carefile Architecture
//!
//! Carefile is the **record storage layer** of a hospital management console.
//! Patients, doctors, pharmacists, medicines, replenishment requests,
//! appointments and login accounts each live in one plain-text Collection
//! File, one comma-separated row per entity. The files stay readable and
//! editable in any spreadsheet or text editor.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs)                                     │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API facade (api.rs) + detail views (views/)                │
//! │  - Joins entities across collections                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Repository<T> (repo/) + Mapper<T> (codec/)                 │
//! │  - Entities in, entities out                                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  RecordStore (store/)                                       │
//! │  - Rows of text in one file, keyed by the first column      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code returns regular Rust types and never prints or
//! exits. Diagnostics go through the `log` facade; the binary decides where
//! they end up (see [`logging`]).
//!
//! ## Testing Strategy
//!
//! - **Store and codec**: unit tests beside the code, on temp files.
//! - **Repository and views**: `tests/` with a `TempDir` data directory.
//! - **CLI**: `tests/cli.rs` runs the binary with `CAREFILE_HOME` set.

pub mod api;
pub mod codec;
pub mod config;
pub mod error;
pub mod init;
pub mod logging;
pub mod model;
pub mod repo;
pub mod store;
pub mod views;
