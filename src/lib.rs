// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # hpce-loader
//!
//! Client-side loader for a segmented correlation engine: records and deletes
//! subject–action–object triples across the engine's segments without the
//! caller knowing how items map to segments, how writes are batched, or how
//! names become numeric ids.
//!
//! ## Architecture
//!
//! - **Routing** (`router`): item `i` lives on segment `i mod N`
//! - **Operations** (`op`): each triple is written twice, once per owning segment
//! - **Buffering** (`segment`): per-segment batches, flushed at a threshold and retried
//! - **Symbols** (`resolver`): cached name → id conversion through the store
//! - **Deletion** (`walker`): query/delete/re-query until the store reports no matches
//! - **Transport** (`remote`): the store's HTTP contract behind the `StoreApi` trait
//!
//! ## Library usage
//!
//! ```no_run
//! use hpce_loader::config::EngineConfig;
//! use hpce_loader::engine::Engine;
//! use hpce_loader::symbol::SymbolicTriple;
//!
//! let engine = Engine::connect(EngineConfig::default()).unwrap();
//! engine
//!     .apply(&SymbolicTriple::new("Person", "Alice", "likes", "Movie", "Matrix"))
//!     .unwrap();
//! engine.close().unwrap();
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod observer;
pub mod op;
pub mod remote;
pub mod resolver;
pub mod router;
pub mod segment;
pub mod symbol;
pub mod triple;
pub mod walker;
