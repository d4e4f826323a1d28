#![forbid(unsafe_code)]

//! Host-agnostic DOM glue for programs compiled to WASM.
//!
//! # Role in domwave
//! `domwave-core` owns everything that does not need a live browser:
//! - **Grid mutations**: the [`GridMutation`] sum type and its JSON wire codec.
//! - **Grid applier**: [`GridApplier`] applies a batch against a container,
//!   keeping an owned (row, column) → node index instead of rebuilding
//!   selector strings per record.
//! - **Host traits**: [`GridHost`] (node-level operations the applier needs)
//!   and [`DocumentHost`] (selector-level shims such as inner markup, style,
//!   focus, scroll, and the URL hash).
//! - **In-memory document**: [`MemoryDocument`] implements both host traits
//!   so the whole surface is testable without a rendering context.
//!
//! `domwave-web` wraps these with `wasm-bindgen` and a `web-sys` host.

pub mod addressing;
pub mod config;
pub mod cursor;
pub mod grid;
pub mod host;
pub mod logging;
pub mod memory;
pub mod mutation;
pub mod style;
pub mod wire;

pub use config::{ConfigError, GridConfig};
pub use grid::{GridApplier, GridError, GridIndex};
pub use host::{DocumentHost, GridHost, HostError, InsertPosition};
pub use memory::MemoryDocument;
pub use mutation::GridMutation;
pub use wire::WireError;
