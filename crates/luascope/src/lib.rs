//! # luascope
//!
//! Resolves named values inside the object model of a live 32-bit LuaJIT
//! process, from the outside, with no cooperation from the target and no
//! symbol information.
//!
//! This crate provides:
//! - A bit-exact reproduction of the runtime's interned-string hash
//! - Hash-table node-chain walking against remote memory
//! - Chained key-path and module-relative pointer-path resolution
//! - A tick-driven watch layer that samples resolved addresses
//!
//! The resolvers never allocate or mutate anything in the target; they only
//! compute addresses and interpret words read through the [`ReadMemory`]
//! primitive. A failed or absent lookup is reported as the [`NOT_FOUND`]
//! sentinel and retried by the watch layer on the next tick.

pub mod config;
pub mod error;
pub mod hash;
pub mod memory;
pub mod resolve;
pub mod watch;

pub use config::{AnchorKind, PointerPath, ValueKind, ValueSpec, WatchConfig};
pub use error::{Error, Result};
pub use hash::lua_string_hash;
pub use memory::{Address, ModuleInfo, ModuleSnapshot, NOT_FOUND, ReadMemory};
pub use resolve::{PointerPathResolver, TableResolver};
pub use watch::{
    Anchors, ResolutionState, SampledValue, Tracker, ValueWatcher, decode_bool,
};

#[cfg(target_os = "windows")]
pub use memory::ProcessHandle;
