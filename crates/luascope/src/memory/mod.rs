//! Remote memory access primitives.
//!
//! Everything the resolvers know about the target process comes through the
//! [`ReadMemory`] trait: single bounded 4-byte reads that either return a
//! word or fail immediately. The module list is taken as an immutable
//! [`ModuleSnapshot`] per tick and passed in explicitly, never consulted as
//! ambient global state.

pub mod layout;

#[cfg(target_os = "windows")]
mod process;

#[cfg(test)]
pub mod mock;

#[cfg(target_os = "windows")]
pub use process::ProcessHandle;

#[cfg(test)]
pub use mock::{MockMemory, MockMemoryBuilder};

/// Absolute address in the target process. The supported runtime layout is
/// 32-bit (non-GC64), so every remote pointer fits in a u32.
pub type Address = u32;

/// Sentinel address: not found / not yet resolvable. Never a valid result.
pub const NOT_FOUND: Address = 0;

/// Read access to the target process's address space.
///
/// Implementations must treat address 0 as unreadable and must never block:
/// a read either returns a value or fails on the spot.
pub trait ReadMemory {
    /// Read a little-endian u32 at `addr`. `None` on any failure (unmapped
    /// page, access denied, process gone).
    fn read_u32(&self, addr: Address) -> Option<u32>;

    /// Read an 8-byte IEEE double as two word reads.
    fn read_f64(&self, addr: Address) -> Option<f64> {
        let lo = self.read_u32(addr)?;
        let hi = self.read_u32(addr.checked_add(4)?)?;
        Some(f64::from_bits(u64::from(hi) << 32 | u64::from(lo)))
    }
}

/// One loaded module of the target process.
#[derive(Debug, Clone)]
pub struct ModuleInfo {
    pub name: String,
    pub base: Address,
}

/// Immutable view of the target's loaded modules at one point in time.
#[derive(Debug, Clone, Default)]
pub struct ModuleSnapshot {
    modules: Vec<ModuleInfo>,
}

impl ModuleSnapshot {
    pub fn new(modules: Vec<ModuleInfo>) -> Self {
        Self { modules }
    }

    /// Base address of a module by name, compared case-insensitively
    /// (module names on Windows are not case-sensitive).
    pub fn base_of(&self, name: &str) -> Option<Address> {
        self.modules
            .iter()
            .find(|m| m.name.eq_ignore_ascii_case(name))
            .map(|m| m.base)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
