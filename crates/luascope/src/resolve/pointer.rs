//! Module-relative pointer-path resolution.
//!
//! The runtime's root structures (registry and globals tables) are not
//! reachable by name; they are located through a fixed chain of dereferences
//! starting at a module's load base. The offsets are specific to one build
//! of the target and are supplied by the integrator.

use tracing::debug;

use crate::memory::{Address, ModuleSnapshot, NOT_FOUND, ReadMemory};

/// Resolves `deref(...deref(deref(base + offsets[0]) + offsets[1])...)`.
///
/// Note the asymmetry: the first offset is added to the module base with no
/// prior dereference, while every later offset applies to the previously
/// dereferenced word.
pub struct PointerPathResolver<'a, R: ReadMemory> {
    reader: &'a R,
    modules: &'a ModuleSnapshot,
}

impl<'a, R: ReadMemory> PointerPathResolver<'a, R> {
    pub fn new(reader: &'a R, modules: &'a ModuleSnapshot) -> Self {
        Self { reader, modules }
    }

    /// Walk the offset chain from `module`'s base. Returns [`NOT_FOUND`] if
    /// the module is not loaded, any read fails, or any intermediate address
    /// is null before an offset is applied.
    pub fn resolve(&self, module: &str, offsets: &[u32]) -> Address {
        let Some(base) = self.modules.base_of(module) else {
            debug!(module, "module not loaded");
            return NOT_FOUND;
        };

        let mut current = base;
        for &offset in offsets {
            if current == NOT_FOUND {
                return NOT_FOUND;
            }
            current = self
                .reader
                .read_u32(current.wrapping_add(offset))
                .unwrap_or(NOT_FOUND);
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MockMemory, ModuleInfo};

    fn snapshot(base: Address) -> ModuleSnapshot {
        ModuleSnapshot::new(vec![ModuleInfo {
            name: "game.exe".to_string(),
            base,
        }])
    }

    #[test]
    fn test_resolve_chains_dereferences() {
        let mut mem = MockMemory::new();
        mem.write_u32(0x0040_0000 + 0x1C, 0x0080_0000);
        mem.write_u32(0x0080_0000 + 0x10, 0x0090_0000);
        let modules = snapshot(0x0040_0000);

        let resolver = PointerPathResolver::new(&mem, &modules);
        assert_eq!(resolver.resolve("game.exe", &[0x1C, 0x10]), 0x0090_0000);
    }

    #[test]
    fn test_resolve_missing_module_returns_sentinel() {
        let mem = MockMemory::new();
        let modules = ModuleSnapshot::default();
        let resolver = PointerPathResolver::new(&mem, &modules);
        assert_eq!(resolver.resolve("game.exe", &[0x1C]), NOT_FOUND);
    }

    #[test]
    fn test_resolve_aborts_on_null_intermediate() {
        let mut mem = MockMemory::new();
        mem.write_u32(0x0040_0000 + 0x1C, 0);
        // were the chain not aborted, this word would make the result non-zero
        mem.write_u32(0x10, 0xDEAD_BEEF);
        let modules = snapshot(0x0040_0000);

        let resolver = PointerPathResolver::new(&mem, &modules);
        assert_eq!(resolver.resolve("game.exe", &[0x1C, 0x10]), NOT_FOUND);
    }

    #[test]
    fn test_resolve_failed_read_returns_sentinel() {
        let mem = MockMemory::new();
        let modules = snapshot(0x0040_0000);
        let resolver = PointerPathResolver::new(&mem, &modules);
        assert_eq!(resolver.resolve("game.exe", &[0x1C]), NOT_FOUND);
    }

    #[test]
    fn test_resolve_empty_offsets_returns_module_base() {
        let mem = MockMemory::new();
        let modules = snapshot(0x0040_0000);
        let resolver = PointerPathResolver::new(&mem, &modules);
        assert_eq!(resolver.resolve("game.exe", &[]), 0x0040_0000);
    }
}
