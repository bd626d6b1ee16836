//! Hash-part walker for tables in the target runtime.

use tracing::{debug, trace};

use crate::hash::lua_string_hash;
use crate::memory::layout::{gcstr, gctab, itype, node};
use crate::memory::{Address, NOT_FOUND, ReadMemory};

/// Resolves string keys against remote tables by reproducing the runtime's
/// own bucket + overflow-chain lookup.
///
/// The resolver is stateless apart from the borrowed reader; it never
/// allocates or mutates anything in the target.
pub struct TableResolver<'a, R: ReadMemory> {
    reader: &'a R,
}

impl<'a, R: ReadMemory> TableResolver<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    /// Resolve `key` in the hash part of the table at `table`.
    ///
    /// A node matches when its key is string-typed and the hash stored in
    /// the key's string header equals the computed hash. The key's
    /// characters are never compared; this mirrors the runtime's interned
    /// fast path, so two distinct keys with colliding hashes would silently
    /// resolve to the same slot. Preserved as-is for layout compatibility.
    ///
    /// Returns the value-slot address, or the word stored in the slot when
    /// `deref_result`, or [`NOT_FOUND`] when the key is absent or any read
    /// fails. Callers cannot distinguish "absent" from "wrong layout"; both
    /// surface as the sentinel and are retried by the watch layer.
    pub fn resolve(&self, table: Address, key: &str, deref_result: bool) -> Address {
        let Some(hmask) = self.reader.read_u32(table.wrapping_add(gctab::HMASK)) else {
            return NOT_FOUND;
        };
        let Some(nodes) = self.reader.read_u32(table.wrapping_add(gctab::NODE)) else {
            return NOT_FOUND;
        };
        if nodes == NOT_FOUND {
            return NOT_FOUND;
        }
        if !hmask.wrapping_add(1).is_power_of_two() {
            debug!(table, hmask, "hash mask is not 2^n - 1, layout offsets may be wrong");
        }

        let hash = lua_string_hash(key);
        // wrapping arithmetic: a garbage mask must end in a failed read, not
        // abort the host
        let mut node_addr = nodes.wrapping_add(node::SIZE.wrapping_mul(hash & hmask));
        // a chain can never be longer than the node array
        let mut remaining = hmask.wrapping_add(1).max(1);
        loop {
            match self.reader.read_u32(node_addr.wrapping_add(node::KEY_IT)) {
                Some(it) if it == itype::STR => {
                    let Some(key_obj) = self.reader.read_u32(node_addr.wrapping_add(node::KEY_GCR))
                    else {
                        return NOT_FOUND;
                    };
                    let Some(stored) = self.reader.read_u32(key_obj.wrapping_add(gcstr::HASH))
                    else {
                        return NOT_FOUND;
                    };
                    if stored == hash {
                        let slot = node_addr.wrapping_add(node::VAL);
                        trace!(key, slot, "key matched");
                        return if deref_result {
                            self.reader.read_u32(slot).unwrap_or(NOT_FOUND)
                        } else {
                            slot
                        };
                    }
                }
                Some(_) => {}
                None => return NOT_FOUND,
            }

            match self.reader.read_u32(node_addr.wrapping_add(node::NEXT)) {
                Some(NOT_FOUND) | None => return NOT_FOUND,
                Some(next) => node_addr = next,
            }
            remaining -= 1;
            if remaining == 0 {
                debug!(table, key, "overflow chain longer than node array, giving up");
                return NOT_FOUND;
            }
        }
    }

    /// Resolve a chain of keys, using each hop's value as the next table.
    ///
    /// Every intermediate hop is dereferenced (its value must serve as the
    /// next table's address); only the final hop honors `deref_last`. An
    /// empty key list is the identity on `root`. Short-circuits to
    /// [`NOT_FOUND`] the moment any hop misses.
    pub fn resolve_path<S: AsRef<str>>(
        &self,
        root: Address,
        keys: &[S],
        deref_last: bool,
    ) -> Address {
        let mut current = root;
        for (i, key) in keys.iter().enumerate() {
            if current == NOT_FOUND {
                return NOT_FOUND;
            }
            let deref = deref_last || i + 1 < keys.len();
            current = self.resolve(current, key.as_ref(), deref);
        }
        current
    }
}
