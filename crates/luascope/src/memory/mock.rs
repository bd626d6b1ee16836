//! Test doubles for remote memory.
//!
//! [`MockMemory`] is a word-addressed map standing in for the target address
//! space. [`MockMemoryBuilder`] lays out synthetic runtime structures
//! (tables, nodes, interned strings) exactly per [`layout`](super::layout),
//! so resolver tests walk the same shapes the live runtime would present.

use std::collections::HashMap;

use super::layout::{gcstr, gctab, itype, node};
use super::{Address, ReadMemory};
use crate::hash::lua_string_hash;

/// In-memory stand-in for the target address space. Reads of words that were
/// never written fail, just like reads of unmapped remote pages.
#[derive(Debug, Default)]
pub struct MockMemory {
    words: HashMap<Address, u32>,
}

impl MockMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u32(&mut self, addr: Address, value: u32) {
        self.words.insert(addr, value);
    }

    pub fn write_f64(&mut self, addr: Address, value: f64) {
        let bits = value.to_bits();
        self.write_u32(addr, bits as u32);
        self.write_u32(addr + 4, (bits >> 32) as u32);
    }

    /// Drop a word, turning later reads of it into failures.
    pub fn unmap(&mut self, addr: Address) {
        self.words.remove(&addr);
    }
}

impl ReadMemory for MockMemory {
    fn read_u32(&self, addr: Address) -> Option<u32> {
        self.words.get(&addr).copied()
    }
}

/// Lays out synthetic runtime structures in a [`MockMemory`].
pub struct MockMemoryBuilder {
    mem: MockMemory,
    next: Address,
}

/// TValue word pair for a number.
pub fn number_words(value: f64) -> (u32, u32) {
    let bits = value.to_bits();
    (bits as u32, (bits >> 32) as u32)
}

/// TValue word pair for a reference to a table object.
pub fn table_words(table: Address) -> (u32, u32) {
    (table, itype::TAB)
}

impl MockMemoryBuilder {
    pub fn new() -> Self {
        Self {
            mem: MockMemory::new(),
            next: 0x0040_0000,
        }
    }

    /// Reserve an address range, 8-aligned like runtime allocations.
    pub fn alloc(&mut self, size: u32) -> Address {
        let addr = self.next;
        self.next += size.next_multiple_of(8);
        addr
    }

    /// Intern a key string: a GCstr header carrying the precomputed hash.
    pub fn intern(&mut self, key: &str) -> Address {
        let addr = self.alloc(gcstr::DATA + key.len() as u32 + 1);
        self.mem.write_u32(addr + gcstr::HASH, lua_string_hash(key));
        self.mem.write_u32(addr + gcstr::LEN, key.len() as u32);
        addr
    }

    /// Lay out a table whose hash part holds the given string-keyed entries.
    /// Each entry is `(key, value_lo, value_hi)`; keys landing in an occupied
    /// bucket are linked onto that bucket's overflow chain. Returns the table
    /// address.
    pub fn table(&mut self, hmask: u32, entries: &[(&str, u32, u32)]) -> Address {
        let tab = self.alloc(32);
        let nodes = self.alloc(node::SIZE * (hmask + 1));
        self.mem.write_u32(tab + gctab::NODE, nodes);
        self.mem.write_u32(tab + gctab::HMASK, hmask);
        for i in 0..=hmask {
            let n = nodes + node::SIZE * i;
            self.mem.write_u32(n + node::KEY_IT, itype::NIL);
            self.mem.write_u32(n + node::NEXT, 0);
        }

        for &(key, lo, hi) in entries {
            let main = nodes + node::SIZE * (lua_string_hash(key) & hmask);
            let slot = if self.mem.read_u32(main + node::KEY_IT) == Some(itype::NIL) {
                main
            } else {
                let n = self.alloc(node::SIZE);
                let old_next = self.mem.read_u32(main + node::NEXT).unwrap_or(0);
                self.mem.write_u32(n + node::NEXT, old_next);
                self.mem.write_u32(main + node::NEXT, n);
                n
            };
            let key_obj = self.intern(key);
            self.mem.write_u32(slot + node::KEY_GCR, key_obj);
            self.mem.write_u32(slot + node::KEY_IT, itype::STR);
            self.mem.write_u32(slot + node::VAL, lo);
            self.mem.write_u32(slot + node::VAL + 4, hi);
        }
        tab
    }

    pub fn memory(&mut self) -> &mut MockMemory {
        &mut self.mem
    }

    pub fn finish(self) -> MockMemory {
        self.mem
    }
}

impl Default for MockMemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_stores_hash_and_length() {
        let mut builder = MockMemoryBuilder::new();
        let key = builder.intern("elapsed");
        let mem = builder.finish();
        assert_eq!(mem.read_u32(key + gcstr::HASH), Some(lua_string_hash("elapsed")));
        assert_eq!(mem.read_u32(key + gcstr::LEN), Some(7));
    }

    #[test]
    fn test_table_header_words() {
        let mut builder = MockMemoryBuilder::new();
        let tab = builder.table(0x7, &[]);
        let mem = builder.finish();
        assert_eq!(mem.read_u32(tab + gctab::HMASK), Some(0x7));
        assert!(mem.read_u32(tab + gctab::NODE).unwrap() != 0);
    }
}
