//! Structure layout of the target runtime (LuaJIT 2.x, x86, non-GC64).
//!
//! These offsets are the contract between the resolvers and the foreign
//! address space. They are fixed properties of the runtime build being read;
//! if the target ever switches to a GC64 build, every constant here changes.

/// Tagged value cell (`TValue`): 8 bytes, payload word first.
pub mod tvalue {
    pub const SIZE: u32 = 8;

    /// Offset of the itype tag word within the cell.
    pub const IT: u32 = 4;
}

/// Table object (`GCtab`).
pub mod gctab {
    /// Offset of the hash-part node array pointer.
    pub const NODE: u32 = 20;

    /// Offset of the hash mask. `hmask + 1` is the bucket count, always a
    /// power of two; bucket index = `hash & hmask`.
    pub const HMASK: u32 = 28;
}

/// Hash-part node (`Node`): value cell, key cell, overflow link.
pub mod node {
    pub const SIZE: u32 = 24;

    /// Value cell of the node.
    pub const VAL: u32 = 0;

    /// Low word of the key cell: GC reference to the key's string object.
    pub const KEY_GCR: u32 = 8;

    /// High word of the key cell: itype tag of the key.
    pub const KEY_IT: u32 = 12;

    /// Next node in this bucket's overflow chain; 0 at the chain tail.
    pub const NEXT: u32 = 16;
}

/// Interned string object (`GCstr`).
pub mod gcstr {
    /// Precomputed hash of the string contents.
    pub const HASH: u32 = 8;

    /// Byte length of the string.
    pub const LEN: u32 = 12;

    /// Character data follows the header.
    pub const DATA: u32 = 16;
}

/// itype tags (the bit-inverted small type numbers of the runtime).
pub mod itype {
    pub const NIL: u32 = 0xFFFF_FFFF;
    pub const FALSE: u32 = 0xFFFF_FFFE;
    pub const TRUE: u32 = 0xFFFF_FFFD;
    pub const STR: u32 = 0xFFFF_FFFB;
    pub const TAB: u32 = 0xFFFF_FFF4;
}
