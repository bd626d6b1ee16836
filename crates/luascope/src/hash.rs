//! Interned-string hash of the target runtime.
//!
//! LuaJIT stores the hash of every interned string inside its GCstr header
//! and uses it to pick the hash-part bucket of a table. Remote lookups only
//! work if this function reproduces that hash bit for bit: a single
//! divergent bit lands in the wrong bucket and resolves to nothing (or, in
//! the worst case, to a plausible but wrong slot).

/// Hash a key string exactly as the target runtime interns it.
///
/// A Bob-Jenkins-style mix over little-endian 4-byte chunks. All arithmetic
/// is wrapping u32; `rotate_left` keeps every shift width at 32 bits, which
/// is where a careless port to wider integers silently diverges.
pub fn lua_string_hash(key: &str) -> u32 {
    let bytes = key.as_bytes();
    let len = bytes.len();
    if len == 0 {
        return 0;
    }

    let mut h = len as u32;
    let mut a: u32;
    let mut b: u32;
    if len >= 4 {
        a = word_at(bytes, 0);
        h ^= word_at(bytes, len - 4);
        b = word_at(bytes, (len >> 1) - 2);
        h ^= b;
        h = h.wrapping_sub(b.rotate_left(14));
        b = b.wrapping_add(word_at(bytes, (len >> 2) - 1));
    } else {
        a = u32::from(bytes[0]);
        h ^= u32::from(bytes[len - 1]);
        b = u32::from(bytes[len >> 1]);
        h ^= b;
        h = h.wrapping_sub(b.rotate_left(14));
    }

    a ^= h;
    a = a.wrapping_sub(h.rotate_left(11));
    b ^= a;
    b = b.wrapping_sub(a.rotate_left(25));
    h ^= b;
    h.wrapping_sub(b.rotate_left(16))
}

/// Little-endian u32 at a byte offset. Callers guarantee `offset + 4 <= len`.
fn word_at(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(word)
}
