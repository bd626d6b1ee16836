//! Remote resolution: hash-table walks and pointer-path dereference chains.

mod pointer;
mod table;

pub use pointer::PointerPathResolver;
pub use table::TableResolver;
