// Constants for the heap script interpreter

/// Starting address for heap allocations
/// Addresses start at 0x10000000 so they read as addresses, not small numbers
pub const HEAP_ADDRESS_START: u64 = 0x1000_0000;

/// Addresses advance by the node's initial size rounded up to this alignment
pub const NODE_ALIGNMENT: usize = 16;

/// Default heap limit: 10 MB of intrinsic node size
pub const DEFAULT_HEAP_LIMIT: usize = 10 * 1024 * 1024;

/// Default snapshot history limit: 256 MB
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 256 * 1024 * 1024;
