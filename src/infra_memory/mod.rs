mod credential_store_memory;
mod revocation_cache_memory;

pub use credential_store_memory::*;
pub use revocation_cache_memory::*;
