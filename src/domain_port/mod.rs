// store

mod revocation_cache;

pub use revocation_cache::*;

// repo

mod credential_store;

pub use credential_store::*;
