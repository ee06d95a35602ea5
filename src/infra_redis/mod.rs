mod revocation_cache_redis;

pub use revocation_cache_redis::*;
