mod argon2_hasher;
mod auth_service_impl;
mod jwt_codec;
mod user_service_impl;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use jwt_codec::*;
pub use user_service_impl::*;
