mod argon2_hasher;
mod auth_service_impl;
mod jwt_token_issuer;
mod runtime_impl;

pub use argon2_hasher::*;
pub use auth_service_impl::*;
pub use jwt_token_issuer::*;
pub use runtime_impl::*;
