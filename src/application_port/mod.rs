mod auth_service;
mod runtime;

pub use auth_service::*;
pub use runtime::*;
