mod housekeeper;
mod server;

pub use housekeeper::*;
pub use server::*;
