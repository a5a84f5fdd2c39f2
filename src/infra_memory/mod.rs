mod memory_db;
mod refresh_token_store_memory;
mod revoked_token_store_memory;
mod user_store_memory;

pub use memory_db::{MemoryDatabase, MemoryTables, MemoryTx};
pub use refresh_token_store_memory::*;
pub use revoked_token_store_memory::*;
pub use user_store_memory::*;
