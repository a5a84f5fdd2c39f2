mod refresh_token_store_mysql;
mod revoked_token_store_mysql;
mod user_store_mysql;

pub use refresh_token_store_mysql::*;
pub use revoked_token_store_mysql::*;
pub use user_store_mysql::*;

mod repo_tx_mysql;

pub use repo_tx_mysql::*;

mod util;
