pub mod check_conditions;
pub mod coin_store;
pub mod mempool;
pub mod mempool_item;
pub mod pool;

pub use coin_store::CoinStore;
pub use mempool::{AddResult, MempoolManager};
pub use mempool_item::MempoolItem;
pub use pool::Pool;
