pub mod block;
pub mod bytes;
pub mod coin;
pub mod coin_record;
pub mod coin_spend;
pub mod program;
pub mod spend_bundle;
pub mod streamable;

pub use block::Block;
pub use bytes::{Bytes, Bytes32, Bytes48, Bytes96};
pub use coin::Coin;
pub use coin_record::CoinRecord;
pub use coin_spend::CoinSpend;
pub use program::Program;
pub use spend_bundle::SpendBundle;

/// Aggregate-signature public key, opaque to the engine. The verifier
/// collaborator owns its meaning.
pub type PublicKey = Bytes48;

/// Aggregated signature, opaque to the engine.
pub type Signature = Bytes96;
