use crate::bytes::Bytes32;
use crate::coin::Coin;
use crate::coin_spend::CoinSpend;
use crate::streamable::hash_of;
use crate::Signature;
use serde::{Deserialize, Serialize};

/// An ordered list of coin spends plus one aggregated signature. Admitted
/// or rejected atomically.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct SpendBundle {
    pub coin_spends: Vec<CoinSpend>,
    pub aggregated_signature: Signature,
}

impl SpendBundle {
    pub fn new(coin_spends: Vec<CoinSpend>, aggregated_signature: Signature) -> SpendBundle {
        SpendBundle {
            coin_spends,
            aggregated_signature,
        }
    }

    /// Content address of the bundle: the hash of its canonical
    /// serialization.
    pub fn name(&self) -> Bytes32 {
        hash_of(self)
    }

    /// The coins this bundle consumes, in spend order.
    pub fn removals(&self) -> Vec<Coin> {
        self.coin_spends.iter().map(|cs| cs.coin).collect()
    }

    /// IDs of the coins this bundle consumes, in spend order.
    pub fn removal_ids(&self) -> Vec<Bytes32> {
        self.coin_spends.iter().map(|cs| cs.coin.coin_id()).collect()
    }

    /// Join several bundles into one. The combined signature is produced by
    /// the signature scheme, which lives behind the verifier seam, so it is
    /// passed in.
    pub fn join(bundles: &[SpendBundle], aggregated_signature: Signature) -> SpendBundle {
        let mut coin_spends = Vec::<CoinSpend>::new();
        for sb in bundles {
            coin_spends.extend_from_slice(&sb.coin_spends[..]);
        }
        SpendBundle {
            coin_spends,
            aggregated_signature,
        }
    }
}
