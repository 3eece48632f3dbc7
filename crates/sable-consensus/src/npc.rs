use crate::conditions::{Condition, ConditionsByOpcode};
use crate::opcodes::{CREATE_ANNOUNCEMENT, CREATE_COIN, RESERVE_FEE};
use sable_protocol::{Bytes32, Coin};
use sha2::{Digest, Sha256};

/// The ID of an announcement created by `coin_id` with message `msg`.
pub fn announcement_id(coin_id: Bytes32, msg: &[u8]) -> Bytes32 {
    let mut hasher = Sha256::new();
    hasher.update(coin_id);
    hasher.update(msg);
    let id: [u8; 32] = hasher.finalize().into();
    Bytes32::new(id)
}

/// Name-puzzle-conditions: the per-coin result of running and classifying
/// one spend of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Npc {
    pub coin_id: Bytes32,
    /// tree hash of the revealed puzzle; must match the spent coin
    pub puzzle_hash: Bytes32,
    pub conditions: ConditionsByOpcode,
}

impl Npc {
    /// The coins this spend creates. Their parent is the spent coin.
    pub fn created_coins(&self) -> Vec<Coin> {
        let Some(creates) = self.conditions.get(&CREATE_COIN) else {
            return Vec::new();
        };
        creates
            .iter()
            .filter_map(|c| match c {
                Condition::CreateCoin(puzzle_hash, amount) => {
                    Some(Coin::new(self.coin_id, *puzzle_hash, *amount))
                }
                _ => None,
            })
            .collect()
    }

    /// Sum of this spend's RESERVE_FEE demands. Saturating: an impossible
    /// demand only makes the bundle fail the fee check.
    pub fn reserve_fee(&self) -> u64 {
        let Some(reserves) = self.conditions.get(&RESERVE_FEE) else {
            return 0;
        };
        reserves.iter().fold(0_u64, |acc, c| match c {
            Condition::ReserveFee(amount) => acc.saturating_add(*amount),
            _ => acc,
        })
    }

    /// IDs of the announcements this spend creates.
    pub fn announcement_ids(&self) -> Vec<Bytes32> {
        let Some(announces) = self.conditions.get(&CREATE_ANNOUNCEMENT) else {
            return Vec::new();
        };
        announces
            .iter()
            .filter_map(|c| match c {
                Condition::CreateAnnouncement(msg) => Some(announcement_id(self.coin_id, msg)),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_protocol::Bytes;

    fn npc_with(conds: &[Condition]) -> Npc {
        let mut by_opcode = ConditionsByOpcode::new();
        for c in conds {
            by_opcode.entry(c.opcode()).or_default().push(c.clone());
        }
        Npc {
            coin_id: Bytes32::new([0xaa; 32]),
            puzzle_hash: Bytes32::new([0xbb; 32]),
            conditions: by_opcode,
        }
    }

    #[test]
    fn created_coins_have_spend_as_parent() {
        let ph = Bytes32::new([0x11; 32]);
        let npc = npc_with(&[
            Condition::CreateCoin(ph, 100),
            Condition::CreateCoin(ph, 200),
        ]);
        let coins = npc.created_coins();
        assert_eq!(coins.len(), 2);
        assert_eq!(coins[0], Coin::new(npc.coin_id, ph, 100));
        assert_eq!(coins[1], Coin::new(npc.coin_id, ph, 200));
    }

    #[test]
    fn reserve_fee_accumulates_and_saturates() {
        let npc = npc_with(&[Condition::ReserveFee(10), Condition::ReserveFee(5)]);
        assert_eq!(npc.reserve_fee(), 15);
        let npc = npc_with(&[
            Condition::ReserveFee(u64::MAX),
            Condition::ReserveFee(u64::MAX),
        ]);
        assert_eq!(npc.reserve_fee(), u64::MAX);
        let npc = npc_with(&[]);
        assert_eq!(npc.reserve_fee(), 0);
    }

    #[test]
    fn announcement_ids_match_hash() {
        let npc = npc_with(&[Condition::CreateAnnouncement(Bytes::from(&b"msg"[..]))]);
        let ids = npc.announcement_ids();
        assert_eq!(ids, vec![announcement_id(npc.coin_id, b"msg")]);

        let mut hasher = Sha256::new();
        hasher.update([0xaa; 32]);
        hasher.update(b"msg");
        assert_eq!(ids[0].to_bytes(), <[u8; 32]>::from(hasher.finalize()));
    }
}
