use crate::conditions::Condition;
use crate::npc::Npc;
use sable_protocol::{Bytes, Bytes32, PublicKey, Signature};
use sha2::{Digest, Sha256};

/// The message actually verified for an AGG_SIG_ME condition: the emitted
/// message bound to the ID of the coin that emitted it.
pub fn agg_sig_me_message(msg: &[u8], coin_id: Bytes32) -> Bytes {
    let mut hasher = Sha256::new();
    hasher.update(msg);
    hasher.update(coin_id);
    let digest: [u8; 32] = hasher.finalize().into();
    Bytes::from(&digest[..])
}

/// Collect every signature obligation in a bundle, in deterministic order:
/// spend order, then opcode order, then occurrence order. The single
/// aggregated signature must cover exactly these pairs.
pub fn agg_sig_pairs(npc_list: &[Npc]) -> Vec<(PublicKey, Bytes)> {
    let mut pairs = Vec::<(PublicKey, Bytes)>::new();
    for npc in npc_list {
        for conds in npc.conditions.values() {
            for c in conds {
                match c {
                    Condition::AggSigMe(pk, msg) => {
                        pairs.push((*pk, agg_sig_me_message(msg, npc.coin_id)));
                    }
                    Condition::AggSig(pk, msg) => {
                        pairs.push((*pk, msg.clone()));
                    }
                    _ => {}
                }
            }
        }
    }
    pairs
}

/// The signature scheme collaborator. The engine is opinion-free about the
/// scheme; the node plugs its production implementation in here, and tests
/// use a deterministic stand-in.
pub trait AggregateVerifier {
    /// Check one aggregated signature against all collected
    /// (pubkey, message) pairs.
    fn verify_aggregate(&self, pairs: &[(PublicKey, Bytes)], signature: &Signature) -> bool;

    /// Combine signatures when bundles are joined by the block builder.
    fn aggregate(&self, signatures: &[Signature]) -> Signature;
}
