//! Hash-time-locked contracts
//!
//! A contract is funded by the timeout party and keyed by a SHA-256 hashlock.
//! Revealing the preimage before expiry releases the funds to the redeem
//! party; at or after expiry the timeout party reclaims them. Expiry is the
//! block `created_at_block + locktime_blocks`.
//!
//! Resolved contracts are kept as history, so a hash is never reusable.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;
use types::ids::{Address, Hash};
use types::numeric::{BlockHeight, Coin};

use crate::context::HandlerContext;
use crate::errors::HtlcError;
use crate::events::{ContractEvent, HtlcCreated, HtlcFailed, HtlcRedeemed};
use crate::store::{load_record, put_record, ReadState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HtlcStatus {
    Created,
    Redeemed,
    Failed,
}

impl HtlcStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HtlcStatus::Created => "created",
            HtlcStatus::Redeemed => "redeemed",
            HtlcStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Htlc {
    pub amount: Coin,
    pub hash: Hash,
    pub locktime_blocks: BlockHeight,
    pub redeem_address: Address,
    pub timeout_address: Address,
    pub status: HtlcStatus,
    pub created_at_block: BlockHeight,
}

impl Htlc {
    /// First block at which the contract is expired.
    pub fn expires_at(&self) -> BlockHeight {
        self.created_at_block.saturating_add(self.locktime_blocks)
    }

    pub fn is_expired(&self, height: BlockHeight) -> bool {
        height >= self.expires_at()
    }
}

// ───────────────────────── Messages ─────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddHtlc {
    pub amount: Coin,
    pub hash: Hash,
    pub locktime_blocks: BlockHeight,
    pub redeem_address: Address,
    pub timeout_address: Address,
}

impl AddHtlc {
    pub fn validate_basic(&self) -> Result<(), HtlcError> {
        if !self.amount.is_positive() {
            return Err(HtlcError::InvalidMessage(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.locktime_blocks <= 0 {
            return Err(HtlcError::InvalidMessage(format!(
                "locktime must be positive, got {}",
                self.locktime_blocks
            )));
        }
        if self.redeem_address.is_empty() || self.timeout_address.is_empty() {
            return Err(HtlcError::InvalidMessage("party address is empty".to_string()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.timeout_address.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemHtlc {
    pub preimage: Vec<u8>,
    pub caller: Address,
}

impl RedeemHtlc {
    pub fn validate_basic(&self) -> Result<(), HtlcError> {
        if self.preimage.is_empty() {
            return Err(HtlcError::InvalidMessage("preimage is empty".to_string()));
        }
        if self.caller.is_empty() {
            return Err(HtlcError::InvalidMessage("caller address is empty".to_string()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.caller.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailHtlc {
    pub hash: Hash,
    pub caller: Address,
}

impl FailHtlc {
    pub fn validate_basic(&self) -> Result<(), HtlcError> {
        if self.caller.is_empty() {
            return Err(HtlcError::InvalidMessage("caller address is empty".to_string()));
        }
        Ok(())
    }

    pub fn signers(&self) -> Vec<Address> {
        vec![self.caller.clone()]
    }
}

/// SHA-256 hashlock of a preimage.
pub fn hashlock(preimage: &[u8]) -> Hash {
    Hash::new(Sha256::digest(preimage).into())
}

fn htlc_key(hash: &Hash) -> Vec<u8> {
    hash.to_hex().into_bytes()
}

fn load_created<S: ReadState + ?Sized>(state: &S, hash: &Hash) -> Result<Htlc, HtlcError> {
    let htlc: Htlc = load_record(state, &htlc_key(hash))?.ok_or(HtlcError::NotFound(*hash))?;
    if htlc.status != HtlcStatus::Created {
        return Err(HtlcError::AlreadyResolved {
            hash: *hash,
            status: htlc.status.as_str().to_string(),
        });
    }
    Ok(htlc)
}

/// Look up a contract by hashlock, resolved or not.
pub fn get_htlc<S: ReadState + ?Sized>(state: &S, hash: &Hash) -> Result<Htlc, HtlcError> {
    load_record(state, &htlc_key(hash))?.ok_or(HtlcError::NotFound(*hash))
}

// ───────────────────────── Engine ─────────────────────────

/// HTLC handlers. Stateless: everything lives in the module namespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtlcEngine;

impl HtlcEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn add(&self, ctx: HandlerContext<'_>, msg: &AddHtlc) -> Result<ContractEvent, HtlcError> {
        let HandlerContext { block, state, bank } = ctx;
        msg.validate_basic()?;

        let key = htlc_key(&msg.hash);
        if state.has(&key) {
            return Err(HtlcError::DuplicateHash(msg.hash));
        }

        bank.debit(&msg.timeout_address, &msg.amount)?;

        let htlc = Htlc {
            amount: msg.amount.clone(),
            hash: msg.hash,
            locktime_blocks: msg.locktime_blocks,
            redeem_address: msg.redeem_address.clone(),
            timeout_address: msg.timeout_address.clone(),
            status: HtlcStatus::Created,
            created_at_block: block.current_block_height(),
        };
        put_record(state, &key, &htlc);

        debug!(
            hash = %htlc.hash,
            amount = %htlc.amount,
            expires_at = htlc.expires_at(),
            "htlc created"
        );
        Ok(ContractEvent::HtlcCreated(HtlcCreated {
            hash: htlc.hash,
            expires_at: htlc.expires_at(),
            amount: htlc.amount,
            redeem_address: htlc.redeem_address,
            timeout_address: htlc.timeout_address,
        }))
    }

    pub fn redeem(
        &self,
        ctx: HandlerContext<'_>,
        msg: &RedeemHtlc,
    ) -> Result<ContractEvent, HtlcError> {
        let HandlerContext { block, state, bank } = ctx;
        msg.validate_basic()?;

        let hash = hashlock(&msg.preimage);
        let mut htlc = load_created(&*state, &hash)?;
        if msg.caller != htlc.redeem_address {
            return Err(HtlcError::Unauthorized(format!(
                "{} is not the redeem address of {}",
                msg.caller, hash
            )));
        }
        let current = block.current_block_height();
        if htlc.is_expired(current) {
            return Err(HtlcError::Expired {
                expires_at: htlc.expires_at(),
                current,
            });
        }

        bank.credit(&htlc.redeem_address, &htlc.amount)?;
        htlc.status = HtlcStatus::Redeemed;
        put_record(state, &htlc_key(&hash), &htlc);

        debug!(%hash, height = current, "htlc redeemed");
        Ok(ContractEvent::HtlcRedeemed(HtlcRedeemed {
            hash,
            preimage: msg.preimage.clone(),
            redeem_address: htlc.redeem_address,
            amount: htlc.amount,
        }))
    }

    pub fn fail(
        &self,
        ctx: HandlerContext<'_>,
        msg: &FailHtlc,
    ) -> Result<ContractEvent, HtlcError> {
        let HandlerContext { block, state, bank } = ctx;
        msg.validate_basic()?;

        let mut htlc = load_created(&*state, &msg.hash)?;
        if msg.caller != htlc.timeout_address {
            return Err(HtlcError::Unauthorized(format!(
                "{} is not the timeout address of {}",
                msg.caller, msg.hash
            )));
        }
        let current = block.current_block_height();
        if !htlc.is_expired(current) {
            return Err(HtlcError::NotYetExpired {
                expires_at: htlc.expires_at(),
                current,
            });
        }

        bank.credit(&htlc.timeout_address, &htlc.amount)?;
        htlc.status = HtlcStatus::Failed;
        put_record(state, &htlc_key(&msg.hash), &htlc);

        debug!(hash = %msg.hash, height = current, "htlc failed");
        Ok(ContractEvent::HtlcFailed(HtlcFailed {
            hash: msg.hash,
            timeout_address: htlc.timeout_address,
            amount: htlc.amount,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::{BalanceLedger, MemoryBank};
    use crate::context::BlockInfo;
    use crate::store::MemoryStore;

    struct Harness {
        store: MemoryStore,
        bank: MemoryBank,
        engine: HtlcEngine,
    }

    impl Harness {
        fn new() -> Self {
            let mut bank = MemoryBank::new();
            bank.fund(&alice(), &Coin::new("stake", 100)).unwrap();
            Self {
                store: MemoryStore::new(),
                bank,
                engine: HtlcEngine::new(),
            }
        }

        fn add(&mut self, height: BlockHeight, msg: &AddHtlc) -> Result<ContractEvent, HtlcError> {
            let block = BlockInfo::new(height, "test-chain");
            let ctx = HandlerContext {
                block: &block,
                state: &mut self.store,
                bank: &mut self.bank,
            };
            self.engine.add(ctx, msg)
        }

        fn redeem(
            &mut self,
            height: BlockHeight,
            preimage: &[u8],
            caller: &Address,
        ) -> Result<ContractEvent, HtlcError> {
            let block = BlockInfo::new(height, "test-chain");
            let msg = RedeemHtlc {
                preimage: preimage.to_vec(),
                caller: caller.clone(),
            };
            let ctx = HandlerContext {
                block: &block,
                state: &mut self.store,
                bank: &mut self.bank,
            };
            self.engine.redeem(ctx, &msg)
        }

        fn fail(
            &mut self,
            height: BlockHeight,
            hash: Hash,
            caller: &Address,
        ) -> Result<ContractEvent, HtlcError> {
            let block = BlockInfo::new(height, "test-chain");
            let msg = FailHtlc {
                hash,
                caller: caller.clone(),
            };
            let ctx = HandlerContext {
                block: &block,
                state: &mut self.store,
                bank: &mut self.bank,
            };
            self.engine.fail(ctx, &msg)
        }
    }

    fn alice() -> Address {
        Address::new("alice")
    }

    fn bob() -> Address {
        Address::new("bob")
    }

    fn add_msg() -> AddHtlc {
        AddHtlc {
            amount: Coin::new("stake", 50),
            hash: hashlock(b"secret"),
            locktime_blocks: 10,
            redeem_address: bob(),
            timeout_address: alice(),
        }
    }

    #[test]
    fn test_add_debits_timeout_party() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        assert_eq!(h.bank.balance(&alice(), "stake"), 50);

        let htlc = get_htlc(&h.store, &hashlock(b"secret")).unwrap();
        assert_eq!(htlc.status, HtlcStatus::Created);
        assert_eq!(htlc.expires_at(), 110);
    }

    #[test]
    fn test_duplicate_hash_rejected() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        assert!(matches!(h.add(101, &add_msg()), Err(HtlcError::DuplicateHash(_))));
        assert_eq!(h.bank.balance(&alice(), "stake"), 50);
    }

    #[test]
    fn test_add_insufficient_funds() {
        let mut h = Harness::new();
        let mut msg = add_msg();
        msg.amount = Coin::new("stake", 500);
        assert!(matches!(h.add(100, &msg), Err(HtlcError::Bank(_))));
        assert!(h.store.is_empty());
    }

    #[test]
    fn test_redeem_boundary() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        assert!(matches!(
            h.redeem(110, b"secret", &bob()),
            Err(HtlcError::Expired { expires_at: 110, current: 110 })
        ));
        h.redeem(109, b"secret", &bob()).unwrap();
        assert_eq!(h.bank.balance(&bob(), "stake"), 50);
    }

    #[test]
    fn test_fail_boundary() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        let hash = hashlock(b"secret");
        assert!(matches!(
            h.fail(109, hash, &alice()),
            Err(HtlcError::NotYetExpired { .. })
        ));
        h.fail(110, hash, &alice()).unwrap();
        assert_eq!(h.bank.balance(&alice(), "stake"), 100);
    }

    #[test]
    fn test_redeem_then_fail_is_already_resolved() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        h.redeem(105, b"secret", &bob()).unwrap();
        assert!(matches!(
            h.fail(200, hashlock(b"secret"), &alice()),
            Err(HtlcError::AlreadyResolved { .. })
        ));
        assert!(matches!(
            h.redeem(106, b"secret", &bob()),
            Err(HtlcError::AlreadyResolved { .. })
        ));
    }

    #[test]
    fn test_wrong_preimage_and_wrong_caller() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        assert!(matches!(
            h.redeem(101, b"guess", &bob()),
            Err(HtlcError::NotFound(_))
        ));
        assert!(matches!(
            h.redeem(101, b"secret", &alice()),
            Err(HtlcError::Unauthorized(_))
        ));
        assert!(matches!(
            h.fail(200, hashlock(b"secret"), &bob()),
            Err(HtlcError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_resolved_hash_not_reusable() {
        let mut h = Harness::new();
        h.add(100, &add_msg()).unwrap();
        h.fail(110, hashlock(b"secret"), &alice()).unwrap();
        assert!(matches!(h.add(120, &add_msg()), Err(HtlcError::DuplicateHash(_))));
    }

    #[test]
    fn test_validate_basic() {
        let mut msg = add_msg();
        msg.locktime_blocks = 0;
        assert!(matches!(msg.validate_basic(), Err(HtlcError::InvalidMessage(_))));
        assert_eq!(add_msg().signers(), vec![alice()]);

        let redeem = RedeemHtlc {
            preimage: vec![],
            caller: bob(),
        };
        assert!(redeem.validate_basic().is_err());
    }
}
