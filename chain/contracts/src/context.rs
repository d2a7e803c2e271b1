//! Per-message execution context
//!
//! Everything a handler may touch is passed in explicitly: the block it runs
//! in, its module's state namespace, and the account layer (balances plus
//! auth-layer sequences). Handlers hold no ambient state.

use serde::{Deserialize, Serialize};
use types::numeric::BlockHeight;

use crate::bank::Accounts;
use crate::store::StateAccessor;

/// Block the message is delivered in, supplied by the consensus layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: BlockHeight,
    pub chain_id: String,
}

impl BlockInfo {
    pub fn new(height: BlockHeight, chain_id: impl Into<String>) -> Self {
        Self {
            height,
            chain_id: chain_id.into(),
        }
    }

    pub fn current_block_height(&self) -> BlockHeight {
        self.height
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }
}

/// Collaborators handed to one handler invocation.
pub struct HandlerContext<'a> {
    pub block: &'a BlockInfo,
    pub state: &'a mut dyn StateAccessor,
    pub bank: &'a mut dyn Accounts,
}
