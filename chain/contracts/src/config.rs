//! Module configuration

use serde::{Deserialize, Serialize};

/// Default denomination for account-output births.
pub const DEFAULT_NATIVE_DENOM: &str = "stake";

/// How UTXO spends are authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WitnessPolicy {
    /// The message envelope already authenticated `signer`; witnesses are
    /// carried but not checked.
    #[default]
    Envelope,
    /// Every input witness must be a valid signature over the transaction
    /// hash by a key whose address is the authorized spender.
    Verify,
}

/// Configuration shared by the ledger modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleConfig {
    /// The only denomination `BirthOutput` accepts; UTXO values are in it.
    pub native_denom: String,
    #[serde(default)]
    pub witness_policy: WitnessPolicy,
}

impl ModuleConfig {
    /// Create a config with sensible defaults.
    pub fn new(native_denom: impl Into<String>) -> Self {
        Self {
            native_denom: native_denom.into(),
            witness_policy: WitnessPolicy::Envelope,
        }
    }

    pub fn with_witness_policy(mut self, policy: WitnessPolicy) -> Self {
        self.witness_policy = policy;
        self
    }
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NATIVE_DENOM)
    }
}
