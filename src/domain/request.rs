// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::error::SimulationError;
use alloy::primitives::{Address, Bytes, TxKind, U256};
use alloy::rpc::types::eth::state::{StateOverride, StateOverridesBuilder};
use alloy::rpc::types::eth::{TransactionInput, TransactionRequest};
use std::collections::BTreeMap;

/// Read-only call envelope. `from` is optional; views are issued without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

impl CallRequest {
    pub fn view(to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from: None,
            to,
            data: data.into(),
        }
    }

    /// Call a contract as itself (the trader runs as its own sender).
    pub fn self_call(account: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from: Some(account),
            to: account,
            data: data.into(),
        }
    }

    pub fn to_transaction_request(&self) -> TransactionRequest {
        TransactionRequest {
            from: self.from,
            to: Some(TxKind::Call(self.to)),
            input: TransactionInput::new(self.data.clone()),
            ..Default::default()
        }
    }
}

/// Replacement code and/or balance for one account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountPatch {
    pub code: Option<Bytes>,
    pub balance: Option<U256>,
}

/// Transient per-query state substitution keyed by account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountOverlay {
    accounts: BTreeMap<Address, AccountPatch>,
}

impl AccountOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, address: Address, code: impl Into<Bytes>) -> Self {
        self.accounts.entry(address).or_default().code = Some(code.into());
        self
    }

    pub fn with_balance(mut self, address: Address, balance: U256) -> Self {
        self.accounts.entry(address).or_default().balance = Some(balance);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn get(&self, address: &Address) -> Option<&AccountPatch> {
        self.accounts.get(address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.accounts.keys()
    }

    /// Union of two overlays. Both setting a different code or balance for
    /// the same account is an error.
    pub fn merge(mut self, other: AccountOverlay) -> Result<Self, SimulationError> {
        for (address, patch) in other.accounts {
            let slot = self.accounts.entry(address).or_default();
            if let Some(code) = patch.code {
                match &slot.code {
                    Some(existing) if *existing != code => {
                        return Err(SimulationError::validation(
                            "overlay",
                            format!("conflicting code overrides for {address:#x}"),
                        ));
                    }
                    _ => slot.code = Some(code),
                }
            }
            if let Some(balance) = patch.balance {
                match slot.balance {
                    Some(existing) if existing != balance => {
                        return Err(SimulationError::validation(
                            "overlay",
                            format!("conflicting balance overrides for {address:#x}"),
                        ));
                    }
                    _ => slot.balance = Some(balance),
                }
            }
        }
        Ok(self)
    }

    pub fn to_state_override(&self) -> StateOverride {
        let mut builder = StateOverridesBuilder::default();
        for (address, patch) in &self.accounts {
            if let Some(code) = &patch.code {
                builder = builder.with_code(*address, code.clone());
            }
            if let Some(balance) = patch.balance {
                builder = builder.with_balance(*address, balance);
            }
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Address = Address::repeat_byte(0xaa);
    const B: Address = Address::repeat_byte(0xbb);

    #[test]
    fn merge_combines_disjoint_and_compatible_patches() {
        let left = AccountOverlay::new().with_code(A, vec![0x60u8]);
        let right = AccountOverlay::new()
            .with_balance(A, U256::from(5u64))
            .with_code(B, vec![0x61u8]);
        let merged = left.merge(right).expect("compatible");
        assert_eq!(merged.len(), 2);
        let a = merged.get(&A).expect("A present");
        assert_eq!(a.code.as_ref().map(|c| c.to_vec()), Some(vec![0x60u8]));
        assert_eq!(a.balance, Some(U256::from(5u64)));
    }

    #[test]
    fn merge_rejects_conflicting_code() {
        let left = AccountOverlay::new().with_code(A, vec![0x60u8]);
        let right = AccountOverlay::new().with_code(A, vec![0x61u8]);
        let err = left.merge(right).unwrap_err();
        assert!(matches!(err, SimulationError::Validation { ref field, .. } if field == "overlay"));
    }

    #[test]
    fn state_override_carries_code_and_balance() {
        let overlay = AccountOverlay::new()
            .with_code(A, vec![0x60u8, 0x80])
            .with_balance(A, U256::from(10u64))
            .with_code(B, vec![0x01u8]);
        let overrides = overlay.to_state_override();
        let a = overrides.get(&A).expect("A override");
        assert_eq!(a.code.as_ref().map(|c| c.to_vec()), Some(vec![0x60, 0x80]));
        assert_eq!(a.balance, Some(U256::from(10u64)));
        assert_eq!(overrides.get(&B).and_then(|o| o.balance), None);
    }

    #[test]
    fn self_call_sets_sender_and_target() {
        let req = CallRequest::self_call(A, vec![0xde, 0xad]).to_transaction_request();
        assert_eq!(req.from, Some(A));
        assert_eq!(req.to, Some(TxKind::Call(A)));
        assert_eq!(
            req.input.input().map(|b| b.to_vec()),
            Some(vec![0xde, 0xad])
        );
    }
}
