// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::constants::PHONY_TOKEN_DELEGATE;
use crate::domain::error::SimulationError;
use crate::domain::request::AccountOverlay;
use alloy::primitives::{Address, Bytes, U256};
use std::future::Future;

/// Run the trader contract code at `trader` for one query, optionally seeding
/// a native balance the account does not really hold.
pub fn trader_overlay(
    trader: Address,
    trader_code: Bytes,
    native_balance: Option<U256>,
) -> AccountOverlay {
    let overlay = AccountOverlay::new().with_code(trader, trader_code);
    match native_balance {
        Some(balance) => overlay.with_balance(trader, balance),
        None => overlay,
    }
}

/// Let the trader appear to hold `mint` more of `token` than it owns.
///
/// The token's code is swapped for the mint-aware double and the real code is
/// parked at [`PHONY_TOKEN_DELEGATE`], where the double forwards every call it
/// does not special-case. Zero mint leaves the token untouched and never
/// fetches its code. A codeless token still gets both entries; the delegate
/// then holds empty code and forwarded calls fail inside the query.
pub async fn token_mint_overlay<F, Fut>(
    token: Address,
    phony_code: Bytes,
    mint: U256,
    fetch_original_code: F,
) -> Result<AccountOverlay, SimulationError>
where
    F: FnOnce(Address) -> Fut,
    Fut: Future<Output = Result<Bytes, SimulationError>>,
{
    if mint.is_zero() {
        return Ok(AccountOverlay::new());
    }
    if token == PHONY_TOKEN_DELEGATE {
        return Err(SimulationError::validation(
            "token",
            format!("{token:#x} collides with the delegate slot"),
        ));
    }
    let original = fetch_original_code(token).await?;
    if original.is_empty() {
        tracing::debug!(target: "simulation", %token, "minting a token with no code");
    }
    Ok(AccountOverlay::new()
        .with_code(token, phony_code)
        .with_code(PHONY_TOKEN_DELEGATE, original))
}

/// Swap the settlement's authorization policy for the permissive double.
pub fn authenticator_overlay(authenticator: Address, permissive_code: Bytes) -> AccountOverlay {
    AccountOverlay::new().with_code(authenticator, permissive_code)
}

/// How much has to be minted so `holder_balance` covers `required`.
pub fn mint_shortfall(required: U256, holder_balance: U256) -> U256 {
    required.saturating_sub(holder_balance)
}
