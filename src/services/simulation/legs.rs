// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::data::contracts::ERC20;
use crate::domain::scenario::{Interaction, InteractionBatch, VenueCall};
use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;

/// Approve `spender` for the maximum amount of `token_in`, then call the
/// venue. No post-trade phase.
pub fn two_step(
    token_in: Address,
    spender: Address,
    exchange: Address,
    exchange_calldata: Bytes,
) -> InteractionBatch {
    let approve = ERC20::approveCall {
        spender,
        amount: U256::MAX,
    }
    .abi_encode();
    InteractionBatch {
        pre: vec![Interaction::call(token_in, approve)],
        trade: vec![Interaction::call(exchange, exchange_calldata)],
        post: Vec::new(),
    }
}

pub fn venue_two_step(token_in: Address, venue: &VenueCall) -> InteractionBatch {
    two_step(
        token_in,
        venue.spender,
        venue.exchange,
        venue.call_data.clone(),
    )
}
