// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

//! Direct-trade preflight: sell `amount` of a token for the wrapped native
//! asset through one router, then settle the same trade, then check the
//! native -> token -> native roundtrip. Stages run in order and the first
//! failure ends the pipeline.

use crate::common::parsing::{format_token_amount, parse_token_amount};
use crate::data::contracts::UniV2Router;
use crate::domain::error::SimulationError;
use crate::domain::scenario::{
    DirectRoundtripScenario, DirectSettlementScenario, DirectSettlementSimulation,
    DirectTradeScenario, TradeSimulation, VenueCall,
};
use crate::network::ledger::Ledger;
use crate::services::simulation::SimulationEngine;
use crate::services::simulation::overlay::mint_shortfall;
use alloy::primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use std::fmt;
use thiserror::Error;

const NATIVE_DECIMALS: u8 = 18;

/// Where the preflight trades and what it trades against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreflightVenue {
    pub router: Address,
    pub wrapped_native: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightRequest {
    pub trader: Address,
    pub token: Address,
    /// Decimal amount of `token` to sell, e.g. "1000".
    pub amount: String,
    /// Decimal amount of native asset seeded for the roundtrip.
    pub native_amount: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreflightStage {
    Metadata,
    Trade,
    Settlement,
    Roundtrip,
}

impl fmt::Display for PreflightStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Metadata => "metadata",
            Self::Trade => "trade",
            Self::Settlement => "settlement",
            Self::Roundtrip => "roundtrip",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PreflightError {
    pub stage: PreflightStage,
    #[source]
    pub source: SimulationError,
}

impl PreflightError {
    fn at(stage: PreflightStage) -> impl FnOnce(SimulationError) -> Self {
        move |source| Self { stage, source }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreflightReport {
    pub trader: Address,
    pub token: Address,
    pub symbol: String,
    pub decimals: u8,
    pub amount_in: U256,
    pub mint: U256,
    pub trade: TradeSimulation,
    pub settlement: DirectSettlementSimulation,
}

fn swap_exact_in(amount_in: U256, path: Vec<Address>, to: Address) -> Bytes {
    UniV2Router::swapExactTokensForTokensCall {
        amountIn: amount_in,
        amountOutMin: U256::ZERO,
        path,
        to,
        deadline: U256::MAX,
    }
    .abi_encode()
    .into()
}

fn swap_exact_out(amount_out: U256, path: Vec<Address>, to: Address) -> Bytes {
    UniV2Router::swapTokensForExactTokensCall {
        amountOut: amount_out,
        amountInMax: U256::MAX,
        path,
        to,
        deadline: U256::MAX,
    }
    .abi_encode()
    .into()
}

fn venue_call(router: Address, call_data: Bytes) -> VenueCall {
    VenueCall {
        spender: router,
        exchange: router,
        call_data,
    }
}

pub async fn run_preflight<L: Ledger>(
    engine: &SimulationEngine<L>,
    venue: PreflightVenue,
    request: &PreflightRequest,
) -> Result<PreflightReport, PreflightError> {
    let PreflightRequest { trader, token, .. } = *request;
    let native = venue.wrapped_native;
    let settlement = engine.settlement_address();

    let (balance, decimals, symbol) = futures::try_join!(
        engine.token_balance(token, trader),
        engine.token_decimals(token),
        engine.token_symbol(token),
    )
    .map_err(PreflightError::at(PreflightStage::Metadata))?;
    let amount_in = parse_token_amount(&request.amount, decimals)
        .map_err(PreflightError::at(PreflightStage::Metadata))?;
    let native_amount = parse_token_amount(&request.native_amount, NATIVE_DECIMALS)
        .map_err(PreflightError::at(PreflightStage::Metadata))?;
    let mint = mint_shortfall(amount_in, balance);

    tracing::info!(
        target: "report",
        %trader,
        %token,
        symbol = %symbol,
        amount = %format_token_amount(amount_in, decimals),
        mint = %format_token_amount(mint, decimals),
        "Starting preflight"
    );

    let trade = engine
        .simulate_direct_trade(&DirectTradeScenario {
            trader,
            token_in: token,
            token_out: native,
            mint,
            venue: venue_call(
                venue.router,
                swap_exact_in(amount_in, vec![token, native], trader),
            ),
        })
        .await
        .map_err(PreflightError::at(PreflightStage::Trade))?;
    tracing::info!(
        target: "report",
        %trader,
        gas_used = trade.gas_used,
        sell = %format_token_amount(trade.balance_in, decimals),
        buy = %format_token_amount(trade.balance_out, NATIVE_DECIMALS),
        "Trade stage passed"
    );

    if trade.balance_out.is_negative() {
        return Err(PreflightError {
            stage: PreflightStage::Settlement,
            source: SimulationError::validation(
                "amount_out",
                format!("trade stage bought a negative amount {}", trade.balance_out),
            ),
        });
    }
    let amount_out = trade.balance_out.into_raw();
    let settled = engine
        .simulate_direct_settlement(&DirectSettlementScenario {
            trader,
            token_in: token,
            token_out: native,
            amount_in,
            amount_out,
            mint,
            venue: venue_call(
                venue.router,
                swap_exact_in(amount_in, vec![token, native], settlement),
            ),
        })
        .await
        .map_err(PreflightError::at(PreflightStage::Settlement))?;
    tracing::info!(
        target: "report",
        %trader,
        gas_used = settled.gas_used,
        trader_sell = %format_token_amount(settled.trader.balance_in, decimals),
        trader_buy = %format_token_amount(settled.trader.balance_out, NATIVE_DECIMALS),
        settlement_sell = %format_token_amount(settled.settlement.balance_in, decimals),
        settlement_buy = %format_token_amount(settled.settlement.balance_out, NATIVE_DECIMALS),
        "Settlement stage passed"
    );

    engine
        .simulate_direct_roundtrip(&DirectRoundtripScenario {
            trader,
            native,
            token,
            native_amount,
            token_amount: amount_in,
            native_to_token: venue_call(
                venue.router,
                swap_exact_out(amount_in, vec![native, token], settlement),
            ),
            token_to_native: venue_call(
                venue.router,
                swap_exact_in(amount_in, vec![token, native], settlement),
            ),
        })
        .await
        .map_err(PreflightError::at(PreflightStage::Roundtrip))?;
    tracing::info!(target: "report", %trader, %token, "Roundtrip stage passed");

    Ok(PreflightReport {
        trader,
        token,
        symbol,
        decimals,
        amount_in,
        mint,
        trade,
        settlement: settled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_calldata_targets_the_requested_recipient() {
        let to = Address::repeat_byte(0x99);
        let path = vec![Address::repeat_byte(1), Address::repeat_byte(2)];
        let raw = swap_exact_in(U256::from(10u64), path.clone(), to);
        let decoded =
            UniV2Router::swapExactTokensForTokensCall::abi_decode(&raw).expect("decode");
        assert_eq!(decoded.to, to);
        assert_eq!(decoded.path, path);
        assert_eq!(decoded.amountOutMin, U256::ZERO);
        assert_eq!(decoded.deadline, U256::MAX);

        let raw = swap_exact_out(U256::from(10u64), path, to);
        let decoded =
            UniV2Router::swapTokensForExactTokensCall::abi_decode(&raw).expect("decode");
        assert_eq!(decoded.amountOut, U256::from(10u64));
        assert_eq!(decoded.amountInMax, U256::MAX);
    }

    #[test]
    fn stage_errors_name_the_stage() {
        let err = PreflightError::at(PreflightStage::Settlement)(SimulationError::reverted(
            "GPv2: not a solver",
        ));
        assert_eq!(
            err.to_string(),
            "settlement stage failed: Execution reverted: GPv2: not a solver"
        );
    }
}
