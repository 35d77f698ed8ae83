// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::data::artifacts::ArtifactCatalog;
use crate::data::contracts::{ERC20, GPv2Settlement};
use crate::domain::error::SimulationError;
use crate::domain::request::{AccountOverlay, CallRequest};
use crate::domain::scenario::{
    BalanceChange, DirectRoundtripScenario, DirectSettlementScenario,
    DirectSettlementSimulation, DirectTradeScenario, RoundtripScenario, SettlementScenario,
    SettlementSimulation, TradeScenario, TradeSimulation,
};
use crate::network::ledger::Ledger;
use crate::services::simulation::codec::{
    address_value, batch_value, decode_output, encode_call, gas_word, int_word, int_words,
    phases_value, uint_value,
};
use crate::services::simulation::executor::ReadOnlyExecutor;
use crate::services::simulation::legs::{two_step, venue_two_step};
use crate::services::simulation::overlay::{
    authenticator_overlay, mint_shortfall, token_mint_overlay, trader_overlay,
};
use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::eth::BlockId;
use alloy_json_abi::Function;
use alloy_sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs trade, settlement and roundtrip scenarios as single read-only calls
/// against the trader contract, with the required code and balances
/// substituted for the duration of each call.
///
/// Holds no mutable state; clones share the ledger handle and the artifact
/// catalog and may be used from any task concurrently.
pub struct SimulationEngine<L> {
    executor: ReadOnlyExecutor<L>,
    artifacts: Arc<ArtifactCatalog>,
    settlement: Address,
    block: BlockId,
}

impl<L> Clone for SimulationEngine<L> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            artifacts: self.artifacts.clone(),
            settlement: self.settlement,
            block: self.block,
        }
    }
}

impl<L: Ledger> SimulationEngine<L> {
    pub fn new(
        ledger: Arc<L>,
        artifacts: Arc<ArtifactCatalog>,
        settlement: Address,
        block: BlockId,
        request_timeout: Duration,
    ) -> Self {
        Self {
            executor: ReadOnlyExecutor::new(ledger, request_timeout),
            artifacts,
            settlement,
            block,
        }
    }

    /// Abort in-flight and future queries once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.executor = self.executor.with_cancellation(cancel);
        self
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn settlement_address(&self) -> Address {
        self.settlement
    }

    pub async fn simulate_trade(
        &self,
        scenario: &TradeScenario,
    ) -> Result<TradeSimulation, SimulationError> {
        let data = encode_call(
            self.entry_point("trade")?,
            &[
                address_value(scenario.token_in),
                address_value(scenario.token_out),
                batch_value(&scenario.interactions),
                uint_value(scenario.mint),
            ],
        )?;
        let overlay = self
            .trader_code(scenario.trader, None)
            .merge(self.mint_overlay(scenario.token_in, scenario.mint).await?)?;

        tracing::debug!(
            target: "simulation",
            trader = %scenario.trader,
            token_in = %scenario.token_in,
            token_out = %scenario.token_out,
            mint = %scenario.mint,
            interactions = scenario.interactions.len(),
            "Simulating trade"
        );
        let raw = self.call_trader(scenario.trader, data, &overlay).await?;
        let values = decode_output(
            &raw,
            &[DynSolType::Uint(256), DynSolType::Int(256), DynSolType::Int(256)],
        )?;
        let outcome = TradeSimulation {
            gas_used: gas_word(&values[0])?,
            balance_in: int_word(&values[1], "balanceIn")?,
            balance_out: int_word(&values[2], "balanceOut")?,
        };
        tracing::info!(
            target: "simulation",
            trader = %scenario.trader,
            gas_used = outcome.gas_used,
            balance_in = %outcome.balance_in,
            balance_out = %outcome.balance_out,
            "Trade simulated"
        );
        Ok(outcome)
    }

    pub async fn simulate_settlement(
        &self,
        scenario: &SettlementScenario,
    ) -> Result<SettlementSimulation, SimulationError> {
        scenario.validate()?;
        let data = encode_call(
            self.entry_point("settle")?,
            &[
                DynSolValue::Array(scenario.tokens.iter().copied().map(address_value).collect()),
                DynSolValue::Array(
                    scenario
                        .clearing_prices
                        .iter()
                        .copied()
                        .map(uint_value)
                        .collect(),
                ),
                phases_value(scenario.interactions.iter().map(Vec::as_slice)),
                uint_value(scenario.mint),
            ],
        )?;
        let sold = scenario.tokens[0];
        let overlay = self
            .trader_code(scenario.trader, None)
            .merge(self.permissive_authenticator().await?)?
            .merge(self.mint_overlay(sold, scenario.mint).await?)?;

        tracing::debug!(
            target: "simulation",
            trader = %scenario.trader,
            tokens = scenario.tokens.len(),
            mint = %scenario.mint,
            "Simulating settlement"
        );
        let raw = self.call_trader(scenario.trader, data, &overlay).await?;
        let int_array = DynSolType::Array(Box::new(DynSolType::Int(256)));
        let values = decode_output(&raw, &[DynSolType::Uint(256), int_array.clone(), int_array])?;
        let outcome = SettlementSimulation {
            gas_used: gas_word(&values[0])?,
            trader: int_words(&values[1], "traderBalances")?,
            settlement: int_words(&values[2], "settlementBalances")?,
        };
        for (what, deltas) in [("trader", &outcome.trader), ("settlement", &outcome.settlement)] {
            if deltas.len() != scenario.tokens.len() {
                return Err(SimulationError::Decoding(format!(
                    "{what} deltas have {} entries for {} tokens",
                    deltas.len(),
                    scenario.tokens.len()
                )));
            }
        }

        if !outcome.is_closed() {
            tracing::warn!(
                target: "simulation",
                trader = %scenario.trader,
                imbalanced = ?outcome.imbalances(),
                "Settlement deltas do not mirror trader deltas"
            );
        }
        tracing::info!(
            target: "simulation",
            trader = %scenario.trader,
            gas_used = outcome.gas_used,
            "Settlement simulated"
        );
        Ok(outcome)
    }

    /// Succeeds when the roundtrip does not revert; nothing is decoded.
    pub async fn simulate_roundtrip(
        &self,
        scenario: &RoundtripScenario,
    ) -> Result<(), SimulationError> {
        let data = encode_call(
            self.entry_point("roundtrip")?,
            &[
                address_value(scenario.native),
                address_value(scenario.token),
                uint_value(scenario.token_amount),
                batch_value(&scenario.native_to_token),
                batch_value(&scenario.token_to_native),
            ],
        )?;
        let overlay = self
            .trader_code(scenario.trader, Some(scenario.native_amount))
            .merge(self.permissive_authenticator().await?)?;

        tracing::debug!(
            target: "simulation",
            trader = %scenario.trader,
            native = %scenario.native,
            token = %scenario.token,
            native_amount = %scenario.native_amount,
            token_amount = %scenario.token_amount,
            "Simulating roundtrip"
        );
        self.call_trader(scenario.trader, data, &overlay).await?;
        tracing::info!(target: "simulation", trader = %scenario.trader, "Roundtrip simulated");
        Ok(())
    }

    pub async fn simulate_direct_trade(
        &self,
        scenario: &DirectTradeScenario,
    ) -> Result<TradeSimulation, SimulationError> {
        self.simulate_trade(&TradeScenario {
            trader: scenario.trader,
            token_in: scenario.token_in,
            token_out: scenario.token_out,
            interactions: venue_two_step(scenario.token_in, &scenario.venue),
            mint: scenario.mint,
        })
        .await
    }

    /// Settles `token_in -> token_out` through one venue call with clearing
    /// prices `[amount_out, amount_in]`.
    pub async fn simulate_direct_settlement(
        &self,
        scenario: &DirectSettlementScenario,
    ) -> Result<DirectSettlementSimulation, SimulationError> {
        let batch = two_step(
            scenario.token_in,
            scenario.venue.spender,
            scenario.venue.exchange,
            scenario.venue.call_data.clone(),
        );
        let outcome = self
            .simulate_settlement(&SettlementScenario {
                trader: scenario.trader,
                tokens: vec![scenario.token_in, scenario.token_out],
                clearing_prices: vec![scenario.amount_out, scenario.amount_in],
                interactions: batch.into_phases(),
                mint: scenario.mint,
            })
            .await?;
        Ok(DirectSettlementSimulation {
            gas_used: outcome.gas_used,
            trader: BalanceChange {
                balance_in: outcome.trader[0],
                balance_out: outcome.trader[1],
            },
            settlement: BalanceChange {
                balance_in: outcome.settlement[0],
                balance_out: outcome.settlement[1],
            },
        })
    }

    pub async fn simulate_direct_roundtrip(
        &self,
        scenario: &DirectRoundtripScenario,
    ) -> Result<(), SimulationError> {
        self.simulate_roundtrip(&RoundtripScenario {
            trader: scenario.trader,
            native: scenario.native,
            token: scenario.token,
            native_amount: scenario.native_amount,
            token_amount: scenario.token_amount,
            native_to_token: venue_two_step(scenario.native, &scenario.native_to_token),
            token_to_native: venue_two_step(scenario.token, &scenario.token_to_native),
        })
        .await
    }

    /// Current authorizer of the settlement contract, read without overlays.
    pub async fn authenticator(&self) -> Result<Address, SimulationError> {
        self.view(self.settlement, GPv2Settlement::authenticatorCall {})
            .await
    }

    pub async fn token_balance(&self, token: Address, holder: Address) -> Result<U256, SimulationError> {
        self.view(token, ERC20::balanceOfCall { owner: holder }).await
    }

    pub async fn token_decimals(&self, token: Address) -> Result<u8, SimulationError> {
        self.view(token, ERC20::decimalsCall {}).await
    }

    pub async fn token_symbol(&self, token: Address) -> Result<String, SimulationError> {
        self.view(token, ERC20::symbolCall {}).await
    }

    /// How much of `token` must be minted for `holder` to spend `required`.
    pub async fn required_mint(
        &self,
        token: Address,
        holder: Address,
        required: U256,
    ) -> Result<U256, SimulationError> {
        let balance = self.token_balance(token, holder).await?;
        Ok(mint_shortfall(required, balance))
    }

    fn entry_point(&self, name: &str) -> Result<&Function, SimulationError> {
        self.artifacts.trader.function(name).ok_or_else(|| {
            SimulationError::Encoding(format!("trader call schema has no `{name}` function"))
        })
    }

    fn trader_code(&self, trader: Address, native_balance: Option<U256>) -> AccountOverlay {
        trader_overlay(
            trader,
            self.artifacts.trader.runtime_code.clone(),
            native_balance,
        )
    }

    async fn mint_overlay(&self, token: Address, mint: U256) -> Result<AccountOverlay, SimulationError> {
        token_mint_overlay(
            token,
            self.artifacts.phony_token.runtime_code.clone(),
            mint,
            |address| self.executor.code_at(address, self.block),
        )
        .await
    }

    async fn permissive_authenticator(&self) -> Result<AccountOverlay, SimulationError> {
        let authenticator = self.authenticator().await?;
        tracing::trace!(target: "simulation", %authenticator, "Overlaying authenticator");
        Ok(authenticator_overlay(
            authenticator,
            self.artifacts.authenticator.runtime_code.clone(),
        ))
    }

    async fn call_trader(
        &self,
        trader: Address,
        data: Bytes,
        overlay: &AccountOverlay,
    ) -> Result<Bytes, SimulationError> {
        let result = self
            .executor
            .execute(&CallRequest::self_call(trader, data), overlay, self.block)
            .await;
        if let Err(SimulationError::ExecutionReverted { reason }) = &result {
            tracing::debug!(target: "simulation", %trader, %reason, "Scenario reverted");
        }
        result
    }

    async fn view<C: SolCall>(&self, to: Address, call: C) -> Result<C::Return, SimulationError> {
        let raw = self
            .executor
            .execute(
                &CallRequest::view(to, call.abi_encode()),
                &AccountOverlay::new(),
                self.block,
            )
            .await?;
        C::abi_decode_returns(&raw)
            .map_err(|e| SimulationError::Decoding(format!("{}: {e}", C::SIGNATURE)))
    }
}
