// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::domain::constants::INTERACTION_PHASES;
use crate::domain::error::SimulationError;
use alloy::primitives::{Address, Bytes, I256, U256};

/// One external call the trader contract performs mid-execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interaction {
    pub target: Address,
    pub value: U256,
    pub call_data: Bytes,
}

impl Interaction {
    pub fn call(target: Address, call_data: impl Into<Bytes>) -> Self {
        Self {
            target,
            value: U256::ZERO,
            call_data: call_data.into(),
        }
    }
}

/// Interactions grouped by phase. Order inside a phase is execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionBatch {
    /// Authorization (approvals) before the trade.
    pub pre: Vec<Interaction>,
    pub trade: Vec<Interaction>,
    /// Cleanup after the trade.
    pub post: Vec<Interaction>,
}

impl InteractionBatch {
    pub fn phases(&self) -> [&[Interaction]; INTERACTION_PHASES] {
        [&self.pre, &self.trade, &self.post]
    }

    pub fn into_phases(self) -> Vec<Vec<Interaction>> {
        vec![self.pre, self.trade, self.post]
    }

    pub fn len(&self) -> usize {
        self.pre.len() + self.trade.len() + self.post.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A single venue call: who pulls the sold token and what to call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueCall {
    pub spender: Address,
    pub exchange: Address,
    pub call_data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeScenario {
    pub trader: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub interactions: InteractionBatch,
    pub mint: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementScenario {
    pub trader: Address,
    pub tokens: Vec<Address>,
    pub clearing_prices: Vec<U256>,
    /// Raw phase list handed to `settle`; must hold exactly pre/trade/post.
    pub interactions: Vec<Vec<Interaction>>,
    pub mint: U256,
}

impl SettlementScenario {
    /// Local shape checks; nothing reaches the ledger when these fail.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tokens.len() < 2 {
            return Err(SimulationError::validation(
                "tokens",
                format!("settlement needs at least 2 tokens, got {}", self.tokens.len()),
            ));
        }
        if self.tokens.len() != self.clearing_prices.len() {
            return Err(SimulationError::validation(
                "clearing_prices",
                format!(
                    "{} clearing prices for {} tokens",
                    self.clearing_prices.len(),
                    self.tokens.len()
                ),
            ));
        }
        if self.interactions.len() != INTERACTION_PHASES {
            return Err(SimulationError::validation(
                "interactions",
                format!(
                    "expected {INTERACTION_PHASES} interaction phases, got {}",
                    self.interactions.len()
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundtripScenario {
    pub trader: Address,
    pub native: Address,
    pub token: Address,
    /// Seeded as the trader's native balance; never sent as call value.
    pub native_amount: U256,
    pub token_amount: U256,
    pub native_to_token: InteractionBatch,
    pub token_to_native: InteractionBatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectTradeScenario {
    pub trader: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub mint: U256,
    pub venue: VenueCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectSettlementScenario {
    pub trader: Address,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub mint: U256,
    pub venue: VenueCall,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectRoundtripScenario {
    pub trader: Address,
    pub native: Address,
    pub token: Address,
    pub native_amount: U256,
    pub token_amount: U256,
    pub native_to_token: VenueCall,
    pub token_to_native: VenueCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeSimulation {
    pub gas_used: u64,
    pub balance_in: I256,
    pub balance_out: I256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementSimulation {
    pub gas_used: u64,
    /// Positional to the scenario's `tokens`.
    pub trader: Vec<I256>,
    pub settlement: Vec<I256>,
}

impl SettlementSimulation {
    /// Token indices where the settlement did not mirror the trader's delta.
    pub fn imbalances(&self) -> Vec<usize> {
        self.trader
            .iter()
            .zip(&self.settlement)
            .enumerate()
            .filter(|(_, (trader, settlement))| {
                trader.checked_neg().is_none_or(|neg| neg != **settlement)
            })
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.trader.len() == self.settlement.len() && self.imbalances().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub balance_in: I256,
    pub balance_out: I256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectSettlementSimulation {
    pub gas_used: u64,
    pub trader: BalanceChange,
    pub settlement: BalanceChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settlement(tokens: usize, prices: usize, phases: usize) -> SettlementScenario {
        SettlementScenario {
            trader: Address::from([1u8; 20]),
            tokens: (0..tokens).map(|i| Address::from([i as u8 + 2; 20])).collect(),
            clearing_prices: (0..prices).map(U256::from).collect(),
            interactions: vec![Vec::new(); phases],
            mint: U256::ZERO,
        }
    }

    #[test]
    fn settlement_validation_rejects_shape_mismatches() {
        assert!(settlement(2, 2, 3).validate().is_ok());
        assert!(settlement(3, 3, 3).validate().is_ok());

        let err = settlement(2, 3, 3).validate().unwrap_err();
        assert!(matches!(err, SimulationError::Validation { ref field, .. } if field == "clearing_prices"));

        let err = settlement(2, 2, 2).validate().unwrap_err();
        assert!(matches!(err, SimulationError::Validation { ref field, .. } if field == "interactions"));

        let err = settlement(1, 1, 3).validate().unwrap_err();
        assert!(matches!(err, SimulationError::Validation { ref field, .. } if field == "tokens"));
    }

    #[test]
    fn closed_settlement_mirrors_trader_deltas() {
        let sim = SettlementSimulation {
            gas_used: 1,
            trader: vec![I256::try_from(-5i64).unwrap(), I256::try_from(7i64).unwrap()],
            settlement: vec![I256::try_from(5i64).unwrap(), I256::try_from(-7i64).unwrap()],
        };
        assert!(sim.is_closed());

        let leaky = SettlementSimulation {
            settlement: vec![I256::try_from(5i64).unwrap(), I256::try_from(-6i64).unwrap()],
            ..sim
        };
        assert_eq!(leaky.imbalances(), vec![1]);
        assert!(!leaky.is_closed());
    }
}
