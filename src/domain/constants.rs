// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use alloy::primitives::{Address, address};

// Common assets
pub const WETH_MAINNET: Address = address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
pub const USDC_MAINNET: Address = address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48");

// =============================================================================
// PROTOCOL CONSTANTS
// =============================================================================

/// GPv2 settlement contract (same address on every supported chain).
pub const GPV2_SETTLEMENT: Address = address!("9008D19f58AAbD9eD0D60971565AA8510560ab41");

pub const UNISWAP_V2_ROUTER02: Address = address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D");

/// Where the mint-aware token double expects the real token code to live.
/// The double forwards every call it does not special-case to this address.
pub const PHONY_TOKEN_DELEGATE: Address = address!("0000000000000000000000000000000000010000");

// =============================================================================
// SIMULATION CONSTANTS
// =============================================================================

/// Pre-trade, trade and post-trade interaction phases.
pub const INTERACTION_PHASES: usize = 3;

pub const DEFAULT_BLOCK_TAG: &str = "latest";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const MIN_REQUEST_TIMEOUT_MS: u64 = 100;

pub const TRADER_ARTIFACT: &str = "Trader";
pub const PHONY_TOKEN_ARTIFACT: &str = "PhonyERC20";
pub const AUTHENTICATOR_ARTIFACT: &str = "AnyoneAuthenticator";

pub const EXECUTION_REVERTED_PREFIX: &str = "execution reverted: ";
