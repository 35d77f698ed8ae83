// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::SimulationError;
use alloy::primitives::U256;
use alloy::primitives::utils::{ParseUnits, format_units, parse_units};
use alloy::rpc::types::eth::{BlockId, BlockNumberOrTag};
use std::str::FromStr;

pub fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub fn parse_hex_bytes(s: &str) -> Option<Vec<u8>> {
    hex::decode(strip_0x(s)).ok()
}

/// Accepts `latest`/`pending`/`safe`/`finalized`/`earliest`, a hex number or
/// a decimal number.
pub fn parse_block_tag(raw: &str) -> Option<BlockId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(number) = trimmed.parse::<u64>() {
        return Some(BlockId::Number(BlockNumberOrTag::Number(number)));
    }
    BlockNumberOrTag::from_str(&trimmed.to_ascii_lowercase())
        .ok()
        .map(BlockId::Number)
}

/// Decimal token amount ("1000", "0.5") scaled by `decimals`.
pub fn parse_token_amount(raw: &str, decimals: u8) -> Result<U256, SimulationError> {
    let parsed = parse_units(raw.trim(), decimals).map_err(|e| {
        SimulationError::Overflow(format!("amount {raw} with {decimals} decimals: {e}"))
    })?;
    if parsed.is_negative() {
        return Err(SimulationError::validation(
            "amount",
            format!("negative amount {raw}"),
        ));
    }
    Ok(parsed.get_absolute())
}

pub fn format_token_amount<T: Into<ParseUnits>>(
    amount: T,
    decimals: u8,
) -> String {
    format_units(amount, decimals).unwrap_or_else(|_| "<unformattable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::I256;

    #[test]
    fn hex_parsers_accept_lower_and_upper_prefixes() {
        assert_eq!(parse_hex_bytes("0Xabcd"), Some(vec![0xab, 0xcd]));
        assert_eq!(parse_hex_bytes("abcd"), Some(vec![0xab, 0xcd]));
        assert_eq!(parse_hex_bytes("0xzz"), None);
    }

    #[test]
    fn block_tags_and_numbers_parse() {
        assert_eq!(
            parse_block_tag("latest"),
            Some(BlockId::Number(BlockNumberOrTag::Latest))
        );
        assert_eq!(
            parse_block_tag("Pending"),
            Some(BlockId::Number(BlockNumberOrTag::Pending))
        );
        assert_eq!(
            parse_block_tag("19000000"),
            Some(BlockId::Number(BlockNumberOrTag::Number(19_000_000)))
        );
        assert_eq!(
            parse_block_tag("0x10"),
            Some(BlockId::Number(BlockNumberOrTag::Number(16)))
        );
        assert_eq!(parse_block_tag(""), None);
        assert_eq!(parse_block_tag("tomorrow"), None);
    }

    #[test]
    fn token_amounts_scale_by_decimals() {
        assert_eq!(
            parse_token_amount("1000", 6).unwrap(),
            U256::from(1_000_000_000u64)
        );
        assert_eq!(
            parse_token_amount("0.5", 18).unwrap(),
            U256::from(500_000_000_000_000_000u64)
        );
        assert!(matches!(
            parse_token_amount("-1", 6),
            Err(SimulationError::Validation { .. })
        ));
        assert!(parse_token_amount("1e999", 18).is_err());
    }

    #[test]
    fn signed_deltas_format_with_sign() {
        let delta = I256::try_from(-1_500_000i64).unwrap();
        assert_eq!(format_token_amount(delta, 6), "-1.500000");
        assert_eq!(format_token_amount(U256::from(2_000_000u64), 6), "2.000000");
    }
}
