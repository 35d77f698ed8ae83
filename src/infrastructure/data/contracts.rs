// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface ERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address owner) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface GPv2Settlement {
        function authenticator() external view returns (address);
    }

    #[derive(Debug, PartialEq, Eq)]
    interface UniV2Router {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);

        function swapTokensForExactTokens(
            uint256 amountOut,
            uint256 amountInMax,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};
    use alloy_sol_types::SolCall;

    #[test]
    fn approve_call_roundtrips() {
        let call = ERC20::approveCall {
            spender: Address::from([4u8; 20]),
            amount: U256::MAX,
        };
        let encoded = call.abi_encode();
        assert_eq!(hex::encode(&encoded[..4]), "095ea7b3");
        let decoded = ERC20::approveCall::abi_decode(&encoded).expect("decode approve");
        assert_eq!(decoded.spender, call.spender);
        assert_eq!(decoded.amount, U256::MAX);
    }

    #[test]
    fn view_selectors_match_erc20_and_settlement() {
        assert_eq!(hex::encode(ERC20::balanceOfCall::SELECTOR), "70a08231");
        assert_eq!(hex::encode(ERC20::decimalsCall::SELECTOR), "313ce567");
        assert_eq!(hex::encode(ERC20::symbolCall::SELECTOR), "95d89b41");
        assert_eq!(
            hex::encode(GPv2Settlement::authenticatorCall::SELECTOR),
            "2335c76b"
        );
    }

    #[test]
    fn router_swap_selectors() {
        assert_eq!(
            hex::encode(UniV2Router::swapExactTokensForTokensCall::SELECTOR),
            "38ed1739"
        );
        assert_eq!(
            hex::encode(UniV2Router::swapTokensForExactTokensCall::SELECTOR),
            "8803dbee"
        );
    }
}
