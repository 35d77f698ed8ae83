// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::error::AppError;
use alloy::network::Ethereum;
use alloy::providers::RootProvider;
use url::Url;

pub type HttpProvider = RootProvider<Ethereum>;

pub struct ConnectionFactory;

impl ConnectionFactory {
    pub fn http(rpc_url: &str) -> Result<HttpProvider, AppError> {
        let url =
            Url::parse(rpc_url).map_err(|e| AppError::Config(format!("Invalid RPC URL: {}", e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "RPC URL must be http(s), got scheme {}",
                url.scheme()
            )));
        }

        let provider = RootProvider::new_http(url);
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_and_non_http_urls() {
        assert!(matches!(
            ConnectionFactory::http("not a url"),
            Err(AppError::Config(msg)) if msg.contains("Invalid RPC URL")
        ));
        assert!(matches!(
            ConnectionFactory::http("ws://127.0.0.1:8546"),
            Err(AppError::Config(msg)) if msg.contains("http(s)")
        ));
        assert!(ConnectionFactory::http("http://127.0.0.1:8545").is_ok());
    }
}
