// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::parse_hex_bytes;
use crate::domain::constants::EXECUTION_REVERTED_PREFIX;
use crate::domain::error::SimulationError;
use crate::domain::request::{AccountOverlay, CallRequest};
use crate::network::provider::HttpProvider;
use alloy::primitives::{Address, Bytes};
use alloy::providers::Provider;
use alloy::rpc::types::eth::BlockId;
use alloy::transports::{RpcError as TransportRpcError, TransportError, TransportErrorKind};
use alloy_sol_types::{Revert, SolError};
use serde::Deserialize;
use serde_json::Value;
use std::future::Future;

/// Read-only view of the chain. Implementations must never mutate state.
pub trait Ledger: Send + Sync {
    /// `eth_call` at `block` with `overlay` applied for this query only.
    fn call(
        &self,
        request: &CallRequest,
        overlay: &AccountOverlay,
        block: BlockId,
    ) -> impl Future<Output = Result<Bytes, SimulationError>> + Send;

    fn code_at(
        &self,
        address: Address,
        block: BlockId,
    ) -> impl Future<Output = Result<Bytes, SimulationError>> + Send;
}

#[derive(Clone)]
pub struct RpcLedger {
    provider: HttpProvider,
}

impl RpcLedger {
    pub fn new(provider: HttpProvider) -> Self {
        Self { provider }
    }
}

impl Ledger for RpcLedger {
    async fn call(
        &self,
        request: &CallRequest,
        overlay: &AccountOverlay,
        block: BlockId,
    ) -> Result<Bytes, SimulationError> {
        let mut call = self
            .provider
            .call(request.to_transaction_request())
            .block(block);
        if !overlay.is_empty() {
            call = call.overrides(overlay.to_state_override());
        }
        call.await.map_err(classify_transport_error)
    }

    async fn code_at(&self, address: Address, block: BlockId) -> Result<Bytes, SimulationError> {
        self.provider
            .get_code_at(address)
            .block_id(block)
            .await
            .map_err(classify_transport_error)
    }
}

/// JSON-RPC error object as nodes put it on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RpcErrorBody {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorEnvelope {
    error: RpcErrorBody,
}

/// Strictly parse `{"error": {"code", "message", "data"?}}`; anything else is
/// a `Parse` failure rather than a guess.
pub fn parse_error_envelope(text: &str) -> Result<RpcErrorBody, SimulationError> {
    serde_json::from_str::<RpcErrorEnvelope>(text)
        .map(|envelope| envelope.error)
        .map_err(|e| SimulationError::Parse(format!("{e}; body: {}", truncate(text, 256))))
}

pub fn classify_error_body(body: &RpcErrorBody) -> SimulationError {
    let message = body.message.as_str();
    if let Some(reason) = message.strip_prefix(EXECUTION_REVERTED_PREFIX) {
        return SimulationError::reverted(reason);
    }
    if body.code == 3 || message.starts_with("execution reverted") {
        let reason = body
            .data
            .as_ref()
            .and_then(|data| data.as_str())
            .and_then(decode_revert_data)
            .unwrap_or_else(|| message.to_string());
        return SimulationError::reverted(reason);
    }
    SimulationError::Rpc(format!("RPC error {}: {}", body.code, message))
}

pub fn classify_transport_error(err: TransportError) -> SimulationError {
    match &err {
        TransportRpcError::ErrorResp(payload) => classify_error_body(&RpcErrorBody {
            code: payload.code,
            message: payload.message.to_string(),
            data: payload
                .data
                .as_ref()
                .and_then(|raw| serde_json::from_str(raw.get()).ok()),
        }),
        TransportRpcError::DeserError { text, .. } => match parse_error_envelope(text) {
            Ok(body) => classify_error_body(&body),
            Err(parse_err) => parse_err,
        },
        TransportRpcError::Transport(TransportErrorKind::HttpError(http)) => {
            match parse_error_envelope(&http.body) {
                Ok(body) => classify_error_body(&body),
                Err(_) => SimulationError::Rpc(format!(
                    "HTTP {}: {}",
                    http.status,
                    truncate(&http.body, 256)
                )),
            }
        }
        _ => SimulationError::Rpc(err.to_string()),
    }
}

fn decode_revert_data(hex_data: &str) -> Option<String> {
    let bytes = parse_hex_bytes(hex_data)?;
    if bytes.is_empty() {
        return None;
    }
    match Revert::abi_decode(&bytes) {
        Ok(revert) => Some(revert.reason().to_string()),
        Err(_) => Some(format!("execution reverted (0x{})", hex::encode(&bytes))),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
