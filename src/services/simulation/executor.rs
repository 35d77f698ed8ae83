// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::SimulationError;
use crate::domain::request::{AccountOverlay, CallRequest};
use crate::network::ledger::Ledger;
use alloy::primitives::{Address, Bytes};
use alloy::rpc::types::eth::BlockId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Issues exactly one ledger query per call. A query that outlives the
/// deadline or the caller's cancellation surfaces as `Rpc`; nothing is
/// retried here.
pub struct ReadOnlyExecutor<L> {
    ledger: Arc<L>,
    timeout: Duration,
    cancel: CancellationToken,
}

impl<L> Clone for ReadOnlyExecutor<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            timeout: self.timeout,
            cancel: self.cancel.clone(),
        }
    }
}

impl<L: Ledger> ReadOnlyExecutor<L> {
    pub fn new(ledger: Arc<L>, timeout: Duration) -> Self {
        Self {
            ledger,
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn execute(
        &self,
        request: &CallRequest,
        overlay: &AccountOverlay,
        block: BlockId,
    ) -> Result<Bytes, SimulationError> {
        tracing::trace!(
            target: "ledger",
            to = %request.to,
            overlay_accounts = overlay.len(),
            calldata_len = request.data.len(),
            block = %block,
            "eth_call"
        );
        self.guarded("eth_call", self.ledger.call(request, overlay, block))
            .await
    }

    pub async fn code_at(&self, address: Address, block: BlockId) -> Result<Bytes, SimulationError> {
        self.guarded("eth_getCode", self.ledger.code_at(address, block))
            .await
    }

    async fn guarded<T, F>(&self, method: &str, query: F) -> Result<T, SimulationError>
    where
        F: Future<Output = Result<T, SimulationError>>,
    {
        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(SimulationError::Rpc(format!("{method} cancelled by caller")))
            }
            res = tokio::time::timeout(self.timeout, query) => match res {
                Ok(inner) => inner,
                Err(_) => Err(SimulationError::Rpc(format!(
                    "{method} timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            },
        };
        if let Err(e) = &outcome
            && e.is_retryable()
        {
            tracing::warn!(target: "ledger", method, error = %e, "ledger query failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::rpc::types::eth::BlockNumberOrTag;

    struct SlowLedger {
        delay: Duration,
    }

    impl Ledger for SlowLedger {
        async fn call(
            &self,
            _request: &CallRequest,
            _overlay: &AccountOverlay,
            _block: BlockId,
        ) -> Result<Bytes, SimulationError> {
            tokio::time::sleep(self.delay).await;
            Ok(Bytes::from(vec![0x01u8]))
        }

        async fn code_at(&self, _address: Address, _block: BlockId) -> Result<Bytes, SimulationError> {
            tokio::time::sleep(self.delay).await;
            Ok(Bytes::from(vec![0x60u8]))
        }
    }

    fn latest() -> BlockId {
        BlockId::Number(BlockNumberOrTag::Latest)
    }

    fn request() -> CallRequest {
        CallRequest::view(Address::repeat_byte(1), vec![0x00u8])
    }

    #[tokio::test(start_paused = true)]
    async fn fast_query_passes_through() {
        let exec = ReadOnlyExecutor::new(
            Arc::new(SlowLedger {
                delay: Duration::from_millis(10),
            }),
            Duration::from_secs(1),
        );
        let out = exec
            .execute(&request(), &AccountOverlay::new(), latest())
            .await
            .expect("call");
        assert_eq!(out.to_vec(), vec![0x01]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_query_surfaces_as_rpc_timeout() {
        let exec = ReadOnlyExecutor::new(
            Arc::new(SlowLedger {
                delay: Duration::from_secs(3600),
            }),
            Duration::from_millis(250),
        );
        let err = exec
            .execute(&request(), &AccountOverlay::new(), latest())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Rpc(msg) if msg.contains("timed out after 250ms")));

        let err = exec
            .code_at(Address::repeat_byte(2), latest())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Rpc(msg) if msg.contains("eth_getCode")));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_surfaces_as_rpc_failure() {
        let cancel = CancellationToken::new();
        let exec = ReadOnlyExecutor::new(
            Arc::new(SlowLedger {
                delay: Duration::from_secs(60),
            }),
            Duration::from_secs(120),
        )
        .with_cancellation(cancel.clone());
        cancel.cancel();
        let err = exec
            .execute(&request(), &AccountOverlay::new(), latest())
            .await
            .unwrap_err();
        assert!(matches!(err, SimulationError::Rpc(msg) if msg.contains("cancelled")));
    }
}
