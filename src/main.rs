// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::primitives::Address;
use clap::Parser;
use futures::future::join_all;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use trade_simulator::app::config::GlobalSettings;
use trade_simulator::app::logging::{default_level, setup_logging};
use trade_simulator::common::parsing::parse_block_tag;
use trade_simulator::common::retry::retry_async_if;
use trade_simulator::data::artifacts::ArtifactCatalog;
use trade_simulator::domain::error::AppError;
use trade_simulator::network::ledger::RpcLedger;
use trade_simulator::network::provider::ConnectionFactory;
use trade_simulator::services::report::{PreflightRequest, PreflightVenue, run_preflight};
use trade_simulator::services::simulation::SimulationEngine;

/// One preflight target: `TRADER:TOKEN` or `TRADER:TOKEN:AMOUNT`.
#[derive(Debug, Clone)]
struct PairArg {
    trader: Address,
    token: Address,
    amount: Option<String>,
}

fn parse_pair(raw: &str) -> Result<PairArg, String> {
    let mut parts = raw.split(':').map(str::trim);
    let trader = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or("missing trader address")?;
    let token = parts.next().ok_or("expected TRADER:TOKEN[:AMOUNT]")?;
    let amount = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    if parts.next().is_some() {
        return Err("expected TRADER:TOKEN[:AMOUNT]".to_string());
    }
    Ok(PairArg {
        trader: Address::from_str(trader).map_err(|e| format!("trader {trader}: {e}"))?,
        token: Address::from_str(token).map_err(|e| format!("token {token}: {e}"))?,
        amount,
    })
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Pre-flight trades, settlements and roundtrips with eth_call")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,json})
    #[arg(long)]
    config: Option<String>,

    /// Trader/token pair to check, repeatable: TRADER:TOKEN[:AMOUNT]
    #[arg(long = "pair", required = true, value_parser = parse_pair)]
    pairs: Vec<PairArg>,

    /// Decimal amount sold when a pair does not name one
    #[arg(long, default_value = "1")]
    amount: String,

    /// Native asset seeded on the trader for the roundtrip
    #[arg(long, default_value = "1000")]
    native_amount: String,

    /// Block tag or number (overrides config/env)
    #[arg(long)]
    block: Option<String>,

    /// Directory with Trader/PhonyERC20/AnyoneAuthenticator artifacts
    #[arg(long, env = "TRADE_SIM_ARTIFACTS_DIR")]
    artifacts_dir: Option<String>,

    /// Emit JSON log lines
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(default_level(settings.debug), cli.json_logs || settings.log_json);

    let block = match cli.block.as_deref() {
        Some(raw) => parse_block_tag(raw)
            .ok_or_else(|| AppError::Config(format!("--block `{raw}` is not a block tag")))?,
        None => settings.block_id()?,
    };
    let artifacts_dir = cli
        .artifacts_dir
        .clone()
        .unwrap_or_else(|| settings.artifacts_dir.clone());
    let artifacts = Arc::new(ArtifactCatalog::load_from_directory(&artifacts_dir)?);

    let rpc_url = settings.http_provider_url()?;
    let provider = ConnectionFactory::http(&rpc_url)?;
    let cancel = CancellationToken::new();
    let engine = SimulationEngine::new(
        Arc::new(RpcLedger::new(provider)),
        artifacts,
        settings.settlement_address,
        block,
        settings.request_timeout(),
    )
    .with_cancellation(cancel.clone());

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!(target: "report", "Interrupted; cancelling in-flight queries");
                cancel.cancel();
            }
        });
    }

    let venue = PreflightVenue {
        router: settings.venue_router,
        wrapped_native: settings.wrapped_native,
    };
    let attempts = settings.rpc_retry_attempts_value();
    tracing::info!(
        target: "config",
        block = %block,
        pairs = cli.pairs.len(),
        settlement = %settings.settlement_address,
        router = %venue.router,
        "Starting preflight run"
    );

    let runs = cli.pairs.iter().map(|pair| {
        let request = PreflightRequest {
            trader: pair.trader,
            token: pair.token,
            amount: pair.amount.clone().unwrap_or_else(|| cli.amount.clone()),
            native_amount: cli.native_amount.clone(),
        };
        let engine = &engine;
        async move {
            let outcome = retry_async_if(
                |attempt| {
                    if attempt > 1 {
                        tracing::info!(target: "report", trader = %request.trader, attempt, "Retrying preflight");
                    }
                    run_preflight(engine, venue, &request)
                },
                attempts,
                Duration::from_millis(500),
                |err| err.source.is_retryable(),
            )
            .await;
            (request, outcome)
        }
    });

    let mut failures = 0usize;
    for (request, outcome) in join_all(runs).await {
        match outcome {
            Ok(report) => tracing::info!(
                target: "report",
                trader = %report.trader,
                token = %report.token,
                symbol = %report.symbol,
                trade_gas = report.trade.gas_used,
                settlement_gas = report.settlement.gas_used,
                "Preflight passed"
            ),
            Err(err) => {
                failures += 1;
                tracing::error!(
                    target: "report",
                    trader = %request.trader,
                    token = %request.token,
                    stage = %err.stage,
                    error = %err.source,
                    "Preflight failed"
                );
            }
        }
    }

    if failures == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
