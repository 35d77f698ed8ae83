// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::parsing::parse_hex_bytes;
use crate::domain::constants::{AUTHENTICATOR_ARTIFACT, PHONY_TOKEN_ARTIFACT, TRADER_ARTIFACT};
use crate::domain::error::AppError;
use alloy::primitives::Bytes;
use alloy_json_abi::{Function, JsonAbi};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Runtime bytecode plus call schema of one pre-built contract.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub name: String,
    pub abi: JsonAbi,
    pub runtime_code: Bytes,
}

#[derive(Deserialize)]
struct ArtifactFile {
    #[serde(default)]
    abi: JsonAbi,
    #[serde(rename = "bin-runtime")]
    bin_runtime: String,
}

impl ContractArtifact {
    pub fn from_json(name: &str, raw: &str) -> Result<Self, AppError> {
        let file: ArtifactFile = serde_json::from_str(raw)
            .map_err(|e| AppError::Config(format!("Failed to parse artifact {name}: {e}")))?;
        let code = parse_hex_bytes(file.bin_runtime.trim()).ok_or_else(|| {
            AppError::Config(format!("Artifact {name} has non-hex bin-runtime"))
        })?;
        if code.is_empty() {
            return Err(AppError::Config(format!(
                "Artifact {name} has empty runtime code"
            )));
        }
        Ok(Self {
            name: name.to_string(),
            abi: file.abi,
            runtime_code: Bytes::from(code),
        })
    }

    pub fn load(dir: &Path, name: &str) -> Result<Self, AppError> {
        let path = dir.join(format!("{name}.json"));
        let raw = fs::read_to_string(&path).map_err(|e| {
            AppError::Config(format!("Failed to read artifact {}: {}", path.display(), e))
        })?;
        let artifact = Self::from_json(name, &raw)?;
        tracing::info!(
            target: "config",
            artifact = name,
            code_len = artifact.runtime_code.len(),
            functions = artifact.abi.functions.len(),
            "Loaded contract artifact"
        );
        Ok(artifact)
    }

    /// First overload of `name` in the call schema.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.abi.function(name).and_then(|overloads| overloads.first())
    }
}

/// Everything the engine injects through state overlays. Built once at
/// startup and shared read-only.
#[derive(Debug, Clone)]
pub struct ArtifactCatalog {
    pub trader: ContractArtifact,
    pub phony_token: ContractArtifact,
    pub authenticator: ContractArtifact,
}

impl ArtifactCatalog {
    pub fn load_from_directory(dir_path: &str) -> Result<Self, AppError> {
        let path = Path::new(dir_path);
        if !path.is_dir() {
            return Err(AppError::Config(format!(
                "Artifact directory not found: {}",
                dir_path
            )));
        }
        let trader = ContractArtifact::load(path, TRADER_ARTIFACT)?;
        for entry_point in ["trade", "settle", "roundtrip"] {
            if trader.function(entry_point).is_none() {
                return Err(AppError::Config(format!(
                    "Trader artifact is missing the `{entry_point}` entry point"
                )));
            }
        }
        Ok(Self {
            trader,
            phony_token: ContractArtifact::load(path, PHONY_TOKEN_ARTIFACT)?,
            authenticator: ContractArtifact::load(path, AUTHENTICATOR_ARTIFACT)?,
        })
    }
}
