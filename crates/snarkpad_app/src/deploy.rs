//! The verifier deployment chain: contract compilation through an external
//! compiler and deployment through an injected wallet provider.

use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::json;
use thiserror::Error;

use snarkpad_core::{CompiledContract, VERIFIER_SOURCE};

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("contract compiler failed: {0}")]
    Compiler(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wallet provider rejected deployment: {0}")]
    Wallet(String),
    #[error("no wallet provider is connected")]
    NoProvider,
}

#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Contract compiler command.
    pub solc: String,
    pub optimizer_enabled: bool,
    pub optimizer_runs: u32,
}

impl Default for DeploySettings {
    fn default() -> Self {
        Self {
            solc: "solc".to_string(),
            optimizer_enabled: false,
            optimizer_runs: 200,
        }
    }
}

/// External contract compiler seam.
pub trait ContractCompiler: Send {
    fn compile(&self, source: &str) -> Result<CompiledContract, DeployError>;
}

/// Externally injected signer/deployer. The workspace ships no on-chain
/// implementation; the embedder connects one, the same way the original
/// system relies on a page-global provider.
pub trait WalletProvider: Send {
    fn deploy(&self, contract: &CompiledContract) -> Result<DeployedContract, DeployError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    /// On-chain address of the deployed verifier.
    pub address: String,
}

/// Placeholder provider for sessions without a connected wallet.
pub struct NoWallet;

impl WalletProvider for NoWallet {
    fn deploy(&self, _contract: &CompiledContract) -> Result<DeployedContract, DeployError> {
        Err(DeployError::NoProvider)
    }
}

/// The plonk verifier emitter still outputs the nonexistent `uint4` type;
/// rewrite the first occurrence before handing the source to the compiler.
pub fn patch_verifier_source(source: &str) -> String {
    source.replacen("uint4", "uint8", 1)
}

/// Drives an external `solc --standard-json` process.
pub struct SolcCompiler {
    settings: DeploySettings,
}

impl SolcCompiler {
    pub fn new(settings: DeploySettings) -> Self {
        Self { settings }
    }
}

impl ContractCompiler for SolcCompiler {
    fn compile(&self, source: &str) -> Result<CompiledContract, DeployError> {
        let input = json!({
            "language": "Solidity",
            "sources": {
                "Compiled_Contracts": { "content": source }
            },
            "settings": {
                "optimizer": {
                    "enabled": self.settings.optimizer_enabled,
                    "runs": self.settings.optimizer_runs,
                },
                "outputSelection": { "*": { "*": ["abi", "evm.bytecode"] } }
            }
        });

        let mut child = Command::new(&self.settings.solc)
            .arg("--standard-json")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input.to_string().as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(DeployError::Compiler(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let value: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|err| DeployError::Compiler(err.to_string()))?;
        if let Some(errors) = value["errors"].as_array() {
            let fatal: Vec<String> = errors
                .iter()
                .filter(|e| e["severity"] == "error")
                .filter_map(|e| e["formattedMessage"].as_str().map(str::to_string))
                .collect();
            if !fatal.is_empty() {
                return Err(DeployError::Compiler(fatal.join("\n")));
            }
        }

        let contracts = value["contracts"]["Compiled_Contracts"]
            .as_object()
            .ok_or_else(|| DeployError::Compiler("no contracts in compiler output".to_string()))?;
        // Prefer the verifier by name; otherwise take whatever the unit holds.
        let (name, artifact) = contracts
            .iter()
            .find(|(name, _)| *name == "PlonkVerifier")
            .or_else(|| contracts.iter().next())
            .ok_or_else(|| DeployError::Compiler("empty compilation unit".to_string()))?;

        Ok(CompiledContract {
            contract: name.clone(),
            source_file: VERIFIER_SOURCE.to_string(),
            json: artifact.to_string(),
        })
    }
}
