//! Subprocess-backed toolchain: drives the external circuit compiler, the
//! constraint analyzer, and the key generator in a scratch directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tokio::process::Command;
use worker_logging::worker_debug;

use crate::protocol::{JobFile, KeyScheme, RawEnvelope};
use crate::toolchain::{MessageSink, Toolchain, ToolchainError};

#[derive(Debug, Clone)]
pub struct ToolchainConfig {
    /// Circuit compiler command.
    pub compiler: String,
    /// Static analyzer command; best-effort, a missing analyzer does not
    /// fail the run.
    pub analyzer: String,
    /// Key generator command.
    pub prover: String,
    /// Universal-setup file handed to the prover.
    pub ptau: PathBuf,
    /// Parent directory for scratch build dirs; system temp when unset.
    pub scratch_root: Option<PathBuf>,
    pub tool_timeout: Duration,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: "circom".to_string(),
            analyzer: "circomspect".to_string(),
            prover: "snarkjs".to_string(),
            ptau: PathBuf::from("powersOfTau28_hez_final_10.ptau"),
            scratch_root: None,
            tool_timeout: Duration::from_secs(120),
        }
    }
}

/// Worker-side state that survives across requests on one instance: the
/// scratch dir of the last successful compile and the digest of the last
/// generated proving key. A replaced instance loses all of it, by design of
/// the protocol (hard termination, no handshake).
#[derive(Default)]
struct CompiledState {
    scratch: Option<TempDir>,
    main_file: Option<String>,
    key_digest: Option<[u8; 32]>,
}

pub struct ProcessToolchain {
    config: ToolchainConfig,
    state: Mutex<CompiledState>,
}

impl ProcessToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CompiledState::default()),
        }
    }

    fn make_scratch(&self) -> Result<TempDir, ToolchainError> {
        let scratch = match &self.config.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                TempDir::new_in(root)?
            }
            None => TempDir::new()?,
        };
        Ok(scratch)
    }

    /// Runs one external tool to completion. stderr chatter is forwarded as
    /// debug envelopes; stdout is left for the caller to interpret.
    async fn run_tool(
        &self,
        tool: &str,
        args: &[&str],
        dir: &Path,
        sink: &dyn MessageSink,
    ) -> Result<std::process::Output, ToolchainError> {
        worker_debug!("running {} {:?}", tool, args);
        let output = tokio::time::timeout(
            self.config.tool_timeout,
            Command::new(tool).args(args).current_dir(dir).output(),
        )
        .await
        .map_err(|_| ToolchainError::ToolFailed {
            tool: tool.to_string(),
            detail: "timed out".to_string(),
        })?
        .map_err(ToolchainError::Io)?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            sink.emit(RawEnvelope::debug(line));
        }
        Ok(output)
    }
}

#[async_trait::async_trait]
impl Toolchain for ProcessToolchain {
    async fn run(&self, files: &[JobFile], sink: &dyn MessageSink) -> Result<(), ToolchainError> {
        if files.is_empty() {
            return Err(ToolchainError::EmptyJob);
        }
        let scratch = self.make_scratch()?;
        write_job_files(scratch.path(), files)?;
        let main = files
            .iter()
            .find(|file| file.active)
            .unwrap_or(&files[0])
            .name
            .clone();

        sink.emit(RawEnvelope::progress(0.1));
        let compile = self
            .run_tool(
                &self.config.compiler,
                &["--r1cs", "--wasm", "--sym", "-o", ".", &main],
                scratch.path(),
                sink,
            )
            .await?;
        if !compile.status.success() {
            // The circuit is wrong, not the pipeline: surface the compiler's
            // own output as a visible entry and end the run normally.
            sink.emit(RawEnvelope::output(
                "error",
                String::from_utf8_lossy(&compile.stderr).trim(),
            ));
            sink.emit(RawEnvelope::progress(1.0));
            return Ok(());
        }
        sink.emit(RawEnvelope::output(
            "stdout",
            String::from_utf8_lossy(&compile.stdout).trim(),
        ));

        sink.emit(RawEnvelope::progress(0.6));
        let sarif_path = scratch.path().join("report.sarif");
        let sarif_arg = sarif_path.display().to_string();
        match self
            .run_tool(
                &self.config.analyzer,
                &["--sarif-file", &sarif_arg, &main],
                scratch.path(),
                sink,
            )
            .await
        {
            Ok(_) => {
                if let Ok(report) = std::fs::read_to_string(&sarif_path) {
                    if let Ok(value) = serde_json::from_str(&report) {
                        sink.emit(RawEnvelope::sarif(value));
                    }
                }
            }
            Err(err) => worker_debug!("analyzer unavailable: {err}"),
        }
        sink.emit(RawEnvelope::progress(1.0));

        let mut state = self.state.lock().expect("toolchain state lock");
        state.scratch = Some(scratch);
        state.main_file = Some(main);
        // Keys generated for earlier source no longer match.
        state.key_digest = None;
        Ok(())
    }

    async fn generate_keys(
        &self,
        scheme: KeyScheme,
        origin: &str,
        sink: &dyn MessageSink,
    ) -> Result<(), ToolchainError> {
        let (dir, main) = {
            let state = self.state.lock().expect("toolchain state lock");
            match (&state.scratch, &state.main_file) {
                (Some(scratch), Some(main)) => (scratch.path().to_path_buf(), main.clone()),
                _ => return Err(ToolchainError::NothingCompiled),
            }
        };
        let stem = main.strip_suffix(".circom").unwrap_or(&main).to_string();
        let r1cs = format!("{stem}.r1cs");
        let zkey = format!("{stem}.zkey");
        let verifier = match scheme {
            KeyScheme::Groth16 => format!("{stem}.groth16.sol"),
            KeyScheme::Plonk => format!("{stem}.plonk.sol"),
        };
        let ptau = self.config.ptau.display().to_string();

        sink.emit(RawEnvelope::progress(0.1));
        let setup_args: [&str; 5] = match scheme {
            KeyScheme::Groth16 => ["groth16", "setup", &r1cs, &ptau, &zkey],
            KeyScheme::Plonk => ["plonk", "setup", &r1cs, &ptau, &zkey],
        };
        let setup = self
            .run_tool(&self.config.prover, &setup_args, &dir, sink)
            .await?;
        if !setup.status.success() {
            return Err(ToolchainError::ToolFailed {
                tool: self.config.prover.clone(),
                detail: String::from_utf8_lossy(&setup.stderr).trim().to_string(),
            });
        }

        sink.emit(RawEnvelope::progress(0.5));
        let exports: [[&str; 5]; 2] = [
            ["zkey", "export", "verificationkey", &zkey, "verification_key.json"],
            ["zkey", "export", "solidityverifier", &zkey, &verifier],
        ];
        for export in exports {
            let output = self
                .run_tool(&self.config.prover, &export, &dir, sink)
                .await?;
            if !output.status.success() {
                return Err(ToolchainError::ToolFailed {
                    tool: self.config.prover.clone(),
                    detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }
        }

        sink.emit(RawEnvelope::progress(0.9));
        let mut files = BTreeMap::new();
        for name in [zkey.as_str(), "verification_key.json", verifier.as_str()] {
            let data = std::fs::read(dir.join(name))
                .map_err(|_| ToolchainError::MissingArtifact(name.to_string()))?;
            files.insert(name.to_string(), data);
        }
        let key_digest: [u8; 32] = Sha256::digest(&files[zkey.as_str()]).into();
        files.insert(
            "index.html".to_string(),
            sample_app_html(origin, &stem).into_bytes(),
        );

        self.state.lock().expect("toolchain state lock").key_digest = Some(key_digest);
        sink.emit(RawEnvelope::keys(
            scheme,
            format!("{} generated for {main}", scheme.tag()),
            files,
        ));
        sink.emit(RawEnvelope::progress(1.0));
        Ok(())
    }

    async fn check_key(&self, key: &[u8], sink: &dyn MessageSink) -> Result<(), ToolchainError> {
        let recorded = self
            .state
            .lock()
            .expect("toolchain state lock")
            .key_digest
            .ok_or(ToolchainError::NothingToVerify)?;
        let uploaded: [u8; 32] = Sha256::digest(key).into();
        if uploaded == recorded {
            sink.emit(RawEnvelope::output(
                "verified",
                "uploaded key matches the keys generated for the current source",
            ));
        } else {
            sink.emit(RawEnvelope::output(
                "verification failed",
                "uploaded key was not generated from the current source",
            ));
        }
        Ok(())
    }
}

/// Writes the job's buffers into the scratch dir, creating intermediate
/// directories for nested names. Names that would escape the dir are
/// rejected.
fn write_job_files(dir: &Path, files: &[JobFile]) -> Result<(), ToolchainError> {
    for file in files {
        let relative = Path::new(&file.name);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(ToolchainError::UnsafeFileName(file.name.clone()));
        }
        let target = dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, &file.value)?;
    }
    Ok(())
}

/// A minimal interactive proving page bundled with the generated keys. The
/// origin links the page back to the playground it came from.
fn sample_app_html(origin: &str, stem: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head><title>{stem} prover</title></head>\n<body>\n\
         <p>Generated by <a href=\"{origin}\">{origin}</a></p>\n\
         <script src=\"snarkjs.min.js\"></script>\n\
         <script>\n\
         async function prove(input) {{\n\
           return snarkjs.plonk.fullProve(input, '{stem}.wasm', '{stem}.zkey');\n\
         }}\n\
         </script>\n</body>\n</html>\n"
    )
}
