use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;
use snarkpad_app::controller::Controller;
use snarkpad_app::deploy::{DeploySettings, NoWallet, SolcCompiler};
use snarkpad_app::effects::EffectRunner;
use snarkpad_app::logging::{initialize, LogDestination};
use snarkpad_app::render::render;
use snarkpad_core::{AppState, Msg};
use snarkpad_worker::{ProcessToolchain, ToolchainConfig};
use worker_logging::worker_warn;

/// Compiles the bundled example circuit once and prints the resulting
/// output view. The external toolchain commands must be on PATH.
fn main() -> anyhow::Result<()> {
    initialize(LogDestination::Terminal, LevelFilter::Info);

    let template = include_str!("../demos/example.circom");
    let state = AppState::with_template("main.circom", template, "42");
    let runner = EffectRunner::new(
        Arc::new(ProcessToolchain::new(ToolchainConfig::default())),
        Box::new(SolcCompiler::new(DeploySettings::default())),
        Box::new(NoWallet),
        "https://snarkpad.localhost/",
    );
    let mut controller = Controller::new(state, runner);

    controller.dispatch(Msg::RunRequested);
    if !controller.run_to_idle(Duration::from_secs(120)) {
        worker_warn!("run did not finish before the deadline");
    }

    for line in render(&controller.view()) {
        println!("{line}");
    }
    Ok(())
}
