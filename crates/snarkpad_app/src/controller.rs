use std::time::{Duration, Instant};

use snarkpad_core::{update, AppState, AppViewModel, Msg};

use crate::effects::EffectRunner;

/// Owns the application state and the effect runner: messages go through the
/// pure update function, the resulting effects are applied, and whatever the
/// runner produces is fed back in.
pub struct Controller {
    state: AppState,
    runner: EffectRunner,
}

impl Controller {
    pub fn new(state: AppState, runner: EffectRunner) -> Self {
        Self { state, runner }
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        worker_logging::set_run_tag(self.state.run_token().map_or(0, |token| token.get()));
        self.runner.apply(effects);
    }

    /// Drains pending worker and deployment messages into the state machine.
    pub fn pump(&mut self) {
        while let Some(msg) = self.runner.poll() {
            self.dispatch(msg);
        }
    }

    /// Pumps until the controller is idle or the deadline passes. Returns
    /// false on timeout.
    pub fn run_to_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.state.run_token().is_none() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn view(&self) -> AppViewModel {
        self.state.view()
    }

    /// Returns the dirty flag and clears it; the shell re-renders only when
    /// this returns true.
    pub fn take_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    pub fn runner(&self) -> &EffectRunner {
        &self.runner
    }
}
