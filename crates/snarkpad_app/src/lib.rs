//! Snarkpad shell: controller pump, effect runner, deployment seam, and
//! plain-text rendering of the output view.
pub mod controller;
pub mod deploy;
pub mod effects;
pub mod hover;
pub mod logging;
pub mod render;
