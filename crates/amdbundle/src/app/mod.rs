//! Application layer: naming modules, bundling targets, and wiring compression.

pub mod compile;
pub mod compress;
pub mod detect;
pub mod expand;
pub mod normalize;
pub mod targets;
pub mod watch;
