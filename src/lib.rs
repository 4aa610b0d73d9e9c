// Reusable library API, shared by the CLI and WASM builds
pub mod actions;
pub mod equation;
pub mod errors;
pub mod heuristics;
pub mod history;
pub mod interner;
pub mod log;
pub mod parser;
pub mod sigma;
pub mod solver;
pub mod state;
pub mod symbol;

// Compile the wasm glue only when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;
