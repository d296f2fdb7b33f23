//! # coolprop
//!
//! Safe Rust bindings for [CoolProp](https://www.coolprop.org) —
//! thermophysical properties of pure fluids and mixtures, exposed as the
//! spreadsheet-style functions of the original add-in: a high-level
//! `PropsSI` lookup and a low-level lookup through cached abstract
//! states.
//!
//! ## Highlights
//!
//! * **Lazy, coalescing load** — the shared library is loaded at most
//!   once per context, no matter how many threads ask at the same time
//! * **Bounded state cache** — abstract states are kept per
//!   `(backend, fluid)` pair, evicted in insertion order past capacity
//! * **Forgiving names** — `"rhomass"`, `"RhoMass"` and `"Dmass"` all
//!   reach the same parameter
//! * **One error shape** — every failure surfaces as an invalid-value
//!   error carrying the engine's message, the way the host expects it
//!
//! ## Quick example
//!
//! ```no_run
//! use coolprop::{LoaderConfig, PropertyFunctions};
//!
//! let functions = PropertyFunctions::new(LoaderConfig::default());
//!
//! // Saturation temperature of water at 1 atm, through a cached state.
//! let t_sat = functions.state_props("Water", "PQ_INPUTS", 101_325.0, 0.0, "T")?;
//! println!("T_sat = {t_sat:.2} K");
//!
//! // Density of air at ambient conditions, stateless.
//! let rho = functions.props_si("D", "T", 298.15, "P", 101_325.0, "Air")?;
//! println!("rho = {rho:.3} kg/m³");
//! # Ok::<(), coolprop::FunctionError>(())
//! ```
//!
//! ## Locating the engine
//!
//! The CoolProp shared library is found through
//! [`LoaderConfig::library_path`], or — when unset — a `.env` file, the
//! `COOLPROP_PATH` environment variable, and the platform's standard
//! install directories, in that order.

// ── Internal modules ─────────────────────────────────────────────────
pub mod cache;
pub mod error;
pub mod functions;
pub mod loader;
pub mod module;
pub mod resolve;
pub mod sys;

#[cfg(test)]
mod testutil;

// ── Public re-exports ────────────────────────────────────────────────
pub use cache::{StateCache, StateKey, STATE_CACHE_CAPACITY};
pub use error::{CoolpropError, Result};
pub use functions::{ErrorCode, FunctionError, PropertyFunctions, DEFAULT_BACKEND};
pub use loader::ModuleLoader;
pub use module::{
    AbstractState, InputPairId, LoaderConfig, NativeModule, ParamId, PropertyModule,
};
