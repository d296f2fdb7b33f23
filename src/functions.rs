//! Spreadsheet-facing property functions.
//!
//! [`PropertyFunctions`] is the context a host embeds: it owns the
//! lazily-loaded computation module and the bounded cache of abstract
//! states, and exposes the four functions the original add-in registered
//! with its host, plus the best-effort warm-up hook.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::StateCache;
use crate::error::{CoolpropError, Result};
use crate::loader::ModuleLoader;
use crate::module::{LoaderConfig, NativeModule, PropertyModule};
use crate::resolve;

/// Default equation-of-state backend for cached states.
pub const DEFAULT_BACKEND: &str = "HEOS";

/// Error codes understood by the spreadsheet host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// The function received a value it cannot compute from.
    InvalidValue,
}

/// Uniform error surface of the exposed functions: one code the host
/// maps to a cell error, plus the underlying message text.
///
/// Every internal failure — unknown fluid, unknown input pair or output
/// name, out-of-domain inputs, a module that will not load — flattens
/// into this one shape; only the message distinguishes them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct FunctionError {
    pub code: ErrorCode,
    pub message: String,
}

impl From<CoolpropError> for FunctionError {
    fn from(err: CoolpropError) -> Self {
        Self {
            code: ErrorCode::InvalidValue,
            message: err.to_string(),
        }
    }
}

/// Context owning the lazily-loaded module and the state cache.
///
/// One instance serves a whole host process; dropping it tears down the
/// cache and the module.  Tests build a fresh context each, via
/// [`with_loader`](Self::with_loader).
pub struct PropertyFunctions {
    loader: ModuleLoader,
    cache: Mutex<StateCache>,
}

impl PropertyFunctions {
    /// Context backed by the CoolProp shared library.
    pub fn new(config: LoaderConfig) -> Self {
        Self::with_loader(ModuleLoader::new(move || {
            Ok(Arc::new(NativeModule::load(&config)?) as Arc<dyn PropertyModule>)
        }))
    }

    /// Context with a custom module source (tests, alternative engines).
    pub fn with_loader(loader: ModuleLoader) -> Self {
        Self {
            loader,
            cache: Mutex::new(StateCache::new()),
        }
    }

    /// Readiness probe.  Never touches the module.
    pub fn ready(&self) -> &'static str {
        "CoolProp ready (abstract states enabled)"
    }

    /// Best-effort eager load, for the host's application-ready hook.
    /// A failed attempt is logged and swallowed; later calls retry.
    pub fn warm_up(&self) {
        match self.loader.ensure_loaded() {
            Ok(_) => info!("CoolProp module pre-loaded"),
            Err(err) => warn!(error = %err, "CoolProp pre-load failed"),
        }
    }

    /// CoolProp version string, or an `"Error: …"` string when the
    /// module cannot be loaded (the host renders this in the cell).
    pub fn version(&self) -> String {
        match self.try_version() {
            Ok(version) => version,
            Err(err) => format!("Error: {err}"),
        }
    }

    fn try_version(&self) -> Result<String> {
        let module = self.loader.ensure_loaded()?;
        module.global_param("version")
    }

    /// High-level stateless property lookup (`PropsSI`).
    ///
    /// ```no_run
    /// # use coolprop::{LoaderConfig, PropertyFunctions};
    /// # let functions = PropertyFunctions::new(LoaderConfig::default());
    /// // Density of air at 25 °C, 1 atm.
    /// let rho = functions.props_si("D", "T", 298.15, "P", 101_325.0, "Air")?;
    /// # Ok::<(), coolprop::FunctionError>(())
    /// ```
    pub fn props_si(
        &self,
        output: &str,
        name1: &str,
        prop1: f64,
        name2: &str,
        prop2: f64,
        fluid: &str,
    ) -> std::result::Result<f64, FunctionError> {
        let module = self.loader.ensure_loaded()?;
        Ok(module.props_si(output, name1, prop1, name2, prop2, fluid)?)
    }

    /// Low-level property lookup through a cached abstract state on the
    /// default backend.
    ///
    /// The cache lock is held across the update-then-read sequence, so
    /// concurrent calls against the same cached state cannot observe
    /// each other's inputs.
    ///
    /// ```no_run
    /// # use coolprop::{LoaderConfig, PropertyFunctions};
    /// # let functions = PropertyFunctions::new(LoaderConfig::default());
    /// // Saturation temperature of water at 1 atm.
    /// let t = functions.state_props("Water", "PQ_INPUTS", 101_325.0, 0.0, "T")?;
    /// # Ok::<(), coolprop::FunctionError>(())
    /// ```
    pub fn state_props(
        &self,
        fluid: &str,
        input_pair: &str,
        value1: f64,
        value2: f64,
        output: &str,
    ) -> std::result::Result<f64, FunctionError> {
        Ok(self.state_props_inner(fluid, input_pair, value1, value2, output)?)
    }

    fn state_props_inner(
        &self,
        fluid: &str,
        input_pair: &str,
        value1: f64,
        value2: f64,
        output: &str,
    ) -> Result<f64> {
        let module = self.loader.ensure_loaded()?;
        let mut cache = self.cache.lock().map_err(|_| CoolpropError::Poisoned)?;
        let state = cache.get_or_create(module.as_ref(), fluid, DEFAULT_BACKEND)?;
        let pair = resolve::input_pair(module.as_ref(), input_pair)?;
        state.update(pair, value1, value2)?;
        let param = resolve::output_param(module.as_ref(), output)?;
        state.keyed_output(param)
    }
}
