//! The computation-module seam.
//!
//! The rest of the crate talks to CoolProp through the [`PropertyModule`]
//! and [`AbstractState`] traits.  [`NativeModule`] is the production
//! implementation backed by the dynamically-loaded shared library; tests
//! substitute a mock through the same seam.

use std::env;
use std::os::raw::{c_char, c_int, c_long};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CoolpropError, Result};
use crate::sys::{
    from_c_string, to_c_string, CoolpropLibrary, COOLPROP_MSG_LEN, COOLPROP_STRLEN,
};

// ── Module identifiers ──────────────────────────────────────────────

/// Identifier of an input pair in the module's enumerated table
/// (which two physical quantities an `update` supplies).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputPairId(pub i64);

/// Identifier of an output parameter in the module's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamId(pub i64);

// ── Traits ──────────────────────────────────────────────────────────

/// A stateful computation handle bound to one backend/fluid pair.
///
/// The engine manages the native memory behind a handle itself, so the
/// owner must call [`release`](AbstractState::release) when done with it.
pub trait AbstractState: Send {
    /// Push two input values into the state via the given input pair.
    /// The state afterwards reflects exactly these two inputs.
    fn update(&mut self, pair: InputPairId, value1: f64, value2: f64) -> Result<()>;

    /// Read a derived property from the current state.
    fn keyed_output(&self, param: ParamId) -> Result<f64>;

    /// Release the engine-side resources backing this state.  Safe to
    /// call more than once.
    fn release(&mut self);
}

/// The loaded computation module.
pub trait PropertyModule: Send + Sync {
    /// Construct a new abstract state for a backend/fluid pair.
    fn factory(&self, backend: &str, fluid: &str) -> Result<Box<dyn AbstractState>>;

    /// Look an input pair up by exact name in the module's enumerated
    /// table.  `None` when the name is not in the table.
    fn input_pair_index(&self, name: &str) -> Option<InputPairId>;

    /// Look an output parameter up by exact name.  `None` when the
    /// module does not know the parameter.
    fn param_index(&self, name: &str) -> Option<ParamId>;

    /// High-level stateless property lookup (`PropsSI`).
    fn props_si(
        &self,
        output: &str,
        name1: &str,
        prop1: f64,
        name2: &str,
        prop2: f64,
        fluid: &str,
    ) -> Result<f64>;

    /// Fetch a global string parameter (e.g. `"version"`).
    fn global_param(&self, name: &str) -> Result<String>;
}

// ── Loader configuration ────────────────────────────────────────────

/// Where to find the CoolProp shared library.
///
/// With `library_path` unset, discovery falls back to a `.env` file,
/// the `COOLPROP_PATH` environment variable, and the standard install
/// directories for the platform, in that order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Directory containing the CoolProp shared library.
    pub library_path: Option<PathBuf>,
}

// ── Native module ───────────────────────────────────────────────────

/// [`PropertyModule`] backed by the CoolProp shared library.
pub struct NativeModule {
    lib: Arc<CoolpropLibrary>,
}

impl NativeModule {
    /// Load the shared library and resolve its symbols.
    pub fn load(config: &LoaderConfig) -> Result<Self> {
        Self::load_dotenv();

        let dir = match &config.library_path {
            Some(path) => path.clone(),
            None => Self::find_library_dir()?,
        };
        info!(dir = %dir.display(), "loading CoolProp shared library");

        let lib = CoolpropLibrary::load_from_dir(&dir)
            .map_err(|e| CoolpropError::ModuleLoad(e.to_string()))?;
        debug!("CoolProp symbols resolved");

        let module = Self { lib: Arc::new(lib) };
        match module.global_param("version") {
            Ok(version) => info!(version = %version, "CoolProp module initialized"),
            Err(err) => warn!(error = %err, "CoolProp loaded but version query failed"),
        }
        Ok(module)
    }

    // ── .env loading (once) ─────────────────────────────────────────

    fn load_dotenv() {
        static DOTENV_INIT: Once = Once::new();
        DOTENV_INIT.call_once(|| {
            if dotenvy::dotenv().is_ok() {
                return;
            }
            if let Ok(dir) = env::var("CARGO_MANIFEST_DIR") {
                let p = PathBuf::from(dir).join(".env");
                if p.exists() {
                    let _ = dotenvy::from_path(&p);
                    return;
                }
            }
            if let Ok(exe) = env::current_exe() {
                if let Some(dir) = exe.parent() {
                    let p = dir.join(".env");
                    if p.exists() {
                        let _ = dotenvy::from_path(&p);
                    }
                }
            }
        });
    }

    // ── Path discovery ──────────────────────────────────────────────

    fn find_library_dir() -> Result<PathBuf> {
        let mut tried = Vec::<String>::new();

        if let Ok(path) = env::var("COOLPROP_PATH") {
            if Path::new(&path).exists() {
                return Ok(PathBuf::from(path));
            }
            tried.push(format!("COOLPROP_PATH={path} (directory does not exist)"));
        }

        #[cfg(target_os = "windows")]
        let standard_paths = [r"C:\Program Files\CoolProp", r"C:\CoolProp"];
        #[cfg(target_os = "linux")]
        let standard_paths = ["/usr/local/lib", "/opt/coolprop"];
        #[cfg(target_os = "macos")]
        let standard_paths = ["/usr/local/lib", "/opt/homebrew/lib", "/opt/coolprop"];

        for path in standard_paths {
            if Path::new(path).exists() {
                return Ok(PathBuf::from(path));
            }
            tried.push(format!("{path} (not found)"));
        }

        Err(CoolpropError::ModuleLoad(format!(
            "CoolProp directory not found. Tried:\n  - {}\n\
             Set COOLPROP_PATH to the directory containing the CoolProp shared library.",
            tried.join("\n  - ")
        )))
    }

    /// Human-readable message of the engine's most recent error.
    fn last_error(&self, fallback: &str) -> String {
        self.global_param("errstring")
            .ok()
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}

impl PropertyModule for NativeModule {
    fn factory(&self, backend: &str, fluid: &str) -> Result<Box<dyn AbstractState>> {
        let backend_c = to_c_string(backend, COOLPROP_STRLEN);
        let fluid_c = to_c_string(fluid, COOLPROP_STRLEN);
        let mut errcode: c_long = 0;
        let mut message: [c_char; COOLPROP_MSG_LEN] = [0; COOLPROP_MSG_LEN];

        let handle = unsafe {
            self.lib.AbstractState_factory(
                backend_c.as_ptr(),
                fluid_c.as_ptr(),
                &mut errcode,
                message.as_mut_ptr(),
                COOLPROP_MSG_LEN as c_long,
            )
        };
        if errcode != 0 {
            return Err(CoolpropError::Factory {
                backend: backend.to_string(),
                fluid: fluid.to_string(),
                message: from_c_string(&message),
            });
        }
        Ok(Box::new(NativeState {
            lib: Arc::clone(&self.lib),
            handle,
            released: false,
        }))
    }

    fn input_pair_index(&self, name: &str) -> Option<InputPairId> {
        let name_c = to_c_string(name, COOLPROP_STRLEN);
        let index = unsafe { self.lib.get_input_pair_index(name_c.as_ptr()) };
        (index >= 0).then_some(InputPairId(index as i64))
    }

    fn param_index(&self, name: &str) -> Option<ParamId> {
        let name_c = to_c_string(name, COOLPROP_STRLEN);
        let index = unsafe { self.lib.get_param_index(name_c.as_ptr()) };
        (index >= 0).then_some(ParamId(index as i64))
    }

    fn props_si(
        &self,
        output: &str,
        name1: &str,
        prop1: f64,
        name2: &str,
        prop2: f64,
        fluid: &str,
    ) -> Result<f64> {
        let output_c = to_c_string(output, COOLPROP_STRLEN);
        let name1_c = to_c_string(name1, COOLPROP_STRLEN);
        let name2_c = to_c_string(name2, COOLPROP_STRLEN);
        let fluid_c = to_c_string(fluid, COOLPROP_STRLEN);

        let value = unsafe {
            self.lib.PropsSI(
                output_c.as_ptr(),
                name1_c.as_ptr(),
                prop1,
                name2_c.as_ptr(),
                prop2,
                fluid_c.as_ptr(),
            )
        };
        // PropsSI signals failure with a non-finite result and leaves
        // the message in the errstring global parameter.
        if value.is_finite() {
            Ok(value)
        } else {
            Err(CoolpropError::Calculation(self.last_error(&format!(
                "PropsSI({output}, {name1}={prop1}, {name2}={prop2}, {fluid}) failed"
            ))))
        }
    }

    fn global_param(&self, name: &str) -> Result<String> {
        let name_c = to_c_string(name, COOLPROP_STRLEN);
        let mut buffer: [c_char; COOLPROP_MSG_LEN] = [0; COOLPROP_MSG_LEN];
        let ok = unsafe {
            self.lib.get_global_param_string(
                name_c.as_ptr(),
                buffer.as_mut_ptr(),
                COOLPROP_MSG_LEN as c_int,
            )
        };
        if ok == 1 {
            Ok(from_c_string(&buffer))
        } else {
            Err(CoolpropError::Calculation(format!(
                "global parameter {name:?} unavailable"
            )))
        }
    }
}

// ── Native abstract state ───────────────────────────────────────────

struct NativeState {
    lib: Arc<CoolpropLibrary>,
    handle: c_long,
    released: bool,
}

impl AbstractState for NativeState {
    fn update(&mut self, pair: InputPairId, value1: f64, value2: f64) -> Result<()> {
        let mut errcode: c_long = 0;
        let mut message: [c_char; COOLPROP_MSG_LEN] = [0; COOLPROP_MSG_LEN];
        unsafe {
            self.lib.AbstractState_update(
                self.handle,
                pair.0 as c_long,
                value1,
                value2,
                &mut errcode,
                message.as_mut_ptr(),
                COOLPROP_MSG_LEN as c_long,
            );
        }
        if errcode != 0 {
            return Err(CoolpropError::Calculation(from_c_string(&message)));
        }
        Ok(())
    }

    fn keyed_output(&self, param: ParamId) -> Result<f64> {
        let mut errcode: c_long = 0;
        let mut message: [c_char; COOLPROP_MSG_LEN] = [0; COOLPROP_MSG_LEN];
        let value = unsafe {
            self.lib.AbstractState_keyed_output(
                self.handle,
                param.0 as c_long,
                &mut errcode,
                message.as_mut_ptr(),
                COOLPROP_MSG_LEN as c_long,
            )
        };
        if errcode != 0 {
            return Err(CoolpropError::Calculation(from_c_string(&message)));
        }
        Ok(value)
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut errcode: c_long = 0;
        let mut message: [c_char; COOLPROP_MSG_LEN] = [0; COOLPROP_MSG_LEN];
        unsafe {
            self.lib.AbstractState_free(
                self.handle,
                &mut errcode,
                message.as_mut_ptr(),
                COOLPROP_MSG_LEN as c_long,
            );
        }
        if errcode != 0 {
            warn!(
                code = errcode as i64,
                message = %from_c_string(&message),
                "failed to free abstract state"
            );
        }
    }
}

impl Drop for NativeState {
    fn drop(&mut self) {
        self.release();
    }
}
