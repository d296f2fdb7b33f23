//! Lazy, coalescing loader for the computation module.
//!
//! The module is loaded at most once per context.  Any number of threads
//! may request it concurrently; while a load is in flight every caller
//! joins it and observes the same outcome.  A failed attempt clears back
//! to the unloaded state so a later call can retry.

use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::{CoolpropError, Result};
use crate::module::PropertyModule;

type LoadFn = dyn Fn() -> Result<Arc<dyn PropertyModule>> + Send + Sync;

enum LoadState {
    Unloaded,
    Loading,
    Ready(Arc<dyn PropertyModule>),
}

struct LoaderInner {
    state: LoadState,
    /// Monotonic id of the current or most recent load attempt.
    attempt: u64,
    /// Attempt id and message of the most recent failure, so callers
    /// that joined that attempt observe it.
    failure: Option<(u64, String)>,
}

/// State machine `{Unloaded, Loading, Ready}` guarded by a mutex and a
/// condition variable.  The load itself runs outside the lock; only the
/// state transitions hold it.
pub struct ModuleLoader {
    inner: Mutex<LoaderInner>,
    loaded: Condvar,
    load: Box<LoadFn>,
}

impl ModuleLoader {
    /// Loader around an arbitrary module source.  The closure is invoked
    /// at most once per attempt, never concurrently with itself.
    pub fn new(
        load: impl Fn() -> Result<Arc<dyn PropertyModule>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Mutex::new(LoaderInner {
                state: LoadState::Unloaded,
                attempt: 0,
                failure: None,
            }),
            loaded: Condvar::new(),
            load: Box::new(load),
        }
    }

    /// Return the loaded module, loading it first if needed.
    pub fn ensure_loaded(&self) -> Result<Arc<dyn PropertyModule>> {
        let mut inner = self.lock()?;
        loop {
            match &inner.state {
                LoadState::Ready(module) => return Ok(Arc::clone(module)),
                LoadState::Loading => {
                    let joined = inner.attempt;
                    while matches!(inner.state, LoadState::Loading) && inner.attempt == joined {
                        inner = self
                            .loaded
                            .wait(inner)
                            .map_err(|_| CoolpropError::Poisoned)?;
                    }
                    if let LoadState::Ready(module) = &inner.state {
                        return Ok(Arc::clone(module));
                    }
                    if let Some((attempt, message)) = &inner.failure {
                        if *attempt == joined {
                            return Err(CoolpropError::ModuleLoad(message.clone()));
                        }
                    }
                    // A newer attempt superseded the one we joined;
                    // re-evaluate from the top.
                }
                LoadState::Unloaded => {
                    inner.attempt += 1;
                    inner.state = LoadState::Loading;
                    break;
                }
            }
        }
        let attempt = inner.attempt;
        drop(inner);

        debug!(attempt, "loading computation module");
        let outcome = (self.load)();

        let mut inner = self.lock()?;
        let result = match outcome {
            Ok(module) => {
                debug!(attempt, "computation module ready");
                inner.state = LoadState::Ready(Arc::clone(&module));
                Ok(module)
            }
            Err(err) => {
                let message = match &err {
                    CoolpropError::ModuleLoad(msg) => msg.clone(),
                    other => other.to_string(),
                };
                warn!(attempt, error = %message, "computation module load failed");
                inner.state = LoadState::Unloaded;
                inner.failure = Some((attempt, message));
                Err(err)
            }
        };
        drop(inner);
        self.loaded.notify_all();
        result
    }

    /// Whether a load has already completed successfully.
    pub fn is_ready(&self) -> bool {
        self.lock()
            .map(|inner| matches!(inner.state, LoadState::Ready(_)))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, LoaderInner>> {
        self.inner.lock().map_err(|_| CoolpropError::Poisoned)
    }
}
