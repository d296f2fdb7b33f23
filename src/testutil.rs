//! Test doubles for the computation-module seam.

use std::collections::HashMap;
use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, Mutex};

use crate::error::{CoolpropError, Result};
use crate::module::{AbstractState, InputPairId, ParamId, PropertyModule};

pub(crate) const PT_INPUTS: i64 = 9;
pub(crate) const PQ_INPUTS: i64 = 2;
pub(crate) const QT_INPUTS: i64 = 1;

pub(crate) const PARAM_T: i64 = 1;
pub(crate) const PARAM_P: i64 = 2;
pub(crate) const PARAM_DMASS: i64 = 3;
pub(crate) const PARAM_HMASS: i64 = 4;
pub(crate) const PARAM_Q: i64 = 5;
pub(crate) const PARAM_SPEED_OF_SOUND: i64 = 6;
pub(crate) const PARAM_MOLAR_MASS: i64 = 7;

/// In-memory [`PropertyModule`] with deterministic arithmetic: a state
/// echoes back the inputs it was last updated with, keyed by which slot
/// of the input pair carries which quantity.  `"Unobtainium"` is the
/// fluid that every construction path rejects.
pub(crate) struct MockModule {
    input_pairs: HashMap<&'static str, i64>,
    params: HashMap<&'static str, i64>,
    pub(crate) factory_calls: AtomicUsize,
    released: Arc<Mutex<Vec<String>>>,
}

impl MockModule {
    pub(crate) fn new() -> Self {
        let input_pairs = HashMap::from([
            ("QT_INPUTS", QT_INPUTS),
            ("PQ_INPUTS", PQ_INPUTS),
            ("PT_INPUTS", PT_INPUTS),
        ]);
        let params = HashMap::from([
            ("T", PARAM_T),
            ("P", PARAM_P),
            ("Dmass", PARAM_DMASS),
            ("Hmass", PARAM_HMASS),
            ("Q", PARAM_Q),
            ("speed_of_sound", PARAM_SPEED_OF_SOUND),
            ("molar_mass", PARAM_MOLAR_MASS),
        ]);
        Self {
            input_pairs,
            params,
            factory_calls: AtomicUsize::new(0),
            released: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// `"backend:fluid"` labels of every state released so far, in
    /// release order.
    pub(crate) fn released_labels(&self) -> Vec<String> {
        self.released.lock().unwrap().clone()
    }
}

impl PropertyModule for MockModule {
    fn factory(&self, backend: &str, fluid: &str) -> Result<Box<dyn AbstractState>> {
        self.factory_calls
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if fluid == "Unobtainium" {
            return Err(CoolpropError::Factory {
                backend: backend.to_string(),
                fluid: fluid.to_string(),
                message: "fluid not found".to_string(),
            });
        }
        Ok(Box::new(MockState {
            label: format!("{backend}:{fluid}"),
            released: Arc::clone(&self.released),
            pair: None,
            value1: f64::NAN,
            value2: f64::NAN,
        }))
    }

    fn input_pair_index(&self, name: &str) -> Option<InputPairId> {
        self.input_pairs.get(name).map(|&index| InputPairId(index))
    }

    fn param_index(&self, name: &str) -> Option<ParamId> {
        self.params.get(name).map(|&index| ParamId(index))
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
        if fluid == "Unobtainium" {
            return Err(CoolpropError::Calculation(format!(
                "PropsSI: unknown fluid Unobtainium ({output},{name1},{name2})"
            )));
        }
        if name1.eq_ignore_ascii_case(output) {
            return Ok(prop1);
        }
        if name2.eq_ignore_ascii_case(output) {
            return Ok(prop2);
        }
        Ok(prop1 + prop2)
    }

    fn global_param(&self, name: &str) -> Result<String> {
        match name {
            "version" => Ok("6.6.0-mock".to_string()),
            other => Err(CoolpropError::Calculation(format!(
                "global parameter {other:?} unavailable"
            ))),
        }
    }
}

pub(crate) struct MockState {
    label: String,
    released: Arc<Mutex<Vec<String>>>,
    pair: Option<InputPairId>,
    value1: f64,
    value2: f64,
}

impl AbstractState for MockState {
    fn update(&mut self, pair: InputPairId, value1: f64, value2: f64) -> Result<()> {
        if !value1.is_finite() || !value2.is_finite() {
            return Err(CoolpropError::Calculation(
                "inputs must be finite".to_string(),
            ));
        }
        self.pair = Some(pair);
        self.value1 = value1;
        self.value2 = value2;
        Ok(())
    }

    fn keyed_output(&self, param: ParamId) -> Result<f64> {
        let Some(pair) = self.pair else {
            return Err(CoolpropError::Calculation(
                "state has no inputs yet".to_string(),
            ));
        };
        let value = match (pair.0, param.0) {
            (PT_INPUTS, PARAM_P) | (PQ_INPUTS, PARAM_P) => self.value1,
            (PT_INPUTS, PARAM_T) | (QT_INPUTS, PARAM_T) => self.value2,
            (PQ_INPUTS, PARAM_Q) => self.value2,
            (QT_INPUTS, PARAM_Q) => self.value1,
            (_, PARAM_MOLAR_MASS) => 0.018,
            // Any derived quantity: deterministic but arbitrary.
            _ => self.value1 + self.value2,
        };
        Ok(value)
    }

    fn release(&mut self) {
        self.released.lock().unwrap().push(self.label.clone());
    }
}
