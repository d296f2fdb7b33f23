use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoolpropError {
    /// The CoolProp shared library could not be located or instantiated.
    #[error("CoolProp module load failed: {0}")]
    ModuleLoad(String),

    /// `AbstractState` construction failed (unknown fluid or backend).
    #[error("cannot create state for {backend}::{fluid}: {message}")]
    Factory {
        backend: String,
        fluid: String,
        message: String,
    },

    /// An input-pair name absent from the module's enumerated table.
    #[error(
        "Unknown input pair: {name}. Valid: PT_INPUTS, PQ_INPUTS, QT_INPUTS, DmassT_INPUTS, etc."
    )]
    UnknownInputPair { name: String },

    /// An output name that resolves to nothing the module can compute.
    #[error("Unknown output property: {0}")]
    UnknownOutput(String),

    /// Error reported by the engine during a computation
    /// (e.g. out-of-domain inputs).
    #[error("CoolProp error: {0}")]
    Calculation(String),

    /// A shared lock was poisoned by a panic in another thread.
    #[error("internal lock poisoned (a previous call panicked)")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CoolpropError>;
