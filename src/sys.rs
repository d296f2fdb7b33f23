//! Low-level FFI bindings for the CoolProp shared library.
//!
//! This module dynamically loads CoolProp (DLL/so/dylib) at runtime via
//! [`libloading`] and pre-resolves all function pointers for
//! zero-overhead calls.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_double, c_int, c_long};
use std::path::Path;

use libloading::Library;

// ── CoolProp constants ──────────────────────────────────────────────
/// Buffer length for short parameter/name strings.
pub const COOLPROP_STRLEN: usize = 255;
/// Buffer length for error-message strings returned by the engine.
pub const COOLPROP_MSG_LEN: usize = 1000;

// ── Error type ──────────────────────────────────────────────────────
#[derive(Debug)]
pub enum CoolpropSysError {
    /// The shared library could not be found or loaded.
    LibraryLoadFailed(String),
    /// A required symbol was not found in the library.
    SymbolNotFound(String),
}

impl std::fmt::Display for CoolpropSysError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LibraryLoadFailed(msg) => write!(f, "CoolProp library load failed: {msg}"),
            Self::SymbolNotFound(sym) => {
                write!(f, "Symbol not found in CoolProp library: {sym}")
            }
        }
    }
}

impl std::error::Error for CoolpropSysError {}

// ── Function pointer type aliases ───────────────────────────────────
// These match the C calling convention of CoolPropLib.h.

/// PropsSI(Output, Name1, Prop1, Name2, Prop2, Ref)
type FnPropsSI = unsafe extern "C" fn(
    *const c_char,
    *const c_char,
    c_double,
    *const c_char,
    c_double,
    *const c_char,
) -> c_double;

/// get_global_param_string(param, Output, n)
type FnGetGlobalParamString = unsafe extern "C" fn(*const c_char, *mut c_char, c_int) -> c_long;

/// get_param_index / get_input_pair_index – same signature:
/// (name) -> index, negative when unknown
type FnGetIndex = unsafe extern "C" fn(*const c_char) -> c_long;

/// AbstractState_factory(backend, fluids, errcode, message_buffer, buffer_length)
type FnStateFactory =
    unsafe extern "C" fn(*const c_char, *const c_char, *mut c_long, *mut c_char, c_long) -> c_long;

/// AbstractState_free(handle, errcode, message_buffer, buffer_length)
type FnStateFree = unsafe extern "C" fn(c_long, *mut c_long, *mut c_char, c_long);

/// AbstractState_update(handle, input_pair, value1, value2, errcode, message_buffer, buffer_length)
type FnStateUpdate = unsafe extern "C" fn(
    c_long,
    c_long,
    c_double,
    c_double,
    *mut c_long,
    *mut c_char,
    c_long,
);

/// AbstractState_keyed_output(handle, param, errcode, message_buffer, buffer_length)
type FnStateKeyedOutput =
    unsafe extern "C" fn(c_long, c_long, *mut c_long, *mut c_char, c_long) -> c_double;

// ── Dynamic library wrapper ─────────────────────────────────────────

/// Holds a dynamically-loaded CoolProp shared library with **pre-resolved
/// function pointers** for zero-overhead calls.
///
/// All function symbols are resolved once at construction time.  If any
/// required symbol is missing the constructor returns an error instead
/// of panicking later.
///
/// All methods are `unsafe` because they forward raw pointers to C++
/// code that cannot be verified by the Rust compiler.
pub struct CoolpropLibrary {
    /// The underlying library handle.  Must stay alive to keep the
    /// shared library loaded and the function pointers valid.
    _lib: Library,

    // ── Cached function pointers ────────────────────────────────────
    fn_props_si: FnPropsSI,
    fn_get_global_param_string: FnGetGlobalParamString,
    fn_get_input_pair_index: FnGetIndex,
    fn_get_param_index: FnGetIndex,
    fn_state_factory: FnStateFactory,
    fn_state_free: FnStateFree,
    fn_state_update: FnStateUpdate,
    fn_state_keyed_output: FnStateKeyedOutput,
}

impl CoolpropLibrary {
    // ── Symbol resolution ───────────────────────────────────────────

    /// Resolve a single symbol from the library as a typed function
    /// pointer.  Returns `Err(SymbolNotFound)` if the symbol is absent.
    fn resolve<T: Copy>(lib: &Library, name: &[u8]) -> Result<T, CoolpropSysError> {
        // SAFETY: We are loading a known symbol name from a CoolProp
        // shared library.  The caller (resolve_all) ensures all type
        // aliases match the actual C calling convention.
        let sym: libloading::Symbol<T> = unsafe { lib.get(name) }.map_err(|_| {
            // Strip trailing \0 for display.
            let display =
                String::from_utf8_lossy(&name[..name.len().saturating_sub(1)]).to_string();
            CoolpropSysError::SymbolNotFound(display)
        })?;
        Ok(*sym)
    }

    /// Resolve **all** required CoolProp symbols from an already-loaded
    /// library.  Fails on the first missing symbol.
    fn resolve_all(lib: Library) -> Result<Self, CoolpropSysError> {
        Ok(Self {
            fn_props_si: Self::resolve(&lib, b"PropsSI\0")?,
            fn_get_global_param_string: Self::resolve(&lib, b"get_global_param_string\0")?,
            fn_get_input_pair_index: Self::resolve(&lib, b"get_input_pair_index\0")?,
            fn_get_param_index: Self::resolve(&lib, b"get_param_index\0")?,
            fn_state_factory: Self::resolve(&lib, b"AbstractState_factory\0")?,
            fn_state_free: Self::resolve(&lib, b"AbstractState_free\0")?,
            fn_state_update: Self::resolve(&lib, b"AbstractState_update\0")?,
            fn_state_keyed_output: Self::resolve(&lib, b"AbstractState_keyed_output\0")?,
            _lib: lib,
        })
    }

    // ── Constructors ────────────────────────────────────────────────

    /// Try to load the CoolProp shared library from a **directory** that
    /// contains the DLL / .so / .dylib.  Common file names are tried
    /// automatically.
    ///
    /// If a candidate file exists but cannot be loaded (e.g. architecture
    /// mismatch), the next candidate is tried.
    ///
    /// All required symbols are resolved eagerly.  If any symbol is
    /// missing, an error is returned immediately.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CoolpropSysError> {
        let candidates: &[&str] = if cfg!(target_os = "windows") {
            &["CoolProp.dll", "libCoolProp.dll"]
        } else if cfg!(target_os = "macos") {
            &["libCoolProp.dylib", "libcoolprop.dylib"]
        } else {
            &["libCoolProp.so", "libcoolprop.so"]
        };

        let mut errors = Vec::new();

        // 1. Try full paths inside the directory.
        //    If a file exists but fails to load, keep trying the rest.
        for name in candidates {
            let full = dir.join(name);
            if full.exists() {
                match unsafe { Library::new(&full) } {
                    Ok(lib) => return Self::resolve_all(lib),
                    Err(e) => {
                        errors.push(format!("{}: {e}", full.display()));
                    }
                }
            }
        }

        // 2. Fall back to system-wide search (PATH / LD_LIBRARY_PATH)
        for name in candidates {
            if let Ok(lib) = unsafe { Library::new(*name) } {
                return Self::resolve_all(lib);
            }
        }

        let detail = if errors.is_empty() {
            format!(
                "No CoolProp library found in {} (tried: {candidates:?})",
                dir.display()
            )
        } else {
            format!(
                "CoolProp library found but could not be loaded:\n  - {}",
                errors.join("\n  - ")
            )
        };
        Err(CoolpropSysError::LibraryLoadFailed(detail))
    }

    /// Load the CoolProp shared library from an **exact file path**.
    pub fn load_from_file(path: &Path) -> Result<Self, CoolpropSysError> {
        let lib = unsafe { Library::new(path) }
            .map_err(|e| CoolpropSysError::LibraryLoadFailed(format!("{}: {e}", path.display())))?;
        Self::resolve_all(lib)
    }

    // ── CoolProp function wrappers ──────────────────────────────────
    //
    // Each method calls the pre-resolved function pointer directly.
    // No symbol lookup occurs at call time.

    /// High-level property lookup.  Returns a non-finite value on
    /// failure; the message is then available via the `errstring`
    /// global parameter.
    pub unsafe fn PropsSI(
        &self,
        output: *const c_char,
        name1: *const c_char,
        prop1: c_double,
        name2: *const c_char,
        prop2: c_double,
        fluid: *const c_char,
    ) -> c_double {
        unsafe { (self.fn_props_si)(output, name1, prop1, name2, prop2, fluid) }
    }

    /// Fetch a global string parameter (version, errstring, …).
    /// Returns 1 on success.
    pub unsafe fn get_global_param_string(
        &self,
        param: *const c_char,
        output: *mut c_char,
        n: c_int,
    ) -> c_long {
        unsafe { (self.fn_get_global_param_string)(param, output, n) }
    }

    /// Index of a named input pair in the engine's enumerated table.
    /// Negative when the name is unknown.
    pub unsafe fn get_input_pair_index(&self, name: *const c_char) -> c_long {
        unsafe { (self.fn_get_input_pair_index)(name) }
    }

    /// Index of a named output parameter.  Negative when unknown.
    pub unsafe fn get_param_index(&self, name: *const c_char) -> c_long {
        unsafe { (self.fn_get_param_index)(name) }
    }

    /// Construct an abstract state for a backend/fluid pair.  Returns
    /// the engine-side handle.
    pub unsafe fn AbstractState_factory(
        &self,
        backend: *const c_char,
        fluids: *const c_char,
        errcode: *mut c_long,
        message_buffer: *mut c_char,
        buffer_length: c_long,
    ) -> c_long {
        unsafe { (self.fn_state_factory)(backend, fluids, errcode, message_buffer, buffer_length) }
    }

    /// Release the engine-side resources of an abstract state.
    pub unsafe fn AbstractState_free(
        &self,
        handle: c_long,
        errcode: *mut c_long,
        message_buffer: *mut c_char,
        buffer_length: c_long,
    ) {
        unsafe { (self.fn_state_free)(handle, errcode, message_buffer, buffer_length) }
    }

    /// Push two input values into an abstract state.
    pub unsafe fn AbstractState_update(
        &self,
        handle: c_long,
        input_pair: c_long,
        value1: c_double,
        value2: c_double,
        errcode: *mut c_long,
        message_buffer: *mut c_char,
        buffer_length: c_long,
    ) {
        unsafe {
            (self.fn_state_update)(
                handle,
                input_pair,
                value1,
                value2,
                errcode,
                message_buffer,
                buffer_length,
            )
        }
    }

    /// Read a derived property of an abstract state by parameter index.
    pub unsafe fn AbstractState_keyed_output(
        &self,
        handle: c_long,
        param: c_long,
        errcode: *mut c_long,
        message_buffer: *mut c_char,
        buffer_length: c_long,
    ) -> c_double {
        unsafe {
            (self.fn_state_keyed_output)(handle, param, errcode, message_buffer, buffer_length)
        }
    }
}

// ── String helpers ──────────────────────────────────────────────────

/// Convert a Rust `&str` into a zero-padded `Vec<c_char>` of length
/// `max_len`, suitable for passing to the C API.
pub fn to_c_string(s: &str, max_len: usize) -> Vec<c_char> {
    let mut buffer = vec![0 as c_char; max_len];
    let bytes = s.as_bytes();
    let copy_len = bytes.len().min(max_len - 1);
    for i in 0..copy_len {
        buffer[i] = bytes[i] as c_char;
    }
    buffer
}

/// Convert a null-terminated (or fully-filled) C `c_char` buffer back
/// into a trimmed Rust `String`.
pub fn from_c_string(buffer: &[c_char]) -> String {
    let bytes: Vec<u8> = buffer
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).trim().to_string()
}
