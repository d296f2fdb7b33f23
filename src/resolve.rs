//! Translation of user-facing property names into module identifiers.
//!
//! Input pairs come straight from the module's enumerated table.  Output
//! names go through a closed, case-insensitive table mapping the names
//! spreadsheet users type to the parameter names the module expects; a
//! name the table does not know passes through verbatim, so parameters
//! added to the engine later remain reachable.

use crate::error::{CoolpropError, Result};
use crate::module::{InputPairId, ParamId, PropertyModule};

/// Resolve an input-pair name (e.g. `"PT_INPUTS"`) through the module's
/// enumerated table.
pub fn input_pair(module: &dyn PropertyModule, name: &str) -> Result<InputPairId> {
    module
        .input_pair_index(name)
        .ok_or_else(|| CoolpropError::UnknownInputPair {
            name: name.to_string(),
        })
}

/// Resolve a case-insensitive output name (e.g. `"rhomass"`, `"T"`) to a
/// parameter id, verifying the module actually knows the resolved
/// parameter.
pub fn output_param(module: &dyn PropertyModule, name: &str) -> Result<ParamId> {
    let lower = name.to_lowercase();
    let resolved = match lower.as_str() {
        "t" => "T",
        "p" => "P",
        "rhomass" => "Dmass",
        "rhomolar" => "Dmolar",
        "hmass" => "Hmass",
        "hmolar" => "Hmolar",
        "smass" => "Smass",
        "smolar" => "Smolar",
        "umass" => "Umass",
        "umolar" => "Umolar",
        "cpmass" => "Cpmass",
        "cpmolar" => "Cpmolar",
        "cvmass" => "Cvmass",
        "cvmolar" => "Cvmolar",
        "viscosity" => "viscosity",
        "conductivity" => "conductivity",
        "speed_sound" => "speed_of_sound",
        "q" => "Q",
        "prandtl" => "Prandtl",
        "surface_tension" => "surface_tension",
        "gibbsmass" => "Gmass",
        "helmholtzmass" => "Helmholtzmass",
        "t_critical" => "T_critical",
        "p_critical" => "p_critical",
        "rhomass_critical" => "rhomass_critical",
        "molar_mass" => "molar_mass",
        "gas_constant" => "gas_constant",
        "acentric_factor" => "acentric_factor",
        // Not in the table: pass the given spelling through verbatim.
        _ => name,
    };
    module
        .param_index(resolved)
        .ok_or_else(|| CoolpropError::UnknownOutput(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{self, MockModule};

    #[test]
    fn input_pair_resolves_through_the_module_table() {
        let module = MockModule::new();
        let pair = input_pair(&module, "PT_INPUTS").unwrap();
        assert_eq!(pair, InputPairId(testutil::PT_INPUTS));
    }

    #[test]
    fn unknown_input_pair_error_lists_example_names() {
        let module = MockModule::new();
        let err = input_pair(&module, "XY_INPUTS").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("XY_INPUTS"), "{message}");
        assert!(message.contains("PT_INPUTS"), "{message}");
        assert!(message.contains("PQ_INPUTS"), "{message}");
    }

    #[test]
    fn output_names_map_case_insensitively() {
        let module = MockModule::new();
        assert_eq!(
            output_param(&module, "rhomass").unwrap(),
            ParamId(testutil::PARAM_DMASS)
        );
        assert_eq!(
            output_param(&module, "RhoMass").unwrap(),
            ParamId(testutil::PARAM_DMASS)
        );
        assert_eq!(output_param(&module, "T").unwrap(), ParamId(testutil::PARAM_T));
        assert_eq!(
            output_param(&module, "speed_sound").unwrap(),
            ParamId(testutil::PARAM_SPEED_OF_SOUND)
        );
    }

    #[test]
    fn names_outside_the_table_pass_through_verbatim() {
        let module = MockModule::new();
        // "Dmass" is not a user-facing table key, but the module knows
        // the parameter directly.
        assert_eq!(
            output_param(&module, "Dmass").unwrap(),
            ParamId(testutil::PARAM_DMASS)
        );
        assert_eq!(
            output_param(&module, "speed_of_sound").unwrap(),
            ParamId(testutil::PARAM_SPEED_OF_SOUND)
        );
    }

    #[test]
    fn unknown_output_fails_after_fallback() {
        let module = MockModule::new();
        let err = output_param(&module, "frobnicate").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Unknown output property"), "{message}");
        assert!(message.contains("frobnicate"), "{message}");
    }
}
