//! # Solver Output Codes
//!
//! Numeric codes selecting one output quantity of a response type for a
//! given element family, as consumed by the `ATTA` field of an atomic
//! response. Only the families the synthesis procedures sample are
//! registered; asking for anything else is an unsupported
//! configuration, not a silent zero.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::{DeckError, DeckResult};

static OUTPUT_CODES: Lazy<HashMap<(&'static str, &'static str), HashMap<&'static str, u64>>> =
    Lazy::new(|| {
        let mut table = HashMap::new();

        let mut stress_cbar = HashMap::new();
        stress_cbar.insert("Axial", 6);
        stress_cbar.insert("End A maximum", 7);
        stress_cbar.insert("End A minimum", 8);
        stress_cbar.insert("End B maximum", 14);
        stress_cbar.insert("End B minimum", 15);
        table.insert(("STRESS", "CBAR"), stress_cbar);

        let mut stress_cquad4 = HashMap::new();
        stress_cquad4.insert("von Mises or maximum shear at Z1", 9);
        stress_cquad4.insert("von Mises or maximum shear at Z2", 17);
        table.insert(("STRESS", "CQUAD4"), stress_cquad4);

        let mut force_cbar = HashMap::new();
        force_cbar.insert("Bending End A plane 1", 2);
        force_cbar.insert("Bending End A plane 2", 3);
        force_cbar.insert("Bending End B plane 1", 4);
        force_cbar.insert("Bending End B plane 2", 5);
        force_cbar.insert("Shear plane 1", 6);
        force_cbar.insert("Shear plane 2", 7);
        force_cbar.insert("Axial force", 8);
        force_cbar.insert("Torque", 9);
        table.insert(("FORCE", "CBAR"), force_cbar);

        let mut force_cquad4 = HashMap::new();
        force_cquad4.insert("Membrane force x", 2);
        force_cquad4.insert("Membrane force y", 3);
        force_cquad4.insert("Membrane force xy", 4);
        table.insert(("FORCE", "CQUAD4"), force_cquad4);

        table
    });

/// Look up the output code for `(rtype, eltype, name)`.
pub fn get_output_code(rtype: &str, eltype: &str, name: &str) -> DeckResult<u64> {
    OUTPUT_CODES
        .get(&(rtype, eltype))
        .and_then(|family| family.get(name))
        .copied()
        .ok_or_else(|| {
            DeckError::unsupported(
                format!("{rtype}/{eltype}"),
                format!("no output code named '{name}'"),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(get_output_code("STRESS", "CBAR", "Axial").unwrap(), 6);
        assert_eq!(get_output_code("STRESS", "CBAR", "End A maximum").unwrap(), 7);
        assert_eq!(get_output_code("STRESS", "CBAR", "End A minimum").unwrap(), 8);
        assert_eq!(
            get_output_code("STRESS", "CQUAD4", "von Mises or maximum shear at Z1").unwrap(),
            9
        );
        assert_eq!(
            get_output_code("STRESS", "CQUAD4", "von Mises or maximum shear at Z2").unwrap(),
            17
        );
        assert_eq!(get_output_code("FORCE", "CBAR", "Axial force").unwrap(), 8);
        assert_eq!(get_output_code("FORCE", "CBAR", "Shear plane 1").unwrap(), 6);
        assert_eq!(get_output_code("FORCE", "CQUAD4", "Membrane force xy").unwrap(), 4);
    }

    #[test]
    fn test_unknown_quantity_is_unsupported() {
        let err = get_output_code("STRESS", "CBAR", "Warping").unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_CONFIG");
        let err = get_output_code("STRAIN", "CBAR", "Axial").unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_CONFIG");
    }
}
