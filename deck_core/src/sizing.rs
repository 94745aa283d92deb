//! # Cross-Section Dimension Slots
//!
//! Maps each supported library cross-section to the `DIMi` parameter
//! positions its sizing quantities occupy on a PBARL entry, so a linear
//! property relation can point a design variable straight at the right
//! dimension field.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::errors::{DeckError, DeckResult};

/// One sizable dimension of a library section: the `DIMi` field name
/// and the quantity occupying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimSlot {
    pub pname: &'static str,
    pub quantity: &'static str,
}

static SECTION_DIMS: Lazy<HashMap<&'static str, Vec<DimSlot>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        "RECT",
        vec![
            DimSlot { pname: "DIM1", quantity: "base" },
            DimSlot { pname: "DIM2", quantity: "height" },
        ],
    );
    table.insert(
        "TEE",
        vec![
            DimSlot { pname: "DIM1", quantity: "cap half-width" },
            DimSlot { pname: "DIM2", quantity: "cap thickness" },
            DimSlot { pname: "DIM3", quantity: "web width" },
            DimSlot { pname: "DIM4", quantity: "web thickness" },
        ],
    );
    table.insert(
        "Z",
        vec![
            DimSlot { pname: "DIM1", quantity: "cap bot width" },
            DimSlot { pname: "DIM2", quantity: "web thickness" },
            DimSlot { pname: "DIM3", quantity: "web width" },
            DimSlot { pname: "DIM4", quantity: "total width" },
        ],
    );
    table
});

/// The `DIMi` slot holding `quantity` for a library `section`.
pub fn dim_slot(section: &str, quantity: &str) -> DeckResult<DimSlot> {
    let dims = SECTION_DIMS.get(section).ok_or_else(|| {
        DeckError::unsupported(format!("PBARL {section}"), "unknown library section")
    })?;
    dims.iter().find(|slot| slot.quantity == quantity).copied().ok_or_else(|| {
        DeckError::unsupported(
            format!("PBARL {section}"),
            format!("section has no '{quantity}' dimension"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_z_section_slots() {
        assert_eq!(dim_slot("Z", "web thickness").unwrap().pname, "DIM2");
        assert_eq!(dim_slot("Z", "cap bot width").unwrap().pname, "DIM1");
        assert_eq!(dim_slot("Z", "total width").unwrap().pname, "DIM4");
    }

    #[test]
    fn test_blade_section_slots() {
        assert_eq!(dim_slot("RECT", "base").unwrap().pname, "DIM1");
        assert_eq!(dim_slot("RECT", "height").unwrap().pname, "DIM2");
    }

    #[test]
    fn test_unknown_section_and_quantity() {
        assert_eq!(
            dim_slot("HEX", "base").unwrap_err().error_code(),
            "UNSUPPORTED_CONFIG"
        );
        assert_eq!(
            dim_slot("RECT", "web thickness").unwrap_err().error_code(),
            "UNSUPPORTED_CONFIG"
        );
    }
}
