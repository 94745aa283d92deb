//! # Structural Elements
//!
//! One type per structural element family, each owning the geometry and
//! material scalars its sizing checks need, plus the bookkeeping of the
//! optimization entities it has already created.
//!
//! Every element follows the same lifecycle: `create_dvars` registers
//! the design variables, fixed constants and variable-to-property
//! relations (idempotent; later calls are no-ops), then each
//! `constrain_*` method synthesizes one named check: the feeder atomic
//! responses, the margin equation or external response, and the
//! constraint binding it. Synthesis is all-or-nothing — methods stage
//! their work on a clone of the graph and commit only on success, so a
//! failed call leaves both the graph and the element untouched.

pub mod flange;
pub mod panel;
pub mod panelcomp;
pub mod stringer;
pub mod web;

pub use flange::{Flange, FlangeProfile};
pub use panel::Panel;
pub use panelcomp::PanelComp;
pub use stringer::{Stringer, StringerProfile};
pub use web::Web;

use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, DeckResult};

/// A free sizing parameter: starting value and side bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizingVar {
    pub initial: f64,
    pub lb: f64,
    pub ub: f64,
}

impl SizingVar {
    pub fn new(initial: f64, lb: f64, ub: f64) -> Self {
        SizingVar { initial, lb, ub }
    }
}

pub(crate) fn check_eltype(found: &str, wanted: &str) -> DeckResult<()> {
    if found != wanted {
        return Err(DeckError::unsupported(
            format!("element type {found}"),
            format!("check is implemented for {wanted} only"),
        ));
    }
    Ok(())
}

pub(crate) fn unsupported_ptype(ptype: &str, family: &str) -> DeckError {
    DeckError::unsupported(
        format!("{family} on {ptype}"),
        "property type has no generation path",
    )
}
