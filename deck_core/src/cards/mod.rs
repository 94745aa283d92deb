//! # Optimization Entities
//!
//! The card types that make up an optimization deck: design variables,
//! constants, equations, responses, variable-to-property relations,
//! constraints, links and the objective. These are plain data carriers;
//! the entity graph in [`crate::model`] owns them and hands out their
//! ids, and [`encode`] renders them into fixed-width bulk data lines.
//!
//! Responses and equation-based property relations reference other
//! entities by id. Reference lists are completed with the `with_*`
//! builder methods before the entity is inserted into the graph, so a
//! partially-wired entity is never observable.

pub mod encode;
pub mod format;

use serde::{Deserialize, Serialize};

use crate::errors::{DeckError, DeckResult};

/// Design variable: a free sizing parameter with bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desvar {
    pub id: u64,
    pub label: String,
    pub xinit: f64,
    pub xlb: f64,
    pub xub: f64,
    /// Fractional move limit per design cycle.
    pub delx: Option<f64>,
    /// Discrete value set id.
    pub ddval: Option<u64>,
    /// Property relation consuming this variable, filled in when the
    /// relation is inserted into the graph. Not rendered on the card.
    pub relation: Option<u64>,
}

impl Desvar {
    pub fn new(id: u64, label: impl Into<String>, xinit: f64, xlb: f64, xub: f64) -> DeckResult<Self> {
        let label = label.into();
        check_label("DESVAR", "label", &label)?;
        Ok(Desvar {
            id,
            label,
            xinit,
            xlb,
            xub,
            delx: None,
            ddval: None,
            relation: None,
        })
    }
}

/// Equation evaluated by the solver. The expression is opaque to this
/// crate apart from line wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deqatn {
    pub id: u64,
    pub expr: String,
}

impl Deqatn {
    /// Non-ASCII expressions are rejected so the byte-budget line wrap
    /// is well defined.
    pub fn new(id: u64, expr: impl Into<String>) -> DeckResult<Self> {
        let expr = expr.into();
        if !expr.is_ascii() {
            return Err(DeckError::invalid_input(
                "expr",
                expr,
                "DEQATN expressions must be ASCII",
            ));
        }
        if expr.is_empty() {
            return Err(DeckError::invalid_input("expr", expr, "DEQATN expression is empty"));
        }
        Ok(Deqatn { id, expr })
    }
}

/// Reference from an equation response or relation to its formula:
/// either a DEQATN id or the name of a solver built-in function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EqRef {
    Equation(u64),
    Builtin(String),
}

/// Atomic response: a raw solver output quantity at one or more
/// elements or properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dresp1 {
    pub id: u64,
    pub label: String,
    pub rtype: String,
    pub ptype: Option<String>,
    pub region: Option<u64>,
    /// Output code selecting the quantity within `rtype`.
    pub atta: Option<u64>,
    pub attb: Option<u64>,
    /// Element or property ids the response is sampled at. Empty for
    /// global responses such as total mass.
    pub atti: Vec<u64>,
}

impl Dresp1 {
    pub fn new(id: u64, label: impl Into<String>, rtype: impl Into<String>) -> DeckResult<Self> {
        let label = label.into();
        check_label("DRESP1", "label", &label)?;
        Ok(Dresp1 {
            id,
            label,
            rtype: rtype.into(),
            ptype: None,
            region: None,
            atta: None,
            attb: None,
            atti: Vec::new(),
        })
    }

    pub fn with_ptype(mut self, ptype: impl Into<String>) -> Self {
        self.ptype = Some(ptype.into());
        self
    }

    pub fn with_atta(mut self, atta: u64) -> Self {
        self.atta = Some(atta);
        self
    }

    pub fn with_atti(mut self, atti: Vec<u64>) -> Self {
        self.atti = atti;
        self
    }
}

/// Equation response: combines variables, table constants and atomic
/// responses through a [`Deqatn`] or a solver built-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dresp2 {
    pub id: u64,
    pub label: String,
    pub eq: EqRef,
    pub region: Option<u64>,
    pub dvars: Vec<u64>,
    pub labels: Vec<String>,
    pub dresp1s: Vec<u64>,
}

impl Dresp2 {
    pub fn new(id: u64, label: impl Into<String>, eq: EqRef) -> DeckResult<Self> {
        let label = label.into();
        check_label("DRESP2", "label", &label)?;
        Ok(Dresp2 {
            id,
            label,
            eq,
            region: None,
            dvars: Vec::new(),
            labels: Vec::new(),
            dresp1s: Vec::new(),
        })
    }

    pub fn with_desvars(mut self, dvars: Vec<u64>) -> Self {
        self.dvars = dvars;
        self
    }

    pub fn with_table_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_dresp1s(mut self, dresp1s: Vec<u64>) -> Self {
        self.dresp1s = dresp1s;
        self
    }
}

/// External response evaluated by a user subroutine group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dresp3 {
    pub id: u64,
    pub label: String,
    pub group: String,
    pub rtype: String,
    pub region: Option<u64>,
    pub dvars: Vec<u64>,
    pub labels: Vec<String>,
    pub dresp1s: Vec<u64>,
}

impl Dresp3 {
    pub fn new(
        id: u64,
        label: impl Into<String>,
        group: impl Into<String>,
        rtype: impl Into<String>,
    ) -> DeckResult<Self> {
        let label = label.into();
        check_label("DRESP3", "label", &label)?;
        Ok(Dresp3 {
            id,
            label,
            group: group.into(),
            rtype: rtype.into(),
            region: None,
            dvars: Vec::new(),
            labels: Vec::new(),
            dresp1s: Vec::new(),
        })
    }

    pub fn with_desvars(mut self, dvars: Vec<u64>) -> Self {
        self.dvars = dvars;
        self
    }

    pub fn with_table_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_dresp1s(mut self, dresp1s: Vec<u64>) -> Self {
        self.dresp1s = dresp1s;
        self
    }
}

/// A response of any arity, stored under one id space so equation
/// responses can reference atomic ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dresp {
    R1(Dresp1),
    R2(Dresp2),
    R3(Dresp3),
}

impl Dresp {
    pub fn id(&self) -> u64 {
        match self {
            Dresp::R1(r) => r.id,
            Dresp::R2(r) => r.id,
            Dresp::R3(r) => r.id,
        }
    }
}

/// Linear variable-to-property relation:
/// `p = c0 + sum(coef_i * dvar_i)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dvprel1 {
    pub id: u64,
    pub ptype: String,
    pub pid: u64,
    pub pname: String,
    pub c0: f64,
    pub pairs: Vec<(u64, f64)>,
}

impl Dvprel1 {
    pub fn new(
        id: u64,
        ptype: impl Into<String>,
        pid: u64,
        pname: impl Into<String>,
        pairs: Vec<(u64, f64)>,
    ) -> DeckResult<Self> {
        if pairs.is_empty() {
            return Err(DeckError::invalid_input(
                "pairs",
                "[]",
                "DVPREL1 relates at least one variable",
            ));
        }
        Ok(Dvprel1 {
            id,
            ptype: ptype.into(),
            pid,
            pname: pname.into(),
            c0: 0.0,
            pairs,
        })
    }

    pub fn with_c0(mut self, c0: f64) -> Self {
        self.c0 = c0;
        self
    }
}

/// Equation variable-to-property relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dvprel2 {
    pub id: u64,
    pub ptype: String,
    pub pid: u64,
    pub pname: String,
    pub eq: EqRef,
    pub dvars: Vec<u64>,
    pub labels: Vec<String>,
}

impl Dvprel2 {
    pub fn new(
        id: u64,
        ptype: impl Into<String>,
        pid: u64,
        pname: impl Into<String>,
        eq: EqRef,
    ) -> Self {
        Dvprel2 {
            id,
            ptype: ptype.into(),
            pid,
            pname: pname.into(),
            eq,
            dvars: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn with_desvars(mut self, dvars: Vec<u64>) -> Self {
        self.dvars = dvars;
        self
    }

    pub fn with_table_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }
}

/// A variable-to-property relation of either arity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Dvprel {
    Linear(Dvprel1),
    Equation(Dvprel2),
}

impl Dvprel {
    /// Ids of the variables the relation reads.
    pub fn desvar_ids(&self) -> Vec<u64> {
        match self {
            Dvprel::Linear(p) => p.pairs.iter().map(|&(dv, _)| dv).collect(),
            Dvprel::Equation(p) => p.dvars.clone(),
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Dvprel::Linear(p) => p.id,
            Dvprel::Equation(p) => p.id,
        }
    }
}

/// Bound on a response within a constraint set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dconstr {
    pub id: u64,
    /// Constraint set the solver's case control selects.
    pub dcid: u64,
    pub rid: u64,
    pub lallow: Option<f64>,
    pub uallow: Option<f64>,
}

/// Affine dependency of one design variable on others.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dlink {
    pub id: u64,
    pub ddvid: u64,
    pub c0: f64,
    pub cmult: f64,
    pub pairs: Vec<(u64, f64)>,
}

impl Dlink {
    pub fn new(id: u64, ddvid: u64, pairs: Vec<(u64, f64)>) -> DeckResult<Self> {
        if pairs.is_empty() {
            return Err(DeckError::invalid_input(
                "pairs",
                "[]",
                "DLINK requires at least one independent variable",
            ));
        }
        Ok(Dlink {
            id,
            ddvid,
            c0: 0.0,
            cmult: 1.0,
            pairs,
        })
    }

    pub fn with_c0(mut self, c0: f64) -> Self {
        self.c0 = c0;
        self
    }

    pub fn with_cmult(mut self, cmult: f64) -> Self {
        self.cmult = cmult;
        self
    }
}

/// Optimization direction for the objective response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinMax {
    Min,
    Max,
}

impl MinMax {
    pub fn as_str(self) -> &'static str {
        match self {
            MinMax::Min => "MIN",
            MinMax::Max => "MAX",
        }
    }
}

/// The design objective: one response, minimized or maximized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub rid: u64,
    pub minmax: MinMax,
}

/// A preformatted solver property card passed through to the deck
/// untouched, e.g. a PSHELL rewritten with optimization-friendly
/// fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCard {
    pub lines: Vec<String>,
}

pub(crate) fn check_label(card: &str, field: &str, label: &str) -> DeckResult<()> {
    if label.is_empty() {
        return Err(DeckError::invalid_input(field, label, format!("{card} label is empty")));
    }
    if label.len() > format::FIELD_WIDTH || !label.is_ascii() {
        return Err(DeckError::field_overflow(card, field, label));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desvar_label_must_fit_field() {
        assert!(Desvar::new(1_000_000, "STRZt", 2.0, 1.0, 3.0).is_ok());
        let err = Desvar::new(1_000_000, "STRINGER1", 2.0, 1.0, 3.0).unwrap_err();
        assert_eq!(err.error_code(), "FIELD_OVERFLOW");
    }

    #[test]
    fn test_deqatn_rejects_non_ascii() {
        assert!(Deqatn::new(4_000_000, "T(t)=t").is_ok());
        assert!(Deqatn::new(4_000_000, "T(σ)=σ").is_err());
        assert!(Deqatn::new(4_000_000, "").is_err());
    }

    #[test]
    fn test_dlink_requires_independents() {
        assert!(Dlink::new(6_000_000, 1_000_000, vec![]).is_err());
        let link = Dlink::new(6_000_000, 1_000_000, vec![(1_000_001, 1.0)]).unwrap();
        assert_eq!(link.c0, 0.0);
        assert_eq!(link.cmult, 1.0);
    }

    #[test]
    fn test_dresp2_builder_wires_before_insert() {
        let r = Dresp2::new(3_000_000, "STRBUCK", EqRef::Equation(4_000_000))
            .unwrap()
            .with_desvars(vec![1_000_000])
            .with_table_labels(vec!["STRBh".to_string()])
            .with_dresp1s(vec![3_000_001, 3_000_002]);
        assert_eq!(r.dvars, vec![1_000_000]);
        assert_eq!(r.dresp1s.len(), 2);
    }
}
