//! # Composite Panel
//!
//! Laminated skin panel on a `PCOMP` property with a 0/±45/90 layup.
//! The free parameters are the total thickness and the ±45 ply
//! fraction; the 90 fraction stays fixed. Ply thicknesses follow the
//! parameters through equation relations, one per layer slot. Check:
//! an external laminate buckling routine fed by the membrane forces.

use serde::{Deserialize, Serialize};

use crate::cards::{Dresp, Dresp1, Dresp3, Dvprel, Dvprel2, EqRef};
use crate::elements::{check_eltype, unsupported_ptype, SizingVar};
use crate::errors::DeckResult;
use crate::ids::CardKind;
use crate::model::OptModel;
use crate::output_codes::get_output_code;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelCompVars {
    pub t: u64,
    pub p45: u64,
    pub p90_key: String,
    pub a_key: String,
    pub b_key: String,
    pub r_key: String,
    pub e1_key: String,
    pub e2_key: String,
    pub g12_key: String,
    pub n12_key: String,
    pub n21_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelComp {
    pub name: String,
    pub pid: u64,
    pub ptype: String,
    pub eltype: String,
    pub eid: u64,
    pub eids: Vec<u64>,
    /// Total laminate thickness.
    pub t: SizingVar,
    /// Fraction of plies at +-45 degrees.
    pub p45: SizingVar,
    /// Fixed fraction of plies at 90 degrees.
    pub p90: f64,
    pub a: f64,
    pub b: f64,
    pub r: f64,
    pub e1: f64,
    pub e2: f64,
    pub g12: f64,
    pub n12: f64,
    pub n21: f64,
    vars: Option<PanelCompVars>,
}

impl PanelComp {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        pid: u64,
        eid: u64,
        eids: Vec<u64>,
        t: SizingVar,
        p45: SizingVar,
        p90: f64,
        a: f64,
        b: f64,
        r: f64,
        e1: f64,
        e2: f64,
        g12: f64,
        n12: f64,
        n21: f64,
    ) -> Self {
        PanelComp {
            name: name.into(),
            pid,
            ptype: "PCOMP".to_string(),
            eltype: "CQUAD4".to_string(),
            eid,
            eids,
            t,
            p45,
            p90,
            a,
            b,
            r,
            e1,
            e2,
            g12,
            n12,
            n21,
            vars: None,
        }
    }

    pub fn vars(&self) -> Option<&PanelCompVars> {
        self.vars.as_ref()
    }

    /// Register the layup parameters, material constants and the four
    /// ply thickness relations. Idempotent.
    pub fn create_dvars(&mut self, model: &mut OptModel) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.ensure_dvars(&mut staged)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Laminate buckling through the external BUCK_PC routine, with the
    /// buckling load factor bounded below by `eig`.
    pub fn constrain_buckling(&mut self, model: &mut OptModel, dcid: u64, eig: f64) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_buckling(&mut staged, dcid, eig)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    fn ensure_dvars(&mut self, model: &mut OptModel) -> DeckResult<PanelCompVars> {
        if let Some(vars) = &self.vars {
            return Ok(vars.clone());
        }
        check_eltype(&self.eltype, "CQUAD4")?;
        if self.ptype != "PCOMP" {
            return Err(unsupported_ptype(&self.ptype, "composite panel"));
        }
        let t = model.add_desvar("PCt", self.t.initial, self.t.lb, self.t.ub)?;
        let p45 = model.add_desvar("PCp45", self.p45.initial, self.p45.lb, self.p45.ub)?;
        let vars = PanelCompVars {
            t,
            p45,
            p90_key: model.add_table_constant("P90", self.p90)?,
            a_key: model.add_table_constant("PCa", self.a)?,
            b_key: model.add_table_constant("PCb", self.b)?,
            r_key: model.add_table_constant("PCr", self.r)?,
            e1_key: model.add_table_constant("PCE1", self.e1)?,
            e2_key: model.add_table_constant("PCE2", self.e2)?,
            g12_key: model.add_table_constant("PCG12", self.g12)?,
            n12_key: model.add_table_constant("PCn12", self.n12)?,
            n21_key: model.add_table_constant("PCn21", self.n21)?,
        };

        // layer slots: T1 = 0 deg, T2/T3 = +-45 deg, T4 = 90 deg
        let eq0 = model.add_deqatn("T0(t,p45,p90) = (1.-p45-p90)*t")?;
        let eq45 = model.add_deqatn("T45(t,p45) = (p45/2.)*t")?;
        let eq90 = model.add_deqatn("T90(t,p90) = p90*t")?;
        let id = model.allocate(CardKind::Dvprel);
        model.add_dvprel(Dvprel::Equation(
            Dvprel2::new(id, "PCOMP", self.pid, "T1", EqRef::Equation(eq0))
                .with_desvars(vec![t, p45])
                .with_table_labels(vec![vars.p90_key.clone()]),
        ));
        for pname in ["T2", "T3"] {
            let id = model.allocate(CardKind::Dvprel);
            model.add_dvprel(Dvprel::Equation(
                Dvprel2::new(id, "PCOMP", self.pid, pname, EqRef::Equation(eq45))
                    .with_desvars(vec![t, p45]),
            ));
        }
        let id = model.allocate(CardKind::Dvprel);
        model.add_dvprel(Dvprel::Equation(
            Dvprel2::new(id, "PCOMP", self.pid, "T4", EqRef::Equation(eq90))
                .with_desvars(vec![t])
                .with_table_labels(vec![vars.p90_key.clone()]),
        ));
        self.vars = Some(vars.clone());
        Ok(vars)
    }

    fn apply_buckling(&mut self, model: &mut OptModel, dcid: u64, eig: f64) -> DeckResult<()> {
        let vars = self.ensure_dvars(model)?;
        let feeders = [
            ("PCfNxx", "Membrane force x"),
            ("PCfNyy", "Membrane force y"),
            ("PCfNxy", "Membrane force xy"),
        ];
        let mut dresp1s = Vec::with_capacity(feeders.len());
        for (label, name) in feeders {
            let code = get_output_code("FORCE", &self.eltype, name)?;
            let rid = model.allocate(CardKind::Dresp);
            model.add_dresp(Dresp::R1(
                Dresp1::new(rid, label, "FORCE")?
                    .with_ptype("ELEM")
                    .with_atta(code)
                    .with_atti(vec![self.eid]),
            ));
            dresp1s.push(rid);
        }
        let r3 = model.allocate(CardKind::Dresp);
        let dresp3 = Dresp3::new(r3, "PCBUCK1", "PCBUCK", "BUCK_PC")?
            .with_desvars(vec![vars.t])
            .with_table_labels(vec![
                vars.a_key.clone(),
                vars.b_key.clone(),
                vars.r_key.clone(),
                vars.e1_key.clone(),
                vars.e2_key.clone(),
                vars.g12_key.clone(),
                vars.n12_key.clone(),
                vars.n21_key.clone(),
            ])
            .with_dresp1s(dresp1s);
        let rid = model.add_dresp(Dresp::R3(dresp3));
        model.add_dconstr(dcid, rid, Some(eig), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_panelcomp() -> PanelComp {
        PanelComp::new(
            "PC1",
            50,
            701,
            vec![701, 702, 703],
            SizingVar::new(3.0, 1.5, 10.0),
            SizingVar::new(0.4, 0.1, 0.8),
            0.1,
            500.0,
            250.0,
            9000.0,
            130000.0,
            9000.0,
            4600.0,
            0.32,
            0.022,
        )
    }

    #[test]
    fn test_layup_relations() {
        let mut model = OptModel::new();
        let mut panel = test_panelcomp();
        panel.create_dvars(&mut model).unwrap();
        assert_eq!(model.desvars.len(), 2);
        assert_eq!(model.deqatns.len(), 3);
        assert_eq!(model.dvprels.len(), 4);
        let vars = panel.vars().unwrap();
        let rels: Vec<_> = model
            .dvprels
            .values()
            .map(|rel| match rel {
                Dvprel::Equation(rel) => rel,
                Dvprel::Linear(_) => panic!("ply thicknesses follow equations"),
            })
            .collect();
        assert_eq!(rels[0].pname, "T1");
        assert_eq!(rels[0].dvars, vec![vars.t, vars.p45]);
        assert_eq!(rels[0].labels, vec!["P90"]);
        // the +-45 plies share one equation
        assert_eq!(rels[1].eq, rels[2].eq);
        assert!(rels[1].labels.is_empty());
        assert_eq!(rels[3].pname, "T4");
        assert_eq!(rels[3].dvars, vec![vars.t]);
        assert_eq!(rels[3].labels, vec!["P90"]);
        model.validate().unwrap();
    }

    #[test]
    fn test_buckling_routine_wiring() {
        let mut model = OptModel::new();
        let mut panel = test_panelcomp();
        panel.constrain_buckling(&mut model, 1, 1.0).unwrap();
        let r3 = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R3(r3) => Some(r3),
                _ => None,
            })
            .unwrap();
        assert_eq!(r3.label, "PCBUCK1");
        assert_eq!(r3.group, "PCBUCK");
        assert_eq!(r3.rtype, "BUCK_PC");
        assert_eq!(r3.dvars, vec![panel.vars().unwrap().t]);
        assert_eq!(r3.labels.len(), 8);
        assert_eq!(r3.dresp1s.len(), 3);
        let con = model.dconstrs.values().find(|c| c.rid == r3.id).unwrap();
        assert_eq!(con.lallow, Some(1.0));
        assert_eq!(con.uallow, None);
        model.validate().unwrap();
    }

    #[test]
    fn test_create_dvars_idempotent() {
        let mut model = OptModel::new();
        let mut panel = test_panelcomp();
        panel.create_dvars(&mut model).unwrap();
        let snapshot = model.clone();
        panel.create_dvars(&mut model).unwrap();
        assert_eq!(model, snapshot);
    }
}
