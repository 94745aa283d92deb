//! # Skin Panel
//!
//! Shell panel sized through its `PSHELL` thickness. Checks: von Mises
//! stress at both fiber distances (pointwise or averaged over the
//! panel's elements) and a method-1 external buckling routine fed by
//! membrane forces.

use serde::{Deserialize, Serialize};

use crate::cards::{Dresp, Dresp1, Dresp2, Dresp3, Dvprel, Dvprel1, EqRef};
use crate::elements::{check_eltype, unsupported_ptype, SizingVar};
use crate::errors::DeckResult;
use crate::ids::CardKind;
use crate::model::OptModel;
use crate::output_codes::get_output_code;

/// Graph entities a panel has registered, by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelVars {
    pub t: u64,
    pub r_key: String,
    pub a_key: String,
    pub b_key: String,
    pub e_key: String,
    pub nu_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Panel {
    pub name: String,
    pub pid: u64,
    pub ptype: String,
    pub eltype: String,
    /// Element probed by pointwise checks.
    pub eid: u64,
    /// Every element of the panel, for averaged checks.
    pub eids: Vec<u64>,
    pub t: SizingVar,
    /// Radius of curvature.
    pub r: f64,
    pub a: f64,
    pub b: f64,
    pub e: f64,
    pub nu: f64,
    vars: Option<PanelVars>,
}

impl Panel {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        pid: u64,
        eid: u64,
        eids: Vec<u64>,
        t: SizingVar,
        r: f64,
        a: f64,
        b: f64,
        e: f64,
        nu: f64,
    ) -> Self {
        Panel {
            name: name.into(),
            pid,
            ptype: "PSHELL".to_string(),
            eltype: "CQUAD4".to_string(),
            eid,
            eids,
            t,
            r,
            a,
            b,
            e,
            nu,
            vars: None,
        }
    }

    pub fn vars(&self) -> Option<&PanelVars> {
        self.vars.as_ref()
    }

    /// Register the thickness variable, its property relation and the
    /// fixed geometry constants. Idempotent.
    pub fn create_dvars(&mut self, model: &mut OptModel) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.ensure_dvars(&mut staged)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Bound von Mises stress at both fiber distances by `fcy`.
    ///
    /// With `average` set, one response per fiber averages the stress
    /// over all of the panel's elements instead of probing `eid`.
    pub fn constrain_von_mises(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        fcy: f64,
        average: bool,
    ) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_von_mises(&mut staged, dcid, fcy, average)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Flat/curved plate buckling through the external METHOD1 routine,
    /// fed by the membrane forces at `eid`.
    pub fn constrain_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_buckling(&mut staged, dcid, ms)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    fn ensure_dvars(&mut self, model: &mut OptModel) -> DeckResult<PanelVars> {
        if let Some(vars) = &self.vars {
            return Ok(vars.clone());
        }
        check_eltype(&self.eltype, "CQUAD4")?;
        if self.ptype != "PSHELL" {
            return Err(unsupported_ptype(&self.ptype, "panel"));
        }
        let t = model.add_desvar("PANt", self.t.initial, self.t.lb, self.t.ub)?;
        let id = model.allocate(CardKind::Dvprel);
        let rel = Dvprel1::new(id, "PSHELL", self.pid, "T", vec![(t, 1.0)])?;
        model.add_dvprel(Dvprel::Linear(rel));
        let vars = PanelVars {
            t,
            r_key: model.add_table_constant("PANr", self.r)?,
            a_key: model.add_table_constant("PANa", self.a)?,
            b_key: model.add_table_constant("PANb", self.b)?,
            e_key: model.add_table_constant("PANE", self.e)?,
            nu_key: model.add_table_constant("PANnu", self.nu)?,
        };
        self.vars = Some(vars.clone());
        Ok(vars)
    }

    fn apply_von_mises(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        fcy: f64,
        average: bool,
    ) -> DeckResult<()> {
        self.ensure_dvars(model)?;
        let fibers = [
            ("PANZ1VM", "PANZ1VMA", "von Mises or maximum shear at Z1"),
            ("PANZ2VM", "PANZ2VMA", "von Mises or maximum shear at Z2"),
        ];
        for (label, avg_label, name) in fibers {
            let code = get_output_code("STRESS", &self.eltype, name)?;
            let rid = if average {
                // one scalar feeder per element, the mean taken by AVG
                let mut feeders = Vec::with_capacity(self.eids.len());
                for &eid in &self.eids {
                    let r1 = model.allocate(CardKind::Dresp);
                    let dresp1 = Dresp1::new(r1, label, "STRESS")?
                        .with_ptype("ELEM")
                        .with_atta(code)
                        .with_atti(vec![eid]);
                    model.add_dresp(Dresp::R1(dresp1));
                    feeders.push(r1);
                }
                let r2 = model.allocate(CardKind::Dresp);
                let dresp2 = Dresp2::new(r2, avg_label, EqRef::Builtin("AVG".to_string()))?
                    .with_dresp1s(feeders);
                model.add_dresp(Dresp::R2(dresp2))
            } else {
                let r1 = model.allocate(CardKind::Dresp);
                let dresp1 = Dresp1::new(r1, label, "STRESS")?
                    .with_ptype("ELEM")
                    .with_atta(code)
                    .with_atti(vec![self.eid]);
                model.add_dresp(Dresp::R1(dresp1))
            };
            model.add_dconstr(dcid, rid, None, Some(fcy));
        }
        Ok(())
    }

    fn apply_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let vars = self.ensure_dvars(model)?;
        let nxx_code = get_output_code("FORCE", &self.eltype, "Membrane force x")?;
        let nxy_code = get_output_code("FORCE", &self.eltype, "Membrane force xy")?;
        let nxx = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(nxx, "PANfNxx", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(nxx_code)
                .with_atti(vec![self.eid]),
        ));
        let nxy = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(nxy, "PANfNxy", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(nxy_code)
                .with_atti(vec![self.eid]),
        ));
        let r3 = model.allocate(CardKind::Dresp);
        let dresp3 = Dresp3::new(r3, "PANBUCK1", "PANBUCK", "METHOD1")?
            .with_desvars(vec![vars.t])
            .with_table_labels(vec![
                vars.r_key.clone(),
                vars.a_key.clone(),
                vars.b_key.clone(),
                vars.e_key.clone(),
                vars.nu_key.clone(),
            ])
            .with_dresp1s(vec![nxx, nxy]);
        let rid = model.add_dresp(Dresp::R3(dresp3));
        model.add_dconstr(dcid, rid, Some(ms), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_panel() -> Panel {
        Panel::new(
            "P1",
            10,
            205,
            vec![201, 202, 203, 204, 205],
            SizingVar::new(1.5, 0.8, 6.0),
            8000.0,
            400.0,
            200.0,
            71000.0,
            0.33,
        )
    }

    #[test]
    fn test_create_dvars_idempotent() {
        let mut model = OptModel::new();
        let mut panel = test_panel();
        panel.create_dvars(&mut model).unwrap();
        let snapshot = model.clone();
        panel.create_dvars(&mut model).unwrap();
        assert_eq!(model, snapshot);
        assert_eq!(model.desvars.len(), 1);
        assert_eq!(model.dtable.len(), 5);
        assert_eq!(model.dvprels.len(), 1);
        let vars = panel.vars().unwrap();
        assert_eq!(vars.r_key, "PANr");
        assert_eq!(vars.nu_key, "PANnu");
    }

    #[test]
    fn test_von_mises_pointwise() {
        let mut model = OptModel::new();
        let mut panel = test_panel();
        panel.constrain_von_mises(&mut model, 1, 420.0, false).unwrap();
        assert_eq!(model.dresps.len(), 2);
        assert_eq!(model.dconstrs.len(), 2);
        let labels: Vec<_> = model
            .dresps
            .values()
            .map(|r| match r {
                Dresp::R1(r1) => r1.label.clone(),
                _ => panic!("expected atomic responses"),
            })
            .collect();
        assert_eq!(labels, vec!["PANZ1VM", "PANZ2VM"]);
        for con in model.dconstrs.values() {
            assert_eq!(con.lallow, None);
            assert_eq!(con.uallow, Some(420.0));
        }
    }

    #[test]
    fn test_von_mises_averaged() {
        let mut model = OptModel::new();
        let mut panel = test_panel();
        panel.constrain_von_mises(&mut model, 1, 420.0, true).unwrap();
        // five feeders per fiber plus one AVG response each
        assert_eq!(model.dresps.len(), 12);
        let averaged: Vec<_> = model
            .dresps
            .values()
            .filter_map(|r| match r {
                Dresp::R2(r2) => Some(r2),
                _ => None,
            })
            .collect();
        assert_eq!(averaged.len(), 2);
        assert_eq!(averaged[0].label, "PANZ1VMA");
        assert_eq!(averaged[0].eq, EqRef::Builtin("AVG".to_string()));
        // one scalar feeder per panel element
        assert_eq!(averaged[0].dresp1s.len(), panel.eids.len());
        for &rid in &averaged[0].dresp1s {
            match &model.dresps[&rid] {
                Dresp::R1(r1) => assert_eq!(r1.atti.len(), 1),
                _ => panic!("feeders must be atomic responses"),
            }
        }
        // constraints bind the averaged responses, not the feeders
        for con in model.dconstrs.values() {
            assert!(averaged.iter().any(|r2| r2.id == con.rid));
        }
    }

    #[test]
    fn test_buckling_method1() {
        let mut model = OptModel::new();
        let mut panel = test_panel();
        panel.constrain_buckling(&mut model, 2, 0.1).unwrap();
        let r3 = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R3(r3) => Some(r3),
                _ => None,
            })
            .unwrap();
        assert_eq!(r3.label, "PANBUCK1");
        assert_eq!(r3.group, "PANBUCK");
        assert_eq!(r3.rtype, "METHOD1");
        assert_eq!(r3.dvars, vec![panel.vars().unwrap().t]);
        assert_eq!(r3.labels, vec!["PANr", "PANa", "PANb", "PANE", "PANnu"]);
        assert_eq!(r3.dresp1s.len(), 2);
        let con = model.dconstrs.values().find(|c| c.rid == r3.id).unwrap();
        assert_eq!(con.dcid, 2);
        assert_eq!(con.lallow, Some(0.1));
        assert_eq!(con.uallow, None);
        model.validate().unwrap();
    }

    #[test]
    fn test_unsupported_ptype_leaves_model_untouched() {
        let mut model = OptModel::new();
        let mut panel = test_panel();
        panel.ptype = "PCOMP".to_string();
        let before = model.clone();
        assert!(panel.constrain_buckling(&mut model, 1, 0.1).is_err());
        assert_eq!(model, before);
        assert!(panel.vars().is_none());
    }
}
