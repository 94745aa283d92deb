//! # Spar/Rib Web
//!
//! Shear web sized through its `PSHELL` thickness. Checks: von Mises
//! stress at both fiber distances and closed-form plate buckling, under
//! compression alone or combined compression and shear.

use serde::{Deserialize, Serialize};

use crate::cards::{Dresp, Dresp1, Dresp2, Dvprel, Dvprel1, EqRef};
use crate::elements::{check_eltype, unsupported_ptype, SizingVar};
use crate::errors::DeckResult;
use crate::ids::CardKind;
use crate::model::OptModel;
use crate::output_codes::get_output_code;

/// Buckling check flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebBuckling {
    /// Compression only, from the x membrane force.
    Compression,
    /// Interaction of compression and shear.
    CompressionShear,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebVars {
    pub t: u64,
    pub a_key: String,
    pub b_key: String,
    pub e_key: String,
    pub nu_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Web {
    pub name: String,
    pub pid: u64,
    pub ptype: String,
    pub eltype: String,
    pub eid: u64,
    pub eids: Vec<u64>,
    pub t: SizingVar,
    pub a: f64,
    pub b: f64,
    pub e: f64,
    pub nu: f64,
    /// Simply supported edges; clamped otherwise.
    pub simply_supported: bool,
    vars: Option<WebVars>,
}

impl Web {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        pid: u64,
        eid: u64,
        eids: Vec<u64>,
        t: SizingVar,
        a: f64,
        b: f64,
        e: f64,
        nu: f64,
        simply_supported: bool,
    ) -> Self {
        Web {
            name: name.into(),
            pid,
            ptype: "PSHELL".to_string(),
            eltype: "CQUAD4".to_string(),
            eid,
            eids,
            t,
            a,
            b,
            e,
            nu,
            simply_supported,
            vars: None,
        }
    }

    pub fn vars(&self) -> Option<&WebVars> {
        self.vars.as_ref()
    }

    /// Plate coefficients for the boundary condition.
    fn plate_coefficients(&self) -> (f64, f64) {
        if self.simply_supported {
            (4.0, 5.6)
        } else {
            (7.4, 9.3)
        }
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

    /// Closed-form plate buckling margin, bounded below by `ms`.
    pub fn constrain_buckling(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        flavor: WebBuckling,
        ms: f64,
    ) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_buckling(&mut staged, dcid, flavor, ms)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    fn ensure_dvars(&mut self, model: &mut OptModel) -> DeckResult<WebVars> {
        if let Some(vars) = &self.vars {
            return Ok(vars.clone());
        }
        check_eltype(&self.eltype, "CQUAD4")?;
        if self.ptype != "PSHELL" {
            return Err(unsupported_ptype(&self.ptype, "web"));
        }
        let t = model.add_desvar("WEBt", self.t.initial, self.t.lb, self.t.ub)?;
        let id = model.allocate(CardKind::Dvprel);
        let rel = Dvprel1::new(id, "PSHELL", self.pid, "T", vec![(t, 1.0)])?;
        model.add_dvprel(Dvprel::Linear(rel));
        let vars = WebVars {
            t,
            a_key: model.add_table_constant("WEBa", self.a)?,
            b_key: model.add_table_constant("WEBb", self.b)?,
            e_key: model.add_table_constant("WEBE", self.e)?,
            nu_key: model.add_table_constant("WEBnu", self.nu)?,
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
            ("WEBZ1VM", "WEBZ1VMA", "von Mises or maximum shear at Z1"),
            ("WEBZ2VM", "WEBZ2VMA", "von Mises or maximum shear at Z2"),
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

    fn apply_buckling(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        flavor: WebBuckling,
        ms: f64,
    ) -> DeckResult<()> {
        let vars = self.ensure_dvars(model)?;
        let (kc, ks) = self.plate_coefficients();
        let nxx_code = get_output_code("FORCE", &self.eltype, "Membrane force x")?;
        let nxx = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(nxx, "WEBfNxx", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(nxx_code)
                .with_atti(vec![self.eid]),
        ));
        let (expr, dresp1s) = match flavor {
            WebBuckling::Compression => {
                let expr = format!(
                    "D(t,b,E,nu,Nxx) = 12.*(1.-nu**2)*b**2;\
                     FCcr = {kc:.3}*PI(1)**2*E*t**2/D;\
                     NC = MAX(ABS(Nxx), 0.00000001);\
                     MS = FCcr*t/NC - 1."
                );
                (expr, vec![nxx])
            }
            WebBuckling::CompressionShear => {
                let nxy_code = get_output_code("FORCE", &self.eltype, "Membrane force xy")?;
                let nxy = model.allocate(CardKind::Dresp);
                model.add_dresp(Dresp::R1(
                    Dresp1::new(nxy, "WEBfNxy", "FORCE")?
                        .with_ptype("ELEM")
                        .with_atta(nxy_code)
                        .with_atti(vec![self.eid]),
                ));
                let expr = format!(
                    "D(t,b,E,nu,Nxx,Nxy) = 12.*(1.-nu**2)*b**2;\
                     FCcr = {kc:.3}*PI(1)**2*E*t**2/D;\
                     FScr = {ks:.3}*PI(1)**2*E*t**2/D;\
                     RC = Nxx/(FCcr*t);\
                     RS = Nxy/(FScr*t);\
                     MS = 2./(RC + SQRT(RC**2 + 4.*RS**2)) - 1."
                );
                (expr, vec![nxx, nxy])
            }
        };
        let eq = model.add_deqatn(expr)?;
        let r2 = model.allocate(CardKind::Dresp);
        let dresp2 = Dresp2::new(r2, "WEBBUCK", EqRef::Equation(eq))?
            .with_desvars(vec![vars.t])
            .with_table_labels(vec![
                vars.b_key.clone(),
                vars.e_key.clone(),
                vars.nu_key.clone(),
            ])
            .with_dresp1s(dresp1s);
        let rid = model.add_dresp(Dresp::R2(dresp2));
        model.add_dconstr(dcid, rid, Some(ms), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_web(simply_supported: bool) -> Web {
        Web::new(
            "W1",
            30,
            501,
            vec![501, 502],
            SizingVar::new(2.0, 1.0, 8.0),
            300.0,
            150.0,
            71000.0,
            0.33,
            simply_supported,
        )
    }

    #[test]
    fn test_create_dvars() {
        let mut model = OptModel::new();
        let mut web = test_web(true);
        web.create_dvars(&mut model).unwrap();
        assert_eq!(model.desvars.len(), 1);
        assert_eq!(
            model.dtable.keys().cloned().collect::<Vec<_>>(),
            vec!["WEBE", "WEBa", "WEBb", "WEBnu"]
        );
        let vars = web.vars().unwrap();
        assert_eq!(model.desvars[&vars.t].label, "WEBt");
    }

    #[test]
    fn test_buckling_compression_simply_supported() {
        let mut model = OptModel::new();
        let mut web = test_web(true);
        web.constrain_buckling(&mut model, 1, WebBuckling::Compression, 0.0)
            .unwrap();
        assert_eq!(model.deqatns.len(), 1);
        let eq = model.deqatns.values().next().unwrap();
        assert!(eq.expr.starts_with("D(t,b,E,nu,Nxx) = "));
        assert!(eq.expr.contains("FCcr = 4.000*PI(1)**2*E*t**2/D"));
        let r2 = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R2(r2) => Some(r2),
                _ => None,
            })
            .unwrap();
        assert_eq!(r2.label, "WEBBUCK");
        assert_eq!(r2.labels, vec!["WEBb", "WEBE", "WEBnu"]);
        assert_eq!(r2.dresp1s.len(), 1);
        model.validate().unwrap();
    }

    #[test]
    fn test_buckling_combined_clamped() {
        let mut model = OptModel::new();
        let mut web = test_web(false);
        web.constrain_buckling(&mut model, 1, WebBuckling::CompressionShear, 0.1)
            .unwrap();
        let eq = model.deqatns.values().next().unwrap();
        assert!(eq.expr.contains("FCcr = 7.400*PI(1)**2*E*t**2/D"));
        assert!(eq.expr.contains("FScr = 9.300*PI(1)**2*E*t**2/D"));
        let r2 = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R2(r2) => Some(r2),
                _ => None,
            })
            .unwrap();
        assert_eq!(r2.dresp1s.len(), 2);
        let con = model.dconstrs.values().find(|c| c.rid == r2.id).unwrap();
        assert_eq!(con.lallow, Some(0.1));
        assert_eq!(con.uallow, None);
    }

    #[test]
    fn test_von_mises_averaged_one_feeder_per_element() {
        let mut model = OptModel::new();
        let mut web = test_web(true);
        web.constrain_von_mises(&mut model, 1, 350.0, true).unwrap();
        // two feeders per fiber plus one AVG response each
        assert_eq!(model.dresps.len(), 6);
        for r in model.dresps.values() {
            match r {
                Dresp::R1(r1) => assert_eq!(r1.atti.len(), 1),
                Dresp::R2(r2) => assert_eq!(r2.dresp1s.len(), web.eids.len()),
                _ => panic!("unexpected response kind"),
            }
        }
        model.validate().unwrap();
    }

    #[test]
    fn test_von_mises_after_buckling_reuses_dvars() {
        let mut model = OptModel::new();
        let mut web = test_web(true);
        web.constrain_buckling(&mut model, 1, WebBuckling::Compression, 0.0)
            .unwrap();
        web.constrain_von_mises(&mut model, 1, 350.0, false).unwrap();
        assert_eq!(model.desvars.len(), 1);
        assert_eq!(model.dtable.len(), 4);
    }
}
