//! # Spar/Rib Flange
//!
//! Flat bar cap modeled as a rectangle of width `b` and thickness `t`.
//! Checks: axial stress allowables and combined compression/shear
//! buckling of the free edge, with the shear taken in the bar's second
//! plane.

use serde::{Deserialize, Serialize};

use crate::cards::{Dresp, Dresp1, Dresp2, Dvprel, Dvprel1, Dvprel2, EqRef};
use crate::elements::{check_eltype, unsupported_ptype, SizingVar};
use crate::errors::DeckResult;
use crate::ids::CardKind;
use crate::model::OptModel;
use crate::output_codes::get_output_code;
use crate::sizing::dim_slot;

/// Free/fixed split of the flange rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FlangeProfile {
    /// Thickness free, width fixed.
    T { t: SizingVar, b: f64 },
    /// Thickness and width free.
    TB { t: SizingVar, b: SizingVar },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlangeVars {
    pub t: Option<u64>,
    pub b: Option<u64>,
    pub b_key: Option<String>,
    pub l_key: String,
    pub e_key: String,
    pub nu_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flange {
    pub name: String,
    pub pid: u64,
    /// `PBAR` or `PBARL`.
    pub ptype: String,
    pub eltype: String,
    pub eid: u64,
    pub profile: FlangeProfile,
    /// Unsupported length of the free edge.
    pub length: f64,
    pub e: f64,
    pub nu: f64,
    vars: Option<FlangeVars>,
}

impl Flange {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        pid: u64,
        ptype: impl Into<String>,
        eid: u64,
        profile: FlangeProfile,
        length: f64,
        e: f64,
        nu: f64,
    ) -> Self {
        Flange {
            name: name.into(),
            pid,
            ptype: ptype.into(),
            eltype: "CBAR".to_string(),
            eid,
            profile,
            length,
            e,
            nu,
            vars: None,
        }
    }

    pub fn vars(&self) -> Option<&FlangeVars> {
        self.vars.as_ref()
    }

    /// Register the profile's design variables, fixed constants and
    /// property relations. Idempotent.
    pub fn create_dvars(&mut self, model: &mut OptModel) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.ensure_dvars(&mut staged)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Cap axial stress at `fty` in tension.
    pub fn constrain_stress_tension(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        fty: f64,
    ) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_stress(&mut staged, dcid, "FLAmaxS", "End A maximum", None, Some(fty.abs()))?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Cap axial stress at `fcy` in compression.
    pub fn constrain_stress_compression(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        fcy: f64,
    ) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_stress(&mut staged, dcid, "FLAminS", "End A minimum", Some(-fcy.abs()), None)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Free-edge buckling margin, bounded below by `ms`.
    pub fn constrain_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_buckling(&mut staged, dcid, ms)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    fn ensure_dvars(&mut self, model: &mut OptModel) -> DeckResult<FlangeVars> {
        if let Some(vars) = &self.vars {
            return Ok(vars.clone());
        }
        check_eltype(&self.eltype, "CBAR")?;
        if self.ptype != "PBAR" && self.ptype != "PBARL" {
            return Err(unsupported_ptype(&self.ptype, "flange"));
        }
        let mut vars = FlangeVars {
            l_key: model.add_table_constant("FLAL", self.length)?,
            e_key: model.add_table_constant("FLAE", self.e)?,
            nu_key: model.add_table_constant("FLAnu", self.nu)?,
            ..FlangeVars::default()
        };
        match self.profile.clone() {
            FlangeProfile::T { t, b } => {
                vars.t = Some(model.add_desvar("FLAt", t.initial, t.lb, t.ub)?);
                vars.b_key = Some(model.add_table_constant("FLAb", b)?);
            }
            FlangeProfile::TB { t, b } => {
                vars.t = Some(model.add_desvar("FLAt", t.initial, t.lb, t.ub)?);
                vars.b = Some(model.add_desvar("FLAb", b.initial, b.lb, b.ub)?);
            }
        }
        if self.ptype == "PBAR" {
            self.add_pbar_relations(model, &vars)?;
        } else {
            self.add_pbarl_relations(model, &vars)?;
        }
        self.vars = Some(vars.clone());
        Ok(vars)
    }

    fn add_pbar_relations(&self, model: &mut OptModel, vars: &FlangeVars) -> DeckResult<()> {
        let eqs: [(&str, &str); 4] = [
            ("A", "A(t,b) = t*b"),
            ("I1", "I1(t,b) = b*t**3/12."),
            ("I2", "I2(t,b) = t*b**3/12. + t*b*(b/2.)**2"),
            (
                "J",
                "I1(t,b) = b*t**3/12.;I2 = t*b**3/12. + t*b*(b/2.)**2;J = I1 + I2",
            ),
        ];
        let (dvars, labels) = self.relation_args(vars);
        for (pname, expr) in eqs {
            let eq = model.add_deqatn(expr)?;
            let id = model.allocate(CardKind::Dvprel);
            let rel = Dvprel2::new(id, "PBAR", self.pid, pname, EqRef::Equation(eq))
                .with_desvars(dvars.clone())
                .with_table_labels(labels.clone());
            model.add_dvprel(Dvprel::Equation(rel));
        }
        Ok(())
    }

    fn add_pbarl_relations(&self, model: &mut OptModel, vars: &FlangeVars) -> DeckResult<()> {
        let mut slots: Vec<(u64, &str)> = Vec::new();
        if let Some(b) = vars.b {
            slots.push((b, "base"));
        }
        if let Some(t) = vars.t {
            slots.push((t, "height"));
        }
        for (dvar, quantity) in slots {
            let slot = dim_slot("RECT", quantity)?;
            let id = model.allocate(CardKind::Dvprel);
            let rel = Dvprel1::new(id, "PBARL", self.pid, slot.pname, vec![(dvar, 1.0)])?;
            model.add_dvprel(Dvprel::Linear(rel));
        }
        Ok(())
    }

    /// DESVAR/DTABLE split in `(t, b)` equation order.
    fn relation_args(&self, vars: &FlangeVars) -> (Vec<u64>, Vec<String>) {
        let dvars: Vec<u64> = [vars.t, vars.b].into_iter().flatten().collect();
        let labels: Vec<String> = vars.b_key.iter().cloned().collect();
        (dvars, labels)
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_stress(
        &mut self,
        model: &mut OptModel,
        dcid: u64,
        label: &str,
        name: &str,
        lallow: Option<f64>,
        uallow: Option<f64>,
    ) -> DeckResult<()> {
        self.ensure_dvars(model)?;
        let code = get_output_code("STRESS", &self.eltype, name)?;
        let rid = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(rid, label, "STRESS")?
                .with_ptype("ELEM")
                .with_atta(code)
                .with_atti(vec![self.eid]),
        ));
        model.add_dconstr(dcid, rid, lallow, uallow);
        Ok(())
    }

    fn apply_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let vars = self.ensure_dvars(model)?;
        let expr = "kc(t, b, L, E, nu, PC, PS) = 0.456 + (b/L)**2;\
                    FCcr = kc*PI(1)**2*E*t**2/(12.*(1.-nu**2)*b**2);\
                    FC = PC/(t*b);Rc = FC/FCcr;x = L/b;\
                    ks = 0.0648*x**6 - 1.2338*x**5 + 9.4869*x**4 \
                    -37.697*x**3 + 81.88*x**2 - 93.218*x + 50.411;\
                    ks = MAX(ks, 5.42);\
                    FScr = ks*PI(1)**2*E*t**2/(12.*(1.-nu**2)*b**2);\
                    FS = PS/(t*b);Rs = FS/FScr;\
                    MS = 2./(Rc + SQRT(Rc**2 + 4*Rs**2)) - 1.";
        let pc_code = get_output_code("FORCE", &self.eltype, "Axial force")?;
        let ps_code = get_output_code("FORCE", &self.eltype, "Shear plane 2")?;
        let pc = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(pc, "FLAPC", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(pc_code)
                .with_atti(vec![self.eid]),
        ));
        let ps = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(ps, "FLAPS", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(ps_code)
                .with_atti(vec![self.eid]),
        ));
        let eq = model.add_deqatn(expr)?;
        let (dvars, mut labels) = self.relation_args(&vars);
        labels.push(vars.l_key.clone());
        labels.push(vars.e_key.clone());
        labels.push(vars.nu_key.clone());
        let r2 = model.allocate(CardKind::Dresp);
        let dresp2 = Dresp2::new(r2, "FLABUCK", EqRef::Equation(eq))?
            .with_desvars(dvars)
            .with_table_labels(labels)
            .with_dresp1s(vec![pc, ps]);
        let rid = model.add_dresp(Dresp::R2(dresp2));
        model.add_dconstr(dcid, rid, Some(ms), None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_flange(ptype: &str, profile: FlangeProfile) -> Flange {
        Flange::new("FLA1", 40, ptype, 601, profile, 250.0, 71000.0, 0.33)
    }

    #[test]
    fn test_fixed_width_buckling() {
        let mut model = OptModel::new();
        let mut flange = test_flange(
            "PBARL",
            FlangeProfile::T {
                t: SizingVar::new(3.0, 1.5, 8.0),
                b: 40.0,
            },
        );
        flange.constrain_buckling(&mut model, 1, 0.0).unwrap();
        assert_eq!(model.desvars.len(), 1);
        assert_eq!(model.dtable.len(), 4);
        let r2 = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R2(r2) => Some(r2),
                _ => None,
            })
            .unwrap();
        assert_eq!(r2.label, "FLABUCK");
        assert_eq!(r2.labels, vec!["FLAb", "FLAL", "FLAE", "FLAnu"]);
        assert_eq!(r2.dresp1s.len(), 2);
        model.validate().unwrap();
    }

    #[test]
    fn test_shear_taken_in_second_plane() {
        let mut model = OptModel::new();
        let mut flange = test_flange(
            "PBARL",
            FlangeProfile::T {
                t: SizingVar::new(3.0, 1.5, 8.0),
                b: 40.0,
            },
        );
        flange.constrain_buckling(&mut model, 1, 0.0).unwrap();
        let ps = model
            .dresps
            .values()
            .find_map(|r| match r {
                Dresp::R1(r1) if r1.label == "FLAPS" => Some(r1),
                _ => None,
            })
            .unwrap();
        assert_eq!(ps.atta, Some(7));
    }

    #[test]
    fn test_free_width_pbar_relations() {
        let mut model = OptModel::new();
        let mut flange = test_flange(
            "PBAR",
            FlangeProfile::TB {
                t: SizingVar::new(3.0, 1.5, 8.0),
                b: SizingVar::new(40.0, 25.0, 60.0),
            },
        );
        flange.create_dvars(&mut model).unwrap();
        assert_eq!(model.desvars.len(), 2);
        assert_eq!(model.deqatns.len(), 4);
        for rel in model.dvprels.values() {
            match rel {
                Dvprel::Equation(rel) => {
                    let vars = flange.vars().unwrap();
                    assert_eq!(rel.dvars, vec![vars.t.unwrap(), vars.b.unwrap()]);
                    assert!(rel.labels.is_empty());
                }
                Dvprel::Linear(_) => panic!("PBAR sizes through equations"),
            }
        }
    }

    #[test]
    fn test_pbarl_dim_mapping() {
        let mut model = OptModel::new();
        let mut flange = test_flange(
            "PBARL",
            FlangeProfile::TB {
                t: SizingVar::new(3.0, 1.5, 8.0),
                b: SizingVar::new(40.0, 25.0, 60.0),
            },
        );
        flange.create_dvars(&mut model).unwrap();
        let vars = flange.vars().unwrap();
        let mut rels = model.dvprels.values();
        match (rels.next().unwrap(), rels.next().unwrap()) {
            (Dvprel::Linear(width), Dvprel::Linear(thickness)) => {
                assert_eq!(width.pname, "DIM1");
                assert_eq!(width.pairs, vec![(vars.b.unwrap(), 1.0)]);
                assert_eq!(thickness.pname, "DIM2");
                assert_eq!(thickness.pairs, vec![(vars.t.unwrap(), 1.0)]);
            }
            _ => panic!("library sections size linearly"),
        }
    }

    #[test]
    fn test_stress_allowables() {
        let mut model = OptModel::new();
        let mut flange = test_flange(
            "PBARL",
            FlangeProfile::T {
                t: SizingVar::new(3.0, 1.5, 8.0),
                b: 40.0,
            },
        );
        flange.constrain_stress_tension(&mut model, 1, 480.0).unwrap();
        flange.constrain_stress_compression(&mut model, 1, 420.0).unwrap();
        let labels: Vec<_> = model
            .dresps
            .values()
            .map(|r| match r {
                Dresp::R1(r1) => r1.label.clone(),
                _ => panic!("expected atomic responses"),
            })
            .collect();
        assert_eq!(labels, vec!["FLAmaxS", "FLAminS"]);
    }
}
