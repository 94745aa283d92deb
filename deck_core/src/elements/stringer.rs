//! # Stiffener
//!
//! Bar stiffener with a Z or blade cross section. On `PBAR` properties
//! the section integrals (A, I1, I2, J) follow the free dimensions
//! through equation relations; on `PBARL` the free dimensions map
//! linearly onto the library section's `DIMi` fields. Checks: axial
//! stress against tension and compression allowables, and a crippling
//! or column buckling margin per section family.

use serde::{Deserialize, Serialize};

use crate::cards::{Dresp, Dresp1, Dresp2, Dvprel, Dvprel1, Dvprel2, EqRef};
use crate::elements::{check_eltype, unsupported_ptype, SizingVar};
use crate::errors::{DeckError, DeckResult};
use crate::ids::CardKind;
use crate::model::OptModel;
use crate::output_codes::get_output_code;
use crate::sizing::dim_slot;

/// Cross-section family and its free/fixed dimension split.
///
/// Dimensions carried as [`SizingVar`] become design variables; plain
/// scalars stay fixed and enter the deck as table constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StringerProfile {
    /// Z section, uniform thickness free.
    Zt { t: SizingVar, b: f64, h: f64 },
    /// Z section, thickness and flange width free.
    ZtB { t: SizingVar, b: SizingVar, h: f64 },
    /// Z section, all uniform dimensions free.
    ZtBH { t: SizingVar, b: SizingVar, h: SizingVar },
    /// Z section with independent flange and web thicknesses.
    ZtfTwBH {
        tf: SizingVar,
        tw: SizingVar,
        b: SizingVar,
        h: SizingVar,
    },
    /// Blade section, thickness free.
    Bt { t: SizingVar, h: f64 },
    /// Blade section, thickness and height free.
    BtH { t: SizingVar, h: SizingVar },
}

impl StringerProfile {
    fn is_blade(&self) -> bool {
        matches!(self, StringerProfile::Bt { .. } | StringerProfile::BtH { .. })
    }
}

/// Graph entities a stringer has registered. Which slots are filled
/// depends on the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StringerVars {
    pub t: Option<u64>,
    pub tf: Option<u64>,
    pub tw: Option<u64>,
    pub b: Option<u64>,
    pub h: Option<u64>,
    pub b_key: Option<String>,
    pub h_key: Option<String>,
    pub l_key: Option<String>,
    pub e_key: String,
    pub nu_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stringer {
    pub name: String,
    pub pid: u64,
    /// `PBAR` or `PBARL`.
    pub ptype: String,
    pub eltype: String,
    pub eid: u64,
    pub profile: StringerProfile,
    /// Unsupported column length.
    pub length: f64,
    pub e: f64,
    pub nu: f64,
    vars: Option<StringerVars>,
}

impl Stringer {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        pid: u64,
        ptype: impl Into<String>,
        eid: u64,
        profile: StringerProfile,
        length: f64,
        e: f64,
        nu: f64,
    ) -> Self {
        Stringer {
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

    pub fn vars(&self) -> Option<&StringerVars> {
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
        staged_self.apply_stress(&mut staged, dcid, StressSide::Tension(fty.abs()))?;
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
        staged_self.apply_stress(&mut staged, dcid, StressSide::Compression(-fcy.abs()))?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    /// Crippling (Z sections) or column buckling (blades) margin,
    /// bounded below by `ms`.
    pub fn constrain_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let mut staged = model.clone();
        let mut staged_self = self.clone();
        staged_self.apply_buckling(&mut staged, dcid, ms)?;
        *self = staged_self;
        *model = staged;
        Ok(())
    }

    fn ensure_dvars(&mut self, model: &mut OptModel) -> DeckResult<StringerVars> {
        if let Some(vars) = &self.vars {
            return Ok(vars.clone());
        }
        check_eltype(&self.eltype, "CBAR")?;
        if self.ptype != "PBAR" && self.ptype != "PBARL" {
            return Err(unsupported_ptype(&self.ptype, "stringer"));
        }
        let mut vars = StringerVars {
            e_key: model.add_table_constant("STRE", self.e)?,
            nu_key: model.add_table_constant("STRnu", self.nu)?,
            ..StringerVars::default()
        };
        match self.profile.clone() {
            StringerProfile::Zt { t, b, h } => {
                vars.t = Some(model.add_desvar("STRZt", t.initial, t.lb, t.ub)?);
                vars.b_key = Some(model.add_table_constant("STRZb", b)?);
                vars.h_key = Some(model.add_table_constant("STRZh", h)?);
            }
            StringerProfile::ZtB { t, b, h } => {
                vars.t = Some(model.add_desvar("STRZt", t.initial, t.lb, t.ub)?);
                vars.b = Some(model.add_desvar("STRZb", b.initial, b.lb, b.ub)?);
                vars.h_key = Some(model.add_table_constant("STRZh", h)?);
            }
            StringerProfile::ZtBH { t, b, h } => {
                vars.t = Some(model.add_desvar("STRZt", t.initial, t.lb, t.ub)?);
                vars.b = Some(model.add_desvar("STRZb", b.initial, b.lb, b.ub)?);
                vars.h = Some(model.add_desvar("STRZh", h.initial, h.lb, h.ub)?);
            }
            StringerProfile::ZtfTwBH { tf, tw, b, h } => {
                if self.ptype == "PBARL" {
                    return Err(DeckError::unsupported(
                        "PBARL stringer with split thicknesses",
                        "the Z library section carries one wall thickness",
                    ));
                }
                vars.tf = Some(model.add_desvar("STRZtf", tf.initial, tf.lb, tf.ub)?);
                vars.tw = Some(model.add_desvar("STRZtw", tw.initial, tw.lb, tw.ub)?);
                vars.b = Some(model.add_desvar("STRZb", b.initial, b.lb, b.ub)?);
                vars.h = Some(model.add_desvar("STRZh", h.initial, h.lb, h.ub)?);
            }
            StringerProfile::Bt { t, h } => {
                vars.t = Some(model.add_desvar("STRBt", t.initial, t.lb, t.ub)?);
                vars.h_key = Some(model.add_table_constant("STRBh", h)?);
                vars.l_key = Some(model.add_table_constant("STRBL", self.length)?);
            }
            StringerProfile::BtH { t, h } => {
                vars.t = Some(model.add_desvar("STRBt", t.initial, t.lb, t.ub)?);
                vars.h = Some(model.add_desvar("STRBh", h.initial, h.lb, h.ub)?);
                vars.l_key = Some(model.add_table_constant("STRBL", self.length)?);
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

    /// Section integral equations on `PBAR`, one DVPREL2 per field.
    fn add_pbar_relations(&self, model: &mut OptModel, vars: &StringerVars) -> DeckResult<()> {
        let eqs: [(&str, &str); 4] = if self.profile.is_blade() {
            [
                ("A", "A(t,h) = t*h"),
                ("I1", "I1(t,h) = t*h**3/12. + t*h*(h/2.)**2"),
                ("I2", "I2(t,h) = h*t**3/12."),
                (
                    "J",
                    "I1(t,h) = t*h**3/12. + t*h*(h/2.)**2;I2 = h*t**3/12.;J = I1 + I2",
                ),
            ]
        } else if matches!(self.profile, StringerProfile::ZtfTwBH { .. }) {
            [
                ("A", "A(tf,tw,b,h) = 2*tf*b + tw*h"),
                (
                    "I1",
                    "I1f(tf,tw,b,h) = tf*b**3/12.;I1w = h*tw**3/12.;\
                     d = tf/2. + b/2.;Ad2f = tf*b*d**2;I1 = 2*(I1f + Ad2f) + I1w",
                ),
                (
                    "I2",
                    "I2f(tf,tw,b,h) = b*tf**3/12.;I2w = tw*h**3/12.;\
                     d = h/2. - tf/2.;Ad2f = tf*b*d**2;I2 = 2*(I2f + Ad2f) + I2w",
                ),
                (
                    "J",
                    "I1f(tf,tw,b,h) = tf*b**3/12.;I1w = h*tw**3/12.;\
                     d1 = tf/2. + b/2.;I1 = 2*(I1f + tf*b*d1**2) + I1w;\
                     I2f = b*tf**3/12.;I2w = tw*h**3/12.;\
                     d2 = h/2. - tf/2.;I2 = 2*(I2f + tf*b*d2**2) + I2w;J = I1 + I2",
                ),
            ]
        } else {
            [
                ("A", "A(t,b,h) = 2*t*b + t*h"),
                (
                    "I1",
                    "I1f(t,b,h) = t*b**3/12.;I1w = h*t**3/12.;\
                     d = t/2. + b/2.;Ad2f = t*b*d**2;I1 = 2*(I1f + Ad2f) + I1w",
                ),
                (
                    "I2",
                    "I2f(t,b,h) = b*t**3/12.;I2w = t*h**3/12.;\
                     d = h/2. - t/2.;Ad2f = t*b*d**2;I2 = 2*(I2f + Ad2f) + I2w",
                ),
                (
                    "J",
                    "I1f(t,b,h) = t*b**3/12.;I1w = h*t**3/12.;\
                     d1 = t/2. + b/2.;I1 = 2*(I1f + t*b*d1**2) + I1w;\
                     I2f = b*t**3/12.;I2w = t*h**3/12.;\
                     d2 = h/2. - t/2.;I2 = 2*(I2f + t*b*d2**2) + I2w;J = I1 + I2",
                ),
            ]
        };
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

    /// Free dimensions mapped one-to-one onto library section `DIMi`
    /// fields on `PBARL`. Fixed dimensions stay on the property card.
    fn add_pbarl_relations(&self, model: &mut OptModel, vars: &StringerVars) -> DeckResult<()> {
        let section = if self.profile.is_blade() { "RECT" } else { "Z" };
        let mut slots: Vec<(u64, &str)> = Vec::new();
        if let Some(t) = vars.t {
            let quantity = if self.profile.is_blade() { "base" } else { "web thickness" };
            slots.push((t, quantity));
        }
        if let Some(b) = vars.b {
            slots.push((b, "cap bot width"));
        }
        if let Some(h) = vars.h {
            let quantity = if self.profile.is_blade() { "height" } else { "total width" };
            slots.push((h, quantity));
        }
        for (dvar, quantity) in slots {
            let slot = dim_slot(section, quantity)?;
            let id = model.allocate(CardKind::Dvprel);
            let rel = Dvprel1::new(id, "PBARL", self.pid, slot.pname, vec![(dvar, 1.0)])?;
            model.add_dvprel(Dvprel::Linear(rel));
        }
        Ok(())
    }

    /// DESVAR/DTABLE argument split in section equation order.
    fn relation_args(&self, vars: &StringerVars) -> (Vec<u64>, Vec<String>) {
        let ordered_vars = [vars.tf, vars.tw, vars.t, vars.b, vars.h];
        let dvars: Vec<u64> = ordered_vars.into_iter().flatten().collect();
        let ordered_keys = [&vars.b_key, &vars.h_key];
        let labels: Vec<String> = ordered_keys.into_iter().flatten().cloned().collect();
        (dvars, labels)
    }

    fn apply_stress(&mut self, model: &mut OptModel, dcid: u64, side: StressSide) -> DeckResult<()> {
        self.ensure_dvars(model)?;
        let (label, name) = match side {
            StressSide::Tension(_) => ("STRmaxS", "End A maximum"),
            StressSide::Compression(_) => ("STRminS", "End A minimum"),
        };
        let code = get_output_code("STRESS", &self.eltype, name)?;
        let rid = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(rid, label, "STRESS")?
                .with_ptype("ELEM")
                .with_atta(code)
                .with_atti(vec![self.eid]),
        ));
        match side {
            StressSide::Tension(fty) => model.add_dconstr(dcid, rid, None, Some(fty)),
            StressSide::Compression(fcy) => model.add_dconstr(dcid, rid, Some(fcy), None),
        };
        Ok(())
    }

    fn apply_buckling(&mut self, model: &mut OptModel, dcid: u64, ms: f64) -> DeckResult<()> {
        let vars = self.ensure_dvars(model)?;
        if self.profile.is_blade() {
            self.apply_blade_buckling(model, &vars, dcid, ms)
        } else {
            self.apply_z_crippling(model, &vars, dcid, ms)
        }
    }

    /// Web crippling of the Z section from a polynomial fit of the
    /// restraint coefficient, fed by the axial stress.
    fn apply_z_crippling(
        &self,
        model: &mut OptModel,
        vars: &StringerVars,
        dcid: u64,
        ms: f64,
    ) -> DeckResult<()> {
        if matches!(self.profile, StringerProfile::ZtfTwBH { .. }) {
            return Err(DeckError::unsupported(
                "crippling of a split-thickness Z section",
                "the restraint fit assumes one wall thickness",
            ));
        }
        let expr = "bf(t, b, h, E, nu, FA) = b-t/2.;bw = h-t;x = bf/bw;\
                    Kw = -206.08*x**5 + 588.3*x**4 - 596.43*x**3 \
                    + 249.62*x**2 -41.924*x + 6.4545;\
                    SIGMAcr = Kw*PI(1)**2*E*t**2/(12.*(1.-nu**2)*bw**2);\
                    MS = SIGMAcr/ABS(MIN(FA, 0.0001))-1.;";
        let code = get_output_code("STRESS", &self.eltype, "Axial")?;
        let fa = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(fa, "STRZFA", "STRESS")?
                .with_ptype("ELEM")
                .with_atta(code)
                .with_atti(vec![self.eid]),
        ));
        let eq = model.add_deqatn(expr)?;
        let (dvars, mut labels) = self.relation_args(vars);
        labels.push(vars.e_key.clone());
        labels.push(vars.nu_key.clone());
        let r2 = model.allocate(CardKind::Dresp);
        let dresp2 = Dresp2::new(r2, "STRBUCK", EqRef::Equation(eq))?
            .with_desvars(dvars)
            .with_table_labels(labels)
            .with_dresp1s(vec![fa]);
        let rid = model.add_dresp(Dresp::R2(dresp2));
        model.add_dconstr(dcid, rid, Some(ms), None);
        Ok(())
    }

    /// Combined compression and shear buckling of the blade, fed by the
    /// bar axial force and plane-1 shear.
    fn apply_blade_buckling(
        &self,
        model: &mut OptModel,
        vars: &StringerVars,
        dcid: u64,
        ms: f64,
    ) -> DeckResult<()> {
        let l_key = match &vars.l_key {
            Some(key) => key.clone(),
            None => {
                return Err(DeckError::invalid_input(
                    "l_key",
                    "",
                    "blade buckling needs the length constant registered by create_dvars",
                ))
            }
        };
        let expr = "kc(t, h, L, E, nu, PC, PS) = 0.456 + (h/L)**2;\
                    FCcr = kc*PI(1)**2*E*t**2/(12.*(1.-nu**2)*h**2);\
                    FC = PC/(t*h);Rc = FC/FCcr;x = L/h;\
                    ks = 0.0648*x**6 - 1.2338*x**5 + 9.4869*x**4 \
                    -37.697*x**3 + 81.88*x**2 - 93.218*x + 50.411;\
                    ks = MAX(ks, 5.42);\
                    FScr = ks*PI(1)**2*E*t**2/(12.*(1.-nu**2)*h**2);\
                    FS = PS/(t*h);Rs = FS/FScr;\
                    MS = 2./(Rc + SQRT(Rc**2 + 4*Rs**2)) - 1.";
        let pc_code = get_output_code("FORCE", &self.eltype, "Axial force")?;
        let ps_code = get_output_code("FORCE", &self.eltype, "Shear plane 1")?;
        let pc = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(pc, "STRPC", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(pc_code)
                .with_atti(vec![self.eid]),
        ));
        let ps = model.allocate(CardKind::Dresp);
        model.add_dresp(Dresp::R1(
            Dresp1::new(ps, "STRPS", "FORCE")?
                .with_ptype("ELEM")
                .with_atta(ps_code)
                .with_atti(vec![self.eid]),
        ));
        let eq = model.add_deqatn(expr)?;
        let (dvars, mut labels) = self.relation_args(vars);
        labels.push(l_key);
        labels.push(vars.e_key.clone());
        labels.push(vars.nu_key.clone());
        let r2 = model.allocate(CardKind::Dresp);
        let dresp2 = Dresp2::new(r2, "STRBUCK", EqRef::Equation(eq))?
            .with_desvars(dvars)
            .with_table_labels(labels)
            .with_dresp1s(vec![pc, ps]);
        let rid = model.add_dresp(Dresp::R2(dresp2));
        model.add_dconstr(dcid, rid, Some(ms), None);
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum StressSide {
    Tension(f64),
    Compression(f64),
}
