//! # Optimization Entity Graph
//!
//! [`OptModel`] owns every optimization entity of one deck session
//! together with the id allocator that numbers them. Entities are keyed
//! by id in ordered maps; since ids are handed out monotonically,
//! iteration order equals creation order and encoding the same graph
//! twice produces byte-identical output.
//!
//! Mutation either succeeds completely or leaves the graph untouched:
//! insert methods validate their inputs up front, and the synthesis
//! procedures in [`crate::elements`] stage their work on a clone of the
//! graph before committing.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::cards::{
    check_label, Dconstr, Deqatn, Desvar, Dlink, Dresp, Dresp2, Dvprel, EqRef, MinMax, Objective,
    RawCard,
};
use crate::errors::{DeckError, DeckResult};
use crate::ids::{CardKind, IdAllocator};

/// Width every design table key must fit.
const TABLE_KEY_WIDTH: usize = 8;

/// The entity graph of one optimization deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptModel {
    allocator: IdAllocator,
    pub desvars: BTreeMap<u64, Desvar>,
    pub dtable: BTreeMap<String, f64>,
    /// Per-root collision counters backing table key disambiguation.
    dtable_suffixes: HashMap<String, u64>,
    pub deqatns: BTreeMap<u64, Deqatn>,
    pub dresps: BTreeMap<u64, Dresp>,
    pub dvprels: BTreeMap<u64, Dvprel>,
    pub dconstrs: BTreeMap<u64, Dconstr>,
    pub dlinks: BTreeMap<u64, Dlink>,
    pub objective: Option<Objective>,
    pub newprops: Vec<RawCard>,
}

impl OptModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id of `kind`. Entities built outside the
    /// graph (responses, property relations) take their id from here
    /// and are inserted fully wired.
    pub fn allocate(&mut self, kind: CardKind) -> u64 {
        self.allocator.next_id(kind)
    }

    /// Create a design variable and return its id.
    pub fn add_desvar(
        &mut self,
        label: impl Into<String>,
        xinit: f64,
        xlb: f64,
        xub: f64,
    ) -> DeckResult<u64> {
        let id = self.allocator.next_id(CardKind::Desvar);
        let dvar = Desvar::new(id, label, xinit, xlb, xub)?;
        self.desvars.insert(id, dvar);
        Ok(id)
    }

    /// Insert a table constant under `label`, disambiguating on
    /// collision, and return the resolved key.
    ///
    /// The first insertion keeps the bare label. A later insertion of
    /// the same root appends a per-root counter: `PANa`, `PANa0`,
    /// `PANa1`, ... Keys never exceed 8 characters; when the suffixed
    /// key would, or when an 8-character label collides, the call
    /// fails with a capacity error.
    pub fn add_table_constant(&mut self, label: impl Into<String>, value: f64) -> DeckResult<String> {
        let root = label.into();
        check_label("DTABLE", "label", &root)?;
        if !self.dtable.contains_key(&root) {
            self.dtable.insert(root.clone(), value);
            return Ok(root);
        }
        if root.len() >= TABLE_KEY_WIDTH {
            return Err(DeckError::capacity_exhausted(
                "dtable",
                root,
                "8-character key already present, no room for a suffix",
            ));
        }
        loop {
            let counter = self.dtable_suffixes.entry(root.clone()).or_insert(0);
            let key = format!("{root}{counter}");
            *counter += 1;
            if key.len() > TABLE_KEY_WIDTH {
                return Err(DeckError::capacity_exhausted(
                    "dtable",
                    root,
                    "suffixed key exceeds 8 characters",
                ));
            }
            if !self.dtable.contains_key(&key) {
                self.dtable.insert(key.clone(), value);
                return Ok(key);
            }
        }
    }

    /// Create an equation and return its id.
    pub fn add_deqatn(&mut self, expr: impl Into<String>) -> DeckResult<u64> {
        let id = self.allocator.next_id(CardKind::Deqatn);
        let eq = Deqatn::new(id, expr)?;
        self.deqatns.insert(id, eq);
        Ok(id)
    }

    /// Insert a fully built response.
    pub fn add_dresp(&mut self, dresp: Dresp) -> u64 {
        let id = dresp.id();
        self.dresps.insert(id, dresp);
        id
    }

    /// Insert a fully built variable-to-property relation and record it
    /// as the consumer on every variable it reads.
    pub fn add_dvprel(&mut self, dvprel: Dvprel) -> u64 {
        let id = dvprel.id();
        for dv in dvprel.desvar_ids() {
            if let Some(dvar) = self.desvars.get_mut(&dv) {
                dvar.relation = Some(id);
            }
        }
        self.dvprels.insert(id, dvprel);
        id
    }

    /// Bound a response within constraint set `dcid`.
    pub fn add_dconstr(
        &mut self,
        dcid: u64,
        rid: u64,
        lallow: Option<f64>,
        uallow: Option<f64>,
    ) -> u64 {
        let id = self.allocator.next_id(CardKind::Dconstr);
        self.dconstrs.insert(
            id,
            Dconstr {
                id,
                dcid,
                rid,
                lallow,
                uallow,
            },
        );
        id
    }

    /// Link `ddvid` to independent variables.
    ///
    /// A dependent variable may not serve as an independent one, in
    /// either direction across the whole graph; violating links are
    /// rejected here rather than surfacing as a solver error.
    pub fn add_dlink(&mut self, ddvid: u64, pairs: Vec<(u64, f64)>, c0: f64, cmult: f64) -> DeckResult<u64> {
        for link in self.dlinks.values() {
            if link.pairs.iter().any(|&(dv, _)| dv == ddvid) {
                return Err(DeckError::invalid_input(
                    "ddvid",
                    ddvid.to_string(),
                    "variable is already independent in another link",
                ));
            }
        }
        for &(dv, _) in &pairs {
            if dv == ddvid
                || self.dlinks.values().any(|link| link.ddvid == dv)
            {
                return Err(DeckError::invalid_input(
                    "pairs",
                    dv.to_string(),
                    "independent variable is a dependent one",
                ));
            }
        }
        let id = self.allocator.next_id(CardKind::Dlink);
        let link = Dlink::new(id, ddvid, pairs)?.with_c0(c0).with_cmult(cmult);
        self.dlinks.insert(id, link);
        Ok(id)
    }

    /// Constrain two variables to a maximum relative difference.
    pub fn constrain_two_vars(
        &mut self,
        dcid: u64,
        var1: u64,
        var2: u64,
        maxdiff: f64,
    ) -> DeckResult<u64> {
        for var in [var1, var2] {
            if !self.desvars.contains_key(&var) {
                return Err(DeckError::dangling("DRESP2", var, "DESVAR", var.to_string()));
            }
        }
        let mut staged = self.clone();
        let eqid = staged.add_deqatn("T(v1,v2)=ABS(v2-v1)/ABS(v1)")?;
        let rid = staged.allocate(CardKind::Dresp);
        let label = format!("v1v2{}", rid % 10_000);
        let dresp2 = Dresp2::new(rid, label, EqRef::Equation(eqid))?.with_desvars(vec![var1, var2]);
        staged.add_dresp(Dresp::R2(dresp2));
        staged.add_dconstr(dcid, rid, None, Some(maxdiff));
        *self = staged;
        Ok(rid)
    }

    /// Create the total-mass response and make it the MIN objective.
    pub fn create_mass_objective(&mut self) -> DeckResult<u64> {
        let rid = self.allocator.next_id(CardKind::Dresp);
        let mass = crate::cards::Dresp1::new(rid, "mass", "MASS")?;
        self.dresps.insert(rid, Dresp::R1(mass));
        self.objective = Some(Objective {
            rid,
            minmax: MinMax::Min,
        });
        Ok(rid)
    }

    /// Append a preformatted property card emitted verbatim at the end
    /// of the deck.
    pub fn add_raw_card(&mut self, lines: Vec<String>) {
        self.newprops.push(RawCard { lines });
    }

    /// Check every cross-reference in the graph. Called before any
    /// encoding so a dangling id aborts the write with nothing
    /// emitted.
    pub fn validate(&self) -> DeckResult<()> {
        for dresp in self.dresps.values() {
            match dresp {
                Dresp::R1(_) => {}
                Dresp::R2(r) => {
                    if let EqRef::Equation(eqid) = r.eq {
                        self.check_deqatn("DRESP2", r.id, eqid)?;
                    }
                    self.check_refs("DRESP2", r.id, &r.dvars, &r.labels, &r.dresp1s)?;
                }
                Dresp::R3(r) => {
                    self.check_refs("DRESP3", r.id, &r.dvars, &r.labels, &r.dresp1s)?;
                }
            }
        }
        for dvprel in self.dvprels.values() {
            match dvprel {
                Dvprel::Linear(p) => {
                    for &(dv, _) in &p.pairs {
                        self.check_desvar("DVPREL1", p.id, dv)?;
                    }
                }
                Dvprel::Equation(p) => {
                    if let EqRef::Equation(eqid) = p.eq {
                        self.check_deqatn("DVPREL2", p.id, eqid)?;
                    }
                    self.check_refs("DVPREL2", p.id, &p.dvars, &p.labels, &[])?;
                }
            }
        }
        for dconstr in self.dconstrs.values() {
            if !self.dresps.contains_key(&dconstr.rid) {
                return Err(DeckError::dangling(
                    "DCONSTR",
                    dconstr.id,
                    "DRESP",
                    dconstr.rid.to_string(),
                ));
            }
        }
        for link in self.dlinks.values() {
            self.check_desvar("DLINK", link.id, link.ddvid)?;
            for &(dv, _) in &link.pairs {
                self.check_desvar("DLINK", link.id, dv)?;
            }
        }
        if let Some(obj) = &self.objective {
            if !self.dresps.contains_key(&obj.rid) {
                return Err(DeckError::dangling("DESOBJ", obj.rid, "DRESP", obj.rid.to_string()));
            }
        }
        Ok(())
    }

    fn check_desvar(&self, card: &str, id: u64, dv: u64) -> DeckResult<()> {
        if !self.desvars.contains_key(&dv) {
            return Err(DeckError::dangling(card, id, "DESVAR", dv.to_string()));
        }
        Ok(())
    }

    fn check_deqatn(&self, card: &str, id: u64, eqid: u64) -> DeckResult<()> {
        if !self.deqatns.contains_key(&eqid) {
            return Err(DeckError::dangling(card, id, "DEQATN", eqid.to_string()));
        }
        Ok(())
    }

    fn check_refs(
        &self,
        card: &str,
        id: u64,
        dvars: &[u64],
        labels: &[String],
        dresp1s: &[u64],
    ) -> DeckResult<()> {
        for &dv in dvars {
            self.check_desvar(card, id, dv)?;
        }
        for label in labels {
            if !self.dtable.contains_key(label) {
                return Err(DeckError::dangling(card, id, "DTABLE", label.clone()));
            }
        }
        for &rid in dresp1s {
            match self.dresps.get(&rid) {
                Some(Dresp::R1(_)) => {}
                Some(_) => {
                    return Err(DeckError::dangling(card, id, "DRESP1", rid.to_string()));
                }
                None => {
                    return Err(DeckError::dangling(card, id, "DRESP1", rid.to_string()));
                }
            }
        }
        Ok(())
    }
}
