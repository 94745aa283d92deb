//! # Card Encoding
//!
//! Renders each entity into small-field bulk data lines. Packing rules
//! are part of the output contract:
//!
//! - continuation lines start with `+` left-justified into field 1;
//! - DRESP1 carries one sampled id on the head line, then eight per
//!   continuation;
//! - reference blocks on DRESP2/DRESP3/DVPREL2 start with the block
//!   name (`DESVAR`, `DTABLE`, `DRESP1`) and carry seven entries per
//!   line;
//! - DVPREL1 carries its (variable, coefficient) pairs on continuation
//!   lines only, four pairs per line;
//! - DLINK fits two pairs on the head line, then four per continuation;
//! - the design table packs four (label, value) pairs per line in
//!   sorted label order.
//!
//! Optional fields render as blank 8-column fields; they are always
//! present so downstream field positions never shift.

use std::collections::BTreeMap;

use crate::errors::DeckResult;

use super::format;
use super::{Dconstr, Deqatn, Dlink, Dresp, Dresp1, Dresp2, Dresp3, Dvprel, Dvprel1, Dvprel2, Desvar, EqRef, Objective, RawCard};

fn opt_int(card: &str, field: &str, value: Option<u64>) -> DeckResult<String> {
    match value {
        Some(v) => format::int_field(card, field, v),
        None => Ok(format::blank().to_string()),
    }
}

fn opt_float(card: &str, field: &str, value: Option<f64>) -> DeckResult<String> {
    match value {
        Some(v) => format::float_field(card, field, v),
        None => Ok(format::blank().to_string()),
    }
}

fn opt_label(card: &str, field: &str, value: Option<&str>) -> DeckResult<String> {
    match value {
        Some(v) => format::label_field(card, field, v),
        None => Ok(format::blank().to_string()),
    }
}

fn eq_field(card: &str, eq: &EqRef) -> DeckResult<String> {
    match eq {
        EqRef::Equation(id) => format::int_field(card, "eqid", *id),
        EqRef::Builtin(name) => format::label_field(card, "eqid", name),
    }
}

/// Reference block shared by DRESP2, DRESP3 and DVPREL2: block name
/// left-justified, then seven prerendered fields per line.
fn aux_block(block_label: &str, fields: &[String], lines: &mut Vec<String>) {
    let mut line = format::keyword("+");
    line.push_str(&format!("{block_label:<8}"));
    let mut count = 2;
    for field in fields {
        count += 1;
        if count == 10 {
            lines.push(std::mem::replace(&mut line, format::keyword("+")));
            count = 3;
        }
        line.push_str(field);
    }
    lines.push(line);
}

fn id_fields(card: &str, field: &str, ids: &[u64]) -> DeckResult<Vec<String>> {
    ids.iter().map(|&id| format::int_field(card, field, id)).collect()
}

fn label_fields(card: &str, field: &str, labels: &[String]) -> DeckResult<Vec<String>> {
    labels.iter().map(|l| format::label_field(card, field, l)).collect()
}

fn push_ref_blocks(
    card: &str,
    dvars: &[u64],
    labels: &[String],
    dresp1s: &[u64],
    lines: &mut Vec<String>,
) -> DeckResult<()> {
    if !dvars.is_empty() {
        aux_block("DESVAR", &id_fields(card, "dvar", dvars)?, lines);
    }
    if !labels.is_empty() {
        aux_block("DTABLE", &label_fields(card, "dtable", labels)?, lines);
    }
    if !dresp1s.is_empty() {
        aux_block("DRESP1", &id_fields(card, "dresp1", dresp1s)?, lines);
    }
    Ok(())
}

impl Desvar {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut line = format::keyword("DESVAR");
        line.push_str(&format::int_field("DESVAR", "id", self.id)?);
        line.push_str(&format::label_field("DESVAR", "label", &self.label)?);
        line.push_str(&format::float_field("DESVAR", "xinit", self.xinit)?);
        line.push_str(&format::float_field("DESVAR", "xlb", self.xlb)?);
        line.push_str(&format::float_field("DESVAR", "xub", self.xub)?);
        line.push_str(&opt_float("DESVAR", "delx", self.delx)?);
        line.push_str(&opt_int("DESVAR", "ddval", self.ddval)?);
        Ok(vec![line])
    }
}

impl Deqatn {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let text = format!("  {}", self.expr);
        let fragments = format::wrap_equation(&text);
        let mut lines = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            if i == 0 {
                let mut head = format::keyword("DEQATN");
                head.push_str(&format::int_field("DEQATN", "id", self.id)?);
                head.push_str(fragment);
                lines.push(head);
            } else {
                let mut cont = format::keyword("+");
                cont.push_str(&format!("{fragment:<64}"));
                lines.push(cont);
            }
        }
        Ok(lines)
    }
}

impl Dresp1 {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut lines = Vec::new();
        let mut line = format::keyword("DRESP1");
        line.push_str(&format::int_field("DRESP1", "id", self.id)?);
        line.push_str(&format::label_field("DRESP1", "label", &self.label)?);
        line.push_str(&format::label_field("DRESP1", "rtype", &self.rtype)?);
        line.push_str(&opt_label("DRESP1", "ptype", self.ptype.as_deref())?);
        line.push_str(&opt_int("DRESP1", "region", self.region)?);
        line.push_str(&opt_int("DRESP1", "atta", self.atta)?);
        line.push_str(&opt_int("DRESP1", "attb", self.attb)?);
        if self.atti.is_empty() {
            line.push_str(format::blank());
        } else {
            let mut count = 8;
            for &entry in &self.atti {
                count += 1;
                if count == 10 {
                    lines.push(std::mem::replace(&mut line, format::keyword("+")));
                    count = 2;
                }
                line.push_str(&format::int_field("DRESP1", "atti", entry)?);
            }
        }
        lines.push(line);
        Ok(lines)
    }
}

impl Dresp2 {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut head = format::keyword("DRESP2");
        head.push_str(&format::int_field("DRESP2", "id", self.id)?);
        head.push_str(&format::label_field("DRESP2", "label", &self.label)?);
        head.push_str(&eq_field("DRESP2", &self.eq)?);
        head.push_str(&opt_int("DRESP2", "region", self.region)?);
        let mut lines = vec![head];
        push_ref_blocks("DRESP2", &self.dvars, &self.labels, &self.dresp1s, &mut lines)?;
        Ok(lines)
    }
}

impl Dresp3 {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut head = format::keyword("DRESP3");
        head.push_str(&format::int_field("DRESP3", "id", self.id)?);
        head.push_str(&format::label_field("DRESP3", "label", &self.label)?);
        head.push_str(&format::label_field("DRESP3", "group", &self.group)?);
        head.push_str(&format::label_field("DRESP3", "type", &self.rtype)?);
        head.push_str(&opt_int("DRESP3", "region", self.region)?);
        let mut lines = vec![head];
        push_ref_blocks("DRESP3", &self.dvars, &self.labels, &self.dresp1s, &mut lines)?;
        Ok(lines)
    }
}

impl Dresp {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        match self {
            Dresp::R1(r) => r.encode(),
            Dresp::R2(r) => r.encode(),
            Dresp::R3(r) => r.encode(),
        }
    }
}

impl Dvprel1 {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut head = format::keyword("DVPREL1");
        head.push_str(&format::int_field("DVPREL1", "id", self.id)?);
        head.push_str(&format::label_field("DVPREL1", "ptype", &self.ptype)?);
        head.push_str(&format::int_field("DVPREL1", "pid", self.pid)?);
        head.push_str(&format::label_field("DVPREL1", "pname", &self.pname)?);
        head.push_str(format::blank());
        head.push_str(format::blank());
        head.push_str(&format::float_field("DVPREL1", "c0", self.c0)?);
        let mut lines = vec![head];

        let mut line = format::keyword("+");
        let mut fieldnum = 0;
        for &(dvar, coef) in &self.pairs {
            fieldnum += 2;
            if fieldnum == 10 {
                lines.push(std::mem::replace(&mut line, format::keyword("+")));
                fieldnum = 2;
            }
            line.push_str(&format::int_field("DVPREL1", "dvar", dvar)?);
            line.push_str(&format::float_field("DVPREL1", "coef", coef)?);
        }
        lines.push(line);
        Ok(lines)
    }
}

impl Dvprel2 {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut head = format::keyword("DVPREL2");
        head.push_str(&format::int_field("DVPREL2", "id", self.id)?);
        head.push_str(&format::label_field("DVPREL2", "ptype", &self.ptype)?);
        head.push_str(&format::int_field("DVPREL2", "pid", self.pid)?);
        head.push_str(&format::label_field("DVPREL2", "pname", &self.pname)?);
        head.push_str(format::blank());
        head.push_str(format::blank());
        head.push_str(&eq_field("DVPREL2", &self.eq)?);
        let mut lines = vec![head];
        push_ref_blocks("DVPREL2", &self.dvars, &self.labels, &[], &mut lines)?;
        Ok(lines)
    }
}

impl Dvprel {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        match self {
            Dvprel::Linear(p) => p.encode(),
            Dvprel::Equation(p) => p.encode(),
        }
    }
}

impl Dconstr {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut line = format::keyword("DCONSTR");
        line.push_str(&format::int_field("DCONSTR", "dcid", self.dcid)?);
        line.push_str(&format::int_field("DCONSTR", "rid", self.rid)?);
        line.push_str(&opt_float("DCONSTR", "lallow", self.lallow)?);
        line.push_str(&opt_float("DCONSTR", "uallow", self.uallow)?);
        Ok(vec![line])
    }
}

impl Dlink {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut lines = Vec::new();
        let mut line = format::keyword("DLINK");
        line.push_str(&format::int_field("DLINK", "id", self.id)?);
        line.push_str(&format::int_field("DLINK", "ddvid", self.ddvid)?);
        line.push_str(&format::float_field("DLINK", "c0", self.c0)?);
        line.push_str(&format::float_field("DLINK", "cmult", self.cmult)?);
        let mut count = 4;
        for &(dvar, coef) in &self.pairs {
            count += 2;
            if count == 10 {
                lines.push(std::mem::replace(&mut line, format::keyword("+")));
                count = 2;
            }
            line.push_str(&format::int_field("DLINK", "dvar", dvar)?);
            line.push_str(&format::float_field("DLINK", "coef", coef)?);
        }
        lines.push(line);
        Ok(lines)
    }
}

impl Objective {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        let mut line = format::keyword("DESOBJ");
        line.push_str(&format::int_field("DESOBJ", "rid", self.rid)?);
        line.push_str(&format::label_field("DESOBJ", "minmax", self.minmax.as_str())?);
        Ok(vec![line])
    }
}

impl RawCard {
    pub fn encode(&self) -> DeckResult<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// The single deck-wide design table, four (label, value) pairs per
/// line in sorted label order.
pub fn encode_dtable(entries: &BTreeMap<String, f64>) -> DeckResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut line = format::keyword("DTABLE");
    let mut count = 0;
    for (label, &value) in entries {
        count += 2;
        if count == 10 {
            lines.push(std::mem::replace(&mut line, format::keyword("+")));
            count = 2;
        }
        line.push_str(&format::label_field("DTABLE", "label", label)?);
        line.push_str(&format::float_field("DTABLE", "value", value)?);
    }
    lines.push(line);
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desvar_line() {
        let dvar = Desvar::new(1_000_000, "PANt", 2.0, 0.5, 6.0).unwrap();
        let lines = dvar.encode().unwrap();
        assert_eq!(
            lines,
            vec!["DESVAR   1000000    PANt     2.0     0.5     6.0                ".to_string()]
        );
    }

    #[test]
    fn test_dresp1_single_sample() {
        let r = Dresp1::new(3_000_000, "PANZ1VM", "STRESS")
            .unwrap()
            .with_ptype("PSHELL")
            .with_atta(9)
            .with_atti(vec![2023]);
        let lines = r.encode().unwrap();
        assert_eq!(
            lines,
            vec!["DRESP1   3000000 PANZ1VM  STRESS  PSHELL               9            2023".to_string()]
        );
    }

    #[test]
    fn test_dresp1_blank_sample_field_when_global() {
        let r = Dresp1::new(3_000_000, "mass", "MASS").unwrap();
        let lines = r.encode().unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].len(), 72);
        assert!(lines[0].starts_with("DRESP1   3000000    mass    MASS"));
        assert!(lines[0].ends_with("        "));
    }

    #[test]
    fn test_dresp1_continuation_packs_eight_per_line() {
        let atti: Vec<u64> = (1..=10).collect();
        let r = Dresp1::new(3_000_000, "PANZ1VM", "STRESS")
            .unwrap()
            .with_ptype("ELEM")
            .with_atta(9)
            .with_atti(atti.clone());
        let lines = r.encode().unwrap();
        assert_eq!(lines.len(), 3);
        // one on the head line, eight on the first continuation, one left
        assert!(lines[0].ends_with("       1"));
        assert!(lines[1].starts_with("+       "));
        assert_eq!(lines[1].len(), 8 + 8 * 8);
        assert_eq!(lines[2], "+             10");
        // union of references, order preserved
        let mut seen = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            // the head line's atti entries start at byte 64; earlier fields
            // (e.g. atta) must not be collected as references
            let data = if i == 0 { &line[64..] } else { line.trim_start_matches('+') };
            for chunk in data.as_bytes().chunks(8) {
                let text = std::str::from_utf8(chunk).unwrap().trim();
                if let Ok(v) = text.parse::<u64>() {
                    if v < 3_000_000 {
                        seen.push(v);
                    }
                }
            }
        }
        assert_eq!(seen, atti);
    }

    #[test]
    fn test_dresp2_reference_blocks() {
        let r = Dresp2::new(3_000_002, "STRBUCK", EqRef::Equation(4_000_000))
            .unwrap()
            .with_desvars(vec![1_000_000])
            .with_table_labels(vec!["STRBh".to_string(), "STRE".to_string()])
            .with_dresp1s(vec![3_000_000, 3_000_001]);
        let lines = r.encode().unwrap();
        assert_eq!(lines[0], "DRESP2   3000002 STRBUCK 4000000        ");
        assert_eq!(lines[1], "+       DESVAR   1000000");
        assert_eq!(lines[2], "+       DTABLE     STRBh    STRE");
        assert_eq!(lines[3], "+       DRESP1   3000000 3000001");
    }

    #[test]
    fn test_dresp2_block_packs_seven_per_line() {
        let dvars: Vec<u64> = (1_000_000..1_000_009).collect();
        let r = Dresp2::new(3_000_000, "CHK", EqRef::Equation(4_000_000))
            .unwrap()
            .with_desvars(dvars);
        let lines = r.encode().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].len(), 16 + 7 * 8);
        assert_eq!(lines[2], "+        1000007 1000008");
    }

    #[test]
    fn test_dresp2_builtin_function_name() {
        let r = Dresp2::new(3_000_000, "PANZ1VM", EqRef::Builtin("AVG".to_string()))
            .unwrap()
            .with_dresp1s(vec![3_000_001]);
        let lines = r.encode().unwrap();
        assert_eq!(lines[0], "DRESP2   3000000 PANZ1VM     AVG        ");
    }

    #[test]
    fn test_dresp3_head_line() {
        let r = Dresp3::new(3_000_000, "PCBUCK1", "PCBUCK", "BUCK_PC").unwrap();
        let lines = r.encode().unwrap();
        assert_eq!(lines[0], "DRESP3   3000000 PCBUCK1  PCBUCK BUCK_PC        ");
    }

    #[test]
    fn test_dvprel1_pairs_live_on_continuations() {
        let p = Dvprel1::new(2_000_000, "PSHELL", 2023, "T", vec![(1_000_000, 1.0)]).unwrap();
        let lines = p.encode().unwrap();
        assert_eq!(
            lines,
            vec![
                "DVPREL1  2000000  PSHELL    2023       T                     0.0".to_string(),
                "+        1000000     1.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_dvprel1_four_pairs_per_continuation() {
        let pairs: Vec<(u64, f64)> = (0..5).map(|i| (1_000_000 + i, 1.0)).collect();
        let p = Dvprel1::new(2_000_000, "PBARL", 15, "DIM1", pairs).unwrap();
        let lines = p.encode().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].len(), 8 + 4 * 16);
        assert_eq!(lines[2], "+        1000004     1.0");
    }

    #[test]
    fn test_dvprel2_head_and_blocks() {
        let p = Dvprel2::new(2_000_000, "PBAR", 15, "A", EqRef::Equation(4_000_001))
            .with_desvars(vec![1_000_000, 1_000_001]);
        let lines = p.encode().unwrap();
        assert_eq!(
            lines,
            vec![
                "DVPREL2  2000000    PBAR      15       A                 4000001".to_string(),
                "+       DESVAR   1000000 1000001".to_string(),
            ]
        );
    }

    #[test]
    fn test_dconstr_lower_bound_only() {
        let c = Dconstr {
            id: 5_000_000,
            dcid: 1,
            rid: 3_000_002,
            lallow: Some(0.1),
            uallow: None,
        };
        assert_eq!(
            c.encode().unwrap(),
            vec!["DCONSTR        1 3000002     0.1        ".to_string()]
        );
    }

    #[test]
    fn test_dlink_two_pairs_on_head() {
        let link = Dlink::new(
            6_000_000,
            1_000_000,
            vec![(1_000_001, 1.0), (1_000_002, 0.5), (1_000_003, 2.0)],
        )
        .unwrap();
        let lines = link.encode().unwrap();
        assert_eq!(
            lines,
            vec![
                "DLINK    6000000 1000000     0.0     1.0 1000001     1.0 1000002     0.5"
                    .to_string(),
                "+        1000003     2.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_deqatn_single_line() {
        let eq = Deqatn::new(4_000_000, "T(t)=t").unwrap();
        assert_eq!(eq.encode().unwrap(), vec!["DEQATN   4000000  T(t)=t".to_string()]);
    }

    #[test]
    fn test_deqatn_continuations_padded() {
        let expr = format!("MS(a)={};X=1.", "a".repeat(80));
        let eq = Deqatn::new(4_000_000, &expr).unwrap();
        let lines = eq.encode().unwrap();
        assert!(lines.len() >= 2);
        assert_eq!(lines[0].len(), 16 + 56);
        for cont in &lines[1..] {
            assert!(cont.starts_with("+       "));
            assert_eq!(cont.len(), 72);
        }
        // fragments reassemble the stored expression
        let mut text = lines[0][16..].to_string();
        for cont in &lines[1..] {
            text.push_str(cont[8..].trim_end());
        }
        assert_eq!(text, format!("  {expr}"));
    }

    #[test]
    fn test_objective_line() {
        let obj = Objective {
            rid: 3_000_005,
            minmax: crate::cards::MinMax::Min,
        };
        assert_eq!(obj.encode().unwrap(), vec!["DESOBJ   3000005     MIN".to_string()]);
    }

    #[test]
    fn test_dtable_sorted_four_pairs_per_line() {
        let mut entries = BTreeMap::new();
        entries.insert("STRBh".to_string(), 50.0);
        entries.insert("STRBL".to_string(), 120.0);
        entries.insert("STRE".to_string(), 71000.0);
        entries.insert("STRnu".to_string(), 0.33);
        entries.insert("PANt".to_string(), 2.0);
        let lines = encode_dtable(&entries).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "DTABLE      PANt     2.0   STRBL   120.0   STRBh    50.0    STRE 71000.0"
        );
        assert_eq!(lines[1], "+          STRnu    0.33");
    }
}
