//! # Deck Writer
//!
//! Serializes an [`OptModel`] into the optimization portion of a bulk
//! data deck. The whole deck is rendered into memory first; validation
//! or encoding failures abort before a single byte reaches the sink, so
//! a failed run never produces a truncated file.
//!
//! Sections appear in a fixed order the consuming toolchain expects:
//! design table, variables, links, variable-to-property relations,
//! responses, equations, constraints, objective, and finally any
//! pass-through property cards. Each non-empty section is preceded by a
//! `$` banner; empty sections emit nothing.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::cards::encode::encode_dtable;
use crate::errors::{DeckError, DeckResult};
use crate::model::OptModel;

fn banner(text: &str, out: &mut String) {
    out.push_str("$ ");
    out.push_str(&"_".repeat(72));
    out.push('\n');
    out.push_str("$ ");
    out.push_str(&" ".repeat(72));
    out.push('\n');
    out.push_str("$ ");
    out.push_str(text);
    out.push('\n');
    out.push_str("$\n");
}

fn push_lines(lines: Vec<String>, out: &mut String) {
    for line in lines {
        out.push_str(&line);
        out.push('\n');
    }
}

/// Render the full deck to a string.
///
/// Encoding the same graph twice yields byte-identical output: every
/// collection iterates in id order, which equals creation order.
pub fn render_deck(model: &OptModel) -> DeckResult<String> {
    model.validate()?;

    let mut out = String::new();

    if !model.dtable.is_empty() {
        banner("DESIGN TABLE", &mut out);
        push_lines(encode_dtable(&model.dtable)?, &mut out);
    }
    if !model.desvars.is_empty() {
        banner("DESIGN VARIABLES", &mut out);
        for dvar in model.desvars.values() {
            push_lines(dvar.encode()?, &mut out);
        }
    }
    if !model.dlinks.is_empty() {
        banner("DESIGN LINKS", &mut out);
        for link in model.dlinks.values() {
            push_lines(link.encode()?, &mut out);
        }
    }
    if !model.dvprels.is_empty() {
        banner("DESIGN VARIABLE-TO-PROPERTY RELATIONS", &mut out);
        for dvprel in model.dvprels.values() {
            push_lines(dvprel.encode()?, &mut out);
        }
    }
    if !model.dresps.is_empty() {
        banner("DESIGN RESPONSES", &mut out);
        for dresp in model.dresps.values() {
            push_lines(dresp.encode()?, &mut out);
        }
    }
    if !model.deqatns.is_empty() {
        banner("DESIGN EQUATIONS", &mut out);
        for deqatn in model.deqatns.values() {
            push_lines(deqatn.encode()?, &mut out);
        }
    }
    if !model.dconstrs.is_empty() {
        banner("DESIGN CONSTRAINTS", &mut out);
        for dconstr in model.dconstrs.values() {
            push_lines(dconstr.encode()?, &mut out);
        }
    }
    if let Some(obj) = &model.objective {
        banner("DESIGN OBJECTIVE", &mut out);
        push_lines(obj.encode()?, &mut out);
    }
    for raw in &model.newprops {
        push_lines(raw.encode()?, &mut out);
    }

    Ok(out)
}

/// Render the deck and write it to `sink` in one shot.
pub fn write_deck(model: &OptModel, sink: &mut impl Write) -> DeckResult<()> {
    let text = render_deck(model)?;
    sink.write_all(text.as_bytes())
        .map_err(|e| DeckError::file_error("write deck", "<sink>", e.to_string()))
}

/// Render the deck and write it to `path` atomically.
///
/// Writes to a `.tmp` sibling, syncs, then renames over the target, so
/// an interrupted run leaves either the old file or the new one, never
/// a partial deck.
pub fn write_deck_file(model: &OptModel, path: &Path) -> DeckResult<()> {
    let text = render_deck(model)?;

    let tmp_path = path.with_extension("bdf.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        DeckError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(text.as_bytes()).map_err(|e| {
        DeckError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        DeckError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        DeckError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}
