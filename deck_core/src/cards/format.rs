//! # Fixed-Width Field Primitives
//!
//! The solver's small-field bulk data format packs every value into an
//! 8-column field. Integers and labels are right-justified and must fit;
//! floats are printed in their shortest decimal form, guaranteed to carry
//! a decimal point, and may be shortened from the right as long as the
//! point and a leading digit survive. Anything that cannot be represented
//! in 8 columns is a hard error, never a silent widening of the line.

use crate::errors::{DeckError, DeckResult};

/// Width of one small-field column group.
pub const FIELD_WIDTH: usize = 8;

/// Equation characters available on a DEQATN head line
/// (16 columns are taken by the keyword and the id).
pub const EQ_HEAD_BUDGET: usize = 56;

/// Equation characters available on a DEQATN continuation line.
pub const EQ_CONT_BUDGET: usize = 64;

/// Card keyword, left-justified into the first field.
pub fn keyword(name: &str) -> String {
    format!("{name:<FIELD_WIDTH$}")
}

/// An empty field.
pub fn blank() -> &'static str {
    "        "
}

/// Right-justified integer field. Errors if the value needs more than
/// 8 columns.
pub fn int_field(card: &str, field: &str, value: u64) -> DeckResult<String> {
    let text = value.to_string();
    if text.len() > FIELD_WIDTH {
        return Err(DeckError::field_overflow(card, field, text));
    }
    Ok(format!("{text:>FIELD_WIDTH$}"))
}

/// Right-justified label field. Errors if the label is longer than
/// 8 characters.
pub fn label_field(card: &str, field: &str, value: &str) -> DeckResult<String> {
    if value.len() > FIELD_WIDTH {
        return Err(DeckError::field_overflow(card, field, value));
    }
    Ok(format!("{value:>FIELD_WIDTH$}"))
}

/// Shortest decimal text for `x`, always carrying a decimal point.
fn float_text(x: f64) -> String {
    let mut text = x.to_string();
    if !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Right-justified real field.
///
/// Values longer than 8 characters are shortened by dropping trailing
/// digits, which loses precision but never magnitude. If the decimal
/// point or every nonzero digit would be dropped the value has no
/// 8-column representation and the call fails.
pub fn float_field(card: &str, field: &str, value: f64) -> DeckResult<String> {
    if !value.is_finite() {
        return Err(DeckError::invalid_input(
            field,
            value.to_string(),
            format!("{card} fields must be finite"),
        ));
    }
    let text = float_text(value);
    if text.len() <= FIELD_WIDTH {
        return Ok(format!("{text:>FIELD_WIDTH$}"));
    }
    let short = &text[..FIELD_WIDTH];
    if !short.contains('.') || !short.chars().any(|c| ('1'..='9').contains(&c)) {
        // dropping the point or every significant digit would change
        // the value, not just its precision
        return Err(DeckError::field_overflow(card, field, text));
    }
    Ok(short.to_string())
}

/// Split an equation string into line-sized fragments.
///
/// The first fragment fits the head-line budget, the rest the
/// continuation budget. A break lands after the last `;` inside the
/// budget when one exists, otherwise exactly at the budget boundary.
/// Concatenating the fragments reproduces the input. The input must be
/// ASCII (enforced when the equation is constructed) so byte offsets
/// are character offsets.
pub fn wrap_equation(eq: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut rest = eq;
    let mut budget = EQ_HEAD_BUDGET;
    while !rest.is_empty() {
        if rest.len() <= budget {
            fragments.push(rest.to_string());
            break;
        }
        let cut = match rest[..budget].rfind(';') {
            Some(pos) => pos + 1,
            None => budget,
        };
        fragments.push(rest[..cut].to_string());
        rest = &rest[cut..];
        budget = EQ_CONT_BUDGET;
    }
    fragments
}
