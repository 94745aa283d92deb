//! # deck_core - SOL200 Structural Sizing Deck Generator
//!
//! `deck_core` builds NASTRAN SOL200 design optimization decks for
//! structural sizing. Engineering element types (panels, webs,
//! stringers, flanges) translate their sizing parameters and strength
//! checks into a graph of optimization entities, which then renders as
//! fixed-field bulk data ready to paste into an analysis deck.
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: the same graph always renders byte-identical
//!   output
//! - **JSON-First**: sessions round-trip through serde, so a sizing
//!   setup survives across runs
//! - **Rich Errors**: structured error types, not just strings
//! - **All-or-nothing mutation**: a failed synthesis call leaves the
//!   graph untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use deck_core::elements::{Panel, SizingVar};
//! use deck_core::model::OptModel;
//! use deck_core::writer::render_deck;
//!
//! let mut model = OptModel::new();
//! let mut panel = Panel::new(
//!     "wing_skin_07", 10, 205, vec![201, 202, 203, 204, 205],
//!     SizingVar::new(1.5, 0.8, 6.0),
//!     8000.0, 400.0, 200.0, 71000.0, 0.33,
//! );
//! panel.constrain_von_mises(&mut model, 1, 420.0, false)?;
//! model.create_mass_objective()?;
//!
//! let deck = render_deck(&model)?;
//! assert!(deck.contains("DESVAR"));
//! # Ok::<(), deck_core::errors::DeckError>(())
//! ```
//!
//! ## Modules
//!
//! - [`cards`] - Optimization card types and fixed-field encoding
//! - [`model`] - The optimization entity graph
//! - [`elements`] - Structural element families and their checks
//! - [`writer`] - Deck assembly and file output
//! - [`output_codes`] - Solver output quantity codes
//! - [`sizing`] - Library cross-section dimension slots
//! - [`session`] - Session persistence with atomic saves
//! - [`errors`] - Structured error types

pub mod cards;
pub mod elements;
pub mod errors;
pub mod ids;
pub mod model;
pub mod output_codes;
pub mod session;
pub mod sizing;
pub mod writer;

// Re-export commonly used types at crate root for convenience
pub use errors::{DeckError, DeckResult};
pub use model::OptModel;
pub use session::{load_session, save_session, Session};
pub use writer::{render_deck, write_deck, write_deck_file};
