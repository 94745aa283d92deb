//! # Identifier Allocation
//!
//! Every optimization entity gets a numeric id from a per-kind counter.
//! The kinds start a million apart so generated ids can never collide
//! with each other, and stay clear of hand-numbered cards in the
//! analysis model, which conventionally live below 1,000,000.
//!
//! The allocator is owned by the entity graph and serialized with it,
//! so a reloaded session continues numbering where it left off.

use serde::{Deserialize, Serialize};

/// The families of generated optimization cards.
///
/// DRESP1, DRESP2 and DRESP3 share [`CardKind::Dresp`] because they
/// cross-reference each other by id within a single numbering space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    Desvar,
    Dvprel,
    Dresp,
    Deqatn,
    Dconstr,
    Dlink,
}

impl CardKind {
    /// First id handed out for this kind.
    pub fn base(self) -> u64 {
        match self {
            CardKind::Desvar => 1_000_000,
            CardKind::Dvprel => 2_000_000,
            CardKind::Dresp => 3_000_000,
            CardKind::Deqatn => 4_000_000,
            CardKind::Dconstr => 5_000_000,
            CardKind::Dlink => 6_000_000,
        }
    }
}

/// Monotonic per-kind id counters. Ids are never freed or reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdAllocator {
    next_desvar: u64,
    next_dvprel: u64,
    next_dresp: u64,
    next_deqatn: u64,
    next_dconstr: u64,
    next_dlink: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator {
            next_desvar: CardKind::Desvar.base(),
            next_dvprel: CardKind::Dvprel.base(),
            next_dresp: CardKind::Dresp.base(),
            next_deqatn: CardKind::Deqatn.base(),
            next_dconstr: CardKind::Dconstr.base(),
            next_dlink: CardKind::Dlink.base(),
        }
    }

    /// Hand out the next id of the given kind.
    pub fn next_id(&mut self, kind: CardKind) -> u64 {
        let slot = match kind {
            CardKind::Desvar => &mut self.next_desvar,
            CardKind::Dvprel => &mut self.next_dvprel,
            CardKind::Dresp => &mut self.next_dresp,
            CardKind::Deqatn => &mut self.next_deqatn,
            CardKind::Dconstr => &mut self.next_dconstr,
            CardKind::Dlink => &mut self.next_dlink,
        };
        let id = *slot;
        *slot += 1;
        id
    }
}
