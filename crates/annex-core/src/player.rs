//! Per-player bookkeeping.

use serde::{Deserialize, Serialize};

/// Statistics the engine maintains for one player.
///
/// `area_count` is kept equal to the true number of maximal 4-connected
/// regions the player owns; the move and golden-move paths update it
/// incrementally instead of recounting the grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Number of distinct regions the player currently owns.
    pub area_count: u32,
    /// Total cells the player currently owns.
    pub occupied_count: u64,
    /// Set when the player's single golden move has been committed; never
    /// cleared.
    pub used_golden_move: bool,
}

impl PlayerStats {
    /// Stats of a player that has not moved yet.
    pub fn new() -> Self {
        Self::default()
    }
}
