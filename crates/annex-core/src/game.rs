//! The rules engine: claim validation, golden-move transactions, and the
//! derived queries.
//!
//! Every public operation is a complete transaction against the board:
//! it either commits all of its bookkeeping or returns an error with the
//! state exactly as it was. The golden move is the interesting case - its
//! legality depends on how the defender's region splits, which is only
//! discoverable by tentatively applying the seizure and recounting, so it
//! runs as an explicit apply/recount/commit-or-revert sequence with an undo
//! record captured up front.

use crate::board::{Board, PlayerId};
use crate::player::PlayerStats;
use crate::region::{merge_regions, RegionId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of compass sides of a cell.
const SIDES: usize = 4;

/// Errors surfaced by game operations.
///
/// Construction failures and argument rejections never touch the board;
/// rule violations may have applied a tentative mutation internally, but it
/// is always fully reverted before the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    /// Construction with a zero width, height, player count, or area limit.
    #[error("width, height, player count and area limit must all be at least 1")]
    InvalidConfig,

    /// Player id 0 or greater than the configured player count.
    #[error("player {0} is not part of this game")]
    UnknownPlayer(PlayerId),

    /// Coordinates outside the board.
    #[error("({0}, {1}) lies outside the board")]
    OutOfBounds(u32, u32),

    /// Normal claim on a cell that already has an owner.
    #[error("the cell is already claimed")]
    CellClaimed,

    /// Golden move on a cell nobody owns.
    #[error("the cell has no owner to seize")]
    CellUnclaimed,

    /// Golden move on a cell the mover already owns.
    #[error("cannot seize a cell the player already owns")]
    OwnCell,

    /// The player's one golden move has already been spent.
    #[error("the golden move has already been used")]
    GoldenMoveUsed,

    /// The move would start one region too many for the mover.
    #[error("the player is already at the area limit")]
    AreaLimitReached,

    /// The seizure would split the defender past the area limit.
    #[error("the seizure would split the defender past the area limit")]
    DefenderSplit,
}

/// Undo record for a tentative seizure: everything needed to put the board
/// and the label counter back exactly as they were.
#[derive(Debug)]
struct SeizureUndo {
    defender: PlayerId,
    /// Label the seized cell's region carried before the split floods ran.
    region: RegionId,
    /// Value of the fresh-label counter before the probe minted its labels.
    labels_before: RegionId,
    /// Cells the split floods relabeled.
    relabeled: Vec<(u32, u32)>,
}

/// Complete game state: the board plus the bookkeeping needed to answer
/// legality and field-count queries without rescanning the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    /// Stats for players 1..=player_count; player p lives at index p - 1.
    players: Vec<PlayerStats>,
    /// Maximum number of disjoint regions one player may hold.
    area_limit: u32,
    /// Unclaimed cells remaining on the board.
    free_count: u64,
    /// Next fresh region label.
    next_label: RegionId,
    /// Rendered column width, wide enough for the largest player id.
    frame: usize,
}

impl Game {
    /// Create a new game. Every parameter must be at least 1; otherwise
    /// nothing is allocated and `Err(InvalidConfig)` is returned.
    pub fn new(width: u32, height: u32, players: u32, area_limit: u32) -> Result<Self, GameError> {
        if width < 1 || height < 1 || players < 1 || area_limit < 1 {
            return Err(GameError::InvalidConfig);
        }
        Ok(Self {
            board: Board::new(width, height),
            players: vec![PlayerStats::new(); players as usize],
            area_limit,
            free_count: u64::from(width) * u64::from(height),
            next_label: 1,
            frame: digit_count(players),
        })
    }

    // ==================== Accessors ====================

    /// Board width in cells.
    pub fn width(&self) -> u32 {
        self.board.width()
    }

    /// Board height in cells.
    pub fn height(&self) -> u32 {
        self.board.height()
    }

    /// Number of players in the game.
    pub fn player_count(&self) -> u32 {
        self.players.len() as u32
    }

    /// Maximum number of disjoint regions one player may hold.
    pub fn area_limit(&self) -> u32 {
        self.area_limit
    }

    /// Read-only view of the grid.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Current owner of (x, y); `None` for an unclaimed or out-of-range
    /// cell.
    pub fn owner(&self, x: u32, y: u32) -> Option<PlayerId> {
        self.board.owner(x, y)
    }

    /// Full statistics record for `player`, or `None` for an invalid id.
    pub fn stats(&self, player: PlayerId) -> Option<&PlayerStats> {
        self.stats_index(player).map(|idx| &self.players[idx])
    }

    /// Current number of distinct regions `player` owns. 0 for an invalid
    /// player.
    pub fn areas(&self, player: PlayerId) -> u32 {
        self.stats(player).map_or(0, |s| s.area_count)
    }

    /// Whether `player` has already spent the golden move. False for an
    /// invalid player.
    pub fn golden_move_used(&self, player: PlayerId) -> bool {
        self.stats(player).is_some_and(|s| s.used_golden_move)
    }

    // ==================== Internal helpers ====================

    fn stats_index(&self, player: PlayerId) -> Option<usize> {
        if player >= 1 && (player as usize) <= self.players.len() {
            Some(player as usize - 1)
        } else {
            None
        }
    }

    fn check_player(&self, player: PlayerId) -> Result<usize, GameError> {
        self.stats_index(player)
            .ok_or(GameError::UnknownPlayer(player))
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<(), GameError> {
        if self.board.in_bounds(x, y) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds(x, y))
        }
    }

    fn fresh_label(&mut self) -> RegionId {
        let label = self.next_label;
        self.next_label += 1;
        label
    }

    /// Label of some `player`-owned region bordering (x, y), if any exists.
    fn bordering_region(&self, player: PlayerId, x: u32, y: u32) -> Option<RegionId> {
        self.board
            .neighbors(x, y)
            .find(|&(nx, ny)| self.board.owner(nx, ny) == Some(player))
            .map(|(nx, ny)| self.board.region(nx, ny))
    }

    /// Number of distinct `player`-owned regions among the neighbours of
    /// (x, y).
    fn distinct_neighbor_regions(&self, player: PlayerId, x: u32, y: u32) -> u32 {
        let mut labels = [0 as RegionId; SIDES];
        let mut count = 0;
        for (nx, ny) in self.board.neighbors(x, y) {
            if self.board.owner(nx, ny) != Some(player) {
                continue;
            }
            let label = self.board.region(nx, ny);
            if !labels[..count].contains(&label) {
                labels[count] = label;
                count += 1;
            }
        }
        count as u32
    }

    // ==================== Normal claims ====================

    /// Claim the unclaimed cell (x, y) for `player`.
    ///
    /// A claim touching none of the player's regions starts a new one and
    /// is rejected if the player is already at the area limit. A claim
    /// touching several regions fuses them into a single region. On `Err`
    /// the board is unchanged.
    pub fn claim(&mut self, player: PlayerId, x: u32, y: u32) -> Result<(), GameError> {
        let idx = self.check_player(player)?;
        self.check_bounds(x, y)?;
        if self.board.owner(x, y).is_some() {
            return Err(GameError::CellClaimed);
        }
        let bordering = self.bordering_region(player, x, y);
        if bordering.is_none() && self.players[idx].area_count >= self.area_limit {
            return Err(GameError::AreaLimitReached);
        }

        // Fusing k bordering regions into one shrinks the count by k - 1;
        // a claim with no bordering region grows it by one.
        let merged = self.distinct_neighbor_regions(player, x, y);
        let label = match bordering {
            Some(label) => label,
            None => self.fresh_label(),
        };
        self.players[idx].area_count = self.players[idx].area_count + 1 - merged;
        self.players[idx].occupied_count += 1;
        self.free_count -= 1;
        self.board.set_owner(x, y, Some(player));
        merge_regions(&mut self.board, player, (x, y), &[label]);
        Ok(())
    }

    // ==================== Golden moves ====================

    /// Validation shared by golden moves and probes; returns the mover's
    /// stats index and the defender.
    fn golden_checks(&self, player: PlayerId, x: u32, y: u32) -> Result<(usize, PlayerId), GameError> {
        let idx = self.check_player(player)?;
        self.check_bounds(x, y)?;
        if self.players[idx].used_golden_move {
            return Err(GameError::GoldenMoveUsed);
        }
        let defender = match self.board.owner(x, y) {
            None => return Err(GameError::CellUnclaimed),
            Some(p) if p == player => return Err(GameError::OwnCell),
            Some(p) => p,
        };
        if self.bordering_region(player, x, y).is_none()
            && self.players[idx].area_count >= self.area_limit
        {
            return Err(GameError::AreaLimitReached);
        }
        Ok((idx, defender))
    }

    /// Tentatively seize (x, y) and relabel the remnants of the defender's
    /// region, one fresh label per compass side. Each directional flood
    /// skips the labels of the floods before it, so the number of distinct
    /// labels left on the defender's neighbouring cells is exactly the
    /// number of fragments the region breaks into.
    fn seize_and_split(
        &mut self,
        player: PlayerId,
        defender: PlayerId,
        x: u32,
        y: u32,
    ) -> (u32, SeizureUndo) {
        let region = self.board.region(x, y);
        let labels_before = self.next_label;
        self.board.set_owner(x, y, Some(player));
        let fresh = [
            self.fresh_label(),
            self.fresh_label(),
            self.fresh_label(),
            self.fresh_label(),
        ];
        let mut relabeled = Vec::new();
        for (side, neighbor) in self.board.sides(x, y).into_iter().enumerate() {
            if let Some(start) = neighbor {
                relabeled.extend(merge_regions(
                    &mut self.board,
                    defender,
                    start,
                    &fresh[..=side],
                ));
            }
        }
        let fragments = self.distinct_neighbor_regions(defender, x, y);
        let undo = SeizureUndo {
            defender,
            region,
            labels_before,
            relabeled,
        };
        (fragments, undo)
    }

    /// Undo a tentative seizure: restore the owner, write the original
    /// region label back over every cell the split floods touched, and roll
    /// the label counter back so a rejected call leaves no trace at all.
    fn revert_seizure(&mut self, x: u32, y: u32, undo: SeizureUndo) {
        self.board.set_owner(x, y, Some(undo.defender));
        for (cx, cy) in undo.relabeled {
            self.board.set_region(cx, cy, undo.region);
        }
        self.next_label = undo.labels_before;
    }

    /// Seize the opponent-owned cell (x, y) as `player`'s one-per-game
    /// golden move.
    ///
    /// The seizure is applied tentatively, the defender's true post-removal
    /// region count is measured, and the transaction is then committed or
    /// reverted as a whole: on `Err` the board and every statistic are
    /// exactly as before the call.
    pub fn golden_move(&mut self, player: PlayerId, x: u32, y: u32) -> Result<(), GameError> {
        let (idx, defender) = self.golden_checks(player, x, y)?;
        let defender_idx = defender as usize - 1;
        let (fragments, undo) = self.seize_and_split(player, defender, x, y);
        if self.players[defender_idx].area_count + fragments - 1 > self.area_limit {
            self.revert_seizure(x, y, undo);
            return Err(GameError::DefenderSplit);
        }

        let merged = self.distinct_neighbor_regions(player, x, y);
        self.players[idx].area_count = self.players[idx].area_count + 1 - merged;
        self.players[idx].occupied_count += 1;
        self.players[idx].used_golden_move = true;
        self.players[defender_idx].area_count =
            self.players[defender_idx].area_count + fragments - 1;
        self.players[defender_idx].occupied_count -= 1;
        let label = self.fresh_label();
        merge_regions(&mut self.board, player, (x, y), &[label]);
        Ok(())
    }

    /// Whether some legal golden-move target currently exists for `player`.
    ///
    /// Probes every cell with the golden-move engine in always-revert mode,
    /// so it needs `&mut self`, but all observable state is untouched when
    /// it returns. False for an invalid player or a spent golden move.
    pub fn golden_move_possible(&mut self, player: PlayerId) -> bool {
        let idx = match self.stats_index(player) {
            Some(idx) => idx,
            None => return false,
        };
        if self.players[idx].used_golden_move {
            return false;
        }
        for y in 0..self.board.height() {
            for x in 0..self.board.width() {
                if self.golden_target_legal(player, x, y) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether seizing (x, y) would be a fully legal golden move for
    /// `player`. Always reverts the tentative seizure.
    fn golden_target_legal(&mut self, player: PlayerId, x: u32, y: u32) -> bool {
        let defender = match self.golden_checks(player, x, y) {
            Ok((_, defender)) => defender,
            Err(_) => return false,
        };
        let defender_idx = defender as usize - 1;
        let (fragments, undo) = self.seize_and_split(player, defender, x, y);
        let legal = self.players[defender_idx].area_count + fragments - 1 <= self.area_limit;
        self.revert_seizure(x, y, undo);
        legal
    }

    // ==================== Queries ====================

    /// Number of cells `player` currently owns. 0 for an invalid player.
    pub fn busy_fields(&self, player: PlayerId) -> u64 {
        self.stats(player).map_or(0, |s| s.occupied_count)
    }

    /// Number of unclaimed cells `player` could claim right now.
    ///
    /// Below the area limit every unclaimed cell qualifies, since a new
    /// region may still be started. At the limit only unclaimed cells
    /// touching one of the player's regions remain claimable. 0 for an
    /// invalid player.
    pub fn free_fields(&self, player: PlayerId) -> u64 {
        let idx = match self.stats_index(player) {
            Some(idx) => idx,
            None => return 0,
        };
        if self.players[idx].area_count < self.area_limit {
            return self.free_count;
        }
        if self.players[idx].area_count > self.area_limit {
            return 0;
        }

        let mut count = 0;
        for y in 0..self.board.height() {
            for x in 0..self.board.width() {
                if self.board.owner(x, y).is_none()
                    && self.bordering_region(player, x, y).is_some()
                {
                    count += 1;
                }
            }
        }
        count
    }

    // ==================== Rendering ====================

    /// Render the board as text, top row first. Owners are left-justified
    /// in a column wide enough for the largest player id; unclaimed cells
    /// show as `.`. One newline per row.
    pub fn snapshot(&self) -> String {
        let width = self.board.width() as usize;
        let height = self.board.height() as usize;
        let mut out = String::with_capacity((self.frame * width + 1) * height);
        for y in (0..self.board.height()).rev() {
            for x in 0..self.board.width() {
                match self.board.owner(x, y) {
                    Some(owner) => out.push_str(&format!("{:<1$}", owner, self.frame)),
                    None => out.push_str(&format!("{:<1$}", '.', self.frame)),
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Number of decimal digits of `n`: the rendered column width for a game
/// with `n` players.
fn digit_count(n: u32) -> usize {
    let mut digits = 1;
    let mut rest = n / 10;
    while rest != 0 {
        digits += 1;
        rest /= 10;
    }
    digits
}
