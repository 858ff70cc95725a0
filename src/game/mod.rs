//! 棋盘快照、网格几何与候选枚举。

pub mod board;
pub mod moves;
pub mod state;

pub use board::{BoardGenerator, BoardLayout, FRUIT_KINDS};
pub use moves::{enumerate_matches, is_valid_match, Candidate, MatchPair, MATCH_DISTANCE_THRESHOLD};
pub use state::{Entity, EntityId, GameStateView, Vec3};
