use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::config::Difficulty;
use super::features::FeatureVector;
use crate::game::Candidate;

pub type MoveId = u64;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveHistoryEntry {
    pub move_id: MoveId,
    pub candidate: Candidate,
    pub features: FeatureVector,
    pub predicted_score: f64,
    pub adjusted_score: f64,
    #[serde(default)]
    pub actual_outcome: Option<bool>,
    pub difficulty: Difficulty,
    pub timestamp_ms: u64,
}

/// 定长环形缓冲：满了以后丢弃最早的记录。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveHistory {
    entries: VecDeque<MoveHistoryEntry>,
    capacity: usize,
    next_id: MoveId,
}

impl MoveHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    pub fn next_id(&self) -> MoveId {
        self.next_id
    }

    /// 追加记录并返回其 `move_id`。传入条目的 `move_id` 会被覆盖。
    pub fn push(&mut self, mut entry: MoveHistoryEntry) -> MoveId {
        let move_id = self.next_id;
        self.next_id += 1;
        entry.move_id = move_id;
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
        move_id
    }

    pub fn get(&self, move_id: MoveId) -> Option<&MoveHistoryEntry> {
        let index = self.position_of(move_id)?;
        self.entries.get(index)
    }

    pub fn get_mut(&mut self, move_id: MoveId) -> Option<&mut MoveHistoryEntry> {
        let index = self.position_of(move_id)?;
        self.entries.get_mut(index)
    }

    // id 单调递增且连续，可以直接按偏移定位
    fn position_of(&self, move_id: MoveId) -> Option<usize> {
        let first = self.entries.front()?.move_id;
        let index = usize::try_from(move_id.checked_sub(first)?).ok()?;
        self.entries
            .get(index)
            .filter(|entry| entry.move_id == move_id)
            .map(|_| index)
    }

    pub fn latest(&self) -> Option<&MoveHistoryEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveHistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 尚未回填结果的记录数。
    pub fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.actual_outcome.is_none())
            .count()
    }

    /// 已回填结果中预测（以 0.5 为界）与实际一致的比例。
    pub fn accuracy(&self) -> Option<f64> {
        let (resolved, correct) = self
            .entries
            .iter()
            .filter_map(|entry| {
                entry
                    .actual_outcome
                    .map(|outcome| (entry.predicted_score >= 0.5) == outcome)
            })
            .fold((0usize, 0usize), |(resolved, correct), hit| {
                (resolved + 1, correct + usize::from(hit))
            });
        if resolved == 0 {
            None
        } else {
            Some(correct as f64 / resolved as f64)
        }
    }
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::with_capacity(super::config::DEFAULT_HISTORY_CAPACITY)
    }
}
