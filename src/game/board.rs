use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::state::{Entity, EntityId, GameStateView, Vec3};
use crate::ai::Difficulty;

const DEFAULT_COLUMNS: u16 = 9;
const DEFAULT_ROWS: u16 = 9;
const DEFAULT_CELL_SIZE: f64 = 2.0;

/// 中心加成的上限，距离中心越远加成越小。
const CENTRALITY_BONUS_RANGE: f64 = 10.0;

const SPECIAL_CHANCE: f64 = 0.1;
const POWER_UP_CHANCE: f64 = 0.05;

pub const FRUIT_KINDS: [&str; 6] = ["apple", "banana", "grape", "orange", "peach", "cherry"];

/// 棋盘网格：位于 `y = center.y` 的 x/z 平面上，以 `center` 为中心。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoardLayout {
    pub center: Vec3,
    pub columns: u16,
    pub rows: u16,
    pub cell_size: f64,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            center: Vec3::default(),
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

impl BoardLayout {
    pub fn new(center: Vec3, columns: u16, rows: u16, cell_size: f64) -> Self {
        Self {
            center,
            columns,
            rows,
            cell_size,
        }
    }

    pub fn center_distance(&self, position: &Vec3) -> f64 {
        self.center.distance(position)
    }

    pub fn centrality_bonus(&self, position: &Vec3) -> f64 {
        (CENTRALITY_BONUS_RANGE - self.center_distance(position)).max(0.0)
    }

    /// 按行优先顺序返回所有格子中心。
    pub fn cells(&self) -> Vec<Vec3> {
        let half_cols = (self.columns as f64 - 1.0) / 2.0;
        let half_rows = (self.rows as f64 - 1.0) / 2.0;
        let mut cells = Vec::with_capacity(self.columns as usize * self.rows as usize);
        for row in 0..self.rows {
            for col in 0..self.columns {
                cells.push(Vec3::new(
                    self.center.x + (col as f64 - half_cols) * self.cell_size,
                    self.center.y,
                    self.center.z + (row as f64 - half_rows) * self.cell_size,
                ));
            }
        }
        cells
    }

    pub fn is_occupied<'a>(
        &self,
        cell: &Vec3,
        mut entities: impl Iterator<Item = &'a Entity>,
    ) -> bool {
        let half = self.cell_size / 2.0;
        entities.any(|entity| {
            entity.is_active()
                && (entity.position.x - cell.x).abs() < half
                && (entity.position.z - cell.z).abs() < half
        })
    }

    pub fn free_cells(&self, view: &GameStateView) -> Vec<Vec3> {
        self.cells()
            .into_iter()
            .filter(|cell| !self.is_occupied(cell, view.entities.iter()))
            .collect()
    }
}

/// 在网格上随机摆放成对水果，用于演示与测试。
pub struct BoardGenerator {
    layout: BoardLayout,
    rng: SmallRng,
}

impl BoardGenerator {
    pub fn with_seed(layout: BoardLayout, seed: u64) -> Self {
        Self {
            layout,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// 生成至多 `pairs` 对实体；格子不够时截断。
    pub fn generate(&mut self, kinds: &[&str], pairs: usize) -> Vec<Entity> {
        if kinds.is_empty() {
            return Vec::new();
        }
        let mut cells = self.layout.cells();
        cells.shuffle(&mut self.rng);
        let pairs = pairs.min(cells.len() / 2);

        let mut entities = Vec::with_capacity(pairs * 2);
        let mut next_id: EntityId = 1;
        for (pair_index, slots) in cells.chunks_exact(2).take(pairs).enumerate() {
            let kind = kinds[pair_index % kinds.len()];
            for position in slots {
                let mut entity = Entity::new(next_id, kind, *position);
                entity.is_special = self.rng.gen_bool(SPECIAL_CHANCE);
                entity.is_power_up = self.rng.gen_bool(POWER_UP_CHANCE);
                entities.push(entity);
                next_id += 1;
            }
        }
        entities
    }
}

impl GameStateView {
    /// 示例快照，方便前端调试或初始化。
    pub fn sample(seed: u64) -> Self {
        let mut generator = BoardGenerator::with_seed(BoardLayout::default(), seed);
        let entities = generator.generate(&FRUIT_KINDS, 12);
        GameStateView::new(entities, Difficulty::Medium)
            .with_time_remaining(120.0)
            .with_connections(0, 20)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_is_centered_on_origin() {
        let layout = BoardLayout::default();
        let cells = layout.cells();
        assert_eq!(cells.len(), 81);
        assert_eq!(cells[0], Vec3::new(-8.0, 0.0, -8.0));
        assert_eq!(cells[40], Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(cells[80], Vec3::new(8.0, 0.0, 8.0));
    }

    #[test]
    fn occupied_cells_are_excluded_from_free_cells() {
        let layout = BoardLayout::new(Vec3::default(), 3, 1, 2.0);
        let entities = vec![
            Entity::new(1, "apple", Vec3::new(-2.0, 0.0, 0.0)),
            Entity::new(2, "apple", Vec3::new(0.3, 0.0, 0.2)).removed(),
        ];
        let view = GameStateView::new(entities, Difficulty::Easy);
        let free = layout.free_cells(&view);
        assert_eq!(free, vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn centrality_bonus_fades_with_distance() {
        let layout = BoardLayout::default();
        assert_eq!(layout.centrality_bonus(&Vec3::default()), 10.0);
        assert_eq!(layout.centrality_bonus(&Vec3::new(4.0, 0.0, 0.0)), 6.0);
        assert_eq!(layout.centrality_bonus(&Vec3::new(30.0, 0.0, 0.0)), 0.0);
    }

    #[test]
    fn generator_places_pairs_on_distinct_cells() {
        let mut generator = BoardGenerator::with_seed(BoardLayout::default(), 7);
        let entities = generator.generate(&FRUIT_KINDS, 10);
        assert_eq!(entities.len(), 20);

        for kind in FRUIT_KINDS {
            let count = entities.iter().filter(|e| e.kind == kind).count();
            assert_eq!(count % 2, 0, "{kind} should appear in pairs");
        }

        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                assert_ne!(a.position, b.position);
                assert_ne!(a.id, b.id);
            }
        }
    }

    #[test]
    fn generator_is_deterministic_per_seed() {
        let first = BoardGenerator::with_seed(BoardLayout::default(), 99).generate(&FRUIT_KINDS, 6);
        let second =
            BoardGenerator::with_seed(BoardLayout::default(), 99).generate(&FRUIT_KINDS, 6);
        assert_eq!(first, second);
    }

    #[test]
    fn generator_truncates_to_available_cells() {
        let layout = BoardLayout::new(Vec3::default(), 3, 1, 2.0);
        let entities = BoardGenerator::with_seed(layout, 1).generate(&["apple"], 5);
        assert_eq!(entities.len(), 2);
    }
}
