use serde::{Deserialize, Serialize};

use crate::ai::Difficulty;

/// 棋盘上实体的唯一标识。
pub type EntityId = u32;

/// 三维坐标。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    pub fn midpoint(&self, other: &Vec3) -> Vec3 {
        Vec3::new(
            (self.x + other.x) / 2.0,
            (self.y + other.y) / 2.0,
            (self.z + other.z) / 2.0,
        )
    }
}

/// 棋盘上的一个水果（或其他可连接物件）。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub kind: String,
    pub position: Vec3,
    #[serde(default)]
    pub is_special: bool,
    #[serde(default)]
    pub is_power_up: bool,
    #[serde(default)]
    pub is_removed: bool,
}

impl Entity {
    pub fn new(id: EntityId, kind: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            kind: kind.into(),
            position,
            is_special: false,
            is_power_up: false,
            is_removed: false,
        }
    }

    pub fn special(mut self) -> Self {
        self.is_special = true;
        self
    }

    pub fn power_up(mut self) -> Self {
        self.is_power_up = true;
        self
    }

    pub fn removed(mut self) -> Self {
        self.is_removed = true;
        self
    }

    pub fn is_active(&self) -> bool {
        !self.is_removed
    }

    pub fn distance_to(&self, other: &Entity) -> f64 {
        self.position.distance(&other.position)
    }
}

/// 每个决策周期由调用方构造的只读快照。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameStateView {
    #[serde(default)]
    pub timestamp_ms: u64,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub player_score: i64,
    pub time_remaining_sec: f64,
    #[serde(default)]
    pub connections_made: i32,
    #[serde(default)]
    pub connections_needed: i32,
    pub difficulty: Difficulty,
}

impl GameStateView {
    pub fn new(entities: Vec<Entity>, difficulty: Difficulty) -> Self {
        Self {
            timestamp_ms: 0,
            entities,
            player_score: 0,
            time_remaining_sec: 60.0,
            connections_made: 0,
            connections_needed: 0,
            difficulty,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self {
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn with_time_remaining(mut self, seconds: f64) -> Self {
        self.time_remaining_sec = seconds;
        self
    }

    pub fn with_connections(mut self, made: i32, needed: i32) -> Self {
        self.connections_made = made;
        self.connections_needed = needed;
        self
    }

    pub fn active_entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_active())
    }

    pub fn find_entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    /// 玩家领先程度：已完成连接数占目标的比例，限制在 [0, 1]。
    pub fn player_advantage(&self) -> f64 {
        if self.connections_needed <= 0 {
            return 0.0;
        }
        (self.connections_made as f64 / self.connections_needed as f64).clamp(0.0, 1.0)
    }

    /// 与给定配对同类、但不属于该配对的存活实体数量。
    pub fn combo_count(&self, first: &Entity, second: &Entity) -> usize {
        self.active_entities()
            .filter(|entity| {
                entity.kind == first.kind && entity.id != first.id && entity.id != second.id
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean_in_three_dimensions() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(2.0, 3.0, 6.0);
        assert!((a.distance(&b) - 7.0).abs() < 1e-12);
    }

    #[test]
    fn player_advantage_is_clamped_progress() {
        let view = GameStateView::new(Vec::new(), Difficulty::Medium).with_connections(3, 4);
        assert!((view.player_advantage() - 0.75).abs() < 1e-12);

        let overshoot = GameStateView::new(Vec::new(), Difficulty::Medium).with_connections(9, 4);
        assert_eq!(overshoot.player_advantage(), 1.0);

        let no_goal = GameStateView::new(Vec::new(), Difficulty::Medium).with_connections(3, 0);
        assert_eq!(no_goal.player_advantage(), 0.0);
    }

    #[test]
    fn combo_count_skips_pair_and_removed_entities() {
        let entities = vec![
            Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0)),
            Entity::new(2, "apple", Vec3::new(1.0, 0.0, 0.0)),
            Entity::new(3, "apple", Vec3::new(2.0, 0.0, 0.0)),
            Entity::new(4, "apple", Vec3::new(3.0, 0.0, 0.0)).removed(),
            Entity::new(5, "grape", Vec3::new(4.0, 0.0, 0.0)),
        ];
        let view = GameStateView::new(entities, Difficulty::Easy);
        let first = view.find_entity(1).expect("entity 1 should exist");
        let second = view.find_entity(2).expect("entity 2 should exist");
        assert_eq!(view.combo_count(first, second), 1);
    }

    #[test]
    fn view_deserializes_with_defaults() {
        let json = r#"{
            "time_remaining_sec": 42.0,
            "difficulty": "hard",
            "entities": [
                { "id": 7, "kind": "peach", "position": { "x": 1.0, "y": 0.0, "z": -2.0 } }
            ]
        }"#;
        let view: GameStateView = serde_json::from_str(json).expect("view should parse");
        assert_eq!(view.entities.len(), 1);
        assert!(!view.entities[0].is_special);
        assert_eq!(view.difficulty, Difficulty::Hard);
        assert_eq!(view.connections_needed, 0);
    }
}
