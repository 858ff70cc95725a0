use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::board::BoardLayout;
use super::state::{Entity, EntityId, GameStateView, Vec3};

/// 两个同类实体可以连接的最大距离。
pub const MATCH_DISTANCE_THRESHOLD: f64 = 15.0;

const SPECIAL_PRIORITY_BONUS: f64 = 50.0;
const POWER_UP_PRIORITY_BONUS: f64 = 30.0;
const PROXIMITY_PRIORITY_BASE: f64 = 100.0;
const PROXIMITY_PRIORITY_SCALE: f64 = 10.0;
const ADVANTAGE_PENALTY: f64 = 10.0;
const COMBO_BONUS: f64 = 5.0;

/// 引擎给出的一个候选动作。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Candidate {
    Match {
        entity_a: EntityId,
        entity_b: EntityId,
        priority: f64,
    },
    Obstacle {
        position: Vec3,
        priority: f64,
    },
}

impl Candidate {
    /// 是否恰好连接这两个实体（与顺序无关）。
    pub fn covers(&self, first: EntityId, second: EntityId) -> bool {
        match self {
            Candidate::Match {
                entity_a, entity_b, ..
            } => {
                (*entity_a == first && *entity_b == second)
                    || (*entity_a == second && *entity_b == first)
            }
            Candidate::Obstacle { .. } => false,
        }
    }
}

/// 枚举阶段借用快照中的实体，仅在一次决策内存活。
#[derive(Debug, Clone)]
pub struct MatchPair<'a> {
    pub first: &'a Entity,
    pub second: &'a Entity,
    pub distance: f64,
    pub priority: f64,
}

impl MatchPair<'_> {
    pub fn midpoint(&self) -> Vec3 {
        self.first.position.midpoint(&self.second.position)
    }

    pub fn has_special(&self) -> bool {
        self.first.is_special || self.second.is_special
    }

    pub fn has_power_up(&self) -> bool {
        self.first.is_power_up || self.second.is_power_up
    }

    pub fn to_candidate(&self) -> Candidate {
        Candidate::Match {
            entity_a: self.first.id,
            entity_b: self.second.id,
            priority: self.priority,
        }
    }
}

pub fn is_valid_match(first: &Entity, second: &Entity) -> bool {
    first.is_active()
        && second.is_active()
        && first.id != second.id
        && first.kind == second.kind
        && first.distance_to(second) <= MATCH_DISTANCE_THRESHOLD
}

/// 中心加成减去玩家领先惩罚，再加上同类连击潜力。
pub fn strategic_value(
    layout: &BoardLayout,
    view: &GameStateView,
    first: &Entity,
    second: &Entity,
) -> f64 {
    let midpoint = first.position.midpoint(&second.position);
    layout.centrality_bonus(&midpoint) - ADVANTAGE_PENALTY * view.player_advantage()
        + COMBO_BONUS * view.combo_count(first, second) as f64
}

fn provisional_priority(
    layout: &BoardLayout,
    view: &GameStateView,
    first: &Entity,
    second: &Entity,
    distance: f64,
) -> f64 {
    let mut priority = 0.0;
    if first.is_special || second.is_special {
        priority += SPECIAL_PRIORITY_BONUS;
    }
    if first.is_power_up || second.is_power_up {
        priority += POWER_UP_PRIORITY_BONUS;
    }
    priority += PROXIMITY_PRIORITY_BASE - distance * PROXIMITY_PRIORITY_SCALE;
    priority + strategic_value(layout, view, first, second)
}

/// 枚举所有合法配对，按临时优先级降序排列（稳定排序，平局保持行优先枚举顺序）。
pub fn enumerate_matches<'a>(view: &'a GameStateView, layout: &BoardLayout) -> Vec<MatchPair<'a>> {
    let entities = &view.entities;
    let mut pairs = Vec::new();
    for (i, first) in entities.iter().enumerate() {
        for second in &entities[i + 1..] {
            if !is_valid_match(first, second) {
                continue;
            }
            let distance = first.distance_to(second);
            pairs.push(MatchPair {
                first,
                second,
                distance,
                priority: provisional_priority(layout, view, first, second, distance),
            });
        }
    }
    pairs.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap_or(Ordering::Equal));
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Difficulty;

    fn view_of(entities: Vec<Entity>) -> GameStateView {
        GameStateView::new(entities, Difficulty::Medium)
    }

    #[test]
    fn every_close_same_kind_pair_is_enumerated() {
        let view = view_of(vec![
            Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0)),
            Entity::new(2, "apple", Vec3::new(14.0, 0.0, 0.0)),
            Entity::new(3, "apple", Vec3::new(0.0, 0.0, 5.0)),
        ]);
        let pairs = enumerate_matches(&view, &BoardLayout::default());
        assert_eq!(pairs.len(), 3);
        for (a, b) in [(1, 2), (1, 3), (2, 3)] {
            assert!(
                pairs.iter().any(|pair| pair.to_candidate().covers(a, b)),
                "pair {a}-{b} should be a candidate"
            );
        }
    }

    #[test]
    fn invalid_pairs_are_rejected() {
        let view = view_of(vec![
            Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0)),
            Entity::new(2, "grape", Vec3::new(1.0, 0.0, 0.0)),
            Entity::new(3, "apple", Vec3::new(15.5, 0.0, 0.0)),
            Entity::new(4, "grape", Vec3::new(2.0, 0.0, 0.0)).removed(),
            Entity::new(1, "apple", Vec3::new(0.0, 0.0, 0.0)),
        ]);
        let pairs = enumerate_matches(&view, &BoardLayout::default());
        assert!(pairs.is_empty());
    }

    #[test]
    fn pair_at_exact_threshold_is_valid() {
        let a = Entity::new(1, "peach", Vec3::new(0.0, 0.0, 0.0));
        let b = Entity::new(2, "peach", Vec3::new(0.0, 0.0, MATCH_DISTANCE_THRESHOLD));
        assert!(is_valid_match(&a, &b));
    }

    #[test]
    fn priority_adds_bonuses_and_strategic_value() {
        let view = view_of(vec![
            Entity::new(1, "apple", Vec3::new(-1.0, 0.0, 0.0)).special(),
            Entity::new(2, "apple", Vec3::new(1.0, 0.0, 0.0)).power_up(),
            Entity::new(3, "apple", Vec3::new(8.0, 0.0, 8.0)),
        ])
        .with_connections(1, 4);
        let layout = BoardLayout::default();
        let pairs = enumerate_matches(&view, &layout);
        let pair = pairs
            .iter()
            .find(|pair| pair.to_candidate().covers(1, 2))
            .expect("central pair should be enumerated");
        // 50 + 30 + (100 - 2 * 10) + (10 - 0 - 10 * 0.25 + 5 * 1)
        assert!((pair.priority - 172.5).abs() < 1e-9);
        assert!(pair.has_special());
        assert!(pair.has_power_up());
        assert_eq!(pairs[0].to_candidate(), pair.to_candidate());
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let view = view_of(vec![
            Entity::new(1, "apple", Vec3::new(-4.0, 0.0, 0.0)),
            Entity::new(2, "apple", Vec3::new(-2.0, 0.0, 0.0)),
            Entity::new(3, "grape", Vec3::new(2.0, 0.0, 0.0)),
            Entity::new(4, "grape", Vec3::new(4.0, 0.0, 0.0)),
        ]);
        let pairs = enumerate_matches(&view, &BoardLayout::default());
        assert_eq!(pairs.len(), 2);
        assert!(pairs[0].to_candidate().covers(1, 2));
        assert!(pairs[1].to_candidate().covers(3, 4));
    }
}
