//! 候选配对的特征提取。
//!
//! 特征顺序固定，与 [`WeightVector`](super::model::WeightVector) 的字段一一对应；
//! 归一化除数是常量，修改它们会使已训练的权重失效。

use serde::{Deserialize, Serialize};

use crate::game::moves::strategic_value;
use crate::game::{enumerate_matches, BoardLayout, EntityId, GameStateView, MatchPair, Vec3};

pub const FEATURE_COUNT: usize = 10;

const DISTANCE_NORMALIZER: f64 = 20.0;
const CENTRALITY_NORMALIZER: f64 = 15.0;
const COMBO_NORMALIZER: f64 = 10.0;
const TIME_PRESSURE_WINDOW_SEC: f64 = 60.0;
const STRATEGIC_NORMALIZER: f64 = 50.0;

const POSITION_RISK_NORMALIZER: f64 = 15.0;
const MOVES_CONSUMED_PER_TURN: usize = 3;
const REMAINING_MOVES_NORMALIZER: f64 = 10.0;
const SCARCITY_RISK_WEIGHT: f64 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    MatchSimilarity,
    Distance,
    SpecialFruit,
    PowerUp,
    Centrality,
    PlayerAdvantage,
    Risk,
    ComboPotential,
    TimePressure,
    StrategicValue,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::MatchSimilarity,
        Feature::Distance,
        Feature::SpecialFruit,
        Feature::PowerUp,
        Feature::Centrality,
        Feature::PlayerAdvantage,
        Feature::Risk,
        Feature::ComboPotential,
        Feature::TimePressure,
        Feature::StrategicValue,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Feature::MatchSimilarity => "match_similarity",
            Feature::Distance => "distance",
            Feature::SpecialFruit => "special_fruit",
            Feature::PowerUp => "power_up",
            Feature::Centrality => "centrality",
            Feature::PlayerAdvantage => "player_advantage",
            Feature::Risk => "risk",
            Feature::ComboPotential => "combo_potential",
            Feature::TimePressure => "time_pressure",
            Feature::StrategicValue => "strategic_value",
        }
    }

    pub fn from_name(name: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|feature| feature.name() == name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub const fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0[feature.index()] = value;
    }

    pub fn risk(&self) -> f64 {
        self.get(Feature::Risk)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }
}

pub fn position_risk(layout: &BoardLayout, position: &Vec3) -> f64 {
    layout.center_distance(position) / POSITION_RISK_NORMALIZER
}

/// 粗略估计：假设本步之后会消耗掉三个可行步，并非真正的前瞻模拟。
pub fn estimate_remaining_moves_after(current_move_count: usize) -> usize {
    current_move_count.saturating_sub(MOVES_CONSUMED_PER_TURN)
}

pub fn risk_factor(layout: &BoardLayout, pair: &MatchPair<'_>, current_move_count: usize) -> f64 {
    let remaining = estimate_remaining_moves_after(current_move_count) as f64;
    let scarcity = (1.0 - remaining / REMAINING_MOVES_NORMALIZER) * SCARCITY_RISK_WEIGHT;
    (position_risk(layout, &pair.first.position)
        + position_risk(layout, &pair.second.position)
        + scarcity)
        .min(1.0)
}

/// `current_move_count` 是本轮枚举出的合法配对总数。
pub fn extract_features(
    layout: &BoardLayout,
    view: &GameStateView,
    pair: &MatchPair<'_>,
    current_move_count: usize,
) -> FeatureVector {
    let mut features = FeatureVector::default();

    let similarity = if pair.first.kind == pair.second.kind {
        1.0
    } else {
        0.0
    };
    features.set(Feature::MatchSimilarity, similarity);
    features.set(Feature::Distance, pair.distance / DISTANCE_NORMALIZER);
    features.set(Feature::SpecialFruit, flag(pair.has_special()));
    features.set(Feature::PowerUp, flag(pair.has_power_up()));

    let center_distance = layout.center_distance(&pair.midpoint());
    features.set(
        Feature::Centrality,
        1.0 - center_distance / CENTRALITY_NORMALIZER,
    );
    features.set(Feature::PlayerAdvantage, view.player_advantage());
    features.set(Feature::Risk, risk_factor(layout, pair, current_move_count));

    let combo = view.combo_count(pair.first, pair.second) as f64;
    features.set(Feature::ComboPotential, combo / COMBO_NORMALIZER);
    features.set(
        Feature::TimePressure,
        1.0 - view.time_remaining_sec / TIME_PRESSURE_WINDOW_SEC,
    );
    features.set(
        Feature::StrategicValue,
        strategic_value(layout, view, pair.first, pair.second) / STRATEGIC_NORMALIZER,
    );

    features
}

/// 按实体 id 查找一对合法配对并提取其特征；配对不合法时返回 `None`。
pub fn pair_features(
    layout: &BoardLayout,
    view: &GameStateView,
    first: EntityId,
    second: EntityId,
) -> Option<FeatureVector> {
    let pairs = enumerate_matches(view, layout);
    let pair = pairs
        .iter()
        .find(|pair| pair.to_candidate().covers(first, second))?;
    Some(extract_features(layout, view, pair, pairs.len()))
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}
