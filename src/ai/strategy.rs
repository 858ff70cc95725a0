use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::config::StrategyKind;
use super::features::FeatureVector;
use crate::game::{Candidate, GameStateView};

const DEFENSIVE_RISK_LIMIT: f64 = 0.3;
const BALANCED_RISK_WEIGHT: f64 = 0.5;
const ADAPTIVE_ADVANTAGE_THRESHOLD: f64 = 0.5;
const ADAPTIVE_TIME_THRESHOLD_SEC: f64 = 20.0;

/// 经过模型打分的候选。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub features: FeatureVector,
    pub predicted_score: f64,
    pub adjusted_score: f64,
}

impl ScoredCandidate {
    pub fn risk(&self) -> f64 {
        self.features.risk()
    }

    pub fn balanced_score(&self) -> f64 {
        self.adjusted_score * (1.0 - self.risk() * BALANCED_RISK_WEIGHT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyContext {
    pub player_advantage: f64,
    pub time_remaining_sec: f64,
}

impl StrategyContext {
    pub fn from_view(view: &GameStateView) -> Self {
        Self {
            player_advantage: view.player_advantage(),
            time_remaining_sec: view.time_remaining_sec,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub index: usize,
    /// 实际生效的策略；`Adaptive` 会解析为具体子策略。
    pub applied: StrategyKind,
}

/// 从按 `adjusted_score` 降序排列的候选中选出一个；列表为空时返回 `None`。
pub fn select_candidate(
    strategy: StrategyKind,
    scored: &[ScoredCandidate],
    context: &StrategyContext,
) -> Option<Selection> {
    if scored.is_empty() {
        return None;
    }
    let index = match strategy {
        StrategyKind::Defensive => defensive(scored),
        StrategyKind::Aggressive => aggressive(scored),
        StrategyKind::Balanced => balanced(scored),
        StrategyKind::Adaptive => {
            return select_candidate(resolve_adaptive(context), scored, context);
        }
    };
    Some(Selection {
        index,
        applied: strategy,
    })
}

pub fn resolve_adaptive(context: &StrategyContext) -> StrategyKind {
    if context.player_advantage > ADAPTIVE_ADVANTAGE_THRESHOLD {
        StrategyKind::Aggressive
    } else if context.time_remaining_sec < ADAPTIVE_TIME_THRESHOLD_SEC {
        StrategyKind::Defensive
    } else {
        StrategyKind::Balanced
    }
}

fn defensive(scored: &[ScoredCandidate]) -> usize {
    scored
        .iter()
        .position(|candidate| candidate.risk() < DEFENSIVE_RISK_LIMIT)
        .unwrap_or(0)
}

fn aggressive(_scored: &[ScoredCandidate]) -> usize {
    0
}

fn balanced(scored: &[ScoredCandidate]) -> usize {
    let mut order: Vec<(usize, f64)> = scored
        .iter()
        .map(ScoredCandidate::balanced_score)
        .enumerate()
        .collect();
    order.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    order[0].0
}
