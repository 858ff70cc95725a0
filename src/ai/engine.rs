use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::config::{Difficulty, DifficultyProfile, EngineConfig, EngineError, StrategyKind};
use super::features::{extract_features, FeatureVector};
use super::history::{MoveHistory, MoveHistoryEntry, MoveId};
use super::model::{default_training_samples, TrainingReport, TrainingSample, WeightVector};
use super::obstacle::place_obstacle;
use super::strategy::{select_candidate, ScoredCandidate, StrategyContext};
use crate::game::{enumerate_matches, Candidate, GameStateView};
use crate::utils::console_log;

/// 一次决策的完整结果。障碍物分支没有模型得分与历史记录。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Decision {
    pub candidate: Candidate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub move_id: Option<MoveId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<FeatureVector>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicted_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjusted_score: Option<f64>,
    pub strategy: StrategyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_strategy: Option<StrategyKind>,
    pub candidates_considered: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct OutcomeUpdate {
    pub move_id: MoveId,
    pub error: f64,
}

/// 配对决策引擎。每局游戏创建一个实例，权重与历史在整局内持续更新。
///
/// 非线程安全：`decide` 与 `record_outcome` 原地修改权重和历史，调用方需串行调用。
#[derive(Debug, Clone)]
pub struct MoveDecisionEngine {
    weights: WeightVector,
    difficulty: Difficulty,
    profile: DifficultyProfile,
    config: EngineConfig,
    history: MoveHistory,
}

impl MoveDecisionEngine {
    pub fn new(weights: WeightVector, difficulty: Difficulty) -> Self {
        Self::with_config(weights, difficulty, EngineConfig::default())
    }

    pub fn with_config(weights: WeightVector, difficulty: Difficulty, config: EngineConfig) -> Self {
        let history = MoveHistory::with_capacity(config.history_capacity);
        Self {
            weights,
            difficulty,
            profile: DifficultyProfile::from_difficulty(difficulty),
            config,
            history,
        }
    }

    pub fn from_named_weights(
        named: &HashMap<String, f64>,
        bias: f64,
        difficulty: Difficulty,
    ) -> Result<Self, EngineError> {
        Ok(Self::new(WeightVector::from_named(named, bias)?, difficulty))
    }

    pub fn weights(&self) -> &WeightVector {
        &self.weights
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    /// 切换难度会重置为该难度的默认配置（包括策略）。
    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.profile = DifficultyProfile::from_difficulty(difficulty);
    }

    /// 未知名称被忽略，返回 `false`。
    pub fn set_difficulty_name(&mut self, name: &str) -> bool {
        match Difficulty::from_str(name) {
            Ok(difficulty) => {
                self.set_difficulty(difficulty);
                true
            }
            Err(()) => false,
        }
    }

    pub fn set_strategy(&mut self, strategy: StrategyKind) {
        self.profile = self.profile.with_strategy(strategy);
    }

    pub fn set_profile(&mut self, profile: DifficultyProfile) -> Result<(), EngineError> {
        profile.validate()?;
        self.profile = profile;
        Ok(())
    }

    pub fn pretrain(&mut self, samples: &[TrainingSample]) -> TrainingReport {
        self.pretrain_epochs(samples, self.config.pretrain_epochs)
    }

    pub fn pretrain_epochs(&mut self, samples: &[TrainingSample], epochs: usize) -> TrainingReport {
        let report = self
            .weights
            .train_batch(samples, epochs, self.config.learning_rate);
        console_log!(
            "pretrained on {} samples for {} epochs, mse {:.4}",
            report.samples,
            report.epochs,
            report.mean_squared_error
        );
        report
    }

    pub fn pretrain_default(&mut self) -> TrainingReport {
        self.pretrain(default_training_samples())
    }

    /// 按临时优先级排序的全部配对候选，不打分、不记录历史。
    pub fn candidates(&self, view: &GameStateView) -> Vec<Candidate> {
        enumerate_matches(view, &self.config.board)
            .iter()
            .map(|pair| pair.to_candidate())
            .collect()
    }

    /// 本轮使用的配置：快照难度与引擎一致时沿用引擎配置（含覆盖项），
    /// 否则取该难度的默认配置。不修改引擎。
    pub fn profile_for(&self, view: &GameStateView) -> DifficultyProfile {
        if view.difficulty == self.difficulty {
            self.profile
        } else {
            DifficultyProfile::from_difficulty(view.difficulty)
        }
    }

    /// 对候选逐一打分并按 `adjusted_score` 降序排列。
    pub fn score_candidates(&self, view: &GameStateView) -> Vec<ScoredCandidate> {
        self.score_with(view, &self.profile_for(view))
    }

    fn score_with(
        &self,
        view: &GameStateView,
        profile: &DifficultyProfile,
    ) -> Vec<ScoredCandidate> {
        let layout = &self.config.board;
        let pairs = enumerate_matches(view, layout);
        let move_count = pairs.len();
        let accuracy = profile.accuracy_factor;

        let mut scored: Vec<ScoredCandidate> = pairs
            .iter()
            .map(|pair| {
                let features = extract_features(layout, view, pair, move_count);
                let predicted_score = self.weights.predict(features.as_slice());
                ScoredCandidate {
                    candidate: pair.to_candidate(),
                    features,
                    predicted_score,
                    adjusted_score: predicted_score * accuracy,
                }
            })
            .collect();
        scored.sort_by(|a, b| {
            b.adjusted_score
                .partial_cmp(&a.adjusted_score)
                .unwrap_or(Ordering::Equal)
        });
        scored
    }

    pub fn decide(&mut self, view: &GameStateView) -> Candidate {
        self.decide_detailed(view).candidate
    }

    pub fn decide_detailed(&mut self, view: &GameStateView) -> Decision {
        let profile = self.profile_for(view);
        let strategy = profile.strategy;
        let mut scored = self.score_with(view, &profile);
        let context = StrategyContext::from_view(view);
        let Some(selection) = select_candidate(strategy, &scored, &context) else {
            console_log!("no matching pair on the board, placing an obstacle");
            return Decision {
                candidate: place_obstacle(&self.config.board, view),
                move_id: None,
                features: None,
                predicted_score: None,
                adjusted_score: None,
                strategy,
                applied_strategy: None,
                candidates_considered: 0,
            };
        };

        let candidates_considered = scored.len();
        let chosen = scored.swap_remove(selection.index);
        let move_id = self.history.push(MoveHistoryEntry {
            move_id: self.history.next_id(),
            candidate: chosen.candidate.clone(),
            features: chosen.features,
            predicted_score: chosen.predicted_score,
            adjusted_score: chosen.adjusted_score,
            actual_outcome: None,
            difficulty: view.difficulty,
            timestamp_ms: view.timestamp_ms,
        });

        Decision {
            candidate: chosen.candidate,
            move_id: Some(move_id),
            features: Some(chosen.features),
            predicted_score: Some(chosen.predicted_score),
            adjusted_score: Some(chosen.adjusted_score),
            strategy,
            applied_strategy: Some(selection.applied),
            candidates_considered,
        }
    }

    /// 回填结果并做一步在线梯度下降；找不到记录时不做任何修改。
    pub fn record_outcome(&mut self, move_id: MoveId, outcome: bool) -> Option<OutcomeUpdate> {
        let entry = self.history.get_mut(move_id)?;
        entry.actual_outcome = Some(outcome);
        let target = if outcome { 1.0 } else { 0.0 };
        let error = target - entry.predicted_score;
        self.weights
            .apply_gradient(entry.features.as_slice(), self.config.learning_rate * error);
        console_log!("move {move_id} outcome {outcome}, error {error:.4}");
        Some(OutcomeUpdate { move_id, error })
    }

    pub fn record_latest_outcome(&mut self, outcome: bool) -> Option<OutcomeUpdate> {
        let move_id = self.history.latest()?.move_id;
        self.record_outcome(move_id, outcome)
    }
}
