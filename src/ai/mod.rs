//! 配对决策引擎：候选打分、策略选择与在线学习。

pub mod config;
pub mod engine;
pub mod features;
pub mod history;
pub mod model;
pub mod obstacle;
pub mod strategy;

pub use config::{Difficulty, DifficultyProfile, EngineConfig, EngineError, StrategyKind};
pub use engine::{Decision, MoveDecisionEngine, OutcomeUpdate};
pub use features::{extract_features, pair_features, Feature, FeatureVector, FEATURE_COUNT};
pub use history::{MoveHistory, MoveHistoryEntry, MoveId};
pub use model::{
    default_training_samples, sigmoid, TrainingReport, TrainingSample, WeightVector,
};
pub use strategy::{select_candidate, ScoredCandidate, Selection, StrategyContext};
