use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::game::BoardLayout;

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_PRETRAIN_EPOCHS: usize = 100;
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Defensive,
    Aggressive,
    Balanced,
    Adaptive,
}

impl FromStr for StrategyKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "defensive" | "safe" => Ok(StrategyKind::Defensive),
            "aggressive" | "aggro" => Ok(StrategyKind::Aggressive),
            "balanced" => Ok(StrategyKind::Balanced),
            "adaptive" => Ok(StrategyKind::Adaptive),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Expert,
}

impl FromStr for Difficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            "expert" | "extreme" => Ok(Difficulty::Expert),
            _ => Err(()),
        }
    }
}

/// 难度对应的思考延迟、准确度系数与策略。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DifficultyProfile {
    pub thinking_delay_ms: u32,
    pub accuracy_factor: f64,
    pub strategy: StrategyKind,
}

impl DifficultyProfile {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                thinking_delay_ms: 1500,
                accuracy_factor: 0.6,
                strategy: StrategyKind::Defensive,
            },
            Difficulty::Medium => Self {
                thinking_delay_ms: 1000,
                accuracy_factor: 0.8,
                strategy: StrategyKind::Balanced,
            },
            Difficulty::Hard => Self {
                thinking_delay_ms: 700,
                accuracy_factor: 0.9,
                strategy: StrategyKind::Aggressive,
            },
            Difficulty::Expert => Self {
                thinking_delay_ms: 400,
                accuracy_factor: 1.0,
                strategy: StrategyKind::Adaptive,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: StrategyKind) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.accuracy_factor > 0.0 && self.accuracy_factor <= 1.0 {
            Ok(())
        } else {
            Err(EngineError::InvalidAccuracy {
                value: self.accuracy_factor,
            })
        }
    }
}

impl Default for DifficultyProfile {
    fn default() -> Self {
        DifficultyProfile::from_difficulty(Difficulty::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    pub learning_rate: f64,
    pub pretrain_epochs: usize,
    pub history_capacity: usize,
    #[serde(default)]
    pub board: BoardLayout,
}

impl EngineConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity.max(1);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            pretrain_epochs: DEFAULT_PRETRAIN_EPOCHS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            board: BoardLayout::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum EngineError {
    MalformedWeights { expected: usize, found: usize },
    UnknownWeight { name: String },
    InvalidAccuracy { value: f64 },
    Serialization { message: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::MalformedWeights { expected, found } => {
                write!(f, "expected {expected} named weights, found {found}")
            }
            EngineError::UnknownWeight { name } => write!(f, "unknown weight `{name}`"),
            EngineError::InvalidAccuracy { value } => {
                write!(f, "accuracy factor {value} is outside (0, 1]")
            }
            EngineError::Serialization { message } => write!(f, "serialization failed: {message}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<serde_json::Error> for EngineError {
    fn from(error: serde_json::Error) -> Self {
        EngineError::Serialization {
            message: error.to_string(),
        }
    }
}
