use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::config::EngineError;
use super::features::{Feature, FeatureVector, FEATURE_COUNT};

const BIAS_KEY: &str = "bias";

pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// 十个具名权重加偏置；字段与 [`Feature`] 通过 `weight`/`weight_mut` 的穷尽匹配对齐。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct WeightVector {
    pub match_similarity: f64,
    pub distance: f64,
    pub special_fruit: f64,
    pub power_up: f64,
    pub centrality: f64,
    pub player_advantage: f64,
    pub risk: f64,
    pub combo_potential: f64,
    pub time_pressure: f64,
    pub strategic_value: f64,
    pub bias: f64,
}

impl WeightVector {
    pub fn zeros() -> Self {
        Self::from_array([0.0; FEATURE_COUNT], 0.0)
    }

    pub fn from_array(values: [f64; FEATURE_COUNT], bias: f64) -> Self {
        let mut weights = Self {
            match_similarity: 0.0,
            distance: 0.0,
            special_fruit: 0.0,
            power_up: 0.0,
            centrality: 0.0,
            player_advantage: 0.0,
            risk: 0.0,
            combo_potential: 0.0,
            time_pressure: 0.0,
            strategic_value: 0.0,
            bias,
        };
        for feature in Feature::ALL {
            *weights.weight_mut(feature) = values[feature.index()];
        }
        weights
    }

    /// 由名称到数值的映射构造，必须恰好包含十个已知名称。
    pub fn from_named(named: &HashMap<String, f64>, bias: f64) -> Result<Self, EngineError> {
        if named.len() != FEATURE_COUNT {
            return Err(EngineError::MalformedWeights {
                expected: FEATURE_COUNT,
                found: named.len(),
            });
        }
        let mut weights = Self::zeros();
        weights.bias = bias;
        for (name, value) in named {
            let feature = Feature::from_name(name)
                .ok_or_else(|| EngineError::UnknownWeight { name: name.clone() })?;
            *weights.weight_mut(feature) = *value;
        }
        Ok(weights)
    }

    /// 解析 `{ "<feature>": f64, ..., "bias"?: f64 }` 形式的 JSON。
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let mut named: HashMap<String, f64> = serde_json::from_str(json)?;
        let bias = named.remove(BIAS_KEY).unwrap_or(0.0);
        Self::from_named(&named, bias)
    }

    pub fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::MatchSimilarity => self.match_similarity,
            Feature::Distance => self.distance,
            Feature::SpecialFruit => self.special_fruit,
            Feature::PowerUp => self.power_up,
            Feature::Centrality => self.centrality,
            Feature::PlayerAdvantage => self.player_advantage,
            Feature::Risk => self.risk,
            Feature::ComboPotential => self.combo_potential,
            Feature::TimePressure => self.time_pressure,
            Feature::StrategicValue => self.strategic_value,
        }
    }

    fn weight_mut(&mut self, feature: Feature) -> &mut f64 {
        match feature {
            Feature::MatchSimilarity => &mut self.match_similarity,
            Feature::Distance => &mut self.distance,
            Feature::SpecialFruit => &mut self.special_fruit,
            Feature::PowerUp => &mut self.power_up,
            Feature::Centrality => &mut self.centrality,
            Feature::PlayerAdvantage => &mut self.player_advantage,
            Feature::Risk => &mut self.risk,
            Feature::ComboPotential => &mut self.combo_potential,
            Feature::TimePressure => &mut self.time_pressure,
            Feature::StrategicValue => &mut self.strategic_value,
        }
    }

    /// 缺失的维度不参与计算，多余的维度被忽略。
    pub fn linear(&self, features: &[f64]) -> f64 {
        Feature::ALL
            .iter()
            .zip(features)
            .fold(self.bias, |acc, (feature, value)| {
                acc + self.weight(*feature) * value
            })
    }

    pub fn predict(&self, features: &[f64]) -> f64 {
        sigmoid(self.linear(features))
    }

    /// 单步梯度更新：`w_i += step * x_i`，`bias += step`。
    pub fn apply_gradient(&mut self, features: &[f64], step: f64) {
        for (feature, value) in Feature::ALL.iter().zip(features) {
            *self.weight_mut(*feature) += step * value;
        }
        self.bias += step;
    }

    /// 批量梯度下降，固定执行 `epochs` 轮，不做收敛判断。
    pub fn train_batch(
        &mut self,
        samples: &[TrainingSample],
        epochs: usize,
        learning_rate: f64,
    ) -> TrainingReport {
        if samples.is_empty() {
            return TrainingReport {
                epochs: 0,
                samples: 0,
                mean_squared_error: 0.0,
            };
        }

        let count = samples.len() as f64;
        for _ in 0..epochs {
            let mut gradient = [0.0; FEATURE_COUNT];
            let mut bias_gradient = 0.0;
            for sample in samples {
                let error = sample.target() - self.predict(&sample.features);
                for (slot, value) in gradient.iter_mut().zip(&sample.features) {
                    *slot += error * value;
                }
                bias_gradient += error;
            }
            for feature in Feature::ALL {
                *self.weight_mut(feature) += learning_rate * gradient[feature.index()] / count;
            }
            self.bias += learning_rate * bias_gradient / count;
        }

        TrainingReport {
            epochs,
            samples: samples.len(),
            mean_squared_error: self.mean_squared_error(samples),
        }
    }

    pub fn mean_squared_error(&self, samples: &[TrainingSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples
            .iter()
            .map(|sample| {
                let error = sample.target() - self.predict(&sample.features);
                error * error
            })
            .sum::<f64>()
            / samples.len() as f64
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        Self::from_array(
            [0.5, -0.3, 0.8, 0.6, 0.2, -0.2, -0.5, 0.3, 0.1, 0.4],
            0.0,
        )
    }
}

/// 训练样本；特征长度可以不足十个。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingSample {
    pub features: Vec<f64>,
    pub outcome: bool,
}

impl TrainingSample {
    pub fn new(features: impl Into<Vec<f64>>, outcome: bool) -> Self {
        Self {
            features: features.into(),
            outcome,
        }
    }

    pub fn from_vector(features: &FeatureVector, outcome: bool) -> Self {
        Self::new(features.as_slice(), outcome)
    }

    fn target(&self) -> f64 {
        if self.outcome {
            1.0
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrainingReport {
    pub epochs: usize,
    pub samples: usize,
    pub mean_squared_error: f64,
}

static DEFAULT_TRAINING_SAMPLES: Lazy<Vec<TrainingSample>> = Lazy::new(|| {
    vec![
        // 近距离、居中的特殊水果
        TrainingSample::new([1.0, 0.05, 1.0, 0.0, 0.9, 0.2, 0.1, 0.3, 0.2, 0.6], true),
        TrainingSample::new([1.0, 0.1, 0.0, 0.0, 0.8, 0.3, 0.2, 0.2, 0.3, 0.4], true),
        TrainingSample::new([1.0, 0.3, 0.0, 1.0, 0.6, 0.4, 0.3, 0.1, 0.5, 0.5], true),
        // 远距离、靠边的高风险配对
        TrainingSample::new([1.0, 0.7, 0.0, 0.0, 0.1, 0.6, 0.9, 0.0, 0.4, -0.1], false),
        TrainingSample::new([1.0, 0.6, 0.0, 0.0, 0.2, 0.8, 0.8, 0.0, 0.9, -0.2], false),
        TrainingSample::new([1.0, 0.4, 0.0, 0.0, 0.3, 0.5, 0.7, 0.1, 0.6, 0.1], false),
    ]
});

/// 新引擎预热用的六个固定样本。
pub fn default_training_samples() -> &'static [TrainingSample] {
    &DEFAULT_TRAINING_SAMPLES
}
