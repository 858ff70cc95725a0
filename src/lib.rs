pub mod ai;
pub mod game;
mod utils;

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    default_training_samples, pair_features, sigmoid, Decision, Difficulty, DifficultyProfile,
    EngineConfig, EngineError, Feature, FeatureVector, MoveDecisionEngine, MoveHistoryEntry,
    MoveId, OutcomeUpdate, StrategyKind, TrainingReport, TrainingSample, WeightVector,
    FEATURE_COUNT,
};
pub use game::{BoardGenerator, BoardLayout, Candidate, Entity, EntityId, GameStateView, Vec3};

use utils::console_log;

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error(error: EngineError) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn parse_view(view_json: &str) -> Result<GameStateView, JsValue> {
    serde_json::from_str(view_json).map_err(serde_to_js_error)
}

/// 面向前端的 AI 对手句柄。
#[wasm_bindgen]
pub struct MatchAi {
    engine: Rc<RefCell<MoveDecisionEngine>>,
}

#[wasm_bindgen]
impl MatchAi {
    #[wasm_bindgen(constructor)]
    pub fn new(weights_json: Option<String>, difficulty: Option<String>) -> Result<MatchAi, JsValue> {
        let difficulty = difficulty
            .as_deref()
            .and_then(|value| Difficulty::from_str(value).ok())
            .unwrap_or_default();
        let weights = match weights_json {
            Some(json) => WeightVector::from_json(&json).map_err(to_js_error)?,
            None => WeightVector::default(),
        };
        console_log!("match ai ready at {difficulty:?}");
        Ok(MatchAi {
            engine: Rc::new(RefCell::new(MoveDecisionEngine::new(weights, difficulty))),
        })
    }

    pub fn decide_json(&self, view_json: &str) -> Result<String, JsValue> {
        let view = parse_view(view_json)?;
        let decision = self.engine.borrow_mut().decide_detailed(&view);
        to_json(&decision)
    }

    pub fn decide(&self, view: JsValue) -> Result<JsValue, JsValue> {
        let view: GameStateView = from_value(view).map_err(JsValue::from)?;
        let decision = self.engine.borrow_mut().decide_detailed(&view);
        to_value(&decision).map_err(JsValue::from)
    }

    /// 按快照难度的思考延迟等待后再决策，返回决策 JSON 的 Promise。
    pub fn think(&self, view_json: String) -> Promise {
        let engine = Rc::clone(&self.engine);

        future_to_promise(async move {
            let view = parse_view(&view_json)?;
            let delay = engine.borrow().profile_for(&view).thinking_delay_ms;
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = engine.borrow_mut().decide_detailed(&view);
            Ok(JsValue::from_str(&to_json(&decision)?))
        })
    }

    pub fn record_outcome(&self, move_id: u64, outcome: bool) -> bool {
        self.engine
            .borrow_mut()
            .record_outcome(move_id, outcome)
            .is_some()
    }

    pub fn pretrain_default(&self) -> Result<String, JsValue> {
        let report = self.engine.borrow_mut().pretrain_default();
        to_json(&report)
    }

    pub fn pretrain_json(&self, samples_json: &str) -> Result<String, JsValue> {
        let samples: Vec<TrainingSample> =
            serde_json::from_str(samples_json).map_err(serde_to_js_error)?;
        let report = self.engine.borrow_mut().pretrain(&samples);
        to_json(&report)
    }

    pub fn set_difficulty(&self, name: &str) -> bool {
        self.engine.borrow_mut().set_difficulty_name(name)
    }

    pub fn set_strategy(&self, name: &str) -> bool {
        match StrategyKind::from_str(name) {
            Ok(strategy) => {
                self.engine.borrow_mut().set_strategy(strategy);
                true
            }
            Err(()) => false,
        }
    }

    pub fn thinking_delay_ms(&self) -> u32 {
        self.engine.borrow().profile().thinking_delay_ms
    }

    pub fn weights_json(&self) -> Result<String, JsValue> {
        to_json(self.engine.borrow().weights())
    }

    pub fn history_json(&self) -> Result<String, JsValue> {
        let engine = self.engine.borrow();
        let entries: Vec<&MoveHistoryEntry> = engine.history().iter().collect();
        to_json(&entries)
    }

    pub fn history_len(&self) -> usize {
        self.engine.borrow().history().len()
    }

    /// 已回填结果中的预测命中率；尚无结果时返回 `undefined`。
    pub fn prediction_accuracy(&self) -> Option<f64> {
        self.engine.borrow().history().accuracy()
    }
}

/// 返回一个随机摆放的示例快照，方便前端调试。
#[wasm_bindgen(js_name = "createSampleView")]
pub fn create_sample_view(seed: Option<u64>) -> Result<JsValue, JsValue> {
    let view = GameStateView::sample(seed.unwrap_or(0));
    to_value(&view).map_err(JsValue::from)
}

/// 计算快照中两个实体组成配对时的特征向量（默认棋盘布局）。
#[wasm_bindgen(js_name = "extractFeatures")]
pub fn extract_features_js(
    view: JsValue,
    entity_a: EntityId,
    entity_b: EntityId,
) -> Result<JsValue, JsValue> {
    let view: GameStateView = from_value(view).map_err(JsValue::from)?;
    let features = pair_features(&BoardLayout::default(), &view, entity_a, entity_b)
        .ok_or_else(|| JsValue::from_str("entities do not form a valid match"))?;
    to_value(&features).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "defaultWeights")]
pub fn default_weights() -> Result<JsValue, JsValue> {
    to_value(&WeightVector::default()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "sigmoid")]
pub fn sigmoid_js(x: f64) -> f64 {
    sigmoid(x)
}
