//! Statistics and maintenance channels.

use serde_json::Value;

use super::envelope_value;
use crate::engine::Engine;
use crate::error::EngineResult;

pub fn stats(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.statistics())
}

pub fn health(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.health_check())
}

pub fn vacuum(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.vacuum())
}

pub fn analyze(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.analyze())
}

pub fn schema_version(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.schema_version())
}
