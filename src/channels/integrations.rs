//! Integration provider channels.

use serde_json::Value;

use super::{envelope_value, get_bool, get_string, require_string};
use crate::engine::Engine;
use crate::error::EngineResult;

pub fn upsert(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let provider = require_string(args, "provider")?;
    let is_active = get_bool(args, "is_active").unwrap_or(true);
    let config = args.get("config").filter(|v| !v.is_null());
    envelope_value(engine.upsert_integration(&provider, is_active, config))
}

pub fn get(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let provider = require_string(args, "provider")?;
    envelope_value(engine.get_integration(&provider))
}

pub fn list(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.list_integrations())
}

pub fn record_sync(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let provider = require_string(args, "provider")?;
    let sync_token = get_string(args, "sync_token");
    envelope_value(engine.record_sync(&provider, sync_token.as_deref()))
}
