//! Time tracking and enhancement channels.

use serde_json::Value;

use super::{envelope_value, get_bool, get_i32, get_string, require_string};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::types::{EnhancementInput, EnhancementPatch, TimeEntryInput};

pub fn time_log(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let input: TimeEntryInput = serde_json::from_value(args.clone())
        .map_err(|e| EngineError::validation(e.to_string()))?;
    envelope_value(engine.log_time(input))
}

pub fn time_list(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let task_id = require_string(args, "task_id")?;
    envelope_value(engine.time_entries(&task_id))
}

pub fn time_delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.delete_time_entry(&id))
}

pub fn enhancement_add(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let input: EnhancementInput = serde_json::from_value(args.clone())
        .map_err(|e| EngineError::validation(e.to_string()))?;
    envelope_value(engine.add_enhancement(input))
}

pub fn enhancement_list(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let task_id = require_string(args, "task_id")?;
    envelope_value(engine.enhancements(&task_id))
}

pub fn enhancement_update(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let patch = EnhancementPatch {
        content: get_string(args, "content"),
        sort_order: get_i32(args, "sort_order"),
        completed: get_bool(args, "completed"),
    };
    envelope_value(engine.update_enhancement(&id, &patch))
}

pub fn enhancement_delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.delete_enhancement(&id))
}
