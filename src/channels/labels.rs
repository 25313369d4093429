//! Label channels.

use serde_json::Value;

use super::{envelope_value, get_i32, get_nullable_string, get_string, require_string};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::types::{LabelInput, LabelPatch};

pub fn create(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let input: LabelInput = serde_json::from_value(args.clone())
        .map_err(|e| EngineError::validation(e.to_string()))?;
    envelope_value(engine.create_label(input))
}

pub fn list(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.list_labels())
}

pub fn update(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let patch = LabelPatch {
        name: get_string(args, "name"),
        color: get_nullable_string(args, "color"),
        description: get_nullable_string(args, "description"),
        sort_order: get_i32(args, "sort_order"),
    };
    envelope_value(engine.update_label(&id, &patch))
}

pub fn delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.delete_label(&id))
}

pub fn assign(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let task_id = require_string(args, "task_id")?;
    let label_id = require_string(args, "label_id")?;
    envelope_value(engine.assign_label(&task_id, &label_id))
}

pub fn remove(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let task_id = require_string(args, "task_id")?;
    let label_id = require_string(args, "label_id")?;
    envelope_value(engine.remove_label(&task_id, &label_id))
}

pub fn for_task(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let task_id = require_string(args, "task_id")?;
    envelope_value(engine.labels_for_task(&task_id))
}
