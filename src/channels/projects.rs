//! Project channels.

use serde_json::Value;

use super::{
    envelope_value, get_bool, get_i32, get_nullable_string, get_string, require_string,
};
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::types::{ProjectInput, ProjectPatch};

pub fn create(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let input: ProjectInput = serde_json::from_value(args.clone())
        .map_err(|e| EngineError::validation(e.to_string()))?;
    envelope_value(engine.create_project(input))
}

pub fn get(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.get_project(&id))
}

pub fn list(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let include_archived = get_bool(args, "include_archived").unwrap_or(false);
    envelope_value(engine.list_projects(include_archived))
}

pub fn update(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let patch = ProjectPatch {
        name: get_string(args, "name"),
        description: get_nullable_string(args, "description"),
        color: get_nullable_string(args, "color"),
        icon: get_nullable_string(args, "icon"),
        parent_id: get_nullable_string(args, "parent_id"),
        sort_order: get_i32(args, "sort_order"),
        favorite: get_bool(args, "favorite"),
        archived: get_bool(args, "archived"),
    };
    envelope_value(engine.update_project(&id, &patch))
}

pub fn delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.delete_project(&id))
}

pub fn merge_integration(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let provider = require_string(args, "provider")?;
    let payload = args
        .get("payload")
        .cloned()
        .ok_or_else(|| EngineError::missing_field("payload"))?;
    envelope_value(engine.merge_project_integration(&id, &provider, &payload))
}
