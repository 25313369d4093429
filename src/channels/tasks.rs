//! Task channels.

use serde_json::Value;

use super::{
    envelope_value, get_bool, get_i32, get_i64, get_nullable_i32, get_nullable_string, get_string,
    require_string,
};
use crate::db::query::TaskFilter;
use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::types::{TaskInput, TaskPatch, TaskStatus};

pub fn create(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let input: TaskInput = serde_json::from_value(args.clone())
        .map_err(|e| EngineError::validation(e.to_string()))?;
    envelope_value(engine.create_task(input))
}

pub fn get(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.get_task(&id))
}

pub fn list(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let filter = parse_filter(args)?;
    envelope_value(engine.list_tasks(&filter))
}

pub fn update(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let patch = parse_patch(args)?;
    envelope_value(engine.update_task(&id, &patch))
}

pub fn delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    envelope_value(engine.delete_task(&id))
}

pub fn bulk_create(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let raw = args
        .get("tasks")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::missing_field("tasks"))?;
    let inputs = raw
        .iter()
        .map(|item| {
            serde_json::from_value(item.clone()).map_err(|e| EngineError::validation(e.to_string()))
        })
        .collect::<EngineResult<Vec<TaskInput>>>()?;
    envelope_value(engine.bulk_create_tasks(inputs))
}

pub fn bulk_update(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let raw = args
        .get("updates")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::missing_field("updates"))?;
    let updates = raw
        .iter()
        .map(|item| {
            let id = require_string(item, "id")?;
            let patch = parse_patch(item)?;
            Ok((id, patch))
        })
        .collect::<EngineResult<Vec<(String, TaskPatch)>>>()?;
    envelope_value(engine.bulk_update_tasks(updates))
}

pub fn bulk_delete(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let raw = args
        .get("ids")
        .and_then(Value::as_array)
        .ok_or_else(|| EngineError::missing_field("ids"))?;
    let ids = raw
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| EngineError::invalid_value("ids", "must be an array of strings"))
        })
        .collect::<EngineResult<Vec<String>>>()?;
    envelope_value(engine.bulk_delete_tasks(ids))
}

pub fn search(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let query = require_string(args, "query")?;
    envelope_value(engine.search_tasks(&query, get_i64(args, "limit")))
}

pub fn due_today(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.tasks_due_today())
}

pub fn overdue(engine: &Engine) -> EngineResult<Value> {
    envelope_value(engine.tasks_overdue())
}

pub fn upcoming(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let days = get_i64(args, "days").unwrap_or(7);
    envelope_value(engine.tasks_upcoming(days))
}

pub fn by_project(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let project_id = require_string(args, "project_id")?;
    envelope_value(engine.tasks_by_project(&project_id))
}

pub fn by_context(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let context = require_string(args, "context")?;
    envelope_value(engine.tasks_by_context(&context))
}

pub fn completed(engine: &Engine, args: &Value) -> EngineResult<Value> {
    envelope_value(engine.tasks_completed(get_i64(args, "limit")))
}

pub fn merge_integration(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let id = require_string(args, "id")?;
    let provider = require_string(args, "provider")?;
    let payload = args
        .get("payload")
        .cloned()
        .ok_or_else(|| EngineError::missing_field("payload"))?;
    envelope_value(engine.merge_task_integration(&id, &provider, &payload))
}

pub fn with_integration(engine: &Engine, args: &Value) -> EngineResult<Value> {
    let provider = require_string(args, "provider")?;
    envelope_value(engine.tasks_with_integration(&provider))
}

fn parse_filter(args: &Value) -> EngineResult<TaskFilter> {
    let mut filter = TaskFilter {
        project_id: get_string(args, "project_id"),
        parent_id: get_nullable_string(args, "parent_id"),
        due_date_from: get_string(args, "due_date_from"),
        due_date_to: get_string(args, "due_date_to"),
        energy_level: get_i32(args, "energy_level"),
        context: get_string(args, "context"),
        focus_time: get_bool(args, "focus_time"),
        has_integration: get_string(args, "has_integration"),
        search: get_string(args, "search"),
        limit: get_i64(args, "limit"),
        offset: get_i64(args, "offset"),
        ..Default::default()
    };
    if let Some(value) = args.get("status") {
        filter.status = Some(parse_status_filter(value)?);
    }
    Ok(filter)
}

/// Accepts either a single status string or an array of them.
fn parse_status_filter(value: &Value) -> EngineResult<Vec<TaskStatus>> {
    match value {
        Value::String(s) => Ok(vec![parse_status(s)?]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        EngineError::invalid_value("status", "expected a status string")
                    })
                    .and_then(parse_status)
            })
            .collect(),
        _ => Err(EngineError::invalid_value(
            "status",
            "expected a status string or array of them",
        )),
    }
}

fn parse_status(s: &str) -> EngineResult<TaskStatus> {
    TaskStatus::from_str(s)
        .ok_or_else(|| EngineError::invalid_value("status", &format!("unknown status '{s}'")))
}

fn parse_patch(args: &Value) -> EngineResult<TaskPatch> {
    let mut patch = TaskPatch {
        title: get_string(args, "title"),
        description: get_nullable_string(args, "description"),
        project_id: get_nullable_string(args, "project_id"),
        parent_id: get_nullable_string(args, "parent_id"),
        priority: get_i32(args, "priority"),
        due_date: get_nullable_string(args, "due_date"),
        estimated_minutes: get_nullable_i32(args, "estimated_minutes"),
        actual_minutes: get_nullable_i32(args, "actual_minutes"),
        energy_level: get_nullable_i32(args, "energy_level"),
        context: get_string(args, "context"),
        focus_time: get_bool(args, "focus_time"),
        notes: get_nullable_string(args, "notes"),
        ..Default::default()
    };
    if let Some(value) = args.get("status") {
        let s = value
            .as_str()
            .ok_or_else(|| EngineError::invalid_value("status", "expected a status string"))?;
        patch.status = Some(parse_status(s)?);
    }
    Ok(patch)
}
