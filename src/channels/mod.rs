//! Named-channel dispatch over the engine.
//!
//! The desktop shell talks to the store over named request/response
//! channels; each request carries a JSON argument object and gets a
//! JSON envelope back. This module owns the channel-name routing and
//! the argument helpers the per-domain modules share. Argument errors
//! and unknown channel names produce the same envelope shape as any
//! other failure.

pub mod integrations;
pub mod labels;
pub mod projects;
pub mod system;
pub mod tasks;
pub mod tracking;

use serde_json::{json, Value};
use tracing::debug;

use crate::engine::{Engine, Envelope};
use crate::error::{EngineError, EngineResult};

/// Routes channel requests to engine operations.
pub struct ChannelHandler {
    engine: Engine,
}

impl ChannelHandler {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Handle one request. The reply is always an envelope.
    pub fn handle(&self, channel: &str, args: &Value) -> Value {
        debug!(channel, "handling channel request");
        let result = match channel {
            "tasks:create" => tasks::create(&self.engine, args),
            "tasks:get" => tasks::get(&self.engine, args),
            "tasks:list" => tasks::list(&self.engine, args),
            "tasks:update" => tasks::update(&self.engine, args),
            "tasks:delete" => tasks::delete(&self.engine, args),
            "tasks:bulk-create" => tasks::bulk_create(&self.engine, args),
            "tasks:bulk-update" => tasks::bulk_update(&self.engine, args),
            "tasks:bulk-delete" => tasks::bulk_delete(&self.engine, args),
            "tasks:search" => tasks::search(&self.engine, args),
            "tasks:due-today" => tasks::due_today(&self.engine),
            "tasks:overdue" => tasks::overdue(&self.engine),
            "tasks:upcoming" => tasks::upcoming(&self.engine, args),
            "tasks:by-project" => tasks::by_project(&self.engine, args),
            "tasks:by-context" => tasks::by_context(&self.engine, args),
            "tasks:completed" => tasks::completed(&self.engine, args),
            "tasks:merge-integration" => tasks::merge_integration(&self.engine, args),
            "tasks:with-integration" => tasks::with_integration(&self.engine, args),

            "projects:create" => projects::create(&self.engine, args),
            "projects:get" => projects::get(&self.engine, args),
            "projects:list" => projects::list(&self.engine, args),
            "projects:update" => projects::update(&self.engine, args),
            "projects:delete" => projects::delete(&self.engine, args),
            "projects:merge-integration" => projects::merge_integration(&self.engine, args),

            "labels:create" => labels::create(&self.engine, args),
            "labels:list" => labels::list(&self.engine),
            "labels:update" => labels::update(&self.engine, args),
            "labels:delete" => labels::delete(&self.engine, args),
            "labels:assign" => labels::assign(&self.engine, args),
            "labels:remove" => labels::remove(&self.engine, args),
            "labels:for-task" => labels::for_task(&self.engine, args),

            "time:log" => tracking::time_log(&self.engine, args),
            "time:list" => tracking::time_list(&self.engine, args),
            "time:delete" => tracking::time_delete(&self.engine, args),

            "enhancements:add" => tracking::enhancement_add(&self.engine, args),
            "enhancements:list" => tracking::enhancement_list(&self.engine, args),
            "enhancements:update" => tracking::enhancement_update(&self.engine, args),
            "enhancements:delete" => tracking::enhancement_delete(&self.engine, args),

            "integrations:upsert" => integrations::upsert(&self.engine, args),
            "integrations:get" => integrations::get(&self.engine, args),
            "integrations:list" => integrations::list(&self.engine),
            "integrations:record-sync" => integrations::record_sync(&self.engine, args),

            "stats:summary" => system::stats(&self.engine),
            "system:health" => system::health(&self.engine),
            "system:vacuum" => system::vacuum(&self.engine),
            "system:analyze" => system::analyze(&self.engine),
            "system:schema-version" => system::schema_version(&self.engine),

            _ => Err(EngineError::validation(format!(
                "unknown channel '{channel}'"
            ))),
        };

        match result {
            Ok(value) => value,
            Err(e) => json!({ "success": false, "error": e.to_string() }),
        }
    }
}

/// Serialize an envelope into the wire value.
pub(crate) fn envelope_value<T: serde::Serialize>(envelope: Envelope<T>) -> EngineResult<Value> {
    Ok(serde_json::to_value(envelope)?)
}

pub(crate) fn get_string(args: &Value, key: &str) -> Option<String> {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub(crate) fn require_string(args: &Value, key: &str) -> EngineResult<String> {
    get_string(args, key).ok_or_else(|| EngineError::missing_field(key))
}

pub(crate) fn get_i64(args: &Value, key: &str) -> Option<i64> {
    args.get(key).and_then(|v| v.as_i64())
}

pub(crate) fn get_i32(args: &Value, key: &str) -> Option<i32> {
    get_i64(args, key).map(|v| v as i32)
}

pub(crate) fn get_bool(args: &Value, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}

/// Tri-state extraction for patch fields: absent key leaves the field
/// alone, an explicit null clears it, a value sets it.
pub(crate) fn get_nullable_string(args: &Value, key: &str) -> Option<Option<String>> {
    match args.get(key) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(v) => v.as_str().map(|s| Some(s.to_string())),
    }
}

pub(crate) fn get_nullable_i32(args: &Value, key: &str) -> Option<Option<i32>> {
    match args.get(key) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(v) => v.as_i64().map(|n| Some(n as i32)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn setup_handler() -> ChannelHandler {
        let engine = Engine::in_memory().expect("Failed to create in-memory engine");
        ChannelHandler::new(engine)
    }

    #[test]
    fn test_unknown_channel_is_an_error_envelope() {
        let handler = setup_handler();
        let reply = handler.handle("tasks:frobnicate", &json!({}));
        assert_eq!(reply["success"], false);
        assert!(reply["error"]
            .as_str()
            .unwrap()
            .contains("unknown channel"));
    }

    #[test]
    fn test_round_trip_through_a_channel() {
        let handler = setup_handler();
        let reply = handler.handle("tasks:create", &json!({"title": "From the wire"}));
        assert_eq!(reply["success"], true);
        let id = reply["data"]["id"].as_str().unwrap().to_string();

        let reply = handler.handle("tasks:get", &json!({"id": id}));
        assert_eq!(reply["success"], true);
        assert_eq!(reply["data"]["title"], "From the wire");
    }

    #[test]
    fn test_missing_argument_is_an_error_envelope() {
        let handler = setup_handler();
        let reply = handler.handle("tasks:get", &json!({}));
        assert_eq!(reply["success"], false);
        assert!(reply["error"].as_str().unwrap().contains("id is required"));
    }

    #[test]
    fn test_nullable_extraction_distinguishes_absent_from_null() {
        let args = json!({"description": null, "context": "home"});
        assert_eq!(get_nullable_string(&args, "description"), Some(None));
        assert_eq!(get_nullable_string(&args, "title"), None);
        assert_eq!(
            get_nullable_string(&args, "context"),
            Some(Some("home".to_string()))
        );
    }
}
