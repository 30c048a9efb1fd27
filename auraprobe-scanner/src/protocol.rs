//! Aura action envelopes and the response model.
//!
//! Every request carries exactly one action with the fixed id `pwn`, so a
//! response is read as exactly one action result.

use serde::{Deserialize, Deserializer};
use serde_json::{Value, json};

pub const ACTION_ID: &str = "pwn";

pub const CONFIG_DATA_DESCRIPTOR: &str = "serviceComponent://ui.force.components.controllers.hostConfig.HostConfigController/ACTION$getConfigData";
pub const GET_ITEMS_DESCRIPTOR: &str = "serviceComponent://ui.force.components.controllers.lists.selectableListDataProvider.SelectableListDataProviderController/ACTION$getItems";
pub const GET_RECORD_DESCRIPTOR: &str = "serviceComponent://ui.force.components.controllers.detail.DetailController/ACTION$getRecord";

fn envelope(descriptor: &str, params: Value) -> String {
    json!({
        "actions": [
            {
                "id": ACTION_ID,
                "descriptor": descriptor,
                "callingDescriptor": "UNKNOWN",
                "params": params,
            }
        ]
    })
    .to_string()
}

/// `getConfigData`: the object name to key prefix map.
pub fn build_object_list_payload() -> String {
    envelope(CONFIG_DATA_DESCRIPTOR, json!({}))
}

/// `getItems`: one page of records for an object.
pub fn build_list_payload(object_name: &str, page_size: u32, page: u32) -> String {
    envelope(
        GET_ITEMS_DESCRIPTOR,
        json!({
            "entityNameOrId": object_name,
            "layoutType": "FULL",
            "pageSize": page_size,
            "currentPage": page,
            "useTimeout": false,
            "getCount": true,
            "enableRowActions": false,
        }),
    )
}

/// `getRecord`: a single record by id.
pub fn build_record_payload(record_id: &str) -> String {
    envelope(
        GET_RECORD_DESCRIPTOR,
        json!({
            "recordId": record_id,
            "record": null,
            "inContextOfComponent": "",
            "mode": "VIEW",
            "layoutType": "FULL",
            "defaultFieldValues": null,
            "navigationLocation": "LIST_VIEW_ROW",
        }),
    )
}

/// `null` reads like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    #[serde(default)]
    pub exception_event: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub actions: Vec<ActionResult>,
}

impl ActionResponse {
    /// Framework-level failure, independent of the action itself.
    pub fn has_exception(&self) -> bool {
        self.exception_event.as_ref().is_some_and(is_truthy)
    }

    /// The single action answered in this response.
    pub fn action(&self) -> Option<&ActionResult> {
        self.actions.first()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub state: ActionState,
    #[serde(default)]
    pub return_value: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub error: Vec<Value>,
}

impl ActionResult {
    pub fn is_success(&self) -> bool {
        self.state == ActionState::Success
    }

    pub fn first_error(&self) -> Option<&Value> {
        self.error.first()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionState {
    Success,
    Error,
    Incomplete,
    #[default]
    #[serde(other)]
    Other,
}

/// One page of `getItems` results.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: Vec<Value>,
    /// Informational only; servers send `-1` when they skip counting.
    #[serde(default)]
    pub total_count: Option<i64>,
}

impl RecordPage {
    pub fn from_return_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// `record.Id` of a list entry, used to link document downloads.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get("record")?.get("Id")?.as_str()
}

/// Truthiness of a loosely typed JSON flag.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
