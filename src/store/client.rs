//! Typed Run State Client
//!
//! Wraps a [`StateStore`] with the keys and value formats of a single
//! run. The driver uses the read side plus `set_status`; the producer
//! operations (`set_graph_payload`, `set_pending_input`, `request_stop`)
//! are what a user-facing API calls.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflow::{GraphPayload, UserInput, WorkflowStatus};

use super::{StateStore, StoreError};

/// Persisted status of a run.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusRecord {
    pub status: WorkflowStatus,
    #[serde(default)]
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

/// State store client scoped to one run.
#[derive(Clone)]
pub struct RunStore {
    unique_id: String,
    backend: Arc<dyn StateStore>,
}

impl RunStore {
    pub fn new(unique_id: impl Into<String>, backend: Arc<dyn StateStore>) -> Self {
        Self {
            unique_id: unique_id.into(),
            backend,
        }
    }

    pub fn unique_id(&self) -> &str {
        &self.unique_id
    }

    pub fn status_key(&self) -> String {
        format!("workflow:{}:status", self.unique_id)
    }

    pub fn data_key(&self) -> String {
        format!("workflow:{}:data", self.unique_id)
    }

    pub fn input_key(&self) -> String {
        format!("workflow:{}:input", self.unique_id)
    }

    pub fn stop_key(&self) -> String {
        format!("workflow:{}:stop", self.unique_id)
    }

    /// Overwrites the run status.
    pub fn set_status(&self, status: WorkflowStatus, reason: &str) -> Result<(), StoreError> {
        let record = StatusRecord {
            status,
            reason: reason.to_string(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&record)?;
        self.backend.set(&self.status_key(), &json)
    }

    pub fn get_status(&self) -> Result<Option<StatusRecord>, StoreError> {
        let key = self.status_key();
        self.backend
            .get(&key)?
            .map(|raw| parse_json(&key, &raw))
            .transpose()
    }

    pub fn set_graph_payload(&self, graph: &GraphPayload) -> Result<(), StoreError> {
        let json = serde_json::to_string(graph)?;
        self.backend.set(&self.data_key(), &json)
    }

    pub fn get_graph_payload(&self) -> Result<Option<GraphPayload>, StoreError> {
        let key = self.data_key();
        let raw = match self.backend.get(&key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return Ok(None),
        };

        let payload: Value = parse_json(&key, &raw)?;
        if is_empty_input(&payload) {
            return Ok(None);
        }
        Ok(Some(payload))
    }

    pub fn set_pending_input(&self, input: &UserInput) -> Result<(), StoreError> {
        let json = serde_json::to_string(input)?;
        self.backend.set(&self.input_key(), &json)
    }

    /// Reads pending input without clearing it.
    pub fn get_pending_input(&self) -> Result<Option<UserInput>, StoreError> {
        let key = self.input_key();
        let raw = self.backend.get(&key)?;
        decode_input(&key, raw)
    }

    /// Consumes pending input, clearing the buffer.
    ///
    /// The buffer is decoded before it is claimed, so malformed input is
    /// reported and left in place.
    pub fn take_pending_input(&self) -> Result<Option<UserInput>, StoreError> {
        let key = self.input_key();
        if decode_input(&key, self.backend.get(&key)?)?.is_none() {
            return Ok(None);
        }
        let raw = self.backend.take(&key)?;
        decode_input(&key, raw)
    }

    pub fn request_stop(&self) -> Result<(), StoreError> {
        self.backend.set(&self.stop_key(), "1")
    }

    pub fn get_stop_requested(&self) -> Result<bool, StoreError> {
        Ok(self
            .backend
            .get(&self.stop_key())?
            .map(|raw| is_truthy(&raw))
            .unwrap_or(false))
    }
}

fn parse_json<T: for<'de> Deserialize<'de>>(key: &str, raw: &str) -> Result<T, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn decode_input(key: &str, raw: Option<String>) -> Result<Option<UserInput>, StoreError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = parse_json(key, &raw)?;
    Ok(if is_empty_input(&value) { None } else { Some(value) })
}

/// Null, "", {} and [] all mean "nothing supplied yet".
fn is_empty_input(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}
