//! Workflow engine integration
//!
//! This module contains the workflow engine client interface and the variable
//! protocol types it speaks. The engine is treated purely as a network peer;
//! its process definitions are irrelevant here.

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::Debug;

use crate::error::ServerResult;

/// A typed variable value in the engine's variable protocol.
///
/// The type-tag set is closed: free-text fields are `String`, numeric fields
/// are `Integer`. Wire form is `{"value": <value>, "type": "<tag>"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    String(String),
    Integer(i64),
}

impl VariableValue {
    /// The engine-facing type tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            VariableValue::String(_) => "String",
            VariableValue::Integer(_) => "Integer",
        }
    }
}

impl Serialize for VariableValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        match self {
            VariableValue::String(value) => map.serialize_entry("value", value)?,
            VariableValue::Integer(value) => map.serialize_entry("value", value)?,
        }
        map.serialize_entry("type", self.type_tag())?;
        map.end()
    }
}

/// An ordered mapping from variable name to typed value, consumed once per
/// delivery attempt.
///
/// Entries keep the order in which they were added. A field absent from the
/// triggering update never has an entry here, so the corresponding engine
/// variable stays untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableUpdate {
    entries: Vec<(String, VariableValue)>,
}

impl VariableUpdate {
    /// Create an empty variable update
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a variable assignment
    pub fn push(&mut self, name: impl Into<String>, value: VariableValue) {
        self.entries.push((name.into(), value));
    }

    /// True when no variable is present
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of variables present
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The entries in insertion order
    pub fn entries(&self) -> &[(String, VariableValue)] {
        &self.entries
    }

    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.entries
            .iter()
            .find(|(entry_name, _)| entry_name == name)
            .map(|(_, value)| value)
    }
}

impl Serialize for VariableUpdate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Interface to the external workflow engine
#[async_trait]
pub trait ProcessEngine: Send + Sync + Debug {
    /// Search running process instances filtered by variable equality
    async fn search_active_instances(
        &self,
        variable: &str,
        value: &str,
    ) -> ServerResult<Vec<String>>;

    /// Search the engine's history store for process instances that carried
    /// the given variable value, most relevant first
    async fn search_historic_instances(
        &self,
        variable: &str,
        value: &str,
    ) -> ServerResult<Vec<String>>;

    /// Push a variable update into a single process instance
    async fn submit_variables(
        &self,
        instance_id: &str,
        update: &VariableUpdate,
    ) -> ServerResult<()>;

    /// Start a new process instance by definition key, returning its id
    async fn start_process(
        &self,
        definition_key: &str,
        update: &VariableUpdate,
    ) -> ServerResult<String>;

    /// Get health status
    async fn health_check(&self) -> ServerResult<bool>;
}

/// Re-export specific implementations
pub mod camunda;
