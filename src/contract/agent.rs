//! Agent contracts
//!
//! An agent is started by a single init event and answers with a single
//! complete event. Every init payload carries `parentSubject$$`, the subject of
//! the orchestration that started the agent, or `null` for a root invocation.

use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::dispatch::ToolsetEvent;
use crate::error::{Result, ToolsetError, Violation};

use super::is_lower_alphanumeric;
use super::typegen::{agent_complete_type, agent_init_type};
use super::version::SemanticVersion;

/// Init payload field naming the parent orchestration's subject
pub const PARENT_SUBJECT_FIELD: &str = "parentSubject$$";

/// One version of an agent contract
#[derive(Debug, Clone)]
pub struct VersionedAgentContract {
    pub uri: String,
    pub name: String,
    pub version: SemanticVersion,
    /// `<uri>/<version>`
    pub dataschema: String,
    pub init_event_type: String,
    pub complete_event_type: String,
    /// Shape of the init payload, `parentSubject$$` included
    pub accepts: Value,
    /// Shape of the complete payload
    pub emits: Value,
}

impl VersionedAgentContract {
    /// Build the event that starts this agent version.
    ///
    /// `data` must be an object whose `parentSubject$$` is a string or `null`.
    pub fn init_event(
        &self,
        source: impl Into<String>,
        data: Value,
    ) -> std::result::Result<ToolsetEvent, Violation> {
        let parent = data.as_object().and_then(|map| map.get(PARENT_SUBJECT_FIELD));
        if !matches!(parent, Some(Value::Null | Value::String(_))) {
            return Err(Violation::contract(format!(
                "Init data for {} must carry '{}' as a string or null",
                self.init_event_type, PARENT_SUBJECT_FIELD
            )));
        }

        Ok(
            ToolsetEvent::new(self.init_event_type.clone(), self.version.to_string(), data)
                .with_source(source)
                .with_dataschema(self.dataschema.clone()),
        )
    }
}

/// A named agent with all of its versions
#[derive(Debug, Clone)]
pub struct AgentContract {
    uri: String,
    name: String,
    versions: BTreeMap<SemanticVersion, VersionedAgentContract>,
}

impl AgentContract {
    pub fn builder(uri: impl Into<String>, name: impl Into<String>) -> AgentContractBuilder {
        AgentContractBuilder {
            uri: uri.into(),
            name: name.into(),
            versions: Vec::new(),
        }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn init_event_type(&self) -> String {
        agent_init_type(&self.name)
    }

    pub fn complete_event_type(&self) -> String {
        agent_complete_type(&self.name)
    }

    pub fn version(&self, version: &SemanticVersion) -> Option<&VersionedAgentContract> {
        self.versions.get(version)
    }

    /// All versions, oldest first
    pub fn versions(&self) -> impl Iterator<Item = &VersionedAgentContract> {
        self.versions.values()
    }

    pub fn latest(&self) -> Option<&VersionedAgentContract> {
        self.versions.values().next_back()
    }
}

/// Builder validating an agent contract before it becomes immutable
#[derive(Debug)]
pub struct AgentContractBuilder {
    uri: String,
    name: String,
    versions: Vec<(String, Value, Value)>,
}

impl AgentContractBuilder {
    /// Declare the init and complete payload shapes of one version
    pub fn version(mut self, version: impl Into<String>, init: Value, complete: Value) -> Self {
        self.versions.push((version.into(), init, complete));
        self
    }

    pub fn build(self) -> Result<AgentContract> {
        if !is_lower_alphanumeric(&self.name) {
            return Err(ToolsetError::Contract(format!(
                "Invalid 'name' = '{}'. The 'name' must only contain lowercase \
                 alphanumeric characters and dots. e.g. test.agent",
                self.name
            )));
        }
        if self.versions.is_empty() {
            return Err(ToolsetError::Contract(format!(
                "Contract {} must declare at least one version",
                self.uri
            )));
        }

        let mut versions = BTreeMap::new();
        for (raw_version, init, complete) in self.versions {
            let version: SemanticVersion = raw_version.parse()?;
            if versions.contains_key(&version) {
                return Err(ToolsetError::Contract(format!("Duplicate version '{}'", version)));
            }

            let versioned = VersionedAgentContract {
                uri: self.uri.clone(),
                name: self.name.clone(),
                version,
                dataschema: format!("{}/{}", self.uri, version),
                init_event_type: agent_init_type(&self.name),
                complete_event_type: agent_complete_type(&self.name),
                accepts: with_parent_subject(init, version)?,
                emits: complete,
            };
            versions.insert(version, versioned);
        }

        Ok(AgentContract {
            uri: self.uri,
            name: self.name,
            versions,
        })
    }
}

/// Add the required `parentSubject$$` property to an object shape
fn with_parent_subject(mut init: Value, version: SemanticVersion) -> Result<Value> {
    let Some(shape) = init.as_object_mut() else {
        return Err(ToolsetError::Contract(format!(
            "Init shape of version {} must be a JSON object schema",
            version
        )));
    };

    let properties = shape.entry("properties").or_insert_with(|| json!({}));
    if let Some(properties) = properties.as_object_mut() {
        properties.insert(
            PARENT_SUBJECT_FIELD.to_string(),
            json!({ "type": ["string", "null"] }),
        );
    }

    let required = shape.entry("required").or_insert_with(|| json!([]));
    if let Some(required) = required.as_array_mut()
        && !required.iter().any(|field| field == PARENT_SUBJECT_FIELD)
    {
        required.push(json!(PARENT_SUBJECT_FIELD));
    }

    Ok(init)
}
