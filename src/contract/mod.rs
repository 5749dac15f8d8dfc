//! Toolset contracts
//!
//! A contract names a toolset and declares, per semantic version, the tools it
//! offers. Each built version is immutable and shared read-only by every
//! invocation of that version.

mod agent;
mod typegen;
mod version;

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, ToolsetError};
use crate::tools::{ToolRegistry, ToolSpec};

pub use agent::{AgentContract, AgentContractBuilder, PARENT_SUBJECT_FIELD, VersionedAgentContract};
pub use typegen::{
    AGENT_PREFIX, TOOLSET_PREFIX, agent_complete_type, agent_init_type, complete_type, init_type,
    system_error_type,
};
pub use version::SemanticVersion;

/// One version of a toolset contract
#[derive(Debug, Clone)]
pub struct VersionedToolsetContract {
    pub uri: String,
    pub name: String,
    pub version: SemanticVersion,
    /// `<uri>/<version>`
    pub dataschema: String,
    pub accepts_event_type: String,
    pub complete_event_type: String,
    pub system_error_event_type: String,
    registry: ToolRegistry,
}

impl VersionedToolsetContract {
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

/// A named toolset with all of its versions
#[derive(Debug, Clone)]
pub struct ToolsetContract {
    uri: String,
    name: String,
    versions: BTreeMap<SemanticVersion, VersionedToolsetContract>,
}

impl ToolsetContract {
    pub fn builder(uri: impl Into<String>, name: impl Into<String>) -> ToolsetContractBuilder {
        ToolsetContractBuilder {
            uri: uri.into(),
            name: name.into(),
            versions: Vec::new(),
        }
    }

    /// Load a contract from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Load a contract from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ContractFile = serde_yaml::from_str(content)?;

        let mut builder = Self::builder(file.uri, file.name);
        for (version, tools) in file.versions {
            let specs = tools.into_iter().map(|(name, tool)| {
                let mut spec = ToolSpec::new(name, tool.description);
                if let Some(accepts) = tool.accepts {
                    spec = spec.with_accepts(accepts);
                }
                if let Some(emits) = tool.emits {
                    spec = spec.with_emits(emits);
                }
                spec
            });
            builder = builder.version(version, specs);
        }
        builder.build()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accepts_event_type(&self) -> String {
        init_type(&self.name)
    }

    pub fn complete_event_type(&self) -> String {
        complete_type(&self.name)
    }

    pub fn system_error_event_type(&self) -> String {
        system_error_type(&self.name)
    }

    /// Get one version of the contract
    pub fn version(&self, version: &SemanticVersion) -> Option<&VersionedToolsetContract> {
        self.versions.get(version)
    }

    /// All versions, oldest first
    pub fn versions(&self) -> impl Iterator<Item = &VersionedToolsetContract> {
        self.versions.values()
    }

    pub fn latest(&self) -> Option<&VersionedToolsetContract> {
        self.versions.values().next_back()
    }
}

/// Builder validating a contract before it becomes immutable
#[derive(Debug)]
pub struct ToolsetContractBuilder {
    uri: String,
    name: String,
    versions: Vec<(String, Vec<ToolSpec>)>,
}

impl ToolsetContractBuilder {
    /// Declare the tools of one version
    pub fn version(
        mut self,
        version: impl Into<String>,
        tools: impl IntoIterator<Item = ToolSpec>,
    ) -> Self {
        self.versions.push((version.into(), tools.into_iter().collect()));
        self
    }

    pub fn build(self) -> Result<ToolsetContract> {
        if !is_lower_alphanumeric(&self.name) {
            return Err(ToolsetError::Contract(format!(
                "Invalid 'name' = '{}'. The 'name' must only contain lowercase \
                 alphanumeric characters and dots. e.g. test.toolset",
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
        for (raw_version, tools) in self.versions {
            let version: SemanticVersion = raw_version.parse()?;
            if versions.contains_key(&version) {
                return Err(ToolsetError::Contract(format!("Duplicate version '{}'", version)));
            }

            let versioned = VersionedToolsetContract {
                uri: self.uri.clone(),
                name: self.name.clone(),
                version,
                dataschema: format!("{}/{}", self.uri, version),
                accepts_event_type: init_type(&self.name),
                complete_event_type: complete_type(&self.name),
                system_error_event_type: system_error_type(&self.name),
                registry: ToolRegistry::from_specs(tools)?,
            };
            versions.insert(version, versioned);
        }

        Ok(ToolsetContract {
            uri: self.uri,
            name: self.name,
            versions,
        })
    }
}

fn is_lower_alphanumeric(input: &str) -> bool {
    !input.is_empty()
        && input
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.')
}

/// YAML representation of a tool
#[derive(Debug, Deserialize)]
struct ToolFile {
    description: String,
    accepts: Option<Value>,
    emits: Option<Value>,
}

/// YAML file structure
#[derive(Debug, Deserialize)]
struct ContractFile {
    uri: String,
    name: String,
    versions: BTreeMap<String, BTreeMap<String, ToolFile>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE_YAML: &str = r##"
uri: "#/agent/test/weather"
name: policy.rag
versions:
  "1.0.0":
    get-weather:
      description: Fetch latest weather for a given location in celcius
      accepts:
        type: object
        properties:
          location: { type: string }
      emits:
        type: object
        properties:
          temperature: { type: number }
    celcius-to-kelvin:
      description: Converts celcius temperature to kelvin
  "1.1.0":
    get-weather:
      description: Fetch latest weather
"##;

    fn math_contract() -> Result<ToolsetContract> {
        ToolsetContract::builder("#/agent/test/contract", "test.tools")
            .version(
                "1.0.0",
                vec![
                    ToolSpec::new("add", "Adds two numbers"),
                    ToolSpec::new("multiply", "Multiplies two numbers"),
                ],
            )
            .build()
    }

    #[test]
    fn test_builder_derives_event_types() {
        let contract = math_contract().unwrap();
        let v1 = contract.version(&SemanticVersion::new(1, 0, 0)).unwrap();

        assert_eq!(v1.dataschema, "#/agent/test/contract/1.0.0");
        assert_eq!(v1.accepts_event_type, "arvo.agent.toolset.test.tools");
        assert_eq!(v1.complete_event_type, "arvo.agent.toolset.test.tools.done");
        assert_eq!(v1.system_error_event_type, "sys.arvo.agent.toolset.test.tools.error");
        assert_eq!(v1.registry().names(), vec!["add", "multiply"]);
        assert_eq!(contract.accepts_event_type(), v1.accepts_event_type);
    }

    #[test]
    fn test_builder_rejects_invalid_name() {
        let result = ToolsetContract::builder("#/x", "Test_Tools")
            .version("1.0.0", vec![ToolSpec::new("add", "Adds")])
            .build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Invalid 'name' = 'Test_Tools'"));
    }

    #[test]
    fn test_builder_requires_versions() {
        let result = ToolsetContract::builder("#/x", "test").build();
        assert!(matches!(result, Err(ToolsetError::Contract(_))));
    }

    #[test]
    fn test_builder_rejects_bad_and_duplicate_versions() {
        let bad = ToolsetContract::builder("#/x", "test").version("v1", Vec::new()).build();
        assert!(matches!(bad, Err(ToolsetError::Contract(_))));

        let dup = ToolsetContract::builder("#/x", "test")
            .version("1.0.0", Vec::new())
            .version("1.0.0", Vec::new())
            .build();
        assert!(matches!(dup, Err(ToolsetError::Contract(_))));
    }

    #[test]
    fn test_from_yaml() {
        let contract = ToolsetContract::from_yaml(SAMPLE_YAML).unwrap();
        assert_eq!(contract.name(), "policy.rag");
        assert_eq!(contract.uri(), "#/agent/test/weather");
        assert_eq!(contract.versions().count(), 2);

        let v1 = contract.version(&"1.0.0".parse().unwrap()).unwrap();
        assert_eq!(v1.registry().names(), vec!["celcius-to-kelvin", "get-weather"]);
        let weather = v1.registry().get("get-weather").unwrap();
        assert_eq!(weather.accepts["properties"]["location"]["type"], "string");
        let kelvin = v1.registry().get("celcius-to-kelvin").unwrap();
        assert_eq!(kelvin.accepts["type"], "object");

        assert_eq!(contract.latest().unwrap().version, SemanticVersion::new(1, 1, 0));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE_YAML.as_bytes()).unwrap();

        let contract = ToolsetContract::from_file(file.path()).unwrap();
        assert_eq!(contract.name(), "policy.rag");
    }

    #[test]
    fn test_from_file_missing() {
        let result = ToolsetContract::from_file("/nonexistent/contract.yml");
        assert!(matches!(result, Err(ToolsetError::Io(_))));
    }

    #[test]
    fn test_is_lower_alphanumeric() {
        assert!(is_lower_alphanumeric("test.toolset"));
        assert!(is_lower_alphanumeric("v2.tools"));
        assert!(!is_lower_alphanumeric(""));
        assert!(!is_lower_alphanumeric("has space"));
        assert!(!is_lower_alphanumeric("UPPER"));
        assert!(!is_lower_alphanumeric("dash-ed"));
    }
}
