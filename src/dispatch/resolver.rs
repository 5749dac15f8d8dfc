//! Handler resolution
//!
//! Decides once, when a toolset is built, whether its implementation is a raw
//! event handler or a per-tool map. Requests never re-inspect the choice.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::contract::{SemanticVersion, ToolsetContract, VersionedToolsetContract};
use crate::error::{Result, ToolsetError};
use crate::tools::{EventHandler, ToolMap};

/// What an integrator registers for one version
#[derive(Clone)]
pub enum VersionImplementation {
    /// Full event in, full outcome out
    Handler(Arc<dyn EventHandler>),
    /// One implementation per declared tool
    Tools(ToolMap),
}

impl VersionImplementation {
    pub fn handler(handler: impl EventHandler + 'static) -> Self {
        Self::Handler(Arc::new(handler))
    }

    pub fn tools(tools: ToolMap) -> Self {
        Self::Tools(tools)
    }

    fn is_handler(&self) -> bool {
        matches!(self, Self::Handler(_))
    }
}

impl From<ToolMap> for VersionImplementation {
    fn from(tools: ToolMap) -> Self {
        Self::Tools(tools)
    }
}

impl fmt::Debug for VersionImplementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler"),
            Self::Tools(tools) => f.debug_tuple("Tools").field(tools).finish(),
        }
    }
}

/// Execution strategy for every version of a toolset
#[derive(Clone)]
pub enum HandlerStrategy {
    Raw(BTreeMap<SemanticVersion, Arc<dyn EventHandler>>),
    ToolMap(BTreeMap<SemanticVersion, ToolMap>),
}

impl HandlerStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw handler",
            Self::ToolMap(_) => "tool map",
        }
    }

    /// Implemented versions, oldest first
    pub fn versions(&self) -> Vec<SemanticVersion> {
        match self {
            Self::Raw(map) => map.keys().copied().collect(),
            Self::ToolMap(map) => map.keys().copied().collect(),
        }
    }

    pub fn supports(&self, version: &SemanticVersion) -> bool {
        match self {
            Self::Raw(map) => map.contains_key(version),
            Self::ToolMap(map) => map.contains_key(version),
        }
    }
}

impl fmt::Debug for HandlerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerStrategy")
            .field("kind", &self.kind())
            .field("versions", &self.versions())
            .finish()
    }
}

/// Classifies an implementation against its contract
pub struct HandlerResolver<'a> {
    contract: &'a ToolsetContract,
}

impl<'a> HandlerResolver<'a> {
    pub fn new(contract: &'a ToolsetContract) -> Self {
        Self { contract }
    }

    /// Pick the strategy from the earliest configured version and check the rest agree
    pub fn resolve(
        &self,
        implementations: impl IntoIterator<Item = (String, VersionImplementation)>,
    ) -> Result<HandlerStrategy> {
        let mut by_version = BTreeMap::new();
        for (raw_version, implementation) in implementations {
            let version: SemanticVersion = raw_version.parse().map_err(|_| {
                ToolsetError::Configuration(format!(
                    "Invalid version key '{}' in handler",
                    raw_version
                ))
            })?;
            if self.contract.version(&version).is_none() {
                return Err(ToolsetError::Configuration(format!(
                    "Contract {} does not declare version {}",
                    self.contract.uri(),
                    version
                )));
            }
            if by_version.insert(version, implementation).is_some() {
                return Err(ToolsetError::Configuration(format!(
                    "Version {} is implemented more than once",
                    version
                )));
            }
        }

        let Some(first) = by_version.values().next() else {
            return Err(ToolsetError::Configuration(format!(
                "Contract {} requires handler implementation of at least 1 version",
                self.contract.uri()
            )));
        };

        let strategy = if first.is_handler() {
            let mut handlers = BTreeMap::new();
            for (version, implementation) in by_version {
                match implementation {
                    VersionImplementation::Handler(handler) => {
                        handlers.insert(version, handler);
                    }
                    VersionImplementation::Tools(_) => return Err(self.mixed(version)),
                }
            }
            HandlerStrategy::Raw(handlers)
        } else {
            let mut maps = BTreeMap::new();
            for (version, implementation) in by_version {
                match implementation {
                    VersionImplementation::Tools(tools) => {
                        self.check_coverage(version, &tools)?;
                        maps.insert(version, tools);
                    }
                    VersionImplementation::Handler(_) => return Err(self.mixed(version)),
                }
            }
            HandlerStrategy::ToolMap(maps)
        };

        log::debug!(
            "Resolved {} for contract {} (versions: {:?})",
            strategy.kind(),
            self.contract.uri(),
            strategy.versions()
        );
        Ok(strategy)
    }

    /// A tool map must implement exactly the tools its version declares
    fn check_coverage(&self, version: SemanticVersion, tools: &ToolMap) -> Result<()> {
        let contract = self.declared(version)?;
        let registry = contract.registry();

        let missing: Vec<&str> = registry
            .names()
            .into_iter()
            .filter(|name| !tools.contains(name))
            .collect();
        if !missing.is_empty() {
            return Err(ToolsetError::Configuration(format!(
                "Version {} of {} is missing implementations for: {}",
                version,
                contract.uri,
                missing.join(", ")
            )));
        }

        let undeclared: Vec<&str> = tools.names().filter(|name| !registry.contains(name)).collect();
        if !undeclared.is_empty() {
            return Err(ToolsetError::Configuration(format!(
                "Version {} of {} implements undeclared tools: {}",
                version,
                contract.uri,
                undeclared.join(", ")
            )));
        }

        Ok(())
    }

    fn declared(&self, version: SemanticVersion) -> Result<&'a VersionedToolsetContract> {
        self.contract.version(&version).ok_or_else(|| {
            ToolsetError::Configuration(format!("Contract does not declare version {}", version))
        })
    }

    fn mixed(&self, version: SemanticVersion) -> ToolsetError {
        ToolsetError::Configuration(format!(
            "Version {} of {} mixes raw handlers and tool maps; \
             all versions must use the same kind",
            version,
            self.contract.uri()
        ))
    }
}
