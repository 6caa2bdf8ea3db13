//! Service definitions and the topology they form

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Structural problems in a topology
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Service name must not be empty")]
    EmptyName,

    #[error("Duplicate service name: {0}")]
    DuplicateService(String),

    #[error("Service {service} depends on unknown service {dependency}")]
    UnknownDependency { service: String, dependency: String },

    #[error("Service {0} has port 0")]
    InvalidPort(String),
}

/// One application service: where it lives, where it listens, what it needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSpec {
    pub name: String,
    pub port: u16,
    pub path: PathBuf,
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl ServiceSpec {
    pub fn new(name: impl Into<String>, port: u16, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            port,
            path: path.into(),
            depends_on: Vec::new(),
        }
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.port)
    }
}

/// Services in declaration order; that order is the scheduler's scan order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topology {
    services: Vec<ServiceSpec>,
}

impl Topology {
    pub fn new(services: Vec<ServiceSpec>) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &[ServiceSpec] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ServiceSpec> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.iter().map(|s| s.name.as_str())
    }

    /// Joins every relative service path onto `root`
    pub fn resolve_paths(&mut self, root: &Path) {
        for service in &mut self.services {
            if service.path.is_relative() {
                service.path = root.join(&service.path);
            }
        }
    }

    /// Checks names are unique and non-empty, ports are set and every
    /// dependency refers to a declared service
    ///
    /// Cycles are not rejected here; the scheduler reports them as a stall.
    pub fn validate(&self) -> Result<(), TopologyError> {
        let mut seen = HashSet::new();
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(TopologyError::EmptyName);
            }
            if !seen.insert(service.name.as_str()) {
                return Err(TopologyError::DuplicateService(service.name.clone()));
            }
            if service.port == 0 {
                return Err(TopologyError::InvalidPort(service.name.clone()));
            }
        }

        for service in &self.services {
            if let Some(dependency) = service
                .depends_on
                .iter()
                .find(|dep| !seen.contains(dep.as_str()))
            {
                return Err(TopologyError::UnknownDependency {
                    service: service.name.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        Ok(())
    }
}

impl FromIterator<ServiceSpec> for Topology {
    fn from_iter<T: IntoIterator<Item = ServiceSpec>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
