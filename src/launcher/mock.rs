use super::ServiceLauncher;
use crate::error::LaunchError;
use crate::runner::DetachedProcess;
use crate::topology::ServiceSpec;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;

/// Launcher that records launch order and fails chosen services
///
/// A failing service reports a build [`LaunchError::CommandFailure`].
pub struct MockLauncher {
    launched: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl MockLauncher {
    pub fn new() -> Self {
        Self {
            launched: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_on(&self, service: impl Into<String>) {
        self.failing.lock().unwrap().insert(service.into());
    }

    /// Every service `launch` was called for, failed ones included
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceLauncher for MockLauncher {
    fn launch(&self, service: &ServiceSpec) -> Result<Option<DetachedProcess>, LaunchError> {
        let index = {
            let mut launched = self.launched.lock().unwrap();
            launched.push(service.name.clone());
            launched.len()
        };

        if self.failing.lock().unwrap().contains(&service.name) {
            return Err(LaunchError::CommandFailure {
                command: format!("build {}", service.name),
                code: Some(1),
                stdout: String::new(),
                stderr: "mock build failure".to_string(),
            });
        }

        Ok(Some(DetachedProcess {
            label: service.name.clone(),
            pid: 1000 + index as u32,
            command: format!("run {}", service.name),
            spawned_at: Utc::now(),
        }))
    }
}
