use super::{InfrastructureSettings, StartedSet};
use crate::error::SchedulerError;
use crate::launcher::{DryRunLauncher, ServiceLauncher};
use crate::progress::{NoOpHandler, ProgressEvent, ProgressHandler};
use crate::runner::{CommandRunner, DetachedProcess, SystemRunner};
use crate::topology::{ServiceSpec, Topology};
use std::thread;
use std::time::Instant;
use tracing::{debug, info};

/// Starts infrastructure, then every service once its dependencies are up
///
/// The service loop is a fixed-point iteration over the declared list: each
/// pass launches the first service that is not started and whose dependencies
/// all are, then restarts from the top. A pass that finds nothing while
/// services remain is a stall, which covers dependency cycles as well as any
/// launch that failed without reporting an error.
pub struct TopologyScheduler<L, R> {
    topology: Topology,
    infrastructure: InfrastructureSettings,
    launcher: L,
    runner: R,
    progress: Box<dyn ProgressHandler>,
    started: StartedSet,
    processes: Vec<DetachedProcess>,
}

impl<L: ServiceLauncher, R: CommandRunner> TopologyScheduler<L, R> {
    pub fn new(
        topology: Topology,
        infrastructure: InfrastructureSettings,
        launcher: L,
        runner: R,
    ) -> Self {
        Self {
            topology,
            infrastructure,
            launcher,
            runner,
            progress: Box::new(NoOpHandler),
            started: StartedSet::new(),
            processes: Vec::new(),
        }
    }

    pub fn with_progress(mut self, handler: impl ProgressHandler + 'static) -> Self {
        self.progress = Box::new(handler);
        self
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn started(&self) -> &StartedSet {
        &self.started
    }

    /// Handles of terminal windows opened so far, in launch order
    pub fn processes(&self) -> &[DetachedProcess] {
        &self.processes
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn run(&mut self) -> Result<(), SchedulerError> {
        self.start_infrastructure()?;
        self.start_services()
    }

    pub fn start_infrastructure(&mut self) -> Result<(), SchedulerError> {
        let Some(command) = self.infrastructure.up_command() else {
            debug!("No infrastructure services configured");
            return Ok(());
        };

        self.progress.on_progress(&ProgressEvent::InfrastructureStarting {
            services: self.infrastructure.services.clone(),
        });

        self.runner
            .run(&command)
            .map_err(SchedulerError::Infrastructure)?;

        self.progress.on_progress(&ProgressEvent::InfrastructureStarted {
            warmup: self.infrastructure.warmup,
        });
        thread::sleep(self.infrastructure.warmup);

        Ok(())
    }

    pub fn start_services(&mut self) -> Result<(), SchedulerError> {
        let start = Instant::now();
        let total = self.topology.len();

        while self.started.len() < total {
            let Some(service) = self.next_eligible() else {
                let pending = self.pending();
                self.progress.on_progress(&ProgressEvent::Stalled {
                    pending: pending.clone(),
                });
                return Err(SchedulerError::Stall { pending });
            };

            self.progress.on_progress(&ProgressEvent::ServiceStarting {
                service: service.name.clone(),
                index: self.started.len() + 1,
                total,
            });

            let launch_start = Instant::now();
            match self.launcher.launch(&service) {
                Ok(process) => {
                    self.processes.extend(process);
                    self.started.insert(service.name.clone());
                    self.progress.on_progress(&ProgressEvent::ServiceReady {
                        service: service.name.clone(),
                        duration: launch_start.elapsed(),
                    });
                }
                Err(source) => {
                    self.progress.on_progress(&ProgressEvent::ServiceFailed {
                        service: service.name.clone(),
                        error: source.to_string(),
                    });
                    return Err(SchedulerError::Launch {
                        service: service.name,
                        source,
                    });
                }
            }
        }

        info!(started = self.started.len(), "Startup finished");
        self.progress.on_progress(&ProgressEvent::Completed {
            started: self.started.len(),
            total_time: start.elapsed(),
        });

        Ok(())
    }

    fn next_eligible(&self) -> Option<ServiceSpec> {
        self.topology
            .services()
            .iter()
            .find(|s| !self.started.contains(&s.name) && self.started.contains_all(&s.depends_on))
            .cloned()
    }

    fn pending(&self) -> Vec<String> {
        self.topology
            .names()
            .filter(|name| !self.started.contains(name))
            .map(str::to_string)
            .collect()
    }
}

/// Start order the scheduler would use, computed without launching anything
pub fn plan(topology: &Topology) -> Result<Vec<ServiceSpec>, SchedulerError> {
    let mut scheduler = TopologyScheduler::new(
        topology.clone(),
        InfrastructureSettings::disabled(),
        DryRunLauncher,
        SystemRunner,
    );
    scheduler.start_services()?;

    Ok(scheduler
        .started()
        .iter()
        .filter_map(|name| topology.get(name).cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::MockLauncher;
    use crate::runner::MockRunner;
    use std::time::Duration;

    fn scheduler(
        services: Vec<ServiceSpec>,
    ) -> TopologyScheduler<MockLauncher, MockRunner> {
        TopologyScheduler::new(
            Topology::new(services),
            InfrastructureSettings::disabled(),
            MockLauncher::new(),
            MockRunner::new(),
        )
    }

    #[test]
    fn test_linear_chain() {
        let mut s = scheduler(vec![
            ServiceSpec::new("c", 3, "c").depends_on(["b"]),
            ServiceSpec::new("b", 2, "b").depends_on(["a"]),
            ServiceSpec::new("a", 1, "a"),
        ]);

        s.run().unwrap();
        assert_eq!(s.launcher().launched(), vec!["a", "b", "c"]);
        assert_eq!(s.started().as_slice(), &["a", "b", "c"]);
    }

    #[test]
    fn test_rescans_from_top_after_each_start() {
        // After a starts, b (declared first) must be picked before d.
        let mut s = scheduler(vec![
            ServiceSpec::new("b", 2, "b").depends_on(["a"]),
            ServiceSpec::new("a", 1, "a"),
            ServiceSpec::new("d", 4, "d"),
        ]);

        s.run().unwrap();
        assert_eq!(s.launcher().launched(), vec!["a", "b", "d"]);
    }

    #[test]
    fn test_cycle_stalls_with_nothing_started() {
        let mut s = scheduler(vec![
            ServiceSpec::new("a", 1, "a").depends_on(["b"]),
            ServiceSpec::new("b", 2, "b").depends_on(["a"]),
        ]);

        let err = s.run().unwrap_err();
        match err {
            SchedulerError::Stall { pending } => assert_eq!(pending, vec!["a", "b"]),
            other => panic!("Expected Stall, got {:?}", other),
        }
        assert!(s.started().is_empty());
        assert!(s.launcher().launched().is_empty());
    }

    #[test]
    fn test_unknown_dependency_stalls() {
        let mut s = scheduler(vec![
            ServiceSpec::new("a", 1, "a"),
            ServiceSpec::new("b", 2, "b").depends_on(["ghost"]),
        ]);

        let err = s.run().unwrap_err();
        assert!(matches!(err, SchedulerError::Stall { ref pending } if pending == &vec!["b".to_string()]));
        assert_eq!(s.started().as_slice(), &["a"]);
    }

    #[test]
    fn test_launch_failure_stops_run() {
        let mut s = scheduler(vec![
            ServiceSpec::new("a", 1, "a"),
            ServiceSpec::new("b", 2, "b").depends_on(["a"]),
            ServiceSpec::new("c", 3, "c").depends_on(["b"]),
        ]);
        s.launcher().fail_on("b");

        let err = s.run().unwrap_err();
        assert_eq!(err.service(), Some("b"));
        assert_eq!(s.started().as_slice(), &["a"]);
        assert_eq!(s.launcher().launched(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_topology_succeeds() {
        let mut s = scheduler(Vec::new());
        s.run().unwrap();
        assert!(s.started().is_empty());
    }

    #[test]
    fn test_infrastructure_runs_compose_first() {
        let infrastructure = InfrastructureSettings {
            warmup: Duration::ZERO,
            ..InfrastructureSettings::default()
        };
        let mut s = TopologyScheduler::new(
            Topology::new(vec![ServiceSpec::new("a", 1, "a")]),
            infrastructure,
            MockLauncher::new(),
            MockRunner::new(),
        );

        s.run().unwrap();
        assert_eq!(
            s.runner.command_lines(),
            vec!["docker-compose -f docker-compose.yaml up -d redis rabbit customerdb"]
        );
    }

    #[test]
    fn test_infrastructure_failure_starts_no_services() {
        let infrastructure = InfrastructureSettings {
            warmup: Duration::ZERO,
            ..InfrastructureSettings::default()
        };
        let runner = MockRunner::new();
        runner.fail_when("docker-compose");
        let mut s = TopologyScheduler::new(
            Topology::new(vec![ServiceSpec::new("a", 1, "a")]),
            infrastructure,
            MockLauncher::new(),
            runner,
        );

        let err = s.run().unwrap_err();
        assert!(matches!(err, SchedulerError::Infrastructure(_)));
        assert!(s.launcher().launched().is_empty());
    }

    #[test]
    fn test_plan_orders_crm_topology() {
        let topology = Topology::new(vec![
            ServiceSpec::new("gateway-server", 8072, "g")
                .depends_on(["customer-service", "notification-service"]),
            ServiceSpec::new("customer-service", 8080, "c").depends_on(["eureka-server"]),
            ServiceSpec::new("notification-service", 9000, "n").depends_on(["eureka-server"]),
            ServiceSpec::new("eureka-server", 8070, "e").depends_on(["config-server"]),
            ServiceSpec::new("config-server", 8071, "cfg"),
        ]);

        let order: Vec<_> = plan(&topology)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(
            order,
            vec![
                "config-server",
                "eureka-server",
                "customer-service",
                "notification-service",
                "gateway-server"
            ]
        );
    }

    #[test]
    fn test_plan_reports_cycle() {
        let topology = Topology::new(vec![
            ServiceSpec::new("a", 1, "a").depends_on(["b"]),
            ServiceSpec::new("b", 2, "b").depends_on(["a"]),
        ]);
        assert!(matches!(
            plan(&topology),
            Err(SchedulerError::Stall { .. })
        ));
    }
}
