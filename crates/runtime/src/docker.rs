//! Container runtime abstraction for testability.
//!
//! The [`ContainerRuntime`] trait abstracts the lifecycle operations a scenario
//! needs, allowing production code to use [`BollardRuntime`] while tests use
//! `MockRuntime` (feature `mock`).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │  ScenarioRunner  │
//! └────────┬─────────┘
//!          │
//!          ▼
//!   ┌──────────────────┐
//!   │ContainerRuntime  │ (trait)
//!   └──────────────────┘
//!        │        │
//!        ▼        ▼
//!   ┌───────┐ ┌──────┐
//!   │Bollard│ │ Mock │
//!   └───┬───┘ └──────┘
//!       │
//!       ▼
//!   Docker Daemon
//! ```
//!
//! # Naming
//!
//! Service containers are named `{project}-{service}` and attached to the
//! `{project}` bridge network with the bare service name as a network alias,
//! so services address each other as `kafka1:9092`. Service names are
//! validated before any API call:
//! - Must be 1-63 characters
//! - Must start with `[a-z0-9]` and contain only `[a-z0-9_.-]`

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bollard::container::{
    Config, CreateContainerOptions, KillContainerOptions, LogsOptions, NetworkingConfig,
    RemoveContainerOptions, StartContainerOptions, WaitContainerOptions,
};
use bollard::models::{EndpointSettings, HostConfig, PortBinding};
use futures::TryStreamExt;
use metrics::counter;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use stagehand_core::metrics::{
    LABEL_RESULT, LABEL_ROLE, RUNTIME_ONESHOT_RUNS_TOTAL, RUNTIME_SERVICES_STARTED_TOTAL,
};
use stagehand_core::error::TopologyError;
use stagehand_core::types::{self, ServiceSpec, ServiceState, Signal};

use crate::error::RuntimeError;

/// Timeout for a single TCP connect attempt during readiness probing.
const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Validates a service name before it is embedded in container names.
///
/// Same grammar as topology validation, so a validated topology never fails here.
pub(crate) fn validate_service_name(name: &str) -> Result<(), RuntimeError> {
    types::validate_service_name(name).map_err(|e| match e {
        TopologyError::InvalidName { name, reason } => RuntimeError::InvalidName { name, reason },
        other => RuntimeError::InvalidName {
            name: name.to_owned(),
            reason: other.to_string(),
        },
    })
}

/// Splits an image reference into repository and tag (`latest` if absent).
///
/// A `:` that belongs to a registry host (`localhost:5000/img`) is not a tag separator.
pub(crate) fn split_image_ref(image: &str) -> (&str, &str) {
    match image.rfind(':') {
        Some(idx) if !image[idx..].contains('/') => (&image[..idx], &image[idx + 1..]),
        _ => (image, "latest"),
    }
}

/// Trait abstracting container lifecycle operations.
///
/// All runtime calls go through this trait, enabling testability via mocking.
/// The trait is `Send + Sync + 'static`, allowing safe sharing across async contexts.
///
/// # Implementations
///
/// - [`BollardRuntime`]: Production implementation using the `bollard` library
/// - `MockRuntime`: In-memory implementation that records every call (feature `mock`)
pub trait ContainerRuntime: Send + Sync + 'static {
    /// Checks runtime connectivity.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Connection` if the daemon is unreachable.
    fn ping(&self) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Creates the service container if needed and starts it.
    ///
    /// Starting a container that is already running is a no-op. Does not wait
    /// for the service to accept connections.
    fn start_service(
        &self,
        spec: &ServiceSpec,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Reports whether the service container is running, stopped or absent.
    fn service_state(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ServiceState, RuntimeError>> + Send;

    /// Attempts one TCP connection to the service's declared port.
    ///
    /// Returns `Ok(false)` while the service is not (yet) reachable; errors are
    /// reserved for runtime failures.
    fn probe_tcp(
        &self,
        name: &str,
        port: u16,
    ) -> impl Future<Output = Result<bool, RuntimeError>> + Send;

    /// Sends a signal to a running service container.
    ///
    /// # Errors
    ///
    /// - `RuntimeError::NotRunning`: The container exists but is not running
    /// - `RuntimeError::NotFound`: The container was never created
    fn kill_service(
        &self,
        name: &str,
        signal: Signal,
    ) -> impl Future<Output = Result<(), RuntimeError>> + Send;

    /// Runs the service once as a client process and returns its exit code.
    ///
    /// The process arguments are the service's entrypoint followed by `args`.
    /// Blocks until the process exits; the throw-away container is removed.
    fn run_oneshot(
        &self,
        spec: &ServiceSpec,
        args: &[String],
    ) -> impl Future<Output = Result<i64, RuntimeError>> + Send;

    /// Forcibly removes the service container. A missing container is not an error.
    fn remove_service(&self, name: &str) -> impl Future<Output = Result<(), RuntimeError>> + Send;
}

/// Production runtime implementation using `bollard`.
///
/// Communicates with the Docker daemon via a Unix socket.
/// Internally uses `Arc<bollard::Docker>` for safe sharing across async tasks.
///
/// # Examples
///
/// ```ignore
/// use stagehand_runtime::BollardRuntime;
///
/// let runtime = BollardRuntime::connect_with_socket("/var/run/docker.sock", "stagehand", true)?;
/// runtime.ping().await?;
/// # Ok::<(), stagehand_runtime::RuntimeError>(())
/// ```
pub struct BollardRuntime {
    docker: Arc<bollard::Docker>,
    project: String,
    pull_images: bool,
    network: OnceCell<()>,
}

impl BollardRuntime {
    /// Connects to Docker using the default local socket.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Connection` if the connection fails.
    pub fn connect_local(
        project: impl Into<String>,
        pull_images: bool,
    ) -> Result<Self, RuntimeError> {
        let docker = bollard::Docker::connect_with_local_defaults().map_err(|e| {
            RuntimeError::Connection(format!("failed to connect to docker: {e}"))
        })?;
        Ok(Self::with_docker(docker, project, pull_images))
    }

    /// Connects to Docker using a specific socket path.
    ///
    /// # Errors
    ///
    /// Returns `RuntimeError::Connection` if the connection fails.
    pub fn connect_with_socket(
        socket_path: &str,
        project: impl Into<String>,
        pull_images: bool,
    ) -> Result<Self, RuntimeError> {
        let docker =
            bollard::Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)
                .map_err(|e| {
                    RuntimeError::Connection(format!(
                        "failed to connect to docker at {socket_path}: {e}"
                    ))
                })?;
        Ok(Self::with_docker(docker, project, pull_images))
    }

    fn with_docker(docker: bollard::Docker, project: impl Into<String>, pull_images: bool) -> Self {
        Self {
            docker: Arc::new(docker),
            project: project.into(),
            pull_images,
            network: OnceCell::new(),
        }
    }

    /// Container name for a service: `{project}-{service}`.
    pub fn container_name(&self, service: &str) -> String {
        format!("{}-{}", self.project, service)
    }

    fn labels(&self, service: &str) -> HashMap<String, String> {
        HashMap::from([
            ("stagehand.project".to_owned(), self.project.clone()),
            ("stagehand.service".to_owned(), service.to_owned()),
        ])
    }

    /// Creates the project bridge network once per runtime instance.
    async fn ensure_network(&self) -> Result<(), RuntimeError> {
        self.network
            .get_or_try_init(|| async {
                use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};

                match self
                    .docker
                    .inspect_network(&self.project, None::<InspectNetworkOptions<String>>)
                    .await
                {
                    Ok(_) => return Ok(()),
                    Err(e) if is_status(&e, 404) => {}
                    Err(e) => {
                        return Err(RuntimeError::Docker(format!("inspect network failed: {e}")));
                    }
                }

                self.docker
                    .create_network(CreateNetworkOptions {
                        name: self.project.clone(),
                        driver: "bridge".to_owned(),
                        labels: HashMap::from([(
                            "stagehand.project".to_owned(),
                            self.project.clone(),
                        )]),
                        ..Default::default()
                    })
                    .await
                    .map_err(|e| RuntimeError::Docker(format!("create network failed: {e}")))?;
                info!(network = self.project.as_str(), "created project network");
                Ok(())
            })
            .await
            .map(|_| ())
    }

    /// Pulls the image if it is not present locally.
    async fn ensure_image(&self, image: &str) -> Result<(), RuntimeError> {
        if self.docker.inspect_image(image).await.is_ok() {
            return Ok(());
        }
        if !self.pull_images {
            return Err(RuntimeError::Docker(format!(
                "image '{image}' is not present locally and pulling is disabled"
            )));
        }

        use bollard::image::CreateImageOptions;

        let (repo, tag) = split_image_ref(image);
        info!(image, "pulling image");
        self.docker
            .create_image(
                Some(CreateImageOptions {
                    from_image: repo.to_owned(),
                    tag: tag.to_owned(),
                    ..Default::default()
                }),
                None,
                None,
            )
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| RuntimeError::Docker(format!("pull of '{image}' failed: {e}")))?;
        Ok(())
    }

    async fn inspect_state(&self, container: &str) -> Result<ServiceState, RuntimeError> {
        match self.docker.inspect_container(container, None).await {
            Ok(details) => {
                let running = details.state.and_then(|s| s.running).unwrap_or(false);
                Ok(if running {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                })
            }
            Err(e) if is_status(&e, 404) => Ok(ServiceState::Missing),
            Err(e) => Err(RuntimeError::Docker(format!("inspect container failed: {e}"))),
        }
    }

    /// Builds the container configuration shared by services and one-shot runs.
    fn container_config(
        &self,
        spec: &ServiceSpec,
        entrypoint: Option<Vec<String>>,
        cmd: Vec<String>,
        publish: bool,
    ) -> Config<String> {
        let mut exposed_ports = HashMap::new();
        let mut port_bindings = HashMap::new();
        if let (true, Some(port)) = (publish, spec.port) {
            let key = format!("{port}/tcp");
            exposed_ports.insert(key.clone(), HashMap::new());
            // empty host port: docker picks an ephemeral one
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: Some("127.0.0.1".to_owned()),
                    host_port: None,
                }]),
            );
        }

        let env = spec
            .environment
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();

        Config {
            image: Some(spec.image.clone()),
            hostname: Some(spec.name.clone()),
            env: Some(env),
            entrypoint,
            cmd: (!cmd.is_empty()).then_some(cmd),
            working_dir: spec.working_dir.clone(),
            exposed_ports: Some(exposed_ports),
            labels: Some(self.labels(&spec.name)),
            host_config: Some(HostConfig {
                binds: (!spec.volumes.is_empty()).then(|| spec.volumes.clone()),
                port_bindings: Some(port_bindings),
                network_mode: Some(self.project.clone()),
                ..Default::default()
            }),
            networking_config: Some(NetworkingConfig {
                endpoints_config: HashMap::from([(
                    self.project.clone(),
                    EndpointSettings {
                        aliases: Some(vec![spec.name.clone()]),
                        ..Default::default()
                    },
                )]),
            }),
            ..Default::default()
        }
    }

    async fn create_container(
        &self,
        container: &str,
        config: Config<String>,
    ) -> Result<(), RuntimeError> {
        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name: container.to_owned(),
                    ..Default::default()
                }),
                config,
            )
            .await
            .map_err(|e| RuntimeError::Docker(format!("create container '{container}' failed: {e}")))?;
        Ok(())
    }

    async fn start_container(&self, container: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(container, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| RuntimeError::Docker(format!("start container '{container}' failed: {e}")))
    }

    /// Waits for a one-shot container to exit and forwards its output to tracing.
    async fn wait_for_exit(&self, service: &str, container: &str) -> Result<i64, RuntimeError> {
        let exit_code = match self
            .docker
            .wait_container(
                container,
                Some(WaitContainerOptions {
                    condition: "not-running",
                }),
            )
            .try_collect::<Vec<_>>()
            .await
        {
            Ok(responses) => responses.last().map_or(0, |r| r.status_code),
            // bollard reports non-zero exits as an error carrying the code
            Err(bollard::errors::Error::DockerContainerWaitError { code, .. }) => code,
            Err(e) => {
                return Err(RuntimeError::Docker(format!(
                    "wait for '{container}' failed: {e}"
                )));
            }
        };

        match self
            .docker
            .logs(
                container,
                Some(LogsOptions::<String> {
                    stdout: true,
                    stderr: true,
                    ..Default::default()
                }),
            )
            .try_collect::<Vec<_>>()
            .await
        {
            Ok(chunks) => {
                for chunk in chunks {
                    let text = chunk.to_string();
                    for line in text.lines() {
                        info!(service, line, "client output");
                    }
                }
            }
            Err(e) => warn!(service, error = %e, "failed to fetch client output"),
        }

        Ok(exit_code)
    }
}

/// Returns true if the bollard error is a daemon response with the given status.
fn is_status(err: &bollard::errors::Error, status: u16) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError { status_code, .. } if *status_code == status
    )
}

impl ContainerRuntime for BollardRuntime {
    async fn ping(&self) -> Result<(), RuntimeError> {
        self.docker
            .ping()
            .await
            .map_err(|e| RuntimeError::Connection(format!("ping failed: {e}")))?;
        Ok(())
    }

    async fn start_service(&self, spec: &ServiceSpec) -> Result<(), RuntimeError> {
        validate_service_name(&spec.name)?;
        self.ensure_network().await?;

        let container = self.container_name(&spec.name);
        match self.inspect_state(&container).await? {
            ServiceState::Running => {
                debug!(service = spec.name.as_str(), "service already running");
                return Ok(());
            }
            ServiceState::Stopped => {}
            ServiceState::Missing => {
                self.ensure_image(&spec.image).await?;
                let config = self.container_config(spec, None, spec.command.clone(), true);
                self.create_container(&container, config).await?;
            }
        }

        self.start_container(&container).await?;
        counter!(RUNTIME_SERVICES_STARTED_TOTAL, LABEL_ROLE => spec.role.kind_name()).increment(1);
        info!(
            service = spec.name.as_str(),
            container = container.as_str(),
            role = %spec.role,
            "service started"
        );
        Ok(())
    }

    async fn service_state(&self, name: &str) -> Result<ServiceState, RuntimeError> {
        validate_service_name(name)?;
        self.inspect_state(&self.container_name(name)).await
    }

    async fn probe_tcp(&self, name: &str, port: u16) -> Result<bool, RuntimeError> {
        validate_service_name(name)?;
        let container = self.container_name(name);

        let details = match self.docker.inspect_container(&container, None).await {
            Ok(details) => details,
            Err(e) if is_status(&e, 404) => return Ok(false),
            Err(e) => return Err(RuntimeError::Docker(format!("inspect container failed: {e}"))),
        };
        if !details.state.and_then(|s| s.running).unwrap_or(false) {
            return Ok(false);
        }

        let host_port = details
            .network_settings
            .and_then(|n| n.ports)
            .and_then(|mut ports| ports.remove(&format!("{port}/tcp")))
            .flatten()
            .and_then(|bindings| bindings.into_iter().find_map(|b| b.host_port))
            .and_then(|p| p.parse::<u16>().ok());
        let Some(host_port) = host_port else {
            debug!(service = name, port, "port not published yet");
            return Ok(false);
        };

        let connect = tokio::net::TcpStream::connect(("127.0.0.1", host_port));
        Ok(matches!(
            tokio::time::timeout(PROBE_CONNECT_TIMEOUT, connect).await,
            Ok(Ok(_))
        ))
    }

    async fn kill_service(&self, name: &str, signal: Signal) -> Result<(), RuntimeError> {
        validate_service_name(name)?;
        let container = self.container_name(name);

        self.docker
            .kill_container(
                &container,
                Some(KillContainerOptions {
                    signal: signal.as_str(),
                }),
            )
            .await
            .map_err(|e| {
                if is_status(&e, 409) {
                    RuntimeError::NotRunning(name.to_owned())
                } else if is_status(&e, 404) {
                    RuntimeError::NotFound(name.to_owned())
                } else {
                    RuntimeError::Docker(format!("kill '{container}' failed: {e}"))
                }
            })?;
        info!(service = name, signal = %signal, "signal delivered");
        Ok(())
    }

    async fn run_oneshot(&self, spec: &ServiceSpec, args: &[String]) -> Result<i64, RuntimeError> {
        validate_service_name(&spec.name)?;
        self.ensure_network().await?;
        self.ensure_image(&spec.image).await?;

        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let container = format!("{}-run-{}", self.container_name(&spec.name), &run_id[..8]);

        let config = if spec.entrypoint().is_empty() {
            let cmd = spec.command.iter().chain(args).cloned().collect();
            self.container_config(spec, None, cmd, false)
        } else {
            let argv = spec.entrypoint().iter().chain(args).cloned().collect();
            self.container_config(spec, Some(argv), Vec::new(), false)
        };

        self.create_container(&container, config).await?;
        info!(service = spec.name.as_str(), container = container.as_str(), ?args, "running client");

        let result = match self.start_container(&container).await {
            Ok(()) => self.wait_for_exit(&spec.name, &container).await,
            Err(e) => Err(e),
        };

        if let Err(e) = self
            .docker
            .remove_container(
                &container,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            warn!(container = container.as_str(), error = %e, "failed to remove client container");
        }

        let outcome = match &result {
            Ok(0) => "success",
            _ => "failure",
        };
        counter!(RUNTIME_ONESHOT_RUNS_TOTAL, LABEL_RESULT => outcome).increment(1);
        result
    }

    async fn remove_service(&self, name: &str) -> Result<(), RuntimeError> {
        validate_service_name(name)?;
        let container = self.container_name(name);

        match self
            .docker
            .remove_container(
                &container,
                Some(RemoveContainerOptions {
                    force: true,
                    v: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => {
                info!(service = name, container = container.as_str(), "service removed");
                Ok(())
            }
            Err(e) if is_status(&e, 404) => {
                debug!(service = name, "service container already absent");
                Ok(())
            }
            Err(e) => Err(RuntimeError::Docker(format!("remove '{container}' failed: {e}"))),
        }
    }
}
