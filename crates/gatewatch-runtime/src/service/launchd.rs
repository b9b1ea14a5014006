//! launchctl-driven registration of the gateway agent.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use gatewatch_core::ports::{CommandOutput, CommandRunner, CommandSpec, ServiceInstaller};
use gatewatch_core::{BackendError, ResolvedPaths};
use tracing::{debug, info, warn};

use super::ServiceError;
use super::descriptor::ServiceDescriptor;

const LAUNCHCTL: &str = "/bin/launchctl";

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub label: String,
    pub descriptor_path: PathBuf,
    pub log_path: PathBuf,
    pub port: u16,
    pub launchctl: PathBuf,
    /// launchd domain target, `gui/<uid>`.
    pub domain: String,
}

impl ServiceConfig {
    pub fn new(
        label: impl Into<String>,
        descriptor_path: impl Into<PathBuf>,
        log_path: impl Into<PathBuf>,
        port: u16,
    ) -> Self {
        Self {
            label: label.into(),
            descriptor_path: descriptor_path.into(),
            log_path: log_path.into(),
            port,
            launchctl: PathBuf::from(LAUNCHCTL),
            domain: user_domain(),
        }
    }

    /// `gui/<uid>/<label>`
    pub fn service_target(&self) -> String {
        format!("{}/{}", self.domain, self.label)
    }
}

fn user_domain() -> String {
    #[cfg(unix)]
    {
        format!("gui/{}", nix::unistd::getuid())
    }
    #[cfg(not(unix))]
    {
        "gui/0".to_string()
    }
}

/// Installs, loads, kickstarts and removes the launchd agent.
///
/// The descriptor file on disk is the only record of "installed"; whether it
/// is currently loaded is launchd's business.
pub struct LaunchdServiceManager {
    config: ServiceConfig,
    runner: Arc<dyn CommandRunner>,
}

impl LaunchdServiceManager {
    pub fn new(config: ServiceConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }

    pub fn is_installed(&self) -> bool {
        self.config.descriptor_path.is_file()
    }

    /// Write the descriptor, load it, then force a restart.
    ///
    /// A descriptor that fails to load stays on disk but the call fails.
    pub async fn install(&self, paths: &ResolvedPaths) -> Result<(), ServiceError> {
        self.write_descriptor(paths).await?;

        if let Err(e) = self.load().await {
            warn!(
                descriptor = %self.config.descriptor_path.display(),
                error = %e,
                "Service descriptor written but not loaded"
            );
            return Err(e);
        }

        self.kickstart(true).await?;
        info!(label = %self.config.label, "Service installed");
        Ok(())
    }

    /// Unload (best effort) and delete the descriptor.
    pub async fn uninstall(&self) -> Result<(), ServiceError> {
        if let Err(e) = self.unload().await {
            warn!(error = %e, "Unload failed, removing descriptor anyway");
        }

        match tokio::fs::remove_file(&self.config.descriptor_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Descriptor already absent");
            }
            Err(e) => return Err(e.into()),
        }

        info!(label = %self.config.label, "Service uninstalled");
        Ok(())
    }

    pub async fn write_descriptor(&self, paths: &ResolvedPaths) -> Result<(), ServiceError> {
        let descriptor = ServiceDescriptor::for_paths(
            self.config.label.clone(),
            paths,
            self.config.port,
            self.config.log_path.clone(),
        )?;
        let xml = descriptor.to_xml()?;

        for dir in [
            self.config.descriptor_path.parent(),
            self.config.log_path.parent(),
        ]
        .into_iter()
        .flatten()
        {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&self.config.descriptor_path, xml).await?;

        debug!(path = %self.config.descriptor_path.display(), "Wrote service descriptor");
        Ok(())
    }

    /// `bootstrap gui/<uid> <plist>`, falling back to `load -w <plist>`.
    pub async fn load(&self) -> Result<(), ServiceError> {
        let plist = self.descriptor_arg();
        let modern = self.launchctl(&["bootstrap", &self.config.domain, &plist]).await?;
        if modern.success() {
            return Ok(());
        }
        debug!(stderr = %modern.stderr.trim(), "bootstrap failed, trying legacy load");

        let legacy = self.launchctl(&["load", "-w", &plist]).await?;
        ensure_success("load", &legacy)
    }

    /// `bootout gui/<uid>/<label>`, falling back to `unload <plist>`.
    pub async fn unload(&self) -> Result<(), ServiceError> {
        let target = self.config.service_target();
        let modern = self.launchctl(&["bootout", &target]).await?;
        if modern.success() {
            return Ok(());
        }
        debug!(stderr = %modern.stderr.trim(), "bootout failed, trying legacy unload");

        let legacy = self.launchctl(&["unload", &self.descriptor_arg()]).await?;
        ensure_success("unload", &legacy)
    }

    /// Ask launchd to start the agent now; `force` kills a running instance first.
    pub async fn kickstart(&self, force: bool) -> Result<(), ServiceError> {
        let target = self.config.service_target();
        let mut args = vec!["kickstart"];
        if force {
            args.push("-k");
        }
        args.push(&target);

        let output = self.launchctl(&args).await?;
        ensure_success("kickstart", &output)
    }

    /// Unload without removing the descriptor.
    pub async fn stop(&self) -> Result<(), ServiceError> {
        self.unload().await
    }

    async fn launchctl(&self, args: &[&str]) -> Result<CommandOutput, ServiceError> {
        let spec = CommandSpec::new(&self.config.launchctl).args(args.iter().copied());
        Ok(self.runner.run(&spec).await?)
    }

    fn descriptor_arg(&self) -> String {
        self.config.descriptor_path.to_string_lossy().into_owned()
    }
}

fn ensure_success(action: &'static str, output: &CommandOutput) -> Result<(), ServiceError> {
    if output.success() {
        return Ok(());
    }
    let stderr = output.stderr.trim();
    let detail = if stderr.is_empty() {
        format!("exit status {:?}", output.code)
    } else {
        stderr.to_string()
    };
    Err(ServiceError::Launchctl { action, detail })
}

#[async_trait]
impl ServiceInstaller for LaunchdServiceManager {
    fn is_installed(&self) -> bool {
        Self::is_installed(self)
    }

    async fn install(&self, paths: &ResolvedPaths) -> Result<(), BackendError> {
        Self::install(self, paths).await.map_err(Into::into)
    }

    async fn uninstall(&self) -> Result<(), BackendError> {
        Self::uninstall(self).await.map_err(Into::into)
    }
}
