//! Layered resolution of the runtime, entry artifact and package manager.

use std::path::{Path, PathBuf};

use gatewatch_core::ports::PathResolver;
use gatewatch_core::{ENTRY_ARTIFACT_RELATIVE, GATEWAY_CLI_NAME, RUNTIME_NAME};
use tracing::debug;

use super::env::{EnvProvider, SystemEnv};
use super::fs::{FsProvider, SystemFs};
use super::global_root::{GlobalRootProvider, NpmGlobalRoot};
use super::search::Searcher;
use super::types::{AttemptOutcome, Resolution};

/// Package managers that can run the build, in preference order.
pub const PACKAGE_MANAGERS: [&str; 2] = ["pnpm", "npm"];

/// Checkout locations probed when nothing else matches, relative to `$HOME`.
const CONVENTIONAL_CHECKOUTS: [&str; 4] = [
    GATEWAY_CLI_NAME,
    "src/lantern",
    "Projects/lantern",
    "Developer/lantern",
];

/// Global `node_modules` directories probed before asking npm.
const CONVENTIONAL_GLOBAL_MODULES: [&str; 2] =
    ["/opt/homebrew/lib/node_modules", "/usr/local/lib/node_modules"];

pub struct GatewayPathResolver {
    env: Box<dyn EnvProvider>,
    fs: Box<dyn FsProvider>,
    global_root: Box<dyn GlobalRootProvider>,
}

impl Default for GatewayPathResolver {
    fn default() -> Self {
        Self::system()
    }
}

impl GatewayPathResolver {
    /// Resolver over the real environment and filesystem.
    pub fn system() -> Self {
        Self::with_deps(
            Box::new(SystemEnv),
            Box::new(SystemFs),
            Box::new(NpmGlobalRoot),
        )
    }

    /// Resolver with explicit dependencies (for testing).
    pub fn with_deps(
        env: Box<dyn EnvProvider>,
        fs: Box<dyn FsProvider>,
        global_root: Box<dyn GlobalRootProvider>,
    ) -> Self {
        Self {
            env,
            fs,
            global_root,
        }
    }

    fn searcher(&self) -> Searcher<'_> {
        Searcher::new(self.env.as_ref(), self.fs.as_ref())
    }

    /// PATH, then version-manager directories, then conventional locations.
    pub fn diagnose_executable(&self, command: &str) -> Resolution {
        let searcher = self.searcher();
        let mut resolution = Resolution::default();

        resolution.extend(searcher.in_path(command));
        if !resolution.is_resolved() {
            resolution.extend(searcher.in_version_manager(command));
        }
        if !resolution.is_resolved() {
            resolution.extend(searcher.in_platform_defaults(command));
        }

        debug!(command, resolved = ?resolution.resolved, "Executable lookup");
        resolution
    }

    pub fn diagnose_runtime(&self) -> Resolution {
        self.diagnose_executable(RUNTIME_NAME)
    }

    /// Override checkout, then the globally installed CLI, then conventional
    /// checkouts and global module dirs, then `npm root -g`.
    pub fn diagnose_entry_artifact(&self, override_dir: Option<&Path>) -> Resolution {
        let searcher = self.searcher();
        let mut resolution = Resolution::default();

        if let Some(dir) = override_dir {
            resolution.extend(searcher.first_file([dir.join(ENTRY_ARTIFACT_RELATIVE)]));
        }
        if !resolution.is_resolved() {
            resolution.extend(searcher.in_path(GATEWAY_CLI_NAME));
        }
        if !resolution.is_resolved() {
            resolution.extend(searcher.first_file(self.conventional_artifacts()));
        }
        if !resolution.is_resolved() {
            let from_npm = self.npm_global_root().map(|root| package_artifact(&root));
            resolution.extend(searcher.first_file(from_npm));
        }

        debug!(resolved = ?resolution.resolved, "Entry artifact lookup");
        resolution
    }

    /// First available of [`PACKAGE_MANAGERS`].
    pub fn diagnose_package_manager(&self) -> Resolution {
        let mut combined = Resolution::default();
        for manager in PACKAGE_MANAGERS {
            combined.extend(self.diagnose_executable(manager).attempts);
            if combined.is_resolved() {
                break;
            }
        }
        combined
    }

    fn conventional_artifacts(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .env
            .home()
            .map(|home| {
                CONVENTIONAL_CHECKOUTS
                    .iter()
                    .map(|checkout| home.join(checkout).join(ENTRY_ARTIFACT_RELATIVE))
                    .collect()
            })
            .unwrap_or_default();
        candidates.extend(
            CONVENTIONAL_GLOBAL_MODULES
                .iter()
                .map(|root| package_artifact(Path::new(root))),
        );
        candidates
    }

    fn npm_global_root(&self) -> Option<PathBuf> {
        let npm = self.diagnose_executable("npm").resolved?;
        self.global_root.global_root(&npm)
    }
}

/// `<node_modules>/lantern/dist/index.js`
fn package_artifact(modules_root: &Path) -> PathBuf {
    modules_root
        .join(GATEWAY_CLI_NAME)
        .join(ENTRY_ARTIFACT_RELATIVE)
}

impl PathResolver for GatewayPathResolver {
    fn resolve_runtime(&self) -> Option<PathBuf> {
        self.diagnose_runtime().resolved
    }

    fn resolve_entry_artifact(&self, override_dir: Option<&Path>) -> Option<PathBuf> {
        self.diagnose_entry_artifact(override_dir).resolved
    }

    fn resolve_package_manager(&self) -> Option<PathBuf> {
        self.diagnose_package_manager().resolved
    }

    fn validate_override(&self, dir: &Path) -> bool {
        self.fs.check_file(&dir.join(ENTRY_ARTIFACT_RELATIVE)) == AttemptOutcome::Ok
    }
}
