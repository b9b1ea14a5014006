//! Path resolution against a real directory tree.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use gatewatch_core::ports::PathResolver;
use gatewatch_runtime::resolver::{
    EnvProvider, GatewayPathResolver, GlobalRootProvider, SystemFs,
};
use tempfile::TempDir;

/// Only `HOME` is set; `PATH` is empty.
struct HomeOnly(PathBuf);

impl EnvProvider for HomeOnly {
    fn var(&self, key: &str) -> Option<OsString> {
        (key == "HOME").then(|| self.0.clone().into_os_string())
    }
}

struct NoGlobalRoot;

impl GlobalRootProvider for NoGlobalRoot {
    fn global_root(&self, _npm: &Path) -> Option<PathBuf> {
        None
    }
}

fn resolver(home: &Path) -> GatewayPathResolver {
    GatewayPathResolver::with_deps(
        Box::new(HomeOnly(home.to_path_buf())),
        Box::new(SystemFs),
        Box::new(NoGlobalRoot),
    )
}

#[cfg(unix)]
fn make_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, "#!/bin/sh\n").unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[test]
fn highest_numeric_version_wins() {
    let home = TempDir::new().unwrap();
    let versions = home.path().join(".nvm/versions/node");
    for version in ["10.0", "9.2", "10.10"] {
        make_executable(&versions.join(version).join("bin/node"));
    }
    std::fs::create_dir_all(versions.join("system")).unwrap();

    let runtime = resolver(home.path()).resolve_runtime();

    assert_eq!(runtime, Some(versions.join("10.10/bin/node")));
}

#[test]
fn override_is_validated_against_built_artifact() {
    let home = TempDir::new().unwrap();
    let checkout = home.path().join("work/lantern");
    std::fs::create_dir_all(checkout.join("dist")).unwrap();
    let resolver = resolver(home.path());

    assert!(!resolver.validate_override(&checkout));

    std::fs::write(checkout.join("dist/index.js"), "").unwrap();

    assert!(resolver.validate_override(&checkout));
    assert_eq!(
        resolver.resolve_entry_artifact(Some(&checkout)),
        Some(checkout.join("dist/index.js"))
    );
}

#[test]
fn home_checkout_found_without_override() {
    let home = TempDir::new().unwrap();
    let artifact = home.path().join("lantern/dist/index.js");
    std::fs::create_dir_all(artifact.parent().unwrap()).unwrap();
    std::fs::write(&artifact, "").unwrap();

    let diagnosis = resolver(home.path()).diagnose_entry_artifact(None);

    assert_eq!(diagnosis.resolved, Some(artifact));
    assert!(!diagnosis.attempts.is_empty());
}
