//! hidraw discovery and permission reconciliation
//!
//! Two passes over the hidraw nodes: first every node's udev metadata is
//! queried and its USB IDs compared with the target, then `chmod 0666` is
//! applied to the confirmed matches only. Each node is handled in
//! isolation; a vanished device or failing chmod is recorded and the run
//! continues.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use udev_privilege::{CommandError, CommandRunner, Credential, SudoRunner};

use crate::device_id::DeviceId;
use crate::error::ReconcileError;
use crate::hidraw::{self, DEV_DIR};
use crate::metadata::DeviceMetadata;

/// udevadm binary used for metadata queries
pub const UDEVADM: &str = "udevadm";
/// chmod binary used for the permission change
pub const CHMOD: &str = "chmod";
/// Mode applied to matching nodes
pub const WORLD_RW_MODE: &str = "0666";

/// Result of the permission change on one matched node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceOutcome {
    pub path: PathBuf,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeviceOutcome {
    fn applied(path: PathBuf) -> Self {
        Self {
            path,
            success: true,
            error: None,
        }
    }

    fn failed(path: PathBuf, err: &CommandError) -> Self {
        Self {
            path,
            success: false,
            error: Some(err.to_string()),
        }
    }
}

/// Aggregate result of one reconciliation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub target: DeviceId,
    /// hidraw nodes found in the device directory
    pub scanned: usize,
    /// One entry per matched node, in enumeration order
    pub outcomes: Vec<DeviceOutcome>,
    /// The run stopped early on request
    pub cancelled: bool,
}

impl ReconciliationReport {
    pub fn found(&self) -> bool {
        !self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &DeviceOutcome> {
        self.outcomes.iter().filter(|o| o.success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &DeviceOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.found() {
            write!(
                f,
                "No matching device found for {} ({} hidraw node(s) scanned).",
                self.target, self.scanned
            )?;
        } else {
            writeln!(f, "Found {} device(s) matching {}:", self.outcomes.len(), self.target)?;
            for outcome in &self.outcomes {
                match &outcome.error {
                    None => writeln!(
                        f,
                        "  {}: applied chmod {}",
                        outcome.path.display(),
                        WORLD_RW_MODE
                    )?,
                    Some(err) => writeln!(
                        f,
                        "  {}: failed to apply chmod {} ({})",
                        outcome.path.display(),
                        WORLD_RW_MODE,
                        err
                    )?,
                }
            }
        }
        if self.cancelled {
            write!(f, "\nCancelled before all nodes were processed.")?;
        }
        Ok(())
    }
}

/// Finds hidraw nodes for one USB device and opens their permissions
pub struct Reconciler<R> {
    runner: R,
    device_dir: PathBuf,
    cancel: Option<Arc<AtomicBool>>,
}

impl<R: CommandRunner> Reconciler<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            device_dir: PathBuf::from(DEV_DIR),
            cancel: None,
        }
    }

    /// Scan a different directory instead of `/dev`
    pub fn with_device_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.device_dir = dir.into();
        self
    }

    /// Stop between devices once `flag` becomes true
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Run discovery and apply `chmod 0666` to every node of `target`
    pub fn reconcile(
        &self,
        target: DeviceId,
        credential: &Credential,
    ) -> Result<ReconciliationReport, ReconcileError> {
        info!("Searching for {} in {}", target, self.device_dir.display());

        let nodes =
            hidraw::list_hidraw_nodes(&self.device_dir).map_err(|source| {
                ReconcileError::Enumeration {
                    dir: self.device_dir.clone(),
                    source,
                }
            })?;
        debug!("{} hidraw node(s) to check", nodes.len());

        let mut report = ReconciliationReport {
            target,
            scanned: nodes.len(),
            outcomes: Vec::new(),
            cancelled: false,
        };

        // Pass 1: confirm identity
        let mut matched = Vec::new();
        for (index, node) in nodes.into_iter().enumerate() {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }
            match self.query(&node, credential) {
                Ok(meta) => match meta.usb_ids() {
                    Some(id) if id == target => {
                        info!("{} matches {}", node.display(), target);
                        matched.push(node);
                    }
                    Some(id) => debug!("{} is {}", node.display(), id),
                    None => debug!("{} is not a USB HID device", node.display()),
                },
                // A bad password shows on the first call; after that a
                // rejection only costs the node it happened on.
                Err(e) if index == 0 && e.is_credential_rejected() => {
                    return Err(ReconcileError::CredentialRejected(e));
                }
                Err(e) => {
                    debug!("Skipping {}: {}", node.display(), e);
                }
            }
        }

        // Pass 2: act on confirmed matches only. Every node here passed a
        // query, so the credential was already accepted once.
        for node in matched {
            if self.is_cancelled() {
                report.cancelled = true;
                break;
            }
            let path = node.to_string_lossy().into_owned();
            match self.runner.run(CHMOD, &[WORLD_RW_MODE, &path], credential) {
                Ok(_) => {
                    info!("Applied chmod {} to {}", WORLD_RW_MODE, path);
                    report.outcomes.push(DeviceOutcome::applied(node));
                }
                Err(e) => {
                    warn!("Failed to apply chmod {} to {}: {}", WORLD_RW_MODE, path, e);
                    report.outcomes.push(DeviceOutcome::failed(node, &e));
                }
            }
        }

        Ok(report)
    }

    /// Fetch and parse the udev metadata record for one node
    fn query(&self, node: &Path, credential: &Credential) -> Result<DeviceMetadata, CommandError> {
        let name_arg = format!("--name={}", node.display());
        let output = self
            .runner
            .run(UDEVADM, &["info", "--query=all", &name_arg], credential)?;
        Ok(DeviceMetadata::parse(&output.stdout))
    }
}

/// Discover `target` under `/dev` using `sudo` and relax its permissions
pub fn reconcile_device_permissions(
    target: DeviceId,
    credential: &Credential,
) -> Result<ReconciliationReport, ReconcileError> {
    Reconciler::new(SudoRunner::new()).reconcile(target, credential)
}
