// Octavi IFR1 udev helper - Shared Library
// Rule files, hidraw discovery and permission reconciliation

pub mod config;
pub mod device_id;
pub mod error;
pub mod hidraw;
pub mod metadata;
pub mod reconcile;
pub mod rules;
pub mod udev;

pub use config::Config;
pub use device_id::{DeviceId, DeviceIdError, PID_IFR1, VID_OCTAVI};
pub use error::{ReconcileError, RuleError};
pub use hidraw::{hidraw_permissions, list_hidraw_nodes, NodePermissions};
pub use reconcile::{
    reconcile_device_permissions, DeviceOutcome, ReconciliationReport, Reconciler,
};
pub use rules::UdevRule;

pub use udev_privilege::{run_elevated_command, CommandError, CommandOutput, CommandRunner, Credential};
