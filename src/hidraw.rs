//! hidraw device node enumeration and permission display

use std::fs;
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Group, Uid, User};
use serde::Serialize;

/// Directory holding the raw HID nodes
pub const DEV_DIR: &str = "/dev";

/// Node name prefix: hidraw0, hidraw1, ...
const HIDRAW_PREFIX: &str = "hidraw";

/// Numeric suffix of a `hidraw<N>` name, `None` for anything else
pub fn hidraw_index(name: &str) -> Option<u32> {
    let digits = name.strip_prefix(HIDRAW_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// List `hidraw<N>` entries in `dir`, ordered by N.
///
/// Fails only if the directory itself cannot be read.
pub fn list_hidraw_nodes(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut nodes: Vec<(u32, PathBuf)> = fs::read_dir(dir)?
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name();
            let index = hidraw_index(&name.to_string_lossy())?;
            Some((index, entry.path()))
        })
        .collect();
    nodes.sort_by_key(|(index, _)| *index);
    Ok(nodes.into_iter().map(|(_, path)| path).collect())
}

/// `ls -l`-style view of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodePermissions {
    pub path: PathBuf,
    pub mode: u32,
    pub owner: String,
    pub group: String,
    pub is_char_device: bool,
}

impl NodePermissions {
    pub fn read(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            mode: meta.permissions().mode() & 0o7777,
            owner: user_name(meta.uid()),
            group: group_name(meta.gid()),
            is_char_device: meta.file_type().is_char_device(),
        })
    }

    /// World read/write bits are both set
    pub fn world_accessible(&self) -> bool {
        self.mode & 0o006 == 0o006
    }

    /// `crw-rw-rw-` style string
    pub fn mode_string(&self) -> String {
        let kind = if self.is_char_device { 'c' } else { '-' };
        format!("{kind}{}", rwx(self.mode))
    }
}

impl std::fmt::Display for NodePermissions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.mode_string(),
            self.owner,
            self.group,
            self.path.display()
        )
    }
}

fn rwx(mode: u32) -> String {
    const BITS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    BITS.iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

fn user_name(uid: u32) -> String {
    match User::from_uid(Uid::from_raw(uid)) {
        Ok(Some(user)) => user.name,
        _ => uid.to_string(),
    }
}

fn group_name(gid: u32) -> String {
    match Group::from_gid(Gid::from_raw(gid)) {
        Ok(Some(group)) => group.name,
        _ => gid.to_string(),
    }
}

/// Permissions for every hidraw node in `dir`.
/// Nodes that vanish between listing and stat are skipped.
pub fn hidraw_permissions(dir: &Path) -> io::Result<Vec<NodePermissions>> {
    Ok(list_hidraw_nodes(dir)?
        .iter()
        .filter_map(|path| NodePermissions::read(path).ok())
        .collect())
}
