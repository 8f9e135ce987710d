//! Elevated command execution
//!
//! Commands are spawned as `sudo -k -S -p "" -- <program> <args...>`. The
//! credential is written to the child's stdin followed by a newline and
//! stdin is closed, so the password never appears in argv, in a shell
//! string, or in the process listing.

use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::credential::Credential;
use crate::error::CommandError;

/// Default per-command timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for a child to exit
const WAIT_POLL: Duration = Duration::from_millis(10);

/// Substrings sudo prints when it refuses a password
const REJECTION_MARKERS: &[&str] = &[
    "sorry, try again",
    "incorrect password",
    "no password was provided",
    "a password is required",
    "authentication failure",
];

/// Captured output of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Anything that can run a command with elevated privilege
pub trait CommandRunner {
    /// Run `program` with `args`, authenticating with `credential`
    fn run(
        &self,
        program: &str,
        args: &[&str],
        credential: &Credential,
    ) -> Result<CommandOutput, CommandError>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        credential: &Credential,
    ) -> Result<CommandOutput, CommandError> {
        (**self).run(program, args, credential)
    }
}

/// The privilege-escalation helper and the arguments placed before the
/// target command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Elevation {
    pub program: String,
    pub args: Vec<String>,
}

impl Elevation {
    /// `sudo` reading the password from stdin with an empty prompt.
    ///
    /// `-k` ignores a cached timestamp so sudo always consumes the password
    /// line instead of leaving it in the pipe for the target command.
    pub fn sudo(path: impl Into<String>) -> Self {
        Self {
            program: path.into(),
            args: ["-k", "-S", "-p", "", "--"].iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Any other helper, e.g. a wrapper script
    pub fn custom(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Default for Elevation {
    fn default() -> Self {
        Self::sudo("sudo")
    }
}

/// Runs commands through an [`Elevation`] helper
#[derive(Debug, Clone)]
pub struct SudoRunner {
    elevation: Elevation,
    timeout: Option<Duration>,
}

impl Default for SudoRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl SudoRunner {
    pub fn new() -> Self {
        Self {
            elevation: Elevation::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    pub fn with_elevation(mut self, elevation: Elevation) -> Self {
        self.elevation = elevation;
        self
    }

    /// Set the per-command timeout; `None` waits forever
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn elevation(&self) -> &Elevation {
        &self.elevation
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl CommandRunner for SudoRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        credential: &Credential,
    ) -> Result<CommandOutput, CommandError> {
        debug!(
            "Running {} {} via {}",
            program,
            args.join(" "),
            self.elevation.program
        );

        let mut child = Command::new(&self.elevation.program)
            .args(&self.elevation.args)
            .arg(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CommandError::Spawn {
                program: self.elevation.program.clone(),
                source,
            })?;

        // Readers run on their own threads so a chatty child cannot block on
        // a full pipe while we wait for it.
        let stdout_reader = child.stdout.take().map(spawn_reader);
        let stderr_reader = child.stderr.take().map(spawn_reader);

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = feed_credential(&mut stdin, credential) {
                // The child may exit before reading, e.g. cached sudo
                // timestamp plus a command that ignores stdin.
                if e.kind() != io::ErrorKind::BrokenPipe {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(CommandError::Io {
                        program: program.to_string(),
                        source: e,
                    });
                }
            }
        }

        let Some(status) = wait_bounded(child, self.timeout, program)? else {
            // Reader threads are left detached: a grandchild may still hold
            // the pipes open after the helper was killed.
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout: self.timeout.unwrap_or_default(),
            });
        };

        let stdout = join_reader(stdout_reader);
        let stderr = join_reader(stderr_reader);

        if status.success() {
            debug!("{} succeeded ({} bytes of output)", program, stdout.len());
            return Ok(CommandOutput { stdout, stderr });
        }

        if is_rejection(&stderr) {
            warn!("Credential rejected while running {}", program);
            return Err(CommandError::CredentialRejected {
                program: program.to_string(),
                stderr,
            });
        }

        debug!("{} failed with {:?}", program, status.code());
        Err(CommandError::Failed {
            program: program.to_string(),
            status: status.code(),
            stderr,
        })
    }
}

/// The parts of a child process the bounded wait needs
trait ChildProcess: Send + 'static {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;
    fn kill(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl ChildProcess for Child {
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Wait for the child, killing it once the deadline passes.
/// Returns `None` on timeout.
///
/// Once sudo has authenticated it runs as root and an unprivileged caller
/// cannot signal it. In that case the child is handed to a reaper thread
/// and the timeout is reported without waiting for it.
fn wait_bounded<C: ChildProcess>(
    mut child: C,
    timeout: Option<Duration>,
    program: &str,
) -> Result<Option<ExitStatus>, CommandError> {
    let io_err = |source: io::Error| CommandError::Io {
        program: program.to_string(),
        source,
    };

    let Some(timeout) = timeout else {
        return child.wait().map(Some).map_err(io_err);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait().map_err(io_err)? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            warn!("{} did not exit within {:?}, killing it", program, timeout);
            match child.kill() {
                Ok(()) => {
                    // Reap so the child does not linger as a zombie
                    let _ = child.wait();
                }
                Err(e) => {
                    warn!("Could not kill {}: {}; leaving it to finish on its own", program, e);
                    thread::spawn(move || {
                        let _ = child.wait();
                    });
                }
            }
            return Ok(None);
        }
        thread::sleep(WAIT_POLL);
    }
}

fn feed_credential(stdin: &mut impl Write, credential: &Credential) -> io::Result<()> {
    stdin.write_all(credential.expose().as_bytes())?;
    stdin.write_all(b"\n")?;
    stdin.flush()
}

fn spawn_reader<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_reader(reader: Option<JoinHandle<Vec<u8>>>) -> String {
    reader
        .and_then(|handle| handle.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Whether sudo's stderr says the password was refused
pub fn is_rejection(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    REJECTION_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Run `program` through the default `sudo` helper with the default timeout
pub fn run_elevated_command(
    program: &str,
    args: &[&str],
    credential: &Credential,
) -> Result<CommandOutput, CommandError> {
    SudoRunner::new().run(program, args, credential)
}
