//! End-to-end tests for `SudoRunner` with `sh -c` standing in for sudo.
//!
//! The fake helper reads one line from stdin, compares it with the expected
//! password and then execs the target command, which is what `sudo -S`
//! does from the caller's point of view.

use std::time::Duration;

use udev_privilege::{CommandError, CommandRunner, Credential, Elevation, SudoRunner};

const FAKE_SUDO: &str = r#"read -r pw
if [ "$pw" != "hunter2" ]; then
    echo "Sorry, try again." >&2
    exit 1
fi
exec "$@""#;

fn fake_runner() -> SudoRunner {
    SudoRunner::new().with_elevation(Elevation::custom(
        "sh",
        vec!["-c".to_string(), FAKE_SUDO.to_string(), "fake-sudo".to_string()],
    ))
}

#[test]
fn runs_command_and_captures_stdout() {
    let out = fake_runner()
        .run("echo", &["--name=/dev/hidraw0"], &Credential::new("hunter2"))
        .unwrap();
    assert_eq!(out.stdout, "--name=/dev/hidraw0\n");
    assert!(out.stderr.is_empty());
}

#[test]
fn arguments_are_not_shell_expanded() {
    let out = fake_runner()
        .run("printf", &["%s", "$(id) ; rm -rf /"], &Credential::new("hunter2"))
        .unwrap();
    assert_eq!(out.stdout, "$(id) ; rm -rf /");
}

#[test]
fn wrong_password_is_classified_as_rejected() {
    let err = fake_runner()
        .run("true", &[], &Credential::new("wrong"))
        .unwrap_err();
    assert!(err.is_credential_rejected(), "got {err:?}");
    assert!(!err.to_string().contains("wrong"));
}

#[test]
fn failing_command_reports_status_and_stderr() {
    let err = fake_runner()
        .run("sh", &["-c", "echo boom >&2; exit 3"], &Credential::new("hunter2"))
        .unwrap_err();
    match err {
        CommandError::Failed { status, stderr, .. } => {
            assert_eq!(status, Some(3));
            assert_eq!(stderr, "boom\n");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn credential_never_reaches_the_command() {
    // The helper consumes the password line; the command sees an empty stdin.
    let out = fake_runner()
        .run("cat", &[], &Credential::new("hunter2"))
        .unwrap();
    assert!(!out.stdout.contains("hunter2"));
}

#[test]
fn slow_command_times_out() {
    let runner = fake_runner().with_timeout(Some(Duration::from_millis(200)));
    let err = runner
        .run("sleep", &["5"], &Credential::new("hunter2"))
        .unwrap_err();
    assert!(
        matches!(err, CommandError::Timeout { timeout, .. } if timeout == Duration::from_millis(200)),
        "got {err:?}"
    );
}

#[test]
fn missing_helper_is_a_spawn_error() {
    let runner = SudoRunner::new().with_elevation(Elevation::custom(
        "/nonexistent/definitely-not-sudo",
        Vec::new(),
    ));
    let err = runner.run("true", &[], &Credential::new("x")).unwrap_err();
    assert!(matches!(err, CommandError::Spawn { .. }), "got {err:?}");
}
