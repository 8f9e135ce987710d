//! Rule file creation end-to-end: the rule is written through the real
//! `SudoRunner` with `sh -c` standing in for sudo, then read back.

use octavi_udev::rules::{self, UdevRule};
use octavi_udev::{Credential, DeviceId, RuleError};
use udev_privilege::{Elevation, SudoRunner};

const FAKE_SUDO: &str = r#"read -r pw
[ "$pw" = "hunter2" ] || { echo "Sorry, try again." >&2; exit 1; }
exec "$@""#;

fn fake_runner() -> SudoRunner {
    SudoRunner::new().with_elevation(Elevation::custom(
        "sh",
        vec!["-c".to_string(), FAKE_SUDO.to_string(), "fake-sudo".to_string()],
    ))
}

#[test]
fn created_rule_reads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let rule = UdevRule::new(DeviceId::from_hex("04D8", "E6D6").unwrap(), 0o666);

    let path = rules::create_rule_file(
        &fake_runner(),
        &Credential::new("hunter2"),
        dir.path(),
        "99-octavi.rules",
        &rule,
    )
    .unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        content,
        "SUBSYSTEM==\"usb\", ATTR{idVendor}==\"04d8\", ATTR{idProduct}==\"e6d6\", MODE=\"0666\"\n"
    );
    assert_eq!(rules::parse_rules(&content), vec![rule]);
    assert_eq!(
        rules::list_rule_files(dir.path(), "OCTAVI").unwrap(),
        ["99-octavi.rules"]
    );
}

#[test]
fn path_with_spaces_is_not_split() {
    let dir = tempfile::tempdir().unwrap();
    let rules_dir = dir.path().join("rules dir; touch pwned");
    std::fs::create_dir(&rules_dir).unwrap();
    let rule = UdevRule::new(DeviceId::new(0x1209, 0x0001), 0o660);

    rules::create_rule_file(
        &fake_runner(),
        &Credential::new("hunter2"),
        &rules_dir,
        "70-test.rules",
        &rule,
    )
    .unwrap();

    let content = rules::read_rule_file(&rules_dir, "70-test.rules").unwrap();
    assert_eq!(content.trim().parse::<UdevRule>().unwrap(), rule);
    assert!(!dir.path().join("pwned").exists());
}

#[test]
fn wrong_password_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let err = rules::create_rule_file(
        &fake_runner(),
        &Credential::new("nope"),
        dir.path(),
        "99-octavi.rules",
        &UdevRule::new(DeviceId::OCTAVI_IFR1, 0o666),
    )
    .unwrap_err();

    assert!(matches!(err, RuleError::Command(ref e) if e.is_credential_rejected()));
    assert!(!dir.path().join("99-octavi.rules").exists());
}

#[test]
fn traversal_in_file_name_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let err = rules::create_rule_file(
        &fake_runner(),
        &Credential::new("hunter2"),
        dir.path(),
        "../99-octavi.rules",
        &UdevRule::new(DeviceId::OCTAVI_IFR1, 0o666),
    )
    .unwrap_err();
    assert!(matches!(err, RuleError::InvalidFileName(_)));
}
