use agentloop::sandbox::command_filter::{BlockedCommand, CommandFilter};
use agentloop::sandbox::defaults::default_blocklist;

// ============================================================
// Construction tests
// ============================================================

#[test]
fn test_from_defaults_constructs_successfully() {
    assert!(CommandFilter::from_defaults().is_ok());
}

#[test]
fn test_any_substring_is_accepted() {
    // Entries are literal substrings, so regex syntax errors cannot happen.
    let patterns = vec![
        ("[invalid".to_string(), "bracket".to_string()),
        ("a+b*".to_string(), "metachars".to_string()),
    ];
    let filter = CommandFilter::new(&patterns).unwrap();
    assert!(filter.check("echo [invalid").is_some());
    assert!(filter.check("echo a+b*").is_some());
    assert!(filter.check("echo aab").is_none());
}

#[test]
fn test_custom_blocklist_works_independently() {
    let custom = vec![("forbidden".to_string(), "custom block".to_string())];
    let filter = CommandFilter::new(&custom).unwrap();

    let result = filter.check("run forbidden command");
    assert_eq!(result.unwrap().reason, "custom block");

    assert!(
        filter.check("sudo apt install foo").is_none(),
        "custom filter should not include default sudo entry"
    );
}

#[test]
fn test_empty_blocklist_allows_everything() {
    let filter = CommandFilter::new(&[]).unwrap();
    assert!(filter.check("sudo reboot").is_none());
}

// ============================================================
// BLOCKED commands
// ============================================================

#[test]
fn test_blocks_sudo() {
    let filter = CommandFilter::from_defaults().unwrap();
    let blocked = filter.check("sudo apt install foo").expect("sudo should be blocked");
    assert!(blocked.blocked);
    assert!(blocked.reason.contains("sudo"));
}

#[test]
fn test_blocks_sudo_anywhere_in_command() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("ls && sudo rm foo").is_some());
    assert!(filter.check("echo $(sudo id)").is_some());
}

#[test]
fn test_blocks_doas() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("doas rm foo").is_some());
}

#[test]
fn test_blocks_rm_rf_root() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("rm -rf /").is_some());
    assert!(filter.check("rm -rf /*").is_some());
    assert!(filter.check("rm -fr /").is_some());
    assert!(filter.check("rm -rf ~").is_some());
}

#[test]
fn test_blocks_device_writes() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("cat x > /dev/sda").is_some());
    assert!(filter.check("dd if=/dev/zero of=/dev/sda").is_some());
    assert!(filter.check("mkfs.ext4 /dev/sda1").is_some());
}

#[test]
fn test_blocks_shutdown_reboot_poweroff() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("shutdown -h now").is_some());
    assert!(filter.check("reboot").is_some());
    assert!(filter.check("systemctl poweroff").is_some());
}

#[test]
fn test_blocks_fork_bomb() {
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check(":(){ :|:& };:").is_some());
}

#[test]
fn test_long_command_with_blocked_substring() {
    let filter = CommandFilter::from_defaults().unwrap();
    let long_command = format!("echo {} && sudo whoami", "a".repeat(10_000));
    assert!(filter.check(&long_command).is_some());
}

// ============================================================
// ALLOWED commands
// ============================================================

#[test]
fn test_allows_common_commands() {
    let filter = CommandFilter::from_defaults().unwrap();
    for command in [
        "ls -la",
        "cat /etc/hosts",
        "cargo build",
        "npm install express",
        "curl https://example.com",
        "python3 script.py",
        "rm -rf ./temp",
        "rm my_file.txt",
        "echo hello > output.txt",
        "git status",
        "",
    ] {
        assert!(filter.check(command).is_none(), "{command:?} should be allowed");
    }
}

#[test]
fn test_matching_is_case_sensitive() {
    // Plain substring containment; no normalization.
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("SUDO apt install foo").is_none());
}

#[test]
fn test_obfuscation_is_not_caught() {
    // Known limitation of a substring denylist.
    let filter = CommandFilter::from_defaults().unwrap();
    assert!(filter.check("s''udo id").is_none());
    assert!(filter.check("rm  -rf /").is_none());
}

// ============================================================
// BlockedCommand serialization
// ============================================================

#[test]
fn test_blocked_command_json_has_all_fields() {
    let filter = CommandFilter::from_defaults().unwrap();
    let blocked = filter.check("sudo rm -rf /").unwrap();
    let parsed: serde_json::Value = serde_json::to_value(&blocked).unwrap();
    assert_eq!(parsed["blocked"], true);
    assert_eq!(parsed["command"], "sudo rm -rf /");
    assert!(parsed["reason"].is_string());
}

#[test]
fn test_blocked_command_json_escapes_quotes() {
    let blocked = BlockedCommand {
        blocked: true,
        reason: "test".to_string(),
        command: r#"sudo echo "hi""#.to_string(),
    };
    let line = serde_json::to_string(&blocked).unwrap();
    assert!(!line.contains('\n'));
    let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(parsed["command"], r#"sudo echo "hi""#);
}

// ============================================================
// Default blocklist
// ============================================================

#[test]
fn test_default_blocklist_entries_are_nonempty() {
    let list = default_blocklist();
    assert!(!list.is_empty());
    for (substring, reason) in &list {
        assert!(!substring.is_empty());
        assert!(!reason.is_empty(), "entry {substring:?} needs a reason");
    }
}
