/// Returns the default denylist of (substring, reason) tuples.
/// Any command containing one of these substrings is refused before a process
/// is spawned. This catches obvious dangerous commands but is not a security
/// boundary; path confinement of the file tools is the primary defense.
pub fn default_blocklist() -> Vec<(String, String)> {
    vec![
        // Destructive filesystem wipes
        ("rm -rf /".into(), "Recursive deletion at root not allowed".into()),
        ("rm -fr /".into(), "Recursive deletion at root not allowed".into()),
        ("rm -rf ~".into(), "Recursive deletion of home not allowed".into()),
        // Privilege escalation
        ("sudo".into(), "Privilege escalation (sudo) not allowed".into()),
        ("doas ".into(), "Privilege escalation (doas) not allowed".into()),
        // System shutdown/reboot
        ("shutdown".into(), "System shutdown not allowed".into()),
        ("reboot".into(), "System reboot not allowed".into()),
        ("poweroff".into(), "System poweroff not allowed".into()),
        // Raw device writes and disk-level operations
        ("> /dev/".into(), "Direct device writes not allowed".into()),
        ("of=/dev/".into(), "Direct device writes not allowed".into()),
        ("mkfs".into(), "Filesystem formatting not allowed".into()),
        // Fork bomb
        (":(){".into(), "Fork bomb pattern detected".into()),
    ]
}
