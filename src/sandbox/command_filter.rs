use regex::RegexSet;

/// Checks commands against a set of denylisted substrings.
///
/// Matching is plain substring containment (each entry is escaped before it
/// is compiled), so it is conservative and trivially bypassed by obfuscation.
/// It is not a containment boundary.
pub struct CommandFilter {
    patterns: RegexSet,
    pattern_reasons: Vec<String>,
}

/// Information about a blocked command.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BlockedCommand {
    pub blocked: bool,
    pub reason: String,
    pub command: String,
}

impl CommandFilter {
    /// Create a new filter from a list of (substring, reason) tuples.
    /// The RegexSet is compiled once for efficient multi-pattern matching.
    pub fn new(substrings: &[(String, String)]) -> Result<Self, regex::Error> {
        let (literals, reasons): (Vec<_>, Vec<_>) = substrings
            .iter()
            .map(|(s, r)| (regex::escape(s), r.clone()))
            .unzip();
        Ok(Self {
            patterns: RegexSet::new(&literals)?,
            pattern_reasons: reasons,
        })
    }

    /// Build a filter from [`super::defaults::default_blocklist`].
    pub fn from_defaults() -> Result<Self, regex::Error> {
        Self::new(&super::defaults::default_blocklist())
    }

    /// Check if a command is blocked. Returns Some(BlockedCommand) if blocked, None if allowed.
    pub fn check(&self, command: &str) -> Option<BlockedCommand> {
        let first = self.patterns.matches(command).into_iter().next()?;
        Some(BlockedCommand {
            blocked: true,
            reason: self.pattern_reasons[first].clone(),
            command: command.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regex_metacharacters_are_literal() {
        let filter = CommandFilter::new(&[("> /dev/".into(), "raw device write".into())]).unwrap();
        assert!(filter.check("echo x > /dev/sda").is_some());
        assert!(filter.check("echo x >/dev/sda").is_none());

        let filter = CommandFilter::new(&[(":(){".into(), "fork bomb".into())]).unwrap();
        assert!(filter.check(":(){ :|:& };:").is_some());
    }

    #[test]
    fn reports_first_matching_reason() {
        let filter = CommandFilter::new(&[
            ("sudo".into(), "first".into()),
            ("reboot".into(), "second".into()),
        ])
        .unwrap();
        let blocked = filter.check("sudo reboot").unwrap();
        assert_eq!(blocked.reason, "first");
        assert_eq!(blocked.command, "sudo reboot");
    }

    #[test]
    fn blocked_json_is_parseable() {
        let filter = CommandFilter::from_defaults().unwrap();
        let blocked = filter.check("sudo ls").unwrap();
        let parsed: serde_json::Value = serde_json::to_value(&blocked).unwrap();
        assert_eq!(parsed["blocked"], true);
        assert_eq!(parsed["command"], "sudo ls");
    }
}
