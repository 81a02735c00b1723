//! Pattern-based classification of shell commands.
//!
//! Every rule belongs to a tier. Rules are kept in a single list ordered
//! dangerous, ask, safe, and the first rule whose pattern matches the command
//! decides the outcome. Classification never touches the filesystem and keeps
//! no memory between calls.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::fmt;

/// Rule tier, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Destructive or unsandboxed execution. Always vetoed.
    Dangerous,
    /// Mutates shared state; left to the caller's permission flow.
    Ask,
    /// Read-only or validation command.
    Safe,
}

impl Tier {
    /// The outcome produced when a rule of this tier matches.
    #[must_use]
    pub const fn outcome(self) -> Outcome {
        match self {
            Self::Dangerous => Outcome::Block,
            Self::Ask => Outcome::Ask,
            Self::Safe => Outcome::Allow,
        }
    }
}

/// The decision reached for a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Explicitly approve the command.
    Allow,
    /// Hard veto.
    Block,
    /// Matched a rule that declines to decide.
    Ask,
    /// No rule matched.
    NoOpinion,
}

impl Outcome {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
            Self::Ask => "ask",
            Self::NoOpinion => "no_opinion",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single tagged pattern.
#[derive(Debug)]
pub struct ClassificationRule {
    tier: Tier,
    pattern: Regex,
    description: &'static str,
    harmless_target: Option<Regex>,
}

fn compile(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("built-in classification pattern should compile")
}

impl ClassificationRule {
    fn new(tier: Tier, pattern: &str, description: &'static str) -> Self {
        Self { tier, pattern: compile(pattern), description, harmless_target: None }
    }

    /// A rule whose first capture group names a target; the rule only fires
    /// when some captured target is not matched by `harmless`.
    fn with_harmless_target(mut self, harmless: &str) -> Self {
        self.harmless_target = Some(compile(harmless));
        self
    }

    /// The tier this rule belongs to.
    #[must_use]
    pub const fn tier(&self) -> Tier {
        self.tier
    }

    /// The pattern source text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Short human-readable description of what the rule catches.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        self.description
    }

    /// Check the rule against a command.
    #[must_use]
    pub fn is_match(&self, command: &str) -> bool {
        match &self.harmless_target {
            None => self.pattern.is_match(command),
            Some(harmless) => self.pattern.captures_iter(command).any(|caps| {
                caps.get(1).is_some_and(|target| !harmless.is_match(target.as_str()))
            }),
        }
    }
}

const DANGEROUS_RULES: &[(&str, &str)] = &[
    (r"\brm\s+(?:\S+\s+)*(?:-[a-z]*[rf]|--(?:recursive|force)\b)", "recursive or forced delete"),
    (r"\bsudo\s+", "privilege escalation"),
    (
        r"\bchmod\s+(?:-\S+\s+)*(?:[0-7]?[0-7]{2}[2367]\b|[ugo]*[ao][ugo]*\+[rx]*w)",
        "world-writable permissions",
    ),
    (r"\b(?:curl|wget)\b.*\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b", "remote script piped to a shell"),
    (r"\|\s*(?:sudo\s+)?(?:ba|z|da|k)?sh\b", "output piped to a shell"),
    (r"\beval\s+", "dynamic code evaluation"),
    (r":\s*\(\)\s*\{", "fork bomb"),
    (r"\bmkfs(?:\.|\s)", "filesystem formatting"),
    (r"\bdd\s+(?:.*\s)?(?:if|of)=", "raw block-device copy"),
];

const ASK_RULES: &[(&str, &str)] = &[
    (r"\bgit\s+(?:push|pull|checkout|merge|rebase|reset)\b", "git write operation"),
    (r"\bnpm\s+(?:install|uninstall|update)\b", "package modification"),
    (r"\brm\s+", "file removal"),
    (r"\bmv\s+", "file move"),
    (r"\bcp\s+", "file copy"),
];

const SAFE_RULES: &[(&str, &str)] = &[
    (
        r"^cd\s+(?:frontend|backend|electron|mobile|chrome-extension)\s*&&\s*npm\s+(?:run\s+)?(?:build|lint|test)\b",
        "project validation command",
    ),
    (
        r"^cd\s+(?:frontend|backend|electron|mobile)\s*&&\s*npx\s+(?:tsc|vitest|playwright|oxlint)\b",
        "project validation command",
    ),
    (r"^npm\s+(?:run\s+)?(?:build|lint|test|typecheck)\b", "validation command"),
    (r"^npx\s+(?:tsc|vitest|playwright|oxlint|eslint|prettier)\b", "validation command"),
    (r"^git\s+(?:status|diff|log|branch|show|ls-files)\b", "read-only git command"),
    (r"^npm\s+(?:ls|list|outdated|audit)\b", "package metadata query"),
    (r"^cat\s+package\.json\b", "package metadata query"),
    (r"^ls(?:\s|$)", "directory listing"),
    (r"^pwd$", "print working directory"),
    (r"^echo\s", "echo"),
    (r"^which\s", "command lookup"),
    (r"^node\s+--version\b", "version query"),
    (r"^npm\s+--version\b", "version query"),
];

/// Any redirection into `/dev/`. The captured path is checked against
/// [`HARMLESS_DEVICES`].
const DEVICE_REDIRECT: &str = r#">\s*['"]?(/dev/[^\s;&|<>()'"]+)"#;

/// Device paths that are safe to write to.
const HARMLESS_DEVICES: &str = r"^/dev/(?:null|stdout|stderr|tty|fd/\d+)$";

fn tier_rules(
    tier: Tier,
    rules: &'static [(&'static str, &'static str)],
) -> impl Iterator<Item = ClassificationRule> {
    rules
        .iter()
        .map(move |&(pattern, description)| ClassificationRule::new(tier, pattern, description))
}

static RULES: Lazy<Vec<ClassificationRule>> = Lazy::new(|| {
    let device_redirect =
        ClassificationRule::new(Tier::Dangerous, DEVICE_REDIRECT, "redirection into a device file")
            .with_harmless_target(HARMLESS_DEVICES);

    tier_rules(Tier::Dangerous, DANGEROUS_RULES)
        .chain(std::iter::once(device_redirect))
        .chain(tier_rules(Tier::Ask, ASK_RULES))
        .chain(tier_rules(Tier::Safe, SAFE_RULES))
        .collect()
});

/// All rules in evaluation order.
#[must_use]
pub fn rules() -> &'static [ClassificationRule] {
    &RULES
}

/// Result of classifying a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// The decision.
    pub outcome: Outcome,
    /// Why the decision was reached.
    pub reason: String,
    /// Source of the matching pattern, if any rule matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

impl Classification {
    fn no_opinion(reason: &str) -> Self {
        Self { outcome: Outcome::NoOpinion, reason: reason.to_string(), pattern: None }
    }

    fn from_rule(rule: &ClassificationRule) -> Self {
        let reason = match rule.tier {
            Tier::Dangerous => format!(
                "Blocked dangerous command pattern: {} ({})",
                rule.description,
                rule.pattern()
            ),
            Tier::Ask => format!("Deferred to default permission flow: {}", rule.description),
            Tier::Safe => format!("Auto-approved by RALPH ({})", rule.description),
        };
        Self { outcome: rule.tier.outcome(), reason, pattern: Some(rule.pattern().to_string()) }
    }
}

/// Classify a shell command.
///
/// Leading and trailing whitespace is ignored. An empty command has no
/// opinion.
#[must_use]
pub fn classify(command: &str) -> Classification {
    let command = command.trim();
    if command.is_empty() {
        return Classification::no_opinion("empty command");
    }

    RULES
        .iter()
        .find(|rule| rule.is_match(command))
        .map_or_else(|| Classification::no_opinion("no rule matched"), Classification::from_rule)
}
