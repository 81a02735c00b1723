//! Stop hook: refuse to let the agent finish until validation evidence is in.
//!
//! Each stop attempt is counted per session. While the transcript lacks a
//! build/test/lint run for the target package, shows failures, or never
//! confirms success, the stop is blocked with guidance. After
//! `max_continuations` blocked attempts the gate lets go, so an agent that
//! cannot satisfy it is never trapped.
//!
//! Every failure inside the hook (unreadable state, unwritable state,
//! missing transcript) resolves towards allowing the stop.

use crate::config::HookSettings;
use crate::evidence::{EvidenceReport, EvidenceScanner};
use crate::hooks::{HookInput, StopOutput};
use crate::state::{self, GateState};
use crate::templates;
use crate::traits::StateStore;
use crate::transcript;
use std::path::Path;
use tera::Context;

/// Session id used when the input carries none.
pub const UNKNOWN_SESSION: &str = "unknown";

/// Configuration for the stop hook.
#[derive(Debug, Clone)]
pub struct StopHookConfig {
    /// Whether the gate runs at all.
    pub enabled: bool,
    /// Let every stop through without touching state.
    pub force_stop: bool,
    /// Blocked stops allowed per session before the gate lets go.
    pub max_continuations: u32,
    /// Package whose validations are required; `None` uses the scanner default.
    pub target_package: Option<String>,
}

impl Default for StopHookConfig {
    fn default() -> Self {
        Self::from_settings(&HookSettings::default())
    }
}

impl StopHookConfig {
    /// Take the stop-gate part of the hook settings.
    #[must_use]
    pub fn from_settings(settings: &HookSettings) -> Self {
        Self {
            enabled: settings.stop_gate_enabled,
            force_stop: settings.force_stop,
            max_continuations: settings.max_continuations,
            target_package: settings.target_package.clone(),
        }
    }
}

/// Why a stop was allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowReason {
    /// `RALPH_FORCE_STOP=true`.
    ForceStop,
    /// The gate is switched off.
    Disabled,
    /// The agent is already continuing because of an earlier block.
    AlreadyContinuing,
    /// The per-session continuation limit was exceeded.
    ContinuationLimit,
    /// No transcript could be read, so nothing can be verified.
    TranscriptUnavailable,
    /// The transcript shows complete, successful validation.
    ValidationPassed,
}

impl AllowReason {
    /// Short identifier for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForceStop => "force_stop",
            Self::Disabled => "disabled",
            Self::AlreadyContinuing => "already_continuing",
            Self::ContinuationLimit => "continuation_limit",
            Self::TranscriptUnavailable => "transcript_unavailable",
            Self::ValidationPassed => "validation_passed",
        }
    }
}

/// Why a stop was blocked, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockCause {
    /// Some required validation never ran.
    MissingValidations,
    /// Recent output contains a failure marker.
    ValidationFailures,
    /// Validations ran but no success marker followed.
    UnconfirmedSuccess,
}

impl BlockCause {
    /// The cause explaining `report`, which must not have passed.
    fn of(report: &EvidenceReport) -> Self {
        if !report.missing_kinds.is_empty() {
            Self::MissingValidations
        } else if report.has_failure_signal {
            Self::ValidationFailures
        } else {
            Self::UnconfirmedSuccess
        }
    }

    const fn template(self) -> &'static str {
        match self {
            Self::MissingValidations => templates::STOP_MISSING_VALIDATIONS,
            Self::ValidationFailures => templates::STOP_VALIDATION_FAILURES,
            Self::UnconfirmedSuccess => templates::STOP_UNCONFIRMED_SUCCESS,
        }
    }

    /// Short identifier for logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MissingValidations => "missing_validations",
            Self::ValidationFailures => "validation_failures",
            Self::UnconfirmedSuccess => "unconfirmed_success",
        }
    }
}

/// The gate's verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopDecision {
    /// The agent may stop.
    Allow(AllowReason),
    /// The agent must keep working.
    Block(BlockCause),
}

/// Result of running the stop hook.
#[derive(Debug, Clone)]
pub struct StopHookResult {
    /// The verdict.
    pub decision: StopDecision,
    /// Guidance for the agent; set exactly when blocking.
    pub reason: Option<String>,
    /// Count stored after this invocation, if state was touched.
    pub continuation_count: Option<u32>,
    /// Evidence found in the transcript, if it was scanned.
    pub report: Option<EvidenceReport>,
    /// Diagnostics for stderr.
    pub messages: Vec<String>,
}

impl StopHookResult {
    /// Create an "allow" result.
    #[must_use]
    pub const fn allow(reason: AllowReason) -> Self {
        Self {
            decision: StopDecision::Allow(reason),
            reason: None,
            continuation_count: None,
            report: None,
            messages: Vec::new(),
        }
    }

    /// Create a "block" result.
    #[must_use]
    pub fn block(cause: BlockCause, reason: impl Into<String>) -> Self {
        Self {
            decision: StopDecision::Block(cause),
            reason: Some(reason.into()),
            continuation_count: None,
            report: None,
            messages: Vec::new(),
        }
    }

    /// Add messages to display.
    #[must_use]
    pub fn with_messages(mut self, msgs: impl IntoIterator<Item = String>) -> Self {
        self.messages.extend(msgs);
        self
    }

    /// Record the stored continuation count.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.continuation_count = Some(count);
        self
    }

    /// Attach the evidence report.
    #[must_use]
    pub fn with_report(mut self, report: EvidenceReport) -> Self {
        self.report = Some(report);
        self
    }

    /// Whether the stop is allowed.
    #[must_use]
    pub const fn allows_stop(&self) -> bool {
        matches!(self.decision, StopDecision::Allow(_))
    }

    /// The JSON the runner expects on stdout, present only when blocking.
    #[must_use]
    pub fn output(&self) -> Option<StopOutput> {
        match self.decision {
            StopDecision::Block(_) => self.reason.as_deref().map(StopOutput::block),
            StopDecision::Allow(_) => None,
        }
    }

    /// Short description of the verdict for logs.
    #[must_use]
    pub fn outcome(&self) -> String {
        match self.decision {
            StopDecision::Allow(reason) => format!("allow:{}", reason.as_str()),
            StopDecision::Block(cause) => format!("block:{}", cause.as_str()),
        }
    }
}

/// Save state, turning a failure into a diagnostic.
fn persist(store: &dyn StateStore, state: &GateState, messages: &mut Vec<String>) {
    if let Err(e) = store.save(state) {
        messages.push(format!("Could not save hook state: {e}"));
    }
}

/// Zero the count, save, and allow.
fn release(
    store: &dyn StateStore,
    mut state: GateState,
    reason: AllowReason,
    mut messages: Vec<String>,
) -> StopHookResult {
    state.reset();
    persist(store, &state, &mut messages);
    StopHookResult::allow(reason).with_count(state.continuation_count).with_messages(messages)
}

fn block_reason(
    cause: BlockCause,
    report: &EvidenceReport,
    scanner: &EvidenceScanner,
    package: &str,
    count: u32,
    max: u32,
) -> String {
    let mut ctx = Context::new();
    ctx.insert("missing", &report.missing_list());
    ctx.insert("commands", &scanner.suggested_command(package));
    let message = templates::render_message(cause.template(), &ctx);
    format!("{message} (Continuation {count}/{max})")
}

/// Run the stop hook.
///
/// State is loaded from and saved to `store`; the transcript named in the
/// input is scanned with `scanner`.
#[must_use]
pub fn run_stop_hook(
    input: &HookInput,
    config: &StopHookConfig,
    scanner: &EvidenceScanner,
    store: &dyn StateStore,
) -> StopHookResult {
    if config.force_stop {
        return StopHookResult::allow(AllowReason::ForceStop);
    }
    if !config.enabled {
        return StopHookResult::allow(AllowReason::Disabled);
    }

    let (mut state, warning) = state::load_or_default(store);
    let mut messages: Vec<String> = warning.into_iter().collect();

    if input.stop_hook_active {
        return release(store, state, AllowReason::AlreadyContinuing, messages);
    }

    let session = input.session_id.as_deref().filter(|s| !s.is_empty()).unwrap_or(UNKNOWN_SESSION);
    state.enter_session(session);
    state.increment();
    persist(store, &state, &mut messages);

    let count = state.continuation_count;
    let max = config.max_continuations;
    if count > max {
        messages.push(format!("Max continuations ({max}) reached, allowing stop"));
        return release(store, state, AllowReason::ContinuationLimit, messages);
    }

    let transcript = match input.transcript_path.as_deref().filter(|p| !p.is_empty()) {
        Some(path) => match transcript::read_transcript(Path::new(path)) {
            Ok(text) => text,
            Err(e) => {
                messages.push(format!("Error reading transcript: {e}"));
                return release(store, state, AllowReason::TranscriptUnavailable, messages);
            }
        },
        None => return release(store, state, AllowReason::TranscriptUnavailable, messages),
    };

    let package = config.target_package.as_deref().unwrap_or_else(|| scanner.default_package());
    let report = scanner.scan(&transcript, package);

    if report.passed {
        return release(store, state, AllowReason::ValidationPassed, messages)
            .with_report(report);
    }

    let cause = BlockCause::of(&report);
    let reason = block_reason(cause, &report, scanner, package, count, max);
    StopHookResult::block(cause, reason).with_count(count).with_report(report).with_messages(messages)
}
