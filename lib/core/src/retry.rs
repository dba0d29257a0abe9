//! Retry with linear backoff for transient storage faults
//!
//! [`with_retry`] runs an async operation up to [`RetryPolicy::max_attempts`]
//! times. A failure is retried only when [`is_transient`] recognises it as a
//! network-level fault; anything else is returned at once.
//!
//! ```text
//! ATTEMPTING --ok--------------------------------> DONE
//! ATTEMPTING --transient, attempts remain--> WAITING --> ATTEMPTING
//! ATTEMPTING --permanent, or last attempt---------> FAILED
//! ```
//!
//! The wait before attempt `k + 1` is `base_delay * k`.

use std::borrow::Cow;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::Error;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(2000);

/// Cause chains deeper than this are not inspected.
pub const MAX_CAUSE_DEPTH: usize = 16;

const TRANSIENT_PATTERNS: [&str; 7] = [
    "timeout",
    "fetch failed",
    "socket",
    "econnreset",
    "terminated",
    "connecttimeouterror",
    "und_err",
];

const TRANSIENT_CODES: [&str; 3] = ["UND_ERR_CONNECT_TIMEOUT", "UND_ERR_SOCKET", "ECONNRESET"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Attempt ceiling; zero is treated as a single attempt.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay after the failed attempt number `attempt` (1-based).
    #[inline]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// What the classifier needs to know about a failure.
pub trait FaultInfo {
    fn fault_message(&self) -> Cow<'_, str>;

    fn fault_code(&self) -> Option<&str> {
        None
    }

    fn fault_cause(&self) -> Option<&dyn FaultInfo> {
        None
    }
}

impl FaultInfo for Error {
    fn fault_message(&self) -> Cow<'_, str> {
        match self {
            Error::Upstream { message, .. } => Cow::Borrowed(message.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }

    fn fault_code(&self) -> Option<&str> {
        match self {
            Error::Upstream { code, .. } => code.as_deref(),
            Error::Io(e) => io_error_code(e),
            _ => None,
        }
    }

    fn fault_cause(&self) -> Option<&dyn FaultInfo> {
        match self {
            Error::Upstream { cause: Some(inner), .. } => Some(&**inner as &dyn FaultInfo),
            _ => None,
        }
    }
}

impl FaultInfo for std::io::Error {
    fn fault_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn fault_code(&self) -> Option<&str> {
        io_error_code(self)
    }
}

fn io_error_code(e: &std::io::Error) -> Option<&'static str> {
    match e.kind() {
        std::io::ErrorKind::ConnectionReset => Some("ECONNRESET"),
        _ => None,
    }
}

fn is_transient_level(fault: &dyn FaultInfo) -> bool {
    let message = fault.fault_message().to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| message.contains(p))
        || fault
            .fault_code()
            .is_some_and(|code| TRANSIENT_CODES.contains(&code))
}

/// Whether `fault`, or anything in its cause chain, looks like a network
/// fault worth retrying.
pub fn is_transient(fault: &dyn FaultInfo) -> bool {
    let mut current = Some(fault);
    let mut depth = 0;
    while let Some(level) = current {
        if depth >= MAX_CAUSE_DEPTH {
            return false;
        }
        if is_transient_level(level) {
            return true;
        }
        current = level.fault_cause();
        depth += 1;
    }
    false
}

/// Run `operation`, retrying transient failures per `policy`.
///
/// The last failure is returned unchanged once attempts run out; a failure
/// that is not transient is returned on the attempt it happened.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: FaultInfo,
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= max_attempts || !is_transient(&err) {
            return Err(err);
        }

        let delay = policy.delay_for(attempt);
        warn!(
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %err.fault_message(),
            "storage operation failed, retrying"
        );
        if let Some(cause) = err.fault_cause() {
            warn!(cause = %cause.fault_message(), "retry cause");
        }

        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}
