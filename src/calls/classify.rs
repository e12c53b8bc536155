//! # Failure classification for opaque call errors.
//!
//! The external call returns an opaque [`CallError`]; the retry loop needs to
//! know whether a failure is worth retrying. [`Classify`] is the pluggable
//! seam: the default [`SignatureClassifier`] inspects the error's display text
//! for rate-limit and transport signatures, which is inherently fragile but is
//! the strongest contract an opaque call offers. Callers whose calls return
//! typed errors should supply their own classifier instead.

use crate::error::{CallError, TaskError};

/// Coarse failure category produced by a classifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The downstream rejected the request for pacing reasons; retryable.
    RateLimited,
    /// Some other transient condition (timeout, transport); retryable.
    Transient,
    /// Not expected to succeed on retry.
    Permanent,
}

impl FailureKind {
    /// True for categories the retry loop may attempt again.
    #[inline]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FailureKind::Permanent)
    }

    /// Converts the category plus the original message into a [`TaskError`].
    pub fn into_task_error(self, message: String) -> TaskError {
        match self {
            FailureKind::RateLimited | FailureKind::Transient => {
                TaskError::Transient { error: message }
            }
            FailureKind::Permanent => TaskError::Permanent { error: message },
        }
    }
}

/// Contract for classifying opaque call errors.
///
/// Implementations must be cheap: the classifier runs on every failed attempt
/// under no lock.
pub trait Classify: Send + Sync + 'static {
    /// Classifies one failure.
    fn classify(&self, error: &CallError) -> FailureKind;
}

/// Default classifier: substring matching on the error's display text.
///
/// Rate-limit signatures ("rate limit", "429", "too many requests", "quota")
/// map to [`FailureKind::RateLimited`]; timeout/transport signatures map to
/// [`FailureKind::Transient`]; anything else is [`FailureKind::Permanent`].
///
/// This mirrors how the harness's original callers detected throttling from
/// opaque subprocess stderr text. It is a heuristic, not a protocol: swap it
/// out via [`Classify`] as soon as the call exposes typed errors.
#[derive(Clone, Copy, Debug, Default)]
pub struct SignatureClassifier;

impl SignatureClassifier {
    const RATE_LIMIT_SIGNATURES: &'static [&'static str] = &[
        "rate limit",
        "rate_limit",
        "ratelimit",
        "429",
        "too many requests",
        "quota",
    ];

    const TRANSIENT_SIGNATURES: &'static [&'static str] = &[
        "timeout",
        "timed out",
        "connection",
        "unavailable",
        "overloaded",
        "temporarily",
        "502",
        "503",
        "529",
    ];
}

impl Classify for SignatureClassifier {
    fn classify(&self, error: &CallError) -> FailureKind {
        let text = error.to_string().to_ascii_lowercase();

        if Self::RATE_LIMIT_SIGNATURES.iter().any(|s| text.contains(s)) {
            return FailureKind::RateLimited;
        }
        if Self::TRANSIENT_SIGNATURES.iter().any(|s| text.contains(s)) {
            return FailureKind::Transient;
        }
        FailureKind::Permanent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(msg: &str) -> FailureKind {
        let err: CallError = msg.into();
        SignatureClassifier.classify(&err)
    }

    #[test]
    fn test_rate_limit_signatures() {
        assert_eq!(classify("HTTP 429 Too Many Requests"), FailureKind::RateLimited);
        assert_eq!(classify("rate limit exceeded, retry later"), FailureKind::RateLimited);
        assert_eq!(classify("monthly quota exhausted"), FailureKind::RateLimited);
    }

    #[test]
    fn test_transient_signatures() {
        assert_eq!(classify("request timed out after 30s"), FailureKind::Transient);
        assert_eq!(classify("connection reset by peer"), FailureKind::Transient);
        assert_eq!(classify("503 Service Unavailable"), FailureKind::Transient);
    }

    #[test]
    fn test_unknown_is_permanent() {
        assert_eq!(classify("invalid api key"), FailureKind::Permanent);
        assert_eq!(classify("malformed request body"), FailureKind::Permanent);
    }

    #[test]
    fn test_retryability_mapping() {
        assert!(FailureKind::RateLimited.is_retryable());
        assert!(FailureKind::Transient.is_retryable());
        assert!(!FailureKind::Permanent.is_retryable());

        let err = FailureKind::Permanent.into_task_error("boom".into());
        assert!(!err.is_retryable());
        let err = FailureKind::RateLimited.into_task_error("429".into());
        assert!(err.is_retryable());
    }
}
