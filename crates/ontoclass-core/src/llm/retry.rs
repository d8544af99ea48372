//! Transient-failure policy for provider calls.
//!
//! A failed call is worth repeating only when the provider might answer
//! differently next time: rate limits, outages, dropped connections.

use crate::error::LlmError;
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Whether repeating the call could succeed.
pub fn is_retryable(error: &LlmError) -> bool {
    if error.timed_out || error.transient {
        return true;
    }
    matches!(error.status_code, Some(status) if status == 429 || (500..600).contains(&status))
}

/// Delay before the retry that follows failed attempt number `attempt` (0-based).
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(base_delay_ms.saturating_mul(factor)).min(MAX_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overload_and_rate_limit_retry() {
        for status in [429, 500, 502, 503, 529] {
            let err = LlmError::http(status, format!("HTTP {status}"));
            assert!(is_retryable(&err), "status {status} should retry");
        }
        assert!(is_retryable(&LlmError::timeout(300_000)));
    }

    #[test]
    fn test_client_errors_do_not_retry() {
        for status in [400, 401, 403, 404] {
            assert!(!is_retryable(&LlmError::http(status, "rejected")));
        }
    }

    #[test]
    fn test_transport_flag_decides_status_free_errors() {
        let dropped = LlmError {
            transient: true,
            ..LlmError::new("OpenAI request failed: error sending request")
        };
        assert!(is_retryable(&dropped));
        // message text is never consulted
        assert!(!is_retryable(&LlmError::new("error trying to connect: 503")));
    }

    #[test]
    fn test_backoff_doubles_from_base() {
        let delays: Vec<u64> = (0..4)
            .map(|n| backoff_duration(n, 250).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![250, 500, 1_000, 2_000]);
    }

    #[test]
    fn test_backoff_never_exceeds_cap() {
        assert_eq!(backoff_duration(7, 1_000), MAX_BACKOFF);
        assert_eq!(backoff_duration(64, 1_000), MAX_BACKOFF);
    }
}
