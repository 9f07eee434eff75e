//! Primary-then-fallback combinator.
//!
//! Category detection and field extraction both try an AI strategy first and
//! fall back to a deterministic one when it fails, times out, or produces a
//! result the caller will not accept. The combinator owns the timeout and the
//! logging so call sites only describe the two strategies.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Which strategy produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Primary,
    Fallback,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Primary => "primary",
            Strategy::Fallback => "fallback",
        }
    }
}

/// A value together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: Strategy,
}

impl<T> Resolved<T> {
    pub fn primary(value: T) -> Self {
        Self {
            value,
            strategy: Strategy::Primary,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            strategy: Strategy::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.strategy == Strategy::Fallback
    }
}

/// Runs `primary` under `timeout`; uses `fallback` on error, timeout, or
/// when `accept` rejects the primary value.
pub async fn with_fallback<T, E, Fut, A, F>(
    operation: &'static str,
    timeout: Duration,
    primary: Fut,
    accept: A,
    fallback: F,
) -> Resolved<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Display,
    A: FnOnce(&T) -> bool,
    F: FnOnce() -> T,
{
    let reason = match tokio::time::timeout(timeout, primary).await {
        Ok(Ok(value)) => {
            if accept(&value) {
                return Resolved::primary(value);
            }
            "result not accepted".to_string()
        }
        Ok(Err(err)) => err.to_string(),
        Err(_) => format!("timed out after {}ms", timeout.as_millis()),
    };

    tracing::warn!(operation, reason = %reason, "Primary strategy failed, using fallback");
    Resolved::fallback(fallback())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn accepted_primary_wins() {
        let resolved = with_fallback(
            "test",
            LIMIT,
            async { Ok::<_, String>(7) },
            |v| *v > 5,
            || 0,
        )
        .await;
        assert_eq!(resolved, Resolved::primary(7));
    }

    #[tokio::test]
    async fn error_falls_back() {
        let resolved = with_fallback(
            "test",
            LIMIT,
            async { Err::<i32, _>("boom") },
            |_| true,
            || 1,
        )
        .await;
        assert_eq!(resolved, Resolved::fallback(1));
    }

    #[tokio::test]
    async fn rejected_value_falls_back() {
        let resolved = with_fallback(
            "test",
            LIMIT,
            async { Ok::<_, String>(3) },
            |v| *v > 5,
            || 1,
        )
        .await;
        assert!(resolved.is_fallback());
        assert_eq!(resolved.value, 1);
    }

    #[tokio::test]
    async fn slow_primary_times_out() {
        let resolved = with_fallback(
            "test",
            Duration::from_millis(20),
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, String>(9)
            },
            |_| true,
            || 2,
        )
        .await;
        assert_eq!(resolved, Resolved::fallback(2));
    }
}
