//! Generative Call Gateway
//!
//! One logical call to the generative service: bounded retries with backoff, fence stripping,
//! parsing into the schema's canonical struct and structural validation. Every attempt and
//! backoff is bounded by the caller's deadline and cancellation token.

pub mod prompt;
pub mod retry;
pub mod schema;
pub mod transport;

pub use prompt::{PromptKind, PromptSpec};
pub use retry::RetryPolicy;
pub use schema::{PlanSchema, ReportSchema, ReviewSchema, Schema, UnitBatchSchema};
pub use transport::{GenerativeTransport, RawArtifact};

use crate::error::{GatewayError, SchemaViolation, TransportError};
use std::sync::Arc;
use tokio::time::{sleep_until, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why the most recent attempt failed.
enum AttemptFailure {
    Timeout,
    Transport(TransportError),
    Malformed(SchemaViolation),
}

pub struct Gateway {
    transport: Arc<dyn GenerativeTransport>,
    policy: RetryPolicy,
}

impl Gateway {
    pub fn new(transport: Arc<dyn GenerativeTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Obtains one schema-valid artifact or a typed error.
    ///
    /// A reply that parses but fails validation is retried like a transport failure. Statuses
    /// that cannot improve (400, 401, 403, 404) stop immediately. Cancellation and deadline
    /// expiry drop the in-flight call and surface as [`GatewayError::Timeout`].
    pub async fn call<S: Schema>(
        &self,
        prompt: &PromptSpec,
        schema: &S,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<S::Artifact, GatewayError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0u32;
        let mut last_failure = AttemptFailure::Timeout;

        while attempts < max_attempts {
            if cancel.is_cancelled() || Instant::now() >= deadline {
                break;
            }
            attempts += 1;

            let started = Instant::now();
            let attempt_deadline = (started + self.policy.attempt_timeout).min(deadline);
            debug!(
                prompt = %prompt.kind,
                schema = schema.name(),
                transport = self.transport.name(),
                attempt = attempts,
                "Gateway attempt started"
            );

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!(prompt = %prompt.kind, attempt = attempts, "Gateway call cancelled");
                    return Err(GatewayError::Timeout { attempts });
                }
                outcome = timeout_at(
                    attempt_deadline,
                    self.transport.call(prompt, attempt_deadline),
                ) => outcome,
            };

            let duration_ms = started.elapsed().as_millis();
            last_failure = match outcome {
                Err(_elapsed) => AttemptFailure::Timeout,
                Ok(Err(err)) => {
                    if !err.is_retryable() {
                        warn!(
                            prompt = %prompt.kind,
                            attempt = attempts,
                            duration_ms,
                            error = %err,
                            "Gateway call failed with non-retryable error"
                        );
                        return Err(GatewayError::ServiceError {
                            attempts,
                            message: err.to_string(),
                        });
                    }
                    AttemptFailure::Transport(err)
                }
                Ok(Ok(raw)) => match schema::decode(schema, &raw.content) {
                    Ok(artifact) => {
                        info!(
                            prompt = %prompt.kind,
                            schema = schema.name(),
                            attempt = attempts,
                            duration_ms,
                            model = raw.model.as_deref().unwrap_or("unreported"),
                            response_chars = raw.content.chars().count(),
                            "Gateway artifact accepted"
                        );
                        return Ok(artifact);
                    }
                    Err(violation) => AttemptFailure::Malformed(violation),
                },
            };

            warn!(
                prompt = %prompt.kind,
                attempt = attempts,
                max_attempts,
                duration_ms,
                reason = %describe(&last_failure),
                "Gateway attempt failed"
            );

            if attempts < max_attempts {
                let wake = Instant::now() + self.policy.backoff(attempts);
                if wake >= deadline {
                    // No room left for another attempt.
                    break;
                }
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(GatewayError::Timeout { attempts }),
                    _ = sleep_until(wake) => {}
                }
            }
        }

        if attempts < max_attempts {
            // Stopped early by the deadline or cancellation.
            last_failure = AttemptFailure::Timeout;
        }

        Err(match last_failure {
            AttemptFailure::Timeout => GatewayError::Timeout { attempts },
            AttemptFailure::Transport(err) => GatewayError::ServiceError {
                attempts,
                message: err.to_string(),
            },
            AttemptFailure::Malformed(violation) => GatewayError::MalformedReply {
                schema: schema.name().to_string(),
                attempts,
                detail: violation.to_string(),
            },
        })
    }
}

fn describe(failure: &AttemptFailure) -> String {
    match failure {
        AttemptFailure::Timeout => "attempt timed out".to_string(),
        AttemptFailure::Transport(err) => err.to_string(),
        AttemptFailure::Malformed(violation) => violation.to_string(),
    }
}
