//! Publisher: serialize the final dataset and hand it to a sink with
//! fixed-delay retry. Each publish is a full replace.

use super::artifact::{write_artifact, ArtifactError};
use crate::data::{ArtifactSink, RetryPolicy};
use crate::domain::OutputRecord;
use serde::{Deserialize, Serialize};

/// Outcome of one publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishOutcome {
    Published {
        attempts: u32,
        bytes: usize,
        /// blake3 hex digest of the published bytes.
        content_hash: String,
    },
    Failed {
        attempts: u32,
        error: String,
    },
}

impl PublishOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PublishOutcome::Published { attempts, .. } | PublishOutcome::Failed { attempts, .. } => {
                *attempts
            }
        }
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

pub struct Publisher<'a> {
    sink: &'a dyn ArtifactSink,
    policy: RetryPolicy,
}

impl<'a> Publisher<'a> {
    pub fn new(sink: &'a dyn ArtifactSink, policy: RetryPolicy) -> Self {
        Self { sink, policy }
    }

    /// Serialize and publish `records`.
    ///
    /// Serialization failure is returned as an error; sink failures are
    /// retried and reported through the outcome.
    pub fn publish(&self, records: &[OutputRecord]) -> Result<PublishOutcome, ArtifactError> {
        let bytes = write_artifact(records)?;
        Ok(self.publish_bytes(&bytes))
    }

    pub fn publish_bytes(&self, bytes: &[u8]) -> PublishOutcome {
        let label = format!("publish:{}", self.sink.name());
        match self.policy.run(&label, |_| self.sink.write(bytes)) {
            Ok(((), attempts)) => {
                let hash = content_hash(bytes);
                tracing::info!(
                    sink = self.sink.name(),
                    attempts,
                    bytes = bytes.len(),
                    hash = %hash,
                    "published artifact"
                );
                PublishOutcome::Published {
                    attempts,
                    bytes: bytes.len(),
                    content_hash: hash,
                }
            }
            Err(exhausted) => {
                tracing::error!(
                    sink = self.sink.name(),
                    attempts = exhausted.attempts,
                    error = %exhausted.last_error,
                    "publish failed"
                );
                PublishOutcome::Failed {
                    attempts: exhausted.attempts,
                    error: exhausted.last_error.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SourceError;
    use std::cell::{Cell, RefCell};

    struct FlakySink {
        failures: Cell<u32>,
        written: RefCell<Vec<Vec<u8>>>,
    }

    impl FlakySink {
        fn failing(n: u32) -> Self {
            Self {
                failures: Cell::new(n),
                written: RefCell::new(Vec::new()),
            }
        }
    }

    impl ArtifactSink for FlakySink {
        fn name(&self) -> &str {
            "flaky"
        }

        fn write(&self, bytes: &[u8]) -> Result<(), SourceError> {
            if self.failures.get() > 0 {
                self.failures.set(self.failures.get() - 1);
                return Err(SourceError::NetworkUnreachable("down".into()));
            }
            self.written.borrow_mut().push(bytes.to_vec());
            Ok(())
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let sink = FlakySink::failing(2);
        let outcome = Publisher::new(&sink, RetryPolicy::immediate(3)).publish(&[]).unwrap();
        assert!(outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
        assert_eq!(sink.written.borrow().len(), 1);
    }

    #[test]
    fn fails_after_exhausting_attempts() {
        let sink = FlakySink::failing(5);
        let outcome = Publisher::new(&sink, RetryPolicy::immediate(3)).publish(&[]).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.attempts(), 3);
        assert!(sink.written.borrow().is_empty());
    }

    #[test]
    fn hash_matches_written_bytes() {
        let sink = FlakySink::failing(0);
        let outcome = Publisher::new(&sink, RetryPolicy::immediate(1)).publish_bytes(b"x,y\n");
        match outcome {
            PublishOutcome::Published { content_hash: h, bytes, .. } => {
                assert_eq!(h, content_hash(b"x,y\n"));
                assert_eq!(bytes, 4);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
