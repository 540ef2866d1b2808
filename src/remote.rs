//! Remote word transport
//!
//! A Remote word hands its work to an external collaborator instead of
//! executing locally. The interpreter snapshots the stack, hands it to a
//! [`RemoteTransport`], and on success replaces the stack with whatever the
//! transport returns. On failure the word raises
//! [`ForthicError::RemoteExecutionFailed`](crate::errors::ForthicError::RemoteExecutionFailed).
//!
//! The transport boundary is async (it's expected to be backed by an HTTP
//! call, a queue, a subprocess, or similar) even though `Word::execute`
//! itself is synchronous; `RemoteWord` bridges the two with a `tokio`
//! handle, matching the way the rest of the crate keeps its core dispatch
//! loop sync while reserving async for the true I/O seams.

use crate::literals::ForthicValue;
use async_trait::async_trait;
use std::fmt;

/// A destination a Remote word can call.
///
/// Implementors receive the word's name and a snapshot of the stack (bottom
/// to top) and return the values that should replace the stack on success.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Invoke the remote collaborator for `word_name` with `stack` as input.
    ///
    /// Returning `Err` causes the Remote word to raise
    /// `RemoteExecutionFailed` with the given reason; the caller's stack is
    /// left untouched in that case.
    async fn call(
        &self,
        word_name: &str,
        stack: Vec<ForthicValue>,
    ) -> Result<Vec<ForthicValue>, TransportError>;
}

/// Reason a [`RemoteTransport`] invocation failed.
#[derive(Debug, Clone)]
pub struct TransportError {
    pub reason: String,
}

impl TransportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTransport;

    #[async_trait]
    impl RemoteTransport for EchoTransport {
        async fn call(
            &self,
            _word_name: &str,
            stack: Vec<ForthicValue>,
        ) -> Result<Vec<ForthicValue>, TransportError> {
            Ok(stack)
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl RemoteTransport for FailingTransport {
        async fn call(
            &self,
            _word_name: &str,
            _stack: Vec<ForthicValue>,
        ) -> Result<Vec<ForthicValue>, TransportError> {
            Err(TransportError::new("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_echo_transport() {
        let transport = EchoTransport;
        let result = transport
            .call("SOME-WORD", vec![ForthicValue::Int(1)])
            .await
            .unwrap();
        assert_eq!(result, vec![ForthicValue::Int(1)]);
    }

    #[tokio::test]
    async fn test_failing_transport() {
        let transport = FailingTransport;
        let err = transport.call("SOME-WORD", vec![]).await.unwrap_err();
        assert_eq!(err.reason, "connection refused");
    }
}
