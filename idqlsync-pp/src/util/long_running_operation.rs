/*
    Copyright 2025 MydriaTech AB

    Licensed under the Apache License 2.0 with Free world makers exception
    1.0.0 (the "License"); you may not use this file except in compliance with
    the License. You should have obtained a copy of the License with the source
    or binary distribution in file named

        LICENSE-Apache-2.0-with-FWM-Exception-1.0.0

    Unless required by applicable law or agreed to in writing, software
    distributed under the License is distributed on an "AS IS" BASIS,
    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
    See the License for the specific language governing permissions and
    limitations under the License.
*/

//! Polling of remote long-running operations.

use crate::policy::PolicyError;
use crate::policy::PolicyErrorKind;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Status reported by a remote operation when polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationStatus<T> {
    /// Still running.
    InProgress,
    /// Completed with a result.
    Succeeded(T),
    /// Failed or cancelled remotely.
    Failed {
        /// HTTP status of the response reporting the failure, if any.
        http_status: Option<u16>,
    },
}

/// A started remote operation that can be asked for its status.
#[async_trait::async_trait]
pub trait LongRunningOperation<T>: Send {
    /// Fetch the current status of the operation.
    async fn poll(&mut self) -> Result<OperationStatus<T>, PolicyError>;
}

/// Started operation or `None` when there was nothing to start.
pub type StartedOperation<T> = Option<Box<dyn LongRunningOperation<T>>>;

/// Future returned when an operation is started.
pub type BeginOperationFuture<T> = BoxFuture<'static, Result<StartedOperation<T>, PolicyError>>;

/// State of a [LongRunningOperationPoller].
pub enum PollState<T> {
    /// The operation has not been started yet.
    NotStarted,
    /// The operation is running.
    Polling {
        /// The started operation.
        operation: Box<dyn LongRunningOperation<T>>,
        /// Number of completed status polls.
        polls: usize,
    },
    /// Terminal: the operation completed. `None` if nothing was started.
    Done(Option<T>),
    /// Terminal: the operation could not be started or failed.
    Failed(PolicyError),
}

impl<T> PollState<T> {
    /// Return `true` for [PollState::Done] and [PollState::Failed].
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/** Drives a remote operation from start to completion.

The `begin` factory starts the operation and is invoked exactly once. Each call
to [Self::poll] performs a single state transition:

```text
NotStarted --begin--> Polling | Done(None) | Failed
Polling ----status--> Polling | Done(Some) | Failed
```
*/
pub struct LongRunningOperationPoller<T, F>
where
    F: FnOnce() -> BeginOperationFuture<T> + Send,
{
    begin: Option<F>,
    state: PollState<T>,
}

impl<T, F> LongRunningOperationPoller<T, F>
where
    T: Send + 'static,
    F: FnOnce() -> BeginOperationFuture<T> + Send,
{
    /// Return a new instance that will start the operation using `begin`.
    pub fn new(begin: F) -> Self {
        Self {
            begin: Some(begin),
            state: PollState::NotStarted,
        }
    }

    /// Current state.
    pub fn state(&self) -> &PollState<T> {
        &self.state
    }

    /// Perform a single state transition.
    ///
    /// Terminal states are left as is.
    pub async fn poll(&mut self) -> &PollState<T> {
        let state = std::mem::replace(&mut self.state, PollState::NotStarted);
        self.state = match state {
            PollState::NotStarted => match self.begin.take() {
                Some(begin) => match begin().await {
                    Ok(Some(operation)) => PollState::Polling {
                        operation,
                        polls: 0,
                    },
                    Ok(None) => PollState::Done(None),
                    Err(e) => PollState::Failed(e),
                },
                None => PollState::Failed(
                    PolicyErrorKind::Unspecified.error_with_msg("Operation was already started."),
                ),
            },
            PollState::Polling {
                mut operation,
                polls,
            } => match operation.poll().await {
                Ok(OperationStatus::InProgress) => PollState::Polling {
                    operation,
                    polls: polls + 1,
                },
                Ok(OperationStatus::Succeeded(result)) => PollState::Done(Some(result)),
                Ok(OperationStatus::Failed { http_status }) => {
                    PollState::Failed(Self::failure(polls, http_status))
                }
                Err(e) => PollState::Failed(e),
            },
            terminal => terminal,
        };
        &self.state
    }

    fn failure(polls: usize, http_status: Option<u16>) -> PolicyError {
        match http_status {
            Some(http_status) if polls > 0 => PolicyErrorKind::OperationFailed
                .error_with_msg(format!("operation failed with HTTP status {http_status}")),
            _ => PolicyErrorKind::OperationFailed.error_with_msg("operation failed or was cancelled"),
        }
    }

    /** Start the operation and poll it every `poll_frequency` until it
    completes.

    There is no overall deadline. Use `cancel` to stop waiting.

    Returns `None` if starting the operation yielded nothing to wait for.
    */
    pub async fn poll_for_result(
        mut self,
        cancel: &CancellationToken,
        poll_frequency: Duration,
    ) -> Result<Option<T>, PolicyError> {
        if cancel.is_cancelled() {
            Err(PolicyErrorKind::Cancelled.error_with_msg("Cancelled before operation start."))?;
        }
        // Start and check the first response right away
        self.poll().await;
        if matches!(self.state, PollState::Polling { .. }) {
            self.poll().await;
        }
        while !self.state.is_terminal() {
            tokio::select! {
                _ = cancel.cancelled() => {
                    Err(PolicyErrorKind::Cancelled.error_with_msg("Cancelled while polling operation."))?;
                },
                _ = tokio::time::sleep(poll_frequency) => {},
            }
            self.poll().await;
        }
        match self.state {
            PollState::Done(result) => Ok(result),
            PollState::Failed(e) => Err(e),
            _ => Err(PolicyErrorKind::Unspecified.error_with_msg("Polling ended in a non-terminal state.")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    struct ScriptedOperation {
        statuses: VecDeque<OperationStatus<u32>>,
        polls: Arc<AtomicUsize>,
    }

    #[async_trait::async_trait]
    impl LongRunningOperation<u32> for ScriptedOperation {
        async fn poll(&mut self) -> Result<OperationStatus<u32>, PolicyError> {
            self.polls.fetch_add(1, Ordering::Relaxed);
            self.statuses.pop_front().ok_or_else(|| {
                PolicyErrorKind::BackendCommunication.error_with_msg("script exhausted")
            })
        }
    }

    fn scripted(
        statuses: Vec<OperationStatus<u32>>,
        polls: &Arc<AtomicUsize>,
    ) -> impl FnOnce() -> BeginOperationFuture<u32> + Send + use<> {
        let polls = Arc::clone(polls);
        move || {
            async move {
                Ok(Some(Box::new(ScriptedOperation {
                    statuses: VecDeque::from(statuses),
                    polls,
                }) as Box<dyn LongRunningOperation<u32>>))
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn polls_until_done() {
        let polls = Arc::new(AtomicUsize::default());
        let poller = LongRunningOperationPoller::new(scripted(
            vec![
                OperationStatus::InProgress,
                OperationStatus::InProgress,
                OperationStatus::Succeeded(42),
            ],
            &polls,
        ));
        let result = poller
            .poll_for_result(&CancellationToken::new(), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(result, Some(42));
        assert_eq!(polls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn begin_failure_is_returned_without_polling() {
        let poller = LongRunningOperationPoller::<u32, _>::new(|| {
            async { Err(PolicyErrorKind::BackendCommunication.error_with_msg("refused")) }.boxed()
        });
        let e = poller
            .poll_for_result(&CancellationToken::new(), Duration::from_millis(1))
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::BackendCommunication);
    }

    #[tokio::test]
    async fn nothing_started() {
        let poller = LongRunningOperationPoller::<u32, _>::new(|| async { Ok(None) }.boxed());
        let result = poller
            .poll_for_result(&CancellationToken::new(), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn failed_first_response() {
        let polls = Arc::new(AtomicUsize::default());
        let poller = LongRunningOperationPoller::new(scripted(
            vec![OperationStatus::Failed {
                http_status: Some(400),
            }],
            &polls,
        ));
        let e = poller
            .poll_for_result(&CancellationToken::new(), Duration::from_millis(1))
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::OperationFailed);
        assert!(e.to_string().contains("operation failed or was cancelled"));
    }

    #[tokio::test]
    async fn failed_later_response_carries_status() {
        let polls = Arc::new(AtomicUsize::default());
        let poller = LongRunningOperationPoller::new(scripted(
            vec![
                OperationStatus::InProgress,
                OperationStatus::Failed {
                    http_status: Some(409),
                },
            ],
            &polls,
        ));
        let e = poller
            .poll_for_result(&CancellationToken::new(), Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(e.to_string().contains("409"));
    }

    #[tokio::test]
    async fn cancellation_stops_polling() {
        let polls = Arc::new(AtomicUsize::default());
        let poller = LongRunningOperationPoller::new(scripted(
            vec![OperationStatus::InProgress; 16],
            &polls,
        ));
        let cancel = CancellationToken::new();
        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let e = poller
            .poll_for_result(&cancel, Duration::from_secs(3600))
            .await
            .unwrap_err();
        assert_eq!(e.kind(), &PolicyErrorKind::Cancelled);
        assert_eq!(polls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn single_transitions() {
        let polls = Arc::new(AtomicUsize::default());
        let mut poller = LongRunningOperationPoller::new(scripted(
            vec![OperationStatus::InProgress, OperationStatus::Succeeded(7)],
            &polls,
        ));
        assert!(matches!(poller.state(), PollState::NotStarted));
        assert!(matches!(poller.poll().await, PollState::Polling { polls: 0, .. }));
        assert!(matches!(poller.poll().await, PollState::Polling { polls: 1, .. }));
        assert!(matches!(poller.poll().await, PollState::Done(Some(7))));
        assert!(matches!(poller.poll().await, PollState::Done(Some(7))));
    }
}
