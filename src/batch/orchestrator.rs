//! Lazy batch classification with a deferred retry pass.
//!
//! A [`ClassificationBatch`] classifies one item per call to
//! [`next`](ClassificationBatch::next). The first pass walks the input in
//! order. Under the `retry-last` policy, items that come back empty are set
//! aside instead of failing the batch; once the input is exhausted they are
//! retried in rounds, with one `retry_delay` wait per round, until each either
//! succeeds or runs out of attempts. Any other error ends the batch.

use std::collections::VecDeque;
use std::mem;

use futures_util::Stream;
use indicatif::ProgressBar;
use tracing::{debug, info, warn};

use crate::classify::{ClassifyError, ClassyFireClient, EmptyClassificationPolicy};
use crate::progress::batch_spinner;

use super::steps::BatchStep;

type Input<'a, T> = Box<dyn Iterator<Item = Result<T, ClassifyError>> + Send + 'a>;

enum Phase {
    /// Walking the input in order.
    FirstPass,
    /// Working through deferred items, round by round.
    Retrying,
    /// Input and retries exhausted, or a terminal error was returned.
    Done,
}

/// Lazily classified sequence.
///
/// Successes are yielded as soon as they are classified: first-pass results
/// in input order, retried results in the order they come up within their
/// round. After the first error, or once everything is yielded, `next`
/// returns `None`.
pub struct ClassificationBatch<'a, S: BatchStep> {
    client: &'a ClassyFireClient,
    step: S,
    input: Input<'a, S::Item>,
    phase: Phase,
    /// Items to retry in the current round, with their attempt number.
    current_round: VecDeque<(S::Item, u32)>,
    /// Items deferred to the next round.
    next_round: Vec<(S::Item, u32)>,
    round: u32,
    yielded: usize,
    progress: ProgressBar,
}

impl<S: BatchStep> std::fmt::Debug for ClassificationBatch<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassificationBatch")
            .field("label", &self.step.label())
            .field("round", &self.round)
            .field("yielded", &self.yielded)
            .field(
                "pending_retries",
                &(self.current_round.len() + self.next_round.len()),
            )
            .finish_non_exhaustive()
    }
}

impl<'a, S> ClassificationBatch<'a, S>
where
    S: BatchStep + 'a,
{
    pub(crate) fn new(
        client: &'a ClassyFireClient,
        step: S,
        input: impl Iterator<Item = Result<S::Item, ClassifyError>> + Send + 'a,
    ) -> Self {
        let progress = batch_spinner(client.config().verbose);
        Self {
            client,
            step,
            input: Box::new(input),
            phase: Phase::FirstPass,
            current_round: VecDeque::new(),
            next_round: Vec::new(),
            round: 0,
            yielded: 0,
            progress,
        }
    }

    /// Number of items currently waiting for a retry.
    #[must_use]
    pub fn pending_retries(&self) -> usize {
        self.current_round.len() + self.next_round.len()
    }

    /// Number of completed retry rounds, including the one in progress.
    #[must_use]
    pub fn retry_rounds(&self) -> u32 {
        self.round
    }

    /// Classifies and returns the next item.
    ///
    /// Returns `None` once the batch is exhausted or after an error.
    pub async fn next(&mut self) -> Option<Result<S::Output, ClassifyError>> {
        loop {
            match self.phase {
                Phase::Done => return None,
                Phase::FirstPass => {
                    let Some(item) = self.input.next() else {
                        self.phase = Phase::Retrying;
                        continue;
                    };
                    let item = match item {
                        Ok(item) => item,
                        Err(error) => return Some(Err(self.fail(error))),
                    };

                    match self.step.classify(self.client, &item).await {
                        Ok(output) => return Some(Ok(self.succeed(output))),
                        Err(error) if self.defers(&error) => {
                            debug!(error = %error, "deferring item to retry pass");
                            self.next_round.push((item, 1));
                        }
                        Err(error) => return Some(Err(self.fail(error))),
                    }
                }
                Phase::Retrying => {
                    if self.current_round.is_empty() {
                        if self.next_round.is_empty() {
                            self.finish();
                            return None;
                        }
                        self.start_round().await;
                    }
                    let Some((item, attempt)) = self.current_round.pop_front() else {
                        continue;
                    };

                    match self.step.classify(self.client, &item).await {
                        Ok(output) => return Some(Ok(self.succeed(output))),
                        Err(error)
                            if error.is_empty_classification()
                                && attempt < self.client.config().max_attempts =>
                        {
                            debug!(attempt, error = %error, "still empty, deferring again");
                            self.next_round.push((item, attempt + 1));
                        }
                        Err(error) => {
                            if error.is_empty_classification() {
                                warn!(
                                    attempts = attempt,
                                    error = %error,
                                    "giving up on empty classification"
                                );
                            }
                            return Some(Err(self.fail(error)));
                        }
                    }
                }
            }
        }
    }

    fn defers(&self, error: &ClassifyError) -> bool {
        self.client.config().policy == EmptyClassificationPolicy::RetryLast
            && error.is_empty_classification()
    }

    async fn start_round(&mut self) {
        self.round += 1;
        info!(
            round = self.round,
            pending = self.next_round.len(),
            label = self.step.label(),
            "retrying empty classifications"
        );
        self.progress.set_message(format!(
            "Retry round {} for {} {}",
            self.round,
            self.next_round.len(),
            self.step.label()
        ));
        self.client.wait_before_retry().await;
        self.current_round = mem::take(&mut self.next_round).into();
    }

    fn succeed(&mut self, output: S::Output) -> S::Output {
        self.yielded += 1;
        self.progress.set_message(format!(
            "[{}] Classified {}",
            self.yielded,
            self.step.label()
        ));
        output
    }

    fn fail(&mut self, error: ClassifyError) -> ClassifyError {
        self.finish();
        error
    }

    fn finish(&mut self) {
        self.phase = Phase::Done;
        self.current_round.clear();
        self.next_round.clear();
        self.progress.finish_and_clear();
    }

    /// Converts the batch into a [`Stream`] of results.
    pub fn into_stream(self) -> impl Stream<Item = Result<S::Output, ClassifyError>> + 'a {
        futures_util::stream::unfold(self, |mut batch| async move {
            batch.next().await.map(|result| (result, batch))
        })
    }

    /// Classifies everything, stopping at the first error.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the batch.
    pub async fn try_collect(mut self) -> Result<Vec<S::Output>, ClassifyError> {
        let mut outputs = Vec::new();
        while let Some(result) = self.next().await {
            outputs.push(result?);
        }
        Ok(outputs)
    }
}
