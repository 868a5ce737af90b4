//! Execution engine
//!
//! Every transaction and query goes through [`execute`]. One call drives a
//! single logical operation through repeated attempts:
//!
//! 1. pick a node from the registry, waiting out its backoff if every
//!    candidate is backed off
//! 2. let the operation build and sign the request for that node
//! 3. send it on the node's channel, bounded by the per-attempt deadline
//! 4. classify the precheck status and report it to the registry
//!
//! Accepted responses go back to the operation. Fatal statuses surface as
//! [`HederaError::PrecheckRejected`] on the attempt that saw them. Retryable
//! failures are absorbed until the attempt or time budget runs out, at which
//! point [`HederaError::DeadlineExceeded`] carries the last one.

mod outcome;

pub use outcome::{precheck_outcome, Outcome};

use crate::cancel::{cancellable, CancellationToken};
use crate::network::NodeSelection;
use crate::Client;
use hedera_core::proto::{self, Request, Response};
use hedera_core::{AccountId, HederaError, Result, Status, TransactionId};
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

/// An operation the engine knows how to drive
///
/// Implementations describe one transaction or query: where it may go,
/// how to build its request for a given node, and how to read the answer.
/// They never deal with retries themselves.
pub trait Execute: Sync {
    /// Value produced from an accepted response
    type Output;

    /// Nodes this operation may be sent to
    fn node_selection(&self) -> NodeSelection;

    /// Attempt cap overriding the client's
    fn max_attempts(&self) -> Option<u32> {
        None
    }

    /// Overall time budget overriding the client's
    fn request_timeout(&self) -> Option<Duration> {
        None
    }

    /// Identity carried by the request, used for error context
    fn transaction_id(&self) -> Option<TransactionId> {
        None
    }

    /// Build the request addressed to `node`
    fn make_request(&self, client: &Client, node: AccountId) -> Result<Request>;

    /// Classify the precheck status of `response`
    fn classify(&self, status: Status, _response: &Response) -> Outcome {
        precheck_outcome(status)
    }

    /// Turn an accepted response into the operation's output
    fn make_response(&self, response: Response, node: AccountId) -> Result<Self::Output>;
}

/// Drive `operation` to acceptance, a fatal status or budget exhaustion
pub async fn execute<E>(
    client: &Client,
    operation: &E,
    cancel: Option<&CancellationToken>,
) -> Result<E::Output>
where
    E: Execute + ?Sized,
{
    let max_attempts = operation
        .max_attempts()
        .unwrap_or_else(|| client.max_attempts())
        .max(1);
    let timeout = operation
        .request_timeout()
        .unwrap_or_else(|| client.request_timeout());
    let deadline = Instant::now() + timeout;

    let selection = operation.node_selection();
    let transaction_id = operation.transaction_id();
    let registry = client.registry();
    let rotate = registry.candidate_count(&selection) > 1;

    let mut attempts = 0u32;
    let mut last_error: Option<HederaError> = None;
    let mut exclude = HashSet::new();

    loop {
        if attempts >= max_attempts || Instant::now() >= deadline {
            return Err(deadline_exceeded(attempts, last_error));
        }

        let selected = registry.select(&selection, &exclude)?;
        if !selected.wait.is_zero() {
            if Instant::now() + selected.wait >= deadline {
                return Err(deadline_exceeded(attempts, last_error));
            }
            cancellable(cancel, tokio::time::sleep(selected.wait)).await?;
        }

        let node = selected.node;
        let node_id = node.account_id();
        attempts += 1;

        let request = operation.make_request(client, node_id)?;
        let bytes = proto::encode(&request)?;

        debug!(
            node = %node_id,
            attempt = attempts,
            transaction_id = ?transaction_id,
            "Sending request"
        );

        let remaining = deadline.saturating_duration_since(Instant::now());
        let attempt_deadline = client.grpc_deadline().min(remaining);
        let result = cancellable(cancel, async {
            let channels = client.channels();
            let channel = channels.channel_for(&node).await?;
            let failure = match tokio::time::timeout(attempt_deadline, channel.call(bytes)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(err)) => as_transport(node_id, err),
                Err(_) => HederaError::transport(node_id, "attempt deadline elapsed"),
            };
            channels.evict(&node, &channel);
            Err(failure)
        })
        .await?;

        let (outcome, failure) = match result.and_then(|bytes| decode_response(node_id, &bytes)) {
            Ok(response) => {
                let status = response.precheck();
                match operation.classify(status, &response) {
                    Outcome::Accepted => {
                        registry.report(&node, &Outcome::Accepted);
                        debug!(node = %node_id, attempt = attempts, %status, "Request accepted");
                        return operation.make_response(response, node_id);
                    }
                    Outcome::FatalFailure => {
                        registry.report(&node, &Outcome::FatalFailure);
                        debug!(node = %node_id, %status, "Request rejected at precheck");
                        return Err(HederaError::PrecheckRejected {
                            status,
                            node: node_id,
                            transaction_id,
                        });
                    }
                    Outcome::RetryableFailure => (
                        Outcome::RetryableFailure,
                        HederaError::RetryablePrecheck {
                            status,
                            node: node_id,
                            transaction_id,
                        },
                    ),
                }
            }
            Err(err) => (Outcome::RetryableFailure, err),
        };

        let backoff = registry.report(&node, &outcome);
        warn!(
            node = %node_id,
            attempt = attempts,
            error = %failure,
            backoff_ms = backoff.as_millis() as u64,
            "Attempt failed, retrying"
        );
        last_error = Some(failure);

        exclude.clear();
        if rotate {
            exclude.insert(node_id);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if attempts < max_attempts && !remaining.is_zero() {
            cancellable(cancel, tokio::time::sleep(backoff.min(remaining))).await?;
        }
    }
}

fn deadline_exceeded(attempts: u32, last: Option<HederaError>) -> HederaError {
    HederaError::DeadlineExceeded {
        attempts,
        last: last.map(Box::new),
    }
}

fn as_transport(node: AccountId, err: HederaError) -> HederaError {
    match err {
        err @ HederaError::Transport { .. } => err,
        other => HederaError::transport(node, other.to_string()),
    }
}

fn decode_response(node: AccountId, bytes: &[u8]) -> Result<Response> {
    proto::decode(bytes)
        .map_err(|err| HederaError::transport(node, format!("malformed response: {err}")))
}
