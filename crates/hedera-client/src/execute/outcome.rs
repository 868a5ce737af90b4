//! Precheck classification table

use hedera_core::Status;

/// How a single attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The node took the request; hand the response to the operation
    Accepted,
    /// Transient condition; back off and try again, possibly elsewhere
    RetryableFailure,
    /// Semantic rejection; surface it and never retry
    FatalFailure,
}

/// Statuses meaning the node could not process the request right now
const RETRYABLE: &[Status] = &[
    Status::Busy,
    Status::PlatformTransactionNotCreated,
    Status::PlatformNotActive,
];

/// Statuses meaning the node took the request
const ACCEPTED: &[Status] = &[Status::Ok, Status::Success];

/// Classify a precheck status
///
/// Total over every status: anything outside the two tables, including
/// codes this client does not recognize, is fatal.
pub fn precheck_outcome(status: Status) -> Outcome {
    if ACCEPTED.contains(&status) {
        Outcome::Accepted
    } else if RETRYABLE.contains(&status) {
        Outcome::RetryableFailure
    } else {
        Outcome::FatalFailure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table() {
        assert_eq!(precheck_outcome(Status::Ok), Outcome::Accepted);
        assert_eq!(precheck_outcome(Status::Success), Outcome::Accepted);
        assert_eq!(precheck_outcome(Status::Busy), Outcome::RetryableFailure);
        assert_eq!(precheck_outcome(Status::PlatformNotActive), Outcome::RetryableFailure);
        assert_eq!(precheck_outcome(Status::InvalidSignature), Outcome::FatalFailure);
        assert_eq!(precheck_outcome(Status::InsufficientTxFee), Outcome::FatalFailure);
        assert_eq!(precheck_outcome(Status::TransactionExpired), Outcome::FatalFailure);
    }

    proptest! {
        #[test]
        fn unknown_codes_fail_closed(code in 10_000i32..i32::MAX) {
            prop_assert_eq!(precheck_outcome(Status::from_code(code)), Outcome::FatalFailure);
        }
    }
}
