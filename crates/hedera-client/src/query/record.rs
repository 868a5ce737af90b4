//! Transaction record lookup

use super::{unexpected_answer, Query, QueryData};
use crate::execute::{precheck_outcome, Outcome};
use hedera_core::proto::{self, QueryAnswer, Response};
use hedera_core::{HederaError, Result, Status, TransactionId, TransactionRecord};

/// Fetches the full record of a transaction; paid
pub type TransactionRecordQuery = Query<TransactionRecordData>;

/// Question asked by a [`TransactionRecordQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRecordData {
    transaction_id: Option<TransactionId>,
}

impl QueryData for TransactionRecordData {
    type Response = TransactionRecord;

    fn to_query_data(&self) -> Result<proto::QueryData> {
        let transaction_id = self
            .transaction_id
            .ok_or_else(|| HederaError::invalid("record query without a transaction id"))?;
        Ok(proto::QueryData::TransactionGetRecord { transaction_id })
    }

    fn transaction_id(&self) -> Option<TransactionId> {
        self.transaction_id
    }

    /// Records become visible shortly after receipts; keep asking until then.
    fn classify(&self, status: Status) -> Outcome {
        match status {
            Status::RecordNotFound => Outcome::RetryableFailure,
            other => precheck_outcome(other),
        }
    }

    fn make_response(&self, response: Response) -> Result<TransactionRecord> {
        let precheck = response.precheck();
        match response.into_answer() {
            Some(QueryAnswer::Record(record)) => Ok(record),
            _ => Err(unexpected_answer("record", precheck)),
        }
    }
}

impl Query<TransactionRecordData> {
    /// Record lookup for `transaction_id`
    pub fn for_transaction(transaction_id: TransactionId) -> Self {
        let mut query = Self::new();
        query.data_mut().transaction_id = Some(transaction_id);
        query
    }
}
