//! Query payment negotiation
//!
//! A paid query carries a transfer from the operator to the node answering
//! it. Unless the caller fixed the amount, the cost is learned first with a
//! cost-only probe and checked against the maximum the caller is willing to
//! pay. A probe above the maximum ends the query without a second call.

use super::{CostExecution, Query, QueryData, QueryExecution};
use crate::cancel::CancellationToken;
use crate::execute;
use crate::signing;
use crate::Client;
use hedera_core::proto::{CryptoTransferBody, ResponseType, SignedTransaction, TransactionBody, TransactionData};
use hedera_core::{AccountId, Hbar, HbarTransfer, HederaError, Key, Result, TransactionId};
use tracing::debug;

/// Amount and identity of a query payment
///
/// The payment is addressed to whichever node answers, so the signed
/// transfer itself is built per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentPlan {
    /// Identity of the payment transfer
    pub transaction_id: TransactionId,
    /// Amount moved from the operator to the node
    pub amount: Hbar,
}

impl PaymentPlan {
    /// Plan paying `amount` from the client's operator
    pub fn new(client: &Client, amount: Hbar) -> Result<Self> {
        Ok(Self {
            transaction_id: client.generate_transaction_id()?,
            amount,
        })
    }

    /// Signed transfer paying `node`
    pub fn transaction_for(&self, client: &Client, node: AccountId) -> Result<SignedTransaction> {
        let operator = client.require_operator("pay for a query")?;
        let body = TransactionBody {
            transaction_id: self.transaction_id,
            node_account_id: node,
            transaction_fee: client.default_max_transaction_fee(),
            transaction_valid_duration_secs: crate::transaction::DEFAULT_TRANSACTION_VALID_DURATION
                .as_secs(),
            memo: String::new(),
            data: TransactionData::CryptoTransfer(CryptoTransferBody {
                hbar_transfers: vec![
                    HbarTransfer {
                        account_id: operator.account_id,
                        amount: -self.amount,
                    },
                    HbarTransfer {
                        account_id: node,
                        amount: self.amount,
                    },
                ],
                nft_transfers: Vec::new(),
            }),
        };

        signing::sign_body(
            &body,
            std::slice::from_ref(&operator.signer),
            &[Key::Single(operator.public_key())],
        )
    }
}

/// Cost of answering `query`, learned from a cost-only probe
pub async fn probe_cost<D: QueryData>(
    query: &Query<D>,
    client: &Client,
    cancel: Option<&CancellationToken>,
) -> Result<Hbar> {
    let payment = if query.data.is_paid() {
        Some(PaymentPlan::new(client, Hbar::ZERO)?)
    } else {
        None
    };
    let probe = CostExecution(QueryExecution {
        query,
        response_type: ResponseType::CostAnswer,
        payment,
    });
    execute::execute(client, &probe, cancel).await
}

/// Amount to attach to the real query
pub async fn negotiate<D: QueryData>(
    query: &Query<D>,
    client: &Client,
    cancel: Option<&CancellationToken>,
) -> Result<Hbar> {
    if let Some(fixed) = query.payment {
        return Ok(fixed);
    }

    let maximum = query
        .max_query_payment
        .unwrap_or_else(|| client.max_query_payment());
    let cost = probe_cost(query, client, cancel).await?;

    if cost < Hbar::ZERO {
        return Err(HederaError::serialization(format!(
            "node reported a negative query cost: {cost}"
        )));
    }
    if cost > maximum {
        return Err(HederaError::PaymentExceedsMaximum { cost, maximum });
    }

    debug!(%cost, %maximum, "Query cost negotiated");
    Ok(cost)
}
