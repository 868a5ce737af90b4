//! Free account balance query

use super::{unexpected_answer, Query, QueryData};
use hedera_core::proto::{self, QueryAnswer, Response};
use hedera_core::{AccountId, Hbar, HederaError, Result};

/// Reads an account's hbar balance; free
pub type AccountBalanceQuery = Query<AccountBalanceData>;

/// Balance of one account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountBalance {
    /// Account looked up
    pub account_id: AccountId,
    /// Its hbar balance
    pub hbars: Hbar,
}

/// Question asked by an [`AccountBalanceQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountBalanceData {
    account_id: Option<AccountId>,
}

impl QueryData for AccountBalanceData {
    type Response = AccountBalance;

    fn to_query_data(&self) -> Result<proto::QueryData> {
        let account_id = self
            .account_id
            .ok_or_else(|| HederaError::invalid("balance query without an account id"))?;
        Ok(proto::QueryData::CryptoGetAccountBalance { account_id })
    }

    fn is_paid(&self) -> bool {
        false
    }

    fn make_response(&self, response: Response) -> Result<AccountBalance> {
        let precheck = response.precheck();
        match response.into_answer() {
            Some(QueryAnswer::AccountBalance {
                account_id,
                balance,
            }) => Ok(AccountBalance {
                account_id,
                hbars: balance,
            }),
            _ => Err(unexpected_answer("balance", precheck)),
        }
    }
}

impl Query<AccountBalanceData> {
    /// Account whose balance is read
    pub fn account_id(&mut self, account_id: AccountId) -> &mut Self {
        self.data_mut().account_id = Some(account_id);
        self
    }
}
