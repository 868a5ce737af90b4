//! Hbar and NFT transfers

use super::{Transaction, TransactionData};
use hedera_core::proto::{self, ChunkInfo, CryptoTransferBody};
use hedera_core::{AccountId, Hbar, HbarTransfer, TokenId, TokenNftTransfer, TokenNftTransferList};

/// Moves hbar and NFTs between accounts
pub type TransferTransaction = Transaction<TransferData>;

/// Payload of a [`TransferTransaction`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferData {
    hbar_transfers: Vec<HbarTransfer>,
    nft_transfers: Vec<TokenNftTransferList>,
}

impl TransferData {
    /// Net hbar adjustment per account, in insertion order
    pub fn hbar_transfers(&self) -> &[HbarTransfer] {
        &self.hbar_transfers
    }

    /// NFT movements per token
    pub fn nft_transfers(&self) -> &[TokenNftTransferList] {
        &self.nft_transfers
    }
}

impl TransactionData for TransferData {
    fn to_transaction_data(&self, _chunk: Option<&ChunkInfo>) -> proto::TransactionData {
        proto::TransactionData::CryptoTransfer(CryptoTransferBody {
            hbar_transfers: self.hbar_transfers.clone(),
            nft_transfers: self.nft_transfers.clone(),
        })
    }
}

impl Transaction<TransferData> {
    /// Credit (positive) or debit (negative) `account_id`
    ///
    /// Repeated entries for one account are merged.
    pub fn hbar_transfer(&mut self, account_id: AccountId, amount: Hbar) -> &mut Self {
        let transfers = &mut self.data_mut().hbar_transfers;
        match transfers.iter_mut().find(|t| t.account_id == account_id) {
            Some(existing) => existing.amount = existing.amount + amount,
            None => transfers.push(HbarTransfer { account_id, amount }),
        }
        self
    }

    /// Move NFT `serial` of `token_id` from `sender` to `receiver`
    pub fn nft_transfer(
        &mut self,
        token_id: TokenId,
        serial: i64,
        sender: AccountId,
        receiver: AccountId,
    ) -> &mut Self {
        let transfer = TokenNftTransfer {
            sender,
            receiver,
            serial,
        };
        let lists = &mut self.data_mut().nft_transfers;
        match lists.iter_mut().find(|list| list.token_id == token_id) {
            Some(list) => {
                list.transfers.push(transfer);
                list.transfers.sort();
            }
            None => lists.push(TokenNftTransferList {
                token_id,
                transfers: vec![transfer],
            }),
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfers_merge_and_sort() {
        let alice = AccountId::new(0, 0, 1001);
        let bob = AccountId::new(0, 0, 1002);
        let token = TokenId::new(0, 0, 5005);

        let mut tx = TransferTransaction::new();
        tx.hbar_transfer(alice, Hbar::new(-3))
            .hbar_transfer(bob, Hbar::new(3))
            .hbar_transfer(alice, Hbar::new(-1))
            .hbar_transfer(bob, Hbar::new(1))
            .nft_transfer(token, 7, alice, bob)
            .nft_transfer(token, 2, alice, bob);

        let data = tx.data();
        assert_eq!(data.hbar_transfers().len(), 2);
        assert_eq!(data.hbar_transfers()[0].amount, Hbar::new(-4));
        assert_eq!(data.nft_transfers().len(), 1);
        let serials: Vec<_> = data.nft_transfers()[0].transfers.iter().map(|t| t.serial).collect();
        assert_eq!(serials, vec![2, 7]);
    }
}
