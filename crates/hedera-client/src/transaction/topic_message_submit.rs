//! Topic message submission, split into chunks when the message is large

use super::{Transaction, TransactionData};
use hedera_core::proto::{self, ChunkInfo, ConsensusSubmitMessageBody};
use hedera_core::{HederaError, Result, TopicId};

/// Bytes carried by one chunk unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Chunks allowed per message unless configured otherwise
pub const DEFAULT_MAX_CHUNKS: usize = 20;

/// Submits a message to a topic, splitting it into chunks when needed
pub type TopicMessageSubmitTransaction = Transaction<TopicMessageSubmitData>;

/// Payload of a [`TopicMessageSubmitTransaction`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMessageSubmitData {
    topic_id: Option<TopicId>,
    message: Vec<u8>,
    chunk_size: usize,
    max_chunks: usize,
}

impl Default for TopicMessageSubmitData {
    fn default() -> Self {
        Self {
            topic_id: None,
            message: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl TopicMessageSubmitData {
    fn chunk(&self, number: u32) -> &[u8] {
        let start = (number.saturating_sub(1) as usize).saturating_mul(self.chunk_size);
        let end = start.saturating_add(self.chunk_size).min(self.message.len());
        self.message.get(start..end).unwrap_or_default()
    }
}

impl TransactionData for TopicMessageSubmitData {
    fn to_transaction_data(&self, chunk: Option<&ChunkInfo>) -> proto::TransactionData {
        let message = match chunk {
            Some(info) => self.chunk(info.number).to_vec(),
            None => self.message.clone(),
        };
        proto::TransactionData::ConsensusSubmitMessage(ConsensusSubmitMessageBody {
            topic_id: self.topic_id.unwrap_or_default(),
            message,
            chunk_info: chunk.copied(),
        })
    }

    fn chunk_count(&self) -> Result<usize> {
        if self.topic_id.is_none() {
            return Err(HederaError::invalid("topic message submission without a topic"));
        }
        let chunks = self.message.len().div_ceil(self.chunk_size).max(1);
        if chunks > self.max_chunks {
            return Err(HederaError::MaxChunksExceeded {
                chunks,
                max_chunks: self.max_chunks,
            });
        }
        Ok(chunks)
    }
}

impl Transaction<TopicMessageSubmitData> {
    /// Topic receiving the message
    pub fn topic_id(&mut self, topic_id: TopicId) -> &mut Self {
        self.data_mut().topic_id = Some(topic_id);
        self
    }

    /// Message to submit
    pub fn message(&mut self, message: impl Into<Vec<u8>>) -> &mut Self {
        self.data_mut().message = message.into();
        self
    }

    /// Bytes per chunk; zero is treated as one
    pub fn chunk_size(&mut self, size: usize) -> &mut Self {
        self.data_mut().chunk_size = size.max(1);
        self
    }

    /// Upper bound on chunks for this message
    pub fn max_chunks(&mut self, max: usize) -> &mut Self {
        self.data_mut().max_chunks = max;
        self
    }
}
