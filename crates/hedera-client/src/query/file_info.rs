//! File metadata query

use super::{unexpected_answer, Query, QueryData};
use hedera_core::proto::{self, QueryAnswer, Response};
use hedera_core::{FileId, FileInfo, HederaError, Result};

/// Reads a file's metadata; paid
pub type FileInfoQuery = Query<FileInfoData>;

/// Question asked by a [`FileInfoQuery`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfoData {
    file_id: Option<FileId>,
}

impl QueryData for FileInfoData {
    type Response = FileInfo;

    fn to_query_data(&self) -> Result<proto::QueryData> {
        let file_id = self
            .file_id
            .ok_or_else(|| HederaError::invalid("file info query without a file id"))?;
        Ok(proto::QueryData::FileGetInfo { file_id })
    }

    fn make_response(&self, response: Response) -> Result<FileInfo> {
        let precheck = response.precheck();
        match response.into_answer() {
            Some(QueryAnswer::FileInfo(info)) => Ok(info),
            _ => Err(unexpected_answer("file info", precheck)),
        }
    }
}

impl Query<FileInfoData> {
    /// File whose metadata is read
    pub fn file_id(&mut self, file_id: FileId) -> &mut Self {
        self.data_mut().file_id = Some(file_id);
        self
    }
}
