use actix_easy_multipart::{tempfile::Tempfile, text::Text, MultipartForm};
use domain_upload::model::entity::UploadStatus;
use serde::{Deserialize, Serialize};

/// Envelope of every response.
#[derive(Serialize, Deserialize, Debug)]
pub struct ResponseBase<T> {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    /// Set when the upload has to be restarted from its first chunk.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expired: bool,
}

impl<T> ResponseBase<T> {
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            msg: None,
            expired: false,
        }
    }

    pub fn msg(msg: &str) -> Self {
        Self {
            ok: true,
            data: None,
            msg: Some(msg.to_string()),
            expired: false,
        }
    }

    pub fn err(msg: &str) -> Self {
        Self {
            ok: false,
            data: None,
            msg: Some(msg.to_string()),
            expired: false,
        }
    }

    pub fn expired(msg: &str) -> Self {
        Self {
            expired: true,
            ..Self::err(msg)
        }
    }
}

#[derive(MultipartForm)]
pub struct UploadChunkRequest {
    #[multipart(rename = "fileHash")]
    pub file_hash: Text<String>,
    #[multipart(rename = "chunkHash")]
    pub chunk_hash: Text<String>,
    /// Lets chunks of an already merged file be skipped.
    #[multipart(rename = "fileName")]
    pub file_name: Option<Text<String>>,
    pub chunk: Tempfile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub file_hash: String,
    pub file_name: String,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_chunk_identifiers: Option<Vec<String>>,
}

impl From<UploadStatus> for VerifyResponse {
    fn from(status: UploadStatus) -> Self {
        match status {
            UploadStatus::Complete => Self {
                complete: true,
                existing_chunk_identifiers: None,
            },
            UploadStatus::Incomplete { existing } => Self {
                complete: false,
                existing_chunk_identifiers: Some(existing.into_iter().map(String::from).collect()),
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
    pub file_hash: String,
    pub file_name: String,
    /// Declared chunk size in bytes.
    pub size: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub file_hash: String,
}
