use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use domain_upload::exception::UploadException;
use domain_upload::model::vo::{ChunkIdentifier, FileFingerprint};

use self::dtos::ResponseBase;

pub mod dtos;
pub mod upload;

pub type ApiResult<T> = Result<T, ApiError>;

/// Upload failure rendered as a response envelope.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub UploadException);

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            UploadException::InvalidRequest { .. } | UploadException::ChunkSizeMismatch { .. } => {
                StatusCode::BAD_REQUEST
            }
            UploadException::UploadExpired { .. } => StatusCode::GONE,
            UploadException::MissingChunks { .. } => StatusCode::CONFLICT,
            UploadException::MergeTimedOut { .. } => StatusCode::SERVICE_UNAVAILABLE,
            UploadException::StorageFault { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let msg = self.0.to_string();
        let body: ResponseBase<()> = match &self.0 {
            UploadException::UploadExpired { .. } => ResponseBase::expired(&msg),
            UploadException::StorageFault { source } => {
                tracing::error!("Storage fault: {source:?}");
                ResponseBase::err("Storage fault, please retry later.")
            }
            _ => ResponseBase::err(&msg),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(upload::upload_chunk)
        .service(upload::verify)
        .service(upload::merge)
        .service(upload::cancel);
}

fn extract_fingerprint(s: &str) -> ApiResult<FileFingerprint> {
    Ok(FileFingerprint::new(s)?)
}

fn extract_identifier(fingerprint: &FileFingerprint, s: &str) -> ApiResult<ChunkIdentifier> {
    Ok(ChunkIdentifier::parse(fingerprint, s)?)
}
