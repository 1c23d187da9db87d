use actix_easy_multipart::MultipartForm;
use actix_web::{post, web, HttpResponse};
use domain_upload::command::{ChunkSource, MergeCommand, StageChunkCommand};
use domain_upload::model::entity::{MergeOutcome, StageOutcome};
use domain_upload::service::UploadService;

use super::dtos::{
    CancelRequest, MergeRequest, ResponseBase, UploadChunkRequest, VerifyRequest, VerifyResponse,
};
use super::{extract_fingerprint, extract_identifier, ApiResult};

#[post("/upload")]
pub async fn upload_chunk(
    service: web::Data<dyn UploadService>,
    data: MultipartForm<UploadChunkRequest>,
) -> ApiResult<HttpResponse> {
    let data = data.into_inner();
    let fingerprint = extract_fingerprint(&data.file_hash.0)?;
    let identifier = extract_identifier(&fingerprint, &data.chunk_hash.0)?;
    // The temp file stays owned by the form until staging moved or copied it.
    let chunk = data.chunk;
    let outcome = service
        .stage(StageChunkCommand {
            fingerprint,
            identifier,
            source: ChunkSource::TempFile(chunk.file.path().to_path_buf()),
            file_name: data.file_name.map(|name| name.0),
        })
        .await?;
    drop(chunk);
    let msg = match outcome {
        StageOutcome::Staged => "Chunk uploaded.",
        StageOutcome::AlreadyComplete => "File already uploaded.",
    };
    Ok(HttpResponse::Ok().json(ResponseBase::<()>::msg(msg)))
}

#[post("/verify")]
pub async fn verify(
    service: web::Data<dyn UploadService>,
    data: web::Json<VerifyRequest>,
) -> ApiResult<HttpResponse> {
    let fingerprint = extract_fingerprint(&data.file_hash)?;
    let status = service.status(&fingerprint, &data.file_name).await?;
    Ok(HttpResponse::Ok().json(ResponseBase::ok(VerifyResponse::from(status))))
}

#[post("/merge")]
pub async fn merge(
    service: web::Data<dyn UploadService>,
    data: web::Json<MergeRequest>,
) -> ApiResult<HttpResponse> {
    let data = data.into_inner();
    let fingerprint = extract_fingerprint(&data.file_hash)?;
    let outcome = service
        .merge(MergeCommand {
            fingerprint,
            file_name: data.file_name,
            declared_chunk_size: data.size,
        })
        .await?;
    let msg = match outcome {
        MergeOutcome::Merged { .. } => "File merged.",
        MergeOutcome::AlreadyComplete => "File already exists.",
    };
    Ok(HttpResponse::Ok().json(ResponseBase::<()>::msg(msg)))
}

#[post("/cancel")]
pub async fn cancel(
    service: web::Data<dyn UploadService>,
    data: web::Json<CancelRequest>,
) -> ApiResult<HttpResponse> {
    let fingerprint = extract_fingerprint(&data.file_hash)?;
    let removed = service.cancel(&fingerprint).await?;
    Ok(HttpResponse::Ok().json(ResponseBase::ok(removed)))
}
