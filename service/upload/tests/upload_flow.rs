use std::sync::Arc;

use domain_upload::{
    command::{ChunkSource, MergeCommand, StageChunkCommand},
    exception::UploadException,
    model::{
        entity::{MergeOutcome, StageOutcome, UploadStatus},
        vo::{ChunkIdentifier, FileFingerprint},
    },
    service::UploadService,
};
use service_upload::{
    CompletenessServiceImpl, FingerprintLocks, LocalChunkStoreServiceImpl, MergeServiceImpl,
    StorageLayout, UploadServiceImpl,
};
use tempfile::TempDir;

struct Env {
    service: UploadServiceImpl,
    layout: StorageLayout,
    _dir: TempDir,
}

async fn load() -> Env {
    let dir = TempDir::new().unwrap();
    let layout = StorageLayout::new(dir.path().join("uploads"));
    layout.prepare().await.unwrap();
    let locks = Arc::new(FingerprintLocks::new());
    let chunk_store = Arc::new(LocalChunkStoreServiceImpl::builder().layout(layout.clone()).build());
    let completeness_service = Arc::new(
        CompletenessServiceImpl::builder()
            .layout(layout.clone())
            .chunk_store(chunk_store.clone())
            .build(),
    );
    let merge_service = Arc::new(
        MergeServiceImpl::builder()
            .layout(layout.clone())
            .chunk_store(chunk_store.clone())
            .completeness_service(completeness_service.clone())
            .locks(locks.clone())
            .build(),
    );
    let service = UploadServiceImpl::builder()
        .chunk_store(chunk_store)
        .completeness_service(completeness_service)
        .merge_service(merge_service)
        .locks(locks)
        .build();
    Env {
        service,
        layout,
        _dir: dir,
    }
}

fn fingerprint(raw: &str) -> FileFingerprint {
    FileFingerprint::new(raw).unwrap()
}

async fn stage(env: &Env, fingerprint: &FileFingerprint, index: u64, content: Vec<u8>) -> StageOutcome {
    env.service
        .stage(StageChunkCommand {
            fingerprint: fingerprint.clone(),
            identifier: ChunkIdentifier::new(fingerprint, index),
            source: ChunkSource::Bytes(content),
            file_name: None,
        })
        .await
        .unwrap()
}

fn merge_cmd(fingerprint: &FileFingerprint, file_name: &str, size: u64) -> MergeCommand {
    MergeCommand {
        fingerprint: fingerprint.clone(),
        file_name: file_name.to_string(),
        declared_chunk_size: size,
    }
}

#[tokio::test]
async fn restaging_keeps_last_payload() {
    let env = load().await;
    let fp = fingerprint("abc123");

    stage(&env, &fp, 0, b"first".to_vec()).await;
    stage(&env, &fp, 0, b"again".to_vec()).await;

    let status = env.service.status(&fp, "notes.txt").await.unwrap();
    assert_eq!(
        status,
        UploadStatus::Incomplete {
            existing: vec![ChunkIdentifier::new(&fp, 0)]
        }
    );
    let chunk = env.layout.chunk_path(&fp, &ChunkIdentifier::new(&fp, 0));
    assert_eq!(tokio::fs::read(chunk).await.unwrap(), b"again");
}

#[tokio::test]
async fn status_reflects_staged_chunks() {
    let env = load().await;
    let fp = fingerprint("abc123");
    assert_eq!(
        env.service.status(&fp, "video.mp4").await.unwrap(),
        UploadStatus::Incomplete { existing: vec![] }
    );

    stage(&env, &fp, 2, vec![2; 8]).await;
    stage(&env, &fp, 0, vec![0; 8]).await;

    let status = env.service.status(&fp, "video.mp4").await.unwrap();
    assert_eq!(
        status,
        UploadStatus::Incomplete {
            existing: vec![ChunkIdentifier::new(&fp, 0), ChunkIdentifier::new(&fp, 2)]
        }
    );
}

#[tokio::test]
async fn merge_twice_succeeds_without_touching_artifact() {
    let env = load().await;
    let fp = fingerprint("abc123");
    stage(&env, &fp, 0, b"hello ".to_vec()).await;
    stage(&env, &fp, 1, b"world".to_vec()).await;

    let first = env.service.merge(merge_cmd(&fp, "greeting.txt", 6)).await.unwrap();
    let artifact = env.layout.artifact_path(&fp, "greeting.txt").unwrap();
    let modified = std::fs::metadata(&artifact).unwrap().modified().unwrap();
    let second = env.service.merge(merge_cmd(&fp, "greeting.txt", 6)).await.unwrap();

    assert_eq!(first, MergeOutcome::Merged { size: 11 });
    assert_eq!(second, MergeOutcome::AlreadyComplete);
    assert_eq!(std::fs::metadata(&artifact).unwrap().modified().unwrap(), modified);
    assert_eq!(tokio::fs::read(&artifact).await.unwrap(), b"hello world");
    assert!(env.service.status(&fp, "greeting.txt").await.unwrap().is_complete());
}

#[tokio::test]
async fn merge_orders_chunks_numerically() {
    let env = load().await;
    let fp = fingerprint("abc123");
    let order = [11u64, 3, 9, 0, 10, 1, 7, 2, 8, 5, 4, 6];
    for index in order {
        stage(&env, &fp, index, vec![index as u8; 4]).await;
    }

    env.service.merge(merge_cmd(&fp, "data.bin", 4)).await.unwrap();

    let content = tokio::fs::read(env.layout.artifact_path(&fp, "data.bin").unwrap())
        .await
        .unwrap();
    let expected = (0..12u8).flat_map(|index| [index; 4]).collect::<Vec<_>>();
    assert_eq!(content, expected);
    // Index 9 precedes index 10, unlike a lexical sort.
    assert_eq!(content[36], 9);
    assert_eq!(content[40], 10);
}

#[tokio::test]
async fn merge_retires_staging_area() {
    let env = load().await;
    let fp = fingerprint("6f1ed002ab5595859014ebf0951522d9");
    stage(&env, &fp, 0, vec![1; 32]).await;
    stage(&env, &fp, 1, vec![2; 10]).await;

    env.service.merge(merge_cmd(&fp, "photo.jpeg", 32)).await.unwrap();

    assert!(!env.layout.staging_dir(&fp).exists());
    let artifact = env.layout.artifact_path(&fp, "photo.jpeg").unwrap();
    assert!(std::fs::metadata(artifact).unwrap().len() >= 42);
}

#[tokio::test]
async fn merge_without_chunks_expires() {
    let env = load().await;
    let fp = fingerprint("abc123");

    let err = env.service.merge(merge_cmd(&fp, "video.mp4", 1024)).await.unwrap_err();

    assert!(matches!(err, UploadException::UploadExpired { .. }));
    assert!(!env.layout.artifact_path(&fp, "video.mp4").unwrap().exists());
}

#[tokio::test]
async fn completed_upload_ignores_late_chunks() {
    let env = load().await;
    let fp = fingerprint("abc123");
    stage(&env, &fp, 0, b"abc".to_vec()).await;
    env.service.merge(merge_cmd(&fp, "a.txt", 3)).await.unwrap();

    let outcome = env
        .service
        .stage(StageChunkCommand {
            fingerprint: fp.clone(),
            identifier: ChunkIdentifier::new(&fp, 0),
            source: ChunkSource::Bytes(b"zzz".to_vec()),
            file_name: Some("a.txt".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(outcome, StageOutcome::AlreadyComplete);
    assert!(!env.layout.staging_dir(&fp).exists());
}

#[tokio::test]
async fn cancel_discards_staged_chunks() {
    let env = load().await;
    let fp = fingerprint("abc123");
    stage(&env, &fp, 0, b"abc".to_vec()).await;

    assert!(env.service.cancel(&fp).await.unwrap());
    assert!(!env.service.cancel(&fp).await.unwrap());
    let err = env.service.merge(merge_cmd(&fp, "a.txt", 3)).await.unwrap_err();
    assert!(matches!(err, UploadException::UploadExpired { .. }));
}

#[tokio::test]
async fn video_upload_scenario() {
    let env = load().await;
    let fp = fingerprint("abc123");
    let sizes = [1_000_000usize, 1_000_000, 450_000];
    let source_dir = TempDir::new().unwrap();
    for (index, size) in sizes.iter().enumerate().rev() {
        let path = source_dir.path().join(format!("part{index}"));
        tokio::fs::write(&path, vec![index as u8 + 1; *size]).await.unwrap();
        let outcome = env
            .service
            .stage(StageChunkCommand {
                fingerprint: fp.clone(),
                identifier: ChunkIdentifier::parse(&fp, &format!("abc123-{index}")).unwrap(),
                source: ChunkSource::TempFile(path),
                file_name: Some("video.mp4".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(outcome, StageOutcome::Staged);
    }

    let outcome = env.service.merge(merge_cmd(&fp, "video.mp4", 1_000_000)).await.unwrap();

    assert_eq!(outcome, MergeOutcome::Merged { size: 2_450_000 });
    let artifact = env.layout.root().join("abc123.mp4");
    let content = tokio::fs::read(&artifact).await.unwrap();
    assert_eq!(content.len(), 2_450_000);
    assert_eq!(content[999_999], 1);
    assert_eq!(content[1_000_000], 2);
    assert_eq!(content[2_449_999], 3);
    assert!(!env.layout.staging_dir(&fp).exists());
}

#[tokio::test]
async fn extensionless_upload_is_merged() {
    let env = load().await;
    let fp = fingerprint("abc123");
    stage(&env, &fp, 0, b"abc".to_vec()).await;
    stage(&env, &fp, 1, b"de".to_vec()).await;

    let status = env.service.status(&fp, "README").await.unwrap();
    assert_eq!(
        status,
        UploadStatus::Incomplete {
            existing: vec![ChunkIdentifier::new(&fp, 0), ChunkIdentifier::new(&fp, 1)]
        }
    );

    let outcome = env.service.merge(merge_cmd(&fp, "README", 3)).await.unwrap();

    assert_eq!(outcome, MergeOutcome::Merged { size: 5 });
    let artifact = env.layout.root().join("abc123");
    assert!(artifact.is_file());
    assert_eq!(tokio::fs::read(&artifact).await.unwrap(), b"abcde");
    assert!(env.service.status(&fp, "README").await.unwrap().is_complete());
}

#[tokio::test]
async fn staging_never_completes_another_upload() {
    let env = load().await;
    let fp = fingerprint("abc");
    stage(&env, &fp, 0, b"abc".to_vec()).await;

    assert!(FileFingerprint::new("abc.mp4").is_err());
    assert!(!env.service.status(&fp, "video.mp4").await.unwrap().is_complete());
    assert!(!env.service.status(&fp, "notes").await.unwrap().is_complete());
}
