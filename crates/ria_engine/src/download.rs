use std::path::{Path, PathBuf};

use ria_core::JobId;
use ria_logging::{ria_info, ria_warn};

use crate::filename::artifact_filename;
use crate::persist::AtomicFileWriter;
use crate::{ApiError, FailureKind, RiaApi};

/// Fetch the result file of `job_id` and write it into `output_dir`.
/// An existing file with the same name is replaced.
pub async fn download_artifact(
    api: &dyn RiaApi,
    job_id: &JobId,
    output_dir: &Path,
) -> Result<PathBuf, ApiError> {
    let artifact = api.download(job_id).await?;
    if artifact.bytes.is_empty() {
        ria_warn!("Artifact for job {} is empty", job_id);
    }
    let filename = artifact_filename(artifact.filename.as_deref(), job_id);
    let size = artifact.bytes.len();
    let writer = AtomicFileWriter::new(output_dir.to_path_buf());
    // fsync and rename block; keep them off the async workers.
    let path = tokio::task::spawn_blocking(move || writer.write(&filename, artifact.bytes))
        .await
        .map_err(|err| ApiError::new(FailureKind::Io, format!("write task failed: {err}")))??;
    ria_info!(
        "Saved artifact job_id={} bytes={} path={:?}",
        job_id,
        size,
        path
    );
    Ok(path)
}
