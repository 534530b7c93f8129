use crate::error::{ReaderError, Result};
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncWriteExt};
use tracing::{info, instrument};

async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| ReaderError::io(parent, e))?;
    }
    Ok(())
}

/// Empties (or creates) an output file at the start of a clobbering run.
pub async fn truncate(path: &Path) -> Result<()> {
    ensure_parent(path).await?;
    fs::File::create(path)
        .await
        .map_err(|e| ReaderError::io(path, e))?;
    Ok(())
}

/// Appends one record terminated by `\n`. The file is opened and closed per call.
pub async fn append_line(path: &Path, line: &str) -> Result<()> {
    ensure_parent(path).await?;
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| ReaderError::io(path, e))?;

    let mut record = String::with_capacity(line.len() + 1);
    record.push_str(line);
    record.push('\n');

    file.write_all(record.as_bytes())
        .await
        .map_err(|e| ReaderError::io(path, e))?;
    file.flush().await.map_err(|e| ReaderError::io(path, e))
}

/// Copies each file into `dest_dir`, keeping its file name. Returns the new paths.
#[instrument(skip(files), fields(dest_dir = %dest_dir.display()))]
pub async fn copy_outputs(files: &[PathBuf], dest_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| ReaderError::io(dest_dir, e))?;

    let mut copied = Vec::with_capacity(files.len());
    for file in files {
        let Some(name) = file.file_name() else {
            continue;
        };
        let target = dest_dir.join(name);
        fs::copy(file, &target)
            .await
            .map_err(|e| ReaderError::io(file, e))?;
        info!(from = %file.display(), to = %target.display(), "Copied output file");
        copied.push(target);
    }
    Ok(copied)
}
