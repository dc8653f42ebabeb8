//! `kh upload`: store local files and index them as documents.
//!
//! Each file is copied into `[upload] dir` under a content-addressed name,
//! its text extracted, and the result handed to
//! `knowledge_hub_core::upload::ingest_document`. Directories are walked
//! recursively and unsupported files inside them are skipped.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

use knowledge_hub_core::ai::AiService;
use knowledge_hub_core::store::EntityStore;
use knowledge_hub_core::upload::{self, UploadOptions, UploadOutcome, UploadedFile, MIME_PDF};

use crate::config::{Config, UploadConfig};
use crate::db;
use crate::extract::{self, mime_for_path};
use crate::llm;
use crate::sqlite_store::SqliteStore;

/// Expand `paths` into the list of files to upload.
///
/// Explicit file arguments are always kept so that unsupported ones get an
/// error outcome; files found by walking a directory are kept only when
/// upload accepts them.
pub fn collect_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                let name = file_name(entry.path());
                if upload::accepts(&name, mime_for_path(entry.path())) {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path.clone());
        }
    }
    files
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// A file read from disk, hashed but not yet stored.
struct PendingFile {
    name: String,
    mime: &'static str,
    bytes: Vec<u8>,
    hash: String,
}

/// Accept-check, size-check, read, and hash one file.
fn read_upload(path: &Path, config: &UploadConfig) -> Result<PendingFile> {
    let name = file_name(path);
    let mime = mime_for_path(path);
    if !upload::accepts(&name, mime) {
        anyhow::bail!("unsupported file type (accepted: pdf, txt, py, md, rst)");
    }

    let size = std::fs::metadata(path)
        .with_context(|| format!("Failed to stat {}", path.display()))?
        .len();
    if size > config.max_file_size_bytes() {
        anyhow::bail!(
            "file is {} bytes, larger than the {} MB limit",
            size,
            config.max_file_size_mb
        );
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let hash = upload::content_hash(&bytes);
    Ok(PendingFile {
        name,
        mime,
        bytes,
        hash,
    })
}

/// Copy the file into the upload directory and extract its text.
fn store_and_extract(file: PendingFile, config: &UploadConfig) -> Result<UploadedFile> {
    std::fs::create_dir_all(&config.dir)
        .with_context(|| format!("Failed to create {}", config.dir.display()))?;
    let stored = config.dir.join(format!("{}-{}", &file.hash[..16], file.name));
    std::fs::write(&stored, &file.bytes)
        .with_context(|| format!("Failed to write {}", stored.display()))?;
    debug!(file = %file.name, stored = %stored.display(), "file stored");

    let content = match extract::extract_text(&file.bytes, file.mime) {
        Ok(text) => text,
        // Unreadable PDFs are still indexed, with no text.
        Err(e) if file.mime == MIME_PDF => {
            warn!(file = %file.name, error = %e, "PDF text extraction failed");
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(UploadedFile {
        file_name: file.name,
        mime: file.mime.to_string(),
        file_url: Some(stored.display().to_string()),
        content,
        content_hash: file.hash,
    })
}

/// Read, dedup, store, and index one file.
async fn upload_one<S, A>(
    store: &S,
    ai: &A,
    config: &Config,
    path: &Path,
    opts: UploadOptions,
) -> Result<UploadOutcome>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    let pending = read_upload(path, &config.upload)?;
    // Skipped files are never copied into the upload directory.
    if let Some(skipped) = upload::find_duplicate(store, &pending.name, &pending.hash).await? {
        return Ok(skipped);
    }
    let file = store_and_extract(pending, &config.upload)?;
    Ok(upload::ingest_document(store, ai, file, opts).await)
}

/// Upload every file, one at a time. A failure only affects its own file.
pub async fn upload_files<S, A>(
    store: &S,
    ai: &A,
    config: &Config,
    files: &[PathBuf],
) -> Vec<UploadOutcome>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    // Without a provider, documents are stored without summary or tags.
    let opts = UploadOptions {
        analyze: config.upload.summarize && config.llm.is_enabled(),
    };
    let mut outcomes = Vec::with_capacity(files.len());
    for path in files {
        let outcome = match upload_one(store, ai, config, path, opts).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "upload rejected");
                UploadOutcome::failed(file_name(path), format!("{:#}", e))
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

/// CLI entry point for `kh upload`.
pub async fn run_upload(config: &Config, paths: &[PathBuf]) -> Result<()> {
    let files = collect_files(paths);
    if files.is_empty() {
        println!("No files to upload.");
        return Ok(());
    }

    let ai = llm::create_service(&config.llm)?;
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());

    let outcomes = upload_files(&store, ai.as_ref(), config, &files).await;
    pool.close().await;

    let mut succeeded = 0;
    let mut skipped = 0;
    let mut failed = 0;
    for outcome in &outcomes {
        match outcome {
            UploadOutcome::Success { file, document } => {
                succeeded += 1;
                println!(
                    "  ok    {} ({}, {} words, {})",
                    file,
                    document.file_type,
                    document.word_count,
                    document.category.as_deref().unwrap_or("other")
                );
            }
            UploadOutcome::Skipped { file, existing_id } => {
                skipped += 1;
                println!("  skip  {} (same content as {})", file, existing_id);
            }
            UploadOutcome::Error { file, error } => {
                failed += 1;
                println!("  error {}: {}", file, error);
            }
        }
    }

    println!();
    println!("upload complete");
    println!("  files: {}", outcomes.len());
    println!("  uploaded: {}", succeeded);
    println!("  skipped: {}", skipped);
    println!("  failed: {}", failed);

    Ok(())
}
