//! Document upload: classify a file, summarize and tag it, and store it.
//!
//! File storage and text extraction are the caller's job; this module takes
//! the already-extracted content and turns it into a [`Document`]. Each file
//! yields an [`UploadOutcome`] so one failure never stops a batch.
//!
//! Duplicates are detected by the SHA-256 of the raw file bytes, not the
//! extracted text, so distinct files with no extractable text (for example
//! unreadable PDFs) are all kept. Callers that store files should run
//! [`find_duplicate`] first and skip storing on a hit.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::ai::{invoke_as, AiService};
use crate::models::{Document, NewDocument};
use crate::store::EntityStore;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_TEXT: &str = "text/plain";

/// Characters of content sent to the AI service for analysis.
pub const ANALYSIS_EXCERPT_CHARS: usize = 2000;

/// Whether a file is accepted for upload.
pub fn accepts(file_name: &str, mime: &str) -> bool {
    mime == MIME_PDF
        || mime == MIME_TEXT
        || file_name.ends_with(".py")
        || file_name.ends_with(".md")
        || file_name.ends_with(".rst")
}

/// Stored file type: `pdf`, `py`, `md`, `rst`, or `txt`.
pub fn file_type(file_name: &str, mime: &str) -> &'static str {
    if mime == MIME_PDF {
        "pdf"
    } else if file_name.ends_with(".py") {
        "py"
    } else if file_name.ends_with(".md") {
        "md"
    } else if file_name.ends_with(".rst") {
        "rst"
    } else {
        "txt"
    }
}

/// Guess a category from the file name.
pub fn infer_category(file_name: &str) -> &'static str {
    let name = file_name.to_lowercase();
    if name.contains("tutorial") || name.contains("guide") {
        "tutorial"
    } else if name.contains("doc") || name.contains("reference") {
        "documentation"
    } else if name.ends_with(".py") {
        "code"
    } else {
        "other"
    }
}

/// Number of single-space-separated fields. An empty string counts as one.
pub fn word_count(content: &str) -> i64 {
    content.split(' ').count() as i64
}

/// Hex SHA-256 of the raw file bytes.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn analysis_prompt(content: &str) -> String {
    let excerpt: String = content.chars().take(ANALYSIS_EXCERPT_CHARS).collect();
    format!(
        "Analyze this content and provide a summary and relevant tags for a technical knowledge base:

Content: {excerpt}...

Please provide:
1. A concise summary (2-3 sentences)
2. Relevant tags (5-8 tags related to programming concepts, languages, libraries, etc.)"
    )
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": { "type": "string" },
            "tags": { "type": "array", "items": { "type": "string" } }
        }
    })
}

/// AI-generated summary and tags for a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContentAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A file that has been stored and had its text extracted.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime: String,
    /// Where the stored copy lives.
    pub file_url: Option<String>,
    pub content: String,
    /// [`content_hash`] of the original file bytes.
    pub content_hash: String,
}

#[derive(Debug, Clone, Copy)]
pub struct UploadOptions {
    /// Ask the AI service for a summary and tags.
    pub analyze: bool,
}

/// Result of processing one file.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadOutcome {
    Success {
        file: String,
        document: Box<Document>,
    },
    /// Identical content is already stored.
    Skipped { file: String, existing_id: String },
    Error { file: String, error: String },
}

impl UploadOutcome {
    pub fn failed(file: impl Into<String>, error: impl std::fmt::Display) -> Self {
        UploadOutcome::Error {
            file: file.into(),
            error: error.to_string(),
        }
    }

    pub fn file(&self) -> &str {
        match self {
            UploadOutcome::Success { file, .. }
            | UploadOutcome::Skipped { file, .. }
            | UploadOutcome::Error { file, .. } => file,
        }
    }
}

/// A [`UploadOutcome::Skipped`] for `file` when a document with the same
/// file hash is already stored.
pub async fn find_duplicate<S>(
    store: &S,
    file: &str,
    hash: &str,
) -> anyhow::Result<Option<UploadOutcome>>
where
    S: EntityStore + ?Sized,
{
    Ok(store.find_document_by_hash(hash).await?.map(|existing| {
        debug!(file = %file, existing = %existing.id, "duplicate file");
        UploadOutcome::Skipped {
            file: file.to_string(),
            existing_id: existing.id,
        }
    }))
}

/// Analyze and store one uploaded file.
pub async fn ingest_document<S, A>(
    store: &S,
    ai: &A,
    file: UploadedFile,
    opts: UploadOptions,
) -> UploadOutcome
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    let name = file.file_name.clone();
    match try_ingest(store, ai, file, opts).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(file = %name, error = %e, "upload failed");
            UploadOutcome::failed(name, format!("{:#}", e))
        }
    }
}

async fn try_ingest<S, A>(
    store: &S,
    ai: &A,
    file: UploadedFile,
    opts: UploadOptions,
) -> anyhow::Result<UploadOutcome>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    if let Some(skipped) = find_duplicate(store, &file.file_name, &file.content_hash).await? {
        return Ok(skipped);
    }

    let analysis = if opts.analyze {
        invoke_as::<ContentAnalysis, _>(ai, &analysis_prompt(&file.content), &analysis_schema())
            .await?
    } else {
        ContentAnalysis::default()
    };

    let document = store
        .create_document(NewDocument {
            title: file.file_name.clone(),
            file_type: file_type(&file.file_name, &file.mime).to_string(),
            file_url: file.file_url,
            summary: analysis.summary,
            tags: analysis.tags,
            category: Some(infer_category(&file.file_name).to_string()),
            word_count: word_count(&file.content),
            processing_status: "completed".to_string(),
            indexed_at: Some(Utc::now()),
            content_hash: file.content_hash,
            content: file.content,
        })
        .await?;

    Ok(UploadOutcome::Success {
        file: file.file_name,
        document: Box::new(document),
    })
}

/// Process files sequentially, collecting one outcome per file.
pub async fn ingest_all<S, A>(
    store: &S,
    ai: &A,
    files: Vec<UploadedFile>,
    opts: UploadOptions,
) -> Vec<UploadOutcome>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    let mut outcomes = Vec::with_capacity(files.len());
    for file in files {
        outcomes.push(ingest_document(store, ai, file, opts).await);
    }
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use crate::store::memory::InMemoryStore;
    use crate::store::ListOptions;
    use crate::testing::ScriptedAi;

    fn text_file(name: &str, content: &str) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            mime: MIME_TEXT.to_string(),
            file_url: Some(format!("uploads/{name}")),
            content: content.to_string(),
            content_hash: content_hash(content.as_bytes()),
        }
    }

    fn unreadable_pdf(name: &str, raw: &[u8]) -> UploadedFile {
        UploadedFile {
            file_name: name.to_string(),
            mime: MIME_PDF.to_string(),
            file_url: None,
            content: String::new(),
            content_hash: content_hash(raw),
        }
    }

    #[test]
    fn test_accepts() {
        assert!(accepts("a.pdf", MIME_PDF));
        assert!(accepts("notes.txt", MIME_TEXT));
        assert!(accepts("main.py", "application/octet-stream"));
        assert!(accepts("README.md", ""));
        assert!(accepts("index.rst", ""));
        assert!(!accepts("image.png", "image/png"));
    }

    #[test]
    fn test_file_type() {
        assert_eq!(file_type("x.pdf", MIME_PDF), "pdf");
        assert_eq!(file_type("x.py", ""), "py");
        assert_eq!(file_type("x.md", ""), "md");
        assert_eq!(file_type("x.rst", ""), "rst");
        assert_eq!(file_type("x.txt", MIME_TEXT), "txt");
    }

    #[test]
    fn test_infer_category() {
        assert_eq!(infer_category("Python-Tutorial.pdf"), "tutorial");
        assert_eq!(infer_category("style_guide.md"), "tutorial");
        assert_eq!(infer_category("api-docs.md"), "documentation");
        assert_eq!(infer_category("reference.txt"), "documentation");
        assert_eq!(infer_category("script.py"), "code");
        assert_eq!(infer_category("notes.txt"), "other");
    }

    #[test]
    fn test_word_count_splits_on_single_spaces() {
        assert_eq!(word_count("one two three"), 3);
        assert_eq!(word_count(""), 1);
        assert_eq!(word_count("a  b"), 3);
    }

    #[test]
    fn test_analysis_prompt_truncates() {
        let content = "x".repeat(ANALYSIS_EXCERPT_CHARS + 500);
        let prompt = analysis_prompt(&content);
        assert!(prompt.contains(&"x".repeat(ANALYSIS_EXCERPT_CHARS)));
        assert!(!prompt.contains(&"x".repeat(ANALYSIS_EXCERPT_CHARS + 1)));
    }

    #[tokio::test]
    async fn test_ingest_creates_document() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![Ok(serde_json::json!({
            "summary": "An intro to ownership.",
            "tags": ["rust", "ownership"]
        }))]);

        let outcome = ingest_document(
            &store,
            &ai,
            text_file("ownership-guide.md", "borrow the value"),
            UploadOptions { analyze: true },
        )
        .await;

        let UploadOutcome::Success { document, .. } = outcome else {
            panic!("expected success, got {:?}", outcome);
        };
        assert_eq!(document.title, "ownership-guide.md");
        assert_eq!(document.file_type, "md");
        assert_eq!(document.category.as_deref(), Some("tutorial"));
        assert_eq!(document.word_count, 3);
        assert_eq!(document.tags, vec!["rust", "ownership"]);
        assert_eq!(document.processing_status, "completed");
        assert!(document.indexed_at.is_some());
    }

    #[tokio::test]
    async fn test_batch_continues_after_failure() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![
            Err(AiError::Provider("rate limited".into())),
            Ok(serde_json::json!({ "summary": "ok", "tags": [] })),
        ]);

        let outcomes = ingest_all(
            &store,
            &ai,
            vec![text_file("a.md", "first"), text_file("b.md", "second")],
            UploadOptions { analyze: true },
        )
        .await;

        assert!(matches!(outcomes[0], UploadOutcome::Error { .. }));
        assert!(matches!(outcomes[1], UploadOutcome::Success { .. }));
        let docs = store.list_documents(ListOptions::all()).await.unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_content_skipped_without_ai_call() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![]);
        let opts = UploadOptions { analyze: false };

        let first = ingest_document(&store, &ai, text_file("a.md", "same"), opts).await;
        let second = ingest_document(&store, &ai, text_file("copy.md", "same"), opts).await;

        let UploadOutcome::Success { document, .. } = first else {
            panic!("expected success");
        };
        match second {
            UploadOutcome::Skipped { existing_id, .. } => assert_eq!(existing_id, document.id),
            other => panic!("expected skip, got {:?}", other),
        }
        assert_eq!(ai.calls(), 0);
    }

    #[tokio::test]
    async fn test_distinct_files_with_empty_text_are_all_kept() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![]);
        let opts = UploadOptions { analyze: false };

        let outcomes = ingest_all(
            &store,
            &ai,
            vec![
                unreadable_pdf("manual-a.pdf", b"not really a pdf AAAA"),
                unreadable_pdf("manual-b.pdf", b"a completely different broken pdf BBBB"),
            ],
            opts,
        )
        .await;

        assert!(matches!(outcomes[0], UploadOutcome::Success { .. }));
        assert!(matches!(outcomes[1], UploadOutcome::Success { .. }));
        let docs = store.list_documents(ListOptions::all()).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert_ne!(docs[0].content_hash, docs[1].content_hash);
    }

    #[tokio::test]
    async fn test_find_duplicate() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![]);
        let file = text_file("a.md", "same");
        let hash = file.content_hash.clone();

        assert!(find_duplicate(&store, "a.md", &hash).await.unwrap().is_none());
        ingest_document(&store, &ai, file, UploadOptions { analyze: false }).await;
        match find_duplicate(&store, "b.md", &hash).await.unwrap() {
            Some(UploadOutcome::Skipped { file, .. }) => assert_eq!(file, "b.md"),
            other => panic!("expected skip, got {:?}", other),
        }
    }
}
