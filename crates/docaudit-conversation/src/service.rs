//! Request services
//!
//! Entry points behind the doc-analyst and doc-audit endpoints. Both fetch
//! the caller's uploads from blob storage, turn them into prompt context and
//! hand over to the chat or audit flow.

use docaudit_core::{
    AuditEvent, AuthOutcome, BlobStore, ConversationMessage, DocAuditRequest, PresignedUpload,
    QueryRequest, QueryResponse, UploadedFile,
};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::AuditOrchestrator;
use crate::chat::ChatService;
use crate::context::DocumentContext;
use crate::prompts::CHAT_GREETING;
use crate::style_guides::StyleGuideLibrary;
use crate::Result;

fn log_auth(auth: &AuthOutcome) {
    match auth {
        AuthOutcome::Verified(identity) => {
            debug!(user = %identity.username, "Request authenticated");
        }
        AuthOutcome::Failed(reason) => {
            warn!(reason = %reason, "Request not authenticated, proceeding anyway");
        }
    }
}

fn requested_names(raw: &str) -> Vec<&str> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty()).collect()
}

/// Download every object under the user's prefix whose key ends with one
/// of the comma-separated `file_names`. Uploads are named after the
/// requested file name, not the storage key.
pub async fn fetch_user_files(
    store: &dyn BlobStore,
    user_id: &str,
    file_names: &str,
) -> Result<Vec<UploadedFile>> {
    let names = requested_names(file_names);
    if names.is_empty() {
        return Ok(Vec::new());
    }

    let prefix = format!("{}/", user_id.trim_end_matches('/'));
    let keys = store.list(&prefix).await?;

    let mut files = Vec::new();
    for key in &keys {
        if let Some(name) = names.iter().find(|name| key.ends_with(*name)) {
            let bytes = store.download(key).await?;
            debug!(key = %key, bytes = bytes.len(), "Downloaded user file");
            files.push(UploadedFile::new(*name, bytes));
        }
    }

    info!(user = %user_id, requested = names.len(), found = files.len(), "Fetched user files");
    Ok(files)
}

/// Reserve a unique key under the user's prefix and presign an upload to it
pub async fn presign_upload(
    store: &dyn BlobStore,
    user_id: &str,
    file_name: &str,
    content_type: &str,
    ttl: Duration,
) -> Result<PresignedUpload> {
    let file_key = format!("{}/{}-{}", user_id.trim_end_matches('/'), Uuid::new_v4(), file_name);
    let presigned_url = store.presigned_put_url(&file_key, content_type, ttl).await?;

    info!(key = %file_key, ttl_secs = ttl.as_secs(), "Presigned upload");
    Ok(PresignedUpload {
        presigned_url,
        file_key,
    })
}

/// Answers a question about a user's uploaded files
pub struct DocAnalystService {
    store: Arc<dyn BlobStore>,
    context: Arc<DocumentContext>,
    chat: Arc<ChatService>,
    summarize: bool,
}

impl DocAnalystService {
    pub fn new(store: Arc<dyn BlobStore>, context: Arc<DocumentContext>, chat: Arc<ChatService>) -> Self {
        Self {
            store,
            context,
            chat,
            summarize: false,
        }
    }

    /// Condense uploads through the summarizer before chatting
    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    pub async fn query(&self, request: &QueryRequest, auth: &AuthOutcome) -> QueryResponse {
        log_auth(auth);
        info!(
            user = %request.userid,
            files = %request.file_names,
            template = %request.template_name,
            "Doc analyst query"
        );

        let files = match fetch_user_files(self.store.as_ref(), &request.userid, &request.file_names).await {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Failed to fetch user files");
                return QueryResponse::error(e);
            }
        };

        let prepared = match self.context.prepare(&files, self.summarize).await {
            Ok(prepared) => prepared,
            Err(e) => {
                error!(error = %e, "Failed to prepare document context");
                return QueryResponse::error(e);
            }
        };

        let messages = vec![
            ConversationMessage::assistant(CHAT_GREETING),
            ConversationMessage::user(request.user_input.as_str()),
        ];
        let answer = self
            .chat
            .respond(&messages, &prepared.template_contents, &prepared.additional_context)
            .await;

        QueryResponse::ok(answer)
    }
}

/// Audits a user's uploaded document against the style guides
pub struct DocAuditService {
    store: Arc<dyn BlobStore>,
    context: Arc<DocumentContext>,
    orchestrator: AuditOrchestrator,
    summarize: bool,
}

impl DocAuditService {
    pub fn new(
        store: Arc<dyn BlobStore>,
        context: Arc<DocumentContext>,
        orchestrator: AuditOrchestrator,
    ) -> Self {
        Self {
            store,
            context,
            orchestrator,
            summarize: false,
        }
    }

    pub fn with_summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    /// Stream audit events for `request`. Failures before the first round
    /// surface as a single error event.
    pub fn audit(
        &self,
        request: DocAuditRequest,
        auth: AuthOutcome,
    ) -> impl Stream<Item = AuditEvent> + Send + 'static {
        let store = self.store.clone();
        let context = self.context.clone();
        let orchestrator = self.orchestrator.clone();
        let summarize = self.summarize;

        async_stream::stream! {
            log_auth(&auth);
            info!(
                user = %request.userid,
                file = %request.file_name,
                guides = %request.style_guide_file_names,
                "Doc audit request"
            );

            let files = match fetch_user_files(store.as_ref(), &request.userid, &request.file_name).await {
                Ok(files) => files,
                Err(e) => {
                    error!(error = %e, "Failed to fetch user files");
                    yield AuditEvent::error(&e);
                    return;
                }
            };

            let prepared = match context.prepare(&files, summarize).await {
                Ok(prepared) => prepared,
                Err(e) => {
                    error!(error = %e, "Failed to prepare document context");
                    yield AuditEvent::error(&e);
                    return;
                }
            };

            let filter = StyleGuideLibrary::parse_filter(&request.style_guide_file_names);
            let events = orchestrator.run(filter, prepared.additional_context);
            futures::pin_mut!(events);
            while let Some(event) = events.next().await {
                yield event;
            }
        }
    }
}
