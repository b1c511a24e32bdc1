//! MCP (Model Context Protocol) server.
//!
//! Exposes the draft operations as tools over stdio. Every tool that acts on
//! behalf of someone takes the acting user explicitly in its parameters.
//!
//! A rejected operation (prefix rewritten, limit exceeded, not the owner, ...)
//! is a tool error: the result has `is_error` set and carries a JSON body with
//! the error `kind`, its `message`, and whether it is `retryable`. Protocol
//! errors are reserved for malformed or oversized requests.
//!
//! Store access is blocking file I/O, so tools that touch drafts run it on
//! tokio's blocking pool.

use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::schemars;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde::Serialize;

use codraft_core::{
    DraftError, DraftId, Drafts, FileStore, LimitUnit, NewDraft, TextMetrics, UserId,
};

/// Parameters for the `get_info` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct GetInfoParams {
    /// Output format: "text" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_format() -> String {
    "text".to_string()
}

/// Parameters for the `create_draft` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CreateDraftParams {
    /// Id of the user creating the draft; only they may complete it.
    pub user: String,
    /// Title, 1 to 50 characters.
    pub title: String,
    /// Category, 1 to 50 characters.
    pub category: String,
    /// Unit each contribution is measured in.
    pub unit: LimitUnit,
    /// Units a single contribution may add; must be positive.
    pub quantity: i64,
    /// Opening text, recorded as the first contribution.
    pub initial_text: String,
}

/// Parameters for tools that address one draft.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DraftParams {
    /// Draft id.
    pub draft_id: DraftId,
}

/// Parameters for the `add_contribution` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AddContributionParams {
    /// Draft id.
    pub draft_id: DraftId,
    /// Id of the contributing user.
    pub user: String,
    /// The complete new text. It must start with the current text unchanged.
    pub text: String,
}

/// Parameters for the `complete_draft` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct CompleteDraftParams {
    /// Draft id.
    pub draft_id: DraftId,
    /// Id of the acting user; must be the draft's creator.
    pub user: String,
}

/// Parameters for the `list_history` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ListHistoryParams {
    /// Draft id.
    pub draft_id: DraftId,
    /// Return at most this many contributions, newest first.
    pub limit: Option<usize>,
}

/// Parameters for the `list_drafts` tool.
#[derive(Debug, Default, serde::Deserialize, schemars::JsonSchema)]
pub struct ListDraftsParams {
    /// When set, list only drafts this user created or contributed to.
    pub user: Option<String>,
}

/// Parameters for the `measure_text` tool.
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MeasureTextParams {
    /// The text to measure.
    pub text: String,
}

/// MCP server exposing draft operations.
#[derive(Clone)]
pub struct DraftServer {
    drafts: Arc<Drafts<FileStore>>,
    max_input: Option<usize>,
    tool_router: rmcp::handler::server::router::tool::ToolRouter<Self>,
}

#[tool_router]
impl DraftServer {
    /// Serve `drafts`, refusing text parameters larger than `max_input` bytes.
    pub fn new(drafts: Drafts<FileStore>, max_input: Option<usize>) -> Self {
        Self {
            drafts: Arc::new(drafts),
            max_input,
            tool_router: Self::tool_router(),
        }
    }

    /// Get project information.
    #[tool(description = "Get the server's name, version, and description")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    fn get_info(
        &self,
        Parameters(params): Parameters<GetInfoParams>,
    ) -> Result<CallToolResult, McpError> {
        let info = serde_json::json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": env!("CARGO_PKG_DESCRIPTION"),
        });

        let text = if params.format == "json" {
            to_json(&info)?
        } else {
            format!(
                "{} v{}\n{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION"),
                env!("CARGO_PKG_DESCRIPTION"),
            )
        };
        Ok(CallToolResult::success(vec![Content::text(text)]))
    }

    #[tool(
        description = "Start a new draft. Each later contribution may add at most `quantity` \
                       words, sentences, or paragraphs. Returns the draft id."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server", user = %params.user))]
    async fn create_draft(
        &self,
        Parameters(params): Parameters<CreateDraftParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_input("initial_text", &params.initial_text)?;
        let creator = UserId::from(params.user);
        let request = NewDraft {
            title: params.title,
            category: params.category,
            unit: params.unit,
            quantity: params.quantity,
            initial_text: params.initial_text,
        };
        let created = self
            .with_drafts(move |drafts| drafts.create_draft(&creator, request))
            .await?;
        let id = match created {
            Ok(id) => id,
            Err(e) => return Ok(rejected(&e)),
        };
        tracing::info!(tool = "create_draft", draft = %id, "MCP tool completed");
        success(&serde_json::json!({ "draft_id": id }))
    }

    #[tool(description = "Get the current full text of a draft.")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    async fn get_current_text(
        &self,
        Parameters(params): Parameters<DraftParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.draft_id;
        match self.with_drafts(move |drafts| drafts.current_text(id)).await? {
            Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Err(e) => Ok(rejected(&e)),
        }
    }

    #[tool(
        description = "Propose a new full text for a draft. The text must start with the \
                       current text unchanged and add between 1 and the draft's limit of units."
    )]
    #[tracing::instrument(
        skip(self, params),
        fields(otel.kind = "server", draft = %params.draft_id)
    )]
    async fn add_contribution(
        &self,
        Parameters(params): Parameters<AddContributionParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_input("text", &params.text)?;
        let AddContributionParams {
            draft_id,
            user,
            text,
        } = params;
        let author = UserId::from(user);
        let outcome = self
            .with_drafts(move |drafts| drafts.add_contribution(draft_id, &author, &text))
            .await?;
        match outcome {
            Ok(added) => {
                tracing::info!(
                    tool = "add_contribution",
                    delta = added.delta,
                    "MCP tool completed"
                );
                success(&added)
            }
            Err(e) => Ok(rejected(&e)),
        }
    }

    #[tool(description = "Close a draft to further contributions. Only its creator may.")]
    #[tracing::instrument(
        skip(self, params),
        fields(otel.kind = "server", draft = %params.draft_id)
    )]
    async fn complete_draft(
        &self,
        Parameters(params): Parameters<CompleteDraftParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.draft_id;
        let actor = UserId::from(params.user);
        match self
            .with_drafts(move |drafts| drafts.complete_draft(id, &actor))
            .await?
        {
            Ok(()) => success(&serde_json::json!({
                "draft_id": id,
                "state": "completed",
            })),
            Err(e) => Ok(rejected(&e)),
        }
    }

    #[tool(description = "List a draft's contributions, newest first, with full snapshots.")]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    async fn list_history(
        &self,
        Parameters(params): Parameters<ListHistoryParams>,
    ) -> Result<CallToolResult, McpError> {
        let id = params.draft_id;
        match self.with_drafts(move |drafts| drafts.list_history(id)).await? {
            Ok(mut history) => {
                if let Some(n) = params.limit {
                    history.truncate(n);
                }
                success(&history)
            }
            Err(e) => Ok(rejected(&e)),
        }
    }

    #[tool(
        description = "List drafts, newest first. With `user`, returns the drafts that user \
                       created and those they contributed to."
    )]
    #[tracing::instrument(skip(self), fields(otel.kind = "server"))]
    async fn list_drafts(
        &self,
        Parameters(params): Parameters<ListDraftsParams>,
    ) -> Result<CallToolResult, McpError> {
        let outcome = self
            .with_drafts(move |drafts| match params.user {
                Some(user) => drafts
                    .drafts_for_user(&UserId::from(user))
                    .map(serde_json::to_value),
                None => drafts.list_drafts().map(serde_json::to_value),
            })
            .await?;
        match outcome {
            Ok(value) => success(&value.map_err(serialization_error)?),
            Err(e) => Ok(rejected(&e)),
        }
    }

    #[tool(
        description = "Count words, sentences, paragraphs, and lines the way limits are measured."
    )]
    #[tracing::instrument(skip(self, params), fields(otel.kind = "server"))]
    fn measure_text(
        &self,
        Parameters(params): Parameters<MeasureTextParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_input("text", &params.text)?;
        success(&TextMetrics::of(&params.text))
    }
}

impl DraftServer {
    async fn with_drafts<T, F>(&self, op: F) -> Result<T, McpError>
    where
        F: FnOnce(&Drafts<FileStore>) -> T + Send + 'static,
        T: Send + 'static,
    {
        let drafts = Arc::clone(&self.drafts);
        tokio::task::spawn_blocking(move || op(&drafts))
            .await
            .map_err(|e| McpError::internal_error(format!("store task failed: {e}"), None))
    }

    fn check_input(&self, field: &str, text: &str) -> Result<(), McpError> {
        match self.max_input {
            Some(max) if text.len() > max => Err(McpError::invalid_params(
                format!("{field} is {} bytes (limit: {max} bytes)", text.len()),
                None,
            )),
            _ => Ok(()),
        }
    }
}

#[tool_handler]
impl ServerHandler for DraftServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            instructions: Some(format!(
                "{} MCP server. Drafts grow by contributions: each one resends the whole \
                 text, keeps the current text as its prefix, and adds at most the draft's \
                 limit. Pass the acting user's id on every call.",
                env!("CARGO_PKG_NAME"),
            )),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(value).map_err(serialization_error)
}

fn serialization_error(e: serde_json::Error) -> McpError {
    McpError::internal_error(format!("serialization error: {e}"), None)
}

fn success<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(to_json(value)?)]))
}

fn rejected(err: &DraftError) -> CallToolResult {
    tracing::info!(kind = err.kind(), error = %err, "MCP tool rejected request");
    let body = serde_json::json!({
        "error": err.kind(),
        "message": err.to_string(),
        "retryable": err.is_retryable(),
    });
    CallToolResult::error(vec![Content::text(body.to_string())])
}
