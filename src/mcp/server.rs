// file: src/mcp/server.rs
// description: MCP server exposing code files and summarization tools
// reference: https://docs.rs/rmcp

use crate::config::{Config, ConfigStore, ConfigUpdate};
use crate::exporter::write_results;
use crate::mcp::rate_limit::FixedWindowLimiter;
use crate::models::{DetailLevel, LanguageTag, SummaryOptions, relative_display};
use crate::pipeline::BatchSummarizer;
use crate::repository::find_files;
use crate::summarizer::CodeSummarizer;
use crate::utils::validation::Validator;
use rmcp::handler::server::router::prompt::PromptRouter;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::service::RequestContext;
use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, prompt, prompt_handler, prompt_router, tool,
    tool_handler, tool_router,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Resources listed per request.
pub const RESOURCE_LIMIT: usize = 50;

const STDIO_CALLER: &str = "stdio";
const FILE_SCHEME: &str = "file://";

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFilesRequest {
    /// Directory to scan (default: the server's working directory)
    pub directory: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SummarizeFileRequest {
    /// Path to the file to summarize
    pub file_path: String,
    /// Level of detail for the summary
    pub detail_level: Option<DetailLevel>,
    /// Maximum length of the summary in characters
    pub max_length: Option<u32>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SummarizeDirectoryRequest {
    /// Path to the directory to summarize (default: the server's working directory)
    pub directory: Option<String>,
    /// Level of detail for summaries
    pub detail_level: Option<DetailLevel>,
    /// Maximum length of each summary in characters
    pub max_length: Option<u32>,
    /// Optional file to save summaries to
    pub output_file: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AnalyzeCodebaseArgs {
    /// Directory to analyze
    pub directory: Option<String>,
    /// What to focus on (architecture, functionality, etc.)
    pub focus: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExplainFileArgs {
    /// Path to the file to explain
    pub file_path: String,
}

#[derive(Clone)]
pub struct CodeSummarizerMcp {
    store: Arc<ConfigStore>,
    config: Arc<Mutex<Config>>,
    summarizer: Arc<Mutex<Option<CodeSummarizer>>>,
    limiter: Arc<FixedWindowLimiter>,
    workdir: PathBuf,
    tool_router: ToolRouter<Self>,
    prompt_router: PromptRouter<Self>,
}

impl CodeSummarizerMcp {
    pub fn new(store: ConfigStore, config: Config, workdir: PathBuf) -> Self {
        let limiter = FixedWindowLimiter::per_minute(config.server.rate_limit_per_minute);
        Self {
            store: Arc::new(store),
            config: Arc::new(Mutex::new(config)),
            summarizer: Arc::new(Mutex::new(None)),
            limiter: Arc::new(limiter),
            workdir,
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    /// Use `summarizer` instead of building one from the configured API key.
    pub fn with_summarizer(self, summarizer: CodeSummarizer) -> Self {
        Self {
            summarizer: Arc::new(Mutex::new(Some(summarizer))),
            ..self
        }
    }

    fn check_rate_limit(&self) -> Result<(), McpError> {
        if self.limiter.check(STDIO_CALLER) {
            Ok(())
        } else {
            Err(McpError::invalid_request(
                "Rate limit exceeded. Try again in a minute.",
                None,
            ))
        }
    }

    /// The active summarizer, built on first use. `None` when no API key is
    /// configured.
    async fn ensure_summarizer(&self) -> Option<CodeSummarizer> {
        let mut summarizer = self.summarizer.lock().await;
        if summarizer.is_none() {
            let config = self.config.lock().await;
            match CodeSummarizer::from_config(&config) {
                Ok(built) => *summarizer = Some(built),
                Err(e) => {
                    error!("MCP: cannot build summarizer: {}", e);
                    return None;
                }
            }
        }
        summarizer.clone()
    }

    async fn batcher(&self) -> Option<BatchSummarizer> {
        let summarizer = self.ensure_summarizer().await?;
        let config = self.config.lock().await;
        Some(BatchSummarizer::from_config(summarizer, &config.pipeline))
    }

    async fn resolve_options(
        &self,
        detail_level: Option<DetailLevel>,
        max_length: Option<u32>,
    ) -> Result<SummaryOptions, McpError> {
        let defaults = self.config.lock().await.summary;
        SummaryOptions::new(
            detail_level.unwrap_or(defaults.detail_level),
            max_length.unwrap_or(defaults.max_length),
        )
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
    }

    fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workdir.join(path)
        }
    }

    async fn code_files(&self, directory: &Path) -> Result<Vec<PathBuf>, McpError> {
        Validator::validate_directory(directory)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
        let mut files = find_files(directory)
            .await
            .map_err(|e| McpError::internal_error(format!("Failed to scan directory: {}", e), None))?;
        files.sort();
        Ok(files)
    }
}

fn missing_api_key() -> CallToolResult {
    CallToolResult::error(vec![Content::text(
        "API key not configured. Use the configure tool to set it.",
    )])
}

#[tool_router]
impl CodeSummarizerMcp {
    #[tool(description = "List the code files that would be summarized in a directory")]
    pub async fn list_code_files(
        &self,
        Parameters(request): Parameters<ListFilesRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.check_rate_limit()?;

        let directory = self.resolve_path(request.directory.as_deref().unwrap_or("."));
        let files = self.code_files(&directory).await?;
        let root = std::path::absolute(&directory).unwrap_or(directory);

        if files.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No code files found.",
            )]));
        }

        let listing: Vec<String> = files
            .iter()
            .map(|path| {
                format!(
                    "- {} ({})",
                    relative_display(path, &root),
                    LanguageTag::from_path(path)
                )
            })
            .collect();

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Found {} code files in {}:\n{}",
            files.len(),
            root.display(),
            listing.join("\n")
        ))]))
    }

    #[tool(description = "Summarize a single code file")]
    pub async fn summarize_file(
        &self,
        Parameters(request): Parameters<SummarizeFileRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.check_rate_limit()?;

        let options = self
            .resolve_options(request.detail_level, request.max_length)
            .await?;
        let path = self.resolve_path(&request.file_path);
        if !path.is_file() {
            return Err(McpError::invalid_params(
                format!("File not found: {}", request.file_path),
                None,
            ));
        }

        let Some(batcher) = self.batcher().await else {
            return Ok(missing_api_key());
        };

        info!("MCP: Summarizing file {}", path.display());
        let root = path.parent().unwrap_or(self.workdir.as_path()).to_path_buf();
        let result = batcher.summarize_one(&path, &root, options).await;

        let text = format!(
            "File: {}\nLanguage: {}\nSummary: {}",
            request.file_path, result.language, result.summary
        );
        if result.outcome.is_degraded() {
            Ok(CallToolResult::error(vec![Content::text(text)]))
        } else {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
    }

    #[tool(description = "Summarize all code files in a directory")]
    pub async fn summarize_directory(
        &self,
        Parameters(request): Parameters<SummarizeDirectoryRequest>,
    ) -> Result<CallToolResult, McpError> {
        self.check_rate_limit()?;

        let options = self
            .resolve_options(request.detail_level, request.max_length)
            .await?;
        let directory = self.resolve_path(request.directory.as_deref().unwrap_or("."));
        let files = self.code_files(&directory).await?;

        if files.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(
                "No code files found to summarize.",
            )]));
        }

        let Some(batcher) = self.batcher().await else {
            return Ok(missing_api_key());
        };

        let root = std::path::absolute(&directory).unwrap_or(directory);
        let batch_size = self.config.lock().await.pipeline.batch_size;

        info!("MCP: Summarizing {} files in {}", files.len(), root.display());
        let results = batcher
            .summarize_all(&files, &root, options, batch_size)
            .await;

        let mut response = format!(
            "Summarized {} files from {}:\n\n",
            results.len(),
            root.display()
        );
        for result in &results {
            response.push_str(&format!("**{}**\n{}\n\n", result.path, result.summary));
        }

        if let Some(output_file) = &request.output_file {
            let output = self.resolve_path(output_file);
            write_results(&results, &root, &output)
                .await
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            response.push_str(&format!("Summaries also saved to: {}", output_file));
        }

        Ok(CallToolResult::success(vec![Content::text(
            response.trim_end().to_string(),
        )]))
    }

    #[tool(description = "Show or update configuration settings. Call without arguments to view the current settings.")]
    pub async fn configure(
        &self,
        Parameters(update): Parameters<ConfigUpdate>,
    ) -> Result<CallToolResult, McpError> {
        self.check_rate_limit()?;

        if update.is_empty() {
            let config = self.config.lock().await;
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "Current configuration:\n- API Key: {}\n- Port: {}\n- Detail Level: {}\n- Max Length: {}\n- Batch Size: {}",
                config.masked_api_key(),
                config.port,
                config.summary.detail_level,
                config.summary.max_length,
                config.pipeline.batch_size
            ))]));
        }

        let updated = self
            .store
            .update(&update)
            .await
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        *self.config.lock().await = updated;
        if update.api_key.is_some() {
            *self.summarizer.lock().await = None;
        }

        let mut response = String::from("Configuration updated:\n");
        if update.api_key.is_some() {
            response.push_str("- api_key: ***\n");
        }
        if let Some(port) = update.port {
            response.push_str(&format!("- port: {}\n", port));
        }
        if let Some(detail_level) = update.detail_level {
            response.push_str(&format!("- detail_level: {}\n", detail_level));
        }
        if let Some(max_length) = update.max_length {
            response.push_str(&format!("- max_length: {}\n", max_length));
        }
        if let Some(batch_size) = update.batch_size {
            response.push_str(&format!("- batch_size: {}\n", batch_size));
        }

        Ok(CallToolResult::success(vec![Content::text(
            response.trim_end().to_string(),
        )]))
    }
}

#[prompt_router]
impl CodeSummarizerMcp {
    #[prompt(
        name = "analyze_codebase",
        description = "Analyze and summarize an entire codebase"
    )]
    pub async fn analyze_codebase(
        &self,
        Parameters(args): Parameters<AnalyzeCodebaseArgs>,
    ) -> Result<GetPromptResult, McpError> {
        let directory = args.directory.as_deref().unwrap_or(".");
        let focus = args
            .focus
            .as_deref()
            .unwrap_or("overall architecture and functionality");

        let text = format!(
            "Please analyze the codebase in the directory '{directory}' with a focus on {focus}.\n\n\
             Use the summarize_directory tool to get summaries of all code files, then provide:\n\
             1. Overall architecture and structure\n\
             2. Key components and their purposes\n\
             3. Main functionality and features\n\
             4. Notable patterns or design decisions\n\
             5. Suggestions for improvement or areas of interest\n\n\
             Start by calling: summarize_directory with directory=\"{directory}\""
        );

        Ok(GetPromptResult {
            description: Some(format!("Analyze the codebase in {}", directory)),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }

    #[prompt(
        name = "explain_file",
        description = "Get a detailed explanation of a specific file"
    )]
    pub async fn explain_file(
        &self,
        Parameters(args): Parameters<ExplainFileArgs>,
    ) -> Result<GetPromptResult, McpError> {
        let file_path = args.file_path.trim();
        if file_path.is_empty() {
            return Err(McpError::invalid_params(
                "file_path is required for explain_file prompt",
                None,
            ));
        }

        let text = format!(
            "Please provide a detailed explanation of the file '{file_path}'.\n\n\
             Use the summarize_file tool with high detail level to get a comprehensive summary, then explain:\n\
             1. What this file does and its purpose\n\
             2. Key functions, classes, or components\n\
             3. How it fits into the larger codebase\n\
             4. Any notable implementation details\n\
             5. Potential improvements or concerns\n\n\
             Start by calling: summarize_file with file_path=\"{file_path}\" and detail_level=\"high\""
        );

        Ok(GetPromptResult {
            description: Some(format!("Explain {}", file_path)),
            messages: vec![PromptMessage::new_text(PromptMessageRole::User, text)],
        })
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for CodeSummarizerMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Code summarizer. Use 'list_code_files' to see eligible files, 'summarize_file' or 'summarize_directory' to generate summaries, and 'configure' to set the Gemini API key and defaults. Code files in the working directory are available as resources; 'analyze_codebase' and 'explain_file' prompts guide multi-step use.".into()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            server_info: Implementation::from_build_env(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let files = match find_files(&self.workdir).await {
            Ok(mut files) => {
                files.sort();
                files
            }
            Err(e) => {
                error!("MCP: error listing code files: {}", e);
                Vec::new()
            }
        };

        let resources = files
            .iter()
            .take(RESOURCE_LIMIT)
            .map(|path| {
                let relative = relative_display(path, &self.workdir);
                let mut resource = RawResource::new(
                    format!("{}{}", FILE_SCHEME, relative),
                    format!("Code file: {}", relative),
                );
                resource.description = Some(format!("{} file", LanguageTag::from_path(path)));
                resource.mime_type = Some("text/plain".to_string());
                resource.no_annotation()
            })
            .collect();

        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        ReadResourceRequestParam { uri }: ReadResourceRequestParam,
        _: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        let Some(raw_path) = uri.strip_prefix(FILE_SCHEME) else {
            return Err(McpError::invalid_params(
                format!("Unsupported URI scheme: {}", uri),
                None,
            ));
        };

        let path = self.resolve_path(raw_path);
        if !path.is_file() {
            return Err(McpError::resource_not_found(
                format!("File not found: {}", raw_path),
                None,
            ));
        }
        Validator::validate_within_base_dir(&path, &self.workdir)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            McpError::internal_error(format!("Error reading file: {}", e), None)
        })?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, uri)],
        })
    }
}
