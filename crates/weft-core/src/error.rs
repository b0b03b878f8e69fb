use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeftError {
    // Graph validation errors — raised before any node runs
    #[error("Invalid graph: {0}")]
    GraphStructure(String),

    #[error("Node not found in graph: {0}")]
    NodeNotFound(String),

    // Node configuration errors — fatal, abort the run at that node
    #[error("Configuration error: {0}")]
    Configuration(String),

    // LLM errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("LLM request failed: {0}")]
    LlmRequest(String),

    #[error("LLM response parse error: {0}")]
    LlmParse(String),

    // Tool errors
    #[error("Tool resolution failed: {0}")]
    ToolResolution(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool execution failed: {tool}: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Tool timeout after {timeout_secs}s: {tool}")]
    ToolTimeout { tool: String, timeout_secs: u64 },

    // Run lifecycle errors
    #[error("Run cancelled")]
    Cancelled,

    #[error("Run exceeded deadline ({0}s)")]
    DeadlineExceeded(u64),

    // Config file errors
    #[error("Config error: {0}")]
    Config(String),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WeftError>;
