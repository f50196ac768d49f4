//! Agent-callable tools.
//!
//! The orchestration layer (an LLM agent or an MCP client) discovers tools
//! via `GET /tools/list` and calls them via `POST /tools/{name}`. Built-in
//! tools are registered by [`ToolRegistry::with_builtins`]; callers can add
//! their own [`Tool`] implementations in Rust.
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │           ToolRegistry           │
//! │  ┌────────────┐ ┌─────────────┐  │
//! │  │ search_faq │ │ refresh_    │  │
//! │  │            │ │ corpus      │  │
//! │  └────────────┘ └─────────────┘  │
//! └──────────────┬───────────────────┘
//!                ▼
//!          FaqService (fail-soft)
//! ```

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::MatchMode;
use crate::faq::FaqService;

/// A tool that agents can discover and call.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Route name (`POST /tools/{name}`), lowercase with underscores.
    fn name(&self) -> &str;

    /// One-line description for agent discovery.
    fn description(&self) -> &str;

    fn is_builtin(&self) -> bool {
        false
    }

    /// OpenAI function-calling JSON Schema for the parameters object.
    fn parameters_schema(&self) -> Value;

    /// Execute with a JSON object of parameters.
    ///
    /// The returned value is wrapped in `{ "result": ... }` by the server.
    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// Tool metadata as listed by `GET /tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub builtin: bool,
    pub parameters: Value,
}

/// Bridge from a tool invocation to the FAQ service.
#[derive(Clone)]
pub struct ToolContext {
    service: Arc<FaqService>,
}

impl ToolContext {
    pub fn new(service: Arc<FaqService>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &FaqService {
        &self.service
    }
}

// ============ Built-in tools ============

/// `search_faq`: `{ query, mode? }` → `{ query, results }`.
pub struct SearchFaqTool;

#[async_trait]
impl Tool for SearchFaqTool {
    fn name(&self) -> &str {
        "search_faq"
    }

    fn description(&self) -> &str {
        "Search the company FAQ for entries matching a customer question"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string", "description": "Customer question" },
                "mode": {
                    "type": "string",
                    "enum": ["strict", "citation"],
                    "default": "citation",
                    "description": "strict: best single answer; citation: up to K candidates"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let query = params
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow::anyhow!("invalid params: 'query' must be a string"))?;
        let mode = match params.get("mode").and_then(Value::as_str) {
            Some(m) => m.parse::<MatchMode>()?,
            None => MatchMode::Citation,
        };

        let response = ctx.service().search(query, mode).await;
        Ok(serde_json::to_value(response)?)
    }
}

/// `refresh_corpus`: re-fetch the FAQ page and replace the index.
pub struct RefreshCorpusTool;

#[async_trait]
impl Tool for RefreshCorpusTool {
    fn name(&self) -> &str {
        "refresh_corpus"
    }

    fn description(&self) -> &str {
        "Re-fetch the FAQ source page and rebuild the cached corpus"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value, ctx: &ToolContext) -> Result<Value> {
        let index = ctx.service().store().refresh().await?;
        Ok(serde_json::json!({ "entries": index.len() }))
    }
}

// ============ Registry ============

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry pre-loaded with `search_faq` and `refresh_corpus`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(SearchFaqTool));
        registry.register(Box::new(RefreshCorpusTool));
        registry
    }

    /// Register a tool. On duplicate names, [`find`](Self::find) returns
    /// the first registration.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn infos(&self) -> Vec<ToolInfo> {
        self.tools
            .iter()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                builtin: t.is_builtin(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
