//! Tool schema exposed to the live model and parsing of its calls

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Name of the tool that saves a new idea
pub const CREATE_IDEA: &str = "createIdea";

/// Name of the tool that searches past ideas
pub const RECALL_IDEAS: &str = "recallIdeas";

/// A function the live model may call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Declarations registered when a session opens
pub fn tool_declarations() -> Vec<FunctionDeclaration> {
    vec![
        FunctionDeclaration {
            name: CREATE_IDEA,
            description:
                "Save a structured idea, memory, or thought to the second brain database.",
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "title": {
                        "type": "STRING",
                        "description": "A short, punchy 3-5 word title for the idea."
                    },
                    "summary": {
                        "type": "STRING",
                        "description": "A 1-2 sentence summary of the core concept."
                    },
                    "tags": {
                        "type": "ARRAY",
                        "items": { "type": "STRING" },
                        "description": "Keywords or tags."
                    }
                },
                "required": ["title", "summary"]
            }),
        },
        FunctionDeclaration {
            name: RECALL_IDEAS,
            description: "Search for past ideas based on a query string.",
            parameters: json!({
                "type": "OBJECT",
                "properties": {
                    "query": {
                        "type": "STRING",
                        "description": "The topic to search for."
                    }
                },
                "required": ["query"]
            }),
        },
    ]
}

/// Why a function call could not be turned into a [`ToolRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolRequestError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },
}

#[derive(Debug, Deserialize)]
struct CreateIdeaArgs {
    title: String,
    summary: String,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RecallIdeasArgs {
    query: String,
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolRequest {
    CreateIdea {
        title: String,
        summary: String,
        tags: Vec<String>,
    },
    RecallIdeas {
        query: String,
    },
}

impl ToolRequest {
    /// Parse a call by tool name and JSON arguments
    pub fn parse(name: &str, args: &Value) -> Result<Self, ToolRequestError> {
        let invalid = |e: serde_json::Error| ToolRequestError::InvalidArguments {
            tool: name.to_string(),
            message: e.to_string(),
        };

        match name {
            CREATE_IDEA => {
                let args: CreateIdeaArgs =
                    serde_json::from_value(args.clone()).map_err(invalid)?;
                Ok(Self::CreateIdea {
                    title: args.title,
                    summary: args.summary,
                    tags: args.tags.unwrap_or_default(),
                })
            }
            RECALL_IDEAS => {
                let args: RecallIdeasArgs =
                    serde_json::from_value(args.clone()).map_err(invalid)?;
                Ok(Self::RecallIdeas { query: args.query })
            }
            other => Err(ToolRequestError::UnknownTool(other.to_string())),
        }
    }
}
