//! AI ツールの JSON スキーマ定義

use crate::assistant::protocol::ToolDefinition;

/// add_requirement ツールの定義
pub fn add_requirement_tool() -> ToolDefinition {
    ToolDefinition {
        name: "add_requirement".to_string(),
        description:
            "Add a new requirement to the system. Use this when user asks to add a requirement."
                .to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "type": {
                    "type": "string",
                    "enum": ["stakeholder", "system", "system_functional"],
                    "description": "Type of requirement: stakeholder, system, or system_functional"
                },
                "title": {
                    "type": "string",
                    "description": "Title of the requirement"
                },
                "description": {
                    "type": "string",
                    "description": "Detailed description of the requirement"
                },
                "priority": {
                    "type": "string",
                    "enum": ["critical", "high", "medium", "low"],
                    "description": "Priority level"
                },
                "category": {
                    "type": "string",
                    "description": "Category (e.g. \"maintenance\", \"safety\")"
                },
                "rationale": {
                    "type": "string",
                    "description": "Rationale for this requirement"
                }
            },
            "required": ["type", "title", "description", "priority"]
        }),
    }
}
