//! 要求管理ドメインモジュール
//!
//! 要求レコードの型定義、SQLite ストア、ID 採番ロジックを提供する。

pub mod allocator;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use allocator::{NewRequirement, RequirementAllocator};
pub use store::RequirementStore;

/// AI アシスタントが作成した要求の author フィールドに設定する固定値
pub const ASSISTANT_AUTHOR: &str = "AI Chat Assistant";

/// 要求タイプの正規値
pub const TYPE_STAKEHOLDER: &str = "stakeholder";
pub const TYPE_SYSTEM: &str = "system";
pub const TYPE_SYSTEM_FUNCTIONAL: &str = "system_functional";

/// 要求タイプ文字列から ID プレフィックスを決定する。
///
/// stakeholder → STK、system → SYS、それ以外（未知・未指定を含む）→ FUNC。
/// 未知の値を FUNC に倒すのは元システムの挙動をそのまま維持したもの。
pub fn type_prefix(rtype: &str) -> &'static str {
    match rtype {
        TYPE_STAKEHOLDER => "STK",
        TYPE_SYSTEM => "SYS",
        _ => "FUNC",
    }
}

/// 要求の優先度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Priority::Critical),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 要求のステータス。新規作成時は必ず `Draft`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Draft,
    Proposed,
    Approved,
    InProgress,
    Completed,
    Rejected,
    OnHold,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Proposed => "proposed",
            Status::Approved => "approved",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
            Status::Rejected => "rejected",
            Status::OnHold => "on_hold",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Status::Draft),
            "proposed" => Some(Status::Proposed),
            "approved" => Some(Status::Approved),
            "in_progress" => Some(Status::InProgress),
            "completed" => Some(Status::Completed),
            "rejected" => Some(Status::Rejected),
            "on_hold" => Some(Status::OnHold),
            _ => None,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 要求レコード。
///
/// `rtype` は正規値（stakeholder / system / system_functional）以外も
/// そのまま保持する。プレフィックス決定時に FUNC へフォールバックするため、
/// enum ではなく文字列のまま持つ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    #[serde(rename = "type")]
    pub rtype: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rationale: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub refines: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_prefix_maps_known_types() {
        assert_eq!(type_prefix("stakeholder"), "STK");
        assert_eq!(type_prefix("system"), "SYS");
        assert_eq!(type_prefix("system_functional"), "FUNC");
    }

    #[test]
    fn type_prefix_defaults_to_func() {
        // 未知のタイプ・空文字列は FUNC に倒す（元システムの挙動）
        assert_eq!(type_prefix("quality"), "FUNC");
        assert_eq!(type_prefix(""), "FUNC");
    }

    #[test]
    fn priority_roundtrip() {
        for p in [
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ] {
            assert_eq!(Priority::parse(p.as_str()), Some(p));
        }
        assert_eq!(Priority::parse("urgent"), None);
    }

    #[test]
    fn status_roundtrip() {
        for s in [
            Status::Draft,
            Status::Proposed,
            Status::Approved,
            Status::InProgress,
            Status::Completed,
            Status::Rejected,
            Status::OnHold,
        ] {
            assert_eq!(Status::parse(s.as_str()), Some(s));
        }
        assert_eq!(Status::parse("done"), None);
    }

    #[test]
    fn requirement_serializes_with_original_field_names() {
        let now = Utc::now();
        let req = Requirement {
            id: "STK-001".to_string(),
            rtype: "stakeholder".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            priority: Priority::High,
            status: Status::Draft,
            category: String::new(),
            rationale: String::new(),
            dependencies: vec![],
            refines: vec![],
            tags: vec![],
            author: ASSISTANT_AUTHOR.to_string(),
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "stakeholder");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["status"], "draft");
        // JSON 上のフィールド名は外部ストアと同じ camelCase
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }
}
