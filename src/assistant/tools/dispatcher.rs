//! ツール呼び出しのディスパッチ
//!
//! ツール名をハンドラに対応付け、実行結果を成功／失敗の形に正規化する。
//! ハンドラ内部のエラーはこの境界で捕捉され、失敗ペイロードとして返る。
//! この境界を越えてエラーが伝播することはない。

use serde_json::Value;
use tracing::{info, warn};

use crate::requirements::{NewRequirement, Requirement, RequirementAllocator};

/// ツール実行の正規化された結果
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    /// 実行成功。作成された要求レコードを含む。
    Success(Requirement),
    /// 実行失敗。エラーメッセージを含む。
    Failure(String),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    /// モデルに返す tool_result の JSON 表現。
    /// 元システムと同じ {"success": ..} 形を維持する。
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Success(req) => serde_json::json!({
                "success": true,
                "requirement": req,
            }),
            ToolOutcome::Failure(error) => serde_json::json!({
                "success": false,
                "error": error,
            }),
        }
    }
}

/// ツール名とハンドラの対応付け。
/// ツールを増やす場合は `execute` の match に腕を足し、
/// `build_tools` に定義を追加する。
pub struct ToolDispatcher {
    allocator: RequirementAllocator,
}

impl ToolDispatcher {
    pub fn new(allocator: RequirementAllocator) -> Self {
        Self { allocator }
    }

    /// ツールを実行し、結果を正規化して返す。決してパニック・エラー伝播しない。
    pub fn execute(&self, name: &str, input: &Value) -> ToolOutcome {
        match name {
            "add_requirement" => self.add_requirement(input),
            other => {
                warn!(tool = %other, "Unknown tool called");
                ToolOutcome::Failure(format!("Unknown tool: {other}"))
            }
        }
    }

    fn add_requirement(&self, input: &Value) -> ToolOutcome {
        // 引数は宣言したスキーマに対応する型にデシリアライズして検証する
        let parsed: NewRequirement = match serde_json::from_value(input.clone()) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Invalid add_requirement arguments");
                return ToolOutcome::Failure(format!("invalid add_requirement arguments: {e}"));
            }
        };

        match self.allocator.allocate(parsed) {
            Ok(req) => {
                info!(id = %req.id, title = %req.title, "Requirement added via tool");
                ToolOutcome::Success(req)
            }
            Err(e) => {
                warn!(error = %e, "add_requirement failed");
                ToolOutcome::Failure(e.to_string())
            }
        }
    }
}
