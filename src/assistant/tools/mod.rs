//! AI ツール関連モジュール
//!
//! ツールのスキーマ定義と、ツール呼び出しの実行・正規化を管理する。

pub mod definitions;
pub mod dispatcher;

pub use dispatcher::{ToolDispatcher, ToolOutcome};

use super::protocol::ToolDefinition;

/// モデルに提示するすべてのツール定義を構築する
pub fn build_tools() -> Vec<ToolDefinition> {
    vec![definitions::add_requirement_tool()]
}
