//! システムプロンプトと会話コンテキストの組み立て
//!
//! プロンプトはターンごとにストアの現在値（件数・言及された要求の詳細）を
//! 織り込んで生成する。

use std::fmt::Write as _;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use crate::requirements::{RequirementStore, TYPE_STAKEHOLDER, TYPE_SYSTEM};

/// システムプロンプトの固定部
const SYSTEM_PROMPT: &str = r#"You are the AI assistant of a requirements management system.
Answer the user's questions based on the information below.

## System overview
This system supports requirements management: adding, searching, validating,
and analyzing dependencies between requirements.

## Requirement ID format
- STK-XXX: stakeholder requirement
- SYS-XXX: system requirement
- FUNC-XXX: functional requirement

## What you can do (tool use)
- **Add a requirement**: when the user asks to add a requirement, use the
  `add_requirement` tool to add it directly.
- Requirement IDs are assigned automatically (latest ID + 1).

## What you cannot do
- Updating or deleting requirements (planned for a future release)
- Fetching information from outside the system
- Code generation or implementation details

## Answer guidelines
1. **Be concrete**: base your answers on the requirement data.
2. **Be concise**: only the necessary information, clearly presented.
3. **Structure**: format answers in readable Markdown.
4. **Be actionable**: suggest the user's next step.
5. **Be honest**: state clearly when something cannot be done.
6. If the user writes in a specific language, respond in that language.

Be helpful and accurate when answering the user's questions."#;

/// ストアの現在値を織り込んだシステムプロンプトを生成する。
pub fn build_system_prompt(store: &RequirementStore) -> Result<String> {
    let all = store.get_all()?;

    let stakeholder_count = all.iter().filter(|r| r.rtype == TYPE_STAKEHOLDER).count();
    let system_count = all.iter().filter(|r| r.rtype == TYPE_SYSTEM).count();
    // 正規値以外（レガシーの "functional" など）は機能要求として集計する
    let functional_count = all.len() - stakeholder_count - system_count;

    let mut prompt = String::from(SYSTEM_PROMPT);
    let _ = write!(
        prompt,
        "\n\n## Current requirement data\n\
         - Total requirements: {}\n\
         - Stakeholder requirements: {}\n\
         - System requirements: {}\n\
         - Functional requirements: {}",
        all.len(),
        stakeholder_count,
        system_count,
        functional_count,
    );

    Ok(prompt)
}

/// ユーザーメッセージに言及された要求 ID を検出し、その詳細をコンテキストとして返す。
/// ID が見つからない・ストアに存在しない場合は空文字列。
pub fn additional_context(store: &RequirementStore, message: &str) -> Result<String> {
    static ID_PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = ID_PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([A-Z]+-\d+)").expect("invalid requirement id pattern")
    });

    let Some(captured) = pattern.find(message) else {
        return Ok(String::new());
    };
    let req_id = captured.as_str().to_uppercase();

    let Some(req) = store.get(&req_id)? else {
        debug!(id = %req_id, "Mentioned requirement id not found in store");
        return Ok(String::new());
    };

    debug!(id = %req_id, "Including mentioned requirement details in context");

    let mut context = String::from("\n## Details of the mentioned requirement\n");
    let _ = writeln!(context, "- **ID**: {}", req.id);
    let _ = writeln!(context, "- **Title**: {}", req.title);
    let _ = writeln!(context, "- **Type**: {}", req.rtype);
    let _ = writeln!(context, "- **Status**: {}", req.status);
    let _ = writeln!(context, "- **Priority**: {}", req.priority);
    let _ = writeln!(context, "- **Description**: {}", req.description);
    if !req.dependencies.is_empty() {
        let _ = writeln!(context, "- **Dependencies**: {}", req.dependencies.join(", "));
    }
    if !req.refines.is_empty() {
        let _ = writeln!(context, "- **Refines**: {}", req.refines.join(", "));
    }

    Ok(context)
}
