//! フォールバック応答
//!
//! API キー未設定でモデルを呼べないときに、定型の案内を返す。

/// AI が利用できない場合の定型応答を生成する。
pub fn fallback_response(message: &str) -> String {
    let lower = message.to_lowercase();

    if lower.contains("add") || lower.contains("create") {
        return "✅ Adding requirements through chat needs the AI assistant.\n\n\
                💡 Set the `ANTHROPIC_API_KEY` environment variable to enable it, \
                then restart reqchat."
            .to_string();
    }

    if lower.contains("search") || lower.contains("find") {
        return "🔍 Search through chat needs the AI assistant.\n\n\
                💡 Set the `ANTHROPIC_API_KEY` environment variable to enable it, \
                then restart reqchat."
            .to_string();
    }

    "Hello! This is the requirements management assistant. 🤖\n\n\
     The AI chat features are currently disabled.\n\n\
     ## Enable AI chat\n\
     Set the `ANTHROPIC_API_KEY` environment variable:\n\n\
     ```bash\n\
     export ANTHROPIC_API_KEY=sk-ant-xxxxx\n\
     ```\n\n\
     Then restart reqchat. Once enabled you can ask questions about the\n\
     requirement data and add new requirements directly from the chat."
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_api_key_in_every_branch() {
        for message in ["add a requirement", "search for safety", "hello"] {
            assert!(fallback_response(message).contains("ANTHROPIC_API_KEY"));
        }
    }

    #[test]
    fn add_branch_is_specific() {
        assert!(fallback_response("please add a requirement").starts_with("✅"));
    }
}
