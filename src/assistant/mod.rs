//! AI チャットアシスタント
//!
//! ユーザーメッセージ 1 件を処理するツールループを実装する。
//! モデル呼び出しは最大 2 回: ツール定義付きの初回呼び出しと、
//! ツール実行結果を踏まえて自然言語の回答を生成する追い呼び出し。

pub mod client;
pub mod error;
pub mod fallback;
pub mod prompts;
pub mod protocol;
pub mod session;
pub mod tools;

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

pub use client::{AnthropicClient, ModelClient};
pub use error::ModelError;
pub use fallback::fallback_response;

use crate::config::AiConfig;
use crate::requirements::{RequirementAllocator, RequirementStore};

use protocol::{ContentBlock, Message};
use session::{Session, RETAINED_HISTORY};
use tools::{build_tools, ToolDispatcher, ToolOutcome};

/// 会話セッションとツールディスパッチを束ねるアシスタント本体。
///
/// プロセス全体のシングルトンではなく、呼び出し側が保持する明示的なオブジェクト。
/// 同一インスタンスへの並行ターンは想定しない（呼び出し側で直列化する）。
pub struct ChatAssistant {
    client: Box<dyn ModelClient>,
    dispatcher: ToolDispatcher,
    store: Arc<RequirementStore>,
    session: Session,
    config: AiConfig,
}

impl ChatAssistant {
    pub fn new(
        client: Box<dyn ModelClient>,
        store: Arc<RequirementStore>,
        config: AiConfig,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(RequirementAllocator::new(store.clone()));
        Self {
            client,
            dispatcher,
            store,
            session: Session::new(),
            config,
        }
    }

    /// ユーザーメッセージを 1 ターン処理し、最終的なアシスタント応答を返す。
    ///
    /// ツールが使われたターンの履歴は
    /// {user, assistant(tool_use 含む), user(tool_result), assistant} の 4 件、
    /// 使われなかったターンは {user, assistant} の 2 件になる。
    ///
    /// 初回呼び出しが失敗した場合は追加済みの user メッセージを巻き戻して
    /// エラーを返す。追い呼び出しの失敗はツールの副作用が永続化済みのため
    /// ターンを失敗にせず、ローカルで組み立てた結果テキストで応答する。
    pub async fn handle_user_message(&mut self, text: &str) -> Result<String> {
        let system = self.build_system(text)?;
        self.session.append(Message::user_text(text));

        let tools = build_tools();
        let window = self.config.history_window;

        debug!(
            history_len = self.session.history().len(),
            window = window,
            "Starting first model invocation"
        );

        let first = match self
            .client
            .invoke(
                &system,
                Some(&tools),
                self.session.recent_window(window),
                self.config.max_tokens,
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                // 応答のない user ターンを履歴に残さない
                self.session.pop_last();
                return Err(anyhow::Error::new(e).context("model invocation failed"));
            }
        };

        let mut reply = first.joined_text();
        let tool_uses = first.tool_uses();

        if tool_uses.is_empty() {
            debug!(reply_length = reply.len(), "No tool use, single-pass turn");
            self.session.append(Message::assistant_text(reply.clone()));
            self.session.retain_recent(RETAINED_HISTORY);
            return Ok(reply);
        }

        info!(tool_use_count = tool_uses.len(), "Model requested tool use");

        // 受信順にツールを実行し、結果行とモデル向け tool_result を積み上げる
        let mut results = Vec::with_capacity(tool_uses.len());
        for (id, name, input) in tool_uses {
            let outcome = self.dispatcher.execute(name, input);
            match &outcome {
                ToolOutcome::Success(req) => {
                    let _ = write!(
                        reply,
                        "\n\n✅ **Requirement added**\n- ID: {}\n- Title: {}\n- Type: {}\n- Priority: {}",
                        req.id, req.title, req.rtype, req.priority
                    );
                }
                ToolOutcome::Failure(error) => {
                    let _ = write!(reply, "\n\n❌ Error: {error}");
                }
            }
            results.push(ContentBlock::tool_result(id, outcome.to_json().to_string()));
        }

        // モデルの応答を tool_use ブロック込みでそのまま履歴に残し、
        // 続けて実行結果を user ロールで返す
        self.session.append(Message::assistant_blocks(first.content));
        self.session.append(Message::tool_results(results));

        // 追い呼び出し: 今回はツールを提示しない
        let followup = self
            .client
            .invoke(
                &system,
                None,
                self.session.recent_window(window),
                self.config.followup_max_tokens,
            )
            .await;

        let final_text = match followup {
            Ok(response) => {
                let text = response.joined_text();
                if text.is_empty() {
                    debug!("Follow-up reply had no text, keeping local status text");
                    reply
                } else {
                    text
                }
            }
            Err(e) => {
                warn!(error = %e, "Follow-up invocation failed, using local status text");
                reply
            }
        };

        self.session.append(Message::assistant_text(final_text.clone()));
        self.session.retain_recent(RETAINED_HISTORY);
        Ok(final_text)
    }

    /// 会話履歴をクリアする。
    pub fn clear_history(&mut self) {
        self.session.clear();
        info!("Conversation history cleared");
    }

    /// 全履歴を返す（呼び出し側の表示・検査用）。
    pub fn history(&self) -> &[Message] {
        self.session.history()
    }

    /// ストアの現在値とメッセージ内で言及された要求の詳細を織り込んだ
    /// システムプロンプトを組み立てる。
    fn build_system(&self, text: &str) -> Result<String> {
        let mut system =
            prompts::build_system_prompt(&self.store).context("failed to build system prompt")?;
        let context = prompts::additional_context(&self.store, text)
            .context("failed to build additional context")?;
        if !context.is_empty() {
            system.push('\n');
            system.push_str(&context);
        }
        Ok(system)
    }
}
