mod assistant;
mod cli;
mod config;
mod logging;
mod requirements;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use reedline::{Reedline, Signal};
use tracing::{info, warn};

use assistant::{fallback_response, AnthropicClient, ChatAssistant, ModelError};
use cli::ReqPrompt;
use config::ReqchatConfig;
use requirements::RequirementStore;

/// Requirements management AI chat assistant
#[derive(Debug, Parser)]
#[command(name = "reqchat", version, about)]
struct Args {
    /// Data directory holding the requirement database
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Process a single message and exit (no REPL)
    #[arg(short, long)]
    message: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    // ログシステムの初期化（_guard は main 終了まで保持する必要がある）
    let _guard = logging::init_logging();
    info!("reqchat started");

    let args = Args::parse();
    let config = ReqchatConfig::load();

    let store = match &args.data_dir {
        Some(dir) => RequirementStore::open_at(dir.clone()),
        None => RequirementStore::open(),
    }
    .context("failed to open requirement store")?;
    let store = Arc::new(store);

    // AI クライアントの初期化。API キー未設定時はフォールバック応答のみ。
    let assistant = match AnthropicClient::from_env(&config.ai) {
        Ok(client) => {
            info!("AI client initialized successfully");
            Some(ChatAssistant::new(
                Box::new(client),
                store.clone(),
                config.ai.clone(),
            ))
        }
        Err(e) => {
            warn!("AI disabled: {e}");
            eprintln!("reqchat: warning: AI disabled: {e}");
            None
        }
    };

    if let Some(message) = args.message {
        return run_single_turn(assistant, &message).await;
    }

    run_repl(assistant, store).await
}

/// `--message` 指定時: 1 ターンだけ処理して終了する。
async fn run_single_turn(mut assistant: Option<ChatAssistant>, message: &str) -> Result<()> {
    match assistant.as_mut() {
        Some(assistant) => {
            let reply = assistant.handle_user_message(message).await?;
            println!("{reply}");
        }
        None => println!("{}", fallback_response(message)),
    }
    Ok(())
}

async fn run_repl(
    mut assistant: Option<ChatAssistant>,
    store: Arc<RequirementStore>,
) -> Result<()> {
    let mut editor = Reedline::create();
    let prompt = ReqPrompt;

    let requirement_count = store.get_all().map(|all| all.len()).unwrap_or(0);
    cli::print_welcome(requirement_count, assistant.is_some());

    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }

                match line.as_str() {
                    "exit" | "quit" => {
                        info!("Exit command received");
                        break;
                    }
                    "clear" => {
                        if let Some(ref mut assistant) = assistant {
                            assistant.clear_history();
                        }
                        cli::assistant_say("Conversation cleared.");
                        continue;
                    }
                    _ => {}
                }

                match assistant.as_mut() {
                    Some(assistant) => {
                        let spinner = cli::thinking_spinner();
                        let result = assistant.handle_user_message(&line).await;
                        spinner.finish_and_clear();

                        match result {
                            Ok(reply) => cli::assistant_say(&reply),
                            Err(e) => report_turn_error(&e),
                        }
                    }
                    None => cli::assistant_say(&fallback_response(&line)),
                }
                println!(); // 応答の後に空行を追加
            }
            Ok(Signal::CtrlC) => {
                // 現在の行をクリアして続行
            }
            Ok(Signal::CtrlD) => {
                info!("Ctrl-D received, exiting");
                break;
            }
            Err(e) => {
                warn!(error = %e, "REPL error, exiting");
                eprintln!("reqchat: error: {e}");
                break;
            }
        }
    }

    info!("reqchat shutting down");
    Ok(())
}

/// モデル呼び出しエラーを種類に応じた案内つきで表示する。
/// 回復可能なもの（レート制限・タイムアウト）はリトライを促す。
fn report_turn_error(error: &anyhow::Error) {
    match error.downcast_ref::<ModelError>() {
        Some(ModelError::Auth) => cli::print_error(
            "❌ API authentication error: ANTHROPIC_API_KEY is invalid. Check your environment.",
        ),
        Some(ModelError::RateLimited) => {
            cli::print_error("⚠️ API rate limit reached. Wait a moment and try again.");
        }
        Some(ModelError::Timeout(secs)) => cli::print_error(&format!(
            "⚠️ The model did not answer within {secs} seconds. Try again."
        )),
        _ => cli::print_error(&format!("error: {error:#}")),
    }
}
