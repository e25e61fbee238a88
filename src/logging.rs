//! ログ初期化モジュール
//!
//! `tracing` + `tracing-subscriber` を使用して、ログを外部ファイルに出力する。
//! REPL の表示を乱さないよう、標準出力には出さない。
//! ログファイルは `var/logs/` ディレクトリに日次ローテーションで保存される。

use std::path::PathBuf;

use tracing_subscriber::{fmt, EnvFilter};

/// ログの出力先ディレクトリを決定する。
/// `CARGO_MANIFEST_DIR`（開発時）またはカレントディレクトリからの相対パス `var/logs/` を使用する。
fn log_dir() -> PathBuf {
    if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
        return PathBuf::from(manifest_dir).join("var").join("logs");
    }

    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("var")
        .join("logs")
}

/// ログシステムを初期化する。
///
/// - ログレベルは `REQCHAT_LOG` 環境変数で制御（デフォルト: `info`）
/// - ログファイルは `var/logs/reqchat.log.YYYY-MM-DD` に日次ローテーションで出力
///
/// # Returns
/// `tracing_appender::non_blocking::WorkerGuard` を返す。
/// このガードは `main()` で保持し続ける必要がある（ドロップするとログ出力が停止する）。
pub fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    let log_dir = log_dir();

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!(
            "reqchat: warning: failed to create log directory {}: {e}",
            log_dir.display()
        );
    }

    let file_appender = tracing_appender::rolling::daily(&log_dir, "reqchat.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter =
        EnvFilter::try_from_env("REQCHAT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_ansi(false) // ファイル出力には ANSI カラーコードを含めない
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .init();

    guard
}
