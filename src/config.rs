//! 設定ファイル管理
//!
//! `~/.config/reqchat/config.toml` から TOML 形式の設定を読み込む。
//! ファイルが存在しない場合はデフォルト値を使用する。
//!
//! # 設定ファイル例
//!
//! ```toml
//! [ai]
//! model = "claude-3-7-sonnet-20250219"
//! max_tokens = 2048
//! followup_max_tokens = 1024
//! history_window = 10
//! timeout_secs = 60
//! ```

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{debug, info, warn};

/// reqchat の設定全体
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReqchatConfig {
    /// AI 関連設定
    pub ai: AiConfig,
}

/// AI 関連の設定
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 使用するモデル名
    pub model: String,
    /// 初回呼び出しの最大トークン数
    pub max_tokens: u32,
    /// 追い呼び出し（ツール実行後）の最大トークン数
    pub followup_max_tokens: u32,
    /// モデルに送る直近履歴の件数
    pub history_window: usize,
    /// モデル呼び出し 1 回あたりのタイムアウト（秒）
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            model: "claude-3-7-sonnet-20250219".to_string(),
            max_tokens: 2048,
            followup_max_tokens: 1024,
            history_window: 10,
            timeout_secs: 60,
        }
    }
}

impl ReqchatConfig {
    /// 設定ファイルを読み込む。
    ///
    /// `~/.config/reqchat/config.toml` が存在すればパースし、
    /// 存在しなければデフォルト値を返す。
    /// パースエラーの場合は警告を表示してデフォルト値を返す。
    pub fn load() -> Self {
        let path = Self::config_path();
        debug!(path = %path.display(), "Loading config file");

        if !path.exists() {
            Self::create_default_config(&path);
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ReqchatConfig>(&content) {
                Ok(config) => {
                    info!(
                        path = %path.display(),
                        model = %config.ai.model,
                        history_window = config.ai.history_window,
                        timeout_secs = config.ai.timeout_secs,
                        "Config loaded successfully"
                    );
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    eprintln!("reqchat: warning: failed to parse config file: {e}");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file");
                eprintln!("reqchat: warning: failed to read config file: {e}");
                Self::default()
            }
        }
    }

    /// 設定ファイルのパスを返す。
    ///
    /// dotfiles として管理しやすいよう、XDG_CONFIG_HOME に依存しない
    /// 固定パス `~/.config/reqchat/config.toml` を使用する。
    /// `$HOME` が取得できない場合は `./.config/reqchat/config.toml` にフォールバックする。
    pub fn config_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".config/reqchat/config.toml")
    }

    /// 設定ファイルが存在しない場合にテンプレートから生成する。
    ///
    /// 親ディレクトリが存在しなければ再帰的に作成する。
    /// 生成に失敗した場合は警告を表示するが、起動は継続する。
    fn create_default_config(path: &std::path::Path) {
        const TEMPLATE: &str = r#"# reqchat configuration
#
# You can write settings like this:

[ai]
# model = "claude-3-7-sonnet-20250219"
# max_tokens = 2048
# followup_max_tokens = 1024
# history_window = 10
# timeout_secs = 60
"#;

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!(path = %parent.display(), error = %e, "Failed to create config directory");
                eprintln!("reqchat: warning: failed to create config directory: {e}");
                return;
            }
        }

        match std::fs::write(path, TEMPLATE) {
            Ok(()) => {
                info!(path = %path.display(), "Created default config file");
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to create default config file");
                eprintln!("reqchat: warning: failed to create config file: {e}");
            }
        }
    }
}
