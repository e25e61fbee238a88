//! モデル呼び出しのエラー分類
//!
//! 呼び出し側（REPL）がステータスごとに案内メッセージを出し分けられるよう、
//! 認証・レート制限・タイムアウトを個別のバリアントにする。

use thiserror::Error;

/// モデル呼び出しで発生するエラー。
///
/// ツールの失敗（未知のツール名・採番失敗）はここには含まれない。
/// それらはディスパッチャ境界で失敗ペイロードに変換され、会話は継続する。
#[derive(Debug, Error)]
pub enum ModelError {
    /// API キーが無効（HTTP 401）
    #[error("authentication failed: ANTHROPIC_API_KEY is invalid")]
    Auth,
    /// レート制限（HTTP 429）。リトライ可能。
    #[error("rate limited by the model API")]
    RateLimited,
    /// 呼び出しがタイムアウトした。リトライ可能。
    #[error("model invocation timed out after {0} seconds")]
    Timeout(u64),
    /// 上記以外の非成功ステータス
    #[error("model API returned status {status}: {body}")]
    Api { status: u16, body: String },
    /// 接続・送信レベルの失敗
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// レスポンスボディが期待した形でない
    #[error("malformed model response: {0}")]
    Protocol(String),
}
