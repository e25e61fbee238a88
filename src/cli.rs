//! ターミナル表示まわりのユーティリティ
//!
//! アシスタントの発話表示、処理中スピナー、REPL プロンプトを提供する。

use std::borrow::Cow;
use std::time::Duration;

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};
use nu_ansi_term::{Color, Style};
use reedline::{
    Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus,
};

fn styled(color: Color, text: &str) -> String {
    Style::new().fg(color).paint(text).to_string()
}

pub fn red(text: &str) -> String {
    styled(Color::LightRed, text)
}

pub fn yellow(text: &str) -> String {
    styled(Color::Yellow, text)
}

pub fn green(text: &str) -> String {
    styled(Color::LightGreen, text)
}

pub fn cyan(text: &str) -> String {
    styled(Color::Cyan, text)
}

pub fn white(text: &str) -> String {
    styled(Color::LightGray, text)
}

/// アシスタントが発話するときに使う共通関数。
/// 先頭に 🤖 絵文字を付与して表示する。
pub fn assistant_say(message: &str) {
    println!("🤖 {}", white(message));
}

/// エラーをユーザー向けに表示する。
pub fn print_error(message: &str) {
    eprintln!("🤖 {}", red(message));
}

/// モデル呼び出し中に表示するスピナーを生成・開始する。
/// 呼び出し元で `finish_and_clear()` を呼んで停止すること。
pub fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("🤖 {spinner}")
            .expect("Invalid spinner template"),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// 起動時のウェルカムメッセージを表示する。
pub fn print_welcome(requirement_count: usize, ai_enabled: bool) {
    println!();
    println!("  {}", cyan("reqchat — requirements management assistant"));
    println!("  {}", white(&format!("{requirement_count} requirements loaded")));
    if !ai_enabled {
        println!(
            "  {}",
            yellow("AI disabled: set ANTHROPIC_API_KEY to enable chat")
        );
    }
    println!("  {}", white("type 'exit' to quit, 'clear' to reset the conversation"));
    println!();
}

/// reqchat の REPL プロンプト。
///
/// ```text
/// reqchat
/// ❯
/// ```
pub struct ReqPrompt;

impl Prompt for ReqPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Owned(format!("{}\n", cyan("reqchat")))
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        let now = Local::now().format("%H:%M:%S").to_string();
        Cow::Owned(white(&now))
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Owned(green("\u{276f} "))
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(" :: ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "(failed) ",
        };
        Cow::Owned(format!("{prefix}(search: '{}') ", history_search.term))
    }

    fn get_prompt_color(&self) -> reedline::Color {
        reedline::Color::White
    }
}
