//! 会話セッション
//!
//! 追記専用のメッセージ履歴と、モデルに送る直近ウィンドウの切り出しを担当する。
//! ロックは持たない。同一セッションへの並行ターンは呼び出し側で直列化すること。

use super::protocol::Message;

/// 保持する履歴の上限。超過分は古い方から破棄する。
pub const RETAINED_HISTORY: usize = 20;

/// 順序付きメッセージ履歴を保持するセッション
#[derive(Debug, Default)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// メッセージを履歴の末尾に追加する。
    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// 直近 `n` 件を元の順序で返す。履歴が短ければ全件。履歴は変更しない。
    pub fn recent_window(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// 全履歴を返す。
    pub fn history(&self) -> &[Message] {
        &self.messages
    }

    /// 直前に追加したメッセージを取り除く。
    /// モデル呼び出し失敗時に user ターンが宙に浮くのを防ぐために使う。
    pub fn pop_last(&mut self) -> Option<Message> {
        self.messages.pop()
    }

    /// 保持件数を `max` 件に丸める（古い方から破棄）。
    pub fn retain_recent(&mut self, max: usize) {
        if self.messages.len() > max {
            self.messages.drain(..self.messages.len() - max);
        }
    }

    /// 履歴をすべて破棄する。
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_session(count: usize) -> Session {
        let mut session = Session::new();
        for i in 0..count {
            session.append(Message::user_text(format!("message {i}")));
        }
        session
    }

    #[test]
    fn recent_window_returns_last_entries_in_order() {
        let session = filled_session(15);

        let window = session.recent_window(10);
        assert_eq!(window.len(), 10);
        // 15 件中、6 件目から 15 件目（0 始まりで 5..15）が返る
        assert_eq!(window[0].joined_text(), "message 5");
        assert_eq!(window[9].joined_text(), "message 14");
    }

    #[test]
    fn recent_window_returns_all_when_short() {
        let session = filled_session(3);

        let window = session.recent_window(10);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].joined_text(), "message 0");
        assert_eq!(window[2].joined_text(), "message 2");
    }

    #[test]
    fn recent_window_does_not_mutate_history() {
        let session = filled_session(15);
        let _ = session.recent_window(10);
        assert_eq!(session.history().len(), 15);
    }

    #[test]
    fn pop_last_removes_newest() {
        let mut session = filled_session(2);
        let popped = session.pop_last().unwrap();
        assert_eq!(popped.joined_text(), "message 1");
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn retain_recent_drops_oldest() {
        let mut session = filled_session(25);
        session.retain_recent(RETAINED_HISTORY);

        assert_eq!(session.history().len(), 20);
        assert_eq!(session.history()[0].joined_text(), "message 5");
        assert_eq!(session.history()[19].joined_text(), "message 24");
    }

    #[test]
    fn retain_recent_is_noop_when_under_limit() {
        let mut session = filled_session(3);
        session.retain_recent(RETAINED_HISTORY);
        assert_eq!(session.history().len(), 3);
    }

    #[test]
    fn clear_empties_history() {
        let mut session = filled_session(5);
        session.clear();
        assert!(session.history().is_empty());
    }
}
