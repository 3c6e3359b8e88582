///! Bot の永続ステート管理（チェック間で引き継ぐ情報ぜんぶ）

use crate::twitter::TweetMetrics;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// 処理済みメンション ID の重複排除コンテナ。
/// ディスク上は挿入順の JSON 配列、メモリ上は配列（順序）＋ HashSet（membership）。
/// 変換はこの型のシリアライズ境界だけで起きる
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DedupSet {
    order: Vec<String>,
    seen: HashSet<String>,
}

impl DedupSet {
    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    /// 未登録なら挿入して true
    pub fn insert(&mut self, id: &str) -> bool {
        if !self.seen.insert(id.to_string()) {
            return false;
        }
        self.order.push(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 挿入が古い方から削って、直近 keep 件だけ残す。
    /// キーはあくまで挿入順であって、メンション自体の新旧ではない
    pub fn truncate_oldest(&mut self, keep: usize) {
        if self.order.len() <= keep {
            return;
        }
        let cut = self.order.len() - keep;
        for id in self.order.drain(..cut) {
            self.seen.remove(&id);
        }
    }
}

impl From<Vec<String>> for DedupSet {
    fn from(order: Vec<String>) -> Self {
        let seen = order.iter().cloned().collect();
        Self { order, seen }
    }
}

impl From<DedupSet> for Vec<String> {
    fn from(set: DedupSet) -> Self {
        set.order
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BotState {
    /// 監視対象アカウントの ID。起動時に一度だけ解決する
    pub user_id: Option<String>,

    /// 0 は「未観測」センチネル。本当にフォロワー0の新規アカウントとは
    /// 区別できない（既知の曖昧さで、直す対象ではない）
    pub last_follower_count: u64,

    /// 最後に観測したポスト ID。None は「未観測」
    pub last_tweet_id: Option<String>,

    pub processed_mentions: DedupSet,

    /// ポスト ID → 前回観測したエンゲージメント数
    pub tweet_metrics: HashMap<String, TweetMetrics>,

    /// 出力済み通知のメモリ上ミラー（本物は通知ログファイル側）
    pub notifications: Vec<String>,

    /// チェック名 → 最終実行時刻（RFC 3339 文字列）。
    /// 文字列のまま持つので、壊れた値もそのまま表現できる
    pub last_check_time: HashMap<String, String>,
}

pub fn load_state(path: &Path) -> BotState {
    if !path.exists() {
        println!("No previous state found. Starting fresh.");
        return BotState::default();
    }

    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading state: {e}");
            return BotState::default();
        }
    };

    match serde_json::from_str::<BotState>(&data) {
        Ok(state) => {
            println!("State loaded from {}", path.display());
            state
        }
        Err(e) => {
            eprintln!("Error parsing state: {e}");
            BotState::default()
        }
    }
}

/// 新ファイルに書いてから rename で差し替える。途中で失敗しても
/// 既存の保存済みコピーは壊れない。失敗はログだけで呼び出し元には返さない
pub fn save_state(path: &Path, state: &BotState) {
    let data = match serde_json::to_string_pretty(state) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error serializing state: {e}");
            return;
        }
    };

    let tmp = path.with_extension("tmp");
    let result = fs::write(&tmp, data).and_then(|_| fs::rename(&tmp, path));
    match result {
        Ok(_) => println!("State saved to {}", path.display()),
        Err(e) => eprintln!("Error saving state: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_state() -> BotState {
        let mut state = BotState::default();
        state.user_id = Some("123".into());
        state.last_follower_count = 42;
        state.last_tweet_id = Some("900".into());
        state.processed_mentions.insert("m1");
        state.processed_mentions.insert("m2");
        state.tweet_metrics.insert(
            "900".into(),
            TweetMetrics { reply_count: 1, retweet_count: 2, like_count: 3, quote_count: 0 },
        );
        state.notifications.push("[2026-01-01 00:00:00] hello\n".into());
        state
            .last_check_time
            .insert("followers".into(), "2026-01-01T00:00:00+00:00".into());
        state
    }

    #[test]
    fn round_trip_preserves_all_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_state.json");
        let state = sample_state();

        save_state(&path, &state);
        let loaded = load_state(&path);

        assert_eq!(loaded.user_id, state.user_id);
        assert_eq!(loaded.last_follower_count, 42);
        assert_eq!(loaded.last_tweet_id, state.last_tweet_id);
        assert_eq!(loaded.processed_mentions.len(), 2);
        assert!(loaded.processed_mentions.contains("m1"));
        assert!(loaded.processed_mentions.contains("m2"));
        assert_eq!(loaded.tweet_metrics, state.tweet_metrics);
        assert_eq!(loaded.notifications, state.notifications);
        assert_eq!(loaded.last_check_time, state.last_check_time);
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = TempDir::new().unwrap();
        let loaded = load_state(&dir.path().join("does_not_exist.json"));
        assert!(loaded.user_id.is_none());
        assert_eq!(loaded.last_follower_count, 0);
        assert!(loaded.processed_mentions.is_empty());
    }

    #[test]
    fn legacy_document_defaults_missing_and_ignores_unknown_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bot_state.json");
        fs::write(&path, r#"{"user_id":"1","some_future_field":true}"#).unwrap();

        let loaded = load_state(&path);
        assert_eq!(loaded.user_id.as_deref(), Some("1"));
        assert_eq!(loaded.last_follower_count, 0);
        assert!(loaded.last_tweet_id.is_none());
        assert!(loaded.processed_mentions.is_empty());
    }

    #[test]
    fn dedup_set_serializes_as_ordered_sequence() {
        let mut set = DedupSet::default();
        set.insert("a");
        set.insert("b");
        set.insert("a"); // 二重挿入は無視
        set.insert("c");

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["a","b","c"]"#);

        let back: DedupSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back.contains("b"));
    }

    #[test]
    fn dedup_truncate_drops_oldest_insertions() {
        let mut set = DedupSet::default();
        for i in 0..120 {
            set.insert(&i.to_string());
        }
        set.truncate_oldest(50);

        assert_eq!(set.len(), 50);
        assert!(!set.contains("0"));
        assert!(!set.contains("69"));
        assert!(set.contains("70"));
        assert!(set.contains("119"));
    }
}
