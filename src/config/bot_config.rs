use crate::config::{env_parsing, Redacted};
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct BotConfig {
    // --- 必須 ---
    pub bearer_token: String,
    /// 監視対象のユーザー名（@ なし）
    pub username: String,

    // --- 任意（デフォルトあり）---
    pub api_base: String,            // 例: https://api.twitter.com
    pub state_file: PathBuf,         // 例: bot_state.json
    pub notifications_file: PathBuf, // 例: notifications.txt

    /// サイクル完了後のアイドル時間
    pub cycle_interval: Duration,
    /// サイクル内でチェックとチェックの間に挟む間隔
    pub check_pacing: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env");

        let bearer_token = env_parsing::must("TWITTER_BEARER_TOKEN")?;
        let username = env_parsing::must("TWITTER_USERNAME")?;

        let api_base = env_parsing::opt("TWITTER_API_BASE")
            .unwrap_or_else(|| "https://api.twitter.com".into());
        let state_file =
            PathBuf::from(env_parsing::opt("STATE_FILE").unwrap_or_else(|| "bot_state.json".into()));
        let notifications_file = PathBuf::from(
            env_parsing::opt("NOTIFICATIONS_FILE").unwrap_or_else(|| "notifications.txt".into()),
        );

        let cycle_interval_secs: u64 = env_parsing::parse("CYCLE_INTERVAL_SECS", 600)?;
        let check_pacing_secs: u64 = env_parsing::parse("CHECK_PACING_SECS", 10)?;

        Ok(Self {
            bearer_token,
            username,
            api_base,
            state_file,
            notifications_file,
            cycle_interval: Duration::from_secs(cycle_interval_secs),
            check_pacing: Duration::from_secs(check_pacing_secs),
        })
    }

    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }
}
