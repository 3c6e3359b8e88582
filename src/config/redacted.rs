use super::BotConfig;

/// 起動ログにそのまま出せる、トークンをマスクした Debug 表示
pub struct Redacted<'a>(pub(crate) &'a BotConfig);

impl std::fmt::Debug for Redacted<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.0;
        f.debug_struct("BotConfig")
            .field("bearer_token", &mask(&c.bearer_token))
            .field("username", &c.username)
            .field("api_base", &c.api_base)
            .field("state_file", &c.state_file)
            .field("notifications_file", &c.notifications_file)
            .field("cycle_interval_secs", &c.cycle_interval.as_secs())
            .field("check_pacing_secs", &c.check_pacing.as_secs())
            .finish()
    }
}

fn mask(s: &str) -> String {
    if s.len() <= 6 { "***".into() } else { format!("{}***", &s[..3]) }
}
