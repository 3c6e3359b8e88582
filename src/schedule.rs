///! チェック種別ごとの実行間隔ゲート

use crate::state::BotState;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    Followers,
    Tweets,
    Mentions,
    Engagement,
}

impl CheckKind {
    /// last_check_time のキー（永続化されるので変えない）
    pub fn name(self) -> &'static str {
        match self {
            CheckKind::Followers => "followers",
            CheckKind::Tweets => "tweets",
            CheckKind::Mentions => "mentions",
            CheckKind::Engagement => "engagement",
        }
    }

    pub fn min_interval_minutes(self) -> i64 {
        match self {
            CheckKind::Followers => 60,
            CheckKind::Tweets => 30,
            CheckKind::Mentions => 45,
            CheckKind::Engagement => 120,
        }
    }
}

/// 前回実行から十分経っていれば true を返してタイムスタンプを更新する。
/// 初回（記録なし）は「今」を記録してそのまま実行させる
pub fn should_check(state: &mut BotState, kind: CheckKind) -> bool {
    should_check_at(state, kind, Utc::now())
}

fn should_check_at(state: &mut BotState, kind: CheckKind, now: DateTime<Utc>) -> bool {
    let name = kind.name();

    let elapsed_secs = match state.last_check_time.get(name) {
        None => {
            state.last_check_time.insert(name.into(), now.to_rfc3339());
            return true;
        }
        Some(raw) => match DateTime::parse_from_rfc3339(raw) {
            Ok(t) => (now - t.with_timezone(&Utc)).num_seconds(),
            // 壊れたタイムスタンプは「経過済み」扱い。監視が黙って止まる
            // くらいなら余計に1回走る方を取る
            Err(_) => i64::MAX,
        },
    };

    if elapsed_secs >= kind.min_interval_minutes() * 60 {
        state.last_check_time.insert(name.into(), now.to_rfc3339());
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn first_call_runs_and_records() {
        let mut state = BotState::default();
        assert!(should_check(&mut state, CheckKind::Followers));
        assert!(state.last_check_time.contains_key("followers"));
    }

    #[test]
    fn immediate_second_call_is_gated() {
        let mut state = BotState::default();
        for kind in [
            CheckKind::Followers,
            CheckKind::Tweets,
            CheckKind::Mentions,
            CheckKind::Engagement,
        ] {
            assert!(should_check(&mut state, kind));
            assert!(!should_check(&mut state, kind));
        }
    }

    #[test]
    fn elapsed_interval_reopens_the_gate() {
        let mut state = BotState::default();
        let now = Utc::now();
        state
            .last_check_time
            .insert("tweets".into(), (now - Duration::minutes(31)).to_rfc3339());
        assert!(should_check_at(&mut state, CheckKind::Tweets, now));

        state
            .last_check_time
            .insert("tweets".into(), (now - Duration::minutes(29)).to_rfc3339());
        assert!(!should_check_at(&mut state, CheckKind::Tweets, now));
    }

    #[test]
    fn corrupted_timestamp_fails_open() {
        let mut state = BotState::default();
        state
            .last_check_time
            .insert("engagement".into(), "not-a-timestamp".into());

        let now = Utc::now();
        assert!(should_check_at(&mut state, CheckKind::Engagement, now));
        // 実行したので正しい値で上書きされている
        assert_eq!(
            state.last_check_time.get("engagement"),
            Some(&now.to_rfc3339())
        );
    }
}
