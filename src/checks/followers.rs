use crate::api_call::gated_call;
use crate::config::BotConfig;
use crate::notify::log_notification;
use crate::schedule::{should_check, CheckKind};
use crate::state::{save_state, BotState};
use crate::twitter;

use super::CheckOutcome;
use anyhow::Result;

pub async fn check_new_followers(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
) -> Result<CheckOutcome> {
    if !should_check(state, CheckKind::Followers) {
        return Ok(CheckOutcome::Skipped);
    }
    println!("Checking for new followers…");

    let user_id = match state.user_id.clone() {
        Some(id) => id,
        None => return Ok(CheckOutcome::SoftFailed),
    };

    let fetched = gated_call("followers", || {
        twitter::get_user_metrics(client, &config.api_base, &config.bearer_token, &user_id)
    })
    .await;

    let current = fetched
        .flatten()
        .and_then(|u| u.public_metrics)
        .map(|m| m.followers_count);

    let current = match current {
        Some(n) => n,
        None => {
            println!("Failed to get user data");
            return Ok(CheckOutcome::SoftFailed);
        }
    };

    apply_follower_count(state, current, config);
    Ok(CheckOutcome::Ran)
}

fn apply_follower_count(state: &mut BotState, current: u64, config: &BotConfig) {
    // 初回観測は記録だけで通知しない（0 は未観測センチネル）
    if state.last_follower_count == 0 {
        state.last_follower_count = current;
        save_state(&config.state_file, state);
        return;
    }

    let diff = current as i64 - state.last_follower_count as i64;
    if diff != 0 {
        let message = format!("Follower count changed by {diff:+}. New total: {current}");
        log_notification(state, &config.notifications_file, &message);
    }

    // 通知したかに関わらず観測値は必ず更新する
    state.last_follower_count = current;
    save_state(&config.state_file, state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::testing::config_in;
    use tempfile::TempDir;

    #[test]
    fn first_observation_records_without_notifying() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut state = BotState::default();

        apply_follower_count(&mut state, 120, &config);

        assert_eq!(state.last_follower_count, 120);
        assert!(state.notifications.is_empty());
        assert!(config.state_file.exists());
    }

    #[test]
    fn growth_emits_signed_diff_once() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut state = BotState::default();
        state.last_follower_count = 100;

        apply_follower_count(&mut state, 105, &config);

        assert_eq!(state.notifications.len(), 1);
        assert!(state.notifications[0].contains("changed by +5"));
        assert!(state.notifications[0].contains("New total: 105"));
        assert_eq!(state.last_follower_count, 105);
    }

    #[test]
    fn drop_emits_negative_diff() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut state = BotState::default();
        state.last_follower_count = 100;

        apply_follower_count(&mut state, 97, &config);

        assert_eq!(state.notifications.len(), 1);
        assert!(state.notifications[0].contains("changed by -3"));
    }

    #[test]
    fn unchanged_count_is_silent_but_still_persisted() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let mut state = BotState::default();
        state.last_follower_count = 100;

        apply_follower_count(&mut state, 100, &config);

        assert!(state.notifications.is_empty());
        assert!(config.state_file.exists());
    }
}
