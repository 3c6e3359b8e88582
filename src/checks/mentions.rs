use crate::api_call::gated_call;
use crate::config::BotConfig;
use crate::notify::log_notification;
use crate::schedule::{should_check, CheckKind};
use crate::state::{save_state, BotState};
use crate::twitter::{self, Tweet};
use crate::util::{truncate_chars, tweet_url};

use super::CheckOutcome;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// これより古いメンションは「見た」ことにするだけで通知しない
const FRESH_WINDOW_SECS: i64 = 86_400;

/// 処理済みセットがこれを超えたら…
const DEDUP_HIGH_WATER: usize = 100;
/// …挿入が新しい方から 50 件に詰める
const DEDUP_KEEP: usize = 50;

pub async fn check_mentions(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
) -> Result<CheckOutcome> {
    if !should_check(state, CheckKind::Mentions) {
        return Ok(CheckOutcome::Skipped);
    }
    println!("Checking for mentions…");

    let user_id = match state.user_id.clone() {
        Some(id) => id,
        None => return Ok(CheckOutcome::SoftFailed),
    };

    let mentions = gated_call("mentions", || {
        twitter::get_user_mentions(client, &config.api_base, &config.bearer_token, &user_id)
    })
    .await;

    let mentions = match mentions {
        Some(m) if !m.is_empty() => m,
        _ => {
            println!("No mentions found or error retrieving mentions");
            return Ok(CheckOutcome::SoftFailed);
        }
    };

    // 著者はまとめて1回で解決する。失敗しても "unknown" 表示で続行
    let author_ids: Vec<String> = mentions.iter().filter_map(|t| t.author_id.clone()).collect();
    let authors: HashMap<String, String> = if author_ids.is_empty() {
        HashMap::new()
    } else {
        gated_call("mention authors", || {
            twitter::get_users_by_ids(client, &config.api_base, &config.bearer_token, &author_ids)
        })
        .await
        .map(|users| users.into_iter().map(|u| (u.id, u.username)).collect())
        .unwrap_or_default()
    };

    apply_mentions(state, &mentions, &authors, Utc::now(), config);
    Ok(CheckOutcome::Ran)
}

/// API が返した順に処理する。戻り値は「未見のメンションがあったか」
fn apply_mentions(
    state: &mut BotState,
    mentions: &[Tweet],
    authors: &HashMap<String, String>,
    now: DateTime<Utc>,
    config: &BotConfig,
) -> bool {
    let mut new_found = false;

    for mention in mentions {
        if state.processed_mentions.contains(&mention.id) {
            continue;
        }

        // 通知するかどうかに関係なく、見た時点で処理済みにする
        state.processed_mentions.insert(&mention.id);
        new_found = true;

        let fresh = mention
            .created_at
            .map(|t| (now - t.with_timezone(&Utc)).num_seconds() <= FRESH_WINDOW_SECS)
            .unwrap_or(false);
        if !fresh {
            continue;
        }

        let author = mention
            .author_id
            .as_ref()
            .and_then(|id| authors.get(id))
            .map(String::as_str)
            .unwrap_or("unknown");

        let m = &mention.public_metrics;
        let message = format!(
            "New mention from @{author}!\n\
             Content: {}...\n\
             Replies: {}\n\
             Retweets: {}\n\
             Likes: {}\n\
             URL: {}",
            truncate_chars(&mention.text, 100),
            m.reply_count,
            m.retweet_count,
            m.like_count,
            tweet_url(author, &mention.id),
        );
        log_notification(state, &config.notifications_file, &message);
    }

    // 未見が1件もなかったサイクルでは書き込みもしない
    if new_found {
        if state.processed_mentions.len() > DEDUP_HIGH_WATER {
            state.processed_mentions.truncate_oldest(DEDUP_KEEP);
        }
        save_state(&config.state_file, state);
    }

    new_found
}
