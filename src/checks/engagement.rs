use crate::api_call::gated_call;
use crate::config::BotConfig;
use crate::notify::log_notification;
use crate::schedule::{should_check, CheckKind};
use crate::state::{save_state, BotState};
use crate::twitter::{self, Tweet, TweetMetrics};
use crate::util::{truncate_chars, tweet_url};

use super::CheckOutcome;
use anyhow::Result;
use std::cmp::Ordering;
use std::collections::HashMap;

// しきい値は独立したトリガー。どれか1つ超えれば通知する
const LIKE_THRESHOLD: u64 = 10;
const RETWEET_THRESHOLD: u64 = 5;
const REPLY_THRESHOLD: u64 = 3;

/// メトリクスを追跡するポストの上限
const METRICS_KEEP: usize = 10;

pub async fn check_tweet_engagement(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
) -> Result<CheckOutcome> {
    if !should_check(state, CheckKind::Engagement) {
        return Ok(CheckOutcome::Skipped);
    }
    // まだ1件もポストを観測していなければ対象なし
    if state.last_tweet_id.is_none() {
        return Ok(CheckOutcome::Skipped);
    }
    println!("Checking tweet engagement…");

    let user_id = match state.user_id.clone() {
        Some(id) => id,
        None => return Ok(CheckOutcome::SoftFailed),
    };

    let tweets = gated_call("engagement", || {
        twitter::get_user_tweets(client, &config.api_base, &config.bearer_token, &user_id)
    })
    .await;

    let tweets = match tweets {
        Some(t) if !t.is_empty() => t,
        _ => {
            println!("No tweets found or error retrieving tweets");
            return Ok(CheckOutcome::SoftFailed);
        }
    };

    apply_engagement(state, &tweets, config);
    Ok(CheckOutcome::Ran)
}

fn apply_engagement(state: &mut BotState, tweets: &[Tweet], config: &BotConfig) {
    let mut processed = false;

    for tweet in tweets {
        let current = tweet.public_metrics;

        let prev = match state.tweet_metrics.get(&tweet.id) {
            Some(p) => *p,
            None => {
                // 初回観測は記録だけで通知しない
                state.tweet_metrics.insert(tweet.id.clone(), current);
                processed = true;
                continue;
            }
        };

        let like_diff = current.like_count.saturating_sub(prev.like_count);
        let retweet_diff = current.retweet_count.saturating_sub(prev.retweet_count);
        let reply_diff = current.reply_count.saturating_sub(prev.reply_count);

        let mut changes = Vec::new();
        if like_diff >= LIKE_THRESHOLD {
            changes.push(format!("+{like_diff} likes"));
        }
        if retweet_diff >= RETWEET_THRESHOLD {
            changes.push(format!("+{retweet_diff} retweets"));
        }
        if reply_diff >= REPLY_THRESHOLD {
            changes.push(format!("+{reply_diff} replies"));
        }

        if !changes.is_empty() {
            let message = format!(
                "Engagement update on tweet!\n\
                 Content: {}...\n\
                 {}\n\
                 Current totals: {} replies, {} retweets, {} likes\n\
                 URL: {}",
                truncate_chars(&tweet.text, 100),
                changes.join(", "),
                current.reply_count,
                current.retweet_count,
                current.like_count,
                tweet_url(&config.username, &tweet.id),
            );
            log_notification(state, &config.notifications_file, &message);
        }

        // 差分は常に「直前の観測」比。通知の有無に関わらず上書きする
        state.tweet_metrics.insert(tweet.id.clone(), current);
        processed = true;
    }

    if processed {
        trim_metrics(&mut state.tweet_metrics);
        save_state(&config.state_file, state);
    }
}

/// ID は作成時刻と単調なので、大きい方から METRICS_KEEP 件だけ残す
fn trim_metrics(metrics: &mut HashMap<String, TweetMetrics>) {
    if metrics.len() <= METRICS_KEEP {
        return;
    }
    let mut ids: Vec<String> = metrics.keys().cloned().collect();
    ids.sort_by(|a, b| compare_ids(b, a));
    for id in ids.into_iter().skip(METRICS_KEEP) {
        metrics.remove(&id);
    }
}

/// 数値として比較、数値に見えない ID は辞書順にフォールバック
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u128>(), b.parse::<u128>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}
