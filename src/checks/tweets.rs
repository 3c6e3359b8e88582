use crate::api_call::gated_call;
use crate::config::BotConfig;
use crate::notify::log_notification;
use crate::schedule::{should_check, CheckKind};
use crate::state::{save_state, BotState};
use crate::twitter::{self, Tweet};
use crate::util::{truncate_chars, tweet_url};

use super::CheckOutcome;
use anyhow::Result;

pub async fn check_new_tweets(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
) -> Result<CheckOutcome> {
    if !should_check(state, CheckKind::Tweets) {
        return Ok(CheckOutcome::Skipped);
    }
    println!("Checking for new tweets…");

    let user_id = match state.user_id.clone() {
        Some(id) => id,
        None => return Ok(CheckOutcome::SoftFailed),
    };

    let tweets = gated_call("tweets", || {
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

    apply_latest_tweet(state, &tweets, config);
    Ok(CheckOutcome::Ran)
}

/// 比較するのは先頭（最新）の1件だけ。ポーリングの合間に複数投稿が
/// あっても個別には通知しない（既存の粗さで、ここでは直さない）
fn apply_latest_tweet(state: &mut BotState, tweets: &[Tweet], config: &BotConfig) {
    let newest = &tweets[0];

    // 初回観測は ID を覚えるだけで通知しない
    if state.last_tweet_id.is_none() {
        state.last_tweet_id = Some(newest.id.clone());
        save_state(&config.state_file, state);
        return;
    }

    if state.last_tweet_id.as_deref() == Some(newest.id.as_str()) {
        return;
    }

    let m = &newest.public_metrics;
    let message = format!(
        "New tweet posted!\n\
         Content: {}...\n\
         Replies: {}\n\
         Retweets: {}\n\
         Likes: {}\n\
         Quotes: {}\n\
         URL: {}",
        truncate_chars(&newest.text, 100),
        m.reply_count,
        m.retweet_count,
        m.like_count,
        m.quote_count,
        tweet_url(&config.username, &newest.id),
    );
    log_notification(state, &config.notifications_file, &message);

    state.last_tweet_id = Some(newest.id.clone());
    save_state(&config.state_file, state);
}
