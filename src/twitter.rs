///! X (Twitter) API v2 まわり（型＋HTTP）

use chrono::{DateTime, FixedOffset};
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 429。リトライ側で特別扱いする
    #[error("rate limited")]
    RateLimited,
    #[error("API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Deserialize)]
pub struct UserMetrics {
    pub followers_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub public_metrics: Option<UserMetrics>,
}

/// ポストのエンゲージメント数。ステートにもこのまま保存する
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetMetrics {
    pub reply_count: u64,
    pub retweet_count: u64,
    pub like_count: u64,
    pub quote_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub public_metrics: TweetMetrics,
}

/// v2 のレスポンスはどれも { "data": … } で包まれてくる。
/// data が無いのは「結果ゼロ件」であってエラーではない
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

async fn get_data<T: DeserializeOwned>(
    client: &reqwest::Client,
    token: &str,
    url: &str,
    query: &[(&str, &str)],
) -> ApiResult<Option<T>> {
    let resp = client
        .get(url)
        .query(query)
        .header(AUTHORIZATION, format!("Bearer {}", token))
        .send()
        .await?;

    if resp.status() == StatusCode::TOO_MANY_REQUESTS {
        return Err(ApiError::RateLimited);
    }
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ApiError::Api { status, body });
    }

    let env: Envelope<T> = resp.json().await?;
    Ok(env.data)
}

/// ユーザー名 → ユーザー（起動時の ID 解決用）
pub async fn get_user_by_username(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    username: &str,
) -> ApiResult<Option<User>> {
    let url = format!("{}/2/users/by/username/{}", base_url, username);
    get_data(client, token, &url, &[]).await
}

/// フォロワー数などの public_metrics 付きでユーザーを取得
pub async fn get_user_metrics(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    user_id: &str,
) -> ApiResult<Option<User>> {
    let url = format!("{}/2/users/{}", base_url, user_id);
    get_data(client, token, &url, &[("user.fields", "public_metrics")]).await
}

/// 直近のポストを最大5件
pub async fn get_user_tweets(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    user_id: &str,
) -> ApiResult<Vec<Tweet>> {
    let url = format!("{}/2/users/{}/tweets", base_url, user_id);
    let query = [
        ("max_results", "5"),
        ("tweet.fields", "created_at,public_metrics"),
    ];
    let data = get_data(client, token, &url, &query).await?;
    Ok(data.unwrap_or_default())
}

/// 直近のメンションを最大10件
pub async fn get_user_mentions(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    user_id: &str,
) -> ApiResult<Vec<Tweet>> {
    let url = format!("{}/2/users/{}/mentions", base_url, user_id);
    let query = [
        ("max_results", "10"),
        ("tweet.fields", "created_at,public_metrics,author_id"),
    ];
    let data = get_data(client, token, &url, &query).await?;
    Ok(data.unwrap_or_default())
}

/// 著者 ID をまとめてユーザー名に解決する
pub async fn get_users_by_ids(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    ids: &[String],
) -> ApiResult<Vec<User>> {
    let url = format!("{}/2/users", base_url);
    let ids_param = ids.join(",");
    let data = get_data(client, token, &url, &[("ids", ids_param.as_str())]).await?;
    Ok(data.unwrap_or_default())
}
