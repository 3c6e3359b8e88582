///! レート制限を考慮した API 呼び出しラッパ

use crate::twitter::ApiError;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

const MAX_ATTEMPTS: u32 = 3;

/// 外部 API 呼び出しを最大3回まで面倒を見る。
/// 全部失敗したら None（呼び出し側は「今回は情報なし」として扱う）
pub async fn gated_call<T, F, Fut>(label: &str, mut call: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    for attempt in 0..MAX_ATTEMPTS {
        match call().await {
            Ok(value) => return Some(value),
            Err(err) => {
                let rate_limited = matches!(err, ApiError::RateLimited);
                if rate_limited {
                    println!("[{label}] Rate limited (attempt {}/{MAX_ATTEMPTS})", attempt + 1);
                } else {
                    eprintln!("[{label}] API call error: {err}");
                }

                if attempt + 1 == MAX_ATTEMPTS {
                    break;
                }

                // レート制限は指数 (60s, 120s)、それ以外は線形 (30s, 60s) で待つ。
                // レート制限側をあえて分単位にしてあるのは、ハードリミットを
                // 連打しないことをレイテンシより優先しているため
                let wait_secs = if rate_limited {
                    60 * (1u64 << attempt)
                } else {
                    30 * (attempt as u64 + 1)
                };
                println!(
                    "[{label}] Waiting {wait_secs}s before retry {}/{MAX_ATTEMPTS}…",
                    attempt + 2
                );
                sleep(Duration::from_secs(wait_secs)).await;
            }
        }
    }

    eprintln!("[{label}] Failed after {MAX_ATTEMPTS} attempts");
    None
}
