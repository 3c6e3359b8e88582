///! メインループ（サイクル実行・連続失敗バックオフ・停止処理）

use crate::checks::{self, CheckOutcome};
use crate::config::BotConfig;
use crate::notify::log_notification;
use crate::state::{save_state, BotState};

use anyhow::Result;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

const ERROR_BACKOFF_STEP_SECS: u64 = 300;
const ERROR_BACKOFF_MAX_SECS: u64 = 3600;
/// 連続失敗の通知はここまで。それ以降はログだけ（通知ログの洪水防止）
const ERROR_NOTIFY_LIMIT: u32 = 3;

/// 連続失敗 n 回目のバックオフ。300s 刻みで最大 3600s
fn error_backoff(consecutive: u32) -> Duration {
    Duration::from_secs((ERROR_BACKOFF_STEP_SECS * consecutive as u64).min(ERROR_BACKOFF_MAX_SECS))
}

fn should_notify_error(consecutive: u32) -> bool {
    consecutive <= ERROR_NOTIFY_LIMIT
}

/// Ctrl-C を一度だけ受けてフラグにラッチする。リスナーがいない隙間
/// （チェック実行中やリトライ待ちの間）に届いたシグナルも失わず、
/// 次のスリープ境界で必ず拾われる
struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    fn listen() -> Self {
        let (tx, rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(_) => {
                    let _ = tx.send(true);
                }
                Err(e) => {
                    eprintln!("Failed to listen for ctrl-c: {e}");
                    // tx を生かしたままにして受信側を空回りさせない
                    std::future::pending::<()>().await;
                }
            }
        });
        Self { rx }
    }

    fn requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// 寝ている間（またはすでに）停止要求が来ていたら true
    async fn sleep(&mut self, duration: Duration) -> bool {
        if self.requested() {
            return true;
        }
        tokio::select! {
            _ = sleep(duration) => {}
            _ = self.rx.changed() => return true,
        }
        self.requested()
    }
}

#[derive(Debug, Default)]
struct CycleSummary {
    ran: u32,
    skipped: u32,
    soft_failed: u32,
}

impl CycleSummary {
    fn record(&mut self, outcome: CheckOutcome) {
        match outcome {
            CheckOutcome::Ran => self.ran += 1,
            CheckOutcome::Skipped => self.skipped += 1,
            CheckOutcome::SoftFailed => self.soft_failed += 1,
        }
    }
}

pub async fn run(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
) -> Result<()> {
    let mut shutdown = Shutdown::listen();
    let mut consecutive_errors: u32 = 0;
    let mut cycle_count: u64 = 0;

    loop {
        cycle_count += 1;
        println!("\n--- Update Cycle #{cycle_count} ---");

        match run_cycle(client, config, state, &mut shutdown).await {
            Ok(summary) => {
                consecutive_errors = 0;
                if shutdown.requested() {
                    break;
                }
                println!(
                    "Update cycle complete ({} ran, {} skipped, {} no data). Sleeping for {} minutes…",
                    summary.ran,
                    summary.skipped,
                    summary.soft_failed,
                    config.cycle_interval.as_secs() / 60
                );
                if shutdown.sleep(config.cycle_interval).await {
                    break;
                }
            }
            Err(e) => {
                consecutive_errors += 1;
                let backoff = error_backoff(consecutive_errors);

                eprintln!("Error in monitoring loop: {e:?}");
                println!(
                    "Consecutive errors: {consecutive_errors}. Backing off for {} minutes",
                    backoff.as_secs() / 60
                );

                if should_notify_error(consecutive_errors) {
                    log_notification(state, &config.notifications_file, &format!("Error: {e}"));
                }
                save_state(&config.state_file, state);

                if shutdown.sleep(backoff).await {
                    break;
                }
            }
        }
    }

    // Ctrl-C が唯一の正常終了経路。ステートを書いてから戻る
    println!("\nBot stopped by user.");
    log_notification(state, &config.notifications_file, "Bot stopped by user.");
    save_state(&config.state_file, state);
    Ok(())
}

/// 固定順で4チェックを実行。間に pacing を挟んで API 呼び出しを分散させる。
/// pacing 中に停止要求が来たら残りのチェックは回さず途中で戻る
async fn run_cycle(
    client: &reqwest::Client,
    config: &BotConfig,
    state: &mut BotState,
    shutdown: &mut Shutdown,
) -> Result<CycleSummary> {
    let mut summary = CycleSummary::default();

    summary.record(checks::check_new_followers(client, config, state).await?);
    if shutdown.sleep(config.check_pacing).await {
        return Ok(summary);
    }

    summary.record(checks::check_new_tweets(client, config, state).await?);
    if shutdown.sleep(config.check_pacing).await {
        return Ok(summary);
    }

    summary.record(checks::check_mentions(client, config, state).await?);
    if shutdown.sleep(config.check_pacing).await {
        return Ok(summary);
    }

    summary.record(checks::check_tweet_engagement(client, config, state).await?);

    Ok(summary)
}
