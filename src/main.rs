mod api_call;
mod checks;
mod config;
mod notify;
mod run_loop;
mod schedule;
mod state;
mod twitter;
mod util;

use anyhow::Result;
use config::BotConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let config = BotConfig::from_env()?;
    println!("config = {:?}", config.redacted());

    println!("Starting X Notification Bot…");
    println!(
        "Notifications will be saved to: {}",
        config.notifications_file.display()
    );
    notify::ensure_log_file(&config.notifications_file);

    let mut state = state::load_state(&config.state_file);

    let client = reqwest::Client::new();

    // user_id 未解決なら起動時に一度だけ引く
    if state.user_id.is_none() {
        println!("Looking up user ID for @{}…", config.username);
        let user = api_call::gated_call("resolve user", || {
            twitter::get_user_by_username(
                &client,
                &config.api_base,
                &config.bearer_token,
                &config.username,
            )
        })
        .await
        .flatten();

        match user {
            Some(u) => {
                println!("User ID: {}", u.id);
                state.user_id = Some(u.id);
                state::save_state(&config.state_file, &state);
            }
            None => {
                // 認証情報かユーザー名の問題なので、クラッシュではなく正常終了
                println!("Failed to get user ID. Check your Twitter credentials and username.");
                return Ok(());
            }
        }
    }

    notify::log_notification(
        &mut state,
        &config.notifications_file,
        "X Notification Bot is now running!",
    );

    run_loop::run(&client, &config, &mut state).await
}
