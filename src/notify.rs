///! 通知シンク（追記専用のテキストログ＋メモリ上ミラー）

use crate::state::BotState;
use chrono::Local;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// `[YYYY-MM-DD HH:MM:SS] メッセージ` の1行を追記する。
/// 書き込み失敗はログだけ。通知でループを落とすことはない
pub fn log_notification(state: &mut BotState, path: &Path, message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let entry = format!("[{timestamp}] {message}\n");

    state.notifications.push(entry.clone());

    match append_line(path, &entry) {
        Ok(_) => {
            let head: String = message.chars().take(50).collect();
            println!("Notification logged: {head}…");
        }
        Err(e) => eprintln!("Error logging notification: {e}"),
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())
}

/// ログファイルが無ければ起動バナー行つきで作る。既存なら触らない
pub fn ensure_log_file(path: &Path) {
    if path.exists() {
        return;
    }
    let banner = format!("X Notification Bot Started at {}\n", Local::now());
    if let Err(e) = fs::write(path, banner) {
        eprintln!("Error creating notification log: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn appends_timestamped_lines_and_mirrors_in_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notifications.txt");
        let mut state = BotState::default();

        log_notification(&mut state, &path, "first");
        log_notification(&mut state, &path, "second");

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] first"));
        assert!(lines[1].ends_with("] second"));

        assert_eq!(state.notifications.len(), 2);
        assert!(state.notifications[1].contains("second"));
    }

    #[test]
    fn banner_is_written_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notifications.txt");

        ensure_log_file(&path);
        let first = fs::read_to_string(&path).unwrap();
        assert!(first.contains("X Notification Bot Started at"));

        // 2回目は既存ファイルに触らない
        ensure_log_file(&path);
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }
}
