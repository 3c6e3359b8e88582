//! 小物ユーティリティ

/// 先頭 max 文字で切る（バイトではなく文字単位なので多バイトでも安全）
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// ポストの正規 URL
pub fn tweet_url(username: &str, tweet_id: &str) -> String {
    format!("https://twitter.com/{username}/status/{tweet_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_is_char_safe() {
        let s = "あ".repeat(150);
        let got = truncate_chars(&s, 100);
        assert_eq!(got.chars().count(), 100);
    }

    #[test]
    fn short_input_is_unchanged() {
        assert_eq!(truncate_chars("hello", 100), "hello");
    }

    #[test]
    fn url_uses_handle_and_id() {
        assert_eq!(
            tweet_url("someone", "12345"),
            "https://twitter.com/someone/status/12345"
        );
    }
}
