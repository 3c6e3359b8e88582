use anyhow::{anyhow, Context, Result};
use std::{env, fmt::Display, str::FromStr};

pub fn must(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("missing required env: {key}"))
}

/// 未設定と空文字は同じ「無し」として扱う
pub fn opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

pub fn parse<T: FromStr>(key: &str, default: T) -> Result<T>
where
    <T as FromStr>::Err: Display,
{
    match opt(key) {
        Some(s) => s.parse::<T>().map_err(|e| anyhow!("failed to parse {key}='{s}': {e}")),
        None => Ok(default),
    }
}
