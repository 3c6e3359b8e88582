///! 4種類の変化検出チェック

mod engagement;
mod followers;
mod mentions;
mod tweets;

pub use engagement::check_tweet_engagement;
pub use followers::check_new_followers;
pub use mentions::check_mentions;
pub use tweets::check_new_tweets;

/// 1回のチェックの結果。Run Loop 側のバックオフ判断はこの値と Err だけを見る
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// ゲートを通過して実行した
    Ran,
    /// インターバル未経過などでスキップ
    Skipped,
    /// API から何も取れなかった（このサイクルは情報なし扱い）
    SoftFailed,
}
