/// GPCPエラー型
#[derive(Debug, Clone, thiserror::Error)]
pub enum GpcpError {
    /// 予期しない例外
    #[error("{0}")]
    Unexpected(String),

    /// ファイル・オープン・エラー
    #[error("ファイルを開くときにエラーが発生しました。{0}")]
    Open(String),

    /// ヘッダまたはファイル構造の書式エラー
    #[error("ファイルの書式が不正です。{0}")]
    Format(String),

    /// バイト列を観測値に変換できない
    #[error("観測値の復号に失敗しました。{0}")]
    Decode(String),

    /// 格子と観測値の数が整合しない
    #[error("格子と観測値の対応が整合しません。{0}")]
    Consistency(String),
}

/// GPCP結果型
pub type GpcpResult<T> = Result<T, GpcpError>;
