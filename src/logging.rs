use tracing_subscriber::EnvFilter;

/// ログを出力するクレート
const CRATE_TARGETS: &[&str] = &["gpcp", "gpcp2csv"];

/// コマンドラインで指定された詳細度でログの出力を初期化する。
///
/// - 0 -> warn
/// - 1 (-v) -> info
/// - 2 (-vv) -> debug
/// - 3以上 (-vvv) -> trace
///
/// 環境変数`RUST_LOG`が設定されている場合は、そちらを優先する。
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let default_filter = CRATE_TARGETS
        .iter()
        .map(|t| format!("{t}={level}"))
        .collect::<Vec<_>>()
        .join(",");
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
