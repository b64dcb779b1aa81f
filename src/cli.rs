use std::path::PathBuf;

use clap::Parser;

/// GPCPの格子データをCSVに変換する。
#[derive(Parser, Debug)]
#[command(name = "gpcp2csv", version, about = "GPCPの格子データをCSVに変換する")]
pub struct Cli {
    /// 詳細なログを出力する（-v info、-vv debug、-vvv trace）
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// 入力ファイルがgzipで圧縮されている
    #[arg(short = 'z', long)]
    pub gzip: bool,

    /// 1つのファイルのみを変換する（--input-fileと--output-fileが必須）
    #[arg(short, long, requires_all = ["input_file", "output_file"])]
    pub single_file: bool,

    /// 入力ファイルのパス
    #[arg(short, long)]
    pub input_file: Option<PathBuf>,

    /// 出力ファイルのパス（拡張子`.csv`がない場合は付与する）
    #[arg(short, long)]
    pub output_file: Option<PathBuf>,

    /// 入力ファイルのパスの接頭辞
    #[arg(short = 'p', long, default_value = "./gpcp_1dd_v1.2_p1d.")]
    pub input_prefix: String,

    /// 出力ファイルのパスの接頭辞
    #[arg(long, default_value = "./gpcp_out_")]
    pub output_prefix: String,

    /// 年（カンマ区切り、1970年から今年まで）
    #[arg(short, long, value_delimiter = ',')]
    pub years: Vec<i32>,

    /// 月（カンマ区切り、1から12まで）
    #[arg(short, long, value_delimiter = ',', value_parser = clap::value_parser!(u8).range(1..=12))]
    pub months: Vec<u8>,

    /// 書式（0: 旧書式と地図、1: 旧書式、2: 日別の新書式）
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=2))]
    pub format: u8,

    /// 末尾の1行に満たないバイト列をエラーとする
    #[arg(long)]
    pub strict: bool,

    /// 観測値の前に地図を出力する
    #[arg(long)]
    pub map: bool,

    /// 欠測値を出力しない
    #[arg(long)]
    pub skip_missing: bool,
}
