#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

/// 経度方向の格子数
pub const COLUMNS: usize = 64;

/// 1期間の行数
pub const ROWS_PER_PERIOD: usize = 2;

/// 月別ファイルのヘッダに追加する項目
pub const MONTHLY: &str = "year=1987 months=1-12";

/// 日別ファイルのヘッダに追加する項目
pub const DAILY: &str = "year=1996 month=2 days=1-29";

/// 経度178.75度から東に2.5度間隔で並ぶ格子のヘッダ
pub fn header(extra: &str) -> String {
    format!(
        "file=fixture title=GPCP Fixture size=4*{}B (real*4)x{COLUMNS}x{ROWS_PER_PERIOD} \
         1st_box_center=(88.75N,178.75E) 2nd_box_center=(88.75N,181.25E) \
         last_box_center=(86.25N,336.25E) missing_value=-99999. {extra}",
        COLUMNS * 4
    )
}

/// `r`行目の`c`番目の観測値を`r * 100 + c`とした行を`rows`行作成する。
pub fn rows(rows: usize) -> Vec<Vec<f32>> {
    (0..rows)
        .map(|r| (0..COLUMNS).map(|c| (r * 100 + c) as f32).collect())
        .collect()
}

/// ヘッダを1行分の長さまで空白で埋め、観測値を続けたバイト列を返す。
pub fn file_bytes(header: &str, rows: &[Vec<f32>]) -> Vec<u8> {
    let mut bytes = header.as_bytes().to_vec();
    assert!(bytes.len() <= COLUMNS * 4, "header is longer than a row");
    bytes.resize(COLUMNS * 4, b' ');
    for row in rows {
        bytes.extend(row.iter().flat_map(|v| v.to_be_bytes()));
    }
    bytes
}

pub fn write_file(path: &Path, header: &str, rows: &[Vec<f32>]) {
    fs::write(path, file_bytes(header, rows)).expect("write fixture");
}

pub fn write_gzip(path: &Path, header: &str, rows: &[Vec<f32>]) {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&file_bytes(header, rows))
        .expect("compress fixture");
    fs::write(path, encoder.finish().expect("finish gzip")).expect("write fixture");
}
