use std::io::Write;

use time::format_description::FormatItem;
use time::macros::format_description;

use crate::correlate::OutputRow;
use crate::error::{GpcpError, GpcpResult};
use crate::grid::Grid;

/// 出力する日付の書式
const DATE_FMT: &[FormatItem<'_>] = format_description!("[year][month][day]");

/// 地図の開始を示す行
const MAP_MARKER: &str = "MAP";

/// 観測値を`日付,緯度,経度,観測値`の形式で出力する。
///
/// # 引数
///
/// * `writer` - 出力先
/// * `rows` - 日付、座標と観測値を返すイテレーター
///
/// # 戻り値
///
/// 出力した行数
pub fn output_csv<W, I>(writer: &mut W, rows: I) -> GpcpResult<usize>
where
    W: Write,
    I: Iterator<Item = GpcpResult<OutputRow>>,
{
    let mut count = 0;
    for row in rows {
        let row = row?;
        let date = row.date.format(DATE_FMT).map_err(|e| {
            GpcpError::Unexpected(format!("日付を文字列に変換できませんでした。{e}"))
        })?;
        writeln!(
            writer,
            "{date},{},{},{:.2}",
            Degrees(row.latitude),
            Degrees(row.longitude),
            row.value
        )
        .map_err(|e| GpcpError::Unexpected(format!("CSVの書き込みに失敗しました。{e}")))?;
        count += 1;
    }

    Ok(count)
}

/// CSVに出力する緯度と経度
///
/// 最短の表現で出力するが、整数の場合は`-90.0`のように小数点以下を1桁付ける。
struct Degrees(f64);

impl std::fmt::Display for Degrees {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_finite() && self.0.fract() == 0.0 {
            write!(f, "{:.1}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// `MAP`の行に続けて、格子の行ごとに格子点を出力する。
pub fn output_map<W>(writer: &mut W, grid: &Grid) -> GpcpResult<()>
where
    W: Write,
{
    writeln!(writer, "{MAP_MARKER}")
        .map_err(|e| GpcpError::Unexpected(format!("地図の書き込みに失敗しました。{e}")))?;
    for row in grid.rows() {
        let line = row
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        writeln!(writer, "{line}")
            .map_err(|e| GpcpError::Unexpected(format!("地図の書き込みに失敗しました。{e}")))?;
    }

    Ok(())
}
