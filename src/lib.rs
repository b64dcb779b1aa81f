//! GPCP（全球降水気候計画）の格子データを読み込み、
//! `日付,緯度,経度,観測値`の形式のCSVに変換する。
//!
//! ファイルの先頭には、格子の定義を`key=value`の形式で記録した1行分のヘッダがあり、
//! その後ろにビッグエンディアンの単精度浮動小数点数を並べた行が続く。
pub mod batch;
pub mod config;
pub mod coords;
pub mod correlate;
pub mod error;
pub mod grid;
pub mod header;
pub mod readers;
pub mod writers;

pub use batch::{convert_file, run_batch, unzip, BatchRequest, BatchSummary, FileJob, FileOutcome};
pub use config::{ConvertConfig, FormatVersion, Granularity, OutputLayout};
pub use coords::{Axis, Coordinate, GridPoint, Hemisphere};
pub use correlate::{Correlator, OutputRow, PeriodCalendar};
pub use error::{GpcpError, GpcpResult};
pub use grid::{Grid, LongitudePolicy};
pub use header::{decode_header, GridParameters};
pub use readers::{decode_records, DataRecord, GpcpReader, TruncationPolicy};
pub use writers::{output_csv, output_map};
