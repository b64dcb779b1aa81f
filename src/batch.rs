use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{info, warn};

use crate::config::{ConvertConfig, OutputLayout};
use crate::correlate::{Correlator, PeriodCalendar};
use crate::error::{GpcpError, GpcpResult};
use crate::grid::Grid;
use crate::readers::GpcpReader;
use crate::writers::{output_csv, output_map};

/// 展開したファイル
///
/// ドロップしたときに展開したファイルを削除する。
#[derive(Debug)]
pub struct UnzippedFile {
    path: PathBuf,
}

impl UnzippedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for UnzippedFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), "展開したファイルを削除できませんでした。{e}");
        }
    }
}

/// gzipで圧縮されたファイルを展開する。
///
/// 展開先は、ファイル名が`.gz`で終わる場合はそれを除いたパス、それ以外は末尾に`_unzipped`を付けたパスである。
///
/// # 引数
///
/// * `path` - 圧縮されたファイルのパス
///
/// # 戻り値
///
/// 展開したファイル
pub fn unzip<P>(path: P) -> GpcpResult<UnzippedFile>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let name = path.to_string_lossy();
    let dest = match name.strip_suffix(".gz") {
        Some(stem) => PathBuf::from(stem),
        None => PathBuf::from(format!("{name}_unzipped")),
    };

    let file = File::open(path).map_err(|e| GpcpError::Open(format!("{name}: {e}")))?;
    let mut decoder = GzDecoder::new(BufReader::new(file));
    let out = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&dest)
        .map_err(|e| GpcpError::Open(format!("{}: {e}", dest.display())))?;
    // 書き込み前に作成したため、失敗した場合もドロップで削除される
    let unzipped = UnzippedFile { path: dest };
    let mut writer = BufWriter::new(out);
    io::copy(&mut decoder, &mut writer)
        .and_then(|_| writer.flush())
        .map_err(|e| GpcpError::Open(format!("{name}を展開できませんでした。{e}")))?;
    info!(from = %name, to = %unzipped.path.display(), "ファイルを展開しました。");

    Ok(unzipped)
}

/// ファイルの変換結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// 出力した観測値の行数
    Written(usize),
    /// 観測値が記録されていなかったため、出力しなかった
    Empty,
}

/// GPCPファイルをCSVファイルに変換する。
///
/// 出力する内容をすべてメモリ上に作成してから書き込むため、変換に失敗した場合は出力ファイルを作成しない。
///
/// # 引数
///
/// * `input` - GPCPファイルのパス
/// * `output` - CSVファイルのパス
/// * `config` - 変換の設定
///
/// # 戻り値
///
/// `FileOutcome`
pub fn convert_file<P, Q>(input: P, output: Q, config: &ConvertConfig) -> GpcpResult<FileOutcome>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let reader = GpcpReader::new(input, config.truncation())?;
    if !reader.has_data() {
        info!(path = %reader.path().display(), "観測値が記録されていません。");
        return Ok(FileOutcome::Empty);
    }

    let rendered = render_csv(&reader, config)?;
    let output = output.as_ref();
    fs::write(output, &rendered.bytes)
        .map_err(|e| GpcpError::Open(format!("{}: {e}", output.display())))?;

    Ok(FileOutcome::Written(rendered.rows))
}

/// メモリ上に作成したCSV
struct Rendered {
    bytes: Vec<u8>,
    rows: usize,
}

fn render_csv(reader: &GpcpReader, config: &ConvertConfig) -> GpcpResult<Rendered> {
    let parameters = reader.parameters();
    let grid = Grid::build(
        &parameters.first_box,
        &parameters.second_box,
        &parameters.last_box,
        parameters.elements_per_row,
        parameters.rows_per_period,
    )?;
    let coordinates = grid.coordinate_list(config.longitude_policy())?;
    let calendar = PeriodCalendar::from_header(parameters, config.format().granularity())?;

    let mut bytes = Vec::new();
    if config.layout() == OutputLayout::WithMap {
        output_map(&mut bytes, &grid)?;
    }
    let correlator = Correlator::new(
        &coordinates,
        reader.records(),
        parameters.rows_per_period,
        calendar,
    )?;
    let missing = parameters.missing_value.filter(|_| config.skip_missing());
    let rows = correlator.filter(|row| match (row, missing) {
        (Ok(row), Some(missing)) => row.value != missing,
        _ => true,
    });
    let rows = output_csv(&mut bytes, rows)?;

    Ok(Rendered { bytes, rows })
}

/// 入力ファイルと出力ファイルの組
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileJob {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// 複数ファイルの変換要求
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// 入力ファイルのパスの接頭辞
    pub input_prefix: String,
    /// 出力ファイルのパスの接頭辞
    pub output_prefix: String,
    /// 年
    pub years: Vec<i32>,
    /// 月（年月ごとにファイルが分かれている書式のみ使用）
    pub months: Vec<u8>,
    /// 入力ファイルがgzipで圧縮されている場合は`true`
    pub zipped: bool,
    /// 変換の設定
    pub config: ConvertConfig,
}

impl BatchRequest {
    /// 入力ファイルと出力ファイルの組を、入力ファイルのパス順に返す。
    pub fn jobs(&self) -> Vec<FileJob> {
        let suffix = if self.zipped { ".gz" } else { "" };
        let stems: Vec<String> = if self.config.format().is_yearly_file() {
            self.years.iter().map(|y| y.to_string()).collect()
        } else {
            self.years
                .iter()
                .flat_map(|y| self.months.iter().map(move |m| format!("{y}{m:02}")))
                .collect()
        };

        let jobs: BTreeMap<PathBuf, PathBuf> = stems
            .iter()
            .map(|stem| {
                (
                    PathBuf::from(format!("{}{stem}{suffix}", self.input_prefix)),
                    PathBuf::from(format!("{}{stem}.csv", self.output_prefix)),
                )
            })
            .collect();

        jobs.into_iter()
            .map(|(input, output)| FileJob { input, output })
            .collect()
    }
}

/// 複数ファイルの変換結果
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// 変換したファイルと出力した行数
    pub written: Vec<(PathBuf, usize)>,
    /// 観測値が記録されていなかったファイル
    pub empty: Vec<PathBuf>,
    /// 変換できなかったファイルとエラー
    pub skipped: Vec<(PathBuf, GpcpError)>,
}

/// 1つのファイルを変換する。圧縮されている場合は展開してから変換する。
pub fn process_file(job: &FileJob, zipped: bool, config: &ConvertConfig) -> GpcpResult<FileOutcome> {
    if zipped {
        let unzipped = unzip(&job.input)?;
        convert_file(unzipped.path(), &job.output, config)
    } else {
        convert_file(&job.input, &job.output, config)
    }
}

/// 要求されたすべてのファイルを変換する。
///
/// 変換できなかったファイルは警告を記録してスキップし、残りのファイルの変換を続ける。
pub fn run_batch(request: &BatchRequest) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for job in request.jobs() {
        match process_file(&job, request.zipped, &request.config) {
            Ok(FileOutcome::Written(rows)) => {
                info!(output = %job.output.display(), rows, "CSVを出力しました。");
                summary.written.push((job.output, rows));
            }
            Ok(FileOutcome::Empty) => summary.empty.push(job.input),
            Err(e) => {
                warn!(input = %job.input.display(), "ファイルをスキップしました。{e}");
                summary.skipped.push((job.input, e));
            }
        }
    }

    summary
}
