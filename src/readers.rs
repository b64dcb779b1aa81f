use std::fs::OpenOptions;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{GpcpError, GpcpResult};
use crate::header::{decode_header, decode_row_byte_size, GridParameters};

/// 復号できる要素のバイト数（ビッグエンディアンの単精度浮動小数点数）
const ELEMENT_BYTES: usize = 4;

/// 末尾の1行に満たないバイト列の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TruncationPolicy {
    /// 警告を記録して破棄する。
    #[default]
    Drop,
    /// 書式エラーとする。
    Strict,
}

/// 1行分の観測値
#[derive(Debug, Clone, PartialEq)]
pub struct DataRecord(Vec<f32>);

impl DataRecord {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `GpcpReader`
///
/// ファイル全体をメモリに読み込み、ヘッダと観測値を復号する。
#[derive(Debug)]
pub struct GpcpReader {
    /// パス
    path: PathBuf,
    /// ヘッダ文字列
    header: String,
    /// 格子と記録の定義
    parameters: GridParameters,
    /// 観測値
    records: Vec<DataRecord>,
}

impl GpcpReader {
    /// GPCPファイルを開く
    ///
    /// # 引数
    ///
    /// * `path` - 開くGPCPファイルのパス
    /// * `truncation` - 末尾の1行に満たないバイト列の扱い
    ///
    /// # 戻り値
    ///
    /// `GpcpReader`
    pub fn new<P>(path: P, truncation: TruncationPolicy) -> GpcpResult<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref().to_owned();
        let file = OpenOptions::new()
            .read(true)
            .open(&path)
            .map_err(|e| GpcpError::Open(format!("{}: {e}", path.display())))?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).map_err(|e| {
            GpcpError::Open(format!("{}の読み込みに失敗しました。{e}", path.display()))
        })?;

        let (header, parameters, body) = split_header(&bytes)?;
        debug!(
            path = %path.display(),
            row_bytes = parameters.row_byte_size,
            columns = parameters.elements_per_row,
            rows_per_period = parameters.rows_per_period,
            "ヘッダを解析しました。"
        );
        let records = decode_records(
            body,
            parameters.row_byte_size,
            parameters.element_byte_size,
            truncation,
        )?;

        Ok(Self {
            path,
            header,
            parameters,
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// ヘッダ文字列を、末尾の空白をトリムして返す。
    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn parameters(&self) -> &GridParameters {
        &self.parameters
    }

    /// 観測値を記録順に格納したスライスを返す。
    pub fn records(&self) -> &[DataRecord] {
        &self.records
    }

    pub fn has_data(&self) -> bool {
        !self.records.is_empty()
    }
}

/// ファイルの内容をヘッダとデータ部に分割する。
///
/// ヘッダは1行分のバイト数を占めるが、そのバイト数はヘッダに記録されている。
/// このため、まず先頭の印字可能な文字列から`size`のみを読み取り、1行のバイト数が判明した後、
/// 先頭から1行分のバイト列でヘッダを解析する。
/// ヘッダが1行分のバイト数を空白で埋めずに使い切っている場合、印字可能な文字列には観測値のバイト列が
/// 続くため、最初の段階では`size`以外のトークンを解析しない。
///
/// # 戻り値
///
/// ヘッダ文字列、格子と記録の定義、データ部のバイト列
pub fn split_header(bytes: &[u8]) -> GpcpResult<(String, GridParameters, &[u8])> {
    let row_byte_size = decode_row_byte_size(&printable_prefix(bytes))?;
    if row_byte_size == 0 {
        return Err(GpcpError::Format("ヘッダの`size`が0バイトです。".to_string()));
    }
    if bytes.len() < row_byte_size {
        return Err(GpcpError::Format(format!(
            "ファイルのサイズ({}バイト)がヘッダのサイズ({row_byte_size}バイト)に足りません。",
            bytes.len()
        )));
    }
    let (head, body) = bytes.split_at(row_byte_size);
    let header = printable_prefix(head).trim_end().to_string();
    let parameters = decode_header(&header)?;

    Ok((header, parameters, body))
}

/// 先頭から印字可能なASCII文字が続く範囲を文字列として返す。
fn printable_prefix(bytes: &[u8]) -> String {
    let end = bytes
        .iter()
        .position(|b| !(b.is_ascii_graphic() || *b == b' '))
        .unwrap_or(bytes.len());

    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// データ部を1行ずつ観測値に変換する。
///
/// 1行のバイト列は、ビッグエンディアンの単精度浮動小数点数が記録順に並んでいる。
///
/// # 引数
///
/// * `body` - ヘッダより後ろのバイト列
/// * `row_byte_size` - 1行のバイト数
/// * `element_byte_size` - 1要素のバイト数
/// * `truncation` - 末尾の1行に満たないバイト列の扱い
///
/// # 戻り値
///
/// 行ごとの観測値
pub fn decode_records(
    body: &[u8],
    row_byte_size: usize,
    element_byte_size: usize,
    truncation: TruncationPolicy,
) -> GpcpResult<Vec<DataRecord>> {
    if element_byte_size == 0 || row_byte_size == 0 || row_byte_size % element_byte_size != 0 {
        return Err(GpcpError::Format(format!(
            "1行のバイト数({row_byte_size})が要素のバイト数({element_byte_size})で割り切れません。"
        )));
    }
    if element_byte_size != ELEMENT_BYTES {
        return Err(GpcpError::Decode(format!(
            "{element_byte_size}バイトの要素を単精度浮動小数点数として復号できません。"
        )));
    }

    let chunks = body.chunks_exact(row_byte_size);
    let remainder = chunks.remainder().len();
    if remainder != 0 {
        match truncation {
            TruncationPolicy::Strict => {
                return Err(GpcpError::Format(format!(
                    "データ部の末尾に1行({row_byte_size}バイト)に満たない{remainder}バイトがあります。"
                )));
            }
            TruncationPolicy::Drop => {
                warn!(remainder, row_byte_size, "末尾の1行に満たないバイト列を破棄しました。");
            }
        }
    }

    Ok(chunks.map(decode_row).collect())
}

fn decode_row(chunk: &[u8]) -> DataRecord {
    DataRecord(
        chunk
            .chunks_exact(ELEMENT_BYTES)
            .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_be_bytes()).collect()
    }

    #[test]
    fn decodes_big_endian_rows() {
        let mut body = row(&[1.0, -2.5, 0.19]);
        body.extend(row(&[3.0, 4.0, 5.0]));
        let records = decode_records(&body, 12, 4, TruncationPolicy::Strict).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].values(), &[1.0, -2.5, 0.19]);
        assert_eq!(records[1].values(), &[3.0, 4.0, 5.0]);
    }

    #[test]
    fn decoding_is_deterministic() {
        let values: Vec<f32> = (0..144).map(|i| i as f32 * 0.25).collect();
        let body = row(&values);
        assert_eq!(body.len(), 576);
        let a = decode_records(&body, 576, 4, TruncationPolicy::Strict).unwrap();
        let b = decode_records(&body, 576, 4, TruncationPolicy::Strict).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), 144);
        assert_eq!(a[0].values(), values.as_slice());
    }

    #[test]
    fn truncated_remainder_depends_on_policy() {
        let mut body = row(&vec![1.0; 144]);
        body.extend(vec![0u8; 575]);

        let result = decode_records(&body, 576, 4, TruncationPolicy::Strict);
        assert!(matches!(result, Err(GpcpError::Format(_))));

        let records = decode_records(&body, 576, 4, TruncationPolicy::Drop).unwrap();
        assert_eq!(records.len(), 1);

        let records = decode_records(&body[576..], 576, 4, TruncationPolicy::Drop).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn unsupported_element_size() {
        let result = decode_records(&[0u8; 16], 16, 8, TruncationPolicy::Drop);
        assert!(matches!(result, Err(GpcpError::Decode(_))));
        let result = decode_records(&[0u8; 16], 16, 0, TruncationPolicy::Drop);
        assert!(matches!(result, Err(GpcpError::Format(_))));
        let result = decode_records(&[0u8; 16], 6, 4, TruncationPolicy::Drop);
        assert!(matches!(result, Err(GpcpError::Format(_))));
    }

    #[test]
    fn split_header_uses_row_size() {
        let text = "size=4*400B (real*4)x100x2 year=2001 months=1-12 \
            1st_box_center=(1N,0E) 2nd_box_center=(0N,1E) last_box_center=(0N,2E)";
        let mut bytes = text.as_bytes().to_vec();
        bytes.resize(400, b' ');
        bytes.extend(row(&vec![7.5; 100]));

        let (header, parameters, body) = split_header(&bytes).unwrap();
        assert_eq!(header, text);
        assert_eq!(parameters.row_byte_size, 400);
        assert_eq!(body.len(), 400);
    }

    #[test]
    fn unpadded_header_followed_by_printable_data() {
        // ヘッダが1行(140バイト)を使い切り、直後の観測値50.0は`BH\0\0`になる
        let text = "title=unpadded123 size=4*140B (real*4)x35x2 year=2001 months=1-12 \
            1st_box_center=(1N,0E) 2nd_box_center=(0N,1E) last_box_center=(0N,358.75E)";
        assert_eq!(text.len(), 140);
        let mut bytes = text.as_bytes().to_vec();
        bytes.extend(row(&vec![50.0; 35]));
        assert_eq!(&bytes[140..142], b"BH");

        let (header, parameters, body) = split_header(&bytes).unwrap();
        assert_eq!(header, text);
        assert_eq!(parameters.last_box, crate::coords::GridPoint::new(0.0, 358.75));
        let records = decode_records(body, 140, 4, TruncationPolicy::Strict).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values()[0], 50.0);
    }

    #[test]
    fn header_longer_than_file_is_rejected() {
        let text = "size=4*400B (real*4)x100x2 year=2001 months=1-12 \
            1st_box_center=(1N,0E) 2nd_box_center=(0N,1E) last_box_center=(0N,2E)";
        assert!(matches!(
            split_header(text.as_bytes()),
            Err(GpcpError::Format(_))
        ));
    }
}
