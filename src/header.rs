use std::collections::BTreeMap;

use crate::coords::GridPoint;
use crate::error::{GpcpError, GpcpResult};

/// ヘッダに記録されるキー
///
/// キーは`=`より前の文字列と完全に一致したときのみ採用する。
/// `month`と`months`のように、前方一致では区別できないキーがあるためである。
const KNOWN_KEYS: &[&str] = &[
    "file",
    "title",
    "version",
    "variable",
    "units",
    "missing_value",
    "creation_date",
    "year",
    "month",
    "months",
    "days",
    "grid",
    "dimensions",
    "size",
    "1st_box_center",
    "2nd_box_center",
    "last_box_center",
];

/// 次元を示すトークンの接頭辞（例: `(real*4)x144x72`）
const DIMENSIONS_PREFIX: &str = "(real";

/// ヘッダから導出した格子と記録の定義
#[derive(Debug, Clone, PartialEq)]
pub struct GridParameters {
    /// 1行のバイト数
    ///
    /// ヘッダ自体も1行分のバイト数を占める。
    pub row_byte_size: usize,

    /// 1要素のバイト数
    pub element_byte_size: usize,

    /// 1行の要素数（経度方向の格子数）
    pub elements_per_row: usize,

    /// 1期間（1か月または1日）の行数（緯度方向の格子数）
    pub rows_per_period: usize,

    /// 最初、2番目、最後の格子点の中心
    pub first_box: GridPoint,
    pub second_box: GridPoint,
    pub last_box: GridPoint,

    /// 観測年
    pub year: i32,

    /// 観測月（日別データのみ）
    pub month: Option<u8>,

    /// 最初と最後の月（月別データのみ）
    pub months: Option<(u8, u8)>,

    /// 最初と最後の日（日別データのみ）
    pub days: Option<(u8, u8)>,

    /// 欠測値
    pub missing_value: Option<f32>,

    /// ヘッダに記録されていたキーと値
    fields: BTreeMap<String, String>,
}

impl GridParameters {
    /// ヘッダに記録されていた値を、加工せずに返す。
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// ヘッダ行を解析して、格子と記録の定義を返す。
///
/// 空白で区切られたトークンのうち、既知のキーを持つ`key=value`と次元の記述のみを採用し、
/// それ以外のトークンは無視する。
///
/// # 引数
///
/// * `line` - ヘッダ行
///
/// # 戻り値
///
/// `GridParameters`
pub fn decode_header(line: &str) -> GpcpResult<GridParameters> {
    let fields = tokenize(line);

    let row_byte_size = parse_size(required(&fields, "size")?)?;
    let (element_byte_size, elements_per_row, rows_per_period) =
        parse_dimensions(required(&fields, "dimensions")?)?;
    if element_byte_size == 0 || row_byte_size % element_byte_size != 0 {
        return Err(GpcpError::Format(format!(
            "1行のバイト数({row_byte_size})が要素のバイト数({element_byte_size})で割り切れません。"
        )));
    }
    let expected = elements_per_row.checked_mul(element_byte_size).ok_or_else(|| {
        GpcpError::Format(format!(
            "要素数({elements_per_row})と要素のバイト数({element_byte_size})の積が大きすぎます。"
        ))
    })?;
    if row_byte_size != expected {
        return Err(GpcpError::Format(format!(
            "1行のバイト数({row_byte_size})が、要素数({elements_per_row})と要素のバイト数({element_byte_size})の積と一致しません。"
        )));
    }

    let year = parse_number::<i32>("year", required(&fields, "year")?)?;
    let month = fields
        .get("month")
        .map(|v| parse_number::<u8>("month", v))
        .transpose()?;
    let months = fields
        .get("months")
        .map(|v| parse_range("months", v))
        .transpose()?;
    let days = fields
        .get("days")
        .map(|v| parse_range("days", v))
        .transpose()?;
    if months.is_none() && days.is_none() {
        return Err(GpcpError::Format(
            "ヘッダに`months`と`days`のどちらも記録されていません。".to_string(),
        ));
    }
    let missing_value = fields
        .get("missing_value")
        .and_then(|v| v.parse::<f32>().ok());

    let first_box = GridPoint::parse(required(&fields, "1st_box_center")?)?;
    let second_box = GridPoint::parse(required(&fields, "2nd_box_center")?)?;
    let last_box = GridPoint::parse(required(&fields, "last_box_center")?)?;

    Ok(GridParameters {
        row_byte_size,
        element_byte_size,
        elements_per_row,
        rows_per_period,
        first_box,
        second_box,
        last_box,
        year,
        month,
        months,
        days,
        missing_value,
        fields,
    })
}

/// ヘッダを含む文字列から`size`のみを取り出し、1行のバイト数を返す。
///
/// ヘッダの後ろに観測値のバイト列が続いていても、`size`より後ろのトークンは解析しない。
pub(crate) fn decode_row_byte_size(text: &str) -> GpcpResult<usize> {
    let value = text
        .split_whitespace()
        .find_map(|token| token.strip_prefix("size="))
        .ok_or_else(|| GpcpError::Format("ヘッダに`size`が記録されていません。".to_string()))?;

    parse_size(value)
}

fn tokenize(line: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for token in line.split_whitespace() {
        if token.starts_with(DIMENSIONS_PREFIX) {
            fields.insert("dimensions".to_string(), token.to_string());
            continue;
        }
        if let Some((key, value)) = token.split_once('=') {
            if KNOWN_KEYS.contains(&key) {
                fields.insert(key.to_string(), value.to_string());
            }
        }
    }

    fields
}

fn required<'a>(fields: &'a BTreeMap<String, String>, key: &str) -> GpcpResult<&'a str> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| GpcpError::Format(format!("ヘッダに`{key}`が記録されていません。")))
}

/// 末尾の1文字を取り除く。
fn drop_last(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}

fn parse_number<T>(key: &str, value: &str) -> GpcpResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        GpcpError::Format(format!("ヘッダの`{key}`を数値に変換できません。`{value}` {e}"))
    })
}

/// `size=4*576B`の2番目の要素から末尾の1文字を除き、1行のバイト数とする。
fn parse_size(value: &str) -> GpcpResult<usize> {
    let second = value.split('*').nth(1).ok_or_else(|| {
        GpcpError::Format(format!("ヘッダの`size`に`*`がありません。`{value}`"))
    })?;

    parse_number("size", drop_last(second))
}

/// `(real*4)x144x72`から、要素のバイト数、1行の要素数、1期間の行数を取り出す。
fn parse_dimensions(value: &str) -> GpcpResult<(usize, usize, usize)> {
    let parts: Vec<&str> = value.split('x').collect();
    if parts.len() < 3 {
        return Err(GpcpError::Format(format!(
            "次元の記述が`(real*<バイト数>)x<列数>x<行数>`の形式ではありません。`{value}`"
        )));
    }
    let element = parts[0].split('*').nth(1).ok_or_else(|| {
        GpcpError::Format(format!("次元の記述に要素のバイト数がありません。`{value}`"))
    })?;
    let element_byte_size = parse_number("dimensions", drop_last(element))?;
    let elements_per_row = parse_number("dimensions", parts[1])?;
    let rows_per_period = parse_number("dimensions", parts[2])?;

    Ok((element_byte_size, elements_per_row, rows_per_period))
}

/// `1-12`のような範囲を解析する。
fn parse_range(key: &str, value: &str) -> GpcpResult<(u8, u8)> {
    let (first, last) = value.split_once('-').ok_or_else(|| {
        GpcpError::Format(format!("ヘッダの`{key}`が`最初-最後`の形式ではありません。`{value}`"))
    })?;

    Ok((parse_number(key, first)?, parse_number(key, last)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTHLY: &str = "file=gpcp_v2.2_psg.1987 title=GPCP Version 2.2 Combined Precipitation \
        version=2.2 variable=precipitation units=mm/d missing_value=-99999. year=1987 \
        months=1-12 grid=2.5x2.5 size=4*576B (real*4)x144x72 \
        1st_box_center=(88.75N,1.25E) 2nd_box_center=(88.75N,3.75E) \
        last_box_center=(88.75S,358.75E)";

    const DAILY: &str = "file=gpcp_1dd_v1.2_p1d.199610 variable=precipitation year=1996 \
        month=10 days=1-31 size=4*1440B dimensions=(real*4)x360x180x31 \
        1st_box_center=(89.5N,0.5E) 2nd_box_center=(89.5N,1.5E) \
        last_box_center=(89.5S,359.5E)";

    #[test]
    fn monthly_header_fields() {
        let p = decode_header(MONTHLY).unwrap();
        assert_eq!(p.row_byte_size, 576);
        assert_eq!(p.element_byte_size, 4);
        assert_eq!(p.elements_per_row, 144);
        assert_eq!(p.rows_per_period, 72);
        assert_eq!(p.year, 1987);
        assert_eq!(p.months, Some((1, 12)));
        assert_eq!(p.days, None);
        assert_eq!(p.month, None);
        assert_eq!(p.missing_value, Some(-99999.0));
        assert_eq!(p.first_box, GridPoint::new(88.75, 1.25));
        assert_eq!(p.second_box, GridPoint::new(88.75, 3.75));
        assert_eq!(p.last_box, GridPoint::new(-88.75, 358.75));
        assert_eq!(p.field("grid"), Some("2.5x2.5"));
        assert_eq!(p.field("title"), Some("GPCP"));
    }

    #[test]
    fn daily_header_distinguishes_month_and_days() {
        let p = decode_header(DAILY).unwrap();
        assert_eq!(p.row_byte_size, 1440);
        assert_eq!(p.elements_per_row, 360);
        assert_eq!(p.rows_per_period, 180);
        assert_eq!(p.month, Some(10));
        assert_eq!(p.months, None);
        assert_eq!(p.days, Some((1, 31)));
        assert_eq!(p.missing_value, None);
    }

    #[test]
    fn unknown_and_prefixed_keys_are_ignored() {
        let header = MONTHLY.replace("months=1-12", "monthsx=3-4 months=1-12 yearly=1");
        let p = decode_header(&header).unwrap();
        assert_eq!(p.months, Some((1, 12)));
        assert_eq!(p.year, 1987);
    }

    #[test]
    fn missing_required_key_is_format_error() {
        for key in ["size=4*576B", "year=1987", "1st_box_center=(88.75N,1.25E)"] {
            let header = MONTHLY.replace(key, "");
            assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))), "{key}");
        }
        let header = MONTHLY.replace("months=1-12", "");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));
    }

    #[test]
    fn malformed_size_and_dimensions() {
        let header = MONTHLY.replace("size=4*576B", "size=576B");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));

        let header = MONTHLY.replace("(real*4)x144x72", "(real*4)x144");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));

        let header = MONTHLY.replace("size=4*576B", "size=4*575B");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));

        let header = MONTHLY.replace("size=4*576B", "size=4*580B");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));
    }

    #[test]
    fn oversized_dimensions_are_format_error() {
        let header = MONTHLY.replace("(real*4)x144x72", "(real*4)x4611686018427387904x72");
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));

        let header = MONTHLY.replace("(real*4)x144x72", &format!("(real*4)x{}x72", usize::MAX));
        assert!(matches!(decode_header(&header), Err(GpcpError::Format(_))));
    }

    #[test]
    fn row_byte_size_ignores_trailing_bytes() {
        assert_eq!(decode_row_byte_size(MONTHLY).unwrap(), 576);
        let glued = format!("{MONTHLY}BH");
        assert_eq!(decode_row_byte_size(&glued).unwrap(), 576);
        assert!(matches!(
            decode_row_byte_size("year=1987 months=1-12"),
            Err(GpcpError::Format(_))
        ));
    }
}
