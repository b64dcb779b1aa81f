use std::fmt;
use std::str::FromStr;

use crate::error::{GpcpError, GpcpResult};

/// 座標軸
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// 緯度
    Latitude,
    /// 経度
    Longitude,
}

/// 半球を示す文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hemisphere {
    North,
    South,
    East,
    West,
}

impl Hemisphere {
    /// 文字から半球を判定する。大文字と小文字は区別しない。
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'N' => Some(Self::North),
            'S' => Some(Self::South),
            'E' => Some(Self::East),
            'W' => Some(Self::West),
            _ => None,
        }
    }

    /// 半球が属する座標軸を返す。
    pub fn axis(self) -> Axis {
        match self {
            Self::North | Self::South => Axis::Latitude,
            Self::East | Self::West => Axis::Longitude,
        }
    }

    /// 南と西は負の値になる。
    pub fn sign(self) -> f64 {
        match self {
            Self::North | Self::East => 1.0,
            Self::South | Self::West => -1.0,
        }
    }
}

/// 緯度または経度
///
/// 値は符号付きの度で保持する（南緯と西経は負）。
/// 表示する半球の文字は、保持している値の符号と座標軸から、表示するときに決定する。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    axis: Axis,
    value: f64,
}

impl Coordinate {
    pub fn new(axis: Axis, value: f64) -> Self {
        Self { axis, value }
    }

    pub fn latitude(value: f64) -> Self {
        Self::new(Axis::Latitude, value)
    }

    pub fn longitude(value: f64) -> Self {
        Self::new(Axis::Longitude, value)
    }

    /// 符号なしの度と半球から座標を構築する。
    ///
    /// # 引数
    ///
    /// * `degrees` - 度
    /// * `hemisphere` - 半球
    pub fn with_hemisphere(degrees: f64, hemisphere: Hemisphere) -> Self {
        Self::new(hemisphere.axis(), degrees * hemisphere.sign())
    }

    /// `88.75N`や`0.75W`のような、末尾に半球の文字を持つ文字列を解析する。
    ///
    /// # 引数
    ///
    /// * `text` - 解析する文字列
    ///
    /// # 戻り値
    ///
    /// `Coordinate`
    pub fn parse(text: &str) -> GpcpResult<Self> {
        let text = text.trim();
        let letter = text.chars().last().ok_or_else(|| {
            GpcpError::Format("座標を示す文字列が空です。".to_string())
        })?;
        let hemisphere = Hemisphere::from_letter(letter).ok_or_else(|| {
            GpcpError::Format(format!(
                "座標の末尾に半球を示す文字がありません。`{text}`"
            ))
        })?;
        let number = &text[..text.len() - letter.len_utf8()];
        let degrees = number.parse::<f64>().map_err(|e| {
            GpcpError::Format(format!("座標の数値を解析できません。`{text}` {e}"))
        })?;
        if !degrees.is_finite() {
            return Err(GpcpError::Format(format!("座標の数値が有限ではありません。`{text}`")));
        }

        Ok(Self::with_hemisphere(degrees, hemisphere))
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// 符号付きの度を返す。
    pub fn value(&self) -> f64 {
        self.value
    }

    /// 表示に使用する半球を返す。
    ///
    /// 値が0の場合は南または西になる。
    pub fn hemisphere(&self) -> Hemisphere {
        match (self.axis, self.value > 0.0) {
            (Axis::Latitude, true) => Hemisphere::North,
            (Axis::Latitude, false) => Hemisphere::South,
            (Axis::Longitude, true) => Hemisphere::East,
            (Axis::Longitude, false) => Hemisphere::West,
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self.hemisphere() {
            Hemisphere::North => 'N',
            Hemisphere::South => 'S',
            Hemisphere::East => 'E',
            Hemisphere::West => 'W',
        };
        write!(f, "{:.2}{letter}", self.value.abs())
    }
}

impl FromStr for Coordinate {
    type Err = GpcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// 格子点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub lat: Coordinate,
    pub lon: Coordinate,
}

impl GridPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat: Coordinate::latitude(lat),
            lon: Coordinate::longitude(lon),
        }
    }

    /// `(88.75N,1.25E)`のような、括弧で囲まれた緯度と経度の組を解析する。
    ///
    /// 括弧は省略できる。
    pub fn parse(text: &str) -> GpcpResult<Self> {
        let inner = text
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (lat, lon) = inner.split_once(',').ok_or_else(|| {
            GpcpError::Format(format!(
                "格子点が`(緯度,経度)`の形式ではありません。`{text}`"
            ))
        })?;
        let lat = Coordinate::parse(lat)?;
        let lon = Coordinate::parse(lon)?;
        if lat.axis() != Axis::Latitude || lon.axis() != Axis::Longitude {
            return Err(GpcpError::Format(format!(
                "格子点の緯度にはN/S、経度にはE/Wを指定してください。`{text}`"
            )));
        }

        Ok(Self { lat, lon })
    }

    /// 別の格子点までの緯度方向と経度方向の差の絶対値を返す。
    pub fn delta_to(&self, other: &GridPoint) -> (f64, f64) {
        (
            (self.lat.value() - other.lat.value()).abs(),
            (self.lon.value() - other.lon.value()).abs(),
        )
    }
}

impl fmt::Display for GridPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.lat, self.lon)
    }
}
