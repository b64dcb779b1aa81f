use crate::error::{GpcpError, GpcpResult};
use crate::grid::LongitudePolicy;
use crate::readers::TruncationPolicy;

/// 期間の単位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// 1期間が1か月
    Monthly {
        /// 出力する日付の日（固定値）
        day: u8,
    },
    /// 1期間が1日
    Daily,
}

/// ファイルの書式の版
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatVersion {
    /// 月別の旧書式（地図を出力し、経度から常に180度を引く）
    PsgLegacy,
    /// 月別の書式
    PsgMonthly,
    /// 1度格子の日別の書式
    #[default]
    OneDegreeDaily,
}

impl FormatVersion {
    /// コマンドラインで指定する番号から書式の版を決定する。
    pub fn from_code(code: u8) -> GpcpResult<Self> {
        match code {
            0 => Ok(Self::PsgLegacy),
            1 => Ok(Self::PsgMonthly),
            2 => Ok(Self::OneDegreeDaily),
            _ => Err(GpcpError::Format(format!(
                "サポートしていない書式の番号です。`{code}`"
            ))),
        }
    }

    pub fn granularity(self) -> Granularity {
        match self {
            Self::PsgLegacy => Granularity::Monthly { day: 15 },
            Self::PsgMonthly => Granularity::Monthly { day: 1 },
            Self::OneDegreeDaily => Granularity::Daily,
        }
    }

    pub fn longitude_policy(self) -> LongitudePolicy {
        match self {
            Self::PsgLegacy => LongitudePolicy::Shift180,
            Self::PsgMonthly | Self::OneDegreeDaily => LongitudePolicy::Wrap360,
        }
    }

    pub fn default_layout(self) -> OutputLayout {
        match self {
            Self::PsgLegacy => OutputLayout::WithMap,
            Self::PsgMonthly | Self::OneDegreeDaily => OutputLayout::Flat,
        }
    }

    /// 年ごとにファイルが分かれている場合は`true`、年月ごとの場合は`false`を返す。
    pub fn is_yearly_file(self) -> bool {
        !matches!(self.granularity(), Granularity::Daily)
    }
}

/// CSVの出力形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    /// 観測値の行のみ
    Flat,
    /// `MAP`と格子の行を出力した後に観測値の行
    WithMap,
}

/// 変換の設定
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    format: FormatVersion,
    truncation: TruncationPolicy,
    layout: Option<OutputLayout>,
    longitude_policy: Option<LongitudePolicy>,
    skip_missing: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self::new(FormatVersion::default())
    }
}

impl ConvertConfig {
    pub fn new(format: FormatVersion) -> Self {
        Self {
            format,
            truncation: TruncationPolicy::default(),
            layout: None,
            longitude_policy: None,
            skip_missing: false,
        }
    }

    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn with_layout(mut self, layout: OutputLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// 書式の版が定める経度の正規化方法を上書きする。
    pub fn with_longitude_policy(mut self, policy: LongitudePolicy) -> Self {
        self.longitude_policy = Some(policy);
        self
    }

    /// 欠測値を出力しない場合は`true`を指定する。
    pub fn with_skip_missing(mut self, skip: bool) -> Self {
        self.skip_missing = skip;
        self
    }

    pub fn format(&self) -> FormatVersion {
        self.format
    }

    pub fn truncation(&self) -> TruncationPolicy {
        self.truncation
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout.unwrap_or_else(|| self.format.default_layout())
    }

    pub fn longitude_policy(&self) -> LongitudePolicy {
        self.longitude_policy
            .unwrap_or_else(|| self.format.longitude_policy())
    }

    pub fn skip_missing(&self) -> bool {
        self.skip_missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_codes() {
        assert_eq!(FormatVersion::from_code(0).unwrap(), FormatVersion::PsgLegacy);
        assert_eq!(FormatVersion::from_code(2).unwrap(), FormatVersion::OneDegreeDaily);
        assert!(matches!(FormatVersion::from_code(3), Err(GpcpError::Format(_))));
    }

    #[test]
    fn defaults_follow_format() {
        let config = ConvertConfig::new(FormatVersion::PsgLegacy);
        assert_eq!(config.layout(), OutputLayout::WithMap);
        assert_eq!(config.longitude_policy(), LongitudePolicy::Shift180);

        let config = ConvertConfig::default();
        assert_eq!(config.format(), FormatVersion::OneDegreeDaily);
        assert_eq!(config.layout(), OutputLayout::Flat);
        assert_eq!(config.longitude_policy(), LongitudePolicy::Wrap360);
        assert_eq!(config.truncation(), TruncationPolicy::Drop);
        assert!(!config.skip_missing());
    }

    #[test]
    fn overrides_take_precedence() {
        let config = ConvertConfig::new(FormatVersion::PsgLegacy)
            .with_layout(OutputLayout::Flat)
            .with_longitude_policy(LongitudePolicy::Wrap360)
            .with_truncation(TruncationPolicy::Strict)
            .with_skip_missing(true);
        assert_eq!(config.layout(), OutputLayout::Flat);
        assert_eq!(config.longitude_policy(), LongitudePolicy::Wrap360);
        assert_eq!(config.truncation(), TruncationPolicy::Strict);
        assert!(config.skip_missing());
    }
}
