use time::{Date, Duration, Month};

use crate::config::Granularity;
use crate::error::{GpcpError, GpcpResult};
use crate::header::GridParameters;
use crate::readers::DataRecord;

/// 期間の番号から日付を求める暦
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodCalendar {
    /// 1期間が1か月で、日は固定
    Monthly { year: i32, start_month: u8, day: u8 },
    /// 1期間が1日
    Daily { start: Date },
}

impl PeriodCalendar {
    /// ヘッダに記録されている年月日から暦を構築する。
    ///
    /// # 引数
    ///
    /// * `parameters` - 格子と記録の定義
    /// * `granularity` - 期間の単位
    pub fn from_header(parameters: &GridParameters, granularity: Granularity) -> GpcpResult<Self> {
        match granularity {
            Granularity::Monthly { day } => {
                let (start_month, _) = parameters.months.ok_or_else(|| {
                    GpcpError::Format("月別のファイルのヘッダに`months`がありません。".to_string())
                })?;
                Ok(Self::Monthly {
                    year: parameters.year,
                    start_month,
                    day,
                })
            }
            Granularity::Daily => {
                let month = parameters.month.ok_or_else(|| {
                    GpcpError::Format("日別のファイルのヘッダに`month`がありません。".to_string())
                })?;
                let (start_day, _) = parameters.days.ok_or_else(|| {
                    GpcpError::Format("日別のファイルのヘッダに`days`がありません。".to_string())
                })?;
                let start = calendar_date(parameters.year, month, start_day)?;
                Ok(Self::Daily { start })
            }
        }
    }

    /// `period`番目（0始まり）の期間の日付を返す。
    pub fn date_of(&self, period: usize) -> GpcpResult<Date> {
        match *self {
            Self::Monthly {
                year,
                start_month,
                day,
            } => {
                let months = start_month as i64 - 1 + period as i64;
                let year = year as i64 + months.div_euclid(12);
                let month = (months.rem_euclid(12) + 1) as u8;
                let year = i32::try_from(year).map_err(|_| {
                    GpcpError::Consistency(format!("{period}番目の期間の年が範囲外です。"))
                })?;
                calendar_date(year, month, day)
            }
            Self::Daily { start } => start
                .checked_add(Duration::days(period as i64))
                .ok_or_else(|| {
                    GpcpError::Consistency(format!("{period}番目の期間の日付が範囲外です。"))
                }),
        }
    }
}

fn calendar_date(year: i32, month: u8, day: u8) -> GpcpResult<Date> {
    let month_enum = Month::try_from(month).map_err(|e| {
        GpcpError::Format(format!("月({month})が不正です。{e}"))
    })?;

    Date::from_calendar_date(year, month_enum, day).map_err(|e| {
        GpcpError::Format(format!(
            "年月日({year}-{month}-{day})から日付を構築できませんでした。{e}"
        ))
    })
}

/// 日付、座標と観測値
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRow {
    /// 観測日
    pub date: Date,
    /// 緯度（度）
    pub latitude: f64,
    /// 経度（度）
    pub longitude: f64,
    /// 観測値
    pub value: f32,
}

/// 観測値を記録順に走査し、格子点と日付を対応付けて返すイテレーター
///
/// `rows_per_period`行ごとに期間が進み、格子点の位置は先頭に戻る。
pub struct Correlator<'a> {
    /// 記録順に並べた`(緯度, 経度)`
    coordinates: &'a [(f64, f64)],
    /// 観測値
    records: &'a [DataRecord],
    /// 1期間の行数
    rows_per_period: usize,
    /// 暦
    calendar: PeriodCalendar,

    /// 現在の行
    record_index: usize,
    /// 現在の行内の要素
    element_index: usize,
    /// 現在の格子点
    cursor: usize,
    /// 現在の期間の日付
    current_date: Option<Date>,
    /// エラーが発生した後は走査しない
    failed: bool,
}

impl<'a> Correlator<'a> {
    /// イテレーターを構築する。
    ///
    /// # 引数
    ///
    /// * `coordinates` - 記録順に並べた`(緯度, 経度)`
    /// * `records` - 観測値
    /// * `rows_per_period` - 1期間の行数
    /// * `calendar` - 期間の番号から日付を求める暦
    pub fn new(
        coordinates: &'a [(f64, f64)],
        records: &'a [DataRecord],
        rows_per_period: usize,
        calendar: PeriodCalendar,
    ) -> GpcpResult<Self> {
        if rows_per_period == 0 {
            return Err(GpcpError::Format(
                "1期間の行数は1以上でなければなりません。".to_string(),
            ));
        }

        Ok(Self {
            coordinates,
            records,
            rows_per_period,
            calendar,
            record_index: 0,
            element_index: 0,
            cursor: 0,
            current_date: None,
            failed: false,
        })
    }

    fn fail(&mut self, error: GpcpError) -> Option<GpcpResult<OutputRow>> {
        self.failed = true;
        Some(Err(error))
    }
}

impl<'a> Iterator for Correlator<'a> {
    type Item = GpcpResult<OutputRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let records = self.records;
        loop {
            let record = records.get(self.record_index)?;

            // 期間の最初の行では、日付を求めて格子点を先頭に戻す
            if self.element_index == 0 && self.record_index % self.rows_per_period == 0 {
                let period = self.record_index / self.rows_per_period;
                match self.calendar.date_of(period) {
                    Ok(date) => self.current_date = Some(date),
                    Err(e) => return self.fail(e),
                }
                self.cursor = 0;
            }

            let Some(&value) = record.values().get(self.element_index) else {
                self.record_index += 1;
                self.element_index = 0;
                continue;
            };
            let Some(&(latitude, longitude)) = self.coordinates.get(self.cursor) else {
                let e = GpcpError::Consistency(format!(
                    "{}行目の{}番目の観測値に対応する格子点がありません。格子点数は{}です。",
                    self.record_index,
                    self.element_index,
                    self.coordinates.len()
                ));
                return self.fail(e);
            };
            let Some(date) = self.current_date else {
                return self.fail(GpcpError::Unexpected(
                    "期間の日付が決定されていません。".to_string(),
                ));
            };

            self.cursor += 1;
            self.element_index += 1;

            return Some(Ok(OutputRow {
                date,
                latitude,
                longitude,
                value,
            }));
        }
    }
}
