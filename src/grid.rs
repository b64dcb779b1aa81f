use crate::coords::GridPoint;
use crate::error::{GpcpError, GpcpResult};

/// 経度の正規化方法
///
/// 書式の版によって方法が異なるため、どちらかに統一しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LongitudePolicy {
    /// 180度以上の経度から360度を引き、(-180, 180]の範囲にする。
    Wrap360,
    /// 経度に関わらず、常に180度を引く。
    Shift180,
}

impl LongitudePolicy {
    pub fn normalize(self, longitude: f64) -> f64 {
        match self {
            Self::Wrap360 if longitude >= 180.0 => longitude - 360.0,
            Self::Wrap360 => longitude,
            Self::Shift180 => longitude - 180.0,
        }
    }
}

/// 緯度経度格子
///
/// 格子点は北西端から記録されている。
/// 経度方向に西から東に格子点が並び、東端に達したとき、格子1つ分だけ南の西端に移動する。
#[derive(Debug, Clone)]
pub struct Grid {
    rows: Vec<Vec<GridPoint>>,
    spacing: f64,
}

impl Grid {
    /// 参照点から格子を構築する。
    ///
    /// 格子間隔は、`top_left`と`next`の緯度方向と経度方向の差のうち、大きい方とする。
    ///
    /// # 引数
    ///
    /// * `top_left` - 北西端の格子点
    /// * `next` - 北西端の次の格子点
    /// * `_bottom_right` - 南東端の格子点（現在は使用しない）
    /// * `columns` - 経度方向の格子数
    /// * `rows` - 緯度方向の格子数
    ///
    /// # 戻り値
    ///
    /// `rows * columns`個の格子点を持つ`Grid`
    pub fn build(
        top_left: &GridPoint,
        next: &GridPoint,
        _bottom_right: &GridPoint,
        columns: usize,
        rows: usize,
    ) -> GpcpResult<Self> {
        if columns == 0 || rows == 0 {
            return Err(GpcpError::Format(format!(
                "格子数は1以上でなければなりません。横{columns}、縦{rows}"
            )));
        }
        let total = rows.checked_mul(columns).ok_or_else(|| {
            GpcpError::Format(format!("格子点の数が大きすぎます。横{columns}、縦{rows}"))
        })?;
        let (d_lat, d_lon) = top_left.delta_to(next);
        let spacing = d_lat.max(d_lon);
        let start_lat = top_left.lat.value();
        let start_lon = top_left.lon.value();

        let mut grid_rows: Vec<Vec<GridPoint>> = allocate(rows, total)?;
        for i in 0..rows {
            let lat = start_lat - spacing * i as f64;
            let mut row = allocate(columns, total)?;
            row.extend((0..columns).map(|j| GridPoint::new(lat, start_lon + spacing * j as f64)));
            grid_rows.push(row);
        }

        Ok(Self {
            rows: grid_rows,
            spacing,
        })
    }

    /// 格子間隔（度）を返す。
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn rows(&self) -> &[Vec<GridPoint>] {
        &self.rows
    }

    /// 格子点の総数を返す。
    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 格子点を記録順に走査するイテレーターを返す。
    pub fn points(&self) -> impl Iterator<Item = &GridPoint> + '_ {
        self.rows.iter().flatten()
    }

    /// 記録順に並べた`(緯度, 経度)`のリストを返す。
    ///
    /// 緯度と経度は小数点以下2桁に丸め、経度は`policy`で正規化する。
    pub fn coordinate_list(&self, policy: LongitudePolicy) -> GpcpResult<Vec<(f64, f64)>> {
        let total = self.len();
        let mut list = allocate(total, total)?;
        list.extend(self.points().map(|p| {
            (
                round2(p.lat.value()),
                policy.normalize(round2(p.lon.value())),
            )
        }));

        Ok(list)
    }
}

/// `len`個の要素を格納できる`Vec`を確保する。
///
/// 格子数はヘッダから決まるため、確保できない場合はプロセスを中断せずに書式エラーとする。
fn allocate<T>(len: usize, total: usize) -> GpcpResult<Vec<T>> {
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|e| {
        GpcpError::Format(format!("{total}個の格子点を格納する領域を確保できません。{e}"))
    })?;

    Ok(v)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
