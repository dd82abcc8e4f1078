//! 時間区間の切り出し。
//!
//! ゴールの評価と統計の集計では区間の扱いが異なる。
//!
//! - ゴール: 日付単位でゴール期間と重なるエントリーを対象とし、期間内に切り詰めた長さを数える。
//!   期間の終了日はその日の終わりまでを含む。
//! - 統計: 開始時刻が集計区間`[start, end)`に含まれるエントリーを対象とし、切り詰めは行わない。
//!   区間の終わりをはみ出したエントリーも全長を数えるため、統計の合計はゴールの進捗と一致しないことがある。

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::datetime::start_of_day_utc;

/// `[start, end)`の時間区間。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Span {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 区間の長さを秒で返す。
    ///
    /// 終了が開始以前の不正な区間は0秒とする。
    pub fn seconds(&self) -> f64 {
        let duration = self.end - self.start;
        if duration <= Duration::zero() {
            return 0.0;
        }

        duration.num_seconds() as f64 + f64::from(duration.subsec_nanos()) / 1e9
    }
}

/// `span`を`bound`と重なる部分に切り詰める。重ならない場合は`None`を返す。
pub fn clip(span: &Span, bound: &Span) -> Option<Span> {
    if span.end <= bound.start || span.start >= bound.end {
        return None;
    }

    let clipped = Span::new(span.start.max(bound.start), span.end.min(bound.end));
    if clipped.end < clipped.start {
        return None;
    }

    Some(clipped)
}

/// エントリーが日付単位でゴール期間`[window_start, window_end]`に掛かるかを判定する。
///
/// 次のいずれかを満たすときに対象とする。
///
/// - 終了日が期間内
/// - 開始日が期間内
/// - 期間を丸ごと覆う
pub fn overlaps_goal_window(span: &Span, window_start: NaiveDate, window_end: NaiveDate) -> bool {
    let start_date = span.start.date_naive();
    let end_date = span.end.date_naive();

    (end_date <= window_end && end_date >= window_start)
        || (start_date >= window_start && start_date <= window_end)
        || (start_date < window_start && end_date > window_end)
}

/// ゴール期間に合わせてエントリーを切り詰める。
///
/// 期間の終了日は当日を丸ごと含むため、上限は`window_end`の翌日00:00:00(UTC)となる。
pub fn clip_to_goal_window(
    span: &Span,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Option<Span> {
    if !overlaps_goal_window(span, window_start, window_end) {
        return None;
    }

    let bound = Span::new(
        start_of_day_utc(window_start),
        start_of_day_utc(window_end) + Duration::days(1),
    );
    clip(span, &bound)
}

/// 統計の対象かどうか。開始時刻が`[window.start, window.end)`に含まれるかだけを見る。
pub fn starts_within(span: &Span, window: &Span) -> bool {
    span.start >= window.start && span.start < window.end
}
