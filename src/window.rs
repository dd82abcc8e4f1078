use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};

use crate::datetime::{self, parse_timestamp};
use crate::error::TrackerError;
use crate::interval::Span;

/// 集計区間を指定するためのオプション。
#[derive(Debug, Default, clap::Args)]
pub struct WindowArgs {
    #[clap(
        short = 's',
        long = "start",
        help = "Start of the window in RFC3339 format (default: epoch)",
        parse(try_from_str = parse_timestamp),
    )]
    pub start: Option<DateTime<Utc>>,

    #[clap(
        short = 'e',
        long = "end",
        help = "End of the window in RFC3339 format (default: now)",
        parse(try_from_str = parse_timestamp),
    )]
    pub end: Option<DateTime<Utc>>,
}

impl WindowArgs {
    /// オプションから`AggregationWindow`を作る。
    pub fn window(&self) -> Result<AggregationWindow, TrackerError> {
        AggregationWindow::from_bounds(self.start, self.end)
    }
}

/// 集計区間。リクエストごとに作られ、永続化はしない。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl AggregationWindow {
    /// 新しい`AggregationWindow`を返す。終了が開始より前の場合はエラーとする。
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TrackerError> {
        let window = Self { start, end };
        window.validate()?;

        Ok(window)
    }

    /// 検証を行わずに`AggregationWindow`を作る。
    #[cfg(test)]
    pub(crate) fn unchecked(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// 終了が開始より前でないことを確認する。
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.end < self.start {
            return Err(TrackerError::InvalidInput(format!(
                "window end {} is before start {}",
                self.end.to_rfc3339(),
                self.start.to_rfc3339()
            )));
        }

        Ok(())
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// 指定されなかった境界を補って`AggregationWindow`を返す。
    ///
    /// 開始の既定値はUNIXエポック、終了の既定値は現在時刻とする。
    pub fn from_bounds(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, TrackerError> {
        let start = start.unwrap_or_default();
        let end = end.unwrap_or_else(datetime::now);

        Self::new(start, end)
    }

    /// Localタイムゾーンでの1日分の`AggregationWindow`を返す。
    pub fn local_day(date: NaiveDate) -> Result<Self> {
        let (start, end) = datetime::local_day_bounds(date)?;

        Ok(Self::new(start, end)?)
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}
