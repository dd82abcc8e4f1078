use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}


#[cfg(test)]
pub use mock_datetime::now;

/// RFC3339形式の日時をパースする。
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let datetime = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Failed to parse timestamp: {}", s))?
        .to_utc();

    Ok(datetime)
}

/// YYYY-MM-DD形式の日付をパースする。
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("Failed to parse date: {}", s))
}

/// UTCで指定された日付の00:00:00を返す。
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Localタイムゾーンで指定された日付の00:00:00をUTCで返す。
fn local_midnight(date: NaiveDate) -> Result<DateTime<Utc>> {
    let naive_datetime = date.and_time(chrono::NaiveTime::MIN);
    let datetime = Local
        .from_local_datetime(&naive_datetime)
        .earliest()
        .with_context(|| format!("Failed to convert {} to DateTime<Local>", naive_datetime))?;

    Ok(datetime.to_utc())
}

/// Localタイムゾーンで指定された日付の00:00:00から翌日の00:00:00までをUTCで返す。
///
/// 夏時間の切り替え日は24時間にならない。
pub fn local_day_bounds(date: NaiveDate) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next_date = date
        .checked_add_signed(Duration::days(1))
        .with_context(|| format!("Failed to get the day after {}", date))?;

    Ok((local_midnight(date)?, local_midnight(next_date)?))
}
