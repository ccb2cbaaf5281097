use std::ops::Index;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;

/// Timestamp layout used both in payloads (local) and at rest (UTC).
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Conversions between the local time used in requests/responses and the
/// UTC time stored in the database.
pub trait DateUtil {
    fn is_valid_local_datetime(&self, s: &str) -> bool;
    fn local_to_utc(&self, s: &str) -> Option<String>;
    fn utc_to_local(&self, s: &str) -> Option<String>;
    fn now_local(&self) -> String;
}

fn to_int<T: std::str::FromStr>(num_str: &str, date_str: &str) -> Result<T, String> {
    match num_str.parse::<T>() {
        Ok(x) => Ok(x),
        Err(_) => Err(format!("Error parsing {} from the date {}", num_str, date_str)),
    }
}

pub fn parse_date_time(buf: &str) -> Result<NaiveDateTime, String> {
    lazy_static! {
        static ref DATE_TIME_REGEX: Regex = Regex::new(
            r"^(\d{4})-(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})$"
        ).unwrap();
    }

    let Some(caps) = DATE_TIME_REGEX.captures(buf.trim()) else {
        return Err(format!("Unable to parse date time {}", buf));
    };

    let to_i32 = |num_str: &str| to_int::<i32>(num_str, buf);
    let to_u32 = |num_str: &str| to_int::<u32>(num_str, buf);

    let y: i32 = to_i32(caps.index(1))?;
    let m: u32 = to_u32(caps.index(2))?;
    let d: u32 = to_u32(caps.index(3))?;
    let h: u32 = to_u32(caps.index(4))?;
    let mn: u32 = to_u32(caps.index(5))?;
    let s: u32 = to_u32(caps.index(6))?;

    let date = NaiveDate::from_ymd_opt(y, m, d)
        .ok_or_else(|| format!("Invalid date in {}", buf))?;
    let time = NaiveTime::from_hms_opt(h, mn, s)
        .ok_or_else(|| format!("Invalid time in {}", buf))?;

    Ok(NaiveDateTime::new(date, time))
}

pub fn format_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format(DATE_TIME_FORMAT).to_string()
}

/// Parses offsets such as `+08:00`, `-03:30`, `Z` or `UTC`.
pub fn parse_utc_offset(buf: &str) -> Result<FixedOffset, String> {
    lazy_static! {
        static ref OFFSET_REGEX: Regex = Regex::new(r"^([+-])(\d{2}):?(\d{2})$").unwrap();
    }

    let buf = buf.trim();
    if buf.eq_ignore_ascii_case("z") || buf.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(|| "Invalid offset".to_string());
    }

    let Some(caps) = OFFSET_REGEX.captures(buf) else {
        return Err(format!("Unable to parse UTC offset {}", buf));
    };

    let h: i32 = to_int(caps.index(2), buf)?;
    let m: i32 = to_int(caps.index(3), buf)?;
    let secs = (h * 3600 + m * 60) * if &caps[1] == "-" { -1 } else { 1 };

    FixedOffset::east_opt(secs).ok_or_else(|| format!("UTC offset out of range: {}", buf))
}

/// Local time expressed as a fixed offset from UTC.
pub struct LocalTime {
    offset: FixedOffset,
    fixed_now: Option<NaiveDateTime>,
}

impl LocalTime {
    pub fn new(offset: FixedOffset) -> Self {
        LocalTime { offset, fixed_now: None }
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    pub fn from_offset_str(offset: &str) -> Result<Self, String> {
        Ok(Self::new(parse_utc_offset(offset)?))
    }

    /// Pins "now" to the given local time. Used to make writes reproducible.
    pub fn with_fixed_now(mut self, now_local: NaiveDateTime) -> Self {
        self.fixed_now = Some(now_local);
        self
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }
}

impl DateUtil for LocalTime {
    fn is_valid_local_datetime(&self, s: &str) -> bool {
        parse_date_time(s).is_ok()
    }

    fn local_to_utc(&self, s: &str) -> Option<String> {
        let local = parse_date_time(s).ok()?;
        let date_time = self.offset.from_local_datetime(&local).single()?;
        Some(format_date_time(&date_time.naive_utc()))
    }

    fn utc_to_local(&self, s: &str) -> Option<String> {
        let utc = parse_date_time(s).ok()?;
        let date_time = self.offset.from_utc_datetime(&utc);
        Some(format_date_time(&date_time.naive_local()))
    }

    fn now_local(&self) -> String {
        match self.fixed_now {
            Some(now) => format_date_time(&now),
            None => format_date_time(&Utc::now().with_timezone(&self.offset).naive_local()),
        }
    }
}

/// Inclusive bounds, to the second, of a whole year or a single month. Only
/// four digit years have bounds in the stored format.
pub fn period_bounds(year: i32, month: Option<u32>) -> Option<(String, String)> {
    if !(0..=9999).contains(&year) {
        return None;
    }
    let (first, last) = match month {
        Some(12) | None => (NaiveDate::from_ymd_opt(year, month.unwrap_or(1), 1)?, NaiveDate::from_ymd_opt(year, 12, 31)?),
        Some(m) => (NaiveDate::from_ymd_opt(year, m, 1)?, NaiveDate::from_ymd_opt(year, m + 1, 1)?.pred_opt()?),
    };

    Some((
        format_date_time(&first.and_hms_opt(0, 0, 0)?),
        format_date_time(&last.and_hms_opt(23, 59, 59)?),
    ))
}
