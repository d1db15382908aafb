//! `H:MM-H:MM` time ranges as half-open minute intervals.
//!
//! Parsing never fails the caller: anything malformed comes back as `None`,
//! and `overlaps` treats `None` as "no conflict".

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl TimeRange {
    pub fn new(start_minute: u32, end_minute: u32) -> Self {
        Self {
            start_minute,
            end_minute,
        }
    }

    /// Half-open overlap: touching ranges do not conflict.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start_minute.max(other.start_minute) < self.end_minute.min(other.end_minute)
    }
}

fn parse_clock(text: &str) -> Option<u32> {
    let (hour, minute) = text.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    // 換算成當天的分鐘數，溢位視為格式錯誤
    hour.checked_mul(60)?.checked_add(minute)
}

/// Parses `"09:30-11:00"` into minutes since midnight.
pub fn parse_range(text: &str) -> Option<TimeRange> {
    let mut parts = text.split('-');
    let start = parse_clock(parts.next()?)?;
    let end = parse_clock(parts.next()?)?;
    // 多一個 '-' 也算格式錯誤
    if parts.next().is_some() {
        return None;
    }
    Some(TimeRange::new(start, end))
}

pub fn overlaps(a: &str, b: &str) -> bool {
    match (parse_range(a), parse_range(b)) {
        (Some(a), Some(b)) => a.overlaps(&b),
        // 任何一邊解析失敗就當作不衝突
        _ => false,
    }
}
