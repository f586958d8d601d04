//! 时间工具函数 - 报表时区
//!
//! 提交时间统一记录为固定 UTC+8，与客户端所在时区无关，
//! 保证跨桌台、跨变体的报表在时间上可对齐比较。
//! repository 层的 created_at/deactivated_at 只使用 `i64` Unix millis。

use chrono::{DateTime, FixedOffset, Utc};

/// 报表时区偏移：固定 +08:00 (无夏令时)
const REPORTING_OFFSET_SECS: i32 = 8 * 3600;

/// 报表时区
pub fn reporting_offset() -> FixedOffset {
    // +08:00 在 FixedOffset 的合法范围内
    FixedOffset::east_opt(REPORTING_OFFSET_SECS).unwrap_or(FixedOffset::east_opt(0).unwrap())
}

/// 当前时间 (报表时区)
pub fn reporting_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&reporting_offset())
}

/// 当前 Unix 时间戳 (毫秒)
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reporting_time_carries_fixed_offset() {
        let now = reporting_now();
        assert_eq!(now.offset().local_minus_utc(), 8 * 3600);
        // RFC3339 输出必须带 +08:00 后缀
        assert!(now.to_rfc3339().ends_with("+08:00"));
    }

    #[test]
    fn reporting_now_matches_utc_instant() {
        let utc = Utc::now().timestamp();
        let reporting = reporting_now().timestamp();
        // 同一时刻，仅时区表示不同
        assert!((utc - reporting).abs() <= 1);
    }
}
