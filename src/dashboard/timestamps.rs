//! # 时间戳格式化
//!
//! ## 设计思路
//!
//! 链接列表中每个带原始时间戳的单元格，显示本地化的短日期，悬停提示显示完整日期时间。
//! 构建本地化格式器开销较大，格式项与区域在 `TimestampFormatter` 中只构建一次，
//! 进程级默认实例通过 `Lazy` 缓存。
//!
//! ## 实现思路
//!
//! - 区域由 `sys-locale` 探测，映射到 `chrono::Locale`；无法识别时使用 `en_US`。
//! - 原始值优先按 RFC 3339 解析，其次按 Unix 秒/毫秒解析。
//! - 无法解析的值保持单元格原样，只记录 debug 日志。

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, Local, Locale, TimeZone, Utc};
use once_cell::sync::Lazy;

/// 进程级共享的格式器。
pub static DEFAULT_FORMATTER: Lazy<TimestampFormatter> = Lazy::new(TimestampFormatter::detect);

/// 毫秒时间戳的下限；更小的整数视为秒。
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Zone {
    Local,
    Fixed(FixedOffset),
}

/// 缓存了格式项的本地化格式器。
#[derive(Debug, Clone)]
pub struct TimestampFormatter {
    locale: Locale,
    zone: Zone,
    short_items: Vec<Item<'static>>,
    full_items: Vec<Item<'static>>,
}

impl TimestampFormatter {
    /// 使用系统区域与本地时区。
    pub fn detect() -> Self {
        let tag = sys_locale::get_locale();
        let locale = tag.as_deref().map(locale_from_tag).unwrap_or(Locale::en_US);
        log::debug!("🌐 时间格式区域：{:?} → {:?}", tag, locale);
        Self::build(locale, Zone::Local)
    }

    /// 指定区域与固定时区偏移。
    pub fn with_offset(locale: Locale, offset: FixedOffset) -> Self {
        Self::build(locale, Zone::Fixed(offset))
    }

    fn build(locale: Locale, zone: Zone) -> Self {
        let (short, full) = if month_first(locale) {
            ("%b %-d, %Y", "%b %-d, %Y, %-I:%M:%S %p")
        } else {
            ("%-d %b %Y", "%-d %b %Y, %H:%M:%S")
        };

        Self {
            locale,
            zone,
            short_items: StrftimeItems::new_with_locale(short, locale).collect(),
            full_items: StrftimeItems::new_with_locale(full, locale).collect(),
        }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// 返回 `(短日期, 完整日期时间)`；无法解析时返回 `None`。
    pub fn format(&self, raw: &str) -> Option<(String, String)> {
        let instant = parse_timestamp(raw)?;
        Some(match self.zone {
            Zone::Local => self.render(&instant.with_timezone(&Local)),
            Zone::Fixed(offset) => self.render(&instant.with_timezone(&offset)),
        })
    }

    fn render<Tz>(&self, at: &DateTime<Tz>) -> (String, String)
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let short = at
            .format_localized_with_items(self.short_items.iter(), self.locale)
            .to_string();
        let full = at
            .format_localized_with_items(self.full_items.iter(), self.locale)
            .to_string();
        (short, full)
    }
}

fn month_first(locale: Locale) -> bool {
    matches!(locale, Locale::en_US | Locale::POSIX)
}

/// 把 `en-US` / `fr_FR.UTF-8` 之类的区域标识映射到已知区域。
fn locale_from_tag(tag: &str) -> Locale {
    let normalized = tag
        .split(['.', '@'])
        .next()
        .unwrap_or_default()
        .replace('-', "_");
    let mut parts = normalized.split('_');
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();
    let region = parts.next().unwrap_or_default().to_ascii_uppercase();

    match (language.as_str(), region.as_str()) {
        ("en", "GB") => Locale::en_GB,
        ("en", "AU") => Locale::en_AU,
        ("en", "CA") => Locale::en_CA,
        ("en", _) => Locale::en_US,
        ("fr", "CA") => Locale::fr_CA,
        ("fr", _) => Locale::fr_FR,
        ("de", _) => Locale::de_DE,
        ("es", _) => Locale::es_ES,
        ("it", _) => Locale::it_IT,
        ("nl", _) => Locale::nl_NL,
        ("pt", "PT") => Locale::pt_PT,
        ("pt", _) => Locale::pt_BR,
        ("pl", _) => Locale::pl_PL,
        ("sv", _) => Locale::sv_SE,
        ("ru", _) => Locale::ru_RU,
        ("ja", _) => Locale::ja_JP,
        ("ko", _) => Locale::ko_KR,
        ("zh", "TW") => Locale::zh_TW,
        ("zh", _) => Locale::zh_CN,
        _ => Locale::en_US,
    }
}

/// 解析原始时间戳：RFC 3339，或 Unix 秒 / 毫秒。
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    let number: i64 = raw.parse().ok()?;
    if number.abs() >= MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(number)
    } else {
        DateTime::from_timestamp(number, 0)
    }
}

/// 页面上的一个时间戳单元格。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampCell {
    /// `data-timestamp` 的值。
    pub raw: Option<String>,
    /// 显示槽位；页面缺少该子元素时为 `None`。
    pub display: Option<TimestampDisplay>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimestampDisplay {
    pub text: String,
    pub title: String,
}

impl TimestampCell {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: Some(raw.into()),
            display: Some(TimestampDisplay::default()),
        }
    }
}

/// 格式化全部单元格，返回实际更新的数量。
pub fn format_timestamps(formatter: &TimestampFormatter, cells: &mut [TimestampCell]) -> usize {
    let mut updated = 0;
    for cell in cells.iter_mut() {
        let Some(raw) = cell.raw.as_deref() else {
            continue;
        };
        let Some(display) = cell.display.as_mut() else {
            continue;
        };
        match formatter.format(raw) {
            Some((short, full)) => {
                display.text = short;
                display.title = full;
                updated += 1;
            }
            None => log::debug!("🕒 无法解析时间戳：{:?}", raw),
        }
    }
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc_formatter(locale: Locale) -> TimestampFormatter {
        TimestampFormatter::with_offset(locale, FixedOffset::east_opt(0).expect("valid offset"))
    }

    #[test]
    fn formats_short_and_full_for_us_english() {
        let formatter = utc_formatter(Locale::en_US);
        let (short, full) = formatter
            .format("2024-03-05T14:07:09Z")
            .expect("should parse");

        assert_eq!(short, "Mar 5, 2024");
        assert_eq!(full, "Mar 5, 2024, 2:07:09 PM");
    }

    #[test]
    fn day_first_locales_use_24_hour_clock() {
        let formatter = utc_formatter(Locale::en_GB);
        let (short, full) = formatter
            .format("2024-03-05T14:07:09Z")
            .expect("should parse");

        assert_eq!(short, "5 Mar 2024");
        assert_eq!(full, "5 Mar 2024, 14:07:09");
    }

    #[test]
    fn applies_timezone_offset() {
        let formatter = TimestampFormatter::with_offset(
            Locale::en_US,
            FixedOffset::east_opt(9 * 3600).expect("valid offset"),
        );
        let (short, _) = formatter
            .format("2024-12-31T20:00:00Z")
            .expect("should parse");

        assert_eq!(short, "Jan 1, 2025");
    }

    #[test]
    fn parses_unix_seconds_and_millis() {
        let seconds = parse_timestamp("1700000000").expect("seconds");
        let millis = parse_timestamp("1700000000000").expect("millis");
        assert_eq!(seconds, millis);
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("  ").is_none());
    }

    #[test]
    fn maps_locale_tags() {
        assert_eq!(locale_from_tag("en-US"), Locale::en_US);
        assert_eq!(locale_from_tag("en_GB.UTF-8"), Locale::en_GB);
        assert_eq!(locale_from_tag("fr"), Locale::fr_FR);
        assert_eq!(locale_from_tag("zh-TW"), Locale::zh_TW);
        assert_eq!(locale_from_tag("tlh"), Locale::en_US);
    }

    #[test]
    fn unparsable_cells_are_left_untouched() {
        let formatter = utc_formatter(Locale::en_US);
        let mut cells = vec![
            TimestampCell::new("2024-01-02T03:04:05Z"),
            TimestampCell::new("not a date"),
            TimestampCell {
                raw: None,
                display: Some(TimestampDisplay::default()),
            },
            TimestampCell {
                raw: Some("2024-01-02T03:04:05Z".to_string()),
                display: None,
            },
        ];

        let updated = format_timestamps(&formatter, &mut cells);

        assert_eq!(updated, 1);
        assert_eq!(
            cells[0].display.as_ref().map(|d| d.text.as_str()),
            Some("Jan 2, 2024")
        );
        assert_eq!(cells[1].display, Some(TimestampDisplay::default()));
    }
}
