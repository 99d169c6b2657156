//! Pure formatting and parsing helpers shared by every tab.

use chrono::{DateTime, Datelike, Local, NaiveDate};

pub const CURRENCY_SYMBOL: &str = "₽";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberInputOptions {
    pub allow_decimal: bool,
    pub max_decimals: usize,
}

impl NumberInputOptions {
    pub const AMOUNT: Self = Self {
        allow_decimal: true,
        max_decimals: 2,
    };

    pub const WHOLE: Self = Self {
        allow_decimal: false,
        max_decimals: 0,
    };
}

/// Reduces freeform input to digits plus at most one `.` decimal point.
///
/// Both `.` and `,` count as separators. The last one is the decimal point;
/// earlier ones are dropped as thousands separators.
pub fn sanitize_numeric_input(raw: &str, options: NumberInputOptions) -> String {
    let separator = if options.allow_decimal && options.max_decimals > 0 {
        raw.rfind(['.', ','])
    } else {
        None
    };

    let (integer_raw, fraction_raw) = match separator {
        Some(pos) => (&raw[..pos], Some(&raw[pos + 1..])),
        None => (raw, None),
    };

    let digits: String = integer_raw.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_start_matches('0');
    let integer = if !trimmed.is_empty() {
        trimmed
    } else if digits.is_empty() && fraction_raw.is_none() {
        ""
    } else {
        "0"
    };

    match fraction_raw {
        Some(fraction) => {
            let fraction: String = fraction
                .chars()
                .filter(char::is_ascii_digit)
                .take(options.max_decimals)
                .collect();
            format!("{integer}.{fraction}")
        }
        None => integer.to_string(),
    }
}

pub fn parse_numeric_input(raw: &str, options: NumberInputOptions) -> Option<f64> {
    let sanitized = sanitize_numeric_input(raw, options);
    if sanitized.is_empty() {
        return None;
    }
    sanitized.parse::<f64>().ok().filter(|value| value.is_finite())
}

/// Groups the integer part of sanitized input with spaces. Sanitizing the
/// result yields the input again.
pub fn format_numeric_display(sanitized: &str) -> String {
    let (integer, fraction) = match sanitized.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (sanitized, None),
    };
    let grouped = group_thousands(integer);
    match fraction {
        Some(fraction) => format!("{grouped}.{fraction}"),
        None => grouped,
    }
}

pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    let fixed = format!("{:.2}", value.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let sign = if value < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{sign}{}.{fraction}", group_thousands(integer))
}

pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let integer = format!("{:.0}", rounded.abs());
    format!("{sign}{} {CURRENCY_SYMBOL}", group_thousands(&integer))
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (len - index) % 3 == 0 {
            out.push(' ');
        }
        out.push(ch);
    }
    out
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn normalize_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

pub fn parse_month_key(value: &str) -> Option<(i32, u32)> {
    let (year, month) = value.trim().split_once('-')?;
    let year = year.parse::<i32>().ok()?;
    let month = month.parse::<u32>().ok()?;
    if year == 0 || !(1..=12).contains(&month) {
        return None;
    }
    Some((year, month))
}

pub fn format_month_year(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{year}-{month:02}"),
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn current_date_value() -> String {
    today().format("%Y-%m-%d").to_string()
}

pub fn current_month_value() -> String {
    month_key(today())
}

/// Calendar months from `start` to `end`, ignoring the day of month.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    (end.year() - start.year()) * 12 + (end.month() as i32 - start.month() as i32)
}
