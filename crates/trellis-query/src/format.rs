//! Display text for cognostic values.

use chrono::format::{Item, StrftimeItems};
use std::borrow::Cow;

use trellis_model::{CogValue, MetaDescriptor, MetaKind};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render `value` the way the column described by `meta` should show it.
///
/// Nulls render as an empty string. Values that do not fit the column type
/// fall back to their plain text.
pub fn format_value(meta: &MetaDescriptor, value: &CogValue) -> String {
    if value.is_null() {
        return String::new();
    }
    match &meta.kind {
        MetaKind::Number { digits, locale, .. } => match value.as_f64() {
            Some(number) => format_number(number, *digits, *locale),
            None => value.to_plain_string().into_owned(),
        },
        MetaKind::Currency {
            code,
            digits,
            locale,
        } => match value.as_f64() {
            Some(number) => {
                let amount = format_number(number.abs(), Some(digits.unwrap_or(2)), *locale);
                let sign = if number < 0.0 { "-" } else { "" };
                match currency_symbol(code) {
                    Some(symbol) => format!("{sign}{symbol}{amount}"),
                    None => format!("{sign}{amount} {code}"),
                }
            }
            None => value.to_plain_string().into_owned(),
        },
        MetaKind::Date { format } => match value.as_date() {
            Some(date) => {
                let items = strftime_items(format.as_deref(), DEFAULT_DATE_FORMAT);
                date.format_with_items(items.iter()).to_string()
            }
            None => value.to_plain_string().into_owned(),
        },
        MetaKind::Time { format, .. } => match value.as_time() {
            Some(time) => {
                let items = strftime_items(format.as_deref(), DEFAULT_TIME_FORMAT);
                time.format_with_items(items.iter()).to_string()
            }
            None => value.to_plain_string().into_owned(),
        },
        MetaKind::Factor { .. }
        | MetaKind::Href { .. }
        | MetaKind::Graph { .. }
        | MetaKind::String {}
        | MetaKind::Panel { .. } => value.to_plain_string().into_owned(),
    }
}

/// Fixed digits when given, otherwise the shortest exact form. `locale` adds
/// thousands separators.
pub fn format_number(number: f64, digits: Option<u32>, locale: bool) -> String {
    let text = match digits {
        Some(digits) => format!("{number:.prec$}", prec = digits as usize),
        None => number.to_string(),
    };
    if locale {
        group_thousands(&text).into_owned()
    } else {
        text
    }
}

fn group_thousands(text: &str) -> Cow<'_, str> {
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match unsigned.find('.') {
        Some(pos) => unsigned.split_at(pos),
        None => (unsigned, ""),
    };
    if int_part.len() <= 3 || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return Cow::Borrowed(text);
    }
    let mut grouped = String::with_capacity(text.len() + int_part.len() / 3);
    grouped.push_str(sign);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped.push_str(frac_part);
    Cow::Owned(grouped)
}

fn currency_symbol(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "USD" | "CAD" | "AUD" => Some("$"),
        "EUR" => Some("€"),
        "GBP" => Some("£"),
        "JPY" | "CNY" => Some("¥"),
        "INR" => Some("₹"),
        _ => None,
    }
}

/// Parsed strftime items, falling back to `default` when `format` is invalid.
fn strftime_items<'a>(format: Option<&'a str>, default: &'a str) -> Vec<Item<'a>> {
    if let Some(format) = format {
        let items: Vec<Item<'a>> = StrftimeItems::new(format).collect();
        if !items.iter().any(|item| matches!(item, Item::Error)) {
            return items;
        }
        tracing::debug!(format, "invalid date format, using default");
    }
    StrftimeItems::new(default).collect()
}
