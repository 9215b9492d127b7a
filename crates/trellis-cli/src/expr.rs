//! Parsing of `--filter` and `--sort` expressions.

use anyhow::{Context, Result, anyhow, bail};

use trellis_codec::{parse_date, parse_time};
use trellis_model::{
    FilterEntry, FilterSpec, MetaDescriptor, MetaType, SortDirection, SortKey, find_meta,
};

fn lookup<'a>(metas: &'a [MetaDescriptor], varname: &str) -> Result<&'a MetaDescriptor> {
    find_meta(metas, varname)
        .filter(|meta| !meta.is_panel())
        .ok_or_else(|| anyhow!("unknown variable '{varname}'"))
}

/// `var`, `var:asc` or `var:desc`.
pub fn parse_sort(expr: &str, metas: &[MetaDescriptor]) -> Result<SortKey> {
    let (varname, dir) = match expr.split_once(':') {
        Some((varname, dir)) => (
            varname.trim(),
            dir.trim().parse::<SortDirection>().map_err(|e| anyhow!(e))?,
        ),
        None => (expr.trim(), SortDirection::Asc),
    };
    lookup(metas, varname)?;
    Ok(SortKey::new(varname, dir))
}

/// `var=a,b` selects values, `var=lo..hi` is a range (numeric, date or time
/// depending on the column; either bound may be empty), `var~text` matches a
/// substring.
pub fn parse_filter(expr: &str, metas: &[MetaDescriptor]) -> Result<FilterEntry> {
    let Some(split) = expr.find(['=', '~']) else {
        bail!("filter '{expr}' needs '=' or '~'");
    };
    let varname = expr[..split].trim();
    let op = &expr[split..=split];
    let value = expr[split + 1..].trim();
    let meta = lookup(metas, varname)?;

    let spec = if op == "~" {
        FilterSpec::substring(value)
    } else if let Some((lo, hi)) = value.split_once("..") {
        match meta.meta_type() {
            MetaType::Date => FilterSpec::DateRange {
                start: bound(lo, parse_date, "date")?,
                end: bound(hi, parse_date, "date")?,
            },
            MetaType::Time => FilterSpec::TimeRange {
                start: bound(lo, parse_time, "time")?,
                end: bound(hi, parse_time, "time")?,
            },
            _ => FilterSpec::range(
                bound(lo, |text| text.parse::<f64>().ok(), "number")?,
                bound(hi, |text| text.parse::<f64>().ok(), "number")?,
            ),
        }
    } else {
        FilterSpec::select(
            value
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty()),
        )
    };
    Ok(FilterEntry {
        varname: varname.to_string(),
        spec,
    })
}

fn bound<T>(text: &str, parse: impl Fn(&str) -> Option<T>, what: &str) -> Result<Option<T>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    parse(text)
        .map(Some)
        .with_context(|| format!("'{text}' is not a valid {what}"))
}
