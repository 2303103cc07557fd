//! This modules defines the common functionality for paging data.

use serde::Deserialize;

/// The config for pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationConfig {
    /// The page number to default to when not specified in a request.
    pub default_page: u64,
    /// The number of entries per page when not specified in a request.
    pub default_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 1,
            default_page_size: 10,
        }
    }
}

/// The `page` and `limit` query parameters of a paged request.
///
/// Both are kept as strings so that unparsable values fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
    limit: Option<String>,
}

impl PageQuery {
    /// Resolve the requested page, using `config` for missing, unparsable or
    /// zero values.
    pub fn resolve(&self, config: &PaginationConfig) -> Page {
        Page {
            number: parse_positive(self.page.as_deref()).unwrap_or(config.default_page),
            size: parse_positive(self.limit.as_deref()).unwrap_or(config.default_page_size),
        }
    }
}

/// Parse the leading integer of `value`, ignoring anything after its digits.
///
/// `"5abc"` and `"5.9"` both give 5. Returns `None` for values without
/// leading digits and for values below one.
fn parse_positive(value: Option<&str>) -> Option<u64> {
    let value = value?.trim_start();
    let (negative, value) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };

    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let number = value[..digits_end].parse::<u64>().ok()?;

    if negative || number < 1 {
        return None;
    }

    Some(number)
}

/// A one-based page number and a page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// The one-based page number.
    pub number: u64,
    /// The maximum number of entries on the page.
    pub size: u64,
}

impl Page {
    /// The number of entries before this page, for an SQL `OFFSET`.
    pub fn offset(&self) -> i64 {
        to_sql_int(self.number.saturating_sub(1).saturating_mul(self.size))
    }

    /// The page size, for an SQL `LIMIT`.
    pub fn limit(&self) -> i64 {
        to_sql_int(self.size)
    }

    /// The number of pages needed to show `total` entries.
    pub fn count(&self, total: u64) -> u64 {
        total.div_ceil(self.size)
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
