pub mod price;

pub use price::normalize_price;

/// Cars per listing page.
pub const PAGE_SIZE: u64 = 20;

/// A 1-based page of the price-sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
}

impl PageRequest {
    /// Parses the `page` query value. A leading integer prefix is accepted
    /// ("3abc" is page 3); anything absent, non-numeric or below 1 is page 1.
    pub fn parse(raw: Option<&str>) -> Self {
        let page = raw
            .map(leading_integer)
            .filter(|&p| p >= 1)
            .and_then(|p| u64::try_from(p).ok())
            .unwrap_or(1);
        Self { page }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }

    pub fn limit(&self) -> u64 {
        PAGE_SIZE
    }

    pub fn total_pages(total_count: u64) -> u64 {
        total_count.div_ceil(PAGE_SIZE)
    }
}

// Returns 0 when there is no leading integer, which the caller treats as page 1.
fn leading_integer(raw: &str) -> i64 {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    // overflowing values saturate instead of wrapping back into range
    let value = digits[..end].parse::<i64>().unwrap_or(if end == 0 { 0 } else { i64::MAX });
    if negative { -value } else { value }
}
