use serde::Deserialize;

use crate::services::listing::Page;

/// Raw `limit`/`offset` query values.
///
/// Kept as strings so that garbage falls back to the defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page size, default 10, capped at 100.
    #[param(example = "10")]
    pub limit: Option<String>,
    /// Number of items to skip, default 0.
    #[param(example = "0")]
    pub offset: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> Page {
        Page::parse(self.limit.as_deref(), self.offset.as_deref())
    }
}

/// Blank query values count as absent.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Lenient float parse for price filters; unparsable values are dropped.
pub fn parse_price(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
