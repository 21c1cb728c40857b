use crate::models::CarDoc;
use serde::Serialize;

/// Query string for GET /car. Kept as raw text so that junk values fall back
/// to page 1 instead of being rejected.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<String>,
}

impl PageQuery {
    /// First `page` value wins when the parameter is repeated.
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        let page = pairs
            .into_iter()
            .find_map(|(key, value)| (key == "page").then_some(value));
        Self { page }
    }
}

/// Response for GET /car
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingResponse {
    pub data: Vec<CarDoc>,
    pub page: u64,
    pub total_pages: u64,
}
