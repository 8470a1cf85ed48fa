use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Whitelisted sort keys for the public car list.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CarSortBy {
    CreatedAt,
    Price,
    Year,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CarQuery {
    #[serde(flatten)]
    pub pagination: Pagination,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    /// Case-insensitive brand substring match.
    pub brand: Option<String>,
    pub sort_by: Option<CarSortBy>,
    pub sort_order: Option<SortOrder>,
}
