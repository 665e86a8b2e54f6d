//! Administrative-region lookup (city / district / ward), read-only.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::form::model::{Region, RegionCode};
use crate::services::error::{self, ApiResult};

pub const DEFAULT_REGION_API_ROOT: &str = "https://provinces.open-api.vn/api";

/// One level of the hierarchy, with its parent where it has one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionQuery {
    Cities,
    Districts(RegionCode),
    Wards(RegionCode),
}

#[async_trait]
pub trait RegionApi: Send + Sync {
    async fn get_regions(&self, query: RegionQuery) -> ApiResult<Vec<Region>>;
}

#[derive(Deserialize)]
struct CityDoc {
    #[serde(default)]
    districts: Vec<Region>,
}

#[derive(Deserialize)]
struct DistrictDoc {
    #[serde(default)]
    wards: Vec<Region>,
}

#[derive(Debug, Clone)]
pub struct HttpRegionApi {
    client: Client,
    base_url: String,
}

impl HttpRegionApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, query: RegionQuery) -> String {
        match query {
            RegionQuery::Cities => format!("{}/?depth=1", self.base_url),
            RegionQuery::Districts(city) => format!("{}/p/{city}?depth=2", self.base_url),
            RegionQuery::Wards(district) => format!("{}/d/{district}?depth=2", self.base_url),
        }
    }
}

#[async_trait]
impl RegionApi for HttpRegionApi {
    async fn get_regions(&self, query: RegionQuery) -> ApiResult<Vec<Region>> {
        let res = error::check(self.client.get(self.url(query)).send().await?).await?;

        let regions = match query {
            RegionQuery::Cities => error::json::<Vec<Region>>(res).await?,
            RegionQuery::Districts(_) => error::json::<CityDoc>(res).await?.districts,
            RegionQuery::Wards(_) => error::json::<DistrictDoc>(res).await?.wards,
        };

        tracing::debug!(?query, count = regions.len(), "regions fetched");
        Ok(regions)
    }
}
