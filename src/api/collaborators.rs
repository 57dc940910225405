use std::collections::BTreeMap;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::error::{ProviderError, StoreError};
use crate::models::landing_models::{Coordinate, Route, TravelMode};

/// Flat key/value row persisted per survey submission.
pub type SurveyRecord = BTreeMap<String, String>;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Directions: Send + Sync {
    async fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TravelMode,
    ) -> Result<Route, ProviderError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert(&self, table: &str, record: &SurveyRecord) -> Result<(), StoreError>;
}
