use crate::api::collaborators::Directions;
use crate::error::ProviderError;
use crate::models::landing_models::{Coordinate, Route, TravelMode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub mode: TravelMode,
}

/// Holds the decorative route drawn between pickup and dropoff.
#[derive(Debug, Clone, Default)]
pub struct RoutePreview {
    endpoints: Option<(Coordinate, Coordinate)>,
    route: Option<Route>,
}

impl RoutePreview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self) -> Option<&Route> {
        self.route.as_ref()
    }

    /// Follows the current coordinate pair. Losing either coordinate discards
    /// the stored route; a new complete pair yields the request to issue.
    pub fn sync(&mut self, pair: Option<(Coordinate, Coordinate)>) -> Option<RouteRequest> {
        if pair == self.endpoints {
            return None;
        }
        self.endpoints = pair;
        match pair {
            None => {
                if self.route.take().is_some() {
                    tracing::debug!("Discarded route preview, an endpoint is unresolved");
                }
                None
            }
            Some((origin, destination)) => Some(RouteRequest {
                origin,
                destination,
                mode: TravelMode::Driving,
            }),
        }
    }

    /// Stores a successful result for the current pair. Failures keep whatever
    /// was there before.
    pub fn apply(&mut self, request: &RouteRequest, result: Result<Route, ProviderError>) -> bool {
        if self.endpoints != Some((request.origin, request.destination)) {
            tracing::debug!("Dropping route for endpoints that are no longer current");
            return false;
        }
        match result {
            Ok(route) => {
                self.route = Some(route);
                true
            }
            Err(e) => {
                tracing::warn!("Directions lookup failed, keeping previous preview: {}", e);
                false
            }
        }
    }
}

pub async fn fetch(directions: &dyn Directions, request: &RouteRequest) -> Result<Route, ProviderError> {
    directions
        .route(request.origin, request.destination, request.mode)
        .await
}
