use crate::api::collaborators::Geocoder;
use crate::models::landing_models::{Coordinate, Endpoint, MapMarker};

const ZOOM_RESOLVED: u8 = 13;
const ZOOM_DEFAULT: u8 = 11;

#[derive(Debug, Clone, Default)]
struct AddressField {
    text: String,
    coordinate: Option<Coordinate>,
    revision: u64,
}

/// A geocoding lookup issued for one revision of one endpoint's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeRequest {
    pub endpoint: Endpoint,
    pub revision: u64,
    pub address: String,
}

/// Pickup/dropoff text, their resolved coordinates, and the map center derived from them.
#[derive(Debug, Clone)]
pub struct AddressResolution {
    pickup: AddressField,
    dropoff: AddressField,
    default_center: Coordinate,
}

impl AddressResolution {
    pub fn new(default_center: Coordinate) -> Self {
        Self {
            pickup: AddressField::default(),
            dropoff: AddressField::default(),
            default_center,
        }
    }

    fn field(&self, endpoint: Endpoint) -> &AddressField {
        match endpoint {
            Endpoint::Pickup => &self.pickup,
            Endpoint::Dropoff => &self.dropoff,
        }
    }

    fn field_mut(&mut self, endpoint: Endpoint) -> &mut AddressField {
        match endpoint {
            Endpoint::Pickup => &mut self.pickup,
            Endpoint::Dropoff => &mut self.dropoff,
        }
    }

    pub fn text(&self, endpoint: Endpoint) -> &str {
        &self.field(endpoint).text
    }

    pub fn coordinate(&self, endpoint: Endpoint) -> Option<Coordinate> {
        self.field(endpoint).coordinate
    }

    /// Records new text for an endpoint and drops its old coordinate.
    /// Returns the lookup to run, or `None` when there is nothing to geocode.
    pub fn set_text(&mut self, endpoint: Endpoint, text: &str) -> Option<GeocodeRequest> {
        let field = self.field_mut(endpoint);
        if field.text == text {
            return None;
        }
        field.text = text.to_string();
        field.revision += 1;
        field.coordinate = None;

        if text.trim().is_empty() {
            return None;
        }
        Some(GeocodeRequest {
            endpoint,
            revision: field.revision,
            address: text.to_string(),
        })
    }

    /// Stores a lookup result unless the text changed since it was issued.
    pub fn apply(&mut self, request: &GeocodeRequest, coordinate: Option<Coordinate>) -> bool {
        let field = self.field_mut(request.endpoint);
        if field.revision != request.revision {
            tracing::debug!(
                "Dropping stale geocode for {:?} (revision {} < {})",
                request.endpoint,
                request.revision,
                field.revision
            );
            return false;
        }
        field.coordinate = coordinate;
        true
    }

    /// Pickup wins, then dropoff, then the fixed default.
    pub fn center(&self) -> Coordinate {
        self.pickup
            .coordinate
            .or(self.dropoff.coordinate)
            .unwrap_or(self.default_center)
    }

    pub fn zoom(&self) -> u8 {
        if self.pickup.coordinate.is_some() || self.dropoff.coordinate.is_some() {
            ZOOM_RESOLVED
        } else {
            ZOOM_DEFAULT
        }
    }

    pub fn resolved_pair(&self) -> Option<(Coordinate, Coordinate)> {
        Some((self.pickup.coordinate?, self.dropoff.coordinate?))
    }

    pub fn markers(&self) -> Vec<MapMarker> {
        let mut markers = Vec::new();
        if let Some(position) = self.pickup.coordinate {
            markers.push(MapMarker { label: "A", position });
        }
        if let Some(position) = self.dropoff.coordinate {
            markers.push(MapMarker { label: "B", position });
        }
        markers
    }

    pub fn can_book(&self) -> bool {
        !self.pickup.text.trim().is_empty() && !self.dropoff.text.trim().is_empty()
    }
}

/// Free text to coordinate. Provider failures are logged and yield `None`.
pub async fn resolve(geocoder: &dyn Geocoder, address: &str) -> Option<Coordinate> {
    if address.trim().is_empty() {
        return None;
    }
    match geocoder.geocode(address).await {
        Ok(coordinate) => Some(coordinate),
        Err(e) => {
            tracing::warn!("Geocoding '{}' failed, leaving it unresolved: {}", address, e);
            None
        }
    }
}
