use std::collections::HashSet;

use async_trait::async_trait;
use charter_core::flight::Location;
use charter_core::repository::LocationRepository;
use charter_core::CoreResult;

/// Airports offered in the booking form, seeded from the `locations`
/// configuration section.
pub struct ConfiguredLocations {
    locations: Vec<Location>,
}

impl ConfiguredLocations {
    pub fn new(mut locations: Vec<Location>) -> Self {
        let mut seen = HashSet::new();
        for location in &mut locations {
            location.code = location.code.trim().to_uppercase();
        }
        locations.retain(|l| seen.insert(l.code.clone()));
        locations.sort_by(|a, b| a.city.cmp(&b.city));
        Self { locations }
    }
}

#[async_trait]
impl LocationRepository for ConfiguredLocations {
    async fn list_locations(&self) -> CoreResult<Vec<Location>> {
        Ok(self.locations.clone())
    }
}
