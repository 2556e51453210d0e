//! Data-source mappers: adapters from a source's raw payload to import
//! candidates.
//!
//! Each external source (open-data portal, OSM export, gallery scrape) ships
//! its own mapper. The registry is an explicit, injected mapping, never a
//! process-wide singleton, so tests and callers swap implementations freely.

use std::collections::HashMap;
use std::sync::Arc;

use plinth_core::candidate::ImportCandidate;
use plinth_core::error::CoreError;
use plinth_core::geo::LatLon;

/// Adapter from one source's raw payload to import candidates.
pub trait DataSourceMapper: Send + Sync {
    /// The registry key and the `source_name` stamped on mapped candidates.
    fn name(&self) -> &str;

    /// Map a raw payload into candidates, stamping each with `batch_id`.
    /// Rejects payloads that do not match the source's shape.
    fn map_data(
        &self,
        raw: &serde_json::Value,
        batch_id: &str,
    ) -> Result<Vec<ImportCandidate>, CoreError>;

    /// Derive the stable external id for one raw record, if the record
    /// carries one.
    fn generate_import_id(&self, raw: &serde_json::Value) -> Option<String>;

    /// Whether a coordinate pair is plausible for this source's coverage
    /// area. The default accepts anything geographically valid; sources with
    /// a known footprint narrow it.
    fn validate_bounds(&self, location: &LatLon) -> bool {
        location.is_valid()
    }
}

/// An injected name-to-mapper table.
#[derive(Default, Clone)]
pub struct MapperRegistry {
    mappers: HashMap<String, Arc<dyn DataSourceMapper>>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapper under its own name. Re-registering a name replaces
    /// the previous mapper.
    pub fn register(&mut self, mapper: Arc<dyn DataSourceMapper>) {
        self.mappers.insert(mapper.name().to_string(), mapper);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn DataSourceMapper>> {
        self.mappers.get(name).cloned()
    }

    /// Registered source names, sorted for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.mappers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
