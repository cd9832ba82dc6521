//! Resolution of value set OIDs to existing registry concepts.

use async_trait::async_trait;
use atrius_i14y_client::I14yClient;
use tracing::{info, warn};

use crate::error::TransformResult;

/// Finds the registry id of a concept by its identifier (value set OID).
#[async_trait]
pub trait ConceptLookup: Send + Sync {
    async fn find_concept_id(&self, identifier: &str) -> TransformResult<Option<String>>;
}

#[async_trait]
impl ConceptLookup for I14yClient {
    async fn find_concept_id(&self, identifier: &str) -> TransformResult<Option<String>> {
        Ok(I14yClient::find_concept_id(self, identifier).await?)
    }
}

/// Lookup that never finds anything; every value set is treated as new.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLookup;

#[async_trait]
impl ConceptLookup for OfflineLookup {
    async fn find_concept_id(&self, _identifier: &str) -> TransformResult<Option<String>> {
        Ok(None)
    }
}

/// Look up `identifier`, treating failures as "not on the registry".
pub async fn resolve_concept_id(lookup: &dyn ConceptLookup, identifier: &str) -> Option<String> {
    match lookup.find_concept_id(identifier).await {
        Ok(Some(id)) => {
            info!("Found concept ID: {} for OID: {}", id, identifier);
            Some(id)
        }
        Ok(None) => {
            info!("Concept {} not found on I14Y, a new concept will be created", identifier);
            None
        }
        Err(err) => {
            warn!(
                "Lookup of concept {} failed, assuming a new concept: {}",
                identifier, err
            );
            None
        }
    }
}
