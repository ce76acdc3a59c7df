//! Party & ownership registry.
//!
//! The marketplace only needs to know who owns a podcast and who owns a
//! brand. Production deployments point [`OwnershipRegistry`] at the catalog
//! service; [`InMemoryRegistry`] serves development and tests.

use crate::models::{BrandProfile, CatalogEntry};
use chrono::Utc;
use dashmap::DashMap;
use podsponsor_core::{Advertiser, MarketError, MarketResult, NegotiationParticipant, Producer};
use tracing::info;
use uuid::Uuid;

pub trait OwnershipRegistry: Send + Sync {
    /// Owner of a catalog entry (podcast), if it exists.
    fn podcast_owner(&self, podcast_id: Uuid) -> Option<Uuid>;

    /// Owner of a brand profile, if it exists.
    fn brand_owner(&self, brand_id: Uuid) -> Option<Uuid>;

    fn accepts_ads(&self, podcast_id: Uuid) -> bool;
}

/// Thread-safe in-memory registry backed by DashMap.
pub struct InMemoryRegistry {
    podcasts: DashMap<Uuid, CatalogEntry>,
    brands: DashMap<Uuid, BrandProfile>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            podcasts: DashMap::new(),
            brands: DashMap::new(),
        }
    }

    pub fn register_podcast(
        &self,
        owner: &Producer,
        title: &str,
        accepting_ads: bool,
    ) -> MarketResult<CatalogEntry> {
        let title = title.trim();
        if title.is_empty() {
            return Err(MarketError::validation("podcast title is required"));
        }
        let entry = CatalogEntry {
            id: Uuid::new_v4(),
            owner_id: owner.user_id(),
            title: title.to_string(),
            accepting_ads,
            created_at: Utc::now(),
        };
        info!(podcast_id = %entry.id, owner = %entry.owner_id, "Podcast registered");
        self.podcasts.insert(entry.id, entry.clone());
        Ok(entry)
    }

    pub fn register_brand(&self, owner: &Advertiser, name: &str) -> MarketResult<BrandProfile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MarketError::validation("brand name is required"));
        }
        let brand = BrandProfile {
            id: Uuid::new_v4(),
            owner_id: owner.user_id(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        info!(brand_id = %brand.id, owner = %brand.owner_id, "Brand registered");
        self.brands.insert(brand.id, brand.clone());
        Ok(brand)
    }

    pub fn get_podcast(&self, id: Uuid) -> Option<CatalogEntry> {
        self.podcasts.get(&id).map(|r| r.value().clone())
    }

    pub fn get_brand(&self, id: Uuid) -> Option<BrandProfile> {
        self.brands.get(&id).map(|r| r.value().clone())
    }
}

impl OwnershipRegistry for InMemoryRegistry {
    fn podcast_owner(&self, podcast_id: Uuid) -> Option<Uuid> {
        self.podcasts.get(&podcast_id).map(|r| r.owner_id)
    }

    fn brand_owner(&self, brand_id: Uuid) -> Option<Uuid> {
        self.brands.get(&brand_id).map(|r| r.owner_id)
    }

    fn accepts_ads(&self, podcast_id: Uuid) -> bool {
        self.podcasts
            .get(&podcast_id)
            .map(|r| r.accepting_ads)
            .unwrap_or(false)
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_resolve_owners() {
        let registry = InMemoryRegistry::new();
        let host = Producer(Uuid::new_v4());
        let marketer = Advertiser(Uuid::new_v4());

        let podcast = registry.register_podcast(&host, "Deep Dives", true).unwrap();
        let brand = registry.register_brand(&marketer, "Acme Coffee").unwrap();

        assert_eq!(registry.podcast_owner(podcast.id), Some(host.0));
        assert_eq!(registry.brand_owner(brand.id), Some(marketer.0));
        assert!(registry.accepts_ads(podcast.id));
        assert_eq!(registry.podcast_owner(Uuid::new_v4()), None);
        assert!(!registry.accepts_ads(Uuid::new_v4()));
    }

    #[test]
    fn test_blank_names_rejected() {
        let registry = InMemoryRegistry::new();
        assert!(registry
            .register_podcast(&Producer(Uuid::new_v4()), "   ", true)
            .is_err());
        assert!(registry
            .register_brand(&Advertiser(Uuid::new_v4()), "")
            .is_err());
    }
}
