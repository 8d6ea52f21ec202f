use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::modules::backend::Service;

/// Query params for listing services
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListServicesQuery {
    /// Only services in this category (case-insensitive)
    pub category: Option<String>,
    /// Match against title and description
    pub search: Option<String>,
    /// Group services by category instead of returning a flat list
    #[serde(default)]
    pub grouped: bool,
}

impl ListServicesQuery {
    pub fn matches(&self, service: &Service) -> bool {
        let category_ok = self.category.as_deref().is_none_or(|wanted| {
            service
                .category
                .as_deref()
                .is_some_and(|c| c.eq_ignore_ascii_case(wanted))
        });

        let search_ok = self.search.as_deref().map(str::trim).is_none_or(|needle| {
            let needle = needle.to_lowercase();
            service.title.to_lowercase().contains(&needle)
                || service
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        });

        service.is_active && category_ok && search_ok
    }
}

/// Flat or grouped service listing
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ServiceListingDto {
    Flat(Vec<Service>),
    Grouped(Vec<ServiceGroupDto>),
}

/// Services sharing a category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceGroupDto {
    pub category: String,
    pub services: Vec<Service>,
}

impl ServiceGroupDto {
    /// Group by category name; uncategorised services land under "Other"
    pub fn group(services: Vec<Service>) -> Vec<Self> {
        let mut groups: BTreeMap<String, Vec<Service>> = BTreeMap::new();
        for service in services {
            let category = service
                .category
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "Other".to_string());
            groups.entry(category).or_default().push(service);
        }

        groups
            .into_iter()
            .map(|(category, services)| Self { category, services })
            .collect()
    }
}
