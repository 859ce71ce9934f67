//! Ordered, per-platform provider lists.

use reelgrab_core::Platform;
use thiserror::Error;

use crate::catalogue;
use crate::descriptor::ProviderDescriptor;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown {platform} provider: {name}")]
    UnknownProvider { platform: Platform, name: String },

    #[error("Provider {name} listed twice for {platform}")]
    DuplicateProvider { platform: Platform, name: String },

    #[error("No providers configured for {0}")]
    Empty(Platform),
}

/// Immutable after construction. Iteration order is registry order.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderDescriptor>) -> Self {
        Self { providers }
    }

    /// The built-in catalogue in its default order.
    pub fn builtin() -> Self {
        Self::new(catalogue::builtin())
    }

    /// Built-in catalogue reordered (and filtered) by name per platform.
    /// `None` keeps the catalogue order for that platform.
    pub fn from_order(
        tiktok: Option<&[String]>,
        instagram: Option<&[String]>,
    ) -> Result<Self, RegistryError> {
        let catalogue = catalogue::builtin();
        let mut providers = Vec::with_capacity(catalogue.len());

        for (platform, order) in [(Platform::TikTok, tiktok), (Platform::Instagram, instagram)] {
            let available: Vec<&ProviderDescriptor> = catalogue
                .iter()
                .filter(|d| d.platform == platform)
                .collect();

            let Some(order) = order else {
                providers.extend(available.into_iter().cloned());
                continue;
            };

            if order.is_empty() {
                return Err(RegistryError::Empty(platform));
            }

            let mut seen: Vec<&str> = Vec::with_capacity(order.len());
            for name in order {
                if seen.contains(&name.as_str()) {
                    return Err(RegistryError::DuplicateProvider {
                        platform,
                        name: name.clone(),
                    });
                }
                let descriptor = available
                    .iter()
                    .find(|d| d.name == *name)
                    .ok_or_else(|| RegistryError::UnknownProvider {
                        platform,
                        name: name.clone(),
                    })?;
                providers.push((*descriptor).clone());
                seen.push(name.as_str());
            }
        }

        Ok(Self::new(providers))
    }

    /// Providers for `platform`, in registry order. Empty for `Unsupported`.
    pub fn providers_for(&self, platform: Platform) -> Vec<&ProviderDescriptor> {
        self.providers
            .iter()
            .filter(|d| d.platform == platform)
            .collect()
    }

    pub fn names_for(&self, platform: Platform) -> Vec<String> {
        self.providers_for(platform)
            .into_iter()
            .map(|d| d.name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
