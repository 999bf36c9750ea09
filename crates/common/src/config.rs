use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::remote::CachePolicy;

/// Tunables of the metadata protocol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Extra attempts after a PUT comes back NotFound
    ///  (the document may be racing its own creation).
    /// Never applied to conflicts.
    #[serde(default = "default_put_retry_limit")]
    pub put_retry_limit: usize,
    /// Maximum age of cached GET results; unset disables the cache
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_max_age_secs: Option<u64>,
}

fn default_put_retry_limit() -> usize {
    1
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            put_retry_limit: default_put_retry_limit(),
            cache_max_age_secs: None,
        }
    }
}

impl MetadataConfig {
    pub fn cache_policy(&self) -> CachePolicy {
        match self.cache_max_age_secs {
            None | Some(0) => CachePolicy::Disabled,
            Some(secs) => CachePolicy::MaxAge(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_from_empty_table() {
        let config: MetadataConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, MetadataConfig::default());
        assert_eq!(config.put_retry_limit, 1);
        assert_eq!(config.cache_policy(), CachePolicy::Disabled);
    }

    #[test]
    fn test_cache_age_maps_to_policy() {
        let config = MetadataConfig {
            cache_max_age_secs: Some(30),
            ..Default::default()
        };
        assert_eq!(
            config.cache_policy(),
            CachePolicy::MaxAge(Duration::from_secs(30))
        );
    }
}
