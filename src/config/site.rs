//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // Directory
    pub public_dir: String,
    pub i18n_dir: String,

    // Date / Time format
    pub date_format: String,
    pub time_format: String,

    // Listing
    pub per_page: usize,
    /// Seconds a fetched page or post stays fresh
    pub revalidate: u64,
    /// Idle seconds before a listing session is dropped
    pub session_ttl: u64,
    /// Most listing sessions held at once
    pub max_sessions: usize,

    // Collaborators
    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: String::new(),

            public_dir: "public".to_string(),
            i18n_dir: "languages".to_string(),

            date_format: "DD MMM YYYY".to_string(),
            time_format: "HH:mm".to_string(),

            per_page: 1,
            revalidate: 60 * 60,
            session_ttl: 30 * 60,
            max_sessions: 10_000,

            cms: CmsConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let mut config: SiteConfig = serde_yaml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Pick up secrets that should not live in the config file
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.cms.access_token = Some(token);
            }
        }
    }

    /// Listing page size, never zero
    pub fn page_size(&self) -> usize {
        self.per_page.max(1)
    }
}

/// Which content source backs the site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CmsKind {
    Prismic,
    Memory,
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub kind: CmsKind,
    /// API root, e.g. https://my-repo.cdn.prismic.io/api/v2
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    /// YAML file with posts for the memory source
    pub fixtures: String,
    /// Request timeout in seconds
    pub timeout: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            kind: CmsKind::Prismic,
            endpoint: "https://spacetraveling.cdn.prismic.io/api/v2".to_string(),
            access_token: None,
            document_type: "posts".to_string(),
            fixtures: "content/posts.yml".to_string(),
            timeout: 10,
        }
    }
}

/// utterances comment widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub script: String,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            script: "https://utteranc.es/client.js".to_string(),
            repo: "jpsouza06/spacetraveling".to_string(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
        }
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    /// Cookie carrying the preview ref
    pub cookie: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cookie: "spacetraveling.preview".to_string(),
        }
    }
}
