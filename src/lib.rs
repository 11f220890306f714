//! spacetraveling: a server-rendered blog on top of a headless CMS
//!
//! Posts come from a [`source::ContentSource`] (Prismic in production), are
//! listed newest first with cursor-based "load more" pagination, and are
//! rendered with Tera templates embedded in the binary.

pub mod commands;
pub mod config;
pub mod content;
pub mod detail;
pub mod helpers;
pub mod i18n;
pub mod listing;
pub mod server;
pub mod source;
pub mod templates;

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A blog site rooted at a directory
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Static assets directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Open the site in `base_dir`, reading `_config.yml` when present
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            let mut config = config::SiteConfig::default();
            config.apply_env();
            config
        };

        let public_dir = base_dir.join(&config.public_dir);

        Ok(Self {
            config,
            base_dir,
            public_dir,
        })
    }

    /// The content source the configuration asks for
    pub fn content_source(&self) -> Result<Arc<dyn source::ContentSource>> {
        source::from_config(&self.config, &self.base_dir)
    }

    /// UI strings for the configured language, with site overrides applied
    pub fn i18n(&self) -> Result<i18n::I18n> {
        let mut i18n = i18n::I18n::new(&self.config.language);
        i18n.load_languages(self.base_dir.join(&self.config.i18n_dir))?;
        Ok(i18n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_without_config() {
        let dir = tempfile::tempdir().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.per_page, 1);
        assert_eq!(blog.public_dir, dir.path().join("public"));
    }

    #[test]
    fn test_open_with_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("_config.yml"),
            "title: Blog\npublic_dir: static\nlanguage: en\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Blog");
        assert_eq!(blog.public_dir, dir.path().join("static"));
        assert_eq!(blog.i18n().unwrap().get("load_more"), "Load more posts");
    }
}
