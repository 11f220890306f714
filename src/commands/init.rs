//! Initialize a new blog site

use anyhow::Result;
use std::fs;
use std::path::Path;

const STYLES: &str = include_str!("assets/styles.css");
const LOGO: &str = include_str!("assets/logo.svg");

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("content"))?;
    fs::create_dir_all(target_dir.join("languages"))?;
    fs::create_dir_all(target_dir.join("public/images"))?;

    let config_content = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: ''

# Directory
public_dir: public
i18n_dir: languages

# Date / Time format
date_format: DD MMM YYYY
time_format: HH:mm

# Listing
per_page: 1
revalidate: 3600
session_ttl: 1800
max_sessions: 10000

# Content source
## kind: prismic talks to the Prismic API, kind: memory reads the fixtures file.
## The access token can also be set with PRISMIC_ACCESS_TOKEN.
cms:
  kind: memory
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  document_type: posts
  fixtures: content/posts.yml
  timeout: 10

# Comments (utterances)
comments:
  enable: true
  script: https://utteranc.es/client.js
  repo: jpsouza06/spacetraveling
  issue_term: pathname
  theme: github-dark

# Preview
preview:
  cookie: spacetraveling.preview
"#;

    fs::write(target_dir.join("_config.yml"), config_content)?;

    let sample_posts = r#"posts:
  - id: YFzIiBAAACIAMi9X
    uid: como-utilizar-hooks
    first_publication_date: 2021-03-25T19:27:35+0000
    last_publication_date: 2021-03-25T19:27:35+0000
    title: Como utilizar Hooks
    subtitle: Pensando em sincronização em vez de ciclos de vida.
    author: Joseph Oliveira
    content:
      - heading: Proin et varius
        body:
          - type: paragraph
            text: Hooks são uma nova adição ao React. Eles permitem que você use o estado e outros recursos sem escrever uma classe.
          - type: paragraph
            text: Comece pelo useState e depois passe para o useEffect.
  - id: YFzHBxAAACMAMiSZ
    uid: criando-um-app-cra-do-zero
    first_publication_date: 2021-03-15T19:25:28+0000
    last_publication_date: 2021-03-18T10:00:00+0000
    title: Criando um app CRA do zero
    subtitle: Tudo sobre como criar a sua primeira aplicação utilizando Create React App.
    author: Danilo Vieira
    content:
      - heading: Primeiros passos
        body:
          - type: paragraph
            text: Crie o projeto, rode o servidor de desenvolvimento e abra o navegador.
  - id: YFzGTxAAACIAMh_a
    uid: o-universo-em-expansao
    first_publication_date: 2021-03-01T12:00:00+0000
    title: O universo em expansão
    subtitle: Por que as galáxias se afastam umas das outras.
    author: Marina Costa
    content:
      - heading: Redshift
        body:
          - type: paragraph
            text: A luz das galáxias distantes chega até nós deslocada para o vermelho.
"#;

    fs::write(target_dir.join("content/posts.yml"), sample_posts)?;

    fs::write(target_dir.join("public/styles.css"), STYLES)?;
    fs::write(target_dir.join("public/images/logo.svg"), LOGO)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CmsKind;
    use crate::Blog;
    use crate::source::MemorySource;

    #[test]
    fn test_init_site() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        assert!(dir.path().join("public/styles.css").exists());
        assert!(dir.path().join("public/images/logo.svg").exists());

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.cms.kind, CmsKind::Memory);

        let source = MemorySource::load(dir.path().join(&blog.config.cms.fixtures)).unwrap();
        let uids: Vec<_> = source.posts().iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(
            uids,
            ["como-utilizar-hooks", "criando-um-app-cra-do-zero", "o-universo-em-expansao"]
        );
        assert!(source.posts()[2].last_publication_date.is_none());
    }
}
