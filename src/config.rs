use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use stellar_md::RenderOptions;

pub const CONFIG_FILE: &str = "stellar.json";

/// Top-level stellar.json schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StellarConfig {
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    #[serde(default = "default_site_title")]
    pub site_title: String,

    #[serde(default)]
    pub render: RenderConfig,

    /// Extra stylesheet URLs linked from every built page.
    #[serde(default)]
    pub stylesheets: Vec<String>,
}

impl Default for StellarConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            out_dir: default_out_dir(),
            site_title: default_site_title(),
            render: RenderConfig::default(),
            stylesheets: Vec::new(),
        }
    }
}

fn default_content_dir() -> String {
    "posts".to_string()
}
fn default_out_dir() -> String {
    "dist".to_string()
}
fn default_site_title() -> String {
    "Stellar".to_string()
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    #[serde(default = "default_true")]
    pub tab_script: bool,

    #[serde(default = "default_true")]
    pub heading_ids: bool,

    #[serde(default = "default_code_class_prefix")]
    pub code_class_prefix: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            tab_script: true,
            heading_ids: true,
            code_class_prefix: default_code_class_prefix(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_code_class_prefix() -> String {
    "language-".to_string()
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            tab_script: self.tab_script,
            heading_ids: self.heading_ids,
            code_class_prefix: self.code_class_prefix.clone(),
        }
    }
}

/// Load config from a stellar.json file, or return defaults if missing.
pub fn load_config(root: &Path) -> Result<StellarConfig> {
    let config_path = root.join(CONFIG_FILE);

    if config_path.exists() {
        let raw = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        let config: StellarConfig = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        Ok(config)
    } else {
        Ok(StellarConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "contentDir": "content/posts",
            "outDir": "public",
            "siteTitle": "My Blog",
            "render": {
                "tabScript": false,
                "headingIds": true,
                "codeClassPrefix": "lang-"
            },
            "stylesheets": ["/theme.css"]
        }"#;

        let config: StellarConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.content_dir, "content/posts");
        assert_eq!(config.out_dir, "public");
        assert_eq!(config.site_title, "My Blog");
        assert!(!config.render.tab_script);
        assert_eq!(config.render.options().code_class_prefix, "lang-");
        assert_eq!(config.stylesheets, vec!["/theme.css"]);
    }

    #[test]
    fn test_partial_render_section() {
        let json = r#"{ "render": { "tabScript": false } }"#;
        let config: StellarConfig = serde_json::from_str(json).unwrap();
        assert!(!config.render.tab_script);
        assert!(config.render.heading_ids);
        assert_eq!(config.render.code_class_prefix, "language-");
    }

    #[test]
    fn test_defaults() {
        let config: StellarConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, StellarConfig::default());
        assert_eq!(config.content_dir, "posts");
        assert_eq!(config.out_dir, "dist");
        assert_eq!(config.render.options(), RenderOptions::default());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = std::env::temp_dir().join("stellar-config-test-missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        assert_eq!(load_config(&dir).unwrap(), StellarConfig::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_json_reports_path() {
        let dir = std::env::temp_dir().join("stellar-config-test-bad");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(CONFIG_FILE), "{ not json").unwrap();
        let err = load_config(&dir).unwrap_err();
        assert!(format!("{err}").contains("Failed to parse"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
