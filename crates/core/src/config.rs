//! Project configuration.
//!
//! A deck project keeps its stylesheet sources, compiled CSS, images, fonts,
//! and scripts in fixed directories; rendered slides land in an output
//! directory. This is declarative data read from `step-reveal.toml`; every
//! key is optional.
//!
//! ```toml
//! http_path = "/"
//! relative_assets = true
//!
//! [assets]
//! css_dir = "oddbird/css"
//! images_dir = "oddbird/images"
//!
//! [slides]
//! output_dir = "output"
//!
//! [watch]
//! pattern = "*.html"
//! interval_ms = 500
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up by [`ProjectConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "step-reveal.toml";

/// Top-level project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// URL prefix the project is served under.
    pub http_path: String,

    /// Emit asset URLs relative to the stylesheet instead of rooted at
    /// `http_path`.
    pub relative_assets: bool,

    /// Whether compiled CSS carries source line comments.
    pub line_comments: bool,

    pub preferred_syntax: Syntax,

    pub output_style: OutputStyle,

    pub assets: AssetLayout,

    pub slides: SlidesConfig,

    pub watch: WatchConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            http_path: "/".to_string(),
            relative_assets: true,
            line_comments: false,
            preferred_syntax: Syntax::default(),
            output_style: OutputStyle::default(),
            assets: AssetLayout::default(),
            slides: SlidesConfig::default(),
            watch: WatchConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Parse and validate configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        log::debug!("Loaded configuration from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Load `step-reveal.toml` from `dir`, or fall back to defaults when the
    /// file does not exist.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            log::debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    /// Check settings that cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<()> {
        if self.watch.regex.is_some() && self.watch.pattern.is_some() {
            return Err(Error::ConfigError(
                "watch.regex and watch.pattern are mutually exclusive".to_string(),
            ));
        }
        if self.watch.interval_ms == 0 {
            return Err(Error::ConfigError(
                "watch.interval_ms must be greater than zero".to_string(),
            ));
        }
        for kind in AssetKind::ALL {
            if self.assets.dir(kind).trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "assets.{} must not be empty",
                    kind.key()
                )));
            }
        }
        Ok(())
    }

    /// URL a stylesheet uses to reference `file` in the `kind` directory.
    ///
    /// With `relative_assets` the URL is relative to the CSS directory
    /// (`../images/logo.png`); otherwise it is rooted at `http_path`.
    pub fn asset_url(&self, kind: AssetKind, file: &str) -> String {
        let target = path_segments(self.assets.dir(kind));
        let file = file.trim_start_matches('/');

        if self.relative_assets {
            let from = path_segments(&self.assets.css_dir);
            let common = from
                .iter()
                .zip(target.iter())
                .take_while(|(a, b)| a == b)
                .count();

            let mut parts: Vec<&str> = vec![".."; from.len() - common];
            parts.extend(&target[common..]);
            parts.push(file);
            parts.join("/")
        } else {
            let mut url = self.http_path.trim_end_matches('/').to_string();
            for segment in target {
                url.push('/');
                url.push_str(segment);
            }
            url.push('/');
            url.push_str(file);
            url
        }
    }
}

/// Split a configured directory into its non-trivial segments.
fn path_segments(dir: &str) -> Vec<&str> {
    dir.split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Stylesheet source syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    #[default]
    Scss,
    Sass,
}

/// Formatting of compiled CSS.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    #[default]
    Expanded,
    Nested,
    Compact,
    Compressed,
}

/// Kinds of asset directory in a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Sass,
    Css,
    Images,
    Fonts,
    Javascripts,
}

impl AssetKind {
    /// Every kind, in display order.
    pub const ALL: [AssetKind; 5] = [
        AssetKind::Sass,
        AssetKind::Css,
        AssetKind::Images,
        AssetKind::Fonts,
        AssetKind::Javascripts,
    ];

    /// Configuration key of this kind's directory.
    pub fn key(self) -> &'static str {
        match self {
            AssetKind::Sass => "sass_dir",
            AssetKind::Css => "css_dir",
            AssetKind::Images => "images_dir",
            AssetKind::Fonts => "fonts_dir",
            AssetKind::Javascripts => "javascripts_dir",
        }
    }
}

/// Directories holding each kind of asset, relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetLayout {
    pub sass_dir: String,
    pub css_dir: String,
    pub images_dir: String,
    pub fonts_dir: String,
    pub javascripts_dir: String,
}

impl Default for AssetLayout {
    fn default() -> Self {
        Self {
            sass_dir: "oddbird/sass".to_string(),
            css_dir: "oddbird/css".to_string(),
            images_dir: "oddbird/images".to_string(),
            fonts_dir: "oddbird/fonts".to_string(),
            javascripts_dir: "oddbird/js".to_string(),
        }
    }
}

impl AssetLayout {
    /// Configured directory for `kind`.
    pub fn dir(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Sass => &self.sass_dir,
            AssetKind::Css => &self.css_dir,
            AssetKind::Images => &self.images_dir,
            AssetKind::Fonts => &self.fonts_dir,
            AssetKind::Javascripts => &self.javascripts_dir,
        }
    }

    /// Every asset directory joined onto `root`.
    pub fn resolve(&self, root: &Path) -> Vec<(AssetKind, PathBuf)> {
        AssetKind::ALL
            .into_iter()
            .map(|kind| (kind, root.join(self.dir(kind))))
            .collect()
    }
}

/// Where rendered slides live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SlidesConfig {
    pub output_dir: PathBuf,
}

impl Default for SlidesConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

/// Settings for re-annotating slides as they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchConfig {
    /// Paths to watch recursively. Empty means the slides output directory.
    pub paths: Vec<PathBuf>,

    /// Only files whose path matches this regular expression trigger.
    pub regex: Option<String>,

    /// Only files whose path matches this shell pattern trigger.
    pub pattern: Option<String>,

    /// Polling interval in milliseconds.
    pub interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            regex: None,
            pattern: None,
            interval_ms: 500,
        }
    }
}
