//! Template styles and the registry that maps them to loaded templates.

use crate::error::{Error, Result};
use crate::pptx::frame::{build_frame, Palette};
use crate::pptx::Template;
use log::info;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// The template styles offered by the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateStyle {
    Light,
    Normal,
    Dark,
}

impl TemplateStyle {
    pub const ALL: [TemplateStyle; 3] = [
        TemplateStyle::Light,
        TemplateStyle::Normal,
        TemplateStyle::Dark,
    ];

    /// The form value and registry key.
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateStyle::Light => "light",
            TemplateStyle::Normal => "normal",
            TemplateStyle::Dark => "dark",
        }
    }

    /// File name of this style inside a template directory.
    pub fn file_name(&self) -> String {
        format!("{}.pptx", self.as_str())
    }

    /// Colors of the built-in frame for this style.
    pub fn palette(&self) -> Palette {
        match self {
            TemplateStyle::Light => Palette {
                name: "light",
                background: "FFFFFF",
                text: "000000",
            },
            TemplateStyle::Normal => Palette {
                name: "normal",
                background: "F2F2F2",
                text: "1F1F1F",
            },
            TemplateStyle::Dark => Palette {
                name: "dark",
                background: "1E1E1E",
                text: "FFFFFF",
            },
        }
    }
}

impl fmt::Display for TemplateStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TemplateStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| Error::InvalidTemplate(s.to_string()))
    }
}

/// Where a style's template comes from.
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// The generated frame for the style's palette.
    Builtin,
}

impl TemplateSource {
    fn load(self, style: TemplateStyle) -> Result<Template> {
        match self {
            TemplateSource::Path(path) => {
                info!("loading {} template from {}", style, path.display());
                Template::open(&path)
            }
            TemplateSource::Bytes(data) => {
                info!("loading {} template from memory ({} bytes)", style, data.len());
                Template::from_bytes(data)
            }
            TemplateSource::Builtin => {
                info!("using built-in {} frame", style);
                Template::from_bytes(build_frame(&style.palette())?)
            }
        }
    }
}

/// Loaded and validated templates, keyed by style.
///
/// Templates are read-only after loading and shared between requests.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<TemplateStyle, Arc<Template>>,
}

impl TemplateRegistry {
    /// Load and validate every source. Fails on the first template that
    /// cannot be read or lacks the title and content layouts.
    pub fn from_sources(
        sources: impl IntoIterator<Item = (TemplateStyle, TemplateSource)>,
    ) -> Result<Self> {
        let mut templates = BTreeMap::new();
        for (style, source) in sources {
            let template = source.load(style)?;
            template.validate()?;
            templates.insert(style, Arc::new(template));
        }
        Ok(Self { templates })
    }

    /// All styles backed by their built-in frames.
    pub fn builtin() -> Result<Self> {
        Self::from_sources(
            TemplateStyle::ALL
                .into_iter()
                .map(|style| (style, TemplateSource::Builtin)),
        )
    }

    /// Load `{style}.pptx` for every style from `dir`.
    ///
    /// A missing file is replaced by the built-in frame when
    /// `builtin_fallback` is set, and is an error otherwise.
    pub fn from_dir(dir: impl AsRef<Path>, builtin_fallback: bool) -> Result<Self> {
        let dir = dir.as_ref();
        let sources = TemplateStyle::ALL
            .into_iter()
            .map(|style| {
                let path = dir.join(style.file_name());
                if path.is_file() {
                    Ok((style, TemplateSource::Path(path)))
                } else if builtin_fallback {
                    Ok((style, TemplateSource::Builtin))
                } else {
                    Err(Error::MissingComponent(path.display().to_string()))
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_sources(sources)
    }

    pub fn get(&self, style: TemplateStyle) -> Option<Arc<Template>> {
        self.templates.get(&style).cloned()
    }

    /// Look up a template by its form value.
    pub fn resolve(&self, key: &str) -> Result<Arc<Template>> {
        let style: TemplateStyle = key.parse()?;
        self.get(style)
            .ok_or_else(|| Error::InvalidTemplate(key.to_string()))
    }

    /// Registered styles in form order.
    pub fn styles(&self) -> impl Iterator<Item = TemplateStyle> + '_ {
        self.templates.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Write the built-in frames to `dir` as `{style}.pptx`, creating the
/// directory if needed. Returns the written paths.
pub fn export_builtin(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    TemplateStyle::ALL
        .into_iter()
        .map(|style| {
            let path = dir.join(style.file_name());
            std::fs::write(&path, build_frame(&style.palette())?)?;
            info!("wrote {} frame to {}", style, path.display());
            Ok(path)
        })
        .collect()
}
