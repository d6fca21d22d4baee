//! Work-order PDF documents.
//!
//! [`compose`] maps a [`WorkOrder`] onto a fixed sequence of layout blocks and
//! [`render_pdf`] draws them onto A4 pages. [`Renderer`] ties both together
//! with the configured fonts.

mod layout;
mod pdf;

use std::path::PathBuf;

pub use layout::{compose, Block, Field, Layout, PageHeader, ServiceRow};
pub use pdf::render_pdf;

use crate::config::DocumentConfig;
use crate::error::Result;
use crate::logo::Logo;
use crate::order::WorkOrder;

/// Fonts used to draw text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FontSource {
    /// The standard Helvetica pair every PDF reader provides.
    #[default]
    Builtin,
    /// TrueType files embedded into each document.
    Files {
        /// Regular weight.
        regular: PathBuf,
        /// Bold weight.
        bold: PathBuf,
    },
}

impl FontSource {
    /// Select fonts from configuration.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        match &config.font_path {
            None => Self::Builtin,
            Some(regular) => Self::Files {
                regular: regular.clone(),
                bold: config
                    .bold_font_path
                    .clone()
                    .unwrap_or_else(|| regular.clone()),
            },
        }
    }
}

/// Turns work orders into PDF bytes.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    fonts: FontSource,
}

impl Renderer {
    /// Create a renderer with the given fonts.
    #[must_use]
    pub fn new(fonts: FontSource) -> Self {
        Self { fonts }
    }

    /// Create a renderer from configuration.
    #[must_use]
    pub fn from_config(config: &DocumentConfig) -> Self {
        Self::new(FontSource::from_config(config))
    }

    /// Get the configured fonts.
    #[must_use]
    pub fn fonts(&self) -> &FontSource {
        &self.fonts
    }

    /// Render an order, with an optional logo in the page header.
    ///
    /// # Errors
    ///
    /// Returns an error if the fonts cannot be loaded or the document cannot
    /// be serialized.
    pub fn render(&self, order: &WorkOrder, logo: Option<&Logo>) -> Result<Vec<u8>> {
        render_pdf(&compose(order), logo, &self.fonts)
    }
}
