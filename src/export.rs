use std::path::Path;

use log::debug;
use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Pdf,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::Export("Output file has no extension".to_string()))?
            .to_ascii_lowercase();

        match ext.as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "png" => Ok(OutputFormat::Png),
            "pdf" => Ok(OutputFormat::Pdf),
            _ => Err(Error::Export(format!(
                "Unsupported output format: .{} (use .svg, .png or .pdf)",
                ext
            ))),
        }
    }
}

/// Encode an SVG document in the requested format.
pub fn encode(svg: &str, format: OutputFormat, png_scale: f32) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Svg => Ok(svg.as_bytes().to_vec()),
        OutputFormat::Png => svg_to_png(svg, png_scale),
        OutputFormat::Pdf => svg_to_pdf(svg),
    }
}

pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(Error::Export(format!("Invalid --png-scale value: {}", scale)));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();

        let local_fonts = Path::new("fonts");
        if local_fonts.is_dir() {
            fontdb.load_fonts_dir(local_fonts);
        }

        let fallbacks = FontFallbacks::pick(
            fontdb
                .faces()
                .flat_map(|face| face.families.iter().map(|(family, _)| family.as_str())),
        );
        if let Some(family) = &fallbacks.sans {
            fontdb.set_sans_serif_family(family);
            fontdb.set_serif_family(family);
        }
        if let Some(family) = &fallbacks.mono {
            fontdb.set_monospace_family(family);
        }
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("Failed to parse SVG: {}", e)))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;
    debug!(width, height, scale; "Rasterizing diagram");

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| Error::Export("Failed to create pixmap".to_string()))?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    pixmap
        .encode_png()
        .map_err(|e| Error::Export(format!("Failed to encode PNG: {}", e)))
}

pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    use svg2pdf::usvg::fontdb;

    let mut fontdb = fontdb::Database::new();
    fontdb.load_system_fonts();

    let local_fonts = Path::new("fonts");
    if local_fonts.is_dir() {
        fontdb.load_fonts_dir(local_fonts);
    }

    let fallbacks = FontFallbacks::pick(
        fontdb
            .faces()
            .flat_map(|face| face.families.iter().map(|(family, _)| family.as_str())),
    );
    if let Some(family) = &fallbacks.sans {
        fontdb.set_sans_serif_family(family);
        fontdb.set_serif_family(family);
    }
    if let Some(family) = &fallbacks.mono {
        fontdb.set_monospace_family(family);
    }

    let opts = svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..Default::default()
    };

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| Error::Export(format!("Failed to parse SVG: {}", e)))?;

    // Text is converted to paths so viewers without the font still show labels.
    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };

    svg2pdf::to_pdf(&tree, options, svg2pdf::PageOptions::default())
        .map_err(|e| Error::Export(format!("Failed to convert SVG to PDF: {}", e)))
}

#[derive(Debug, Default, PartialEq, Eq)]
struct FontFallbacks {
    sans: Option<String>,
    mono: Option<String>,
}

impl FontFallbacks {
    /// Prefer a family named like "sans" for text and like "mono"/"code" for
    /// monospace, falling back to the first family seen.
    fn pick<'a>(families: impl Iterator<Item = &'a str>) -> Self {
        let mut sans: Option<&str> = None;
        let mut mono: Option<&str> = None;
        let mut first: Option<&str> = None;

        for family in families {
            first.get_or_insert(family);
            let lower = family.to_ascii_lowercase();
            if sans.is_none() && lower.contains("sans") {
                sans = Some(family);
            }
            if mono.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono = Some(family);
            }
        }

        let sans = sans.or(first);
        Self {
            sans: sans.map(str::to_string),
            mono: mono.or(sans).map(str::to_string),
        }
    }
}
