//! Command-line interface: argument definitions and the commands behind them.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use log::info;

use crate::archimate::{DiagramStyle, render_diagram_svg};
use crate::error::{Error, Result};
use crate::export::{self, OutputFormat};
use crate::page::{self, INDEX_PAGE};
use crate::theme::Theme;
use crate::viewer::{self, ViewOutcome};

/// Render the diagram views of ArchiMate model files
#[derive(Parser, Debug)]
#[command(name = "archiview")]
#[command(version)]
#[command(about = "Render ArchiMate diagram views to SVG, HTML, PNG or PDF", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Built-in theme name or path to a theme file (TOML or YAML)
    #[arg(short, long, global = true, value_name = "THEME")]
    pub theme: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the .archimate files in a directory
    List {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Render the HTML view page of one model file
    View {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// File name inside DIR
        #[arg(value_name = "FILE")]
        file: String,

        /// Output HTML file (stdout when omitted)
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Write an index page plus one view page per model file
    Site {
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,
    },

    /// Export a single diagram view
    Export {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output file path (extension determines format: .svg, .png or .pdf)
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Diagram view name or id (first view when omitted)
        #[arg(long, value_name = "VIEW")]
        view: Option<String>,

        /// Raster scale multiplier for PNG output
        #[arg(long, default_value_t = 1.0)]
        png_scale: f32,
    },

    /// Print the extracted model and diagram geometry as JSON
    Dump {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run one command, writing any textual output to `out`.
pub fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let theme = match &args.theme {
        Some(name_or_path) => Theme::load(name_or_path)?,
        None => Theme::default(),
    };

    match &args.command {
        Command::List { dir } => {
            for file in viewer::list_files(dir)? {
                writeln!(out, "{file}")?;
            }
        }
        Command::View { dir, file, output } => {
            let outcome = viewer::view_file(dir, file);
            let html = page::render_outcome(&outcome, &theme);
            match output {
                Some(path) => {
                    fs::write(path, html)?;
                    info!(path = path.display().to_string(); "Page written");
                }
                None => out.write_all(html.as_bytes())?,
            }
        }
        Command::Site { dir, output } => write_site(dir, output, &theme)?,
        Command::Export {
            input,
            output,
            view,
            png_scale,
        } => export_diagram(input, output, view.as_deref(), *png_scale, &theme)?,
        Command::Dump { input } => {
            let view = viewer::load_view(input)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&view)?)?;
        }
        Command::Completions { shell } => {
            clap_complete::generate(*shell, &mut Args::command(), "archiview", out);
        }
    }

    Ok(())
}

fn write_site(dir: &Path, output: &Path, theme: &Theme) -> Result<()> {
    fs::create_dir_all(output)?;

    let files = viewer::list_files(dir)?;
    fs::write(output.join(INDEX_PAGE), page::render_index(&files, theme))?;

    let mut failed = 0;
    for file in &files {
        let outcome = viewer::view_file(dir, file);
        if !matches!(outcome, ViewOutcome::Rendered(_)) {
            failed += 1;
        }
        fs::write(
            output.join(page::page_filename(file)),
            page::render_outcome(&outcome, theme),
        )?;
    }

    info!(
        output = output.display().to_string(),
        pages = files.len(),
        failed;
        "Site written"
    );
    Ok(())
}

fn export_diagram(
    input: &Path,
    output: &Path,
    view_name: Option<&str>,
    png_scale: f32,
    theme: &Theme,
) -> Result<()> {
    let format = OutputFormat::from_path(output)?;
    let view = viewer::load_view(input)?;

    let diagram = match view_name {
        Some(name) => view
            .diagram(name)
            .ok_or_else(|| Error::DiagramNotFound(name.to_string()))?,
        None => view
            .diagrams
            .first()
            .ok_or_else(|| Error::NoDiagrams(view.filename.clone()))?,
    };

    let svg = render_diagram_svg(diagram, &view.names, &DiagramStyle::from_theme(theme));
    fs::write(output, export::encode(&svg, format, png_scale)?)?;

    info!(
        view = diagram.name.as_str(),
        output = output.display().to_string();
        "Diagram exported"
    );
    Ok(())
}
