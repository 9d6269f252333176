//! # oledfont CLI
//!
//! Usage:
//!   oledfont convert DejaVuSans.ttf 12 --range 32-126 -o dejavu_12.h
//!   oledfont template generate status 10 --from DejaVuSans.ttf
//!   oledfont template build status 10 --binary status_10.bin
//!   oledfont preview status_10.h "12:45"
//!   oledfont info DejaVuSans.ttf 12 --chars 0123456789

use std::fs;
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{Level, LevelFilter, Log, Metadata, Record};

use oledfont::encode::extract_bytes;
use oledfont::template::generate_templates;
use oledfont::{
    BlobLayout, CharSet, CharSetSpec, FaceMetrics, FontConfig, FontView, GlyphError, GlyphObserver,
    GlyphReport, GlyphSource, OutlineRasterizer, OverflowPolicy, PackedFont, Placement, RasterGlyph,
};

/// oledfont - bitmap fonts for monochrome OLED displays
#[derive(Parser)]
#[command(name = "oledfont")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log per-glyph detail and write a character width report
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rasterize a TrueType/OpenType font into a packed bitmap font
    Convert {
        /// Path to the .ttf/.otf file
        font: PathBuf,

        /// Pixel size
        size: u32,

        /// Inclusive code range, e.g. 32-126 or 0x20-0x7E
        #[arg(long, conflicts_with = "chars")]
        range: Option<String>,

        /// Explicit characters, or comma-separated code points
        #[arg(long)]
        chars: Option<String>,

        /// Array name (default: <font file stem>_<size>)
        #[arg(long)]
        name: Option<String>,

        /// Output C header (default: <name>.h)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pixels between glyphs (default: derived from size)
        #[arg(long)]
        spacing: Option<u8>,

        /// Also write the raw blob to this file
        #[arg(long)]
        binary: Option<PathBuf>,

        #[arg(long, value_enum)]
        layout: Option<LayoutArg>,

        /// What to do with glyphs wider than the size field allows
        #[arg(long, value_enum)]
        overflow: Option<OverflowArg>,

        /// JSON configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create or pack hand-editable pixel templates
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Render text with a packed font as ASCII art
    Preview {
        /// Raw blob or generated C header
        blob: PathBuf,

        /// Text to render (default: every character in the font)
        text: Option<String>,

        #[arg(long, default_value_t = 128)]
        width: usize,

        #[arg(long, default_value_t = 64)]
        height: usize,

        #[arg(long, value_enum, default_value_t = LayoutArg::Indexed)]
        layout: LayoutArg,
    },

    /// Print face metrics and the bitmap box of every glyph at a pixel size
    Info {
        /// Path to the .ttf/.otf file
        font: PathBuf,

        /// Pixel size
        size: u32,

        /// Inclusive code range (default: 32-126)
        #[arg(long, conflicts_with = "chars")]
        range: Option<String>,

        /// Explicit characters, or comma-separated code points
        #[arg(long)]
        chars: Option<String>,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Write one template file per character
    Generate {
        name: String,
        size: u32,

        /// Template directory (default: <name>_<size>)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Seed the grids from this font instead of leaving them blank
        #[arg(long)]
        from: Option<PathBuf>,

        /// Inclusive code range
        #[arg(long, default_value = "32-126")]
        range: String,
    },

    /// Pack a template directory into a bitmap font
    Build {
        name: String,
        size: u32,

        /// Template directory (default: <name>_<size>)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Output C header (default: <name>_<size>.h)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the raw blob to this file
        #[arg(long)]
        binary: Option<PathBuf>,

        #[arg(long)]
        spacing: Option<u8>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LayoutArg {
    Indexed,
    Legacy,
}

impl From<LayoutArg> for BlobLayout {
    fn from(arg: LayoutArg) -> Self {
        match arg {
            LayoutArg::Indexed => BlobLayout::Indexed,
            LayoutArg::Legacy => BlobLayout::Legacy,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OverflowArg {
    Crop,
    Fail,
}

impl From<OverflowArg> for OverflowPolicy {
    fn from(arg: OverflowArg) -> Self {
        match arg {
            OverflowArg::Crop => OverflowPolicy::Crop,
            OverflowArg::Fail => OverflowPolicy::Fail,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.debug { LevelFilter::Debug } else { LevelFilter::Info };
    if log::set_boxed_logger(Box::new(StderrLogger { level })).is_ok() {
        log::set_max_level(level);
    }

    let result = match cli.command {
        Commands::Convert {
            font,
            size,
            range,
            chars,
            name,
            output,
            spacing,
            binary,
            layout,
            overflow,
            config,
        } => {
            let overrides = Overrides {
                range,
                chars,
                name,
                spacing,
                layout: layout.map(Into::into),
                overflow: overflow.map(Into::into),
            };
            run_convert(&font, size, config.as_deref(), overrides, output, binary, cli.debug)
        }
        Commands::Template { command } => match command {
            TemplateCommands::Generate {
                name,
                size,
                dir,
                from,
                range,
            } => run_template_generate(&name, size, dir, from.as_deref(), &range),
            TemplateCommands::Build {
                name,
                size,
                dir,
                output,
                binary,
                spacing,
            } => run_template_build(&name, size, dir, output, binary, spacing, cli.debug),
        },
        Commands::Preview {
            blob,
            text,
            width,
            height,
            layout,
        } => run_preview(&blob, text.as_deref(), width, height, layout.into()),
        Commands::Info {
            font,
            size,
            range,
            chars,
        } => run_info(&font, size, range, chars),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "✗".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

/// Command-line values that take precedence over the configuration file.
struct Overrides {
    range: Option<String>,
    chars: Option<String>,
    name: Option<String>,
    spacing: Option<u8>,
    layout: Option<BlobLayout>,
    overflow: Option<OverflowPolicy>,
}

impl Overrides {
    fn apply(self, config: &mut FontConfig) {
        if let Some(range) = self.range {
            config.charset = CharSetSpec::Range(range);
        }
        if let Some(chars) = self.chars {
            config.charset = CharSetSpec::Chars(chars);
        }
        if self.name.is_some() {
            config.name = self.name;
        }
        if self.spacing.is_some() {
            config.spacing = self.spacing;
        }
        if let Some(layout) = self.layout {
            config.layout = layout;
        }
        if let Some(overflow) = self.overflow {
            config.overflow = overflow;
        }
    }
}

fn run_convert(
    font: &Path,
    size: u32,
    config_path: Option<&Path>,
    overrides: Overrides,
    output: Option<PathBuf>,
    binary: Option<PathBuf>,
    debug: bool,
) -> Result<()> {
    let mut config = match config_path {
        Some(path) => FontConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FontConfig::default(),
    };
    config.font_size = size;
    overrides.apply(&mut config);

    let mut report = WidthReport::default();
    let packed = if debug {
        oledfont::convert_font_observed(font, &config, &mut report)
    } else {
        oledfont::convert_font(font, &config)
    }
    .with_context(|| format!("Failed to convert {}", font.display()))?;

    write_outputs(&packed, output, binary)?;
    if debug {
        report.save(&packed)?;
    }
    Ok(())
}

fn run_template_generate(
    name: &str,
    size: u32,
    dir: Option<PathBuf>,
    from: Option<&Path>,
    range: &str,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| default_template_dir(name, size));
    let charset = CharSet::parse_range(range)?;
    let seed = from
        .map(|path| OutlineRasterizer::open(path, size))
        .transpose()
        .context("Failed to open seed font")?;

    let written = generate_templates(&dir, &charset, size as usize, seed.as_ref())
        .with_context(|| format!("Failed to write templates to {}", dir.display()))?;
    eprintln!(
        "{} Created {} templates in {}",
        "✓".green().bold(),
        written,
        dir.display()
    );
    eprintln!("  Replace 'O' with 'X' to light a pixel, then run `oledfont template build {} {}`", name, size);
    Ok(())
}

fn run_template_build(
    name: &str,
    size: u32,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    binary: Option<PathBuf>,
    spacing: Option<u8>,
    debug: bool,
) -> Result<()> {
    let dir = dir.unwrap_or_else(|| default_template_dir(name, size));
    let config = FontConfig {
        font_size: size,
        name: Some(format!("{}_{}", name, size)),
        spacing,
        ..FontConfig::default()
    };

    let mut report = WidthReport::default();
    let packed = if debug {
        oledfont::build_from_templates_observed(&dir, &config, &mut report)
    } else {
        oledfont::build_from_templates(&dir, &config)
    }
    .with_context(|| format!("Failed to build font from {}", dir.display()))?;

    write_outputs(&packed, output, binary)?;
    if debug {
        report.save(&packed)?;
    }
    Ok(())
}

fn run_preview(blob: &Path, text: Option<&str>, width: usize, height: usize, layout: BlobLayout) -> Result<()> {
    let bytes = if blob.extension().is_some_and(|e| e == "h") {
        let listing = fs::read_to_string(blob).with_context(|| format!("Failed to read {}", blob.display()))?;
        extract_bytes(&listing)?
    } else {
        fs::read(blob).with_context(|| format!("Failed to read {}", blob.display()))?
    };
    let view = FontView::parse(&bytes, layout)?;

    let text = match text {
        Some(text) => text.to_string(),
        None => view
            .codes()
            .iter()
            .filter_map(|&c| char::from_u32(c as u32))
            .collect(),
    };
    let meta = view.metadata();
    eprintln!(
        "{} chars, cell {}x{}, spacing {}",
        meta.char_count, meta.max_width, meta.max_height, meta.spacing
    );

    let canvas = view.render_text(&text, width, height);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for row in canvas.to_rows('#', '.') {
        writeln!(out, "{}", row)?;
    }
    Ok(())
}

fn run_info(font: &Path, size: u32, range: Option<String>, chars: Option<String>) -> Result<()> {
    let rasterizer =
        OutlineRasterizer::open(font, size).with_context(|| format!("Failed to open {}", font.display()))?;
    let spec = match (range, chars) {
        (Some(range), _) => CharSetSpec::Range(range),
        (None, Some(chars)) => CharSetSpec::Chars(chars),
        (None, None) => CharSetSpec::default(),
    };
    let charset = spec.resolve()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", face_summary(&rasterizer.describe(), size, rasterizer.metrics()))?;
    writeln!(out, "\nChar\tCode\tBitmap\tTop\tAdvance")?;
    for &code in charset.codes() {
        writeln!(out, "{}", glyph_line(code, &rasterizer.rasterize(code)))?;
    }
    Ok(())
}

fn face_summary(label: &str, size: u32, metrics: &FaceMetrics) -> String {
    let mut text = format!("Font: {}\n", label);
    if let Some(family) = &metrics.family {
        text.push_str(&format!("Family: {}\n", family));
    }
    text.push_str(&format!("Glyphs: {}\n", metrics.glyph_count));
    text.push_str(&format!("Units per em: {}\n", metrics.units_per_em));
    text.push_str(&format!(
        "At {}px: ascender {:.1}, descender {:.1}, line gap {:.1}, line height {:.1}\n",
        size,
        metrics.ascender_px,
        metrics.descender_px,
        metrics.line_gap_px,
        metrics.line_height_px()
    ));
    text
}

/// One row of the glyph table: bitmap box, top above the baseline, advance.
fn glyph_line(code: u16, glyph: &Result<RasterGlyph, GlyphError>) -> String {
    let ch = char::from_u32(code as u32)
        .filter(|c| !c.is_control())
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    match glyph {
        Ok(glyph) => {
            let top = match glyph.placement {
                Placement::Baseline { top } => top,
                Placement::Top => 0,
            };
            format!(
                "'{}'\t{}\t{}x{}\t{}\t{}",
                ch,
                code,
                glyph.width(),
                glyph.height(),
                top,
                glyph.advance
            )
        }
        Err(e) => format!("'{}'\t{}\tmissing ({})", ch, code, e),
    }
}

fn default_template_dir(name: &str, size: u32) -> PathBuf {
    PathBuf::from(format!("{}_{}", name, size))
}

fn write_outputs(packed: &PackedFont, output: Option<PathBuf>, binary: Option<PathBuf>) -> Result<()> {
    let header_path =
        output.unwrap_or_else(|| PathBuf::from(format!("{}.h", packed.info.name)));
    let listing = packed.to_c_source();
    fs::write(&header_path, &listing).with_context(|| format!("Failed to write {}", header_path.display()))?;

    let meta = packed.blob.metadata();
    eprintln!(
        "{} Written {} ({} chars, cell {}x{}, {} bytes)",
        "✓".green().bold(),
        header_path.display(),
        meta.char_count,
        meta.max_width,
        meta.max_height,
        packed.blob.encoded_len()
    );

    if let Some(path) = binary {
        let bytes = packed.to_bytes();
        fs::write(&path, &bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("{} Written {} bytes to {}", "✓".green().bold(), bytes.len(), path.display());
    }
    Ok(())
}

/// Collects the advance width of every glyph for `character_widths.txt`.
#[derive(Default)]
struct WidthReport {
    rows: Vec<(u16, u8, bool)>,
}

impl GlyphObserver for WidthReport {
    fn observe(&mut self, report: &GlyphReport<'_>) {
        self.rows
            .push((report.code, report.entry.width, report.failure.is_some()));
    }
}

impl WidthReport {
    fn save(&self, packed: &PackedFont) -> Result<()> {
        let dir = PathBuf::from(format!("debug_{}", packed.info.name));
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut text = String::from("Character Width Information:\n==========================\nChar\tCode\tWidth (px)\n");
        for &(code, width, failed) in &self.rows {
            let ch = char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
            text.push_str(&format!(
                "'{}'\t{}\t{}{}\n",
                ch,
                code,
                width,
                if failed { " (fallback)" } else { "" }
            ));
        }
        let path = dir.join("character_widths.txt");
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        eprintln!("  Width report: {}", path.display());
        Ok(())
    }
}

/// Minimal stderr logger with colored level tags.
struct StderrLogger {
    level: LevelFilter,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "error".red().bold(),
            Level::Warn => "warning".yellow().bold(),
            Level::Info => "info".cyan(),
            Level::Debug | Level::Trace => "debug".dimmed(),
        };
        eprintln!("{}: {}", tag, record.args());
    }

    fn flush(&self) {}
}
