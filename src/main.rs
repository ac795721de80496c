use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

use pdfdeck::compress::{Quality, compress};
use pdfdeck::editor::{
    PageSizeTarget, RangeSpec, RotationMap, delete_pages, merge, reorder_pages, resize_pages,
    rotate_pages, split,
};
use pdfdeck::export::{derive_output_name, format_file_size, save_bytes, split_output_name};
use pdfdeck::pagesize;
use pdfdeck::{DocumentHandle, LoadOptions};

#[derive(Parser)]
#[command(
    name = "pdfdeck",
    version,
    about = "PDF page toolbox: merge, split, rotate, reorder, resize and compress"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Accept encrypted documents instead of refusing them
    #[arg(long, global = true)]
    ignore_encryption: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge two or more documents into one
    Merge {
        /// Input files, appended in the order given
        #[arg(required = true, num_args = 2..)]
        inputs: Vec<PathBuf>,
        /// Output path (default: merged.pdf next to the first input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Extract page ranges into separate documents
    Split {
        input: PathBuf,
        /// 1-indexed inclusive ranges, e.g. "1-3,5,7-9"
        #[arg(short, long, conflicts_with = "each")]
        ranges: Option<String>,
        /// Put every page into its own document
        #[arg(long)]
        each: bool,
    },

    /// Delete the given pages
    Delete {
        input: PathBuf,
        /// 1-indexed pages to remove, e.g. "2,4"
        #[arg(short, long)]
        pages: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Reorder pages
    Reorder {
        input: PathBuf,
        /// New page order as 1-indexed source pages, e.g. "3,1,2"
        #[arg(long)]
        order: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rotate pages by additive 90-degree steps
    Rotate {
        input: PathBuf,
        /// Rotations as page:degrees, e.g. "1:90,3:180", or "all:90"
        #[arg(short, long)]
        pages: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resize pages onto a target page size, scaling content down to fit
    Resize {
        input: PathBuf,
        /// Named preset: A3, A4, A5, Letter, Legal or Tabloid
        #[arg(short, long)]
        size: Option<String>,
        /// Target width in points (with --height, instead of --size)
        #[arg(long, requires = "height", conflicts_with = "size")]
        width: Option<f64>,
        /// Target height in points
        #[arg(long, requires = "width", conflicts_with = "size")]
        height: Option<f64>,
        /// Swap the preset into landscape orientation
        #[arg(long)]
        landscape: bool,
        /// 1-indexed pages to resize (default: all)
        #[arg(short, long)]
        pages: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compress through the external engine
    Compress {
        input: PathBuf,
        /// Quality preset: screen, ebook, printer or prepress
        #[arg(short, long, default_value = "ebook")]
        quality: Quality,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show page count, size, and per-page geometry
    Info { input: PathBuf },

    /// Render one page as a PNG thumbnail
    #[cfg(feature = "thumbnails")]
    Thumbnail {
        input: PathBuf,
        /// 1-indexed page to render
        #[arg(short, long, default_value_t = 1)]
        page: usize,
        /// Render scale
        #[arg(short, long, default_value_t = pdfdeck::thumbs::DEFAULT_THUMBNAIL_SCALE)]
        scale: f32,
        /// Write the decoded PNG here instead of printing a data URL
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ignore_encryption = cli.ignore_encryption;
    match cli.command {
        Command::Merge { inputs, output } => cmd_merge(&inputs, output, ignore_encryption),
        Command::Split {
            input,
            ranges,
            each,
        } => cmd_split(&input, ranges.as_deref(), each, ignore_encryption),
        Command::Delete {
            input,
            pages,
            output,
        } => cmd_delete(&input, &pages, output, ignore_encryption),
        Command::Reorder {
            input,
            order,
            output,
        } => cmd_reorder(&input, &order, output, ignore_encryption),
        Command::Rotate {
            input,
            pages,
            output,
        } => cmd_rotate(&input, &pages, output, ignore_encryption),
        Command::Resize {
            input,
            size,
            width,
            height,
            landscape,
            pages,
            output,
        } => cmd_resize(
            &input,
            size.as_deref(),
            width.zip(height),
            landscape,
            pages.as_deref(),
            output,
            ignore_encryption,
        ),
        Command::Compress {
            input,
            quality,
            output,
        } => cmd_compress(&input, quality, output),
        Command::Info { input } => cmd_info(&input, ignore_encryption),
        #[cfg(feature = "thumbnails")]
        Command::Thumbnail {
            input,
            page,
            scale,
            output,
        } => cmd_thumbnail(&input, page, scale, output),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

fn load_handle(path: &Path, ignore_encryption: bool) -> Result<DocumentHandle> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    DocumentHandle::load_with(bytes, LoadOptions { ignore_encryption })
        .with_context(|| format!("loading {}", path.display()))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    save_bytes(path, bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("{} ({})", path.display(), format_file_size(bytes.len() as u64));
    Ok(())
}

fn cmd_merge(inputs: &[PathBuf], output: Option<PathBuf>, ignore_encryption: bool) -> Result<()> {
    if inputs.len() < 2 {
        bail!("merge requires at least two input files");
    }
    let handles = inputs
        .iter()
        .map(|path| load_handle(path, ignore_encryption))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&DocumentHandle> = handles.iter().collect();
    let merged = merge(&refs)?;

    let path = output.unwrap_or_else(|| inputs[0].with_file_name("merged.pdf"));
    write_output(&path, &merged)
}

fn cmd_split(
    input: &Path,
    ranges: Option<&str>,
    each: bool,
    ignore_encryption: bool,
) -> Result<()> {
    let handle = load_handle(input, ignore_encryption)?;
    let ranges = if each {
        (0..handle.page_count())
            .map(|page| RangeSpec::new(page, page))
            .collect::<pdfdeck::Result<Vec<_>>>()?
    } else {
        let text = ranges.context("pass --ranges or --each")?;
        parse_ranges(text)?
    };

    let outputs = split(&handle, &ranges)?;
    let parts = outputs.len();
    for (part, bytes) in outputs.iter().enumerate() {
        write_output(&split_output_name(input, part, parts), bytes)?;
    }
    Ok(())
}

fn cmd_delete(
    input: &Path,
    pages: &str,
    output: Option<PathBuf>,
    ignore_encryption: bool,
) -> Result<()> {
    let handle = load_handle(input, ignore_encryption)?;
    let indices = parse_page_set(pages)?;
    let edited = delete_pages(&handle, &indices)?;

    let path = output.unwrap_or_else(|| derive_output_name(input, "_edited"));
    write_output(&path, &edited)
}

fn cmd_reorder(
    input: &Path,
    order: &str,
    output: Option<PathBuf>,
    ignore_encryption: bool,
) -> Result<()> {
    let handle = load_handle(input, ignore_encryption)?;
    let new_order = parse_order(order)?;
    let reordered = reorder_pages(&handle, &new_order)?;

    let path = output.unwrap_or_else(|| derive_output_name(input, "_reordered"));
    write_output(&path, &reordered)
}

fn cmd_rotate(
    input: &Path,
    pages: &str,
    output: Option<PathBuf>,
    ignore_encryption: bool,
) -> Result<()> {
    let handle = load_handle(input, ignore_encryption)?;
    let rotations = parse_rotations(pages, handle.page_count())?;
    let rotated = rotate_pages(&handle, &rotations)?;

    let path = output.unwrap_or_else(|| derive_output_name(input, "_rotated"));
    write_output(&path, &rotated)
}

fn cmd_resize(
    input: &Path,
    size: Option<&str>,
    dimensions: Option<(f64, f64)>,
    landscape: bool,
    pages: Option<&str>,
    output: Option<PathBuf>,
    ignore_encryption: bool,
) -> Result<()> {
    let (dims, suffix) = match (size, dimensions) {
        (Some(name), _) => {
            let dims = pagesize::preset(name)
                .with_context(|| format!("unknown page size '{name}' (A3, A4, A5, Letter, Legal, Tabloid)"))?;
            (dims, format!("_{}", name.to_lowercase()))
        }
        (None, Some((width, height))) => ((width, height), format!("_{width}x{height}")),
        (None, None) => bail!("pass --size or --width/--height"),
    };
    let (width, height) = if landscape {
        pagesize::landscape(dims)
    } else {
        dims
    };

    let handle = load_handle(input, ignore_encryption)?;
    let targets = pages.map(parse_page_set).transpose()?;
    let resized = resize_pages(
        &handle,
        PageSizeTarget::new(width, height),
        targets.as_ref(),
    )?;

    let path = output.unwrap_or_else(|| derive_output_name(input, &suffix));
    write_output(&path, &resized)
}

fn cmd_compress(input: &Path, quality: Quality, output: Option<PathBuf>) -> Result<()> {
    let bytes = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let original_size = bytes.len() as u64;

    info!("compressing {} with preset {quality}", input.display());
    let compressed = compress(&bytes, quality).wait()?;
    let compressed_size = compressed.len() as u64;

    let path = output.unwrap_or_else(|| derive_output_name(input, "_optimized"));
    write_output(&path, &compressed)?;
    println!(
        "{} -> {} ({:.0}% of original)",
        format_file_size(original_size),
        format_file_size(compressed_size),
        compressed_size as f64 / original_size as f64 * 100.0,
    );
    Ok(())
}

fn cmd_info(input: &Path, ignore_encryption: bool) -> Result<()> {
    let handle = load_handle(input, ignore_encryption)?;
    println!("{}", input.display());
    println!(
        "  {} pages, {}",
        handle.page_count(),
        format_file_size(handle.bytes().len() as u64)
    );
    for page in 0..handle.page_count() {
        let (width, height) = handle.page_size(page)?;
        let rotation = handle.page_rotation(page)?;
        if rotation == 0 {
            println!("  page {}: {width:.2} x {height:.2} pt", page + 1);
        } else {
            println!(
                "  page {}: {width:.2} x {height:.2} pt, rotated {rotation}",
                page + 1
            );
        }
    }
    Ok(())
}

#[cfg(feature = "thumbnails")]
fn cmd_thumbnail(input: &Path, page: usize, scale: f32, output: Option<PathBuf>) -> Result<()> {
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;
    use pdfdeck::thumbs::Thumbnailer;
    use std::sync::Arc;

    let bytes: Arc<[u8]> =
        Arc::from(fs::read(input).with_context(|| format!("reading {}", input.display()))?);
    let mut thumbnailer = Thumbnailer::new();
    let url = thumbnailer.render_page_thumbnail(&bytes, page, scale)?;

    match output {
        Some(path) => {
            let encoded = url
                .strip_prefix("data:image/png;base64,")
                .context("unexpected thumbnail encoding")?;
            let png = STANDARD.decode(encoded).context("decoding thumbnail")?;
            fs::write(&path, &png).with_context(|| format!("writing {}", path.display()))?;
            println!("{} ({})", path.display(), format_file_size(png.len() as u64));
        }
        None => println!("{url}"),
    }
    Ok(())
}

/// Parse a 1-indexed page number into a 0-indexed one.
fn parse_page_number(text: &str) -> Result<usize> {
    let text = text.trim();
    let page: usize = text
        .parse()
        .with_context(|| format!("invalid page number '{text}'"))?;
    if page == 0 {
        bail!("page numbers are 1-indexed; got '0'");
    }
    Ok(page - 1)
}

/// Parse "2,4,6" (1-indexed) into a 0-indexed set.
fn parse_page_set(text: &str) -> Result<BTreeSet<usize>> {
    text.split(',').map(parse_page_number).collect()
}

/// Parse "1-3,5,7-9" (1-indexed, inclusive) into ranges.
fn parse_ranges(text: &str) -> Result<Vec<RangeSpec>> {
    let mut ranges = Vec::new();
    for part in text.split(',') {
        let part = part.trim();
        let range = match part.split_once('-') {
            Some((start, end)) => RangeSpec::new(parse_page_number(start)?, parse_page_number(end)?),
            None => {
                let page = parse_page_number(part)?;
                RangeSpec::new(page, page)
            }
        }
        .with_context(|| format!("invalid range '{part}'"))?;
        ranges.push(range);
    }
    Ok(ranges)
}

/// Parse "3,1,2" (1-indexed) into a 0-indexed order.
fn parse_order(text: &str) -> Result<Vec<usize>> {
    text.split(',').map(parse_page_number).collect()
}

/// Parse "1:90,3:180" or "all:90" into a rotation map.
fn parse_rotations(text: &str, page_count: usize) -> Result<RotationMap> {
    let mut map = RotationMap::new();
    for part in text.split(',') {
        let part = part.trim();
        let (page_text, angle_text) = part
            .split_once(':')
            .with_context(|| format!("invalid rotation '{part}' (expected page:degrees)"))?;
        let angle: i64 = angle_text
            .trim()
            .parse()
            .with_context(|| format!("invalid angle '{}'", angle_text.trim()))?;
        if page_text.trim().eq_ignore_ascii_case("all") {
            for page in 0..page_count {
                map.set(page, angle);
            }
        } else {
            map.set(parse_page_number(page_text)?, angle);
        }
    }
    Ok(map)
}
