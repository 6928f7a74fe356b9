//! Command-line arguments and editor configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use memeforge_core::{Point, DEFAULT_IMAGE_SIZE};

/// Where dropped images land.
pub const DEFAULT_DROP_POSITION: Point = Point::new(50.0, 50.0);

/// Default canvas width in pixels.
pub const DEFAULT_WIDTH: u32 = 800;

/// Default canvas height in pixels.
pub const DEFAULT_HEIGHT: u32 = 600;

/// Command-line arguments for `memeforge`.
#[derive(Debug, Clone, Parser)]
#[command(name = "memeforge")]
#[command(about = "Layered meme and comic canvas")]
#[command(version)]
pub struct CliArgs {
    /// What to do.
    #[command(subcommand)]
    pub command: Command,

    /// Image description endpoint (e.g., <http://localhost:9000/describe>)
    #[arg(long, global = true, env = "MEMEFORGE_DESCRIBE_URL")]
    pub describe_url: Option<String>,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Paint a saved layer document to a PNG file.
    Render(RenderArgs),
}

/// Arguments for `memeforge render`.
#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Layer document (JSON)
    #[arg(long)]
    pub document: PathBuf,

    /// Output PNG path
    #[arg(long)]
    pub output: PathBuf,

    /// Canvas width in pixels
    #[arg(long, default_value_t = DEFAULT_WIDTH)]
    pub width: u32,

    /// Canvas height in pixels
    #[arg(long, default_value_t = DEFAULT_HEIGHT)]
    pub height: u32,

    /// Background color, overriding the document's
    #[arg(long)]
    pub background: Option<String>,

    /// TrueType/OpenType font used for every text layer instead of
    /// installed fonts
    #[arg(long, env = "MEMEFORGE_FONT")]
    pub font: Option<PathBuf>,
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Background color override applied to loaded documents.
    pub background: Option<String>,
    /// Size given to dropped images.
    pub default_image_size: (f32, f32),
    /// Position given to dropped images.
    pub drop_position: Point,
    /// Font file pinned for every text layer. Without one, families
    /// resolve against installed fonts with an embedded fallback.
    pub font: Option<PathBuf>,
    /// Description service endpoint.
    pub describe_url: Option<String>,
    /// Cap on decoded bitmaps kept in memory.
    pub max_cached_images: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            background: None,
            default_image_size: DEFAULT_IMAGE_SIZE,
            drop_position: DEFAULT_DROP_POSITION,
            font: None,
            describe_url: None,
            max_cached_images: None,
        }
    }

    /// Set the canvas size.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

impl From<CliArgs> for EditorConfig {
    fn from(args: CliArgs) -> Self {
        let mut config = Self {
            describe_url: args.describe_url,
            ..Self::new()
        };
        match args.command {
            Command::Render(render) => {
                config.width = render.width;
                config.height = render.height;
                config.background = render.background;
                config.font = render.font;
            }
        }
        config
    }
}
