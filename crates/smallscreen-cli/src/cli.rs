use clap::Parser;
use smallscreen_image::ChannelOrder;

#[derive(Debug, Parser, Clone)]
#[command(name = "smallscreen-decode")]
#[command(about = "Decode images on the smallscreen worker pool")]
pub struct Cli {
    /// Image files to decode. With --markup each argument is inline SVG.
    #[arg(required = true)]
    pub inputs: Vec<String>,

    /// Worker threads (0 = hardware concurrency). Overrides
    /// SMALLSCREEN_THREAD_POOL_SIZE.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Desired width; only applied to vector images, together with --height.
    #[arg(long, default_value_t = 0)]
    pub width: u32,

    /// Desired height; only applied to vector images, together with --width.
    #[arg(long, default_value_t = 0)]
    pub height: u32,

    /// Output channel order: rgba, argb, abgr or bgra.
    #[arg(long, default_value = "rgba")]
    pub order: ChannelOrder,

    /// Resolve each path to the first sibling file starting with its name.
    #[arg(long)]
    pub basename: bool,

    /// Treat inputs as inline SVG markup instead of paths.
    #[arg(long, conflicts_with = "base64")]
    pub markup: bool,

    /// Treat inputs as base64 (or data: URL) encoded images.
    #[arg(long)]
    pub base64: bool,

    /// Completion channel capacity. Overrides
    /// SMALLSCREEN_COMPLETION_CAPACITY.
    #[arg(long)]
    pub completion_capacity: Option<usize>,
}
