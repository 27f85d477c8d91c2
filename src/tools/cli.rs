use clap::Parser;
use log::{info, warn};
use std::{fmt::Display, fmt::Formatter};

use crate::bitstream::container::BitFormat;
use crate::compression::header::ImageShape;
use crate::error::{Error, Result};

/// Alphabet used when none is given: every byte value.
pub const DEFAULT_ALPHABET: usize = 256;

/// Compress, Decompress, Test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Zip,
    Unzip,
    Test,
}
impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Define the two output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    File,
    Stdout,
}
impl Display for Output {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Defines all user settable options to control program behavior
#[derive(Debug, Clone)]
pub struct AhOpts {
    /// Optional name of file to read for input (stdin if absent)
    pub file: Option<String>,
    /// Optional explicit output file name
    pub output_file: Option<String>,
    /// Compress/Decompress/Test
    pub op_mode: Mode,
    /// Location where output is sent
    pub output: Output,
    /// Silently overwrite existing files with the same name
    pub force_overwrite: bool,
    /// Alphabet size; encoder and decoder must agree on it
    pub alphabet: usize,
    /// How the bitstream is laid out in the compressed file
    pub format: BitFormat,
    /// Set when the input is raw pixel data
    pub image: Option<ImageShape>,
}

impl AhOpts {
    pub fn new() -> Self {
        Self {
            file: None,
            output_file: None,
            op_mode: Mode::Zip,
            output: Output::File,
            force_overwrite: false,
            alphabet: DEFAULT_ALPHABET,
            format: BitFormat::Packed,
            image: None,
        }
    }
}

impl Default for AhOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "One-pass adaptive Huffman compressor",
    long_about = "
    Compresses a byte stream without sending a frequency table. Encoder and decoder grow the
    same code tree as they go, so codeword lengths follow the symbol counts seen so far.

    Raw pixel data can be tagged with --width/--height/--channels; the decoder then reports
    the recovered image dimensions."
)]
pub struct Args {
    /// Filename of file to process (stdin if absent)
    #[clap()]
    filename: Option<String>,

    /// Perform compression on the input file (default)
    #[clap(short = 'z', long = "compress")]
    compress: bool,

    /// Perform decompression on the input file
    #[clap(short = 'd', long = "decompress")]
    decompress: bool,

    /// Test compressed file integrity
    #[clap(short = 't', long = "test")]
    test: bool,

    /// Write output to this file
    #[clap(short = 'o', long = "output")]
    output: Option<String>,

    /// Send output to the terminal
    #[clap(short = 'c', long = "stdout")]
    stdout: bool,

    ///Force overwriting output file
    #[clap(short = 'f', long = "force")]
    force: bool,

    /// Alphabet size (2-256). Must be the same for compression and decompression
    #[clap(short = 'a', long = "alphabet", default_value_t = DEFAULT_ALPHABET)]
    alphabet: usize,

    /// Store the bitstream as '0'/'1' characters instead of packed bytes
    #[clap(long = "ascii")]
    ascii: bool,

    /// Width of raw pixel input
    #[clap(long = "width", requires = "height")]
    width: Option<usize>,

    /// Height of raw pixel input
    #[clap(long = "height", requires = "width")]
    height: Option<usize>,

    /// Channels of raw pixel input (1 or 3)
    #[clap(long = "channels", default_value_t = 1)]
    channels: u8,

    /// Sets verbosity. -v0 is silent, -v5 is chatty
    #[clap(short = 'v', default_value_t = 2)]
    v: u8,
}

/// Parse the process command line into options and set the log level.
pub fn init_ah_opts() -> Result<AhOpts> {
    ah_opts_from_args(Args::parse())
}

/// Put command line information from CLAP into our internal structure.
pub fn ah_opts_from_args(args: Args) -> Result<AhOpts> {
    let mut opts = AhOpts::new();

    // Set the log level
    match args.v {
        0 => log::set_max_level(log::LevelFilter::Off),
        1 => log::set_max_level(log::LevelFilter::Error),
        2 => log::set_max_level(log::LevelFilter::Warn),
        3 => log::set_max_level(log::LevelFilter::Info),
        4 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    };

    opts.file = args.filename;
    opts.output_file = args.output;

    opts.op_mode = if args.test {
        Mode::Test
    } else if args.decompress {
        Mode::Unzip
    } else {
        Mode::Zip
    };
    if args.compress && opts.op_mode != Mode::Zip {
        warn!("-z ignored, operational mode is {}", opts.op_mode);
    }

    if args.stdout {
        opts.output = Output::Stdout
    };
    opts.force_overwrite = args.force;

    if !(2..=256).contains(&args.alphabet) {
        return Err(Error::InvalidAlphabet(args.alphabet));
    }
    opts.alphabet = args.alphabet;

    if args.ascii {
        opts.format = BitFormat::Ascii
    };

    if let (Some(width), Some(height)) = (args.width, args.height) {
        let three_channel = match args.channels {
            1 => false,
            3 => true,
            other => {
                return Err(Error::InvalidHeader(format!(
                    "{} channels requested, only 1 or 3 are supported",
                    other
                )))
            }
        };
        opts.image = Some(ImageShape {
            width,
            height,
            three_channel,
        });
    }

    // Below we report initialization status to the user
    info!("---- Initialization Start ----");
    info!("Verbosity set to {}", log::max_level());
    info!("Operational mode set to {}", opts.op_mode);
    match &opts.file {
        Some(s) => info!("Getting input from the file {}", s),
        None => info!("Getting input from stdin"),
    }
    info!("Sending output to {}", opts.output);
    info!("Alphabet size set to {}", opts.alphabet);
    info!("Bitstream format set to {:?}", opts.format);
    if let Some(shape) = &opts.image {
        info!(
            "Raw image input {}x{} with {} channel(s)",
            shape.width,
            shape.height,
            shape.channels()
        );
    }
    if opts.force_overwrite {
        info!("Forcing file overwriting")
    };
    info!("---- Initialization End ----");
    Ok(opts)
}
