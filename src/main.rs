//Enable more cargo lint tests
#![warn(rust_2018_idioms)]

use std::process::ExitCode;

use adaptive_huffman::compression::{compress::compress, decompress};
use adaptive_huffman::tools::cli::{init_ah_opts, Mode};

use log::{error, info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

fn main() -> ExitCode {
    // Available log levels are Error, Warn, Info, Debug, Trace. Logs go to stderr so that
    // compressed data can be sent to stdout.
    if let Err(e) = TermLogger::init(
        LevelFilter::Trace,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Cannot start the logger: {}", e);
    }

    let options = match init_ah_opts() {
        Ok(options) => options,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    //----- Figure how what we need to do and go do it
    let result = match options.op_mode {
        Mode::Zip => compress(&options),
        Mode::Unzip => decompress::decompress(&options),
        Mode::Test => decompress::test(&options),
    };

    match result {
        Ok(()) => {
            info!("Done.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
