use std::{
    fs::{self, OpenOptions},
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use log::{error, info};

use super::cli::{AhOpts, Mode, Output};
use crate::error::Result;

/// Suffix added to compressed files.
pub const EXTENSION: &str = "ahc";

/// Read all input: the file named in the options, or stdin when there is none.
pub fn read_input(opts: &AhOpts) -> Result<Vec<u8>> {
    match &opts.file {
        Some(name) => match fs::read(name) {
            Ok(data) => {
                info!("Read {} bytes from {}", data.len(), name);
                Ok(data)
            }
            Err(e) => {
                error!("Cannot read from the file {}", name);
                Err(e.into())
            }
        },
        None => {
            let mut data = Vec::new();
            io::stdin().lock().read_to_end(&mut data)?;
            info!("Read {} bytes from stdin", data.len());
            Ok(data)
        }
    }
}

/// Where output goes for this run. `None` means stdout.
pub fn output_path(opts: &AhOpts) -> Option<PathBuf> {
    if opts.output == Output::Stdout {
        return None;
    }
    if let Some(name) = &opts.output_file {
        return Some(PathBuf::from(name));
    }
    let input = opts.file.as_ref()?;
    Some(match opts.op_mode {
        Mode::Zip => PathBuf::from(format!("{}.{}", input, EXTENSION)),
        _ => match Path::new(input).extension() {
            Some(ext) if ext == EXTENSION => Path::new(input).with_extension(""),
            _ => PathBuf::from(format!("{}.out", input)),
        },
    })
}

/// Write `data` to the output selected by the options. Existing files are only replaced when
/// the user forced it.
pub fn write_output(opts: &AhOpts, data: &[u8]) -> Result<()> {
    match output_path(opts) {
        Some(path) => {
            let mut f_out = OpenOptions::new()
                .write(true)
                .create(opts.force_overwrite)
                .create_new(!opts.force_overwrite)
                .truncate(true)
                .open(&path)
                .map_err(|e| {
                    error!("Cannot write to {} ({})", path.display(), e);
                    e
                })?;
            f_out.write_all(data)?;
            info!("Wrote {} bytes to {}", data.len(), path.display());
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(data)?;
            out.flush()?;
        }
    }
    Ok(())
}
