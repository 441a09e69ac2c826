// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing a finished raster to disk.
//!
//! The output is written to a temporary file next to the destination
//! and renamed over it only once every byte is down, so a failed write
//! never leaves a truncated image behind.

use std::convert::TryFrom;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::str::FromStr;

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder};
use tempfile::NamedTempFile;

use crate::buffer::ImageBuffer;
use crate::error::{Error, Result};

/// The file formats a raster can be saved as.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Binary graymap, `P5`.
    Pgm,
    /// 8-bit grayscale PNG.
    Png,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pgm" | "pnm" => Ok(OutputFormat::Pgm),
            "png" => Ok(OutputFormat::Png),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// The binary graymap header: `P5\n<width> <height>\n255\n`.
pub fn pgm_header(width: usize, height: usize) -> String {
    format!("P5\n{} {}\n255\n", width, height)
}

/// Writes the binary graymap: the header and then the pixels,
/// unmodified.
pub fn write_pgm<W: Write>(mut writer: W, image: &ImageBuffer) -> io::Result<()> {
    writer.write_all(pgm_header(image.width(), image.height()).as_bytes())?;
    writer.write_all(image.as_bytes())?;
    writer.flush()
}

/// Writes the raster as a grayscale PNG.
pub fn write_png<W: Write>(mut writer: W, image: &ImageBuffer) -> io::Result<()> {
    let too_big = |_| io::Error::new(io::ErrorKind::InvalidInput, "image too large for PNG");
    let width = u32::try_from(image.width()).map_err(too_big)?;
    let height = u32::try_from(image.height()).map_err(too_big)?;
    PngEncoder::new(&mut writer)
        .write_image(image.as_bytes(), width, height, ColorType::L8)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writer.flush()
}

/// Saves the raster at `path` in the given format.
pub fn save<P: AsRef<Path>>(path: P, image: &ImageBuffer, format: OutputFormat) -> Result<()> {
    let path = path.as_ref();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let staged = NamedTempFile::new_in(directory).map_err(|e| Error::persistence(path, e))?;
    {
        let writer = BufWriter::new(staged.as_file());
        match format {
            OutputFormat::Pgm => write_pgm(writer, image),
            OutputFormat::Png => write_png(writer, image),
        }
        .map_err(|e| Error::persistence(path, e))?;
    }
    staged
        .as_file()
        .sync_all()
        .map_err(|e| Error::persistence(path, e))?;
    staged
        .persist(path)
        .map_err(|e| Error::persistence(path, e.error))?;
    Ok(())
}

/// Reads back the width and height from a graymap file's header.  Not
/// part of rendering; it is here for tests and tooling that check a
/// written file without loading all of it.
#[doc(hidden)]
pub fn read_pgm_header<P: AsRef<Path>>(path: P) -> io::Result<(usize, usize)> {
    let mut header = vec![0u8; 64];
    let read = fs::File::open(path)?.read(&mut header)?;
    header.truncate(read);
    let text = String::from_utf8_lossy(&header);
    let mut fields = text.split_ascii_whitespace();
    let bad = || io::Error::new(io::ErrorKind::InvalidData, "not a binary graymap");
    if fields.next() != Some("P5") {
        return Err(bad());
    }
    let width = fields.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    let height = fields.next().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    Ok((width, height))
}
