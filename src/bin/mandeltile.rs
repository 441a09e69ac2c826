// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate mandeltile;
extern crate num;

use clap::{App, Arg, ArgMatches};
use num::Complex;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mandeltile::render::default_workers;
use mandeltile::{render, save, Error, OutputFormat, ProcessorInfo, RenderConfig, Viewport};

/// Splits `"<left><separator><right>"` and parses both halves.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let index = s.find(separator)?;
    let left = s[..index].trim().parse().ok()?;
    let right = s[index + separator.len_utf8()..].trim().parse().ok()?;
    Some((left, right))
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    parse_pair(s, ',').map(|(re, im)| Complex { re, im })
}

fn validate_pair(s: &str, what: &str) -> Result<(), String> {
    parse_pair::<f64>(s, ',')
        .map(|_| ())
        .ok_or_else(|| format!("Could not parse {}", what))
}

/// Accepts a whole number in `1..=max`; `what` names it in the message.
fn validate_count(s: &str, what: &str, max: usize) -> Result<(), String> {
    let count: usize = s
        .parse()
        .map_err(|_| format!("Could not parse {} count", what.to_lowercase()))?;
    if (1..=max).contains(&count) {
        Ok(())
    } else {
        Err(format!("{} count must be between 1 and {}", what, max))
    }
}

fn validate_positive(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(v) if v > 0.0 && v.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const CENTER: &str = "center";
const LENGTH: &str = "length";
const PIXEL_SIZE: &str = "pixel-size";
const ITERATIONS: &str = "iterations";
const BLOCKS: &str = "blocks";
const LANES: &str = "lanes";
const WORKERS: &str = "workers";
const SINGLE_PASS: &str = "single-pass";
const STRICT: &str = "strict";
const FORMAT: &str = "format";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get() * 4;

    App::new("mandeltile")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Tiled Mandelbrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(false)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .default_value("mandelbrot.pgm")
                .help("Output file"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.75,0.0")
                .validator(|s| validate_pair(&s, "center point"))
                .help("Center of the region of the complex plane"),
        )
        .arg(
            Arg::with_name(LENGTH)
                .required(false)
                .long(LENGTH)
                .short("l")
                .takes_value(true)
                .default_value("2.75,2.0")
                .validator(|s| validate_pair(&s, "region extents"))
                .help("Width and height of the region of the complex plane"),
        )
        .arg(
            Arg::with_name(PIXEL_SIZE)
                .required(false)
                .long(PIXEL_SIZE)
                .short("p")
                .takes_value(true)
                .default_value("0.0001")
                .validator(|s| validate_positive(&s, "Pixel size must be a positive number"))
                .help("Distance between samples on the complex plane"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .required(false)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("50")
                .validator(move |s| validate_count(&s, "Iteration", 1_000_000))
                .help("Maximum number of iterations per pixel"),
        )
        .arg(
            Arg::with_name(BLOCKS)
                .required(false)
                .long(BLOCKS)
                .short("b")
                .takes_value(true)
                .default_value("16")
                .validator(move |s| validate_count(&s, "Block", 65_536))
                .help("Number of row blocks the image is split into"),
        )
        .arg(
            Arg::with_name(LANES)
                .required(false)
                .long(LANES)
                .short("n")
                .takes_value(true)
                .default_value("3")
                .validator(move |s| validate_count(&s, "Lane", max_threads))
                .help("Number of lanes blocks are spread over"),
        )
        .arg(
            Arg::with_name(WORKERS)
                .required(false)
                .long(WORKERS)
                .short("w")
                .takes_value(true)
                .validator(move |s| validate_count(&s, "Worker", max_threads))
                .help("Threads each lane computes a block with (default: processors / lanes)"),
        )
        .arg(
            Arg::with_name(SINGLE_PASS)
                .long(SINGLE_PASS)
                .help("Render the whole image as one block on one lane (overrides --blocks, --lanes)"),
        )
        .arg(
            Arg::with_name(STRICT)
                .long(STRICT)
                .help("Fail if the image height is not a multiple of the block count"),
        )
        .arg(
            Arg::with_name(FORMAT)
                .required(false)
                .long(FORMAT)
                .short("f")
                .takes_value(true)
                .possible_values(&["pgm", "png"])
                .default_value("pgm")
                .help("Output file format"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| Error::InvalidConfig(format!("could not parse --{}", name)))
}

fn pair(matches: &ArgMatches, name: &str) -> Result<(f64, f64), Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, ','))
        .ok_or_else(|| Error::InvalidConfig(format!("could not parse --{}", name)))
}

fn config(matches: &ArgMatches) -> Result<RenderConfig, Error> {
    let center = matches
        .value_of(CENTER)
        .and_then(parse_complex)
        .ok_or_else(|| Error::InvalidConfig("could not parse --center".to_string()))?;
    let viewport = Viewport::new(center, pair(matches, LENGTH)?, value(matches, PIXEL_SIZE)?)?;

    let num_lanes = value(matches, LANES)?;
    let config = RenderConfig {
        viewport,
        max_iterations: value(matches, ITERATIONS)?,
        num_blocks: value(matches, BLOCKS)?,
        num_lanes,
        workers: default_workers(num_lanes),
        strict: matches.is_present(STRICT),
    };
    let config = if matches.is_present(SINGLE_PASS) {
        config.single_pass()
    } else {
        config
    };

    Ok(match matches.value_of(WORKERS) {
        Some(_) => RenderConfig {
            workers: value(matches, WORKERS)?,
            ..config
        },
        None => config,
    })
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let config = config(matches)?;
    let output = matches.value_of(OUTPUT).unwrap_or("mandelbrot.pgm");
    let format: OutputFormat = value(matches, FORMAT)?;

    info!("{}", ProcessorInfo::probe());
    info!(
        width = config.viewport.width(),
        height = config.viewport.height(),
        iterations = config.max_iterations,
        blocks = config.num_blocks,
        lanes = config.num_lanes,
        workers = config.workers,
        "rendering"
    );

    let (image, report) = render(&config)?;
    save(output, &image, format)?;
    info!(
        output,
        seconds = report.elapsed.as_secs_f64(),
        "image written"
    );
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
