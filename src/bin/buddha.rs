// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use buddhabrot::output::{write_pgm, write_ppm};
use buddhabrot::{AccumulationBuffer, Config, NaiveRenderer, RenderError, RenderSession, Target, CHANNELS};
use clap::{App, Arg, ArgMatches};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::AtomicBool;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_parse<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    T::from_str(s).map(|_| ()).map_err(|_| err.to_string())
}

const OUTPUT: &str = "output";
const SIZE: &str = "size";
const CENTER: &str = "center";
const ZOOM: &str = "zoom";
const PRESET: &str = "preset";
const CHAINS: &str = "chains";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const ROUNDS: &str = "rounds";
const ROUND_LENGTH: &str = "round-length";
const FLUSH_EVERY: &str = "flush-every";
const SEPARATE: &str = "channels";
const CLASSIC: &str = "classic";
const SAMPLES: &str = "samples";

const CHANNEL_NAMES: [&str; CHANNELS] = ["red", "green", "blue"];

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();
    let max_preset = buddhabrot::config::PRESETS.len() - 1;

    App::new("buddha")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Metropolis-Hastings Buddhabrot renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file (binary PPM)"),
        )
        .arg(
            Arg::with_name(SIZE)
                .required(false)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("480x640")
                .validator(|s| validate_pair::<usize>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image, WIDTHxHEIGHT"),
        )
        .arg(
            Arg::with_name(CENTER)
                .required(false)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("0,0")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse center point"))
                .help("Complex coordinate at the center of the image, RE,IM"),
        )
        .arg(
            Arg::with_name(ZOOM)
                .required(false)
                .long(ZOOM)
                .short("z")
                .takes_value(true)
                .default_value("0.32")
                .validator(|s| {
                    validate_range(
                        &s,
                        std::f64::MIN_POSITIVE,
                        std::f64::MAX,
                        "Could not parse zoom",
                        "Zoom must be positive",
                    )
                })
                .help("Magnification; 1.0 fits a span of 1.0 into the image height"),
        )
        .arg(
            Arg::with_name(PRESET)
                .required(false)
                .long(PRESET)
                .short("p")
                .takes_value(true)
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_preset,
                        "Could not parse preset number",
                        &format!("Preset must be between 1 and {}", max_preset),
                    )
                })
                .help("Use one of the built-in targets instead of --center and --zoom"),
        )
        .arg(
            Arg::with_name(CHAINS)
                .required(false)
                .long(CHAINS)
                .short("n")
                .takes_value(true)
                .default_value("30")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        10_000,
                        "Could not parse chain count",
                        "Chain count must be between 1 and 10000",
                    )
                })
                .help("Number of Markov chains in the ensemble"),
        )
        .arg(
            Arg::with_name(THREADS)
                .required(false)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1,
                        max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in solver"),
        )
        .arg(
            Arg::with_name(SEED)
                .required(false)
                .long(SEED)
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_parse::<u64>(&s, "Could not parse random seed"))
                .help("Random seed; the same seed renders the same image"),
        )
        .arg(
            Arg::with_name(ROUNDS)
                .required(false)
                .long(ROUNDS)
                .short("r")
                .takes_value(true)
                .default_value("0")
                .validator(|s| validate_parse::<usize>(&s, "Could not parse round count"))
                .help("Number of rounds to render; 0 renders until killed"),
        )
        .arg(
            Arg::with_name(ROUND_LENGTH)
                .required(false)
                .long(ROUND_LENGTH)
                .takes_value(true)
                .default_value("1000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::usize::MAX,
                        "Could not parse round length",
                        "Round length must be at least 1",
                    )
                })
                .help("Steps every chain takes per round"),
        )
        .arg(
            Arg::with_name(FLUSH_EVERY)
                .required(false)
                .long(FLUSH_EVERY)
                .short("f")
                .takes_value(true)
                .default_value("65536")
                .validator(|s| {
                    validate_range(
                        &s,
                        1,
                        std::u64::MAX,
                        "Could not parse flush interval",
                        "Flush interval must be at least 1",
                    )
                })
                .help("Rewrite the image after this many accepted mutations"),
        )
        .arg(
            Arg::with_name(SEPARATE)
                .long(SEPARATE)
                .help("Also write one PGM per channel next to the output"),
        )
        .arg(
            Arg::with_name(CLASSIC)
                .long(CLASSIC)
                .help("Sample uniformly instead of running the Metropolis sampler"),
        )
        .arg(
            Arg::with_name(SAMPLES)
                .required(false)
                .long(SAMPLES)
                .takes_value(true)
                .default_value("1000000")
                .validator(|s| validate_parse::<usize>(&s, "Could not parse sample count"))
                .help("Number of seeds to try with --classic"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> buddhabrot::Result<T> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| RenderError::InvalidConfig(format!("bad value for --{}", name)))
}

fn pair<T: FromStr>(matches: &ArgMatches, name: &str, separator: char) -> buddhabrot::Result<(T, T)> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, separator))
        .ok_or_else(|| RenderError::InvalidConfig(format!("bad value for --{}", name)))
}

fn config_from(matches: &ArgMatches) -> buddhabrot::Result<Config> {
    let (width, height) = pair::<usize>(matches, SIZE, 'x')?;
    // A preset wins over --center and --zoom.
    let target = if matches.is_present(PRESET) {
        let index = value::<usize>(matches, PRESET)?;
        Target::preset(index)
            .ok_or_else(|| RenderError::InvalidConfig(format!("no such preset: {}", index)))?
    } else {
        let (re, im) = pair::<f64>(matches, CENTER, ',')?;
        Target::new(re, im, value(matches, ZOOM)?)
    };

    Ok(Config {
        target,
        width,
        height,
        ensemble_size: value(matches, CHAINS)?,
        seed: value(matches, SEED)?,
        flush_every: value(matches, FLUSH_EVERY)?,
        ..Config::default()
    })
}

fn channel_path(output: &Path, channel: usize) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "buddha".to_string());
    output.with_file_name(format!("{}-{}.pgm", stem, CHANNEL_NAMES[channel]))
}

fn write_image(output: &Path, buffer: &AccumulationBuffer, separate: bool) -> buddhabrot::Result<()> {
    write_ppm(output, buffer)?;
    if separate {
        for channel in 0..CHANNELS {
            write_pgm(channel_path(output, channel), buffer, channel)?;
        }
    }
    Ok(())
}

fn render(matches: &ArgMatches) -> buddhabrot::Result<()> {
    let config = config_from(matches)?;
    let output = PathBuf::from(value::<String>(matches, OUTPUT)?);
    let separate = matches.is_present(SEPARATE);
    let threads = value(matches, THREADS)?;

    if matches.is_present(CLASSIC) {
        let samples: usize = value(matches, SAMPLES)?;
        let renderer = NaiveRenderer::new(&config, samples)?;
        let buffer = renderer.buddhabrot(threads)?;
        write_image(&output, &buffer, separate)?;
        info!(path = %output.display(), samples, "classic render written");
        return Ok(());
    }

    let rounds = value(matches, ROUNDS)?;
    let round_length = value(matches, ROUND_LENGTH)?;
    // Nothing raises this from the command line; an unbounded render
    // ends when the process is killed, leaving the last flushed image.
    let stop = AtomicBool::new(false);

    let mut session = RenderSession::bootstrap(config, threads)?;
    let accepted = session.run(rounds, round_length, threads, &stop, |buffer, accepted| {
        write_image(&output, buffer, separate)?;
        info!(path = %output.display(), accepted, "image flushed");
        Ok(())
    })?;
    info!(accepted, "render finished");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("buddhabrot=info,buddha=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = render(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
