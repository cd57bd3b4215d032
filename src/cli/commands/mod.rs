pub mod cmd_ls;
pub mod cmd_rm;
pub mod cmd_show;

use crate::glacier::limits::AllowedPartSizes;
use crate::upload::orchestrator::DEFAULT_CONCURRENCY;
use clap::{
    Arg, ColorChoice, Command,
    builder::ValueParser,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Part size in MiB, must be a power of two between 1 and 2048
pub fn validator_part_size() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<u64, String> {
        let mib = s
            .parse::<u64>()
            .map_err(|_| String::from("Not a valid number"))?;

        AllowedPartSizes::from_mib(mib).ok_or_else(|| {
            format!(
                "Invalid part size: {mib} MiB, allowed: {}",
                AllowedPartSizes::mib_list()
            )
        })
    })
}

pub fn validator_is_file() -> ValueParser {
    ValueParser::from(move |s: &str| -> std::result::Result<PathBuf, String> {
        if fs::metadata(s).is_ok_and(|metadata| metadata.is_file()) {
            return Ok(PathBuf::from(s));
        }

        Err(format!("Invalid file path or file does not exist: '{s}'"))
    })
}

pub fn new(config_path: &Path) -> Command {
    // get config file path (default: ~/.config/glacierm/config.yml)
    let config_file_path = config_path.join("config.yml");

    // get the ledger path (default: ~/.config/glacierm/uploaded.json)
    let ledger_path = config_path.join("uploaded.json");

    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("glacierm")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload archives to Glacier vaults")
        .subcommand_negates_reqs(true)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("quiet")
            .long("quiet")
            .short('q')
            .help("Don't show progress bar")
            .num_args(0)
        )
        .arg(
            Arg::new("description")
            .long("desc")
            .short('d')
            .help("Archive description")
            .default_value("")
            .num_args(1)
        )
        .arg(
            Arg::new("multipart")
            .long("multipart")
            .short('m')
            .help("Upload the archive in parts")
            .num_args(0)
        )
        .arg(
            Arg::new("part-size")
            .long("part-size")
            .short('s')
            .help("Part size in MiB, a power of two from 1 to 2048 (multipart only)")
            .default_value("4")
            .value_name("MiB")
            .value_parser(validator_part_size())
            .num_args(1)
        )
        .arg(
            Arg::new("number")
            .help("Number of parts uploaded concurrently")
            .short('n')
            .long("number")
            .default_value(DEFAULT_CONCURRENCY.to_string())
            .value_parser(clap::value_parser!(u8).range(1..=255))
            .num_args(1)
        )
        .arg(
            Arg::new("retries")
            .help("Retries of a part on transient errors, with exponential backoff")
            .short('r')
            .long("retries")
            .default_value("0")
            .value_parser(clap::value_parser!(u32).range(0..=10))
            .num_args(1)
        )
        .arg(
            Arg::new("ledger")
            .help("JSON file recording the uploaded archives")
            .short('l')
            .long("ledger")
            .default_value(ledger_path.into_os_string())
            .value_parser(clap::value_parser!(PathBuf))
            .value_name("uploaded.json")
            .num_args(1)
        )
        .arg(
            Arg::new("config")
            .default_value(config_file_path.into_os_string())
            .long("config")
            .num_args(1)
            .short('c')
            .global(true)
            .value_parser(validator_is_file())
            .value_name("config.yml")
        )
        .arg(
            Arg::new("arguments")
            .help("/path/to/file <host>/<vault>")
            .required(true)
            .num_args(2)
        )
        .arg(
            Arg::new("verbose")
            .help("Verbosity level")
            .short('v')
            .long("verbose")
            .global(true)
            .action(clap::ArgAction::Count)
        )
        .subcommand(cmd_ls::command())
        .subcommand(cmd_rm::command())
        .subcommand(cmd_show::command())
}
