use crate::cli::{
    Config, Host, actions::Action, commands, dispatch, globals::GlobalArgs,
    location::VaultLocation,
};
use crate::glacier::{Credentials, Glacier};
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use colored::Colorize;
use std::{
    fs,
    path::{Path, PathBuf},
    process::exit,
};

pub fn get_config_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().map_or_else(|| PathBuf::from("/tmp"), |h| h);

    let config_path = Path::new(&home_dir).join(".config").join("glacierm");
    fs::create_dir_all(&config_path)
        .context(format!("unable to create: {}", &config_path.display()))?;

    Ok(config_path)
}

/// # Errors
/// Will return an error if the config file is not found
pub fn start() -> Result<(Glacier, Action, GlobalArgs)> {
    let config_path = get_config_path()?;

    // start the command line interface
    let cmd = commands::new(&config_path);

    // get the matches
    let matches = cmd.get_matches();

    let verbosity_level = match matches.get_one::<u8>("verbose").copied().unwrap_or(0) {
        0 => log::LevelFilter::Off,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };

    env_logger::Builder::new()
        .filter_level(verbosity_level)
        .init();

    log::info!("config path: {}", config_path.display());

    let global_args = global_args(&matches);

    // Config file is required
    let config_file: PathBuf = matches.get_one::<PathBuf>("config").map_or_else(
        || {
            eprintln!("no config file found");
            exit(1);
        },
        Into::into,
    );

    // load the config file
    let config = Config::new(config_file)?;

    // show config
    if matches.subcommand_matches("show").is_some() {
        println!("Hosts:");
        for key in config.hosts.keys() {
            println!("   - {key}");
        }
        exit(0);
    }

    let location = vault_location(&matches)?;

    log::info!("location: {location:?}");

    // HOST: get it from the config file
    let host = get_host(&config, &config_path, &location.host)?;

    // REGION
    let region = host.get_region()?;

    // AUTH
    let credentials = Credentials::new(&host.access_key, &host.secret_key);

    let glacier = Glacier::new(&credentials, &region, host.account_id.clone());

    log::debug!("Glacier:\n{glacier}");

    // create the action
    let action = dispatch::dispatch(location.vault, &matches)?;

    log::debug!("globals: {global_args:#?}, action: {action:#?}");

    Ok((glacier, action, global_args))
}

fn global_args(matches: &ArgMatches) -> GlobalArgs {
    let mut global_args = GlobalArgs::new();

    if let Some(retries) = matches.get_one::<u32>("retries") {
        global_args.set_retries(*retries);
    }

    if let Some(workers) = matches.get_one::<u8>("number") {
        global_args.set_workers(usize::from(*workers));
    }

    global_args.quiet = matches.get_flag("quiet");

    global_args
}

// <host>/<vault> is the first argument of the subcommands and the second one of an upload
fn vault_location(matches: &ArgMatches) -> Result<VaultLocation> {
    let (location, require_vault) = match matches.subcommand() {
        Some(("ls", sub_m)) => (sub_m.get_one::<String>("arguments"), false),
        Some(("rm", sub_m)) => (sub_m.get_one::<String>("arguments"), true),
        _ => (
            matches
                .get_many::<String>("arguments")
                .unwrap_or_default()
                .nth(1),
            true,
        ),
    };

    let location = location.ok_or_else(|| {
        anyhow!(
            "No \"host\" found, try: /path/to/file <host>/<vault>, For more information try {}",
            "--help".green()
        )
    })?;

    VaultLocation::parse(location, require_vault)
}

fn get_host<'a>(config: &'a Config, config_path: &Path, name: &str) -> Result<&'a Host> {
    config.get_host(name).map_err(|_| {
        anyhow!(
            "Could not find host: \"{}\". Check config file {}/config.yml, For more information try {}",
            name.red(),
            config_path.display(),
            "--help".green()
        )
    })
}
