use clap::{Arg, Command};

pub fn command() -> Command {
    Command::new("ls")
        .about("List the vaults of a host")
        .arg(
            Arg::new("arguments")
                .help("<host> as defined in the config file")
                .required(true)
                .num_args(1),
        )
}
