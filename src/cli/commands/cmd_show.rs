use clap::Command;

pub fn command() -> Command {
    Command::new("show").about("List the hosts of the config file")
}
