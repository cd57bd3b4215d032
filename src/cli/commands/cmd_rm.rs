use clap::{Arg, Command};

pub fn command() -> Command {
    Command::new("rm")
        .about("Abort a multipart upload")
        .arg(
            Arg::new("arguments")
                .help("<host>/<vault>")
                .required(true)
                .num_args(1),
        )
        .arg(
            Arg::new("UploadId")
                .help("Id of the multipart upload to abort")
                .long("upload-id")
                .short('u')
                .required(true)
                .num_args(1),
        )
}
