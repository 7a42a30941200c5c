use clap::{value_parser, Arg, ArgAction, Command};
use log::LevelFilter;
use ss::cmd::{Cmd, DecryptCmd, EncryptCmd, KeygenCmd, SSConfig, ShowCmd};
use ss::error::SSError;
use ss::log_error;
use std::path::PathBuf;

fn main() {
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let version = env!("SS_VERSION_INFO");
    let app = Command::new("ss")
        .version(version)
        .about("Schmidt-Samoa public key encryption")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .action(ArgAction::Set)
                .required(false)
                .value_parser(value_parser!(PathBuf))
                .help("to specify the config file, default is `~/.config/ss/config.json`"),
        )
        .subcommand(KeygenCmd::cmd())
        .subcommand(EncryptCmd::cmd())
        .subcommand(DecryptCmd::cmd())
        .subcommand(ShowCmd::cmd())
        .get_matches();

    if let Some((s, m)) = app.subcommand() {
        let config = app.get_one::<PathBuf>("config").map(PathBuf::as_path);
        let res = SSConfig::load(config).and_then(|config| match s {
            KeygenCmd::NAME => KeygenCmd::new(config).run(m),
            EncryptCmd::NAME => EncryptCmd::new(config).run(m),
            DecryptCmd::NAME => DecryptCmd::new(config).run(m),
            ShowCmd::NAME => ShowCmd::new().run(m),
            name => Err(SSError::NotSupport(format!("unsupport for {name}")).into()),
        });

        if log_error(res).is_none() {
            std::process::exit(1);
        }
    } else {
        println!("{} {}", env!("CARGO_PKG_NAME"), version);
    }
}
