use crate::cmd::{open_input, open_output, Cmd, SSConfig};
use anyhow::Context;
use cipher::ss::{PublicKey, SSEncrypt};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::path::PathBuf;

pub struct EncryptCmd {
    config: SSConfig,
}

impl EncryptCmd {
    pub fn new(config: SSConfig) -> Self {
        Self { config }
    }
}

impl Cmd for EncryptCmd {
    const NAME: &'static str = "encrypt";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("encrypt data with the public key, one hex number per block")
            .arg(
                Arg::new("input")
                    .long("input")
                    .short('i')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the plaintext file, default is stdin"),
            )
            .arg(
                Arg::new("output")
                    .long("output")
                    .short('o')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the ciphertext file, default is stdout"),
            )
            .arg(
                Arg::new("pubkey")
                    .long("pubkey")
                    .short('n')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the public key file path"),
            )
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .action(ArgAction::SetTrue)
                    .help("print the public key parameters"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let keyfile = m.get_one::<PathBuf>("pubkey").unwrap_or(&self.config.pubkey);
        let key = File::open(keyfile)
            .map_err(anyhow::Error::from)
            .and_then(|mut f| Ok(PublicKey::read_from(&mut f)?))
            .with_context(|| format!("cannot load the public key `{}`", keyfile.display()))?;

        if m.get_flag("verbose") {
            log::info!("user = {}", key.user());
            log::info!("n ({} bits) = {}", key.modulus().bits(), key.modulus());
            log::info!("block size = {} bytes", key.block_size());
        }

        let enc = SSEncrypt::new(key)?;
        let (mut input, mut output) = (
            open_input(m.get_one::<PathBuf>("input"))?,
            open_output(m.get_one::<PathBuf>("output"))?,
        );

        let blocks = enc.encrypt_stream(&mut input, &mut output)?;
        log::debug!("encrypted {blocks} blocks");
        Ok(())
    }
}
