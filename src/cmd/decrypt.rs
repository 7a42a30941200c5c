use crate::cmd::{open_input, open_output, Cmd, SSConfig};
use anyhow::Context;
use cipher::ss::{PrivateKey, SSDecrypt};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::path::PathBuf;

pub struct DecryptCmd {
    config: SSConfig,
}

impl DecryptCmd {
    pub fn new(config: SSConfig) -> Self {
        Self { config }
    }
}

impl Cmd for DecryptCmd {
    const NAME: &'static str = "decrypt";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("decrypt the hex ciphertext with the private key")
            .arg(
                Arg::new("input")
                    .long("input")
                    .short('i')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the ciphertext file, default is stdin"),
            )
            .arg(
                Arg::new("output")
                    .long("output")
                    .short('o')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the plaintext file, default is stdout"),
            )
            .arg(
                Arg::new("privkey")
                    .long("privkey")
                    .short('n')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the private key file path"),
            )
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .action(ArgAction::SetTrue)
                    .help("print the private key parameters"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let keyfile = m.get_one::<PathBuf>("privkey").unwrap_or(&self.config.privkey);
        let key = File::open(keyfile)
            .map_err(anyhow::Error::from)
            .and_then(|mut f| Ok(PrivateKey::read_from(&mut f)?))
            .with_context(|| format!("cannot load the private key `{}`", keyfile.display()))?;

        if m.get_flag("verbose") {
            log::info!("pq ({} bits) = {}", key.modulus().bits(), key.modulus());
            log::info!("d  ({} bits) = {}", key.exponent().bits(), key.exponent());
            log::info!("block size = {} bytes", key.block_size());
        }

        let dec = SSDecrypt::new(key)?;
        let (mut input, mut output) = (
            open_input(m.get_one::<PathBuf>("input"))?,
            open_output(m.get_one::<PathBuf>("output"))?,
        );

        let blocks = dec.decrypt_stream(&mut input, &mut output)?;
        log::debug!("decrypted {blocks} blocks");
        Ok(())
    }
}
