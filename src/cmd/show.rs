use crate::cmd::Cmd;
use anyhow::Context;
use cipher::ss::{PrivateKey, PublicKey};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde_json::{json, Value};
use std::path::PathBuf;

#[derive(Default)]
pub struct ShowCmd;

impl ShowCmd {
    pub fn new() -> Self {
        Self
    }

    fn public_json(key: &PublicKey) -> Value {
        json!({
            "user": key.user(),
            "n": format!("{:x}", key.modulus()),
            "bits": key.modulus().bits(),
            "block_size": key.block_size(),
        })
    }

    fn private_json(key: &PrivateKey) -> Value {
        json!({
            "pq": format!("{:x}", key.modulus()),
            "d": format!("{:x}", key.exponent()),
            "bits": key.modulus().bits(),
            "block_size": key.block_size(),
        })
    }
}

impl Cmd for ShowCmd {
    const NAME: &'static str = "show";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("print the key parameters as json")
            .arg(
                Arg::new("keyfile")
                    .value_name("KEYFILE")
                    .action(ArgAction::Set)
                    .required(true)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the key file path"),
            )
            .arg(
                Arg::new("private")
                    .long("private")
                    .short('p')
                    .action(ArgAction::SetTrue)
                    .help("the key file is a private key"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let Some(keyfile) = m.get_one::<PathBuf>("keyfile") else {
            anyhow::bail!("missing the key file");
        };

        let text = std::fs::read_to_string(keyfile)
            .with_context(|| format!("cannot read `{}`", keyfile.display()))?;
        let value = if m.get_flag("private") {
            Self::private_json(&text.parse()?)
        } else {
            Self::public_json(&text.parse()?)
        };

        println!("{}", serde_json::to_string_pretty(&value)?);
        Ok(())
    }
}
