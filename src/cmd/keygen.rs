use crate::cmd::{create_key_file, Cmd, SSConfig};
use crate::error::SSError;
use anyhow::Context;
use cipher::ss::{KeyPair, KeyPairBuilder};
use cipher::SeededRand;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub struct KeygenCmd {
    config: SSConfig,
}

impl KeygenCmd {
    pub fn new(config: SSConfig) -> Self {
        Self { config }
    }

    fn seed(m: &ArgMatches) -> u64 {
        match m.get_one::<u64>("seed") {
            Some(&seed) => seed,
            None => chrono::Utc::now().timestamp().unsigned_abs(),
        }
    }

    fn user(m: &ArgMatches) -> anyhow::Result<String> {
        match m.get_one::<String>("user") {
            Some(user) => Ok(user.clone()),
            None => std::env::var("USER").map_err(|_| SSError::MissingUser.into()),
        }
    }

    /// 先创建两个密钥文件再写入, 任一步失败时删除已创建的文件
    fn save(kp: &KeyPair, pubkey: &Path, privkey: &Path, force: bool) -> anyhow::Result<()> {
        let pub_file = create_key_file(pubkey, force)?;
        let res = create_key_file(privkey, force).and_then(|priv_file| {
            let res = Self::write_key(pub_file, pubkey, |w| Ok(kp.public_key().write_to(w)?))
                .and_then(|_| {
                    Self::write_key(priv_file, privkey, |w| Ok(kp.private_key().write_to(w)?))
                });
            if res.is_err() {
                let _ = std::fs::remove_file(privkey);
            }
            res
        });

        if res.is_err() {
            let _ = std::fs::remove_file(pubkey);
        }
        res
    }

    fn write_key(
        file: File,
        path: &Path,
        f: impl FnOnce(&mut BufWriter<File>) -> anyhow::Result<()>,
    ) -> anyhow::Result<()> {
        let mut w = BufWriter::new(file);
        f(&mut w)?;
        w.flush()
            .with_context(|| format!("cannot write `{}`", path.display()))?;
        Ok(())
    }

    fn show(kp: &KeyPair) {
        let (f, pk, sk) = (kp.factors(), kp.public_key(), kp.private_key());
        log::info!("user = {}", pk.user());
        log::info!("p  ({} bits) = {}", f.p.bits(), f.p);
        log::info!("q  ({} bits) = {}", f.q.bits(), f.q);
        log::info!("n  ({} bits) = {}", pk.modulus().bits(), pk.modulus());
        log::info!("pq ({} bits) = {}", sk.modulus().bits(), sk.modulus());
        log::info!("d  ({} bits) = {}", sk.exponent().bits(), sk.exponent());
        log::info!("block size = {} bytes", sk.block_size());
    }
}

impl Cmd for KeygenCmd {
    const NAME: &'static str = "keygen";

    fn cmd() -> Command {
        Command::new(Self::NAME)
            .about("generate a public/private key pair")
            .arg(
                Arg::new("bits")
                    .long("bits")
                    .short('b')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(usize))
                    .help("to specify the public modulus bits length, at least 24"),
            )
            .arg(
                Arg::new("iters")
                    .long("iters")
                    .short('i')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(usize))
                    .help("to specify the Miller-Rabin test rounds"),
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
                Arg::new("privkey")
                    .long("privkey")
                    .short('d')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(PathBuf))
                    .help("to specify the private key file path"),
            )
            .arg(
                Arg::new("seed")
                    .long("seed")
                    .short('s')
                    .action(ArgAction::Set)
                    .required(false)
                    .value_parser(value_parser!(u64))
                    .help("to specify the random seed, default is the current unix time"),
            )
            .arg(
                Arg::new("user")
                    .long("user")
                    .short('u')
                    .action(ArgAction::Set)
                    .required(false)
                    .help("to specify the key owner, default is `$USER`"),
            )
            .arg(
                Arg::new("force")
                    .long("force")
                    .short('f')
                    .action(ArgAction::SetTrue)
                    .help("overwrite the existing key files"),
            )
            .arg(
                Arg::new("verbose")
                    .long("verbose")
                    .short('v')
                    .action(ArgAction::SetTrue)
                    .help("print the key parameters"),
            )
    }

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()> {
        let bits = m.get_one::<usize>("bits").copied().unwrap_or(self.config.bits);
        let iters = m.get_one::<usize>("iters").copied().unwrap_or(self.config.iters);
        let pubkey = m.get_one::<PathBuf>("pubkey").unwrap_or(&self.config.pubkey);
        let privkey = m.get_one::<PathBuf>("privkey").unwrap_or(&self.config.privkey);
        let (seed, user, force) = (Self::seed(m), Self::user(m)?, m.get_flag("force"));

        log::debug!("generate {bits}-bits key pair with seed {seed}");
        let mut rng = SeededRand::new(seed);
        let kp = KeyPairBuilder::new(bits)
            .test_rounds(iters)
            .user(user)
            .build(&mut rng)?;

        Self::save(&kp, pubkey, privkey, force)?;

        if m.get_flag("verbose") {
            Self::show(&kp);
        }

        log::info!(
            "saved the public key to `{}` and the private key to `{}`",
            pubkey.display(),
            privkey.display()
        );
        Ok(())
    }
}
