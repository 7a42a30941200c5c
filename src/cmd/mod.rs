use anyhow::Context;
use clap::{ArgMatches, Command};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::SSError;

pub trait Cmd {
    const NAME: &'static str;

    fn cmd() -> Command;

    fn run(&self, m: &ArgMatches) -> anyhow::Result<()>;
}

pub mod config;
pub use config::SSConfig;

mod keygen;
pub use keygen::KeygenCmd;

mod encrypt;
pub use encrypt::EncryptCmd;

mod decrypt;
pub use decrypt::DecryptCmd;

mod show;
pub use show::ShowCmd;

/// 未指定路径时读标准输入
fn open_input(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn BufRead>> {
    Ok(match path {
        Some(p) => {
            let f = File::open(p).with_context(|| format!("cannot open `{}`", p.display()))?;
            Box::new(BufReader::new(f))
        }
        None => Box::new(BufReader::new(std::io::stdin().lock())),
    })
}

/// 未指定路径时写标准输出
fn open_output(path: Option<&PathBuf>) -> anyhow::Result<Box<dyn Write>> {
    Ok(match path {
        Some(p) => {
            let f = File::create(p).with_context(|| format!("cannot create `{}`", p.display()))?;
            Box::new(BufWriter::new(f))
        }
        None => Box::new(BufWriter::new(std::io::stdout().lock())),
    })
}

/// 创建只有所有者可读写的密钥文件, `force`为false时不覆盖已存在的文件
fn create_key_file(path: &Path, force: bool) -> anyhow::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true);
    if force {
        opts.create(true).truncate(true);
    } else {
        opts.create_new(true);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }

    let f = opts.open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::AlreadyExists {
            anyhow::Error::from(SSError::FileExists(path.display().to_string()))
        } else {
            anyhow::Error::from(e).context(format!("cannot create `{}`", path.display()))
        }
    })?;

    // 覆盖已存在的文件时`mode`不生效
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        f.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("cannot change the mode of `{}`", path.display()))?;
    }

    Ok(f)
}
