use std::path::{Path, PathBuf};

use anyhow::Context;
use config::Config;
use serde::{Deserialize, Serialize};

/// 优先级: 命令行参数 > 环境变量`SS_*` > 配置文件 > 默认值
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SSConfig {
    // total key bits of the public modulus
    pub bits: usize,

    // Miller-Rabin test rounds
    pub iters: usize,

    pub pubkey: PathBuf,

    pub privkey: PathBuf,
}

impl Default for SSConfig {
    fn default() -> Self {
        Self {
            bits: 256,
            iters: 50,
            pubkey: PathBuf::from("ss.pub"),
            privkey: PathBuf::from("ss.priv"),
        }
    }
}

impl SSConfig {
    /// `~/.config/ss/config.json`
    pub fn default_file() -> Option<PathBuf> {
        home::home_dir().map(|mut path| {
            path.push(".config");
            path.push("ss");
            path.push("config.json");
            path
        })
    }

    /// 加载配置, `f`为`None`时使用`default_file`, 文件不存在时忽略
    pub fn load(f: Option<&Path>) -> anyhow::Result<Self> {
        let default_config = Config::try_from(&SSConfig::default())?;
        let mut config = Config::builder().add_source(default_config);

        let file = f.map(Path::to_path_buf).or_else(Self::default_file);
        if let Some(file) = file.as_ref() {
            config = config.add_source(config::File::from(file.as_path()).required(false));
        }

        let config = config
            .add_source(
                config::Environment::with_prefix("SS")
                    .prefix_separator("_")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| match file.as_ref() {
                Some(f) => format!("cannot load config `{}`", f.display()),
                None => "cannot load config".to_string(),
            })?;

        let ssconfig: SSConfig = config.try_deserialize()?;
        log::trace!("{:?}", ssconfig);

        Ok(ssconfig)
    }
}
