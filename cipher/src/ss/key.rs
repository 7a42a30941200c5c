use crate::ss::block_size_of;
use crate::CipherError;
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::io::{Read, Write};
use std::str::FromStr;
use utils::BigUintExt;

#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

/// 公钥文件: 第一行`n`(小写十六进制), 第二行所有者, 第三行`block_size`(十进制, 可选)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    // n = p^2 * q
    n: BigUint,
    user: String,
    block_size: usize,
}

/// 私钥文件: 第一行`pq`, 第二行`d`(都是小写十六进制), 第三行`block_size`(十进制, 可选)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateKey {
    // pq = p * q
    pq: BigUint,
    // d * n = 1 % lcm(p-1, q-1)
    d: BigUint,
    block_size: usize,
}

impl PublicKey {
    /// note: not to check the `n` is a right modulus
    pub fn new_uncheck(n: BigUint, user: String, block_size: usize) -> Self {
        Self {
            n,
            user,
            block_size,
        }
    }

    /// 没有记录`block_size`的公钥, 按$\lfloor \sqrt{n} \rfloor$推导
    pub fn from_modulus(n: BigUint, user: String) -> Self {
        let block_size = block_size_of(&n.sqrt());
        Self::new_uncheck(n, user, block_size)
    }

    /// n
    pub fn modulus(&self) -> &BigUint {
        &self.n
    }

    pub fn user(&self) -> &str {
        self.user.as_str()
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// $m^n \mod n$
    pub fn encrypt_uncheck(&self, m: &BigUint) -> BigUint {
        BigUintExt(m).pow_mod(&self.n, &self.n)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CipherError> {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        s.parse()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CipherError> {
        write!(writer, "{:x}\n{}\n{}\n", self.n, self.user, self.block_size)?;
        Ok(())
    }
}

impl PrivateKey {
    /// note: not to check the `pq` and `d` are right key parameters
    pub fn new_uncheck(pq: BigUint, d: BigUint, block_size: usize) -> Self {
        Self { pq, d, block_size }
    }

    /// 没有记录`block_size`的私钥, 按`pq`推导
    pub fn from_parts(pq: BigUint, d: BigUint) -> Self {
        let block_size = block_size_of(&pq);
        Self::new_uncheck(pq, d, block_size)
    }

    /// pq
    pub fn modulus(&self) -> &BigUint {
        &self.pq
    }

    /// d
    pub fn exponent(&self) -> &BigUint {
        &self.d
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// $c^d \mod pq$
    pub fn decrypt_uncheck(&self, c: &BigUint) -> BigUint {
        BigUintExt(c).pow_mod(&self.d, &self.pq)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CipherError> {
        let mut s = String::new();
        reader.read_to_string(&mut s)?;
        s.parse()
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), CipherError> {
        write!(writer, "{:x}\n{:x}\n{}\n", self.pq, self.d, self.block_size)?;
        Ok(())
    }
}

/// 严格的十六进制解析: 不接受`0x`前缀, 符号和分隔符
pub(super) fn parse_hex(token: &str) -> Option<BigUint> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    BigUint::parse_bytes(token.as_bytes(), 16)
}

fn key_format_err(msg: String) -> CipherError {
    CipherError::InvalidKeyFormat(msg)
}

fn hex_line(line: Option<&str>, what: &str) -> Result<BigUint, CipherError> {
    let line = line
        .map(str::trim)
        .ok_or_else(|| key_format_err(format!("missing {what}")))?;
    let x = parse_hex(line).ok_or_else(|| key_format_err(format!("invalid {what} `{line}`")))?;

    if x.is_zero() {
        Err(key_format_err(format!("{what} cannot be zero")))
    } else {
        Ok(x)
    }
}

fn block_size_line<'a>(
    mut lines: impl Iterator<Item = &'a str>,
    modulus: &BigUint,
) -> Result<Option<usize>, CipherError> {
    let block_size = match lines.next().map(str::trim) {
        Some(line) if !line.is_empty() => Some(
            line.parse::<usize>()
                .map_err(|_| key_format_err(format!("invalid block size `{line}`")))?,
        ),
        _ => None,
    };

    if lines.any(|l| !l.trim().is_empty()) {
        return Err(key_format_err("unexpected trailing content".to_string()));
    }

    // 分块必须小于模数, 否则无法正确解密
    let max = block_size_of(modulus);
    match block_size {
        Some(x) if x > max => Err(key_format_err(format!(
            "block size `{x}` exceeds `{max}` allowed by the {}-bits modulus",
            modulus.bits()
        ))),
        _ => Ok(block_size),
    }
}

impl FromStr for PublicKey {
    type Err = CipherError;

    /// `n`只给出上界, `pq`未知时无法做更严格的检查
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let n = hex_line(lines.next(), "public modulus")?;
        let user = lines
            .next()
            .map(|l| l.trim_end().to_string())
            .ok_or_else(|| key_format_err("missing owner".to_string()))?;

        Ok(match block_size_line(lines, &n)? {
            Some(block_size) => Self::new_uncheck(n, user, block_size),
            None => Self::from_modulus(n, user),
        })
    }
}

impl FromStr for PrivateKey {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines();
        let pq = hex_line(lines.next(), "private modulus")?;
        let d = hex_line(lines.next(), "private exponent")?;

        Ok(match block_size_line(lines, &pq)? {
            Some(block_size) => Self::new_uncheck(pq, d, block_size),
            None => Self::from_parts(pq, d),
        })
    }
}

// 覆写BigUint的存储后置零
#[cfg(feature = "sec-zeroize")]
fn wipe(x: &mut BigUint) {
    let len = x.iter_u32_digits().len();
    x.assign_from_slice(vec![0u32; len].as_slice());
}

#[cfg(feature = "sec-zeroize")]
impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        wipe(&mut self.pq);
        wipe(&mut self.d);
        self.block_size.zeroize();
    }
}

#[cfg(feature = "sec-zeroize")]
impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl Display for PublicKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{n={:#x}, user={}, block_size={}}}",
            self.n, self.user, self.block_size
        )
    }
}

impl Display for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{pq={:#x}, d={:#x}, block_size={}}}",
            self.pq, self.d, self.block_size
        )
    }
}
