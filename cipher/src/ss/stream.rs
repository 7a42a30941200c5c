use crate::ss::key::parse_hex;
use crate::ss::{block_size_of, frame, unframe, PrivateKey, PublicKey};
use crate::{CipherError, Decrypt, Encrypt};
use num_bigint::BigUint;
use std::io::{BufRead, ErrorKind, Read, Write};

#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

#[derive(Clone)]
pub struct SSEncrypt {
    key: PublicKey,
}

#[derive(Clone)]
pub struct SSDecrypt {
    key: PrivateKey,
}

// 读满`buf`或者到达EOF
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match reader.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(k) => n += k,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}

fn check_block_size(block_size: usize, modulus: &BigUint) -> Result<(), CipherError> {
    if block_size < 2 {
        return Err(CipherError::BlockTooSmall(block_size));
    }

    if block_size > block_size_of(modulus) {
        return Err(CipherError::InvalidKeyFormat(format!(
            "block size `{block_size}` is too large for the {}-bits modulus",
            modulus.bits()
        )));
    }

    Ok(())
}

impl SSEncrypt {
    pub fn new(key: PublicKey) -> Result<Self, CipherError> {
        check_block_size(key.block_size(), key.modulus())?;

        Ok(Self { key })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.key
    }

    pub fn block_size(&self) -> usize {
        self.key.block_size()
    }

    /// 每次读`block_size - 1`字节加密为一行十六进制密文, 返回加密的块数.
    ///
    /// 最后不足一块的数据右侧补零后加密, 空输入不输出任何内容.
    pub fn encrypt_stream<IR: Read, OW: Write>(
        &self,
        msg: &mut IR,
        cipher: &mut OW,
    ) -> Result<usize, CipherError> {
        let mut buf = vec![0u8; self.block_size() - 1];
        let res = self.encrypt_inner(msg, cipher, buf.as_mut_slice());

        #[cfg(feature = "sec-zeroize")]
        buf.zeroize();

        res
    }

    fn encrypt_inner<IR: Read, OW: Write>(
        &self,
        msg: &mut IR,
        cipher: &mut OW,
        buf: &mut [u8],
    ) -> Result<usize, CipherError> {
        let mut blocks = 0;
        loop {
            let n = read_full(msg, buf)?;
            if n == 0 {
                break;
            }

            let m = frame(&buf[..n], self.block_size())?;
            let c = self.key.encrypt_uncheck(&m);
            writeln!(cipher, "{:x}", c)?;
            blocks += 1;

            if n < buf.len() {
                break;
            }
        }

        cipher.flush()?;
        log::trace!("encrypted {blocks} blocks of {} bytes", self.block_size());
        Ok(blocks)
    }
}

impl SSDecrypt {
    pub fn new(key: PrivateKey) -> Result<Self, CipherError> {
        check_block_size(key.block_size(), key.modulus())?;

        Ok(Self { key })
    }

    pub fn private_key(&self) -> &PrivateKey {
        &self.key
    }

    pub fn block_size(&self) -> usize {
        self.key.block_size()
    }

    /// 逐行解密, 每行输出`block_size - 1`字节, 返回解密的块数.
    ///
    /// 空行被跳过; 遇到非法行时, 之前解密的数据已全部写入`msg`, 然后返回`MalformedCiphertext`.
    pub fn decrypt_stream<IR: BufRead, OW: Write>(
        &self,
        cipher: &mut IR,
        msg: &mut OW,
    ) -> Result<usize, CipherError> {
        let (mut line, mut lineno, mut blocks) = (Vec::with_capacity(128), 0, 0);
        loop {
            line.clear();
            if cipher.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            lineno += 1;

            let token = match std::str::from_utf8(&line) {
                Ok(s) => s.trim(),
                Err(_) => {
                    msg.flush()?;
                    return Err(CipherError::MalformedCiphertext {
                        line: lineno,
                        token: String::from_utf8_lossy(&line).trim().to_string(),
                    });
                }
            };

            if token.is_empty() {
                continue;
            }

            let Some(c) = parse_hex(token) else {
                msg.flush()?;
                return Err(CipherError::MalformedCiphertext {
                    line: lineno,
                    token: token.to_string(),
                });
            };

            let m = self.key.decrypt_uncheck(&c);
            #[allow(unused_mut)]
            let mut block = unframe(&m, self.block_size());
            msg.write_all(block.as_slice())?;
            blocks += 1;

            #[cfg(feature = "sec-zeroize")]
            block.zeroize();
        }

        msg.flush()?;
        log::trace!("decrypted {blocks} blocks of {} bytes", self.block_size());
        Ok(blocks)
    }
}

impl Encrypt for SSEncrypt {
    fn encrypt(&self, mut plaintext: &[u8], ciphertext: &mut Vec<u8>) -> Result<(), CipherError> {
        self.encrypt_stream(&mut plaintext, ciphertext).map(|_| ())
    }
}

impl Decrypt for SSDecrypt {
    fn decrypt(&self, mut ciphertext: &[u8], plaintext: &mut Vec<u8>) -> Result<(), CipherError> {
        self.decrypt_stream(&mut ciphertext, plaintext).map(|_| ())
    }
}
