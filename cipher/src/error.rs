use thiserror::Error;

#[derive(Debug, Error)]
pub enum CipherError {
    /// 密钥文本格式错误
    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("The modular inverse of the modulus does not exist")]
    ModularInverseNotFound,

    /// 第`line`行的密文不是合法的十六进制整数
    #[error("Malformed ciphertext `{token}` at line {line}")]
    MalformedCiphertext { line: usize, token: String },

    #[error("Invalid prime size `{0}` bits")]
    InvalidPrimeBits(usize),

    /// 不合法的密钥长度
    #[error("Invalid key size `{real}` bits, need at least `{min}` bits")]
    InvalidKeySize { min: usize, real: usize },

    #[error("Block size `{0}` bytes is too small to carry any payload")]
    BlockTooSmall(usize),

    #[error("Payload of `{real}` bytes exceeds the block payload `{max}` bytes")]
    PayloadTooLong { max: usize, real: usize },

    #[error("Gave up after {0} attempts")]
    AttemptsExhausted(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
