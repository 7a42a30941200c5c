//! Schmidt-Samoa
//!
//! - 随机选择两个质数$p$和$q$($p\neq q$), 且满足$p \nmid q-1$, $q \nmid p-1$, 公钥$n=p^2 q$;
//! - 私钥的模数为$pq$, 指数$d$满足: $d \cdot n \equiv 1 \mod \lambda(pq)$, 其中$\lambda(pq) = lcm(p-1, q-1)$;
//!
//! 加密: $c = m ^ n \mod n$;
//!
//! 解密: $m = c^d \mod pq$;
//!
//! 原理: 对于$m \lt pq$, $m^{n \cdot d} \equiv m \mod p$且$\mod q$, 由CRT得$\mod pq$成立.
//!
//! 明文按`block_size`字节分块, 每块首字节为`0xFF`哨兵, 其余为数据, 最后一块右侧补零;
//! 密文为每块一行的小写十六进制整数.
//!

mod key;
pub use key::{PrivateKey, PublicKey};

mod keygen;
pub use keygen::{make_private, make_public, KeyPair, KeyPairBuilder, PrimeFactors};

mod frame;
pub use frame::{block_size_of, frame, unframe};

mod stream;
pub use stream::{SSDecrypt, SSEncrypt};
