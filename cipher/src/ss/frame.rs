use crate::CipherError;
use num_bigint::BigUint;

#[cfg(feature = "sec-zeroize")]
use zeroize::Zeroize;

const SENTINEL: u8 = 0xFF;

/// 模数的比特长度减一再除以8, 保证任意`block_size`字节的块都小于模数
pub fn block_size_of(modulus: &BigUint) -> usize {
    (modulus.bits().saturating_sub(1) / 8) as usize
}

/// block = 0xFF || data || 0x00...0x00, 按大端序解释为整数
///
/// `data`的长度不能超过`block_size - 1`.
pub fn frame(data: &[u8], block_size: usize) -> Result<BigUint, CipherError> {
    if block_size < 2 {
        return Err(CipherError::BlockTooSmall(block_size));
    }

    if data.len() >= block_size {
        return Err(CipherError::PayloadTooLong {
            max: block_size - 1,
            real: data.len(),
        });
    }

    let mut block = vec![0u8; block_size];
    block[0] = SENTINEL;
    block[1..=data.len()].copy_from_slice(data);
    let m = BigUint::from_bytes_be(block.as_slice());

    #[cfg(feature = "sec-zeroize")]
    block.zeroize();

    Ok(m)
}

/// `frame`的逆过程: 左侧补零到`block_size`字节后去掉首字节, 返回`block_size - 1`字节.
///
/// 比`block_size`宽的整数(被篡改的密文)只保留低`block_size`字节.
pub fn unframe(m: &BigUint, block_size: usize) -> Vec<u8> {
    if block_size == 0 {
        return Vec::new();
    }

    let mut em = m.to_bytes_be();
    let len = em.len();
    if len > block_size {
        em.drain(..(len - block_size));
    } else {
        em.resize(block_size, 0);
        em.rotate_right(block_size - len);
    }

    em.remove(0);
    em
}
