use aes::cipher::{BlockDecryptMut, KeyIvInit, block_padding::NoPadding};
use anyhow::{Result, anyhow, bail};

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

pub const BLOCK_SIZE: usize = 16;

/// Per-job decrypter built from the raw key bytes fetched once at job start.
/// Every segment is decrypted independently as its own ciphertext with a
/// fixed all-zero iv; an iv attribute on the key marker is never read.
#[derive(Clone)]
pub enum Decrypter {
    Aes128([u8; BLOCK_SIZE]),
    None,
}

impl Decrypter {
    pub fn new_aes_128(key: &[u8]) -> Result<Self> {
        if key.len() != BLOCK_SIZE {
            bail!(
                "expected a {} byte AES-128 key, got {} bytes.",
                BLOCK_SIZE,
                key.len()
            );
        }

        let mut buf = [0_u8; BLOCK_SIZE];
        buf.copy_from_slice(key);
        Ok(Self::Aes128(buf))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    pub fn decrypt(&self, mut data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Self::Aes128(key) => {
                let iv = [0_u8; BLOCK_SIZE];
                Aes128CbcDec::new(key.into(), &iv.into())
                    .decrypt_padded_mut::<NoPadding>(&mut data)
                    .map_err(|e| anyhow!("failed to decrypt segment: {}", e))?;
                unpad(&mut data)?;
                Ok(data)
            }
            Self::None => Ok(data),
        }
    }
}

/// PKCS#7: the value of the final byte is the pad length.
fn unpad(data: &mut Vec<u8>) -> Result<()> {
    match data.last() {
        Some(&pad) if pad as usize <= data.len() => {
            data.truncate(data.len() - pad as usize);
            Ok(())
        }
        Some(&pad) => bail!(
            "invalid pkcs7 padding (pad length {} exceeds {} bytes).",
            pad,
            data.len()
        ),
        None => bail!("cannot unpad an empty segment."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::{BlockEncryptMut, block_padding::Pkcs7};

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    const KEY: [u8; BLOCK_SIZE] = *b"0123456789abcdef";

    fn encrypt(plaintext: &[u8]) -> Vec<u8> {
        let iv = [0_u8; BLOCK_SIZE];
        let mut buf = vec![0_u8; plaintext.len() + (BLOCK_SIZE - plaintext.len() % BLOCK_SIZE)];
        Aes128CbcEnc::new(&KEY.into(), &iv.into())
            .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, &mut buf)
            .unwrap();
        buf
    }

    #[test]
    fn round_trips_across_block_boundaries() {
        let decrypter = Decrypter::new_aes_128(&KEY).unwrap();

        for n in [0, 15, 16, 17, 1000] {
            let plaintext = (0..n).map(|i| (i % 251) as u8).collect::<Vec<_>>();
            let decrypted = decrypter.decrypt(encrypt(&plaintext)).unwrap();
            assert_eq!(decrypted, plaintext, "round trip failed for {} bytes", n);
        }
    }

    #[test]
    fn oversized_pad_length_is_an_error() {
        // A raw (unpadded) block whose plaintext ends in 0xff decrypts to a
        // claimed pad length of 255, far past the 16 byte buffer.
        let iv = [0_u8; BLOCK_SIZE];
        let plaintext = [0xff_u8; BLOCK_SIZE];
        let mut ciphertext = vec![0_u8; BLOCK_SIZE];
        Aes128CbcEnc::new(&KEY.into(), &iv.into())
            .encrypt_padded_b2b_mut::<NoPadding>(&plaintext, &mut ciphertext)
            .unwrap();

        let decrypter = Decrypter::new_aes_128(&KEY).unwrap();
        assert!(decrypter.decrypt(ciphertext).is_err());
    }

    #[test]
    fn partial_blocks_are_an_error() {
        let decrypter = Decrypter::new_aes_128(&KEY).unwrap();
        assert!(decrypter.decrypt(vec![0_u8; 17]).is_err());
    }

    #[test]
    fn wrong_key_size_is_rejected() {
        assert!(Decrypter::new_aes_128(b"short").is_err());
    }

    #[test]
    fn none_decrypter_passes_bytes_through() {
        let data = b"plain ts data".to_vec();
        assert_eq!(Decrypter::None.decrypt(data.clone()).unwrap(), data);
    }
}
