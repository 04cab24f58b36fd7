use aes::Aes256;
use alloy_primitives::Address;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use k256::ecdsa::SigningKey;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::KeyError;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// PBKDF2 rounds used to stretch the passphrase into the AES key.
pub(crate) const PBKDF2_ROUNDS: u32 = 100_000;

/// `0x` followed by 64 hex digits.
const PRIVATE_KEY_CHARS: usize = 66;

/// Address controlled by a hex-encoded secp256k1 private key.
pub(crate) fn address_from_private_key(private_key: &str) -> Result<Address, KeyError> {
    let private_key = private_key.trim();
    let private_key = private_key.strip_prefix("0x").unwrap_or(private_key);
    if private_key.is_empty() {
        return Err(KeyError::Missing);
    }

    let bytes = hex::decode(private_key)?;
    let signing_key = SigningKey::from_slice(&bytes).map_err(|_| KeyError::InvalidKey)?;
    Ok(Address::from_private_key(&signing_key))
}

/// AES-256 key for `passphrase`, salted with the IV.
fn derive_key(passphrase: &str, iv: &[u8]) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), iv, PBKDF2_ROUNDS, &mut key);
    key
}

/// Encrypts a private key for storage in `OWNER_KEY`. Returns the hex
/// ciphertext.
pub(crate) fn encrypt_private_key(
    private_key: &str,
    passphrase: &str,
    iv: &str,
) -> Result<String, KeyError> {
    let iv = hex::decode(iv.trim())?;
    let key = derive_key(passphrase, &iv);

    let ciphertext = Aes256CbcEnc::new_from_slices(&key, &iv)
        .map_err(|_| KeyError::InvalidIv(iv.len()))?
        .encrypt_padded_vec_mut::<Pkcs7>(private_key.trim().as_bytes());
    Ok(hex::encode(ciphertext))
}

/// Decrypts a hex-encoded AES-256-CBC private key.
///
/// Only the first 66 characters of the plaintext are returned.
pub(crate) fn decrypt_private_key(
    ciphertext: &str,
    passphrase: &str,
    iv: &str,
) -> Result<String, KeyError> {
    let iv = hex::decode(iv.trim())?;
    let ciphertext = hex::decode(ciphertext.trim())?;
    let key = derive_key(passphrase, &iv);

    let plaintext = Aes256CbcDec::new_from_slices(&key, &iv)
        .map_err(|_| KeyError::InvalidIv(iv.len()))?
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| KeyError::Padding)?;
    let plaintext = String::from_utf8(plaintext).map_err(|_| KeyError::NotUtf8)?;

    Ok(plaintext.chars().take(PRIVATE_KEY_CHARS).collect())
}
