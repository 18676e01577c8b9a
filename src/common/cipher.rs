// src/common/cipher.rs

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

use crate::common::error::AppError;

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;

/// Criptografia de campos sensíveis (ex: documento de identidade do locatário).
pub trait FieldCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, AppError>;
    fn decrypt(&self, token: &str) -> Result<String, AppError>;
}

/// AES-256-GCM com nonce aleatório; token = base64(nonce || ciphertext).
#[derive(Clone)]
pub struct AesGcmCipher {
    key: [u8; KEY_SIZE],
}

impl AesGcmCipher {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        Self { key }
    }

    /// Lê a chave em base64 (ex: variável FIELD_ENCRYPTION_KEY).
    pub fn from_base64(encoded: &str) -> Result<Self, AppError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AppError::CipherError(format!("chave em base64 inválida: {e}")))?;

        let key: [u8; KEY_SIZE] = bytes.as_slice().try_into().map_err(|_| {
            AppError::CipherError(format!(
                "a chave precisa ter {KEY_SIZE} bytes, veio com {}",
                bytes.len()
            ))
        })?;

        Ok(Self::new(key))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key))
    }
}

impl FieldCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, AppError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| AppError::CipherError(format!("falha ao cifrar: {e}")))?;

        let mut token = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        token.extend_from_slice(&nonce_bytes);
        token.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(token))
    }

    fn decrypt(&self, token: &str) -> Result<String, AppError> {
        let raw = STANDARD
            .decode(token)
            .map_err(|e| AppError::CipherError(format!("token em base64 inválido: {e}")))?;

        if raw.len() <= NONCE_SIZE {
            return Err(AppError::CipherError("token curto demais".into()));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_SIZE);

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| AppError::CipherError(format!("falha ao decifrar: {e}")))?;

        String::from_utf8(plaintext)
            .map_err(|e| AppError::CipherError(format!("texto decifrado não é UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::new([7u8; KEY_SIZE])
    }

    #[test]
    fn encrypts_and_decrypts() {
        let cipher = cipher();
        let token = cipher.encrypt("CNI-112233445").unwrap();

        assert_ne!(token, "CNI-112233445");
        assert_eq!(cipher.decrypt(&token).unwrap(), "CNI-112233445");
    }

    #[test]
    fn same_plaintext_gives_different_tokens() {
        let cipher = cipher();
        let a = cipher.encrypt("123").unwrap();
        let b = cipher.encrypt("123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let cipher = cipher();
        let token = cipher.encrypt("segredo").unwrap();
        let mut raw = STANDARD.decode(&token).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let result = cipher.decrypt(&STANDARD.encode(raw));
        assert!(matches!(result, Err(AppError::CipherError(_))));
    }

    #[test]
    fn wrong_key_cannot_decrypt() {
        let token = cipher().encrypt("segredo").unwrap();
        let other = AesGcmCipher::new([9u8; KEY_SIZE]);
        assert!(other.decrypt(&token).is_err());
    }

    #[test]
    fn key_must_be_32_bytes() {
        assert!(AesGcmCipher::from_base64(&STANDARD.encode([1u8; KEY_SIZE])).is_ok());
        assert!(AesGcmCipher::from_base64(&STANDARD.encode([1u8; 16])).is_err());
        assert!(AesGcmCipher::from_base64("não é base64").is_err());
    }
}
