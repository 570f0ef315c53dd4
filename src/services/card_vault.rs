// src/services/card_vault.rs

//! AES-256-GCM sealing for card fields. The engine only ever writes sealed
//! blobs; there is deliberately no decrypt path in this subsystem — the
//! displayable last-4 fragment is captured separately before sealing.
//!
//! Blob format: `base64(nonce):base64(ciphertext || tag)` with a random
//! 96-bit nonce per value.

use crate::errors::{AppError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ring::aead;
use ring::rand::{SecureRandom, SystemRandom};

const NONCE_LEN: usize = 12;

pub struct CardCipher {
  key: aead::LessSafeKey,
  rng: SystemRandom,
}

impl CardCipher {
  pub fn new(key_bytes: &[u8; 32]) -> Result<Self> {
    let unbound = aead::UnboundKey::new(&aead::AES_256_GCM, key_bytes)
      .map_err(|_| AppError::Crypto("invalid AES-256-GCM key".to_string()))?;
    Ok(Self {
      key: aead::LessSafeKey::new(unbound),
      rng: SystemRandom::new(),
    })
  }

  pub fn seal(&self, plaintext: &str) -> Result<String> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    self
      .rng
      .fill(&mut nonce_bytes)
      .map_err(|_| AppError::Crypto("nonce generation failed".to_string()))?;
    let nonce = aead::Nonce::assume_unique_for_key(nonce_bytes);

    let mut in_out = plaintext.as_bytes().to_vec();
    self
      .key
      .seal_in_place_append_tag(nonce, aead::Aad::empty(), &mut in_out)
      .map_err(|_| AppError::Crypto("card data sealing failed".to_string()))?;

    Ok(format!("{}:{}", BASE64.encode(nonce_bytes), BASE64.encode(in_out)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cipher() -> CardCipher {
    CardCipher::new(&[0x42; 32]).expect("cipher")
  }

  #[test]
  fn sealed_blob_has_nonce_and_tagged_ciphertext() {
    let sealed = cipher().seal("4111111111111111").expect("seal");
    let (nonce_b64, ct_b64) = sealed.split_once(':').expect("two parts");
    assert_eq!(BASE64.decode(nonce_b64).unwrap().len(), NONCE_LEN);
    // ciphertext + 16-byte GCM tag
    assert_eq!(BASE64.decode(ct_b64).unwrap().len(), 16 + 16);
    assert!(!sealed.contains("4111111111111111"));
  }

  #[test]
  fn nonces_are_not_reused() {
    let c = cipher();
    let a = c.seal("same input").expect("seal");
    let b = c.seal("same input").expect("seal");
    assert_ne!(a, b);
  }
}
