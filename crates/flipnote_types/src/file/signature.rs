//! RSA signature verification.
//!
//! Both formats end with a PKCS#1 v1.5 signature over everything before it.
//! Verification is kept apart from decoding: a file with a missing or
//! tampered signature is still fully decodable, and a bad signature is a
//! plain `false`, not an error.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha1::Sha1;
use sha2::{Digest, Sha256};

use super::{FlipnoteError, Result};

/// Public key Flipnote Studio signs PPM files with (1024-bit)
pub const PPM_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQDCPLwTL6oSflv+gjywi/sM0TUB
90xqOoxpeV5nnB8Vun/gc5ZjrbsUVaxjHxMWBIpcXcCjc6TSn5Bvlii3ZQN0V7je
JugDoghqVAiZ49raX1r6uBoR+VxUsZp7FfMokS9P9lgJvvfeQH5q7ATsf7ayEvNq
xvJdmUnbuF9mGMzrrQIDAQAB
-----END PUBLIC KEY-----";

/// Public key Flipnote Studio 3D signs KWZ files with (2048-bit)
pub const KWZ_PUBLIC_KEY: &str = "-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAuv+zHAXXvbbtRqxADDeJ
ArX2b9RMxj3T+qpRg3FnIE/jsfiDSaU6ljUKz1HX/NTnJeVv95sD2uUr8mYvSyHs
7UFMm+M+3uL7zxxK+4mV4nYMSbl48oqemMs5dY1xHJsxNzTxa+aN7EL2YeWtDzlv
Opmb6N2CKzccd+Mh1acldbyIGIygJHFIuqaZd9tYbm+7hdabzTkH+6Ujm+KU0CkQ
bbxFPU6TQpll+cbR2my+jthTV9zmHWjF7mJeXMgWsS+JcFm2ASPiiOEvigJd5AC7
iNzzm1ZIHs3sBf3nhrI26PJa6XkKvtdZFTfg+gemuTSmLNAWJjiiKCy/drrP4cte
GwIDAQAB
-----END PUBLIC KEY-----";

/// Digest the signature was computed over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureDigest {
	/// SHA-1, used by PPM
	Sha1,
	/// SHA-256, used by KWZ
	Sha256,
}

/// Parses a SubjectPublicKeyInfo or PKCS#1 PEM block
pub fn parse_public_key(pem: &str) -> Result<RsaPublicKey> {
	if pem.contains("BEGIN RSA PUBLIC KEY") {
		return RsaPublicKey::from_pkcs1_pem(pem)
			.map_err(|e| FlipnoteError::InvalidKey(e.to_string()));
	}
	RsaPublicKey::from_public_key_pem(pem).map_err(|e| FlipnoteError::InvalidKey(e.to_string()))
}

/// Verifies an RSA PKCS#1 v1.5 `signature` over `body`.
///
/// Returns `Ok(false)` for any signature that does not match, including one
/// of the wrong length. Only an unparsable key is an error.
pub fn verify_pkcs1v15(
	public_key_pem: &str,
	digest: SignatureDigest,
	body: &[u8],
	signature: &[u8],
) -> Result<bool> {
	let key = parse_public_key(public_key_pem)?;
	let verified = match digest {
		SignatureDigest::Sha1 => {
			key.verify(Pkcs1v15Sign::new::<Sha1>(), &Sha1::digest(body), signature)
		}
		SignatureDigest::Sha256 => {
			key.verify(Pkcs1v15Sign::new::<Sha256>(), &Sha256::digest(body), signature)
		}
	};
	if let Err(e) = &verified {
		log::debug!("Signature rejected: {e}");
	}
	Ok(verified.is_ok())
}
