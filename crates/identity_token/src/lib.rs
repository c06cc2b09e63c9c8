mod hs256;

pub use hs256::{Error, IdentityClaims, IdentityTokenHeader, TokenType, sign_hs256, verify_hs256};
