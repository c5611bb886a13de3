// SPDX-License-Identifier: MIT

//! JWT session token tests.
//!
//! These verify that tokens created by the login route can be decoded by
//! the auth middleware, catching compatibility issues early.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use userdeck::middleware::auth::{create_jwt, Claims};

const SIGNING_KEY: &[u8] = b"test_signing_key_32_bytes_long!!";

#[test]
fn test_jwt_roundtrip() {
    let token = create_jwt(42, 60, SIGNING_KEY).expect("Failed to create JWT");

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(&token, &key, &validation)
        .expect("Failed to decode JWT - check Claims struct compatibility");

    assert_eq!(token_data.claims.sub, "42");
    assert!(token_data.claims.exp > token_data.claims.iat);
}

#[test]
fn test_jwt_user_id_parsing() {
    let token = create_jwt(9_876_543, 60, SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    let parsed_id: i64 = token_data
        .claims
        .sub
        .parse()
        .expect("sub claim should be parseable as i64");
    assert_eq!(parsed_id, 9_876_543);
}

#[test]
fn test_jwt_honors_session_ttl() {
    use std::time::{SystemTime, UNIX_EPOCH};

    let token = create_jwt(1, 60, SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(SIGNING_KEY);
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false; // checked manually below

    let token_data = decode::<Claims>(&token, &key, &validation).unwrap();

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize;

    // 60 minute session, allow a little slack for test runtime
    assert!(token_data.claims.exp >= now + 59 * 60);
    assert!(token_data.claims.exp <= now + 61 * 60);
}

#[test]
fn test_jwt_rejects_wrong_key() {
    let token = create_jwt(1, 60, SIGNING_KEY).unwrap();

    let key = DecodingKey::from_secret(b"a_different_signing_key_entirely");
    let validation = Validation::new(Algorithm::HS256);

    assert!(decode::<Claims>(&token, &key, &validation).is_err());
}
