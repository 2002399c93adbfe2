//! Test fixtures: users, credentials, and items.

use aumeta_core::PasswordDigest;
use aumeta_core::config::UserConfig;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Value, json};

/// Username and password of a seeded user.
pub type Credentials = (&'static str, &'static str);

/// Holds only the `user` role.
pub const READER: Credentials = ("reader", "reader-password");

/// Holds `contentAdmin`.
pub const CURATOR: Credentials = ("curator", "curator-password");

/// Holds `userAdmin`, which implies every other role.
pub const ROOT: Credentials = ("root", "root-password");

/// Config entries for the seeded users. The curator uses an Argon2 digest,
/// the others SHA-256.
#[allow(dead_code)]
pub fn test_users() -> Vec<UserConfig> {
    vec![
        user_config(READER, &["user"], PasswordDigest::sha256_of(READER.1).to_string()),
        user_config(CURATOR, &["user", "contentAdmin"], argon2_digest(CURATOR.1)),
        user_config(ROOT, &["userAdmin"], PasswordDigest::sha256_of(ROOT.1).to_string()),
    ]
}

fn user_config(creds: Credentials, roles: &[&str], password_hash: String) -> UserConfig {
    UserConfig {
        username: creds.0.to_string(),
        password_hash,
        roles: roles.iter().map(|r| r.to_string()).collect(),
    }
}

/// Argon2id digest with minimal cost parameters to keep tests fast.
fn argon2_digest(password: &str) -> String {
    use argon2::password_hash::{PasswordHasher, SaltString};
    use argon2::{Algorithm, Argon2, Params, Version};
    let params = Params::new(8, 1, 1, None).expect("params");
    let salt = SaltString::encode_b64(b"aumeta-test-salt").expect("salt");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .expect("hash")
        .to_string()
}

/// `Authorization` header value for a username and password.
#[allow(dead_code)]
pub fn basic_auth(creds: Credentials) -> String {
    basic_auth_raw(&format!("{}:{}", creds.0, creds.1))
}

/// `Authorization` header value for arbitrary decoded credentials.
#[allow(dead_code)]
pub fn basic_auth_raw(decoded: &str) -> String {
    format!("Basic {}", STANDARD.encode(decoded))
}

/// JSON body of an item in `au_id`.
#[allow(dead_code)]
pub fn item_json(au_id: &str, n: usize) -> Value {
    json!({
        "scalarMap": {
            "au_id": au_id,
            "article_title": format!("Article {n}"),
            "start_page": (n * 10).to_string(),
        },
        "setMap": { "author": [format!("Author {n}")] },
        "listMap": {},
        "mapMap": {}
    })
}
