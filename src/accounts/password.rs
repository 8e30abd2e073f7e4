use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

/// Argon2id work factor for new hashes.
pub const MEMORY_COST_KIB: u32 = 19 * 1024;
pub const TIME_COST: u32 = 2;
pub const PARALLELISM: u32 = 1;

#[cfg(not(test))]
fn work_factor() -> Result<Params, argon2::Error> {
    Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None)
}

// unoptimized test builds would spend seconds per hash at full cost
#[cfg(test)]
fn work_factor() -> Result<Params, argon2::Error> {
    Params::new(Params::MIN_M_COST, 1, 1, None)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let params = work_factor().map_err(|e| {
        error!(error = %e, "argon2 params error");
        anyhow::anyhow!(e.to_string())
    })?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Returns false on mismatch and on a digest that cannot be parsed.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored password hash is malformed");
            return false;
        }
    };
    // cost parameters are read from the PHC string itself
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}
