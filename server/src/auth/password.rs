use constant_time_eq::constant_time_eq;

pub use bcrypt::BcryptError;

const BCRYPT_PREFIX: &str = "{bcrypt}";
const NOOP_PREFIX: &str = "{noop}";

pub const DEFAULT_COST: u32 = 10;
pub const MIN_COST: u32 = 4; // mirrors bcrypt's private MIN_COST
pub const MAX_COST: u32 = 31; // mirrors bcrypt's private MAX_COST

/// Encodes passwords as `{bcrypt}<modular crypt hash>` and checks raw
/// passwords against that form. `{noop}` values are compared as plain text so
/// fixtures can be seeded without encoding.
#[derive(Debug, Clone, Copy)]
pub struct PasswordEncoder {
    cost: u32,
}

impl Default for PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordEncoder {
    pub fn new() -> Self {
        Self::with_cost(DEFAULT_COST)
    }

    /// `cost` is the bcrypt work factor, clamped to the range bcrypt accepts.
    pub fn with_cost(cost: u32) -> Self {
        Self {
            cost: cost.clamp(MIN_COST, MAX_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn encode(&self, raw: &str) -> Result<String, BcryptError> {
        let hash = bcrypt::hash(raw, self.cost)?;
        Ok(format!("{}{}", BCRYPT_PREFIX, hash))
    }

    pub fn matches(&self, raw: &str, encoded: &str) -> bool {
        if let Some(plain) = encoded.strip_prefix(NOOP_PREFIX) {
            return constant_time_eq(raw.as_bytes(), plain.as_bytes());
        }

        let Some(hash) = encoded.strip_prefix(BCRYPT_PREFIX) else {
            tracing::warn!("Encoded password has no recognised id prefix");
            return false;
        };

        match bcrypt::verify(raw, hash) {
            Ok(matched) => matched,
            Err(e) => {
                tracing::warn!(error = %e, "Stored bcrypt hash is malformed");
                false
            }
        }
    }
}
