//! Configuration system for the TALLY CLI.

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_crypto::dh::DhParams;
use tally_crypto::number::{DEFAULT_MAX_PRIME_ATTEMPTS, PrimeRange};
use tally_crypto::rsa::KeyGenConfig;

/// TALLY configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// RSA key generation
    #[serde(default)]
    pub rsa: RsaConfig,
    /// Diffie-Hellman group
    #[serde(default)]
    pub dh: DhConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// RSA key generation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RsaConfig {
    /// Lower bound for sampled primes
    #[serde(default = "default_prime_low")]
    pub prime_low: u64,
    /// Upper bound for sampled primes
    #[serde(default = "default_prime_high")]
    pub prime_high: u64,
    /// Sampling attempts per prime
    #[serde(default = "default_max_prime_attempts")]
    pub max_prime_attempts: u32,
    /// Accept demo-sized primes
    #[serde(default = "default_true")]
    pub allow_insecure: bool,
}

/// Diffie-Hellman configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DhConfig {
    /// Generator
    #[serde(default = "default_dh_base")]
    pub base: u64,
    /// Prime modulus
    #[serde(default = "default_dh_modulus")]
    pub modulus: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default values

fn default_prime_low() -> u64 {
    100
}

fn default_prime_high() -> u64 {
    500
}

fn default_max_prime_attempts() -> u32 {
    DEFAULT_MAX_PRIME_ATTEMPTS
}

fn default_true() -> bool {
    true
}

fn default_dh_base() -> u64 {
    u64::from(tally_crypto::dh::DEMO_BASE)
}

fn default_dh_modulus() -> u64 {
    u64::from(tally_crypto::dh::DEMO_MODULUS)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for RsaConfig {
    fn default() -> Self {
        Self {
            prime_low: default_prime_low(),
            prime_high: default_prime_high(),
            max_prime_attempts: default_max_prime_attempts(),
            allow_insecure: true,
        }
    }
}

impl Default for DhConfig {
    fn default() -> Self {
        Self {
            base: default_dh_base(),
            modulus: default_dh_modulus(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get default config path
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("tally/config.toml")
    }

    /// Load config from `path`, falling back to defaults if it does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("no config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.rsa.prime_low < 2 {
            anyhow::bail!("prime_low must be at least 2");
        }
        if self.rsa.prime_low > self.rsa.prime_high {
            anyhow::bail!(
                "Empty prime range: [{}, {}]",
                self.rsa.prime_low,
                self.rsa.prime_high
            );
        }

        // Key generation rules: attempt cap and insecure opt-in
        self.key_gen_config()?.validate()?;

        // DH group rules: modulus >= 5, base in [2, modulus)
        self.dh_params()?;

        // Every DH public value must fit below the smallest RSA modulus the
        // prime range can produce, or sealing it fails.
        let smallest_n = u128::from(self.rsa.prime_low) * u128::from(self.rsa.prime_low);
        if u128::from(self.dh.modulus) > smallest_n {
            anyhow::bail!(
                "DH modulus {} exceeds prime_low^2 = {smallest_n}; raise [rsa] prime_low",
                self.dh.modulus
            );
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            );
        }

        Ok(())
    }

    /// RSA key generation parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the prime range is inverted.
    pub fn key_gen_config(&self) -> anyhow::Result<KeyGenConfig> {
        Ok(KeyGenConfig {
            prime_range: PrimeRange::new(self.rsa.prime_low, self.rsa.prime_high)?,
            max_prime_attempts: self.rsa.max_prime_attempts,
            allow_insecure: self.rsa.allow_insecure,
        })
    }

    /// Diffie-Hellman group parameters
    ///
    /// # Errors
    ///
    /// Returns an error if the group is unusable.
    pub fn dh_params(&self) -> anyhow::Result<DhParams> {
        Ok(DhParams::new(
            BigUint::from(self.dh.base),
            BigUint::from(self.dh.modulus),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.rsa.prime_low, 100);
        assert_eq!(config.rsa.prime_high, 500);
        assert_eq!(config.dh.base, 5);
        assert_eq!(config.dh.modulus, 2357);
        assert_eq!(config.dh_params().unwrap(), DhParams::demo());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.rsa.prime_low = 600;
        assert!(config.validate().is_err());

        config = Config::default();
        config.rsa.allow_insecure = false;
        assert!(config.validate().is_err());

        config = Config::default();
        config.dh.modulus = 4;
        assert!(config.validate().is_err());

        config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        config = Config::default();
        config.rsa.max_prime_attempts = 0;
        assert!(config.validate().is_err());

        config = Config::default();
        config.dh.modulus = 1_000_003;
        assert!(config.validate().is_err());
        config.rsa.prime_low = 1100;
        config.rsa.prime_high = 5000;
        assert!(config.validate().is_ok());

        config = Config::default();
        config.dh.modulus = 10_007;
        config.dh.base = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[dh]\nmodulus = 23\n").unwrap();
        assert_eq!(config.dh.base, 5);
        assert_eq!(config.dh.modulus, 23);
        assert_eq!(config.rsa, RsaConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.rsa.prime_high = 1000;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
        assert_eq!(
            Config::load_or_default(dir.path().join("missing.toml")).unwrap(),
            Config::default()
        );
    }
}
