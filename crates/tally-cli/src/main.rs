//! TALLY CLI
//!
//! Runs the RSA-protected Diffie-Hellman handshake and the AES-128 primitives
//! of the vote-collection core from the command line.

mod config;
mod demo;

use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use std::path::PathBuf;
use tally_crypto::aes;
use tally_crypto::messages::HandshakeMessage;
use tally_crypto::rsa::RsaKeyPair;
use tally_crypto::token;

use config::Config;

/// TALLY - handshake and cipher core for vote collection
#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path (defaults to the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Alice/Bob handshake and exchange encrypted messages
    Handshake {
        /// Message for Alice to send once the session key is derived (repeatable)
        #[arg(short, long = "message")]
        messages: Vec<String>,
    },

    /// Generate an RSA key pair and print the public key
    Keygen {
        /// Print the public key as a handshake message
        #[arg(long)]
        json: bool,
    },

    /// Print a fresh voter token
    Token,

    /// Encrypt one 16-byte block
    EncryptBlock {
        /// 16-byte key, hex
        #[arg(long)]
        key: String,
        /// 16-byte plaintext block, hex
        #[arg(long)]
        block: String,
    },

    /// Decrypt one 16-byte block
    DecryptBlock {
        /// 16-byte key, hex
        #[arg(long)]
        key: String,
        /// 16-byte ciphertext block, hex
        #[arg(long)]
        block: String,
    },

    /// Print the effective configuration
    Config {
        /// Write it to the configuration path
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let config = if cli.config.is_some() {
        Config::load(&config_path)?
    } else {
        Config::load_or_default(&config_path)?
    };

    // Initialize logging
    let level = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.to_lowercase()
    };
    tracing_subscriber::fmt().with_env_filter(level).init();

    // Validate configuration
    config.validate()?;

    match cli.command {
        Commands::Handshake { messages } => {
            run_handshake(messages, &config).await?;
        }
        Commands::Keygen { json } => {
            generate_keypair(json, &config)?;
        }
        Commands::Token => {
            println!("{}", token::generate_token(&mut OsRng));
        }
        Commands::EncryptBlock { key, block } => {
            let out = aes::encrypt_block(&hex::decode(block)?, &hex::decode(key)?)?;
            println!("{}", hex::encode(out));
        }
        Commands::DecryptBlock { key, block } => {
            let out = aes::decrypt_block(&hex::decode(block)?, &hex::decode(key)?)?;
            println!("{}", hex::encode(out));
        }
        Commands::Config { write } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if write {
                config.save(&config_path)?;
                println!("\nSaved to: {}", config_path.display());
            }
        }
    }

    Ok(())
}

/// Run the two-party handshake and print the outcome
async fn run_handshake(messages: Vec<String>, config: &Config) -> anyhow::Result<()> {
    let params = config.dh_params()?;
    println!("DH parameters: base={}, modulus={}", params.base(), params.modulus());

    let report = demo::run(config.key_gen_config()?, params, messages).await?;

    let keys_match = report.keys_match();
    println!("Alice key: {}", report.initiator_key);
    println!("Bob key:   {}", report.responder_key);
    println!("Keys match: {keys_match}");
    for exchange in &report.exchanges {
        println!("Alice -> Bob: {}", exchange.received);
        println!("Bob -> Alice: {}", exchange.reply);
    }

    if !keys_match {
        anyhow::bail!("session keys differ");
    }
    Ok(())
}

/// Generate an RSA key pair from the configured range
fn generate_keypair(json: bool, config: &Config) -> anyhow::Result<()> {
    let keys = RsaKeyPair::generate(&config.key_gen_config()?, &mut OsRng)?;
    let public = keys.public_key();

    if json {
        println!("{}", HandshakeMessage::from(&public).to_json()?);
    } else {
        println!("e: {}", public.e());
        println!("n: {}", public.n());
    }
    Ok(())
}
