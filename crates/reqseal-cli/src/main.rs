//! reqseal: seal, sign and open hybrid-encrypted API requests
//!
//! Commands:
//!   keygen              - generate an RSA key pair as PEM files
//!   seal <payload>      - encrypt + sign a payload, print the envelope JSON
//!   verify <envelope>   - check an envelope's signature
//!   open <envelope>     - verify and decrypt an envelope, print the payload
//!   order-no            - print a fresh order number
//!   config show         - display the effective configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use reqseal_core::config::ReqsealConfig;
use reqseal_core::keys;
use reqseal_core::order::generate_order_no;
use reqseal_crypto::{Envelope, EnvelopeBuilder, EnvelopeOpener, RequestMetadata};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "reqseal",
    version,
    about = "Hybrid-encrypted, signed request envelopes"
)]
struct Cli {
    /// Path to reqseal.toml configuration file
    #[arg(long, short = 'c', env = "REQSEAL_CONFIG", default_value = "reqseal.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides [log] level
    #[arg(long, env = "REQSEAL_LOG")]
    log: Option<String>,

    /// Log format; overrides [log] format
    #[arg(long, env = "REQSEAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate an RSA key pair (<name>.pem private, <name>.pub.pem public)
    Keygen {
        /// Key file base name
        #[arg(long, default_value = "reqseal")]
        name: String,
        /// Output directory
        #[arg(long, short = 'o', default_value = ".")]
        out_dir: PathBuf,
        /// Modulus size in bits
        #[arg(long, default_value_t = 2048)]
        bits: usize,
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Encrypt and sign a payload; prints the envelope as JSON
    Seal {
        /// Payload file ("-" for stdin)
        payload: PathBuf,
        /// Recipient RSA public key PEM (overrides keys.recipient_public_key)
        #[arg(long)]
        recipient_key: Option<PathBuf>,
        /// Our RSA private key PEM for signing (overrides keys.signing_private_key)
        #[arg(long)]
        signing_key: Option<PathBuf>,
        /// Correlation id for customerOrderNo (default: generated)
        #[arg(long)]
        order_no: Option<String>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Check an envelope's signature against the sender's public key
    Verify {
        /// Envelope JSON file ("-" for stdin)
        envelope: PathBuf,
        /// Sender RSA public key PEM (overrides keys.sender_public_key)
        #[arg(long)]
        sender_key: Option<PathBuf>,
    },

    /// Verify and decrypt an envelope; writes the payload to stdout
    Open {
        /// Envelope JSON file ("-" for stdin)
        envelope: PathBuf,
        /// Recipient RSA private key PEM (overrides keys.recipient_private_key)
        #[arg(long)]
        recipient_key: Option<PathBuf>,
        /// Sender RSA public key PEM (overrides keys.sender_public_key)
        #[arg(long)]
        sender_key: Option<PathBuf>,
    },

    /// Print a freshly generated order number
    #[command(name = "order-no")]
    OrderNo,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // [log] lives in the file; the missing-file warning waits for the subscriber
    let file_config = ReqsealConfig::read(&cli.config)?;
    let found = file_config.is_some();
    let config = file_config.unwrap_or_default();

    let level = cli.log.clone().unwrap_or_else(|| config.log.level.clone());
    let format = match &cli.log_format {
        Some(format) => format.clone(),
        None => LogFormat::from_str(&config.log.format, true)
            .map_err(|e| anyhow::anyhow!("invalid [log] format: {e}"))?,
    };
    init_logging(&level, &format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "reqseal starting"
    );
    if !found {
        warn!("config file not found: {}  (using defaults)", cli.config.display());
    }

    match cli.command {
        Commands::Keygen {
            name,
            out_dir,
            bits,
            force,
        } => cmd_keygen(&name, &out_dir, bits, force),
        Commands::Seal {
            payload,
            recipient_key,
            signing_key,
            order_no,
            pretty,
        } => cmd_seal(
            &config,
            &payload,
            recipient_key.as_deref(),
            signing_key.as_deref(),
            order_no,
            pretty,
        ),
        Commands::Verify {
            envelope,
            sender_key,
        } => cmd_verify(&config, &envelope, sender_key.as_deref()),
        Commands::Open {
            envelope,
            recipient_key,
            sender_key,
        } => cmd_open(
            &config,
            &envelope,
            recipient_key.as_deref(),
            sender_key.as_deref(),
        ),
        Commands::OrderNo => {
            println!("{}", generate_order_no());
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries envelopes and payloads; logs go to stderr
    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

// ── helpers ───────────────────────────────────────────────────────────────────

/// CLI flag > config > error
fn key_path(flag: Option<&Path>, configured: &Option<PathBuf>, what: &str) -> Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| configured.clone())
        .with_context(|| format!("no {what} configured: pass it as a flag or set it in [keys]"))
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn read_envelope(path: &Path) -> Result<Envelope> {
    let raw = read_input(path)?;
    let text = std::str::from_utf8(&raw).context("envelope is not UTF-8")?;
    Envelope::from_json(text).with_context(|| format!("parsing envelope {}", path.display()))
}

// ── `reqseal keygen` ──────────────────────────────────────────────────────────

fn cmd_keygen(name: &str, out_dir: &Path, bits: usize, force: bool) -> Result<()> {
    let private_path = out_dir.join(format!("{name}.pem"));
    let public_path = out_dir.join(format!("{name}.pub.pem"));

    for path in [&private_path, &public_path] {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
    }

    let pair = keys::generate_key_pair(bits)?;
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;
    std::fs::write(&private_path, pair.private_pem.as_bytes())
        .with_context(|| format!("writing {}", private_path.display()))?;
    std::fs::write(&public_path, pair.public_pem.as_bytes())
        .with_context(|| format!("writing {}", public_path.display()))?;

    info!(bits, private = %private_path.display(), public = %public_path.display(), "generated key pair");
    println!("private key: {}", private_path.display());
    println!("public key:  {}", public_path.display());
    Ok(())
}

// ── `reqseal seal` ────────────────────────────────────────────────────────────

fn cmd_seal(
    config: &ReqsealConfig,
    payload_path: &Path,
    recipient_key: Option<&Path>,
    signing_key: Option<&Path>,
    order_no: Option<String>,
    pretty: bool,
) -> Result<()> {
    let recipient_path = key_path(
        recipient_key,
        &config.keys.recipient_public_key,
        "recipient public key",
    )?;
    let signing_path = key_path(
        signing_key,
        &config.keys.signing_private_key,
        "signing private key",
    )?;

    let public_key = keys::load_public_key(&recipient_path)?;
    let private_key = keys::load_private_key(&signing_path)?;
    let payload = read_input(payload_path)?;

    let order_no = order_no.unwrap_or_else(generate_order_no);
    let envelope = EnvelopeBuilder::new(config.envelope.clone())
        .build(
            &payload,
            &public_key,
            &private_key,
            &RequestMetadata::now(order_no.as_str()),
        )
        .with_context(|| format!("sealing request {order_no}"))?;

    info!(
        order_no = %order_no,
        payload_bytes = payload.len(),
        "sealed request"
    );

    let rendered = if pretty {
        serde_json::to_string_pretty(&envelope).context("serializing envelope")?
    } else {
        envelope.to_json()?
    };
    println!("{rendered}");
    Ok(())
}

// ── `reqseal verify` ──────────────────────────────────────────────────────────

fn cmd_verify(config: &ReqsealConfig, envelope_path: &Path, sender_key: Option<&Path>) -> Result<()> {
    let sender_path = key_path(sender_key, &config.keys.sender_public_key, "sender public key")?;
    let sender_public = keys::load_public_key(&sender_path)?;
    let envelope = read_envelope(envelope_path)?;

    let ok = EnvelopeOpener::new(config.envelope.clone()).verify(&envelope, &sender_public)?;
    if !ok {
        anyhow::bail!(
            "signature mismatch for order {}",
            envelope.correlation_id()
        );
    }
    println!("signature ok: order {}", envelope.correlation_id());
    Ok(())
}

// ── `reqseal open` ────────────────────────────────────────────────────────────

fn cmd_open(
    config: &ReqsealConfig,
    envelope_path: &Path,
    recipient_key: Option<&Path>,
    sender_key: Option<&Path>,
) -> Result<()> {
    let recipient_path = key_path(
        recipient_key,
        &config.keys.recipient_private_key,
        "recipient private key",
    )?;
    let sender_path = key_path(sender_key, &config.keys.sender_public_key, "sender public key")?;

    let recipient_private = keys::load_private_key(&recipient_path)?;
    let sender_public = keys::load_public_key(&sender_path)?;
    let envelope = read_envelope(envelope_path)?;

    let payload = EnvelopeOpener::new(config.envelope.clone())
        .open(&envelope, &recipient_private, &sender_public)
        .with_context(|| format!("opening request {}", envelope.correlation_id()))?;

    info!(
        order_no = envelope.correlation_id(),
        payload_bytes = payload.len(),
        "opened request"
    );

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&payload).context("writing payload")?;
    stdout.flush().context("flushing stdout")?;
    Ok(())
}

// ── `reqseal config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &ReqsealConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = config.to_toml().context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}
