//! vlink: VaultLink command-line client
//!
//! Local commands:
//!   encrypt <file>          - encrypt a file under a fresh key
//!   decrypt <file> --key    - decrypt a previously encrypted file
//!   config show             - display current configuration
//!
//! Remote commands (share API):
//!   upload <file>           - encrypt and upload over the authenticated channel
//!   share <file-id>         - issue a share link for an owned file
//!   info <token>            - inspect a share link descriptor
//!   fetch <token>           - redeem a share link and download the file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

use vlink_client::{
    upload_encrypted, BrokerState, GuestDownloadCoordinator, HttpShareLinkApi, JsonTokenStore,
    ShareLinkApi,
};
use vlink_core::config::VaultLinkConfig;
use vlink_core::types::{format_size, ShareLinkRequest};
use vlink_core::ShareError;
use vlink_crypto::{decode_key, decrypt_file, encode_key, encrypt_file, generate_file_key};

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "vlink",
    version,
    about = "VaultLink end-to-end encrypted file sharing client",
    long_about = "vlink: encrypt files client-side, upload them, and redeem share links"
)]
struct Cli {
    /// Path to vaultlink.toml configuration file
    #[arg(long, short = 'c', env = "VLINK_CONFIG", default_value = "~/.config/vaultlink/config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Encrypt a local file under a fresh key
    ///
    /// The key is printed once as base64; it is not stored anywhere.
    Encrypt {
        /// File to encrypt
        input: PathBuf,
        /// Output path (default: <input>.enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Write the base64 key to this file instead of stdout
        #[arg(long)]
        key_out: Option<PathBuf>,
    },

    /// Decrypt a locally encrypted file
    Decrypt {
        /// File to decrypt
        input: PathBuf,
        /// Output path (default: <input> without .enc)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Base64 file key
        #[arg(long, env = "VLINK_KEY")]
        key: String,
    },

    /// Encrypt a file and upload it over the authenticated channel
    ///
    /// The owner credential is read from the environment variable named in
    /// the config (api.auth_token_env).
    Upload {
        /// File to upload
        path: PathBuf,
        /// Upload name (default: file name)
        #[arg(long)]
        name: Option<String>,
        /// MIME type (default: application/octet-stream)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Issue a share link for an owned file
    Share {
        /// File id as returned by upload
        file_id: String,
        /// Hours until the link expires
        #[arg(long, default_value_t = 24)]
        expires_in_hours: u32,
        /// Maximum number of accesses (unlimited if omitted)
        #[arg(long)]
        max_access: Option<u32>,
        /// Protect the link with a password (prompted, never an argument)
        #[arg(long)]
        password: bool,
    },

    /// Inspect a share link descriptor
    Info {
        /// Capability token from the share URL
        token: String,
    },

    /// Redeem a share link and download the decrypted file
    Fetch {
        /// Capability token from the share URL
        token: String,
        /// Output path (default: the shared file's name)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
        /// Link password (prompted when required and not given)
        #[arg(long)]
        password: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_home(&cli.config);
    let config = load_config(&config_path).await?;
    init_logging(&config.log.level, &config.log.format);

    match cli.command {
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
        Commands::Encrypt { input, output, key_out } => {
            cmd_encrypt(&input, output.as_deref(), key_out.as_deref())
        }
        Commands::Decrypt { input, output, key } => {
            cmd_decrypt(&input, output.as_deref(), &key)
        }
        Commands::Upload { path, name, mime } => {
            cmd_upload(&config, &path, name.as_deref(), mime.as_deref()).await
        }
        Commands::Share { file_id, expires_in_hours, max_access, password } => {
            cmd_share(&config, &file_id, expires_in_hours, max_access, password).await
        }
        Commands::Info { token } => cmd_info(&config, &token).await,
        Commands::Fetch { token, output, password } => {
            cmd_fetch(&config, &token, output.as_deref(), password.as_deref()).await
        }
    }
}

async fn load_config(path: &Path) -> Result<VaultLinkConfig> {
    if path.exists() {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading config: {}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("parsing config {}: {e}", path.display()))
    } else {
        tracing::debug!(
            "config file not found: {}  (using defaults)",
            path.display()
        );
        Ok(VaultLinkConfig::default())
    }
}

fn init_logging(level: &str, format: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .init();
    }
}

// ── Command handlers ──────────────────────────────────────────────────────────

fn cmd_config_show(config: &VaultLinkConfig, path: &Path) -> Result<()> {
    println!("# config file: {}", path.display());
    print!("{}", toml::to_string_pretty(config).context("serializing config")?);
    Ok(())
}

fn cmd_encrypt(input: &Path, output: Option<&Path>, key_out: Option<&Path>) -> Result<()> {
    let plaintext = std::fs::read(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let key = generate_file_key()?;
    let payload = encrypt_file(&key, &plaintext)?;
    let key_b64 = encode_key(&key);

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("{}.enc", input.display())));
    std::fs::write(&output, &payload)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "encrypted {} ({}) -> {}",
        input.display(),
        format_size(plaintext.len() as u64),
        output.display()
    );

    match key_out {
        Some(key_path) => {
            std::fs::write(key_path, &key_b64)
                .with_context(|| format!("writing key file {}", key_path.display()))?;
            println!("key written to {}; keep it safe", key_path.display());
        }
        None => {
            println!("key (shown once, not stored): {key_b64}");
        }
    }
    Ok(())
}

fn cmd_decrypt(input: &Path, output: Option<&Path>, key_b64: &str) -> Result<()> {
    let payload = std::fs::read(input)
        .with_context(|| format!("reading {}", input.display()))?;

    let key = decode_key(key_b64)?;
    let plaintext = match decrypt_file(&key, &payload) {
        Ok(plaintext) => plaintext,
        Err(ShareError::AuthenticationFailed) => {
            bail!("{}: data is corrupt or tampered, refusing to write output", input.display())
        }
        Err(err) => return Err(err.into()),
    };

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_decrypt_output(input));
    std::fs::write(&output, &plaintext)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "decrypted {} -> {} ({})",
        input.display(),
        output.display(),
        format_size(plaintext.len() as u64)
    );
    Ok(())
}

async fn cmd_upload(
    config: &VaultLinkConfig,
    path: &Path,
    name: Option<&str>,
    mime: Option<&str>,
) -> Result<()> {
    let api = owner_api(config)?;
    let plaintext = std::fs::read(path)
        .with_context(|| format!("reading {}", path.display()))?;

    let file_name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "upload.bin".to_string()),
    };
    let mime = mime.unwrap_or("application/octet-stream");

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{bar:30} {pos}% {msg}")
            .context("progress template")?,
    );
    bar.set_message(file_name.clone());
    let observer = |percent: u8| bar.set_position(percent as u64);

    let record = upload_encrypted(&api, &file_name, mime, &plaintext, Some(&observer)).await?;
    bar.finish_and_clear();

    println!(
        "uploaded {} ({}) as file id {}",
        record.name, record.formatted_size, record.id
    );
    Ok(())
}

async fn cmd_share(
    config: &VaultLinkConfig,
    file_id: &str,
    expires_in_hours: u32,
    max_access: Option<u32>,
    with_password: bool,
) -> Result<()> {
    let api = owner_api(config)?;

    let password = if with_password {
        let entered = rpassword::prompt_password("link password: ")
            .context("reading password")?;
        if entered.is_empty() {
            bail!("empty password; rerun without --password for an open link");
        }
        Some(entered)
    } else {
        None
    };

    let request = ShareLinkRequest {
        expires_in_hours,
        max_access_count: max_access,
        password,
    };
    let issued = api.create_share_link(file_id, &request).await?;

    println!("share link issued");
    println!("  token:      {}", issued.token);
    println!("  url:        {}/share/{}", config.api.base_url, issued.token);
    println!("  expires at: {}", issued.expires_at);
    if let Some(max) = max_access {
        println!("  max access: {max}");
    }
    Ok(())
}

async fn cmd_info(config: &VaultLinkConfig, token: &str) -> Result<()> {
    let api = HttpShareLinkApi::new(config.api.base_url.clone());
    let info = api.fetch_shared_file(token, None).await?;

    println!("{}", info.name);
    println!("  size:       {}", info.formatted_size);
    println!("  uploaded:   {}", info.uploaded_at);
    println!("  expires at: {}", info.expires_at);
    println!(
        "  protected:  {}",
        if info.is_password_protected { "yes (password)" } else { "no" }
    );
    match info.max_access_count {
        Some(max) => println!("  downloads:  {} / {max}", info.access_count),
        None => println!("  downloads:  {}", info.access_count),
    }
    Ok(())
}

async fn cmd_fetch(
    config: &VaultLinkConfig,
    token: &str,
    output: Option<&Path>,
    password: Option<&str>,
) -> Result<()> {
    let api = HttpShareLinkApi::new(config.api.base_url.clone());
    let store = JsonTokenStore::open(&expand_home(&config.cache.token_cache))?;
    let mut coordinator = GuestDownloadCoordinator::new(api, token.to_string(), store);

    let info = coordinator.fetch_info().await?.clone();
    if matches!(coordinator.broker().state(), BrokerState::PasswordRequired) {
        let password = prompt_link_password(password)?;
        coordinator.submit_password(&password).await?;
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("fetching {}", info.name));
    let result = match coordinator.download().await {
        Ok(result) => result,
        Err(ShareError::GrantRevokedOrExpired) => {
            // The cached grant is gone; redeeming anew is the user's move.
            spinner.finish_and_clear();
            eprintln!("access grant expired; enter the password again");
            let password = prompt_link_password(None)?;
            coordinator.submit_password(&password).await?;
            coordinator.download().await?
        }
        Err(err) => {
            spinner.finish_and_clear();
            return Err(err.into());
        }
    };
    spinner.finish_and_clear();

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&result.file.name));
    std::fs::write(&output, &result.bytes)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "fetched {} ({}, {}) -> {}",
        result.file.name,
        format_size(result.bytes.len() as u64),
        result.content_type,
        output.display()
    );
    if let Some(max) = result.file.max_access_count {
        println!("downloads used: {} / {max}", result.file.access_count);
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn owner_api(config: &VaultLinkConfig) -> Result<HttpShareLinkApi> {
    let env_name = &config.api.auth_token_env;
    let bearer = std::env::var(env_name)
        .with_context(|| format!("owner credential not set: export {env_name}"))?;
    Ok(HttpShareLinkApi::new(config.api.base_url.clone()).with_auth(bearer))
}

fn prompt_link_password(given: Option<&str>) -> Result<String> {
    match given {
        Some(password) => Ok(password.to_string()),
        None => rpassword::prompt_password("link password: ").context("reading password"),
    }
}

fn default_decrypt_output(input: &Path) -> PathBuf {
    match input.extension().and_then(|e| e.to_str()) {
        Some("enc") => input.with_extension(""),
        _ => PathBuf::from(format!("{}.dec", input.display())),
    }
}

/// Expand a leading `~/` against $HOME; paths are otherwise used as-is.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
