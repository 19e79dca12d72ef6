//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use notepin_core::Notebook;
use notepin_shared::{AppConfig, Chunk, Screenshot, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notepin: jot notes now, export them as one document later.
#[derive(Parser)]
#[command(
    name = "notepin",
    version,
    about = "Cache tagged notes with screenshots and compile them into .docx documents.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.notepin/notepin.toml.
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config_path: Option<PathBuf>,

    /// Data directory override.
    #[arg(long, env = "NOTEPIN_DATA_DIR", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// The (tag, title) pair every note command addresses.
#[derive(Args)]
pub(crate) struct KeyArgs {
    /// Note tag (defaults to the configured default tag).
    #[arg(short, long, default_value = "")]
    pub tag: String,

    /// Note title (defaults to the configured default title).
    #[arg(short = 'n', long, default_value = "")]
    pub title: String,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Cache a note chunk for later submission.
    Append {
        #[command(flatten)]
        key: KeyArgs,

        /// Note text. Read from stdin when omitted.
        #[arg(short, long)]
        content: Option<String>,

        /// Where the note came from.
        #[arg(short, long, default_value = "")]
        source: String,

        /// Image files to attach (can be specified multiple times).
        #[arg(long = "screenshot")]
        screenshots: Vec<PathBuf>,
    },

    /// Print how many chunks are waiting for a key.
    Count {
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Compile cached chunks into the key's document.
    Submit {
        #[command(flatten)]
        key: KeyArgs,

        /// Source recorded for this entry (overrides chunk sources).
        #[arg(short, long, default_value = "")]
        source: String,

        /// Print the structured result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the submitted metadata record for a key.
    Show {
        #[command(flatten)]
        key: KeyArgs,
    },

    /// Screenshot management.
    Image {
        #[command(subcommand)]
        action: ImageAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Image subcommands.
#[derive(Subcommand)]
pub(crate) enum ImageAction {
    /// Store a pasted `data:image/...;base64,` URL under a file name.
    Save {
        /// File name inside the images directory.
        #[arg(long)]
        filename: String,

        /// The data URL (or bare base64).
        data_url: String,
    },
    /// Copy an image file into the images directory.
    Import {
        /// Image to copy.
        path: PathBuf,
    },
    /// Print an image file as a data URL.
    Show {
        /// Image path, or a file name inside the images directory.
        path: PathBuf,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notepin=info",
        1 => "notepin=debug",
        _ => "notepin=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config_path.as_deref(), cli.data_dir)?;

    match cli.command {
        Command::Append {
            key,
            content,
            source,
            screenshots,
        } => cmd_append(config, &key, content, &source, &screenshots).await,
        Command::Count { key } => cmd_count(config, &key).await,
        Command::Submit { key, source, json } => cmd_submit(config, &key, &source, json).await,
        Command::Show { key } => cmd_show(config, &key).await,
        Command::Image { action } => match action {
            ImageAction::Save { filename, data_url } => {
                cmd_image_save(config, &filename, &data_url).await
            }
            ImageAction::Import { path } => cmd_image_import(config, &path).await,
            ImageAction::Show { path } => cmd_image_show(config, &path).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(&config).await,
        },
    }
}

/// Config file (explicit or default location), then CLI overrides.
fn resolve_config(path: Option<&Path>, data_dir: Option<String>) -> Result<AppConfig> {
    let mut config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    if data_dir.is_some() {
        config.storage.data_dir = data_dir;
    }
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_append(
    config: AppConfig,
    key: &KeyArgs,
    content: Option<String>,
    source: &str,
    screenshots: &[PathBuf],
) -> Result<()> {
    let notebook = Notebook::open(config)?;

    let content = match content {
        Some(c) => c,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| eyre!("failed to read note text from stdin: {e}"))?;
            buf
        }
    };

    if content.trim().is_empty() && screenshots.is_empty() {
        return Err(eyre!("nothing to cache: provide note text or at least one --screenshot"));
    }

    let mut chunk = Chunk::text(content, source);
    for path in screenshots {
        let (filename, _) = notebook.images().import(path).await?;
        chunk = chunk.with_screenshot(Screenshot::new(filename, path.to_string_lossy()));
    }

    info!(tag = %key.tag, title = %key.title, screenshots = screenshots.len(), "caching note");
    let receipt = notebook.append(&key.tag, &key.title, chunk).await?;

    println!("Cached ({} pending) in {}", receipt.count, receipt.path.display());
    Ok(())
}

async fn cmd_count(config: AppConfig, key: &KeyArgs) -> Result<()> {
    let notebook = Notebook::open(config)?;
    println!("{}", notebook.count(&key.tag, &key.title).await);
    Ok(())
}

async fn cmd_submit(config: AppConfig, key: &KeyArgs, source: &str, json: bool) -> Result<()> {
    let notebook = Notebook::open(config)?;

    if json {
        let outcome = notebook.submit_outcome(&key.tag, &key.title, source).await;
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let receipt = notebook.submit(&key.tag, &key.title, source).await?;

    println!();
    println!("  Notes submitted!");
    println!("  Document: {}", receipt.docx_path.display());
    println!("  Metadata: {}", receipt.metadata_path.display());
    println!("  Entries:  {}", receipt.entry_count);
    println!();

    Ok(())
}

async fn cmd_show(config: AppConfig, key: &KeyArgs) -> Result<()> {
    let notebook = Notebook::open(config)?;
    match notebook.metadata(&key.tag, &key.title).await? {
        Some(metadata) => println!("{}", serde_json::to_string_pretty(&metadata)?),
        None => {
            let resolved = notebook.key(&key.tag, &key.title);
            return Err(eyre!("no submitted notes for {resolved}"));
        }
    }
    Ok(())
}

async fn cmd_image_save(config: AppConfig, filename: &str, data_url: &str) -> Result<()> {
    let notebook = Notebook::open(config)?;
    let path = notebook.images().save_data_url(data_url, filename).await?;
    println!("{}", path.display());
    Ok(())
}

async fn cmd_image_import(config: AppConfig, path: &Path) -> Result<()> {
    let notebook = Notebook::open(config)?;
    let (filename, stored) = notebook.images().import(path).await?;
    info!(%filename, "imported image");
    println!("{}", stored.display());
    Ok(())
}

async fn cmd_image_show(config: AppConfig, path: &Path) -> Result<()> {
    let notebook = Notebook::open(config)?;
    let images = notebook.images();

    let target = if path.exists() {
        path.to_path_buf()
    } else {
        images
            .resolve(&path.to_string_lossy())
            .ok_or_else(|| eyre!("not an image file name: {}", path.display()))?
    };

    println!("{}", images.read_data_url(&target).await?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    println!("# data dir:   {}", config.data_dir()?.display());
    println!("# images dir: {}", config.images_dir()?.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn append_collects_repeated_screenshots() {
        let cli = Cli::try_parse_from([
            "notepin",
            "append",
            "--tag",
            "work",
            "-n",
            "Q1",
            "--content",
            "hello",
            "--screenshot",
            "a.png",
            "--screenshot",
            "b.png",
        ])
        .unwrap();

        let Command::Append {
            key,
            content,
            screenshots,
            ..
        } = cli.command
        else {
            panic!("expected append");
        };
        assert_eq!(key.tag, "work");
        assert_eq!(key.title, "Q1");
        assert_eq!(content.as_deref(), Some("hello"));
        assert_eq!(screenshots.len(), 2);
    }

    #[test]
    fn submit_defaults_to_blank_key() {
        let cli = Cli::try_parse_from(["notepin", "submit", "--json"]).unwrap();
        let Command::Submit { key, source, json } = cli.command else {
            panic!("expected submit");
        };
        assert!(key.tag.is_empty() && key.title.is_empty() && source.is_empty());
        assert!(json);
    }

    #[test]
    fn data_dir_flag_overrides_config_file() {
        let file = std::env::temp_dir().join(format!("notepin-cli-{}.toml", std::process::id()));
        std::fs::write(
            &file,
            "[storage]\ndata_dir = \"/from/file\"\n\n[defaults]\ntag = \"inbox\"\n",
        )
        .unwrap();

        let from_file = resolve_config(Some(&file), None).unwrap();
        assert_eq!(from_file.storage.data_dir.as_deref(), Some("/from/file"));
        assert_eq!(from_file.defaults.tag, "inbox");

        let overridden = resolve_config(Some(&file), Some("/from/flag".into())).unwrap();
        assert_eq!(overridden.storage.data_dir.as_deref(), Some("/from/flag"));
        assert_eq!(overridden.defaults.tag, "inbox");

        let _ = std::fs::remove_file(&file);
    }
}
