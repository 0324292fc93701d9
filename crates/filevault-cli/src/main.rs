//! File Vault CLI: command-line client for the file vault backend.
//!
//! Set FILEVAULT_API_URL (or API_URL). The credential obtained by `login` is kept
//! in FILEVAULT_CREDENTIALS_PATH and reused by every other command.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use filevault_api_client::{SessionState, UploadFile};
use filevault_app::{FilterForm, RefreshOutcome, Vault};
use filevault_cli::{
    init_tracing, render_files_table, render_stats, render_system_stats, truncate_string,
};
use filevault_core::{ClientConfig, Pagination};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "filevault", about = "File Vault CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the credential
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored credential
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List files with optional filters
    List {
        /// Substring of the file name
        #[arg(long)]
        filename: Option<String>,
        /// Type category (image, text, ...) or a full mime type
        #[arg(long)]
        mime_type: Option<String>,
        /// Minimum size in bytes (inclusive)
        #[arg(long)]
        min_size: Option<String>,
        /// Maximum size in bytes (inclusive)
        #[arg(long)]
        max_size: Option<String>,
        /// Uploaded on or after (YYYY-MM-DD)
        #[arg(long)]
        start_date: Option<String>,
        /// Uploaded on or before (YYYY-MM-DD)
        #[arg(long)]
        end_date: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        uploader: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Storage usage and deduplication savings
    Stats {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Upload one or more files in a single request
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Delete a file by ID
    Delete { id: u64 },
    /// Download a file by ID
    Download {
        id: u64,
        /// Destination path (defaults to the file ID in the current directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Print a download link that carries the credential
    Link { id: u64 },
    /// Administrator views
    Admin {
        #[command(subcommand)]
        sub: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// All files across users
    Files {
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value = "20")]
        limit: u32,
    },
    /// System-wide totals
    Stats,
    /// All users
    Users,
    /// Audit trail
    AuditLogs,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = ClientConfig::from_env().context("Invalid configuration")?;
    let vault = Vault::open(&config)
        .await
        .with_context(|| format!("Failed to open {}", config.credentials_path.display()))?;

    match cli.command {
        Commands::Login { email, password } => {
            let user = vault.login(&email, &password).await?;
            println!("Signed in as {} <{}>", user.username, user.email);
            report_notification(&vault).await;
        }
        Commands::Register {
            username,
            email,
            password,
        } => {
            let user = vault.register(&username, &email, &password).await?;
            println!("Registered and signed in as {}", user.username);
        }
        Commands::Logout => {
            vault.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami => {
            require_session(&vault).await?;
            if let Some(user) = vault.profile() {
                print_json(&user)?;
            }
        }
        Commands::List {
            filename,
            mime_type,
            min_size,
            max_size,
            start_date,
            end_date,
            tags,
            uploader,
            page,
            limit,
            format,
        } => {
            require_session(&vault).await?;
            let form = FilterForm {
                filename: filename.unwrap_or_default(),
                mime_type: mime_type.unwrap_or_default(),
                min_size: min_size.unwrap_or_default(),
                max_size: max_size.unwrap_or_default(),
                start_date: start_date.unwrap_or_default(),
                end_date: end_date.unwrap_or_default(),
                tags: tags.unwrap_or_default(),
                uploader_name: uploader.unwrap_or_default(),
            };
            let pagination = Pagination::new(page, limit.unwrap_or(config.page_limit));
            match vault.apply_filters(&form, Some(pagination)).await? {
                RefreshOutcome::Applied(snapshot) => match format {
                    OutputFormat::Json => print_json(&snapshot.files)?,
                    OutputFormat::Table => {
                        print!("{}", render_files_table(&snapshot.files));
                        println!(
                            "\n{} file(s), page {}",
                            snapshot.files.len(),
                            pagination.page
                        );
                    }
                },
                _ => bail!("Session changed while listing files"),
            }
        }
        Commands::Stats { format } => {
            require_session(&vault).await?;
            let snapshot = match vault.refresh().await? {
                RefreshOutcome::Applied(snapshot) => snapshot,
                _ => bail!("Session changed while loading storage stats"),
            };
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "stats": snapshot.stats,
                    "quota": snapshot.quota,
                    "file_count": snapshot.files.len(),
                }))?,
                OutputFormat::Table => print!("{}", render_stats(&snapshot.stats)),
            }
        }
        Commands::Upload { files } => {
            require_session(&vault).await?;
            let mut payload = Vec::with_capacity(files.len());
            for path in &files {
                payload.push(UploadFile::from_path(path).await?);
            }
            let outcome = vault.upload(payload).await?;
            println!("{}", outcome.receipt.message);
            for file in &outcome.receipt.files {
                println!(
                    "  {:<8} {}",
                    file.id,
                    truncate_string(&file.original_filename, 60)
                );
            }
            if let Err(e) = outcome.refresh {
                eprintln!("Warning: {}", e);
            }
        }
        Commands::Delete { id } => {
            require_session(&vault).await?;
            vault.delete(id).await?;
            report_notification(&vault).await;
        }
        Commands::Download { id, output } => {
            require_session(&vault).await?;
            let bytes = vault.download(id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(id.to_string()));
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved {} bytes to {}", bytes.len(), path.display());
        }
        Commands::Link { id } => {
            println!("{}", vault.download_link(id)?);
        }
        Commands::Admin { sub } => {
            require_session(&vault).await?;
            match sub {
                AdminCommands::Files { page, limit } => {
                    let listing = vault.admin_files(Pagination::new(page, limit)).await?;
                    print!("{}", render_files_table(&listing.files));
                    println!(
                        "\nPage {} of {} ({} files)",
                        listing.page, listing.total_pages, listing.total
                    );
                }
                AdminCommands::Stats => {
                    print!("{}", render_system_stats(&vault.admin_stats().await?));
                }
                AdminCommands::Users => print_json(&vault.admin_users().await?)?,
                AdminCommands::AuditLogs => print_json(&vault.admin_audit_logs().await?)?,
            }
        }
    }

    Ok(())
}

/// Validate the stored credential; fail if there is none or it was rejected.
async fn require_session(vault: &Vault) -> anyhow::Result<()> {
    match vault.validate_session().await? {
        SessionState::Authenticated => Ok(()),
        SessionState::Unauthenticated => bail!("Not signed in. Run `filevault login` first."),
    }
}

async fn report_notification(vault: &Vault) {
    if let Some(notification) = vault.notifier().current().await {
        println!("{}", notification.message);
    }
}
