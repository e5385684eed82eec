//! Issue a credential directly against the database.
//!
//! Used to bootstrap the first elevated credential, which can then manage
//! every other credential over HTTP. The plaintext is printed once.
//!
//! ```text
//! issue-key --label "Bootstrap Admin" --elevated --expires-in-days 90
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use keygate::{
    config::Config,
    db,
    services::credential_issuer::{self, IssueParams},
    store::postgres::PgCredentialStore,
};

#[derive(Debug, Parser)]
#[command(name = "issue-key", about = "Issue a keygate credential")]
struct Args {
    /// Label for the credential
    #[arg(long, default_value = "Bootstrap Admin Key")]
    label: String,

    /// Optional description
    #[arg(long)]
    description: Option<String>,

    /// Recorded as the issuer
    #[arg(long, default_value = "bootstrap")]
    issued_by: String,

    /// Days until expiry; omit for no expiry
    #[arg(long)]
    expires_in_days: Option<i64>,

    /// Grant the credential-management capability
    #[arg(long)]
    elevated: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url, 1).await?;
    db::run_migrations(&pool).await?;

    let store = PgCredentialStore::new(pool);
    let issued = credential_issuer::issue(
        &store,
        IssueParams {
            label: args.label,
            description: args.description,
            issued_by: Some(args.issued_by),
            expires_in_days: args.expires_in_days,
            elevated: args.elevated,
        },
    )
    .await?;

    let record = &issued.record;
    println!("Credential issued. Save it now; it cannot be shown again.\n");
    println!("  Credential: {}", issued.plaintext.expose());
    println!("  Id:         {}", record.id);
    println!("  Prefix:     {}", record.display_prefix);
    println!("  Label:      {}", record.label);
    println!("  Elevated:   {}", record.elevated);
    match record.expires_at {
        Some(expires_at) => println!("  Expires:    {expires_at}"),
        None => println!("  Expires:    never"),
    }

    Ok(())
}
