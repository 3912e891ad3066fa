mod prompt;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dialoguer::{Input, Select};
use readdon_adapters::configuration;
use readdon_adapters::telemetry;
use readdon_adapters::{CsvCredentialStore, FileActionLog, JsonAddonCache, StremioApiClient};
use readdon_core::config::Settings;
use readdon_core::ports::{AddonCacheRepository, CredentialRepository};
use readdon_core::use_cases::{
    CloneAccountUseCase, LoadCustomAddonsUseCase, ProcessAccountUseCase, SyncAccountsUseCase,
};
use readdon_core::AddonFilter;
use tracing::{error, info};

use crate::prompt::DialoguerUrlPrompt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Without a subcommand an interactive menu is shown
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Update the addon collection of every stored account
    Sync {
        /// Log the resulting collections without writing them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },

    /// Copy one account's non-default addons into the custom addon cache
    Clone {
        /// Account email (prompted when omitted)
        #[arg(short, long)]
        email: Option<String>,
    },

    /// Show stored accounts and the cached custom addons
    Status,
}

const MENU_ITEMS: [&str; 2] = [
    "1. Update all accounts",
    "2. Clone an account's addons",
];

/// Adapters shared by every command
struct App {
    settings: Settings,
    api: Arc<StremioApiClient>,
    credentials: Arc<CsvCredentialStore>,
    cache: Arc<JsonAddonCache>,
    log: Arc<FileActionLog>,
}

impl App {
    fn new(settings: Settings) -> anyhow::Result<Self> {
        Ok(Self {
            api: Arc::new(StremioApiClient::new(&settings.api)?),
            credentials: Arc::new(CsvCredentialStore::new(&settings.files.credentials)),
            cache: Arc::new(JsonAddonCache::new(&settings.files.custom_addons)),
            log: Arc::new(FileActionLog::new(&settings.files.action_log)),
            settings,
        })
    }

    fn filter(&self) -> AddonFilter {
        AddonFilter::from_settings(&self.settings.sync)
    }

    async fn sync(&self, dry_run: bool) -> anyhow::Result<()> {
        let loader = LoadCustomAddonsUseCase::new(self.cache.clone(), self.api.clone(), self.log.clone());
        let mut prompt = DialoguerUrlPrompt::new();
        let custom = loader.execute(&mut prompt).await?;

        let processor = ProcessAccountUseCase::new(self.api.clone(), self.log.clone(), self.filter())
            .with_dry_run(dry_run);
        let use_case = SyncAccountsUseCase::new(
            self.credentials.clone(),
            processor,
            self.log.clone(),
            self.settings.sync.effective_concurrency(),
        );

        let summary = use_case.execute(&custom).await?;
        info!(
            succeeded = summary.succeeded(),
            failed = summary.failed(),
            dry_run,
            "sync finished"
        );

        for outcome in summary.outcomes.iter().filter(|o| !o.is_success()) {
            println!("  {} stopped at {}", outcome.email, outcome.stage);
        }
        Ok(())
    }

    async fn clone_account(&self, email: Option<String>) -> anyhow::Result<()> {
        let email = match email {
            Some(e) => e,
            None => Input::<String>::new().with_prompt("Email").interact_text()?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        let use_case = CloneAccountUseCase::new(
            self.api.clone(),
            self.cache.clone(),
            self.log.clone(),
            self.filter(),
        );

        // Already recorded in the action log
        if let Err(e) = use_case.execute(email.trim(), &password).await {
            error!(error = %e, "clone failed");
        }
        Ok(())
    }

    async fn status(&self) -> anyhow::Result<()> {
        let accounts = self.credentials.load_credentials().await?;
        println!(
            "Accounts ({}) in {}:",
            accounts.len(),
            self.credentials.path().display()
        );
        for account in &accounts {
            let token = if account.cached_token().is_some() {
                "token cached"
            } else {
                "no token"
            };
            println!("  - {} ({})", account.email, token);
        }

        match self.cache.load().await? {
            None => println!(
                "No custom addon cache at {}.",
                self.cache.path().display()
            ),
            Some(addons) => {
                println!(
                    "Custom addons ({}) in {}:",
                    addons.len(),
                    self.cache.path().display()
                );
                for addon in &addons {
                    println!("  - {} [{}] {}", addon.display_name(), addon.id(), addon.transport_url);
                }
            }
        }
        Ok(())
    }
}

fn choose_from_menu() -> anyhow::Result<Commands> {
    let choice = Select::new()
        .with_prompt("Choose an option")
        .items(&MENU_ITEMS)
        .default(0)
        .interact()?;

    Ok(match choice {
        0 => Commands::Sync { dry_run: false },
        _ => Commands::Clone { email: None },
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match configuration::get_configuration() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to load configuration: {}", e);
            return Err(anyhow::anyhow!("configuration loading failed"));
        }
    };

    let _guard = telemetry::init_subscriber("readdon", &settings.log_level)?;

    let app = App::new(settings)?;

    let command = match cli.command {
        Some(command) => command,
        None => choose_from_menu()?,
    };

    match command {
        Commands::Sync { dry_run } => app.sync(dry_run).await?,
        Commands::Clone { email } => app.clone_account(email).await?,
        Commands::Status => app.status().await?,
    }

    Ok(())
}
