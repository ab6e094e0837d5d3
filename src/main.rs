use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use practice_onboarding::config;
use practice_onboarding::db::{self, SqliteHost};
use practice_onboarding::handlers;
use practice_onboarding::i18n::Catalog;
use practice_onboarding::model::{OrgType, SendMessageRequest};
use practice_onboarding::platform::Directory;
use practice_onboarding::{bot_commands, Onboarding};

#[derive(Debug, Parser)]
#[command(author, version, about = "Onboarding content for Practice Chat realms")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a realm with its default streams, bots and seed messages
    CreateRealm {
        #[arg(long)]
        string_id: String,
        #[arg(long)]
        name: String,
        /// Host name; defaults to `<string_id>.<internal bot domain>`
        #[arg(long)]
        host: Option<String>,
        #[arg(long, default_value = "business")]
        org_type: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Create a user and send the welcome direct messages
    CreateUser {
        /// Realm string id
        #[arg(long)]
        realm: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// Report whether any realm is missing an internal bot
    CheckBots,
    /// Provision internal bots for every realm if any is missing
    EnsureBots,
    /// Send a direct message to the Welcome Bot as a user
    Reply {
        #[arg(long)]
        user: i64,
        #[arg(long)]
        text: String,
    },
    /// Print the Welcome Bot command list
    Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if let Command::Commands = args.command {
        println!("{}", bot_commands(false));
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))?;
    cfg.ensure_dirs()?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let catalog = Catalog::load_dir(Path::new(&cfg.locale.dir))?;

    let pool = db::init_pool(&database_url).await?;
    db::run_migrations(&pool).await?;

    let cfg = Arc::new(cfg);
    let host = SqliteHost::new(pool.clone(), cfg.clone());
    let onboarding = Onboarding::new(host, cfg.clone(), Arc::new(catalog));

    match args.command {
        Command::CreateRealm {
            string_id,
            name,
            host,
            org_type,
            language,
        } => {
            let org_type = OrgType::parse_name(&org_type)
                .ok_or_else(|| anyhow!("unknown org type '{org_type}'"))?;
            let host =
                host.unwrap_or_else(|| format!("{string_id}.{}", cfg.server.internal_bot_domain));
            let realm = {
                let mut tx = pool.begin().await?;
                let realm =
                    db::create_realm(&mut tx, &string_id, &name, &host, org_type, &language).await?;
                db::create_stream(&mut tx, realm.id, &cfg.realm.default_notification_stream_name, false)
                    .await?;
                db::create_stream(&mut tx, realm.id, &cfg.realm.initial_private_stream_name, true)
                    .await?;
                tx.commit().await?;
                realm
            };
            handlers::on_realm_created(&onboarding, &realm).await?;
            info!(realm = realm.id, "realm created");
            println!("{}", realm.id);
        }
        Command::CreateUser {
            realm,
            email,
            name,
            language,
        } => {
            let mut conn = pool.acquire().await?;
            let realm = db::get_realm_by_string_id(&mut conn, &realm).await?;
            let user = db::create_user(&mut conn, realm.id, &email, &name, false, &language).await?;
            drop(conn);
            handlers::on_user_created(&onboarding, &user).await?;
            println!("{}", user.id);
        }
        Command::CheckBots => {
            let missing = onboarding.missing_any_realm_internal_bots().await?;
            println!("{}", if missing { "missing" } else { "ok" });
        }
        Command::EnsureBots => {
            onboarding.create_if_missing_realm_internal_bots().await?;
        }
        Command::Reply { user, text } => {
            let sender = onboarding.platform().user(user).await?;
            let welcome_bot = onboarding
                .platform()
                .system_bot(&cfg.bots.welcome_bot, sender.realm_id)
                .await?;
            {
                let mut conn = pool.acquire().await?;
                db::insert_direct_message(&mut conn, &sender, &welcome_bot, &text, false).await?;
            }
            let request = SendMessageRequest {
                sender,
                recipient: welcome_bot,
                content: text,
            };
            let replied = handlers::on_direct_message(&onboarding, &request).await?;
            if !replied {
                println!("no reply");
            }
        }
        Command::Commands => unreachable!("handled before loading config"),
    }

    Ok(())
}
