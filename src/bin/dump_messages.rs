use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use practice_onboarding::config;
use practice_onboarding::db;

#[derive(Debug, Parser)]
#[command(author, version, about = "Print stored messages and reactions of a realm")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Realm id
    #[arg(long)]
    realm: i64,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))?;
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| cfg.database_url());
    let pool = db::init_pool(&database_url).await?;
    let mut conn = pool.acquire().await?;

    let messages = db::realm_messages(&mut conn, args.realm).await?;
    let reactions = db::realm_reactions(&mut conn, args.realm).await?;

    for msg in &messages {
        if args.json {
            println!("{}", serde_json::to_string(msg)?);
            continue;
        }
        let target = match (&msg.stream, &msg.topic, &msg.recipient_email) {
            (Some(stream), Some(topic), _) => format!("#{stream} > {topic}"),
            (_, _, Some(recipient)) => format!("@{recipient}"),
            _ => "?".to_string(),
        };
        println!("[{} {}] {} -> {}", msg.id, msg.date_sent, msg.sender_email, target);
        for line in msg.content.lines() {
            println!("    {line}");
        }
        for r in reactions.iter().filter(|r| r.message_id == msg.id) {
            println!(
                "    :{}: ({} {}) by {}",
                r.emoji_name,
                r.reaction_type.as_str(),
                r.emoji_code,
                r.user_email
            );
        }
    }
    if args.json {
        for r in &reactions {
            println!("{}", serde_json::to_string(r)?);
        }
    }

    Ok(())
}
