use clap::Parser;
use safe_relay::config::{load_env_files, Cli, Command, RegisterArgs, ServeArgs};
use safe_relay::register::{RegistrationClient, WebhookRegistration};
use safe_relay::server::{self, AppState};
use safe_relay::EventStore;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_files = load_env_files();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    for path in &env_files {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::RegisterWebhook(args) => register(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let store = EventStore::new(args.store_config())?;
    let state = AppState::new(store, args.webhook_secret(), args.stream_settings());

    if state.webhook_auth.is_none() {
        tracing::warn!("WEBHOOK_SECRET not set, accepting unauthenticated webhooks");
    }

    let listener = TcpListener::bind(args.bind).await?;
    tracing::info!(
        addr = %args.bind,
        max_events = args.max_events,
        "Starting Safe relay"
    );

    server::run(listener, state).await?;
    Ok(())
}

async fn register(args: RegisterArgs) -> anyhow::Result<()> {
    let registration =
        WebhookRegistration::new(&args.public_url, args.webhook_secret).with_chain_ids(args.chain_ids);
    let client = RegistrationClient::new(args.events_api);

    let response = client.register(&registration).await?;
    tracing::info!("Webhook registered");
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
