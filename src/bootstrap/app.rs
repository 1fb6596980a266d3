use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio_util::sync::CancellationToken;

use crate::adapters::discord::{self, gateway::SerenityGateway};
use crate::app::services::{cache::TicketCache, scheduler::DelayedCloses, Ctx};
use crate::bootstrap::config::Config;
use crate::infra::db::Database;

pub struct Application {
    config: Arc<Config>,
    db: Database,
    cancel_token: CancellationToken,
}

impl Application {
    pub async fn build(config_path: String) -> Result<Self> {
        tracing::info!(path = %config_path, "Loading config");

        let config_content = std::fs::read_to_string(&config_path)?;
        let mut config: Config = toml::from_str(&config_content)?;

        let config_path_obj = Path::new(&config_path);
        let config_dir = config_path_obj.parent().unwrap_or_else(|| Path::new("."));

        let db_path_buf = if Path::new(&config.database.db_file).is_absolute() {
            Path::new(&config.database.db_file).to_path_buf()
        } else {
            config_dir.join(&config.database.db_file)
        };
        let db_path_str = db_path_buf
            .to_str()
            .ok_or_else(|| anyhow!("Invalid DB path"))?
            .to_string();
        tracing::info!(db_path = %db_path_str, "Database path");
        config.database.db_file.clone_from(&db_path_str);

        let config = Arc::new(config);
        let db = Database::new(&db_path_str).await?;
        let cancel_token = CancellationToken::new();

        Ok(Self {
            config,
            db,
            cancel_token,
        })
    }

    pub async fn run(self) -> Result<()> {
        let Self {
            config,
            db,
            cancel_token,
        } = self;

        let gateway = Arc::new(SerenityGateway::new(
            &config.discord.token,
            config.discord.guild_id,
        ));
        let ctx = Ctx {
            db: db.clone(),
            gateway,
            config: config.clone(),
            cache: TicketCache::new(),
            delayed: DelayedCloses::new(),
        };

        // The cache is advisory; reconcile it with the store before any
        // event can consult it.
        let open_tickets = ctx.cache.rebuild(&ctx.db).await?;
        tracing::info!(open_tickets, "Ticket cache rebuilt from store");

        tokio::spawn(wait_for_shutdown_signal(cancel_token.clone()));

        let result = discord::run_discord_bot(discord::DiscordRunArgs {
            ctx,
            cancel_token: cancel_token.clone(),
        })
        .await;
        if let Err(e) = &result {
            tracing::error!(error = %e, "Discord client exited with error");
        }

        tracing::info!(component = "shutdown", "Closing database pool");
        db.close().await;
        tracing::info!(component = "shutdown", "Database pool closed");

        result
    }
}

#[cfg(unix)]
async fn wait_for_termination_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::error!(error = %e, "Failed to register SIGTERM handler");
            tokio::signal::ctrl_c().await.ok();
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_termination_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }
}

async fn wait_for_shutdown_signal(cancel_token: CancellationToken) {
    wait_for_termination_signal().await;
    tracing::info!(component = "shutdown", "Termination signal received");
    cancel_token.cancel();
}
