mod cli;
mod config;
mod error;
mod logging;
mod migrate;
mod model;
mod pacing;
mod providers;

use anyhow::{Context, Result};

use cli::Invocation;
use migrate::attachments::AttachmentOptions;
use migrate::{MigrationOptions, Migrator};
use providers::planka::PlankaClient;
use providers::trello::TrelloClient;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if cli::parse_args(&args)? == Invocation::Help {
        cli::print_help();
        return Ok(());
    }

    logging::init_tracing();

    let path = config::config_path();
    let config = config::load_config(&path)?;
    let (trello_cfg, planka_cfg) = config.require_services(&path)?;
    let migration = &config.migration;

    let sink = logging::default_sink(&migration.log_path())?;

    let planka = match PlankaClient::login(
        &planka_cfg.url,
        &planka_cfg.username,
        &planka_cfg.password,
    )
    .await
    .context("Planka authorisation failed")
    {
        Ok(client) => client,
        Err(e) => {
            sink.append(&format!("Migration aborted: {e:#}"));
            return Err(e);
        }
    };
    sink.append("Received bearer token from Planka, successful authorisation on the server");

    let trello = TrelloClient::new(
        trello_cfg.base_url.clone(),
        trello_cfg.api_key.clone(),
        trello_cfg.token.clone(),
    );

    std::fs::create_dir_all(&migration.scratch_dir).with_context(|| {
        format!(
            "Failed to create scratch directory {}",
            migration.scratch_dir.display()
        )
    })?;

    let options = MigrationOptions {
        attachments: AttachmentOptions {
            add_date_to_filename: migration.add_date_to_filename,
            timezone: migration.timezone()?,
            scratch_dir: migration.scratch_dir.clone(),
        },
        order: migration.order,
        show_progress: true,
    };

    let mut migrator = Migrator::new(
        Box::new(trello),
        Box::new(planka),
        sink,
        pacing::from_delay(migration.request_delay()),
        options,
    );
    migrator.run().await?;

    Ok(())
}
