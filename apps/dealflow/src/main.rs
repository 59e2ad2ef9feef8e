use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    BoardEvent, BoardSlot, BoardSnapshot, ControllerOptions, DragReorderController, DropEvent,
    GestureOutcome, GesturePhase, HttpDealStore, MemoryDealStore, NotificationLevel,
    RemoteDealStore,
};
use shared::{
    domain::{DealId, Stage, FUNDING_STAGE_OPTIONS},
    protocol::{DealCreate, DealUpdate},
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod data_file;

use config::{load_settings, normalize_api_url};

#[derive(Parser, Debug)]
#[command(name = "dealflow", about = "Deal pipeline board")]
struct Args {
    /// Config file; defaults to ./dealflow.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[arg(long, global = true)]
    token: Option<String>,
    /// Keep deals in a local JSON file instead of talking to the API.
    #[arg(long, global = true)]
    data_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every stage with its deals in display order.
    Board,
    /// Drag a deal to a slot: TO_INDEX is its index in TO_STAGE after the drop.
    Drag {
        deal_id: DealId,
        to_stage: Stage,
        to_index: usize,
    },
    /// Move a deal to the front of a stage.
    MoveTo { deal_id: DealId, stage: Stage },
    Create {
        company: String,
        #[arg(long)]
        stage: Option<Stage>,
        #[command(flatten)]
        fields: DealFields,
    },
    /// Change deal fields. An empty value clears an optional field.
    Update {
        deal_id: DealId,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        stage: Option<Stage>,
        #[command(flatten)]
        fields: DealFields,
    },
    Delete { deal_id: DealId },
}

#[derive(clap::Args, Debug)]
struct DealFields {
    #[arg(long)]
    sector: Option<String>,
    #[arg(long, help = funding_round_help())]
    round: Option<String>,
    #[arg(long)]
    founders: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    next_step: Option<String>,
    #[arg(long)]
    owner: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(api_url) = &args.api_url {
        settings.api_url = normalize_api_url(api_url);
    }
    if let Some(token) = args.token.as_deref().map(str::trim) {
        settings.api_token = (!token.is_empty()).then(|| token.to_string());
    }

    let filter = EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let file_store = match &args.data_file {
        Some(path) => {
            let deals = data_file::load_deals(path)?;
            info!(path = %path.display(), deals = deals.len(), "using local data file");
            Some(Arc::new(MemoryDealStore::from_deals(deals)))
        }
        None => None,
    };
    let store: Arc<dyn RemoteDealStore> = match &file_store {
        Some(memory) => Arc::clone(memory) as Arc<dyn RemoteDealStore>,
        None => {
            let mut http = HttpDealStore::new(&settings.api_url)?;
            if let Some(token) = &settings.api_token {
                http = http.with_bearer_token(token.clone());
            }
            info!(api_url = %http.base_url(), "using deal api");
            Arc::new(http)
        }
    };

    let mut controller = DragReorderController::with_options(
        store,
        ControllerOptions {
            notification_ttl: Duration::from_millis(settings.notification_ttl_ms),
            ..ControllerOptions::default()
        },
    );
    let mut events = controller.subscribe();

    let result = match controller.reload().await {
        Ok(()) => run(&mut controller, args.command).await,
        Err(err) => Err(err).context("failed to load deals"),
    };
    print_notifications(&mut events);

    if let (Some(path), Some(memory)) = (&args.data_file, &file_store) {
        data_file::save_deals(path, &memory.export().await)?;
    }
    result
}

async fn run(controller: &mut DragReorderController, command: Command) -> Result<()> {
    match command {
        Command::Board => {}
        Command::Drag {
            deal_id,
            to_stage,
            to_index,
        } => {
            let from = controller
                .board()
                .locate(deal_id)
                .with_context(|| format!("deal {deal_id} is not on the board"))?;
            controller.on_drop(DropEvent::new(
                deal_id,
                from,
                BoardSlot::new(to_stage, to_index),
            ))?;
            check_outcomes(&controller.settle().await)?;
        }
        Command::MoveTo { deal_id, stage } => {
            controller.move_to_stage(deal_id, stage)?;
            check_outcomes(&controller.settle().await)?;
        }
        Command::Create {
            company,
            stage,
            fields,
        } => {
            let payload = DealCreate {
                sector: fields.sector,
                funding_stage: fields.round,
                founders: fields.founders,
                notes: fields.notes,
                next_step: fields.next_step,
                internal_owner: fields.owner,
                ..DealCreate::new(company).in_stage(stage.unwrap_or_default())
            };
            let deal = controller.create_deal(payload).await?;
            println!("created deal {}", deal.id);
        }
        Command::Update {
            deal_id,
            company,
            stage,
            fields,
        } => {
            let patch = DealUpdate {
                company,
                stage,
                sector: nullable(fields.sector),
                funding_stage: nullable(fields.round),
                founders: nullable(fields.founders),
                notes: nullable(fields.notes),
                next_step: nullable(fields.next_step),
                internal_owner: nullable(fields.owner),
            };
            if patch.is_empty() {
                bail!("nothing to update");
            }
            controller.update_deal(deal_id, patch).await?;
        }
        Command::Delete { deal_id } => {
            controller.delete_deal(deal_id).await?;
        }
    }

    print_board(&controller.snapshot());
    Ok(())
}

fn funding_round_help() -> String {
    format!(
        "Funding round, free text (usually one of: {})",
        FUNDING_STAGE_OPTIONS.join(", ")
    )
}

/// `Some("")` clears the field.
fn nullable(value: Option<String>) -> Option<Option<String>> {
    value.map(|value| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    })
}

fn check_outcomes(outcomes: &[GestureOutcome]) -> Result<()> {
    for outcome in outcomes {
        if outcome.phase == GesturePhase::RolledBack {
            bail!(
                "move of deal {} was rolled back: {}",
                outcome.command.deal_id,
                outcome.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    Ok(())
}

fn print_notifications(events: &mut broadcast::Receiver<BoardEvent>) {
    while let Ok(event) = events.try_recv() {
        if let BoardEvent::Notify(notification) = event {
            match notification.level {
                NotificationLevel::Info => println!("{}", notification.message),
                NotificationLevel::Error => eprintln!("error: {}", notification.message),
            }
        }
    }
}

fn print_board(snapshot: &BoardSnapshot) {
    for (stage, deals) in snapshot.iter() {
        println!("{} ({})", stage.label(), deals.len());
        for (index, deal) in deals.iter().enumerate() {
            match &deal.funding_stage {
                Some(round) => println!("  {index}. {} [{round}]  {}", deal.company, deal.id),
                None => println!("  {index}. {}  {}", deal.company, deal.id),
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
