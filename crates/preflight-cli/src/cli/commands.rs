use std::sync::Arc;

use anyhow::Result;
use preflight_core::changes::{ChangeStore, CuratedFeed};
use preflight_core::config::ConfigStore;
use preflight_core::manager::BackupManager;
use preflight_core::report::ValidationStatus;
use preflight_core::supervisor::SupervisorClient;
use tracing::info;

use crate::cli::args::{ChangesAction, Cli, Command, ConfigAction};

const EXIT_OK: i32 = 0;
const EXIT_INCOMPATIBLE: i32 = 1;
const EXIT_ERROR: i32 = 2;
const EXIT_UNREACHABLE: i32 = 3;

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn dispatch(cli: Cli) -> Result<i32> {
    let client = Arc::new(SupervisorClient::new(&cli.supervisor_url, &cli.token));
    let store = Arc::new(ChangeStore::open(cli.data_dir.join("breaking_changes.json"))?);
    let config = ConfigStore::new(cli.data_dir.join("config.json"));
    let manager = BackupManager::new(client.clone(), store.clone());

    match cli.command {
        Command::List => {
            let backups = manager.list_backups().await?;
            print_json(&backups)?;
            Ok(EXIT_OK)
        }
        Command::Show { backup_id } => match manager.backup_details(&backup_id).await? {
            Some(details) => {
                print_json(&details)?;
                Ok(EXIT_OK)
            }
            None => {
                eprintln!("backup {backup_id} not found");
                Ok(EXIT_ERROR)
            }
        },
        Command::Create { name, password } => {
            let outcome = manager.create_backup(&name, password.as_deref()).await?;
            print_json(&outcome)?;
            Ok(EXIT_OK)
        }
        Command::Validate { backup_id } => {
            let report = manager.validate_backup(&backup_id).await;
            print_json(&report)?;
            Ok(match report.status {
                ValidationStatus::Compatible | ValidationStatus::CompatibleWithWarnings => EXIT_OK,
                ValidationStatus::Incompatible => EXIT_INCOMPATIBLE,
                ValidationStatus::Error => EXIT_ERROR,
            })
        }
        Command::Restore { backup_id, password } => {
            let outcome = manager.restore_backup(&backup_id, password.as_deref()).await?;
            print_json(&outcome)?;
            Ok(EXIT_OK)
        }
        Command::Delete { backup_id } => {
            manager.delete_backup(&backup_id).await?;
            info!(%backup_id, "backup deleted");
            println!("deleted {backup_id}");
            Ok(EXIT_OK)
        }
        Command::Changes { action } => match action {
            ChangesAction::Update => {
                if store.update(&CuratedFeed)? {
                    println!("change database updated ({} records)", store.len());
                } else {
                    println!("change database already up to date ({} records)", store.len());
                }
                Ok(EXIT_OK)
            }
            ChangesAction::List => {
                print_json(&store.all())?;
                Ok(EXIT_OK)
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Show => {
                println!("{}", config.export()?);
                Ok(EXIT_OK)
            }
            ConfigAction::Reset => {
                let defaults = config.reset_to_defaults()?;
                print_json(&defaults)?;
                Ok(EXIT_OK)
            }
            ConfigAction::Import { json } => {
                let saved = config.import(&json)?;
                print_json(&saved)?;
                Ok(EXIT_OK)
            }
        },
        Command::Status => {
            if !client.ping().await {
                eprintln!("supervisor unreachable at {}", cli.supervisor_url);
                return Ok(EXIT_UNREACHABLE);
            }
            let storage = client.storage_info().await?;
            print_json(&storage)?;
            Ok(EXIT_OK)
        }
    }
}
