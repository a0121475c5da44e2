//! Talewright console driver.
//!
//! Reads player lines from stdin and prints each turn response as JSON.
//! `/roll <notation|number>` answers the open check and
//! `/scene <name>, <name>` sets who is present.

use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};

use talewright_core::clock::SystemClock;
use talewright_core::rng::{DeterministicRng, SystemRng};
use talewright_rules::domain::dice::RollResult;
use talewright_session::config::{LogFormat, SessionConfig};
use talewright_session::error::AppError;
use talewright_session::narrator::TemplateNarrator;
use talewright_session::store::SessionStore;
use talewright_session::turn::{TurnRequest, TurnService};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = SessionConfig::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Pretty => subscriber.pretty().init(),
    }

    let rng = match config.rng_seed {
        Some(seed) => SystemRng::seeded(seed),
        None => SystemRng::from_os(),
    };
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(rng));
    let campaign_id = Uuid::new_v4();
    tracing::info!(%campaign_id, seeded = config.rng_seed.is_some(), "Starting Talewright console");

    let service = TurnService::new(
        config,
        SessionStore::in_memory(),
        Arc::new(SystemClock),
        Arc::clone(&rng),
        Arc::new(TemplateNarrator),
    );

    run(&service, campaign_id, &rng).await?;
    Ok(())
}

async fn run(
    service: &TurnService,
    campaign_id: Uuid,
    rng: &Mutex<dyn DeterministicRng + Send>,
) -> Result<(), AppError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut scene: Vec<String> = Vec::new();
    let mut pending_check_id: Option<Uuid> = None;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let output = if let Some(names) = line.strip_prefix("/scene") {
            scene = names
                .split(',')
                .map(|name| name.trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect();
            serde_json::json!({ "scene": scene })
        } else {
            let request = if let Some(notation) = line.strip_prefix("/roll") {
                let roll = {
                    let mut guard = rng.lock().unwrap_or_else(PoisonError::into_inner);
                    RollResult::from_input(notation.trim(), &mut *guard)
                };
                match roll {
                    Ok(roll) => TurnRequest::roll(campaign_id, pending_check_id, roll),
                    Err(err) => {
                        write_line(&mut stdout, &serde_json::json!({ "error": err.to_string() }))
                            .await?;
                        continue;
                    }
                }
            } else {
                TurnRequest {
                    scene_participants: scene.clone(),
                    ..TurnRequest::action(campaign_id, line)
                }
            };

            match service.handle_turn(&request).await {
                Ok(response) => {
                    match response.pending_check_id() {
                        Some(id) => pending_check_id = Some(id),
                        None if request.roll_result.is_some() => pending_check_id = None,
                        None => {}
                    }
                    serde_json::to_value(&response)
                        .unwrap_or_else(|e| serde_json::json!({ "error": e.to_string() }))
                }
                Err(err) => {
                    tracing::error!(error = %err, "turn failed");
                    serde_json::json!({ "error": err.to_string() })
                }
            }
        };
        write_line(&mut stdout, &output).await?;
    }

    Ok(())
}

async fn write_line(
    stdout: &mut tokio::io::Stdout,
    value: &serde_json::Value,
) -> Result<(), AppError> {
    stdout.write_all(format!("{value}\n").as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
