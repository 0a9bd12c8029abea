use crate::commands::{Commands, RestoreMode};
use crate::error::Result as CliResult;

use studio_client::ApiClient;
use studio_config::Config;
use studio_orchestrator::{Backend, ProjectSession, UnpublishTarget, Workspace};

use std::io::BufRead;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};

/// Load configuration, then apply command-line overrides and validate.
pub fn build_config(server: Option<&str>, user_id: Option<&str>) -> CliResult<Config> {
    let mut config = Config::load()?;

    if let Some(server) = server {
        config.api.base_url = server.trim_end_matches('/').to_string();
        config.push.url = None;
    }
    if let Some(user_id) = user_id {
        config.api.user_id = Some(user_id.to_string());
    }

    config.validate()?;
    Ok(config)
}

/// Runs one command against a single-project workspace.
pub struct Runner {
    workspace: Workspace,
}

impl Runner {
    pub fn new(backend: Backend, config: Config) -> Self {
        Self {
            workspace: Workspace::new(backend, config),
        }
    }

    pub fn from_config(config: Config) -> CliResult<Self> {
        let client = ApiClient::from_config(&config.api)?;
        Ok(Self::new(Backend::from_client(client), config))
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub async fn run(&self, command: Commands) -> CliResult<Value> {
        let session = self.workspace.open(command.project_id()).await?;
        let result = self.execute(&session, command).await;
        self.workspace.close_all().await;
        result
    }

    async fn execute(&self, session: &ProjectSession, command: Commands) -> CliResult<Value> {
        match command {
            Commands::Status { .. } => {
                if let Err(e) = session.external().refresh().await {
                    debug!("External deployment unavailable: {e}");
                }
                Ok(json!({
                    "project": to_json(&session.lifecycle().snapshot())?,
                    "deployment": to_json(&session.deployment().snapshot())?,
                    "external": to_json(&session.external().snapshot())?,
                }))
            }
            Commands::Run { .. } => {
                session.lifecycle().start().await?;
                to_json(&session.lifecycle().snapshot())
            }
            Commands::Stop { .. } => {
                session.lifecycle().stop().await?;
                to_json(&session.lifecycle().snapshot())
            }
            Commands::Restart { .. } => {
                session.lifecycle().restart().await?;
                to_json(&session.lifecycle().snapshot())
            }
            Commands::RestartPreview { .. } => {
                session.lifecycle().restart_preview().await?;
                to_json(&session.lifecycle().snapshot())
            }
            Commands::Logs { lines, errors, .. } => {
                if errors {
                    to_json(&session.lifecycle().error_logs().await?)
                } else {
                    to_json(&session.lifecycle().logs(lines).await?)
                }
            }
            Commands::Watch { seconds, .. } => self.watch(session, seconds).await,
            Commands::Publish {
                subdomain,
                custom_domain_id,
                ..
            } => {
                let snapshot = session
                    .deployment()
                    .publish(&subdomain, custom_domain_id.as_deref())
                    .await?;
                to_json(&snapshot)
            }
            Commands::Unpublish {
                custom_domain_id, ..
            } => {
                let target = match custom_domain_id {
                    Some(id) => UnpublishTarget::CustomDomain(id),
                    None => UnpublishTarget::Subdomain,
                };
                to_json(&session.deployment().unpublish(target).await?)
            }
            Commands::DeployExternal { branch, .. } => {
                to_json(&session.external().deploy(branch.as_deref()).await?)
            }
            Commands::Restore {
                snapshot_id,
                yes,
                cancel,
                session_id,
                chat_room_id,
                ..
            } => {
                let proposed = session.restore().propose(&snapshot_id).await?;
                info!("Snapshot {snapshot_id} restored temporarily");

                let keep = match RestoreMode::from_flags(yes, cancel) {
                    RestoreMode::Confirm => true,
                    RestoreMode::Cancel => false,
                    RestoreMode::Ask => ask_keep(&snapshot_id).await?,
                };

                let outcome = if keep {
                    session
                        .restore()
                        .confirm(session_id.as_deref(), chat_room_id.as_deref())
                        .await?;
                    "confirmed"
                } else {
                    session.restore().cancel().await?;
                    "cancelled"
                };

                Ok(json!({
                    "snapshotId": snapshot_id,
                    "originalHead": proposed.original_head,
                    "outcome": outcome,
                }))
            }
            Commands::Commits { limit, .. } => to_json(&session.restore().commits(limit).await?),
        }
    }

    /// Print events as JSON lines until Ctrl-C or the optional deadline.
    async fn watch(&self, session: &ProjectSession, seconds: Option<u64>) -> CliResult<Value> {
        let mut subscription = self
            .workspace
            .events()
            .subscribe_project(session.project_id());
        println!("{}", serde_json::to_string(&session.lifecycle().snapshot())?);

        let deadline = async {
            match seconds {
                Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(deadline);

        let mut printed = 0u64;
        loop {
            tokio::select! {
                event = subscription.recv() => match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(line) => println!("{line}"),
                            Err(e) => warn!("Skipping unserializable event: {e}"),
                        }
                        printed += 1;
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => break,
                _ = &mut deadline => break,
            }
        }

        Ok(json!({ "events": printed }))
    }
}

fn to_json<T: Serialize>(value: &T) -> CliResult<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Ask on the terminal whether to keep the restored snapshot.
async fn ask_keep(snapshot_id: &str) -> CliResult<bool> {
    eprint!("Keep snapshot {snapshot_id}? [y/N] ");
    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line).map(|_| line)
    })
    .await
    .map_err(std::io::Error::other)??;

    Ok(parse_answer(&answer))
}

pub(crate) fn parse_answer(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
