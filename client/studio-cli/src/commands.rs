use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show project status, preview and deployment state
    Status { project_id: String },

    /// Start the environment and wait until the preview is ready
    Run { project_id: String },

    /// Stop the preview
    Stop { project_id: String },

    /// Restart the environment, clearing a failed state
    Restart { project_id: String },

    /// Restart only the dev server and wait until the preview is ready
    RestartPreview { project_id: String },

    /// Print dev-server output
    Logs {
        project_id: String,

        /// How many trailing lines to fetch
        #[arg(long, default_value_t = 100)]
        lines: u32,

        /// Print the dev server's error output instead
        #[arg(long)]
        errors: bool,
    },

    /// Print lifecycle events as JSON lines
    Watch {
        project_id: String,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        seconds: Option<u64>,
    },

    /// Publish to <subdomain>.<suffix>
    Publish {
        project_id: String,
        subdomain: String,

        #[arg(long)]
        custom_domain_id: Option<String>,
    },

    /// Take the published subdomain (or one custom domain) down
    Unpublish {
        project_id: String,

        /// Detach only this custom domain
        #[arg(long)]
        custom_domain_id: Option<String>,
    },

    /// Build and host on the external platform
    DeployExternal {
        project_id: String,

        #[arg(long)]
        branch: Option<String>,
    },

    /// Restore the project to an earlier snapshot
    Restore {
        project_id: String,
        snapshot_id: String,

        /// Keep the restored version without asking
        #[arg(long, conflicts_with = "cancel")]
        yes: bool,

        /// Preview the snapshot, then put the current version back
        #[arg(long)]
        cancel: bool,

        #[arg(long)]
        session_id: Option<String>,

        #[arg(long)]
        chat_room_id: Option<String>,
    },

    /// List snapshot history, newest first
    Commits {
        project_id: String,

        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
}

impl Commands {
    pub fn project_id(&self) -> &str {
        match self {
            Commands::Status { project_id }
            | Commands::Run { project_id }
            | Commands::Stop { project_id }
            | Commands::Restart { project_id }
            | Commands::RestartPreview { project_id }
            | Commands::Logs { project_id, .. }
            | Commands::Watch { project_id, .. }
            | Commands::Publish { project_id, .. }
            | Commands::Unpublish { project_id, .. }
            | Commands::DeployExternal { project_id, .. }
            | Commands::Restore { project_id, .. }
            | Commands::Commits { project_id, .. } => project_id,
        }
    }

    /// Only `watch` needs the push stream.
    pub fn wants_push(&self) -> bool {
        matches!(self, Commands::Watch { .. })
    }
}

/// How a proposed restore is settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreMode {
    Confirm,
    Cancel,
    Ask,
}

impl RestoreMode {
    pub fn from_flags(yes: bool, cancel: bool) -> Self {
        match (yes, cancel) {
            (true, _) => RestoreMode::Confirm,
            (false, true) => RestoreMode::Cancel,
            (false, false) => RestoreMode::Ask,
        }
    }
}
