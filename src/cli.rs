use std::path::PathBuf;

use clap::{Parser, Subcommand};

use laneboard::core::task::{Lane, TaskStatus};

/// Four-lane priority task board.
/// Storage defaults to the configured data directory or a path passed via --data-dir.
#[derive(Parser)]
#[command(name = "laneboard", version, about = "Four-lane priority task board")]
pub struct Cli {
    /// Directory holding data.json and settings.json.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the board, lane by lane.
    Show {
        /// Only show tasks carrying this tag. May be repeated; all must match.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Create a task.
    Add {
        /// Task title.
        #[arg(required = true)]
        title: Vec<String>,
        /// Description; `#tags` in it become the task's tags.
        #[arg(long)]
        desc: Option<String>,
        /// Priority 1 (highest) to 4. Out-of-range values are clamped.
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i64>,
        /// Due date: YYYY-MM-DD or RFC 3339.
        #[arg(long)]
        due: Option<String>,
    },

    /// Set a task's status: Pending | "In Progress" | Completed | Cancelled | Deleted.
    SetStatus { id: String, status: TaskStatus },

    /// Move a task to the trash.
    Delete { id: String },

    /// Bring a task back from the trash.
    Restore { id: String },

    /// Remove a task permanently.
    Purge { id: String },

    /// Move a task into a lane (div1..div4), optionally in front of another task.
    Move {
        id: String,
        lane: Lane,
        before: Option<String>,
    },

    /// Rename a lane.
    RenameLane {
        lane: Lane,
        #[arg(required = true)]
        label: Vec<String>,
    },

    /// Restore the built-in lane names.
    ResetLanes,

    /// Write the whole board as JSON.
    ExportJson { file: PathBuf },

    /// Write all tasks as CSV.
    ExportCsv { file: PathBuf },

    /// Replace the board from a JSON export, a bare JSON array or CSV.
    Import { file: PathBuf },
}
