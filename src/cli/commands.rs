use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ud", about = concat!("unidash v", env!("CARGO_PKG_VERSION"), " - departmental process tracking"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Run against a different workspace directory
    #[arg(short = 'C', long = "dir", global = true)]
    pub dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new unidash workspace in the current directory
    Init(InitArgs),
    /// List processes and tasks as a tree
    List(ListArgs),
    /// Show one task with its resources and subtasks
    Show(ShowArgs),
    /// Show KPIs and per-department counts
    Stats(StatsArgs),
    /// Print the efficiency-analysis prompt for a department
    Report(ReportArgs),
    /// Add a process (at the top) or a task under a parent (at the bottom)
    Add(AddArgs),
    /// Change a task's status
    Status(StatusArgs),
    /// Set a single task field
    Set(SetArgs),
    /// Replace a task (and its subtasks) with a JSON definition
    Replace(ReplaceArgs),
    /// Manage a task's attached resources
    Res(ResCmd),
    /// Manage the department registry
    Dept(DeptCmd),
    /// View or change application settings
    Settings(SettingsCmd),
}

// ---------------------------------------------------------------------------
// Init args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct InitArgs {
    /// Dashboard display name (default: inferred from directory name)
    #[arg(long)]
    pub name: Option<String>,
    /// Initial department (repeatable)
    #[arg(long = "dept")]
    pub departments: Vec<String>,
    /// IANA time zone (e.g. America/Mexico_City)
    #[arg(long)]
    pub time_zone: Option<String>,
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ListArgs {
    /// Only this department (default: the active department)
    #[arg(long)]
    pub dept: Option<String>,
    /// Ignore the active department
    #[arg(long, conflicts_with = "dept")]
    pub all: bool,
    /// Filter by status (pending, in-progress, completed, overdue)
    #[arg(long)]
    pub status: Option<String>,
    /// Filter by type (process, task)
    #[arg(long)]
    pub kind: Option<String>,
    /// Filter by exact assignee
    #[arg(long)]
    pub assignee: Option<String>,
    /// Case-insensitive text search
    #[arg(long, short)]
    pub search: Option<String>,
    /// Sort key (title, status, start, end, assignee, department)
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long)]
    pub desc: bool,
    /// Sort ascending (overrides a remembered descending sort)
    #[arg(long, conflicts_with = "desc")]
    pub asc: bool,
    /// Print a flat pre-order list instead of a tree
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    pub id: String,
    /// Include the parent chain
    #[arg(long)]
    pub context: bool,
}

#[derive(Args)]
pub struct StatsArgs {
    /// Only this department (default: the active department)
    #[arg(long)]
    pub dept: Option<String>,
    /// Ignore the active department
    #[arg(long, conflicts_with = "dept")]
    pub all: bool,
    /// Reference date for past-due counts (default: today)
    #[arg(long)]
    pub today: Option<String>,
}

#[derive(Args)]
pub struct ReportArgs {
    /// Only this department (default: the active department)
    #[arg(long)]
    pub dept: Option<String>,
    /// Ignore the active department
    #[arg(long, conflicts_with = "dept")]
    pub all: bool,
    /// Reference date for past-due counts (default: today)
    #[arg(long)]
    pub today: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Title
    pub title: String,
    /// Department (default: the parent's, else the active department)
    #[arg(long)]
    pub dept: Option<String>,
    /// Add under this task instead of at the root
    #[arg(long)]
    pub parent: Option<String>,
    /// Mark as a specific task rather than a general process
    #[arg(long)]
    pub specific: bool,
    #[arg(long)]
    pub description: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub end: Option<String>,
    #[arg(long)]
    pub assignee: Option<String>,
    /// Initial status (default: pending)
    #[arg(long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task ID
    pub id: String,
    /// New status (pending, in-progress, completed, overdue)
    pub status: String,
}

#[derive(Args)]
pub struct SetArgs {
    /// Task ID
    pub id: String,
    /// Field name (title, description, assignee, startDate, endDate, department, status, isSpecificTask)
    pub field: String,
    /// New value (empty clears optional fields)
    pub value: String,
}

#[derive(Args)]
pub struct ReplaceArgs {
    /// Task ID to replace
    pub id: String,
    /// JSON file with the new task, or "-" for stdin
    pub file: String,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ResCmd {
    #[command(subcommand)]
    pub action: ResAction,
}

#[derive(Subcommand)]
pub enum ResAction {
    /// Attach a resource (type is detected from the URL)
    Add(ResAddArgs),
    /// Remove a resource
    Rm(ResRmArgs),
    /// Reorder a task's resources
    Order(ResOrderArgs),
}

#[derive(Args)]
pub struct ResAddArgs {
    /// Task ID
    pub id: String,
    /// Resource URL
    pub url: String,
    /// Display name (default: the URL)
    #[arg(long)]
    pub name: Option<String>,
    /// Category (one of the configured resource categories)
    #[arg(long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct ResRmArgs {
    /// Task ID
    pub id: String,
    /// Resource ID
    pub resource_id: String,
}

#[derive(Args)]
pub struct ResOrderArgs {
    /// Task ID
    pub id: String,
    /// Resource IDs in the new order
    #[arg(required = true)]
    pub resource_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DeptCmd {
    #[command(subcommand)]
    pub action: Option<DeptAction>,
}

#[derive(Subcommand)]
pub enum DeptAction {
    /// List departments with task counts (default)
    List,
    /// Register a department
    Add(DeptNameArg),
    /// Remove a department with no tasks
    Rm(DeptNameArg),
    /// Rename a department and retag its tasks
    Rename(DeptRenameArgs),
    /// Set or clear the active department
    Use(DeptUseArgs),
}

#[derive(Args)]
pub struct DeptNameArg {
    /// Department name
    pub name: String,
}

#[derive(Args)]
pub struct DeptRenameArgs {
    /// Current name
    pub old: String,
    /// New name
    pub new: String,
}

#[derive(Args)]
pub struct DeptUseArgs {
    /// Department name (omit with --clear)
    pub name: Option<String>,
    /// Clear the active department
    #[arg(long, conflicts_with = "name")]
    pub clear: bool,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SettingsCmd {
    #[command(subcommand)]
    pub action: Option<SettingsAction>,
}

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print current settings (default)
    Show,
    /// Change one setting (name, logo_url, time_zone, resource_categories)
    Set(SettingsSetArgs),
}

#[derive(Args)]
pub struct SettingsSetArgs {
    pub key: String,
    pub value: String,
}
