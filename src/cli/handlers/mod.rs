mod init;
pub use init::cmd_init;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::NaiveDate;
use indexmap::IndexMap;

/// Workspace directory override (set by -C flag)
static DASHBOARD_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::lock::ForestLock;
use crate::io::settings_io;
use crate::io::state::{self, ViewState};
use crate::io::store_io::{self, DATA_DIR, StoreError};
use crate::model::dashboard::Dashboard;
use crate::model::forest::Forest;
use crate::model::settings::{DepartmentRegistry, Settings};
use crate::model::task::{Resource, Task, TaskKind, TaskStatus, parse_ymd};
use crate::ops::tree_ops::{self, TreeError};
use crate::ops::view_ops::{self, FilterCriteria, SortDirection, SortKey};
use crate::ops::{department_ops, report, stats_ops};

type CmdResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;

    if let Some(ref dir) = cli.dir {
        let abs = std::fs::canonicalize(dir)
            .map_err(|e| format!("cannot resolve -C path '{}': {}", dir, e))?;
        let _ = DASHBOARD_DIR_OVERRIDE.set(abs);
    }

    match cli.command {
        // Init runs before workspace discovery
        Commands::Init(args) => cmd_init(&start_dir()?, args),

        // Read commands
        Commands::List(args) => cmd_list(args, json),
        Commands::Show(args) => cmd_show(args, json),
        Commands::Stats(args) => cmd_stats(args, json),
        Commands::Report(args) => cmd_report(args),

        // Write commands
        Commands::Add(args) => cmd_add(args),
        Commands::Status(args) => cmd_status(args),
        Commands::Set(args) => cmd_set(args),
        Commands::Replace(args) => cmd_replace(args),
        Commands::Res(args) => cmd_res(args),

        // Registry and settings
        Commands::Dept(args) => cmd_dept(args, json),
        Commands::Settings(args) => cmd_settings(args, json),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_dir() -> Result<PathBuf, StoreError> {
    match DASHBOARD_DIR_OVERRIDE.get() {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().map_err(StoreError::IoError),
    }
}

fn dashboard_root() -> Result<PathBuf, StoreError> {
    store_io::discover_dashboard(&start_dir()?)
}

fn load_dashboard_cwd() -> Result<Dashboard, StoreError> {
    store_io::load_dashboard(&dashboard_root()?)
}

/// Run a write against the forest: lock, reload, mutate, save.
///
/// Nothing is saved when `mutate` fails, so a lookup miss leaves
/// tasks.json untouched.
fn with_forest<T>(mutate: impl FnOnce(&mut Dashboard) -> CmdResult<T>) -> CmdResult<T> {
    let root = dashboard_root()?;
    let _lock = ForestLock::acquire_default(&root.join(DATA_DIR))?;
    let mut dashboard = store_io::load_dashboard(&root)?;
    let out = mutate(&mut dashboard)?;
    store_io::save_forest(&dashboard.data_dir, &dashboard.forest)?;
    Ok(out)
}

/// Engine errors pass through; lookup misses are logged first.
fn engine<T>(result: Result<T, TreeError>) -> CmdResult<T> {
    result.map_err(|e| {
        if e.is_miss() {
            tracing::warn!(error = %e, "lookup miss, forest unchanged");
        }
        e.into()
    })
}

fn view_state(dashboard: &Dashboard) -> ViewState {
    state::read_view_state(&dashboard.data_dir).unwrap_or_default()
}

/// The department a read command is scoped to: `--all` wins, then `--dept`,
/// then the active department.
fn scope_department(dept: Option<String>, all: bool, state: &ViewState) -> Option<String> {
    if all {
        None
    } else {
        dept.or_else(|| state.active_department.clone())
    }
}

/// Top-level tasks of a department with their subtasks intact.
fn department_roots(dashboard: &Dashboard, department: Option<&str>) -> Vec<Task> {
    let roots = dashboard.forest.roots();
    match department {
        Some(dept) => roots.iter().filter(|t| t.department == dept).cloned().collect(),
        None => roots.to_vec(),
    }
}

fn require_department(settings: &Settings, name: &str) -> CmdResult {
    if settings.departments.contains(name) {
        Ok(())
    } else {
        Err(format!(
            "unknown department '{}' (register it with `ud dept add`)",
            name
        )
        .into())
    }
}

fn parse_status(s: &str) -> CmdResult<TaskStatus> {
    TaskStatus::parse(s).ok_or_else(|| {
        format!(
            "invalid status '{}' (expected: pending, in-progress, completed, overdue)",
            s
        )
        .into()
    })
}

fn parse_date_arg(flag: &str, s: &str) -> CmdResult<String> {
    match parse_ymd(s) {
        Some(_) => Ok(s.trim().to_string()),
        None => Err(format!("invalid --{} date '{}' (expected YYYY-MM-DD)", flag, s).into()),
    }
}

fn today(arg: Option<&str>) -> CmdResult<NaiveDate> {
    match arg {
        Some(s) => parse_ymd(s).ok_or_else(|| format!("invalid --today '{}' (expected YYYY-MM-DD)", s).into()),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(args: ListArgs, json: bool) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let mut state = view_state(&dashboard);

    let criteria = FilterCriteria {
        search: args.search,
        status: args.status.as_deref().map(parse_status).transpose()?,
        kind: args
            .kind
            .as_deref()
            .map(|k| TaskKind::parse(k).ok_or_else(|| format!("invalid type '{}' (expected: process, task)", k)))
            .transpose()?,
        assignee: args.assignee,
        department: scope_department(args.dept, args.all, &state),
    };

    // An explicit --sort becomes the remembered default
    let sort = match args.sort.as_deref() {
        Some(s) => {
            let key = SortKey::parse(s).ok_or_else(|| {
                format!(
                    "invalid sort key '{}' (expected: title, status, start, end, assignee, department)",
                    s
                )
            })?;
            let direction = if args.desc { SortDirection::Desc } else { SortDirection::Asc };
            state.sort_key = Some(key);
            state.sort_direction = direction;
            if let Err(e) = state::write_view_state(&dashboard.data_dir, &state) {
                tracing::warn!(error = %e, "could not save default sort");
            }
            Some((key, direction))
        }
        None => state.sort_key.map(|key| {
            let direction = if args.asc {
                SortDirection::Asc
            } else if args.desc {
                SortDirection::Desc
            } else {
                state.sort_direction
            };
            (key, direction)
        }),
    };

    let view = view_ops::project_view(dashboard.forest.roots(), &criteria, sort);

    if json {
        if args.flat {
            let rows: Vec<FlatTaskJson> = view_ops::flatten_with_depth(&view)
                .into_iter()
                .map(|(depth, task)| FlatTaskJson {
                    depth,
                    task: FlatTask::from(task),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        return Ok(());
    }

    if view.is_empty() {
        println!("no tasks");
        return Ok(());
    }
    if args.flat {
        for task in view_ops::flatten(&view) {
            println!("{}", format_task_line(task));
        }
    } else {
        for task in &view {
            print_lines(&format_task_tree(task, 0));
        }
    }
    Ok(())
}

fn cmd_show(args: ShowArgs, json: bool) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let task = engine(
        dashboard
            .forest
            .get(&args.id)
            .ok_or_else(|| TreeError::NotFound(args.id.clone())),
    )?;
    let ancestors = dashboard.forest.ancestors(&args.id);

    if json {
        // JSON always includes ancestors
        let out = ShowJson {
            ancestors: ancestors.iter().map(|a| a.id.as_str()).collect(),
            task,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if args.context {
        print_lines(&format_task_detail(task, &ancestors));
    } else {
        print_lines(&format_task_detail(task, &[]));
    }
    Ok(())
}

fn cmd_stats(args: StatsArgs, json: bool) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let state = view_state(&dashboard);
    let today = today(args.today.as_deref())?;
    let department = scope_department(args.dept, args.all, &state);
    let tasks = department_roots(&dashboard, department.as_deref());

    let kpis = stats_ops::compute_kpis(&tasks, today);

    // Registered departments first, in registry order, then any stray tags
    let counts = stats_ops::count_by_department(&tasks);
    let mut by_department: IndexMap<String, usize> = IndexMap::new();
    if department.is_none() {
        for name in dashboard.settings.departments.names() {
            by_department.insert(name.clone(), 0);
        }
    }
    for (name, count) in counts {
        by_department.insert(name, count);
    }

    if json {
        let out = StatsJson {
            department: department.as_deref(),
            today: today.format("%Y-%m-%d").to_string(),
            kpis: &kpis,
            by_department: &by_department,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        if let Some(dept) = &department {
            println!("{}", dept);
        }
        print_lines(&format_stats(&kpis, &by_department));
    }
    Ok(())
}

fn cmd_report(args: ReportArgs) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let state = view_state(&dashboard);
    let today = today(args.today.as_deref())?;
    let department = scope_department(args.dept, args.all, &state);
    let tasks = department_roots(&dashboard, department.as_deref());
    let kpis = stats_ops::compute_kpis(&tasks, today);

    let prompt = report::build_analysis_prompt(
        &dashboard.settings.app,
        department.as_deref(),
        &tasks,
        &kpis,
    );
    print!("{}", prompt);
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(args: AddArgs) -> CmdResult {
    let status = args.status.as_deref().map(parse_status).transpose()?;
    let start = args.start.as_deref().map(|s| parse_date_arg("start", s)).transpose()?;
    let end = args.end.as_deref().map(|s| parse_date_arg("end", s)).transpose()?;

    let id = with_forest(|dashboard| {
        let parent_dept = match &args.parent {
            Some(pid) => Some(
                engine(
                    dashboard
                        .forest
                        .get(pid)
                        .ok_or_else(|| TreeError::NotFound(pid.clone())),
                )?
                .department
                .clone(),
            ),
            None => None,
        };
        let department = args
            .dept
            .clone()
            .or(parent_dept)
            .or_else(|| view_state(dashboard).active_department)
            .ok_or("no department: pass --dept or set one with `ud dept use`")?;
        require_department(&dashboard.settings, &department)?;

        let id = tree_ops::next_task_id(&dashboard.forest);
        let mut task = Task::new(id.clone(), department, args.title.trim());
        task.is_specific_task = args.specific;
        task.description = args.description.clone().filter(|d| !d.trim().is_empty());
        task.assignee = args.assignee.clone().filter(|a| !a.trim().is_empty());
        task.start_date = start;
        task.end_date = end;
        if let Some(status) = status {
            task.status = status;
        }

        match &args.parent {
            Some(pid) => engine(tree_ops::insert_child(&mut dashboard.forest, pid, task))?,
            None => engine(tree_ops::insert_root(&mut dashboard.forest, task))?,
        }
        Ok(id)
    })?;

    tracing::info!(%id, "added task");
    println!("{}", id);
    Ok(())
}

fn cmd_status(args: StatusArgs) -> CmdResult {
    let status = parse_status(&args.status)?;
    with_forest(|dashboard| engine(tree_ops::set_status(&mut dashboard.forest, &args.id, status)))?;
    println!("{} → {}", args.id, status);
    Ok(())
}

fn cmd_set(args: SetArgs) -> CmdResult {
    with_forest(|dashboard| {
        if args.field == "department" {
            require_department(&dashboard.settings, args.value.trim())?;
        }
        engine(tree_ops::set_field(
            &mut dashboard.forest,
            &args.id,
            &args.field,
            &args.value,
        ))
    })?;
    println!("{} {} updated", args.id, args.field);
    Ok(())
}

fn cmd_replace(args: ReplaceArgs) -> CmdResult {
    let text = if args.file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(Path::new(&args.file))
            .map_err(|e| format!("could not read {}: {}", args.file, e))?
    };
    let new_task: Task =
        serde_json::from_str(&text).map_err(|e| format!("invalid task JSON: {}", e))?;
    let new_id = new_task.id.clone();

    with_forest(|dashboard| {
        for task in view_ops::flatten(std::slice::from_ref(&new_task)) {
            require_department(&dashboard.settings, &task.department)?;
        }
        engine(tree_ops::find_and_replace(
            &mut dashboard.forest,
            &args.id,
            new_task,
        ))
    })?;
    if new_id == args.id {
        println!("{} replaced", args.id);
    } else {
        println!("{} replaced by {}", args.id, new_id);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

fn cmd_res(args: ResCmd) -> CmdResult {
    match args.action {
        ResAction::Add(a) => cmd_res_add(a),
        ResAction::Rm(a) => cmd_res_rm(a),
        ResAction::Order(a) => cmd_res_order(a),
    }
}

fn cmd_res_add(args: ResAddArgs) -> CmdResult {
    let url = args.url.trim().to_string();
    if url.is_empty() {
        return Err("resource URL cannot be empty".into());
    }

    let resource = with_forest(|dashboard| {
        let category = match &args.category {
            Some(c) => {
                let categories = &dashboard.settings.app.resource_categories;
                if !categories.iter().any(|k| k == c) {
                    return Err(format!(
                        "unknown category '{}' (expected: {})",
                        c,
                        categories.join(", ")
                    )
                    .into());
                }
                c.clone()
            }
            None => String::new(),
        };
        let task = engine(
            dashboard
                .forest
                .get(&args.id)
                .ok_or_else(|| TreeError::NotFound(args.id.clone())),
        )?;
        let resource = Resource::new(
            tree_ops::next_resource_id(task),
            args.name.clone().unwrap_or_else(|| url.clone()),
            url.clone(),
            category,
        );
        engine(tree_ops::add_resource(
            &mut dashboard.forest,
            &args.id,
            resource.clone(),
        ))?;
        Ok(resource)
    })?;

    println!("{} [{}] {}", resource.id, resource.kind, resource.name);
    Ok(())
}

fn cmd_res_rm(args: ResRmArgs) -> CmdResult {
    let removed = with_forest(|dashboard| {
        engine(tree_ops::delete_resource(
            &mut dashboard.forest,
            &args.id,
            &args.resource_id,
        ))
    })?;
    println!("removed {} {}", removed.id, removed.name);
    Ok(())
}

fn cmd_res_order(args: ResOrderArgs) -> CmdResult {
    with_forest(|dashboard| {
        let task = engine(
            dashboard
                .forest
                .get(&args.id)
                .ok_or_else(|| TreeError::NotFound(args.id.clone())),
        )?;
        let mut ordered = Vec::with_capacity(args.resource_ids.len());
        for rid in &args.resource_ids {
            if ordered.iter().any(|r: &Resource| &r.id == rid) {
                return Err(format!("resource {} listed twice", rid).into());
            }
            let resource = engine(task.find_resource(rid).cloned().ok_or_else(|| {
                TreeError::ResourceNotFound {
                    task_id: args.id.clone(),
                    resource_id: rid.clone(),
                }
            }))?;
            ordered.push(resource);
        }
        if ordered.len() != task.resources.len() {
            return Err(format!(
                "expected all {} resource ids of {}, got {}",
                task.resources.len(),
                args.id,
                ordered.len()
            )
            .into());
        }
        engine(tree_ops::reorder_resources(
            &mut dashboard.forest,
            &args.id,
            ordered,
        ))
    })?;
    println!("{} resources reordered", args.id);
    Ok(())
}

// ---------------------------------------------------------------------------
// Departments
// ---------------------------------------------------------------------------

fn cmd_dept(args: DeptCmd, json: bool) -> CmdResult {
    match args.action.unwrap_or(DeptAction::List) {
        DeptAction::List => cmd_dept_list(json),
        DeptAction::Add(a) => cmd_dept_add(a),
        DeptAction::Rm(a) => cmd_dept_rm(a),
        DeptAction::Rename(a) => cmd_dept_rename(a),
        DeptAction::Use(a) => cmd_dept_use(a),
    }
}

fn cmd_dept_list(json: bool) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let state = view_state(&dashboard);
    let counts = stats_ops::count_by_department(dashboard.forest.roots());
    let active = state.active_department.as_deref();

    if json {
        let rows: Vec<DepartmentJson> = dashboard
            .settings
            .departments
            .names()
            .iter()
            .map(|name| DepartmentJson {
                name,
                tasks: counts.get(name).copied().unwrap_or(0),
                active: active == Some(name.as_str()),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if dashboard.settings.departments.is_empty() {
        println!("no departments (add one with `ud dept add <name>`)");
        return Ok(());
    }
    for name in dashboard.settings.departments.names() {
        let marker = if active == Some(name.as_str()) { '*' } else { ' ' };
        let count = counts.get(name).copied().unwrap_or(0);
        println!("{} {}  {}", marker, name, count);
    }
    Ok(())
}

/// Lock the workspace and edit the department registry in settings.toml.
fn with_registry<T>(
    edit: impl FnOnce(&Path, &mut Settings, &mut toml_edit::DocumentMut) -> CmdResult<T>,
) -> CmdResult<T> {
    let data_dir = dashboard_root()?.join(DATA_DIR);
    let _lock = ForestLock::acquire_default(&data_dir)?;
    let (mut settings, mut doc) = settings_io::read_settings(&data_dir)?;
    let out = edit(&data_dir, &mut settings, &mut doc)?;
    settings_io::set_departments(&mut doc, &settings.departments);
    settings_io::write_settings(&data_dir, &doc)?;
    Ok(out)
}

fn cmd_dept_add(args: DeptNameArg) -> CmdResult {
    with_registry(|_, settings, _| {
        department_ops::add_department(&mut settings.departments, &args.name)?;
        Ok(())
    })?;
    println!("added department {}", args.name.trim());
    Ok(())
}

fn cmd_dept_rm(args: DeptNameArg) -> CmdResult {
    with_registry(|data_dir, settings, _| {
        let forest = store_io::load_forest(data_dir)?;
        department_ops::remove_department(&mut settings.departments, &forest, &args.name)?;
        if let Some(mut state) = state::read_view_state(data_dir)
            && state.active_department.as_deref() == Some(args.name.as_str())
        {
            state.active_department = None;
            state::write_view_state(data_dir, &state)?;
        }
        Ok(())
    })?;
    println!("removed department {}", args.name);
    Ok(())
}

/// Persist a department rename: settings.toml first, then tasks.json.
///
/// A failed task write restores the previous settings.toml, so the registry
/// never names a department the tasks do not use or the other way round.
fn commit_rename(
    data_dir: &Path,
    doc: &mut toml_edit::DocumentMut,
    registry: &DepartmentRegistry,
    forest: Option<&Forest>,
) -> CmdResult {
    let previous = doc.clone();
    settings_io::set_departments(doc, registry);
    settings_io::write_settings(data_dir, doc)?;
    if let Some(forest) = forest
        && let Err(e) = store_io::save_forest(data_dir, forest)
    {
        tracing::error!(error = %e, "task retag failed, restoring settings.toml");
        settings_io::write_settings(data_dir, &previous)?;
        *doc = previous;
        return Err(e.into());
    }
    Ok(())
}

fn cmd_dept_rename(args: DeptRenameArgs) -> CmdResult {
    let retagged = with_registry(|data_dir, settings, doc| {
        let mut forest = store_io::load_forest(data_dir)?;
        let mut state = state::read_view_state(data_dir).unwrap_or_default();
        let active_before = state.active_department.clone();

        let retagged = department_ops::rename_department(
            &mut settings.departments,
            &mut forest,
            &mut state.active_department,
            &args.old,
            &args.new,
        )?;

        commit_rename(
            data_dir,
            doc,
            &settings.departments,
            (retagged > 0).then_some(&forest),
        )?;
        if state.active_department != active_before {
            state::write_view_state(data_dir, &state)?;
        }
        Ok(retagged)
    })?;
    tracing::info!(old = %args.old, new = %args.new, retagged, "renamed department");
    println!("{} → {} ({} tasks retagged)", args.old, args.new.trim(), retagged);
    Ok(())
}

fn cmd_dept_use(args: DeptUseArgs) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let mut state = view_state(&dashboard);

    match args.name {
        Some(name) if !args.clear => {
            require_department(&dashboard.settings, &name)?;
            state.active_department = Some(name.clone());
            state::write_view_state(&dashboard.data_dir, &state)?;
            println!("active department: {}", name);
        }
        _ => {
            if !args.clear {
                return Err("pass a department name or --clear".into());
            }
            state.active_department = None;
            state::write_view_state(&dashboard.data_dir, &state)?;
            println!("active department cleared");
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

fn cmd_settings(args: SettingsCmd, json: bool) -> CmdResult {
    match args.action.unwrap_or(SettingsAction::Show) {
        SettingsAction::Show => cmd_settings_show(json),
        SettingsAction::Set(a) => cmd_settings_set(a),
    }
}

fn cmd_settings_show(json: bool) -> CmdResult {
    let dashboard = load_dashboard_cwd()?;
    let settings = &dashboard.settings;
    if json {
        println!("{}", serde_json::to_string_pretty(settings)?);
        return Ok(());
    }
    let app = &settings.app;
    println!("name: {}", app.name);
    if let Some(logo) = &app.logo_url {
        println!("logo_url: {}", logo);
    }
    println!("time_zone: {}", app.time_zone);
    println!("resource_categories: {}", app.resource_categories.join(", "));
    println!("departments: {}", settings.departments.names().join(", "));
    Ok(())
}

fn cmd_settings_set(args: SettingsSetArgs) -> CmdResult {
    let data_dir = dashboard_root()?.join(DATA_DIR);
    let _lock = ForestLock::acquire_default(&data_dir)?;
    let (_, mut doc) = settings_io::read_settings(&data_dir)?;
    settings_io::set_app_value(&mut doc, &args.key, &args.value)?;
    // Refuse to write a document that would no longer load
    toml::from_str::<Settings>(&doc.to_string())?;
    settings_io::write_settings(&data_dir, &doc)?;
    tracing::info!(key = %args.key, "settings saved");
    println!("{} updated", args.key);
    Ok(())
}
