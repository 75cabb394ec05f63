use std::fs;
use std::path::Path;

use crate::cli::commands::InitArgs;
use crate::io::store_io::{self, DATA_DIR};
use crate::model::settings::DepartmentRegistry;

const SETTINGS_TOML_TEMPLATE: &str = r##"[app]
name = "{name}"
time_zone = "{time_zone}"
# logo_url = "https://example.edu/logo.png"

# Offered when attaching a resource to a task.
resource_categories = ["Normativa", "Formato", "Manual", "Evidencia", "Otro"]
"##;

const TASKS_TEMPLATE: &str = "[]\n";

/// Infer a dashboard name from a directory name: hyphens and underscores
/// become spaces, each word title-cased.
fn infer_name(dir_name: &str) -> String {
    dir_name
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    upper + chars.as_str()
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render settings.toml, appending the department registry when any were given.
fn render_settings_toml(name: &str, time_zone: &str, departments: &DepartmentRegistry) -> String {
    let mut content = SETTINGS_TOML_TEMPLATE
        .replace("{name}", &escape(name))
        .replace("{time_zone}", &escape(time_zone));
    // Top-level keys must precede [app], so the registry goes first
    let quoted: Vec<String> = departments
        .names()
        .iter()
        .map(|d| format!("\"{}\"", escape(d)))
        .collect();
    content.insert_str(0, &format!("departments = [{}]\n\n", quoted.join(", ")));
    content
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

pub fn cmd_init(root: &Path, args: InitArgs) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = root.join(DATA_DIR);

    if data_dir.is_dir() {
        return Err(format!("unidash workspace already exists in {}", data_dir.display()).into());
    }

    if let Some(parent) = root.parent()
        && let Ok(parent_root) = store_io::discover_dashboard(parent)
    {
        eprintln!("Note: parent workspace found at {}/", parent_root.join(DATA_DIR).display());
        eprintln!("Creating new workspace in {}/", data_dir.display());
    }

    let name = args.name.unwrap_or_else(|| {
        root.file_name()
            .and_then(|n| n.to_str())
            .map(infer_name)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| "Panel Administrativo".to_string())
    });
    let time_zone = args.time_zone.unwrap_or_else(|| "UTC".to_string());
    let departments = DepartmentRegistry::new(&args.departments);

    fs::create_dir_all(&data_dir)?;
    fs::write(
        data_dir.join("settings.toml"),
        render_settings_toml(&name, &time_zone, &departments),
    )?;
    fs::write(data_dir.join("tasks.json"), TASKS_TEMPLATE)?;
    tracing::info!(root = %root.display(), "initialized workspace");

    println!("Initialized unidash workspace: {}", name);
    for dept in departments.names() {
        println!("  department: {}", dept);
    }
    Ok(())
}
