use serde::{Deserialize, Serialize};

/// Configuration from settings.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    /// The department registry, in display order
    #[serde(default)]
    pub departments: DepartmentRegistry,
}

/// Process-wide application settings, changed only by an explicit save
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Display name of the dashboard
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// IANA time zone name (e.g. "America/Mexico_City")
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    /// Categories offered when attaching a resource
    #[serde(default = "default_resource_categories")]
    pub resource_categories: Vec<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            name: "Panel Administrativo".to_string(),
            logo_url: None,
            time_zone: default_time_zone(),
            resource_categories: default_resource_categories(),
        }
    }
}

/// Default: see the init template
fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Default: see the init template
fn default_resource_categories() -> Vec<String> {
    ["Normativa", "Formato", "Manual", "Evidencia", "Otro"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Ordered set of unique department names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct DepartmentRegistry {
    names: Vec<String>,
}

impl DepartmentRegistry {
    /// Build a registry, dropping blank and repeated names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = DepartmentRegistry::default();
        for name in names {
            let name = name.into();
            let name = name.trim();
            if !name.is_empty() && !registry.contains(name) {
                registry.names.push(name.to_string());
            }
        }
        registry
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub(crate) fn names_mut(&mut self) -> &mut Vec<String> {
        &mut self.names
    }
}

impl From<Vec<String>> for DepartmentRegistry {
    fn from(names: Vec<String>) -> Self {
        DepartmentRegistry::new(names)
    }
}

impl From<DepartmentRegistry> for Vec<String> {
    fn from(registry: DepartmentRegistry) -> Self {
        registry.names
    }
}
