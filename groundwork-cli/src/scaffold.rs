/// Feature module scaffolding
///
/// `groundwork new-module <name>` renders four files from the templates in
/// `groundwork-cli/templates/`:
///
/// ```text
/// groundwork-shared/src/models/<name>.rs      model and CRUD queries
/// groundwork-api/src/routes/<name>.rs         router with PREFIX "/<name>"
/// migrations/<timestamp>_create_<name>.up.sql
/// migrations/<timestamp>_create_<name>.down.sql
/// ```
///
/// Nothing is written if any target already exists.

use chrono::{DateTime, Utc};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

const MODEL_TEMPLATE: &str = include_str!("../templates/model.rs.tmpl");
const ROUTES_TEMPLATE: &str = include_str!("../templates/routes.rs.tmpl");
const MIGRATION_UP_TEMPLATE: &str = include_str!("../templates/migration.up.sql.tmpl");
const MIGRATION_DOWN_TEMPLATE: &str = include_str!("../templates/migration.down.sql.tmpl");

/// Names that would shadow existing modules or are not valid identifiers
const RESERVED: &[&str] = &[
    "admin", "auth", "base", "health", "mod", "role", "roles", "todo", "todos", "user", "users",
    "async", "await", "crate", "enum", "fn", "impl", "let", "loop", "match", "move", "self",
    "static", "struct", "super", "trait", "type", "use", "where", "while",
];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScaffoldError {
    #[error("module name must be at least 3 characters: '{0}'")]
    TooShort(String),

    #[error("module name must start with a lowercase letter: '{0}'")]
    BadStart(String),

    #[error("module name may only contain lowercase letters, digits and '_': '{0}'")]
    BadCharacter(String),

    #[error("module name '{0}' is reserved")]
    Reserved(String),

    #[error("refusing to overwrite existing file: {0}")]
    Exists(PathBuf),

    #[error("failed to write {path}: {message}")]
    Io { path: PathBuf, message: String },
}

/// A validated module name in snake_case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleName(String);

impl ModuleName {
    pub fn parse(raw: &str) -> Result<Self, ScaffoldError> {
        let name = raw.trim();

        if name.chars().count() < 3 {
            return Err(ScaffoldError::TooShort(name.to_string()));
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(ScaffoldError::BadStart(name.to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(ScaffoldError::BadCharacter(name.to_string()));
        }
        if RESERVED.contains(&name) {
            return Err(ScaffoldError::Reserved(name.to_string()));
        }

        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `sales_orders` becomes `SalesOrders`
    pub fn type_name(&self) -> String {
        self.0
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                    None => String::new(),
                }
            })
            .collect()
    }

    pub fn const_name(&self) -> String {
        self.0.to_ascii_uppercase()
    }

    fn render(&self, template: &str) -> String {
        template
            .replace("{{module}}", &self.0)
            .replace("{{Type}}", &self.type_name())
            .replace("{{CONST}}", &self.const_name())
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A file to be written
#[derive(Debug, Clone)]
pub struct PlannedFile {
    pub path: PathBuf,
    pub contents: String,
}

/// Renders every file for `name` under the workspace `root`
pub fn plan(root: &Path, name: &ModuleName, now: DateTime<Utc>) -> Vec<PlannedFile> {
    let stem = format!("{}_create_{}", now.format("%Y%m%d%H%M%S"), name);
    let migrations = root.join("migrations");

    vec![
        PlannedFile {
            path: root
                .join("groundwork-shared/src/models")
                .join(format!("{}.rs", name)),
            contents: name.render(MODEL_TEMPLATE),
        },
        PlannedFile {
            path: root
                .join("groundwork-api/src/routes")
                .join(format!("{}.rs", name)),
            contents: name.render(ROUTES_TEMPLATE),
        },
        PlannedFile {
            path: migrations.join(format!("{}.up.sql", stem)),
            contents: name.render(MIGRATION_UP_TEMPLATE),
        },
        PlannedFile {
            path: migrations.join(format!("{}.down.sql", stem)),
            contents: name.render(MIGRATION_DOWN_TEMPLATE),
        },
    ]
}

/// Writes the planned files, refusing to touch existing ones
///
/// Returns the written paths.
pub fn write(files: &[PlannedFile]) -> Result<Vec<PathBuf>, ScaffoldError> {
    if let Some(existing) = files.iter().find(|f| f.path.exists()) {
        return Err(ScaffoldError::Exists(existing.path.clone()));
    }

    let io_error = |path: &Path, e: std::io::Error| ScaffoldError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    for file in files {
        if let Some(parent) = file.path.parent() {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        fs::write(&file.path, &file.contents).map_err(|e| io_error(&file.path, e))?;
        tracing::debug!(path = %file.path.display(), "Wrote scaffold file");
    }

    Ok(files.iter().map(|f| f.path.clone()).collect())
}

/// Manual wiring left after scaffolding
pub fn next_steps(name: &ModuleName) -> Vec<String> {
    vec![
        format!("Add `pub mod {};` to groundwork-shared/src/models/mod.rs", name),
        format!("Add `pub mod {};` to groundwork-api/src/routes/mod.rs", name),
        format!(
            "Register `FeatureModule {{ name: \"{0}\", prefix: routes::{0}::PREFIX, router: routes::{0}::router }}` in groundwork-api/src/app.rs",
            name
        ),
        "Adjust the model fields and the migration, then run `groundwork migrate`".to_string(),
    ]
}
