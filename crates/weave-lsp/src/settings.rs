//! Workspace settings: scope records, global defaults, and path-based resolution.
//!
//! The editor sends one settings object per workspace folder at `initialize` (and again on
//! `workspace/didChangeConfiguration`). Each becomes a [`WorkspaceScope`] keyed by its folder's
//! filesystem path. Resolution walks a document's parent directories and picks the nearest
//! enclosing registered root; documents outside every root get a scope synthesized from global
//! defaults.
//!
//! The whole mapping is replaced atomically on every update (an `ArcSwap` holding an
//! insertion-ordered map), so concurrent readers see either the old mapping or the new one,
//! never a mix.

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde_json::Value;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::uri::{file_uri_to_path, path_to_file_uri};

/// Where the regeneration tool's supporting code is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportStrategy {
    /// Use the copy bundled with the editor extension.
    #[default]
    UseBundled,
    /// Use whatever the user's environment provides.
    FromEnvironment,
}

impl ImportStrategy {
    /// Parse the wire string. Unknown values are `None` (callers warn and fall back).
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "useBundled" => Some(Self::UseBundled),
            "fromEnvironment" => Some(Self::FromEnvironment),
            _ => None,
        }
    }

    /// Wire string for this strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UseBundled => "useBundled",
            Self::FromEnvironment => "fromEnvironment",
        }
    }
}

/// Which log severities are also surfaced as user-visible notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationLevel {
    /// Never notify.
    #[default]
    Off,
    /// Notify on errors only.
    OnError,
    /// Notify on errors and warnings.
    OnWarning,
    /// Notify on errors, warnings, and informational messages.
    Always,
}

impl NotificationLevel {
    /// Parse the wire string. Unknown values are `None` (callers warn and fall back).
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "off" => Some(Self::Off),
            "onError" => Some(Self::OnError),
            "onWarning" => Some(Self::OnWarning),
            "always" => Some(Self::Always),
            _ => None,
        }
    }

    /// Wire string for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::OnError => "onError",
            Self::OnWarning => "onWarning",
            Self::Always => "always",
        }
    }

    /// Errors are shown at `onError` and above.
    pub fn shows_errors(&self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Warnings are shown at `onWarning` and above.
    pub fn shows_warnings(&self) -> bool {
        matches!(self, Self::OnWarning | Self::Always)
    }

    /// Informational messages are shown only at `always`.
    pub fn shows_info(&self) -> bool {
        matches!(self, Self::Always)
    }
}

/// Process-wide fallback configuration, read once at startup/initialize.
#[derive(Debug, Clone, Default)]
pub struct GlobalDefaults {
    /// Extra search paths for the regeneration tool.
    pub search_paths: Vec<String>,
    /// Interpreter argv used to launch the tool; empty means "pick by import strategy".
    pub interpreter: Vec<String>,
    /// Extra arguments appended to every tool invocation.
    pub extra_args: Vec<String>,
    /// Where the tool's supporting code comes from.
    pub import_strategy: ImportStrategy,
    /// Notification verbosity.
    pub notification_level: NotificationLevel,
}

impl GlobalDefaults {
    /// Seed defaults from the process environment (`WEAVE_IMPORT_STRATEGY`,
    /// `WEAVE_SHOW_NOTIFICATION`).
    pub fn from_env() -> Self {
        let mut defaults = Self::default();
        if let Ok(value) = env::var("WEAVE_IMPORT_STRATEGY") {
            match ImportStrategy::parse(&value) {
                Some(strategy) => defaults.import_strategy = strategy,
                None => log::warn!("unrecognized WEAVE_IMPORT_STRATEGY {value:?}, using default"),
            }
        }
        if let Ok(value) = env::var("WEAVE_SHOW_NOTIFICATION") {
            match NotificationLevel::parse(&value) {
                Some(level) => defaults.notification_level = level,
                None => log::warn!("unrecognized WEAVE_SHOW_NOTIFICATION {value:?}, using default"),
            }
        }
        defaults
    }

    /// Overlay the `globalSettings` object from `initializationOptions` onto these defaults.
    pub fn overlaid(&self, global_settings: Option<&Value>) -> Self {
        let Some(settings) = global_settings else {
            return self.clone();
        };

        Self {
            search_paths: string_list(settings.get("path"))
                .unwrap_or_else(|| self.search_paths.clone()),
            interpreter: string_list(settings.get("interpreter"))
                .unwrap_or_else(|| self.interpreter.clone()),
            extra_args: string_list(settings.get("args"))
                .unwrap_or_else(|| self.extra_args.clone()),
            import_strategy: parse_enum_field(
                settings.get("importStrategy"),
                ImportStrategy::parse,
                "importStrategy",
            )
            .unwrap_or(self.import_strategy),
            notification_level: parse_enum_field(
                settings.get("showNotifications"),
                NotificationLevel::parse,
                "showNotifications",
            )
            .unwrap_or(self.notification_level),
        }
    }
}

/// Configuration scope for one workspace folder (or one synthesized single-file context).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceScope {
    /// Working directory for tool invocations.
    pub cwd: PathBuf,
    /// Filesystem path of the workspace root.
    pub workspace_root: PathBuf,
    /// `file://` URI of the workspace root.
    pub workspace_uri: String,
    /// Extra search paths for the regeneration tool.
    pub search_paths: Vec<String>,
    /// Interpreter argv used to launch the tool; empty means "pick by import strategy".
    pub interpreter: Vec<String>,
    /// Extra arguments appended to every tool invocation.
    pub extra_args: Vec<String>,
    /// Where the tool's supporting code comes from.
    pub import_strategy: ImportStrategy,
    /// Notification verbosity for this scope.
    pub notification_level: NotificationLevel,
}

impl WorkspaceScope {
    /// Build a scope from one entry of the editor's settings list.
    ///
    /// Absent fields take the documented defaults (empty lists, `useBundled`, `off`);
    /// unrecognized enum strings are warned about and fall back the same way.
    pub fn from_setting(setting: &Value, root: PathBuf) -> Self {
        let workspace_uri = setting
            .get("workspace")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| path_to_file_uri(&root));
        let cwd = setting
            .get("cwd")
            .and_then(Value::as_str)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.clone());

        Self {
            cwd,
            workspace_uri,
            search_paths: string_list(setting.get("path")).unwrap_or_default(),
            interpreter: string_list(setting.get("interpreter")).unwrap_or_default(),
            extra_args: string_list(setting.get("args")).unwrap_or_default(),
            import_strategy: parse_enum_field(
                setting.get("importStrategy"),
                ImportStrategy::parse,
                "importStrategy",
            )
            .unwrap_or_default(),
            notification_level: parse_enum_field(
                setting.get("showNotifications"),
                NotificationLevel::parse,
                "showNotifications",
            )
            .unwrap_or_default(),
            workspace_root: root,
        }
    }

    /// Build a single-directory scope from global defaults (non-workspace files, unsaved
    /// buffers, or an empty settings list).
    pub fn synthesized(dir: PathBuf, defaults: &GlobalDefaults) -> Self {
        Self {
            cwd: dir.clone(),
            workspace_uri: path_to_file_uri(&dir),
            search_paths: defaults.search_paths.clone(),
            interpreter: defaults.interpreter.clone(),
            extra_args: defaults.extra_args.clone(),
            import_strategy: defaults.import_strategy,
            notification_level: defaults.notification_level,
            workspace_root: dir,
        }
    }
}

fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(Value::as_array).map(|items| {
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect()
    })
}

fn parse_enum_field<T>(
    value: Option<&Value>,
    parse: impl Fn(&str) -> Option<T>,
    field: &str,
) -> Option<T> {
    let text = value.and_then(Value::as_str)?;
    let parsed = parse(text);
    if parsed.is_none() {
        log::warn!("unrecognized {field} value {text:?}, using default");
    }
    parsed
}

type ScopeMap = IndexMap<PathBuf, Arc<WorkspaceScope>>;

/// Owner of the scope mapping and global defaults.
///
/// Updates replace the whole mapping atomically; reads never block and never observe a partial
/// replacement. Resolution is deterministic for an unchanged mapping.
pub struct SettingsResolver {
    defaults: ArcSwap<GlobalDefaults>,
    scopes: ArcSwap<ScopeMap>,
}

impl SettingsResolver {
    /// Create a resolver with the given defaults and no registered scopes.
    pub fn new(defaults: GlobalDefaults) -> Self {
        Self {
            defaults: ArcSwap::from_pointee(defaults),
            scopes: ArcSwap::from_pointee(ScopeMap::new()),
        }
    }

    /// Current global defaults.
    pub fn defaults(&self) -> Arc<GlobalDefaults> {
        self.defaults.load_full()
    }

    /// Replace global defaults (set once at initialize, read-only afterwards).
    pub fn set_defaults(&self, defaults: GlobalDefaults) {
        self.defaults.store(Arc::new(defaults));
    }

    /// Replace the entire scope mapping from the editor's settings list.
    ///
    /// An empty list registers a single scope for the process working directory. Entries
    /// without a resolvable `workspace` URI are skipped with a warning. Calling this twice with
    /// the same list resolves identically to calling it once.
    pub fn update_scopes(&self, settings: &[Value]) {
        let mut scopes = ScopeMap::new();

        if settings.is_empty() {
            let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
            let defaults = self.defaults.load();
            scopes.insert(
                cwd.clone(),
                Arc::new(WorkspaceScope::synthesized(cwd, &defaults)),
            );
        } else {
            for setting in settings {
                let Some(root) = setting
                    .get("workspace")
                    .and_then(Value::as_str)
                    .and_then(file_uri_to_path)
                else {
                    log::warn!("settings entry without a usable workspace URI, skipping");
                    continue;
                };
                let scope = WorkspaceScope::from_setting(setting, root.clone());
                scopes.insert(root, Arc::new(scope));
            }
        }

        self.scopes.store(Arc::new(scopes));
    }

    /// Resolve the scope that applies to `path`.
    ///
    /// Walks parent directories from `path` up to the filesystem root; the nearest enclosing
    /// registered root wins. A pathed document outside every registered root gets a scope
    /// synthesized from global defaults and the file's parent directory. With no path at all
    /// (an unsaved buffer) the first registered scope in insertion order is returned when one
    /// exists; that last resort is order-dependent and kept that way on purpose (single-root
    /// setups; see DESIGN.md), falling back to a synthesized scope for the process working
    /// directory otherwise.
    pub fn resolve_for_path(&self, path: Option<&Path>) -> Arc<WorkspaceScope> {
        let scopes = self.scopes.load();

        match path {
            Some(path) => {
                let mut ancestor = Some(path);
                while let Some(dir) = ancestor {
                    if let Some(scope) = scopes.get(dir) {
                        return Arc::clone(scope);
                    }
                    ancestor = dir.parent();
                }

                let dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("/"));
                Arc::new(WorkspaceScope::synthesized(dir, &self.defaults.load()))
            }
            None => {
                if let Some((_, scope)) = scopes.first() {
                    return Arc::clone(scope);
                }
                let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
                Arc::new(WorkspaceScope::synthesized(cwd, &self.defaults.load()))
            }
        }
    }
}
