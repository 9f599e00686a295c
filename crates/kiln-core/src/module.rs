//! Module identity, type tags and origin.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Index of a module inside its [`ModuleGraph`](crate::ModuleGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId(pub u32);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Type tag of a source module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModuleKind {
    Style,
    Script,
    TypedScript,
    Image,
    Font,
    OtherBinary,
}

impl ModuleKind {
    /// Infer the type tag from the final path extension.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "css" | "less" | "sass" | "scss" | "styl" => ModuleKind::Style,
            "js" | "jsx" | "mjs" | "cjs" => ModuleKind::Script,
            "ts" | "tsx" | "mts" | "cts" => ModuleKind::TypedScript,
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "svg" => ModuleKind::Image,
            "ttf" | "woff" | "woff2" | "otf" | "eot" => ModuleKind::Font,
            _ => ModuleKind::OtherBinary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Style => "style",
            ModuleKind::Script => "script",
            ModuleKind::TypedScript => "typed-script",
            ModuleKind::Image => "image",
            ModuleKind::Font => "font",
            ModuleKind::OtherBinary => "other-binary",
        }
    }

    /// Scripts of either flavour.
    pub fn is_script(self) -> bool {
        matches!(self, ModuleKind::Script | ModuleKind::TypedScript)
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a module comes from: the application itself or an installed package.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ModuleOrigin {
    Application,
    Dependency { package: String },
}

impl ModuleOrigin {
    /// Derive the origin from the last `node_modules` component in `path`.
    ///
    /// Scoped packages (`@scope/name`) keep both segments.
    pub fn from_path(path: &Path) -> Self {
        let components: Vec<&str> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => part.to_str(),
                _ => None,
            })
            .collect();

        let Some(pos) = components.iter().rposition(|c| *c == "node_modules") else {
            return ModuleOrigin::Application;
        };

        match components.get(pos + 1) {
            Some(scope) if scope.starts_with('@') => match components.get(pos + 2) {
                Some(name) if pos + 3 < components.len() => ModuleOrigin::Dependency {
                    package: format!("{scope}/{name}"),
                },
                _ => ModuleOrigin::Application,
            },
            Some(name) if pos + 2 < components.len() => ModuleOrigin::Dependency {
                package: (*name).to_string(),
            },
            _ => ModuleOrigin::Application,
        }
    }

    pub fn package(&self) -> Option<&str> {
        match self {
            ModuleOrigin::Application => None,
            ModuleOrigin::Dependency { package } => Some(package),
        }
    }

    pub fn is_dependency(&self) -> bool {
        matches!(self, ModuleOrigin::Dependency { .. })
    }
}

/// A single source module. Immutable once it is in a graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Module {
    pub id: ModuleId,
    pub path: PathBuf,
    pub kind: ModuleKind,
    pub origin: ModuleOrigin,
    /// Size of the source in bytes, as reported by the graph supplier.
    pub size: u64,
}

impl Module {
    /// Final extension, lowercased, without the dot.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// File stem used for `[name]` in asset templates.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("module")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_extension() {
        assert_eq!(ModuleKind::from_path(Path::new("/a/App.tsx")), ModuleKind::TypedScript);
        assert_eq!(ModuleKind::from_path(Path::new("/a/index.js")), ModuleKind::Script);
        assert_eq!(ModuleKind::from_path(Path::new("/a/theme.SCSS")), ModuleKind::Style);
        assert_eq!(ModuleKind::from_path(Path::new("/a/logo.svg")), ModuleKind::Image);
        assert_eq!(ModuleKind::from_path(Path::new("/a/inter.woff2")), ModuleKind::Font);
        assert_eq!(ModuleKind::from_path(Path::new("/a/data.bin")), ModuleKind::OtherBinary);
        assert_eq!(ModuleKind::from_path(Path::new("/a/Makefile")), ModuleKind::OtherBinary);
    }

    #[test]
    fn origin_from_node_modules() {
        assert_eq!(
            ModuleOrigin::from_path(Path::new("/app/src/main.js")),
            ModuleOrigin::Application
        );
        assert_eq!(
            ModuleOrigin::from_path(Path::new("/app/node_modules/react-dom/index.js")),
            ModuleOrigin::Dependency {
                package: "react-dom".into()
            }
        );
        assert_eq!(
            ModuleOrigin::from_path(Path::new("/app/node_modules/@emotion/react/dist/index.js")),
            ModuleOrigin::Dependency {
                package: "@emotion/react".into()
            }
        );
    }

    #[test]
    fn nested_node_modules_uses_innermost_package() {
        let origin = ModuleOrigin::from_path(Path::new(
            "/app/node_modules/a/node_modules/b/lib/index.js",
        ));
        assert_eq!(origin.package(), Some("b"));
    }
}
