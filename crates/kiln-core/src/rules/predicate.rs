use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::module::Module;

/// Match predicate of a transform rule.
///
/// Extensions are compared against the module's final extension only, ASCII
/// case-insensitively: `ts` matches `App.TS` but never `App.tsx` or
/// `types.ts.map`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleTest {
    extensions: Vec<String>,
    source_dir: Option<PathBuf>,
}

impl ModuleTest {
    /// Match any of `extensions` (with or without a leading dot).
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            source_dir: None,
        }
    }

    /// Additionally require the module to live under `dir`.
    pub fn under(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn extension_list(&self) -> &[String] {
        &self.extensions
    }

    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// Reason the predicate can never match, if any.
    pub(crate) fn problem(&self) -> Option<String> {
        if self.extensions.is_empty() {
            return Some("rule has no extensions".to_string());
        }
        self.extensions.iter().find_map(|ext| {
            if ext.is_empty() {
                Some("empty extension".to_string())
            } else if ext.contains('.') || ext.contains('/') || ext.contains('\\') {
                Some(format!("'{ext}' is not a single file extension"))
            } else {
                None
            }
        })
    }

    pub fn matches(&self, module: &Module) -> bool {
        let Some(ext) = module.extension() else {
            return false;
        };
        if !self.extensions.iter().any(|candidate| *candidate == ext) {
            return false;
        }
        match &self.source_dir {
            Some(dir) => module.path.starts_with(dir),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{ModuleId, ModuleKind, ModuleOrigin};

    fn module(path: &str) -> Module {
        let path = PathBuf::from(path);
        Module {
            id: ModuleId(0),
            kind: ModuleKind::from_path(&path),
            origin: ModuleOrigin::from_path(&path),
            path,
            size: 0,
        }
    }

    #[test]
    fn extension_never_matches_substring() {
        let ts = ModuleTest::extensions(["ts"]);
        assert!(ts.matches(&module("/app/src/util.ts")));
        assert!(!ts.matches(&module("/app/src/App.tsx")));
        assert!(!ts.matches(&module("/app/src/util.ts.map")));
        assert!(!ts.matches(&module("/app/src/ts")));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let test = ModuleTest::extensions([".PNG", "jpg"]);
        assert!(test.matches(&module("/app/src/Logo.png")));
        assert!(test.matches(&module("/app/src/photo.JPG")));
    }

    #[test]
    fn source_dir_restriction() {
        let test = ModuleTest::extensions(["js"]).under("/app/src");
        assert!(test.matches(&module("/app/src/main.js")));
        assert!(!test.matches(&module("/app/node_modules/react/index.js")));
        assert!(!test.matches(&module("/app/srcs/other.js")));
    }

    #[test]
    fn malformed_extensions_are_reported() {
        assert!(ModuleTest::extensions(Vec::<String>::new()).problem().is_some());
        assert!(ModuleTest::extensions(["d.ts"]).problem().is_some());
        assert!(ModuleTest::extensions(["ts", "tsx"]).problem().is_none());
    }
}
