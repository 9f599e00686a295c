use regex::Regex;

use crate::error::{Error, Result};
use crate::module::Module;

/// Prefix reserved for per-entry runtime bundles.
pub const RUNTIME_PREFIX: &str = "runtime~";

/// Name of the runtime-only bundle belonging to `entry`.
pub fn runtime_bundle_name(entry: &str) -> String {
    format!("{RUNTIME_PREFIX}{entry}")
}

/// Predicate over a module's origin.
#[derive(Debug, Clone)]
pub enum PartitionTest {
    /// Regular expression over the module's absolute path.
    Pattern(Regex),
    /// Dependency modules from one of these packages. A trailing `*` matches
    /// by prefix (`@babel/*`).
    Packages(Vec<String>),
    /// Any dependency module.
    Dependencies,
    /// Any application module.
    Application,
}

impl PartitionTest {
    pub fn pattern(source: &str) -> std::result::Result<Self, regex::Error> {
        Regex::new(source).map(PartitionTest::Pattern)
    }

    pub fn matches(&self, module: &Module) -> bool {
        match self {
            PartitionTest::Pattern(re) => re.is_match(&module.path.to_string_lossy()),
            PartitionTest::Packages(names) => match module.origin.package() {
                Some(package) => names.iter().any(|name| match name.strip_suffix('*') {
                    Some(prefix) => package.starts_with(prefix),
                    None => package == name,
                }),
                None => false,
            },
            PartitionTest::Dependencies => module.origin.is_dependency(),
            PartitionTest::Application => !module.origin.is_dependency(),
        }
    }
}

/// Routes matching modules into a named bundle.
#[derive(Debug, Clone)]
pub struct PartitionRule {
    /// Group key, used in diagnostics.
    pub key: String,
    pub test: PartitionTest,
    pub bundle: String,
    pub priority: i32,
}

impl PartitionRule {
    pub fn new(key: impl Into<String>, test: PartitionTest, bundle: impl Into<String>, priority: i32) -> Self {
        Self {
            key: key.into(),
            test,
            bundle: bundle.into(),
            priority,
        }
    }
}

/// Partition rules in declaration order plus the runtime bundle switch.
#[derive(Debug, Clone)]
pub struct PartitionRules {
    rules: Vec<PartitionRule>,
    runtime_bundle: bool,
}

impl PartitionRules {
    pub fn new(rules: Vec<PartitionRule>, runtime_bundle: bool) -> Result<Self> {
        for (idx, rule) in rules.iter().enumerate() {
            if rule.bundle.trim().is_empty() {
                return Err(Error::InvalidRule {
                    rule: idx,
                    name: rule.key.clone(),
                    message: "bundle name is empty".to_string(),
                });
            }
            if rule.bundle.starts_with(RUNTIME_PREFIX) {
                return Err(Error::ReservedBundleName {
                    rule: idx,
                    bundle: rule.bundle.clone(),
                });
            }
        }
        Ok(Self {
            rules,
            runtime_bundle,
        })
    }

    /// `react` (priority 40) and `libs` (priority 20) groups, with a runtime
    /// bundle per entry.
    pub fn defaults() -> Result<Self> {
        let react = PartitionTest::pattern(r"[\\/]node_modules[\\/]react(.*)?[\\/]").map_err(|e| {
            Error::InvalidRule {
                rule: 0,
                name: "react".to_string(),
                message: e.to_string(),
            }
        })?;
        let libs = PartitionTest::pattern(r"[\\/]node_modules[\\/]").map_err(|e| Error::InvalidRule {
            rule: 1,
            name: "libs".to_string(),
            message: e.to_string(),
        })?;

        Self::new(
            vec![
                PartitionRule::new("react", react, "chunk-react", 40),
                PartitionRule::new("libs", libs, "chunk-libs", 20),
            ],
            true,
        )
    }

    pub fn rules(&self) -> &[PartitionRule] {
        &self.rules
    }

    pub fn runtime_bundle(&self) -> bool {
        self.runtime_bundle
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

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
    fn default_react_pattern() {
        let rules = PartitionRules::defaults().unwrap();
        let react = &rules.rules()[0].test;
        assert!(react.matches(&module("/app/node_modules/react/index.js")));
        assert!(react.matches(&module("/app/node_modules/react-dom/client.js")));
        assert!(!react.matches(&module("/app/node_modules/preact/index.js")));
        assert!(!react.matches(&module("/app/src/react/App.js")));
    }

    #[test]
    fn package_prefixes() {
        let test = PartitionTest::Packages(vec!["lodash".into(), "@babel/*".into()]);
        assert!(test.matches(&module("/app/node_modules/lodash/map.js")));
        assert!(test.matches(&module("/app/node_modules/@babel/runtime/helpers.js")));
        assert!(!test.matches(&module("/app/node_modules/lodash-es/map.js")));
        assert!(!test.matches(&module("/app/src/lodash/map.js")));
    }

    #[test]
    fn origin_tests() {
        assert!(PartitionTest::Dependencies.matches(&module("/app/node_modules/a/index.js")));
        assert!(!PartitionTest::Dependencies.matches(&module("/app/src/main.js")));
        assert!(PartitionTest::Application.matches(&module("/app/src/main.js")));
    }

    #[test]
    fn runtime_names_are_reserved() {
        let err = PartitionRules::new(
            vec![PartitionRule::new("bad", PartitionTest::Dependencies, "runtime~main", 1)],
            true,
        )
        .unwrap_err();
        assert!(matches!(err, Error::ReservedBundleName { rule: 0, .. }));
    }
}
