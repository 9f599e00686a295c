//! The externally supplied module graph.
//!
//! The core never resolves imports itself. A graph is assembled from a list
//! of modules, import edges and named entry points, then frozen. Building
//! the graph also fixes which entry "owns" each module: the first entry, in
//! declaration order, whose import closure reaches it.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use path_clean::PathClean;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::module::{Module, ModuleId, ModuleKind, ModuleOrigin};

/// A named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub module: ModuleId,
}

/// Immutable module graph for one build.
#[derive(Debug, Clone)]
pub struct ModuleGraph {
    root: PathBuf,
    modules: Vec<Module>,
    index: FxHashMap<PathBuf, ModuleId>,
    imports: Vec<Vec<ModuleId>>,
    entries: Vec<Entry>,
    owners: Vec<usize>,
}

impl ModuleGraph {
    pub fn builder(root: impl Into<PathBuf>) -> ModuleGraphBuilder {
        ModuleGraphBuilder::new(root)
    }

    /// Project root every relative path was resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Modules in graph order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn lookup(&self, path: &Path) -> Option<ModuleId> {
        self.index.get(path).copied()
    }

    pub fn imports(&self, id: ModuleId) -> &[ModuleId] {
        &self.imports[id.index()]
    }

    /// Entry points in declaration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// The entry that owns `id`.
    pub fn owner(&self, id: ModuleId) -> &Entry {
        &self.entries[self.owners[id.index()]]
    }

    pub fn is_entry_module(&self, id: ModuleId) -> bool {
        self.entries.iter().any(|entry| entry.module == id)
    }

    /// Path relative to the project root, with forward slashes.
    pub fn display_path(&self, id: ModuleId) -> String {
        let path = &self.module(id).path;
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    }
}

struct PendingModule {
    path: PathBuf,
    kind: Option<ModuleKind>,
    size: u64,
}

/// Collects modules, edges and entries, then validates them in [`build`].
///
/// [`build`]: ModuleGraphBuilder::build
pub struct ModuleGraphBuilder {
    root: PathBuf,
    modules: Vec<PendingModule>,
    imports: Vec<(PathBuf, PathBuf)>,
    entries: Vec<(String, PathBuf)>,
}

impl ModuleGraphBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into().clean(),
            modules: Vec::new(),
            imports: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Add a module. The type tag is inferred from the extension when `kind` is `None`.
    pub fn module(mut self, path: impl AsRef<Path>, kind: Option<ModuleKind>, size: u64) -> Self {
        let path = self.absolute(path.as_ref());
        self.modules.push(PendingModule { path, kind, size });
        self
    }

    pub fn import(mut self, from: impl AsRef<Path>, to: impl AsRef<Path>) -> Self {
        let from = self.absolute(from.as_ref());
        let to = self.absolute(to.as_ref());
        self.imports.push((from, to));
        self
    }

    pub fn entry(mut self, name: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let path = self.absolute(path.as_ref());
        self.entries.push((name.into(), path));
        self
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.clean()
        } else {
            self.root.join(path).clean()
        }
    }

    pub fn build(self) -> Result<ModuleGraph> {
        if self.entries.is_empty() {
            return Err(Error::NoEntries);
        }

        let mut modules = Vec::with_capacity(self.modules.len());
        let mut index = FxHashMap::default();

        for pending in self.modules {
            if index.contains_key(&pending.path) {
                return Err(Error::DuplicateModule(pending.path));
            }
            let id = ModuleId(modules.len() as u32);
            index.insert(pending.path.clone(), id);
            modules.push(Module {
                id,
                kind: pending
                    .kind
                    .unwrap_or_else(|| ModuleKind::from_path(&pending.path)),
                origin: ModuleOrigin::from_path(&pending.path),
                path: pending.path,
                size: pending.size,
            });
        }

        let mut imports = vec![Vec::new(); modules.len()];
        for (from, to) in self.imports {
            let Some(&from_id) = index.get(&from) else {
                return Err(Error::UnknownImport { from, to });
            };
            let Some(&to_id) = index.get(&to) else {
                return Err(Error::UnknownImport { from, to });
            };
            let edges: &mut Vec<ModuleId> = &mut imports[from_id.index()];
            if !edges.contains(&to_id) {
                edges.push(to_id);
            }
        }

        let mut entries = Vec::with_capacity(self.entries.len());
        for (name, path) in self.entries {
            let Some(&module) = index.get(&path) else {
                return Err(Error::UnknownEntry { name, path });
            };
            entries.push(Entry { name, module });
        }

        let owners = assign_owners(modules.len(), &imports, &entries);
        let owners = owners
            .into_iter()
            .enumerate()
            .map(|(idx, owner)| owner.ok_or_else(|| Error::UnreachableModule(modules[idx].path.clone())))
            .collect::<Result<Vec<_>>>()?;

        Ok(ModuleGraph {
            root: self.root,
            modules,
            index,
            imports,
            entries,
            owners,
        })
    }
}

/// Breadth-first walk from each entry in turn; the first walk to reach a
/// module owns it.
fn assign_owners(len: usize, imports: &[Vec<ModuleId>], entries: &[Entry]) -> Vec<Option<usize>> {
    let mut owners: Vec<Option<usize>> = vec![None; len];

    for (entry_idx, entry) in entries.iter().enumerate() {
        let mut queue = VecDeque::from([entry.module]);
        while let Some(id) = queue.pop_front() {
            if owners[id.index()].is_some() {
                continue;
            }
            owners[id.index()] = Some(entry_idx);
            for next in &imports[id.index()] {
                if owners[next.index()].is_none() {
                    queue.push_back(*next);
                }
            }
        }
    }

    owners
}
