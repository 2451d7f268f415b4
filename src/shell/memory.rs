use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{CopyRequest, Entry, Namespace};
use crate::errors::NamespaceError;
use crate::files::paths::segments;

enum Node {
    Folder(Vec<(String, Node)>),
    File(usize),
}

#[derive(Debug, Clone)]
pub struct MemFolder(Vec<String>);

#[derive(Debug, Clone)]
pub struct MemItem {
    pub id: usize,
    pub path: String,
}

/// In-memory tree standing in for a device; copies write the item's path as
/// the file contents.
pub struct MemoryNamespace {
    root: Node,
    failing: HashSet<String>,
    unreadable: HashSet<String>,
    pub copies: RefCell<Vec<(String, PathBuf)>>,
    pub batches: RefCell<usize>,
    pub resolved: RefCell<Vec<PathBuf>>,
}

impl MemoryNamespace {
    /// Files are given relative to `mount`, which is created as a chain of folders.
    pub fn new(mount: &str, files: &[&str]) -> Self {
        let mut root = Node::Folder(Vec::new());
        for (id, file) in files.iter().enumerate() {
            let parts: Vec<&str> = segments(mount).chain(segments(file)).collect();
            insert(&mut root, &parts, id);
        }
        Self {
            root,
            failing: HashSet::new(),
            unreadable: HashSet::new(),
            copies: RefCell::new(Vec::new()),
            batches: RefCell::new(0),
            resolved: RefCell::new(Vec::new()),
        }
    }

    /// Copies of the item with this absolute display path will fail.
    pub fn fail_on(mut self, path: &str) -> Self {
        self.failing.insert(path.to_owned());
        self
    }

    /// Listing the folder with this display path will fail.
    pub fn unreadable(mut self, path: &str) -> Self {
        self.unreadable.insert(path.to_owned());
        self
    }

    fn node(&self, path: &[String]) -> Option<&Node> {
        let mut current = &self.root;
        for part in path {
            match current {
                Node::Folder(children) => {
                    current = children
                        .iter()
                        .find(|(name, node)| name == part && matches!(node, Node::Folder(_)))
                        .map(|(_, node)| node)?;
                }
                Node::File(_) => return None,
            }
        }
        Some(current)
    }
}

fn insert(node: &mut Node, parts: &[&str], id: usize) {
    let Node::Folder(children) = node else {
        return;
    };
    match parts {
        [] => {}
        [name] => children.push((name.to_string(), Node::File(id))),
        [name, rest @ ..] => {
            let index = match children
                .iter()
                .position(|(n, child)| n == name && matches!(child, Node::Folder(_)))
            {
                Some(index) => index,
                None => {
                    children.push((name.to_string(), Node::Folder(Vec::new())));
                    children.len() - 1
                }
            };
            insert(&mut children[index].1, rest, id);
        }
    }
}

impl Namespace for MemoryNamespace {
    type Folder = MemFolder;
    type Item = MemItem;
    type Destination = PathBuf;

    fn root(&self) -> Result<MemFolder, NamespaceError> {
        Ok(MemFolder(Vec::new()))
    }

    fn children(
        &self,
        folder: &MemFolder,
    ) -> Result<Vec<Entry<MemFolder, MemItem>>, NamespaceError> {
        let display = folder.0.join("\\");
        if self.unreadable.contains(&display) {
            return Err(NamespaceError::Shell(format!("cannot list {}", display)));
        }
        let Some(Node::Folder(children)) = self.node(&folder.0) else {
            return Err(NamespaceError::Shell(format!("no folder {:?}", folder.0)));
        };

        let mut sorted: Vec<&(String, Node)> = children.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(sorted
            .into_iter()
            .map(|(name, node)| {
                let mut path = folder.0.clone();
                path.push(name.clone());
                match node {
                    Node::Folder(_) => Entry::Folder {
                        name: name.clone(),
                        folder: MemFolder(path),
                    },
                    Node::File(id) => Entry::File(MemItem {
                        id: *id,
                        path: path.join("\\"),
                    }),
                }
            })
            .collect())
    }

    fn folder_path(&self, folder: &MemFolder) -> Result<String, NamespaceError> {
        Ok(folder.0.join("\\"))
    }

    fn item_path(&self, item: &MemItem) -> Result<String, NamespaceError> {
        Ok(item.path.clone())
    }

    fn resolve_destination(&self, dir: &Path) -> Result<PathBuf, NamespaceError> {
        if !dir.is_dir() {
            return Err(NamespaceError::DestinationNotFound(dir.display().to_string()));
        }
        self.resolved.borrow_mut().push(dir.to_path_buf());
        Ok(dir.to_path_buf())
    }

    fn copy_batch(&self, requests: &[CopyRequest<'_, Self>]) -> Result<(), NamespaceError> {
        *self.batches.borrow_mut() += 1;
        if let Some(bad) = requests.iter().find(|r| self.failing.contains(&r.item.path)) {
            return Err(NamespaceError::Shell(format!("cannot copy {}", bad.item.path)));
        }
        for request in requests {
            let target = request.destination.join(request.name);
            fs::write(&target, &request.item.path)?;
            self.copies
                .borrow_mut()
                .push((request.item.path.clone(), target));
        }
        Ok(())
    }
}
