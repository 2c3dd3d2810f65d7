//! Remote repository tree fetching
//!
//! An [`Importer`] lists every path of a hosted repository together with its
//! entry type. Host-specific importers live in [`github`] and [`gitlab`];
//! callers get one through [`importer_for`] and only see the trait.

pub mod github;
pub mod gitlab;
pub mod transport;
pub mod url;

pub use transport::{HttpResponse, Transport, UreqTransport};
pub use url::{Host, RepoSource};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::RemoteConfig;
use crate::db::models::Class;
use crate::error::{ProjiError, Result};

/// Kind of entry in a repository tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::File => "file",
            EntryType::Dir => "dir",
        }
    }

    /// Map a host's vocabulary (`blob`/`tree`) onto an entry type
    ///
    /// Returns `None` for entries that are neither, such as submodule commits.
    pub fn from_host(kind: &str) -> Option<Self> {
        match kind {
            "blob" | "file" => Some(EntryType::File),
            "tree" | "dir" => Some(EntryType::Dir),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paths of a repository tree with the entry type of each
///
/// `paths` and `types` always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoTree {
    pub paths: Vec<String>,
    pub types: Vec<EntryType>,
}

impl RepoTree {
    pub fn push(&mut self, path: impl Into<String>, kind: EntryType) {
        self.paths.push(path.into());
        self.types.push(kind);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, EntryType)> + '_ {
        self.paths
            .iter()
            .map(String::as_str)
            .zip(self.types.iter().copied())
    }

    /// Build a class whose folders and files mirror this tree
    ///
    /// Every entry becomes an empty folder or file; templates, labels and
    /// scripts are left for the caller to fill in.
    pub fn to_class(&self, name: impl Into<String>) -> Class {
        let mut class = Class::new(name);
        for (path, kind) in self.iter() {
            match kind {
                EntryType::Dir => class.folders.insert(path.to_string(), None),
                EntryType::File => class.files.insert(path.to_string(), None),
            };
        }
        class
    }
}

/// Fetches the file tree of one hosted repository
pub trait Importer {
    fn owner(&self) -> &str;
    fn repo(&self) -> &str;
    fn branch(&self) -> &str;

    /// List every path of the repository, following pagination to the end
    fn fetch_tree(&self) -> Result<RepoTree>;
}

/// Pick the importer matching the source's host
pub fn importer_for<T>(source: RepoSource, transport: T, config: &RemoteConfig) -> Box<dyn Importer>
where
    T: Transport + 'static,
{
    match source.host {
        Host::GitHub => Box::new(github::GitHub::new(source, transport, config)),
        Host::GitLab => Box::new(gitlab::GitLab::new(source, transport, config)),
    }
}

/// Parse `url` and build an importer backed by a real HTTP client
pub fn importer_from_url(url: &str, config: &RemoteConfig) -> Result<Box<dyn Importer>> {
    let source = RepoSource::parse(url)?;
    let transport = UreqTransport::new(Duration::from_secs(config.timeout_secs));
    Ok(importer_for(source, transport, config))
}

/// Entry as returned by the hosts' tree endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One page of a paginated listing
#[derive(Debug, Default)]
pub(crate) struct Page {
    pub entries: Vec<TreeEntry>,
    /// Token for the next page; `None` or empty when this was the last
    pub next: Option<String>,
}

/// Request pages starting at `first` until the host reports no further page
///
/// An empty page also ends the listing. More than `max_pages` pages is
/// treated as a runaway listing and fails.
pub(crate) fn collect_pages<F>(first: &str, max_pages: u32, mut fetch_page: F) -> Result<RepoTree>
where
    F: FnMut(&str) -> Result<Page>,
{
    let mut tree = RepoTree::default();
    let mut token = first.to_string();
    let mut fetched = 0u32;

    loop {
        if fetched >= max_pages {
            return Err(ProjiError::network(format!(
                "tree listing did not finish after {max_pages} pages"
            )));
        }

        let page = fetch_page(&token)?;
        fetched += 1;
        tracing::debug!(page = %token, entries = page.entries.len(), "Fetched tree page");

        if page.entries.is_empty() {
            break;
        }
        append_entries(&mut tree, page.entries);

        match page.next {
            Some(next) if !next.is_empty() => token = next,
            _ => break,
        }
    }

    Ok(tree)
}

pub(crate) fn append_entries(tree: &mut RepoTree, entries: Vec<TreeEntry>) {
    for entry in entries {
        match EntryType::from_host(&entry.kind) {
            Some(kind) => tree.push(entry.path, kind),
            None => tracing::debug!(path = %entry.path, kind = %entry.kind, "Skipping tree entry"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;

    /// Transport replaying canned responses and recording requested URLs
    #[derive(Default)]
    pub struct ScriptedTransport {
        responses: RefCell<Vec<HttpResponse>>,
        pub requests: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        pub fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: RefCell::new(responses),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for ScriptedTransport {
        fn get(&self, url: &str) -> Result<HttpResponse> {
            self.requests.borrow_mut().push(url.to_string());
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                return Err(ProjiError::network("no scripted response left"));
            }
            Ok(responses.remove(0))
        }
    }

    /// JSON array of `count` blob entries named `{prefix}{i}`
    pub fn entries_json(prefix: &str, count: usize) -> String {
        let entries: Vec<serde_json::Value> = (0..count)
            .map(|i| serde_json::json!({ "path": format!("{prefix}{i}"), "type": "blob" }))
            .collect();
        serde_json::Value::Array(entries).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(count: usize, next: Option<&str>) -> Page {
        Page {
            entries: (0..count)
                .map(|i| TreeEntry {
                    path: format!("p{i}"),
                    kind: if i % 2 == 0 { "blob" } else { "tree" }.to_string(),
                })
                .collect(),
            next: next.map(str::to_string),
        }
    }

    #[test]
    fn test_entry_type_from_host() {
        assert_eq!(EntryType::from_host("blob"), Some(EntryType::File));
        assert_eq!(EntryType::from_host("tree"), Some(EntryType::Dir));
        assert_eq!(EntryType::from_host("commit"), None);
        assert_eq!(EntryType::Dir.as_str(), "dir");
    }

    #[test]
    fn test_collect_pages_follows_tokens() {
        let mut pages = vec![page(3, Some("2")), page(2, Some("3")), page(1, None)];
        let mut requested = Vec::new();

        let tree = collect_pages("1", 10, |token| {
            requested.push(token.to_string());
            Ok(pages.remove(0))
        })
        .unwrap();

        assert_eq!(requested, vec!["1", "2", "3"]);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.types.len(), tree.paths.len());
    }

    #[test]
    fn test_collect_pages_stops_on_empty_page() {
        let mut calls = 0;
        let tree = collect_pages("1", 10, |_| {
            calls += 1;
            Ok(if calls == 1 { page(2, Some("2")) } else { page(0, Some("3")) })
        })
        .unwrap();

        assert_eq!(calls, 2);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_collect_pages_guards_against_endless_listing() {
        let err = collect_pages("1", 5, |_| Ok(page(1, Some("again")))).unwrap_err();
        assert!(matches!(err, ProjiError::Network(_)), "got: {err}");
    }

    #[test]
    fn test_collect_pages_propagates_fetch_errors() {
        let err = collect_pages("1", 5, |_| Err(ProjiError::network("boom"))).unwrap_err();
        assert_eq!(err.to_string(), "Network error: boom");
    }

    #[test]
    fn test_unknown_entry_kinds_are_skipped() {
        let mut tree = RepoTree::default();
        append_entries(
            &mut tree,
            vec![
                TreeEntry { path: "src".into(), kind: "tree".into() },
                TreeEntry { path: "vendor/lib".into(), kind: "commit".into() },
                TreeEntry { path: "src/main.rs".into(), kind: "blob".into() },
            ],
        );

        let pairs: Vec<(&str, EntryType)> = tree.iter().collect();
        assert_eq!(
            pairs,
            vec![("src", EntryType::Dir), ("src/main.rs", EntryType::File)]
        );
    }

    #[test]
    fn test_to_class_splits_folders_and_files() {
        let mut tree = RepoTree::default();
        tree.push("src", EntryType::Dir);
        tree.push("src/lib.rs", EntryType::File);
        tree.push("Cargo.toml", EntryType::File);

        let class = tree.to_class("rust-lib");
        assert_eq!(class.name, "rust-lib");
        assert_eq!(class.folders.keys().collect::<Vec<_>>(), vec!["src"]);
        assert_eq!(
            class.files.keys().collect::<Vec<_>>(),
            vec!["Cargo.toml", "src/lib.rs"]
        );
        assert!(class.files.values().all(Option::is_none));
    }

    #[test]
    fn test_importer_for_picks_host() {
        let config = RemoteConfig::default();
        let source = RepoSource::parse("https://gitlab.com/group/project/-/tree/main").unwrap();
        let importer = importer_for(source, testing::ScriptedTransport::default(), &config);
        assert_eq!(importer.owner(), "group");
        assert_eq!(importer.repo(), "project");
        assert_eq!(importer.branch(), "main");
    }
}
