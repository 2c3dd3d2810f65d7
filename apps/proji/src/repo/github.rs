//! GitHub tree importer
//!
//! The recursive git trees endpoint returns the whole tree in one response.
//! GitHub caps very large trees and flags the response as `truncated`.

use serde::Deserialize;

use super::transport::Transport;
use super::{collect_pages, Importer, Page, RepoSource, RepoTree, TreeEntry};
use crate::config::RemoteConfig;
use crate::error::{ProjiError, Result};

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

pub struct GitHub<T> {
    source: RepoSource,
    api_base: String,
    max_pages: u32,
    transport: T,
}

impl<T: Transport> GitHub<T> {
    pub fn new(source: RepoSource, transport: T, config: &RemoteConfig) -> Self {
        Self {
            source,
            api_base: config.github_api.trim_end_matches('/').to_string(),
            max_pages: config.max_pages,
            transport,
        }
    }

    fn tree_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_base,
            urlencoding::encode(&self.source.owner),
            urlencoding::encode(&self.source.repo),
            urlencoding::encode(&self.source.branch),
        )
    }

    fn fetch_page(&self) -> Result<Page> {
        let url = self.tree_url();
        let response = self.transport.get(&url)?.error_for_status(&url)?;

        let body: TreeResponse = serde_json::from_str(&response.body)
            .map_err(|e| ProjiError::network(format!("decoding {url} failed: {e}")))?;

        if body.truncated {
            tracing::warn!(
                owner = %self.source.owner,
                repo = %self.source.repo,
                "GitHub truncated the tree listing"
            );
        }

        Ok(Page {
            entries: body.tree,
            next: None,
        })
    }
}

impl<T: Transport> Importer for GitHub<T> {
    fn owner(&self) -> &str {
        &self.source.owner
    }

    fn repo(&self) -> &str {
        &self.source.repo
    }

    fn branch(&self) -> &str {
        &self.source.branch
    }

    fn fetch_tree(&self) -> Result<RepoTree> {
        let _span = crate::operation_span!(
            "fetch_tree",
            host = "github",
            owner = %self.source.owner,
            repo = %self.source.repo
        )
        .entered();

        let tree = collect_pages("1", self.max_pages, |_| self.fetch_page())?;
        tracing::info!(entries = tree.len(), "Fetched GitHub tree");
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::testing::ScriptedTransport;
    use crate::repo::{EntryType, Host, HttpResponse};

    fn github(responses: Vec<HttpResponse>) -> GitHub<ScriptedTransport> {
        let source = RepoSource::new(Host::GitHub, "nikoksr", "proji", Some("main")).unwrap();
        GitHub::new(source, ScriptedTransport::new(responses), &RemoteConfig::default())
    }

    #[test]
    fn test_fetch_tree() {
        let body = serde_json::json!({
            "sha": "abc",
            "tree": [
                { "path": "cmd", "type": "tree", "sha": "1" },
                { "path": "cmd/root.go", "type": "blob", "sha": "2" },
                { "path": "README.md", "type": "blob", "sha": "3" }
            ],
            "truncated": false
        });
        let importer = github(vec![HttpResponse::new(200, body.to_string())]);

        let tree = importer.fetch_tree().unwrap();

        assert_eq!(tree.paths, vec!["cmd", "cmd/root.go", "README.md"]);
        assert_eq!(
            tree.types,
            vec![EntryType::Dir, EntryType::File, EntryType::File]
        );
        assert_eq!(
            importer.transport.requests.borrow()[0],
            "https://api.github.com/repos/nikoksr/proji/git/trees/main?recursive=1"
        );
    }

    #[test]
    fn test_truncated_tree_is_still_returned() {
        let body = serde_json::json!({
            "tree": [{ "path": "a", "type": "blob" }],
            "truncated": true
        });
        let importer = github(vec![HttpResponse::new(200, body.to_string())]);

        assert_eq!(importer.fetch_tree().unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_body_is_network_error() {
        let importer = github(vec![HttpResponse::new(200, "<html>")]);
        let err = importer.fetch_tree().unwrap_err();
        assert!(matches!(err, ProjiError::Network(_)), "got: {err}");
    }

    #[test]
    fn test_rate_limited_is_network_error() {
        let importer = github(vec![HttpResponse::new(403, r#"{"message":"rate limited"}"#)]);
        let err = importer.fetch_tree().unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
