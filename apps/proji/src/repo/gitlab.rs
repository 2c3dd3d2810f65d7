//! GitLab tree importer
//!
//! Uses the paginated repository tree endpoint. The next page number comes
//! back in the `X-Next-Page` header, which is empty on the last page.

use super::transport::Transport;
use super::{collect_pages, Importer, Page, RepoSource, RepoTree, TreeEntry};
use crate::config::RemoteConfig;
use crate::error::{ProjiError, Result};

const NEXT_PAGE_HEADER: &str = "X-Next-Page";

pub struct GitLab<T> {
    source: RepoSource,
    api_base: String,
    per_page: u32,
    max_pages: u32,
    transport: T,
}

impl<T: Transport> GitLab<T> {
    pub fn new(source: RepoSource, transport: T, config: &RemoteConfig) -> Self {
        Self {
            source,
            api_base: config.gitlab_api.trim_end_matches('/').to_string(),
            per_page: config.per_page,
            max_pages: config.max_pages,
            transport,
        }
    }

    fn page_url(&self, page: &str) -> String {
        // The project is addressed by its url-encoded "owner/repo" path
        let project = format!("{}/{}", self.source.owner, self.source.repo);
        format!(
            "{}/projects/{}/repository/tree?ref={}&recursive=true&per_page={}&page={}",
            self.api_base,
            urlencoding::encode(&project),
            urlencoding::encode(&self.source.branch),
            self.per_page,
            urlencoding::encode(page),
        )
    }

    fn fetch_page(&self, page: &str) -> Result<Page> {
        let url = self.page_url(page);
        let response = self.transport.get(&url)?.error_for_status(&url)?;

        let entries: Vec<TreeEntry> = serde_json::from_str(&response.body)
            .map_err(|e| ProjiError::network(format!("decoding {url} failed: {e}")))?;
        let next = response
            .header(NEXT_PAGE_HEADER)
            .map(|v| v.trim().to_string());

        Ok(Page { entries, next })
    }
}

impl<T: Transport> Importer for GitLab<T> {
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
            host = "gitlab",
            owner = %self.source.owner,
            repo = %self.source.repo
        )
        .entered();

        let tree = collect_pages("1", self.max_pages, |page| self.fetch_page(page))?;
        tracing::info!(entries = tree.len(), "Fetched GitLab tree");
        Ok(tree)
    }
}
