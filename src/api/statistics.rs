//! Statistics controller.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::{ApiClient, ApiError};
use crate::lifecycle::CancellationSignal;

/// Path of the NuGet statistics action; the package id is appended.
pub const GET_NUGET_STATS: &str = "api/Statistics/GetNugetStats/";

/// Repository queried by [`ApiClient::get_github_stats`].
pub const GITHUB_REPO_URL: &str = "https://api.github.com/repos/bitfoundation/bitplatform";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NugetStats {
    pub total_downloads: u64,
}

/// Subset of GitHub's repository resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubStats {
    pub full_name: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues_count: u64,
    pub watchers_count: u64,
}

impl ApiClient {
    /// Download totals for a NuGet package, as aggregated by the server.
    pub async fn get_nuget_stats(
        &self,
        package_id: &str,
        cancel: CancellationSignal,
    ) -> Result<NugetStats, ApiError> {
        let mut url = self.url(GET_NUGET_STATS)?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("base URL cannot take path segments".into()))?
            .pop_if_empty()
            .push(package_id);
        self.get_json_at(url, cancel).await
    }

    /// Repository statistics straight from the GitHub API.
    pub async fn get_github_stats(&self, cancel: CancellationSignal) -> Result<GitHubStats, ApiError> {
        let url = Url::parse(GITHUB_REPO_URL)
            .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        self.get_github_stats_at(url, cancel).await
    }

    /// Same as [`get_github_stats`](Self::get_github_stats) against another
    /// repository resource, e.g. a GitHub Enterprise host.
    pub async fn get_github_stats_at(
        &self,
        repo_url: Url,
        cancel: CancellationSignal,
    ) -> Result<GitHubStats, ApiError> {
        self.get_json_at(repo_url, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn github_payload_ignores_unknown_fields() {
        let stats: GitHubStats = serde_json::from_str(
            r#"{"full_name":"bitfoundation/bitplatform","stargazers_count":1100,"forks_count":230,"private":false}"#,
        )
        .unwrap();
        assert_eq!(stats.full_name, "bitfoundation/bitplatform");
        assert_eq!(stats.stargazers_count, 1100);
        assert_eq!(stats.open_issues_count, 0);
    }

    #[test]
    fn nuget_payload_is_camel_case() {
        let stats: NugetStats = serde_json::from_str(r#"{"totalDownloads":42}"#).unwrap();
        assert_eq!(stats.total_downloads, 42);
    }
}
