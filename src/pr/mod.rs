pub mod diff;
pub mod types;

pub use types::{EventDescriptor, FileDiff, PrContext, ReviewComment};
#[cfg(test)]
pub use types::FileStatus;

use crate::config::{ConfigError, GitHubConfig};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use types::ReviewRequest;

const API_VERSION: &str = "2022-11-28";
const FILES_PER_PAGE: usize = 100;
/// The files endpoint stops at 3000 entries.
const MAX_FILE_PAGES: u32 = 30;

#[derive(Debug, Error)]
pub enum PrError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{call} failed with status {status}: {body}")]
    Api {
        call: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to parse patch: {0}")]
    PatchParse(String),
}

/// Read and parse the event descriptor written by the CI runner.
pub fn read_event(path: &Path) -> Result<EventDescriptor, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::EventRead {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::EventParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Thin client over the three GitHub REST calls the reviewer makes.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, PrError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("pr-reviewer"));
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(API_VERSION),
        );
        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
        })
    }

    fn get(&self, url: &str) -> RequestBuilder {
        self.http.get(url).bearer_auth(&self.token)
    }

    /// Fetch title and description and merge them with the event's identifiers.
    #[instrument(skip(self, event), fields(repo = %event.repository.full_name, pr = event.number))]
    pub async fn fetch_context(&self, event: &EventDescriptor) -> Result<PrContext, PrError> {
        #[derive(serde::Deserialize)]
        struct PullResponse {
            title: Option<String>,
            body: Option<String>,
        }

        let url = format!(
            "{}/repos/{}/pulls/{}",
            self.api_url, event.repository.full_name, event.number
        );
        debug!(url = %url, "fetching PR metadata from GitHub API");
        let response = self.get(&url).send().await?;
        let pull = check_status("Retrieving pull request", response)
            .await?
            .json::<PullResponse>()
            .await?;

        let context = PrContext {
            owner: event.repository.owner.login.clone(),
            repo: event.repository.name.clone(),
            full_name: event.repository.full_name.clone(),
            pull_number: event.number,
            title: pull.title.unwrap_or_default(),
            description: pull.body.unwrap_or_default(),
        };
        debug!(title = %context.title, "received PR metadata");
        Ok(context)
    }

    /// List every changed file of the PR in API order, following pages.
    /// Nothing is filtered here.
    #[instrument(skip(self))]
    pub async fn fetch_files(
        &self,
        owner: &str,
        repo: &str,
        pull_number: u64,
    ) -> Result<Vec<FileDiff>, PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/files",
            self.api_url, owner, repo, pull_number
        );
        let per_page = FILES_PER_PAGE.to_string();

        let mut files = Vec::new();
        for page in 1..=MAX_FILE_PAGES {
            let page_param = page.to_string();
            debug!(page, "fetching PR files page");
            let response = self
                .get(&url)
                .query(&[("per_page", per_page.as_str()), ("page", page_param.as_str())])
                .send()
                .await?;
            let batch = check_status("Retrieving diff", response)
                .await?
                .json::<Vec<FileDiff>>()
                .await?;

            let full_page = batch.len() >= FILES_PER_PAGE;
            files.extend(batch);
            if !full_page {
                break;
            }
            if page == MAX_FILE_PAGES {
                warn!(files = files.len(), "file list reached the API page limit");
            }
        }

        debug!(files = files.len(), "received PR files");
        Ok(files)
    }

    /// Post all comments as one review with event=COMMENT.
    #[instrument(skip(self, context, body, comments), fields(repo = %context.full_name, pr = context.pull_number, comments = comments.len()))]
    pub async fn create_review(
        &self,
        context: &PrContext,
        body: &str,
        comments: &[ReviewComment],
    ) -> Result<(), PrError> {
        let url = format!(
            "{}/repos/{}/{}/pulls/{}/reviews",
            self.api_url, context.owner, context.repo, context.pull_number
        );
        let request = ReviewRequest {
            event: "COMMENT",
            body,
            comments,
        };

        debug!("creating PR review");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;
        check_status("Creating review", response).await?;
        Ok(())
    }
}

/// Post the review unless there is nothing to say.
/// Returns whether the create-review endpoint was called.
pub async fn publish(
    github: &GitHubClient,
    context: &PrContext,
    body: &str,
    comments: &[ReviewComment],
) -> Result<bool, PrError> {
    if comments.is_empty() {
        debug!("no review comments produced, skipping review");
        return Ok(false);
    }
    github.create_review(context, body, comments).await?;
    Ok(true)
}

async fn check_status(call: &'static str, response: Response) -> Result<Response, PrError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(PrError::Api { call, status, body })
}
