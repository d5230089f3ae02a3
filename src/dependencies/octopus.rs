use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

use crate::{
    config::ServerConfig,
    models::{
        Channel, CreateReleaseCommand, CreateReleaseResponse, DeploymentProcessTemplate,
        DeploymentSettings, Feed, GitReference, PackageVersion, PackageVersionQuery, Project,
        Resources,
    },
};

const API_KEY_HEADER: &str = "X-Octopus-ApiKey";
const TAKE_ALL: &str = "2147483647";

/// Find a project by id or name.
#[async_trait]
pub trait ProjectFinder {
    async fn find_project(&self, id_or_name: String) -> Result<Project>;
}

#[async_trait]
pub trait ProjectLister {
    async fn list_projects(&self) -> Result<Vec<Project>>;
}

/// Branches and tags of a version-controlled project.
#[async_trait]
pub trait GitReferenceLister {
    async fn list_git_branches(&self, project_id: String) -> Result<Vec<GitReference>>;

    async fn list_git_tags(&self, project_id: String) -> Result<Vec<GitReference>>;
}

/// Load the deployment settings of a project, from `git_ref` for version-controlled projects.
#[async_trait]
pub trait DeploymentSettingsFetcher {
    async fn get_deployment_settings(
        &self,
        project_id: String,
        git_ref: Option<String>,
    ) -> Result<DeploymentSettings>;
}

#[async_trait]
pub trait ChannelLister {
    async fn list_channels(&self, project_id: String) -> Result<Vec<Channel>>;
}

/// Load the release template of a project's deployment process.
///
/// `git_ref` selects the branch or tag for version-controlled projects.
#[async_trait]
pub trait ProcessTemplateFetcher {
    async fn get_process_template(
        &self,
        project_id: String,
        channel_id: String,
        git_ref: Option<String>,
    ) -> Result<DeploymentProcessTemplate>;
}

#[async_trait]
pub trait FeedLookup {
    async fn get_feeds(&self, feed_ids: Vec<String>) -> Result<Vec<Feed>>;

    async fn search_package_versions(
        &self,
        feed: Feed,
        query: PackageVersionQuery,
    ) -> Result<Vec<PackageVersion>>;
}

#[async_trait]
pub trait ReleaseCreator {
    async fn create_release(&self, command: CreateReleaseCommand) -> Result<CreateReleaseResponse>;
}

#[derive(Debug, Error)]
pub enum OctopusApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

/// REST client for the deployment server.
pub struct OctopusClient {
    client: Client,
    server: Url,
    api_key: String,
    space: String,
}

impl OctopusClient {
    pub fn new(config: &ServerConfig) -> Result<Self, OctopusApiError> {
        let client = Client::builder()
            .user_agent(concat!("octopus-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            server: config.url.clone(),
            api_key: config.api_key.clone(),
            space: config.space.clone(),
        })
    }

    /// Build `{server}/api/{space}/{segments...}`, escaping every segment.
    fn space_url(&self, segments: &[&str]) -> Result<Url, OctopusApiError> {
        let mut url = self.server.clone();
        url.path_segments_mut()
            .map_err(|_| OctopusApiError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .push("api")
            .push(&self.space)
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(API_KEY_HEADER, &self.api_key)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, OctopusApiError> {
        let response = self.authorized(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OctopusApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, OctopusApiError> {
        let url = self.space_url(segments)?;
        trace!(%url, ?query, "GET");
        self.send(self.client.get(url).query(query)).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, OctopusApiError> {
        let url = self.space_url(segments)?;
        trace!(%url, "POST");
        self.send(self.client.post(url).json(body)).await
    }
}

#[async_trait]
impl ProjectFinder for OctopusClient {
    async fn find_project(&self, id_or_name: String) -> Result<Project> {
        debug!(id_or_name, "finding project");

        // ids and slugs can be fetched directly
        match self.get::<Project>(&["projects", &id_or_name], &[]).await {
            Ok(project) => return Ok(project),
            Err(OctopusApiError::Status { status: 404, .. }) => {}
            Err(e) => return Err(e).context("getting project"),
        }

        let candidates: Resources<Project> = self
            .get(
                &["projects"],
                &[("partialName", id_or_name.clone()), ("take", TAKE_ALL.to_string())],
            )
            .await
            .context("searching projects")?;

        candidates
            .items
            .into_iter()
            .find(|project| {
                project.name.eq_ignore_ascii_case(&id_or_name) || project.slug == id_or_name
            })
            .ok_or_else(|| anyhow!("cannot find project \"{id_or_name}\""))
    }
}

#[async_trait]
impl ProjectLister for OctopusClient {
    async fn list_projects(&self) -> Result<Vec<Project>> {
        debug!("listing projects");

        let projects: Resources<Project> = self
            .get(&["projects"], &[("take", TAKE_ALL.to_string())])
            .await
            .context("listing projects")?;

        Ok(projects.items)
    }
}

#[async_trait]
impl GitReferenceLister for OctopusClient {
    async fn list_git_branches(&self, project_id: String) -> Result<Vec<GitReference>> {
        debug!(project_id, "listing git branches");

        let branches: Resources<GitReference> = self
            .get(
                &["projects", &project_id, "git", "branches"],
                &[("take", TAKE_ALL.to_string())],
            )
            .await
            .context("listing git branches")?;

        Ok(branches.items)
    }

    async fn list_git_tags(&self, project_id: String) -> Result<Vec<GitReference>> {
        debug!(project_id, "listing git tags");

        let tags: Resources<GitReference> = self
            .get(
                &["projects", &project_id, "git", "tags"],
                &[("take", TAKE_ALL.to_string())],
            )
            .await
            .context("listing git tags")?;

        Ok(tags.items)
    }
}

#[async_trait]
impl DeploymentSettingsFetcher for OctopusClient {
    async fn get_deployment_settings(
        &self,
        project_id: String,
        git_ref: Option<String>,
    ) -> Result<DeploymentSettings> {
        debug!(project_id, ?git_ref, "getting deployment settings");

        let settings = match git_ref {
            Some(git_ref) => {
                self.get(&["projects", &project_id, &git_ref, "deploymentsettings"], &[])
                    .await
            }
            None => {
                self.get(&["projects", &project_id, "deploymentsettings"], &[])
                    .await
            }
        };

        settings.context("getting deployment settings")
    }
}

#[async_trait]
impl ChannelLister for OctopusClient {
    async fn list_channels(&self, project_id: String) -> Result<Vec<Channel>> {
        debug!(project_id, "listing channels");

        let channels: Resources<Channel> = self
            .get(
                &["projects", &project_id, "channels"],
                &[("take", TAKE_ALL.to_string())],
            )
            .await
            .context("listing channels")?;

        Ok(channels.items)
    }
}

#[async_trait]
impl ProcessTemplateFetcher for OctopusClient {
    async fn get_process_template(
        &self,
        project_id: String,
        channel_id: String,
        git_ref: Option<String>,
    ) -> Result<DeploymentProcessTemplate> {
        debug!(project_id, channel_id, ?git_ref, "getting deployment process template");

        let query = [("channel", channel_id)];
        let template = match git_ref {
            Some(git_ref) => {
                self.get(
                    &["projects", &project_id, &git_ref, "deploymentprocesses", "template"],
                    &query,
                )
                .await
            }
            None => {
                let process_id = format!("deploymentprocess-{project_id}");
                self.get(&["deploymentprocesses", &process_id, "template"], &query)
                    .await
            }
        };

        template.context("getting deployment process template")
    }
}

#[async_trait]
impl FeedLookup for OctopusClient {
    async fn get_feeds(&self, feed_ids: Vec<String>) -> Result<Vec<Feed>> {
        debug!(?feed_ids, "getting feeds");

        let feeds: Resources<Feed> = self
            .get(
                &["feeds"],
                &[("ids", feed_ids.join(",")), ("take", feed_ids.len().to_string())],
            )
            .await
            .context("getting feeds")?;

        Ok(feeds.items)
    }

    async fn search_package_versions(
        &self,
        feed: Feed,
        query: PackageVersionQuery,
    ) -> Result<Vec<PackageVersion>> {
        debug!(feed_id = feed.id, feed_name = feed.name, ?query, "searching package versions");

        let versions: Resources<PackageVersion> = self
            .get(
                &["feeds", &feed.id, "packages", "versions"],
                &query.to_query_pairs(),
            )
            .await
            .with_context(|| format!("searching versions of {} in {}", query.package_id, feed.id))?;

        Ok(versions.items)
    }
}

#[async_trait]
impl ReleaseCreator for OctopusClient {
    async fn create_release(&self, command: CreateReleaseCommand) -> Result<CreateReleaseResponse> {
        debug!(project = command.project_name, "creating release");

        self.post(&["releases", "create", "v1"], &command)
            .await
            .context("creating release")
    }
}
