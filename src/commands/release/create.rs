use std::{fmt::Display, fs, io::Write};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use console::style;
use serde::Serialize;
use tracing::debug;

use crate::{
    args,
    commands::{CommandWithOutput, validators},
    config::{DEFAULT_SPACE, ServerConfig},
    dependencies::{
        ChannelLister, DeploymentSettingsFetcher, FeedLookup, GitReferenceLister, OctopusClient,
        ProcessTemplateFetcher, ProjectFinder, ProjectLister, ReleaseCreator,
    },
    interaction::{
        InputPrompt, InputPromptOptions, InputPromptResult, InputPromptValidator, Interaction,
        SelectPrompt, SelectPromptOptions, SelectPromptResult, SpinnerInteraction,
    },
    models::{
        ActionPackage, Channel, ChannelRule, CreateReleaseCommand, PackageVersionQuery, Project,
        ReleaseTemplatePackage,
    },
    overrides::{
        BaselineEntry, GitResourceOverrides, OverrideSession, PackageOverrides, ResolvedOverride,
        build_git_resource_baseline, build_package_baseline, expand_secondary_wildcards,
        run_override_loop,
    },
};

// Server dependencies for the create release command
pub trait CreateReleaseServer:
    ProjectFinder
    + ProjectLister
    + ChannelLister
    + GitReferenceLister
    + DeploymentSettingsFetcher
    + ProcessTemplateFetcher
    + FeedLookup
    + ReleaseCreator
{
}
impl<T> CreateReleaseServer for T where
    T: ProjectFinder
        + ProjectLister
        + ChannelLister
        + GitReferenceLister
        + DeploymentSettingsFetcher
        + ProcessTemplateFetcher
        + FeedLookup
        + ReleaseCreator
{
}

// Interaction dependencies for the create release command
pub trait CreateReleaseInteraction: SpinnerInteraction + SelectPrompt + InputPrompt {}
impl<T: SpinnerInteraction + SelectPrompt + InputPrompt> CreateReleaseInteraction for T {}

pub struct CreateRelease {
    project: Option<String>,
    channel: Option<String>,
    version: Option<String>,
    package_version: Option<String>,
    packages: Vec<String>,
    git_resources: Vec<String>,
    git_ref: Option<String>,
    git_commit: Option<String>,
    release_notes: Option<String>,
    ignore_existing: bool,
    ignore_channel_rules: bool,

    space: String,
    no_prompt: bool,

    interaction: Box<dyn CreateReleaseInteraction + Send>,
    server: Box<dyn CreateReleaseServer + Send + Sync>,
    // Tables and progress lines go here; stdout is reserved for the result
    out: Box<dyn Write + Send>,
}

impl TryFrom<(args::Create, &args::GlobalArgs)> for CreateRelease {
    type Error = anyhow::Error;

    fn try_from((args, global): (args::Create, &args::GlobalArgs)) -> Result<Self> {
        let config = ServerConfig::try_from(global)?;
        let client = OctopusClient::new(&config).context("creating HTTP client")?;
        let release_notes = read_release_notes(&args)?;

        Ok(Self::new(
            args::Create {
                release_notes,
                ..args
            },
            config.space,
            global.no_prompt,
            Box::new(Interaction::new()),
            Box::new(client),
            Box::new(std::io::stderr()),
        ))
    }
}

/// Release notes given inline, or read from `--release-notes-file`.
fn read_release_notes(args: &args::Create) -> Result<Option<String>> {
    match &args.release_notes_file {
        Some(path) => fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("reading release notes from {}", path.display())),
        None => Ok(args.release_notes.clone()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateReleaseResult {
    pub release_id: String,
    pub release_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    pub packages: Vec<String>,
    pub git_resources: Vec<String>,
}

impl Display for CreateReleaseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.channel {
            Some(channel) => write!(
                f,
                "Successfully created release version {} using channel {channel}",
                self.release_version
            ),
            None => write!(
                f,
                "Successfully created release version {}",
                self.release_version
            ),
        }
    }
}

#[async_trait]
impl CommandWithOutput for CreateRelease {
    type Output = CreateReleaseResult;

    async fn execute(&mut self) -> Result<Self::Output> {
        // Without prompting the server resolves everything from the flags as given
        let command = if self.no_prompt {
            self.command_from_flags()?
        } else {
            let command = self.prompt_release().await?;
            writeln!(self.out, "\nAutomation Command: {}", automation_command(&command))?;
            command
        };

        debug!(?command, "submitting release");
        let response = self
            .server
            .create_release(command.clone())
            .await
            .context("creating release")?;

        Ok(CreateReleaseResult {
            release_id: response.release_id,
            release_version: response.release_version,
            channel: Some(command.channel_name).filter(|name| !name.is_empty()),
            packages: command.packages,
            git_resources: command.git_resources,
        })
    }
}

impl CreateRelease {
    fn new(
        args: args::Create,
        space: String,
        no_prompt: bool,
        interaction: Box<dyn CreateReleaseInteraction + Send>,
        server: Box<dyn CreateReleaseServer + Send + Sync>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            project: args.project,
            channel: args.channel,
            version: args.version,
            package_version: args.package_version,
            packages: args.packages,
            git_resources: args.git_resources,
            git_ref: args.git_ref,
            git_commit: args.git_commit,
            release_notes: args.release_notes,
            ignore_existing: args.ignore_existing,
            ignore_channel_rules: args.ignore_channel_rules,
            space,
            no_prompt,
            interaction,
            server,
            out,
        }
    }

    fn command_from_flags(&self) -> Result<CreateReleaseCommand> {
        let project_name = self
            .project
            .clone()
            .context("a project must be specified with --project when prompting is disabled")?;

        Ok(CreateReleaseCommand {
            space_id_or_name: self.space.clone(),
            project_name,
            channel_name: self.channel.clone().unwrap_or_default(),
            release_version: self.version.clone().unwrap_or_default(),
            package_version: self.package_version.clone().unwrap_or_default(),
            packages: self.packages.clone(),
            git_resources: self.git_resources.clone(),
            git_ref: self.git_ref.clone().unwrap_or_default(),
            git_commit: self.git_commit.clone().unwrap_or_default(),
            release_notes: self.release_notes.clone().unwrap_or_default(),
            ignore_if_already_exists: self.ignore_existing,
            ignore_channel_rules: self.ignore_channel_rules,
        })
    }

    async fn prompt_release(&mut self) -> Result<CreateReleaseCommand> {
        let project = self.select_project().await?;
        let channel = self.select_channel(&project).await?;

        // Version controlled projects load their deployment process from git
        let git_ref = if project.is_version_controlled {
            let git_ref = match self.git_ref.clone() {
                Some(git_ref) => {
                    writeln!(self.out, "Git reference {}", style(&git_ref).cyan())?;
                    git_ref
                }
                None => self.select_git_reference(&project).await?,
            };
            if let Some(git_commit) = &self.git_commit {
                writeln!(self.out, "Git commit {}", style(git_commit).cyan())?;
            }
            Some(git_ref)
        } else {
            None
        };

        // A commit pins the process more precisely than the branch it is on
        let process_ref = git_ref
            .as_ref()
            .map(|git_ref| self.git_commit.clone().unwrap_or_else(|| git_ref.clone()));

        let template = self
            .server
            .get_process_template(project.id.clone(), channel.id.clone(), process_ref.clone())
            .await
            .context("loading deployment process template")?;

        let package_baseline = {
            let _spinner = self
                .interaction
                .start_spinner("Resolving package versions...".to_string())?;

            build_package_baseline(self.server.as_ref(), &template.packages, |package, query| {
                apply_channel_rules(&channel.rules, package, query)
            })
            .await?
        };

        // Once the loop has run, --package-version lives on as the `*:<version>` override (or
        // was reset away), so it must not be sent again on its own
        let (packages, package_version, effective_packages) = if package_baseline.is_empty() {
            (
                self.packages.clone(),
                self.package_version.clone().unwrap_or_default(),
                Vec::new(),
            )
        } else {
            let mut session = OverrideSession::new(PackageOverrides, package_baseline);
            if let Some(package_version) = &self.package_version {
                session.seed_default_value(package_version);
            }
            session.seed(self.packages.as_slice());

            let outcome = run_override_loop(session, self.interaction.as_ref(), self.out.as_mut())?;
            (format_overrides(&outcome.overrides), String::new(), outcome.effective)
        };

        let git_baseline = build_git_resource_baseline(&template.git_resources);
        let git_resources = if git_baseline.is_empty() {
            self.git_resources.clone()
        } else {
            let mut session = OverrideSession::new(GitResourceOverrides, git_baseline.clone());
            session.seed(self.git_resources.as_slice());

            let outcome = run_override_loop(session, self.interaction.as_ref(), self.out.as_mut())?;
            // the server only accepts overrides naming a single git resource
            format_overrides(&expand_secondary_wildcards(&git_baseline, &outcome.overrides))
        };

        let release_version = match self.donor_package(&project, process_ref).await? {
            Some(donor) => self.prompt_donor_version(&donor, &effective_packages)?,
            None => self.prompt_version(&template.next_version_increment)?,
        };

        Ok(CreateReleaseCommand {
            space_id_or_name: self.space.clone(),
            project_name: project.name,
            channel_name: channel.name,
            release_version,
            package_version,
            packages,
            git_resources,
            git_ref: git_ref.unwrap_or_default(),
            git_commit: self.git_commit.clone().unwrap_or_default(),
            release_notes: self.release_notes.clone().unwrap_or_default(),
            ignore_if_already_exists: self.ignore_existing,
            ignore_channel_rules: self.ignore_channel_rules,
        })
    }

    async fn select_project(&mut self) -> Result<Project> {
        if let Some(id_or_name) = self.project.clone() {
            let project = self
                .server
                .find_project(id_or_name.trim().to_string())
                .await
                .context("finding project")?;
            writeln!(self.out, "Project {}", style(&project.name).cyan())?;
            return Ok(project);
        }

        let projects = self
            .server
            .list_projects()
            .await
            .context("listing projects")?;
        if projects.is_empty() {
            bail!("there are no projects to create a release in");
        }

        let select_options = SelectPromptOptions::builder()
            .message("Select the project in which the release will be created")
            .options(projects.iter().map(|project| project.name.clone()))
            .build();

        match self
            .interaction
            .select(select_options)
            .context("prompting for project")?
        {
            SelectPromptResult::Selected(name) => projects
                .into_iter()
                .find(|project| project.name == name)
                .ok_or_else(|| anyhow!("selected project \"{name}\" is not in the project list")),
            SelectPromptResult::Canceled => bail!("release creation canceled"),
        }
    }

    async fn select_channel(&mut self, project: &Project) -> Result<Channel> {
        let mut channels = self
            .server
            .list_channels(project.id.clone())
            .await
            .context("listing channels")?;

        if let Some(name) = &self.channel {
            let channel = channels
                .into_iter()
                .find(|channel| channel.name.eq_ignore_ascii_case(name) || channel.id == *name)
                .ok_or_else(|| {
                    anyhow!("cannot find channel \"{name}\" in project {}", project.name)
                })?;
            writeln!(self.out, "Channel {}", style(&channel.name).cyan())?;
            return Ok(channel);
        }

        if channels.len() <= 1 {
            let channel = channels
                .pop()
                .ok_or_else(|| anyhow!("project {} has no channels", project.name))?;
            writeln!(self.out, "Channel {}", style(&channel.name).cyan())?;
            return Ok(channel);
        }

        let select_options = SelectPromptOptions::builder()
            .message("Select the channel in which the release will be created")
            .options(channels.iter().map(|channel| channel.name.clone()))
            .build();

        match self
            .interaction
            .select(select_options)
            .context("prompting for channel")?
        {
            SelectPromptResult::Selected(name) => channels
                .into_iter()
                .find(|channel| channel.name == name)
                .ok_or_else(|| anyhow!("selected channel \"{name}\" is not in the channel list")),
            SelectPromptResult::Canceled => bail!("release creation canceled"),
        }
    }

    /// Pick the branch or tag to load a version-controlled process from.
    ///
    /// Branches come before tags, with the project's default branch first.
    async fn select_git_reference(&mut self, project: &Project) -> Result<String> {
        let branches = self
            .server
            .list_git_branches(project.id.clone())
            .await
            .context("listing git branches")?;
        let tags = self
            .server
            .list_git_tags(project.id.clone())
            .await
            .context("listing git tags")?;

        // (label, canonical name)
        let mut choices: Vec<(String, String)> = branches
            .into_iter()
            .map(|branch| (format!("{} (Branch)", branch.name), branch.canonical_name))
            .chain(
                tags.into_iter()
                    .map(|tag| (format!("{} (Tag)", tag.name), tag.canonical_name)),
            )
            .collect();

        if let Some(default_branch) = project.default_branch() {
            let qualified = format!("refs/heads/{default_branch}");
            if let Some(index) = choices
                .iter()
                .position(|(_, name)| name == default_branch || *name == qualified)
            {
                let default = choices.remove(index);
                choices.insert(0, default);
            }
        }

        if choices.is_empty() {
            bail!("project {} has no branches or tags", project.name);
        }

        let select_options = SelectPromptOptions::builder()
            .message("Select the Git Reference to use")
            .options(choices.iter().map(|(label, _)| label.clone()))
            .build();

        match self
            .interaction
            .select(select_options)
            .context("prompting for git reference")?
        {
            SelectPromptResult::Selected(label) => choices
                .into_iter()
                .find(|(choice, _)| *choice == label)
                .map(|(_, canonical_name)| canonical_name)
                .ok_or_else(|| anyhow!("selected git reference \"{label}\" is not in the list")),
            SelectPromptResult::Canceled => bail!("release creation canceled"),
        }
    }

    /// The package whose version becomes the release version, when the project versions
    /// releases that way and no version was given.
    async fn donor_package(
        &mut self,
        project: &Project,
        process_ref: Option<String>,
    ) -> Result<Option<ActionPackage>> {
        if self.version.is_some() {
            return Ok(None);
        }

        // Version-controlled projects keep their versioning strategy in the repository
        let strategy = match &project.versioning_strategy {
            Some(strategy) => Some(strategy.clone()),
            None if project.is_version_controlled => {
                self.server
                    .get_deployment_settings(project.id.clone(), process_ref)
                    .await
                    .context("getting deployment settings")?
                    .versioning_strategy
            }
            None => None,
        };

        Ok(strategy.and_then(|strategy| strategy.donor_package))
    }

    fn prompt_donor_version(
        &self,
        donor: &ActionPackage,
        packages: &[BaselineEntry],
    ) -> Result<String> {
        let package = packages
            .iter()
            .find(|entry| {
                entry.action_name == donor.deployment_action
                    && entry.secondary == donor.package_reference
            })
            .ok_or_else(|| {
                anyhow!(
                    "cannot find the package that versions releases (step \"{}\") in the deployment process",
                    donor.deployment_action
                )
            })?;
        let package_id = package.resource_id.as_deref().unwrap_or(&package.secondary);

        let options = InputPromptOptions::builder()
            .message(format!(
                "Release version {} (from included package {package_id}). Add metadata? (optional):",
                package.value
            ))
            .build();

        let InputPromptResult::Input(metadata) = self
            .interaction
            .input(options)
            .context("prompting for release version metadata")?
        else {
            bail!("release creation canceled");
        };

        Ok(match metadata.trim() {
            "" => package.value.clone(),
            metadata => format!("{}+{metadata}", package.value),
        })
    }

    fn prompt_version(&self, next_version: &str) -> Result<String> {
        let default = Some(next_version.trim())
            .filter(|version| !version.is_empty())
            .map(ToString::to_string);

        let options = InputPromptOptions::builder()
            .message("Release Version")
            .default_opt(default.clone())
            .validator(InputPromptValidator::new(validators::ReleaseVersionValidator))
            .final_answer(self.version.clone())
            .build();

        let InputPromptResult::Input(version) = self
            .interaction
            .input(options)
            .context("prompting for release version")?
        else {
            bail!("release creation canceled");
        };

        match version.trim() {
            "" => default.context("no release version given and the server proposed none"),
            version => Ok(version.to_string()),
        }
    }
}

/// Narrow a package's version query with the first channel rule that covers its step and
/// package reference.
fn apply_channel_rules(
    rules: &[ChannelRule],
    package: &ReleaseTemplatePackage,
    query: PackageVersionQuery,
) -> PackageVersionQuery {
    let rule = rules.iter().find(|rule| {
        rule.action_packages.iter().any(|action_package| {
            action_package.deployment_action == package.action_name
                && action_package.package_reference == package.package_reference_name
        })
    });

    match rule {
        Some(rule) => PackageVersionQuery {
            version_range: Some(rule.version_range.clone()).filter(|range| !range.is_empty()),
            pre_release_tag: Some(rule.tag.clone()).filter(|tag| !tag.is_empty()),
            ..query
        },
        None => query,
    }
}

fn format_overrides(overrides: &[ResolvedOverride]) -> Vec<String> {
    overrides.iter().map(ToString::to_string).collect()
}

/// The `--no-prompt` command line that creates the same release.
fn automation_command(command: &CreateReleaseCommand) -> String {
    let quote = |value: &str| format!("'{}'", value.replace('\'', r"'\''"));

    let mut flags = vec![("project", command.project_name.as_str())];
    if command.space_id_or_name != DEFAULT_SPACE {
        flags.push(("space", command.space_id_or_name.as_str()));
    }
    flags.extend([
        ("git-commit", command.git_commit.as_str()),
        ("git-ref", command.git_ref.as_str()),
        ("channel", command.channel_name.as_str()),
        ("release-notes", command.release_notes.as_str()),
        ("package-version", command.package_version.as_str()),
    ]);
    flags.extend(command.packages.iter().map(|package| ("package", package.as_str())));
    flags.extend(
        command
            .git_resources
            .iter()
            .map(|git_resource| ("git-resource", git_resource.as_str())),
    );
    flags.push(("version", command.release_version.as_str()));

    let mut automation = format!("{} release create --no-prompt", env!("CARGO_CRATE_NAME"));
    for (name, value) in flags.into_iter().filter(|(_, value)| !value.is_empty()) {
        automation.push_str(&format!(" --{name} {}", quote(value)));
    }
    if command.ignore_if_already_exists {
        automation.push_str(" --ignore-existing");
    }
    if command.ignore_channel_rules {
        automation.push_str(" --ignore-channel-rules");
    }

    automation
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use mockall::predicate::eq;

    use super::*;
    use crate::{
        dependencies::mocks::MockOctopus,
        interaction::{
            SpinnerHandle,
            mocks::{MockInteraction, script_input},
        },
        models::{
            CreateReleaseResponse, DeploymentProcessTemplate, DeploymentSettings, Feed,
            GitReference, PackageVersion, PersistenceSettings, ReleaseTemplateGitResource,
            VersioningStrategy,
        },
    };

    // ============================================================================
    // Test Helpers
    // ============================================================================

    fn project(is_version_controlled: bool) -> Project {
        Project {
            id: "Projects-1".to_string(),
            name: "Deploy Site".to_string(),
            slug: "deploy-site".to_string(),
            is_version_controlled,
            persistence_settings: is_version_controlled.then(|| PersistenceSettings {
                default_branch: Some("refs/heads/main".to_string()),
            }),
            versioning_strategy: None,
        }
    }

    fn donor_project(deployment_action: &str) -> Project {
        Project {
            versioning_strategy: Some(VersioningStrategy {
                donor_package: Some(ActionPackage {
                    deployment_action: deployment_action.to_string(),
                    package_reference: "pterm".to_string(),
                }),
            }),
            ..project(false)
        }
    }

    fn git_reference(name: &str, canonical_name: &str) -> GitReference {
        GitReference {
            name: name.to_string(),
            canonical_name: canonical_name.to_string(),
        }
    }

    /// Collects what the command writes to the terminal.
    #[derive(Clone, Default)]
    struct SharedOutput(Arc<Mutex<Vec<u8>>>);

    impl SharedOutput {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedOutput {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn channel(id: &str, name: &str, rules: Vec<ChannelRule>) -> Channel {
        Channel {
            id: id.to_string(),
            name: name.to_string(),
            rules,
        }
    }

    fn template_package(action_name: &str, package_id: &str) -> ReleaseTemplatePackage {
        ReleaseTemplatePackage {
            action_name: action_name.to_string(),
            package_id: package_id.to_string(),
            package_reference_name: package_id.to_string(),
            feed_id: "Feeds-1".to_string(),
            is_resolvable: true,
            fixed_version: None,
        }
    }

    fn template() -> DeploymentProcessTemplate {
        DeploymentProcessTemplate {
            next_version_increment: "0.0.2".to_string(),
            packages: vec![template_package("Install", "pterm")],
            git_resources: vec![ReleaseTemplateGitResource {
                action_name: "Run Script".to_string(),
                name: String::new(),
                default_branch: "refs/heads/main".to_string(),
                repository_uri: "https://example.com/scripts.git".to_string(),
            }],
        }
    }

    fn feed() -> Feed {
        Feed {
            id: "Feeds-1".to_string(),
            name: "Octopus Server (built-in)".to_string(),
        }
    }

    fn create_command(
        args: args::Create,
        no_prompt: bool,
        interaction: MockInteraction,
        server: MockOctopus,
    ) -> CreateRelease {
        CreateRelease::new(
            args,
            "Spaces-1".to_string(),
            no_prompt,
            Box::new(interaction),
            Box::new(server),
            Box::new(std::io::sink()),
        )
    }

    fn create_command_with_output(
        args: args::Create,
        interaction: MockInteraction,
        server: MockOctopus,
    ) -> (CreateRelease, SharedOutput) {
        let output = SharedOutput::default();
        let command = CreateRelease::new(
            args,
            "Spaces-1".to_string(),
            false,
            Box::new(interaction),
            Box::new(server),
            Box::new(output.clone()),
        );
        (command, output)
    }

    fn expect_spinner(interaction: &mut MockInteraction) {
        interaction
            .expect_start_spinner()
            .returning(|_| Ok(SpinnerHandle::new(Box::new(|| {}))));
    }

    /// Server with one project, the given channels, the default template and pterm 1.0.0 in the feed.
    fn server_with_channels(channels: Vec<Channel>) -> MockOctopus {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .with(eq("Deploy Site".to_string()))
            .returning(|_| Ok(project(false)));
        server
            .expect_list_channels()
            .with(eq("Projects-1".to_string()))
            .returning(move |_| Ok(channels.clone()));
        server
            .expect_get_feeds()
            .returning(|_| Ok(vec![feed()]));
        server.expect_search_package_versions().returning(|_, _| {
            Ok(vec![PackageVersion {
                version: "1.0.0".to_string(),
                package_id: "pterm".to_string(),
            }])
        });
        server
    }

    fn created(release_version: &str) -> CreateReleaseResponse {
        CreateReleaseResponse {
            release_id: "Releases-1".to_string(),
            release_version: release_version.to_string(),
        }
    }

    fn deploy_site_args() -> args::Create {
        args::Create {
            project: Some("Deploy Site".to_string()),
            ..Default::default()
        }
    }

    // ============================================================================
    // Non-interactive
    // ============================================================================

    #[tokio::test]
    async fn test_no_prompt_forwards_flags_unmodified() {
        let mut server = MockOctopus::new();
        server
            .expect_create_release()
            .with(eq(CreateReleaseCommand {
                space_id_or_name: "Spaces-1".to_string(),
                project_name: "Deploy Site".to_string(),
                channel_name: "Beta".to_string(),
                release_version: "1.2.3".to_string(),
                package_version: "2.0.0".to_string(),
                packages: vec!["garbage".to_string(), "pterm:1.0".to_string()],
                git_resources: vec!["Run Script:develop".to_string()],
                ignore_if_already_exists: true,
                ..Default::default()
            }))
            .times(1)
            .returning(|_| Ok(created("1.2.3")));

        let args = args::Create {
            project: Some("Deploy Site".to_string()),
            channel: Some("Beta".to_string()),
            version: Some("1.2.3".to_string()),
            package_version: Some("2.0.0".to_string()),
            packages: vec!["garbage".to_string(), "pterm:1.0".to_string()],
            git_resources: vec!["Run Script:develop".to_string()],
            ignore_existing: true,
            ..Default::default()
        };

        let mut command = create_command(args, true, MockInteraction::new(), server);
        let result = command.execute().await.unwrap();

        assert_eq!(
            result,
            CreateReleaseResult {
                release_id: "Releases-1".to_string(),
                release_version: "1.2.3".to_string(),
                channel: Some("Beta".to_string()),
                packages: vec!["garbage".to_string(), "pterm:1.0".to_string()],
                git_resources: vec!["Run Script:develop".to_string()],
            }
        );
    }

    #[tokio::test]
    async fn test_no_prompt_requires_project() {
        let mut command = create_command(
            args::Create::default(),
            true,
            MockInteraction::new(),
            MockOctopus::new(),
        );

        let err = command.execute().await.unwrap_err();

        assert!(err.to_string().contains("--project"));
    }

    // ============================================================================
    // Interactive
    // ============================================================================

    #[tokio::test]
    async fn test_interactive_flow_with_defaults() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .with(eq("Projects-1".to_string()), eq("Channels-1".to_string()), eq(None::<String>))
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| {
                command.project_name == "Deploy Site"
                    && command.channel_name == "Default"
                    && command.release_version == "0.0.2"
                    && command.packages.is_empty()
                    && command.git_resources.is_empty()
            })
            .times(1)
            .returning(|_| Ok(created("0.0.2")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        // accept packages, accept git resources, take the proposed release version
        let script = script_input(&mut interaction, &["y", "y", ""]);

        let (mut command, output) = create_command_with_output(deploy_site_args(), interaction, server);
        let result = command.execute().await.unwrap();

        assert_eq!(result.release_version, "0.0.2");
        assert_eq!(result.channel.as_deref(), Some("Default"));
        assert!(output.text().ends_with(
            "\nAutomation Command: octopus release create --no-prompt --project 'Deploy Site' \
             --channel 'Default' --version '0.0.2'\n"
        ));
        assert_eq!(
            result.to_string(),
            "Successfully created release version 0.0.2 using channel Default"
        );

        let script = script.lock().unwrap();
        assert_eq!(script.remaining(), 0);
        assert_eq!(
            script.questions,
            vec![
                crate::overrides::PACKAGE_OVERRIDE_QUESTION,
                crate::overrides::GIT_RESOURCE_OVERRIDE_QUESTION,
                "Release Version",
            ]
        );
    }

    #[tokio::test]
    async fn test_interactive_flow_with_overrides() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| {
                command.package_version.is_empty()
                    && command.packages == ["*:1.5.0", "pterm:2.0.0", "Install:2.1.0"]
                    && command.git_resources == ["Run Script:refs/heads/develop"]
                    && command.release_version == "3.0.0"
            })
            .times(1)
            .returning(|_| Ok(created("3.0.0")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        let script = script_input(
            &mut interaction,
            &[
                // package loop
                "Install:2.1.0",
                "y",
                // git resource loop
                "Run Script:refs/heads/develop",
                "y",
                // release version, the first one is rejected by the validator
                "next",
                "3.0.0",
            ],
        );

        let args = args::Create {
            package_version: Some("1.5.0".to_string()),
            packages: vec!["pterm:2.0.0".to_string(), "unknown-package:1.0".to_string()],
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        let result = command.execute().await.unwrap();

        assert_eq!(result.packages, vec!["*:1.5.0", "pterm:2.0.0", "Install:2.1.0"]);
        assert_eq!(result.git_resources, vec!["Run Script:refs/heads/develop"]);

        let script = script.lock().unwrap();
        assert_eq!(script.remaining(), 0);
        assert_eq!(
            script.rejected,
            vec![(
                "next".to_string(),
                "\"next\" is not a valid release version".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_version_flag_skips_version_prompt() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .returning(|_, _, _| {
                Ok(DeploymentProcessTemplate {
                    git_resources: vec![],
                    ..template()
                })
            });
        server
            .expect_create_release()
            .withf(|command| command.release_version == "9.9.9")
            .times(1)
            .returning(|_| Ok(created("9.9.9")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        let script = script_input(&mut interaction, &["y"]);

        let args = args::Create {
            version: Some("9.9.9".to_string()),
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        command.execute().await.unwrap();

        let script = script.lock().unwrap();
        assert_eq!(script.questions, vec![crate::overrides::PACKAGE_OVERRIDE_QUESTION]);
    }

    #[tokio::test]
    async fn test_channel_rules_narrow_package_query() {
        let rule = ChannelRule {
            action_packages: vec![ActionPackage {
                deployment_action: "Install".to_string(),
                package_reference: "pterm".to_string(),
            }],
            version_range: "[1.0,2.0)".to_string(),
            tag: "^$".to_string(),
        };

        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(project(false)));
        server.expect_list_channels().returning(move |_| {
            Ok(vec![
                channel("Channels-1", "Default", vec![]),
                channel("Channels-2", "Stable", vec![rule.clone()]),
            ])
        });
        server
            .expect_get_process_template()
            .with(eq("Projects-1".to_string()), eq("Channels-2".to_string()), eq(None::<String>))
            .returning(|_, _, _| Ok(template()));
        server
            .expect_get_feeds()
            .returning(|_| Ok(vec![feed()]));
        server
            .expect_search_package_versions()
            .with(
                eq(feed()),
                eq(PackageVersionQuery {
                    version_range: Some("[1.0,2.0)".to_string()),
                    pre_release_tag: Some("^$".to_string()),
                    ..PackageVersionQuery::latest("pterm")
                }),
            )
            .times(1)
            .returning(|_, _| Ok(vec![]));
        server
            .expect_create_release()
            .withf(|command| command.channel_name == "Stable")
            .returning(|_| Ok(created("0.0.2")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        interaction
            .expect_select()
            .withf(|options| {
                options.message == "Select the channel in which the release will be created"
                    && options.options == ["Default", "Stable"]
            })
            .return_once(|_| Ok(SelectPromptResult::Selected("Stable".to_string())));
        // no version in range, so it is asked for before the package question
        let script = script_input(&mut interaction, &["1.9.0", "y", "y", ""]);

        let mut command = create_command(deploy_site_args(), false, interaction, server);
        let result = command.execute().await.unwrap();

        assert_eq!(result.packages, vec!["Install:pterm:1.9.0"]);
        assert_eq!(
            script.lock().unwrap().questions[0],
            "Unable to find a version for \"pterm\". Specify a version:"
        );
    }

    #[tokio::test]
    async fn test_version_controlled_project_selects_git_reference() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(project(true)));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_list_git_branches()
            .with(eq("Projects-1".to_string()))
            .returning(|_| {
                Ok(vec![
                    git_reference("develop", "refs/heads/develop"),
                    git_reference("main", "refs/heads/main"),
                ])
            });
        server
            .expect_list_git_tags()
            .with(eq("Projects-1".to_string()))
            .returning(|_| Ok(vec![git_reference("v1.0.0", "refs/tags/v1.0.0")]));
        server
            .expect_get_process_template()
            .with(
                eq("Projects-1".to_string()),
                eq("Channels-1".to_string()),
                eq(Some("abc123".to_string())),
            )
            .returning(|_, _, _| {
                Ok(DeploymentProcessTemplate {
                    next_version_increment: "1.0.1".to_string(),
                    ..Default::default()
                })
            });
        // the versioning strategy of a version-controlled project lives in the repository
        server
            .expect_get_deployment_settings()
            .with(eq("Projects-1".to_string()), eq(Some("abc123".to_string())))
            .times(1)
            .returning(|_, _| Ok(DeploymentSettings::default()));
        server
            .expect_create_release()
            .withf(|command| {
                command.git_ref == "refs/heads/develop"
                    && command.git_commit == "abc123"
                    && command.release_version == "1.0.1"
            })
            .times(1)
            .returning(|_| Ok(created("1.0.1")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        interaction
            .expect_select()
            .withf(|options| {
                options.message == "Select the Git Reference to use"
                    && options.options == ["main (Branch)", "develop (Branch)", "v1.0.0 (Tag)"]
            })
            .times(1)
            .return_once(|_| Ok(SelectPromptResult::Selected("develop (Branch)".to_string())));
        let script = script_input(&mut interaction, &[""]);

        let args = args::Create {
            git_commit: Some("abc123".to_string()),
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        command.execute().await.unwrap();

        // nothing to override, only the version is asked for
        assert_eq!(script.lock().unwrap().questions, vec!["Release Version"]);
    }

    #[tokio::test]
    async fn test_git_ref_flag_skips_reference_selection() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(project(true)));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_get_process_template()
            .with(
                eq("Projects-1".to_string()),
                eq("Channels-1".to_string()),
                eq(Some("refs/heads/release".to_string())),
            )
            .returning(|_, _, _| Ok(DeploymentProcessTemplate::default()));
        server
            .expect_get_deployment_settings()
            .returning(|_, _| Ok(DeploymentSettings::default()));
        server
            .expect_create_release()
            .withf(|command| command.git_ref == "refs/heads/release" && command.git_commit.is_empty())
            .times(1)
            .returning(|_| Ok(created("2.0.0")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        interaction.expect_select().never();
        script_input(&mut interaction, &["2.0.0"]);

        let args = args::Create {
            git_ref: Some("refs/heads/release".to_string()),
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        command.execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_project_is_selected_from_list() {
        let mut server = MockOctopus::new();
        server.expect_list_projects().times(1).returning(|| {
            Ok(vec![
                Project {
                    id: "Projects-2".to_string(),
                    name: "Api".to_string(),
                    ..project(false)
                },
                project(false),
            ])
        });
        server.expect_find_project().never();
        server
            .expect_list_channels()
            .with(eq("Projects-1".to_string()))
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(DeploymentProcessTemplate::default()));
        server
            .expect_create_release()
            .withf(|command| command.project_name == "Deploy Site")
            .times(1)
            .returning(|_| Ok(created("0.0.1")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        interaction
            .expect_select()
            .withf(|options| {
                options.message == "Select the project in which the release will be created"
                    && options.options == ["Api", "Deploy Site"]
            })
            .times(1)
            .return_once(|_| Ok(SelectPromptResult::Selected("Deploy Site".to_string())));
        script_input(&mut interaction, &["0.0.1"]);

        let mut command = create_command(args::Create::default(), false, interaction, server);
        command.execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_reset_discards_package_version_flag() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| command.package_version.is_empty() && command.packages.is_empty())
            .times(1)
            .returning(|_| Ok(created("0.0.2")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        // reset the seeded default version, accept the table, accept git resources, default version
        let script = script_input(&mut interaction, &["r", "y", "y", ""]);

        let args = args::Create {
            package_version: Some("9.9.9".to_string()),
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        let result = command.execute().await.unwrap();

        assert!(result.packages.is_empty());
        assert_eq!(script.lock().unwrap().remaining(), 0);
    }

    #[tokio::test]
    async fn test_undo_keeps_package_version_as_override() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| command.package_version.is_empty() && command.packages == ["*:9.9.9"])
            .times(1)
            .returning(|_| Ok(created("0.0.2")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        script_input(&mut interaction, &["pterm:1.2.3", "u", "y", "y", ""]);

        let args = args::Create {
            package_version: Some("9.9.9".to_string()),
            ..deploy_site_args()
        };

        let mut command = create_command(args, false, interaction, server);
        command.execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_donor_package_sets_release_version() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(donor_project("Install")));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_get_feeds()
            .returning(|_| Ok(vec![feed()]));
        server.expect_search_package_versions().returning(|_, _| {
            Ok(vec![PackageVersion {
                version: "1.0.0".to_string(),
                package_id: "pterm".to_string(),
            }])
        });
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| command.release_version == "2.5.0+build.7")
            .times(1)
            .returning(|_| Ok(created("2.5.0+build.7")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        // the overridden package version is the one that counts
        let script = script_input(&mut interaction, &["pterm:2.5.0", "y", "y", "build.7"]);

        let mut command = create_command(deploy_site_args(), false, interaction, server);
        let result = command.execute().await.unwrap();

        assert_eq!(result.release_version, "2.5.0+build.7");
        assert_eq!(
            script.lock().unwrap().questions.last().map(String::as_str),
            Some("Release version 2.5.0 (from included package pterm). Add metadata? (optional):")
        );
    }

    #[tokio::test]
    async fn test_donor_package_without_metadata() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(donor_project("Install")));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_get_feeds()
            .returning(|_| Ok(vec![feed()]));
        server.expect_search_package_versions().returning(|_, _| {
            Ok(vec![PackageVersion {
                version: "1.0.0".to_string(),
                package_id: "pterm".to_string(),
            }])
        });
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server
            .expect_create_release()
            .withf(|command| command.release_version == "1.0.0")
            .times(1)
            .returning(|_| Ok(created("1.0.0")));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        script_input(&mut interaction, &["y", "y", " "]);

        let mut command = create_command(deploy_site_args(), false, interaction, server);
        command.execute().await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_donor_package_fails() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(donor_project("Deploy")));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));
        server
            .expect_get_feeds()
            .returning(|_| Ok(vec![feed()]));
        server.expect_search_package_versions().returning(|_, _| {
            Ok(vec![PackageVersion {
                version: "1.0.0".to_string(),
                package_id: "pterm".to_string(),
            }])
        });
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));
        server.expect_create_release().never();

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        script_input(&mut interaction, &["y", "y"]);

        let mut command = create_command(deploy_site_args(), false, interaction, server);
        let err = command.execute().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot find the package that versions releases (step \"Deploy\") in the deployment process"
        );
    }

    #[tokio::test]
    async fn test_unknown_channel_flag_fails() {
        let mut server = MockOctopus::new();
        server
            .expect_find_project()
            .returning(|_| Ok(project(false)));
        server
            .expect_list_channels()
            .returning(|_| Ok(vec![channel("Channels-1", "Default", vec![])]));

        let args = args::Create {
            channel: Some("Nightly".to_string()),
            ..deploy_site_args()
        };

        let mut interaction = MockInteraction::new();
        script_input(&mut interaction, &[]);

        let mut command = create_command(args, false, interaction, server);
        let err = command.execute().await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "cannot find channel \"Nightly\" in project Deploy Site"
        );
    }

    #[tokio::test]
    async fn test_canceled_override_loop_fails() {
        let mut server = server_with_channels(vec![channel("Channels-1", "Default", vec![])]);
        server
            .expect_get_process_template()
            .returning(|_, _, _| Ok(template()));

        let mut interaction = MockInteraction::new();
        expect_spinner(&mut interaction);
        interaction.expect_input().returning(|options| {
            Ok(match options.final_answer {
                Some(answer) => InputPromptResult::Input(answer),
                None => InputPromptResult::Canceled,
            })
        });

        let mut command = create_command(deploy_site_args(), false, interaction, server);
        let err = command.execute().await.unwrap_err();

        assert_eq!(err.to_string(), "canceled by user");
    }

    // ============================================================================
    // Helpers
    // ============================================================================

    #[test]
    fn test_apply_channel_rules_uses_first_matching_rule() {
        let rule = |action: &str, reference: &str, range: &str| ChannelRule {
            action_packages: vec![ActionPackage {
                deployment_action: action.to_string(),
                package_reference: reference.to_string(),
            }],
            version_range: range.to_string(),
            tag: String::new(),
        };
        let rules = vec![
            rule("Install", "other", "[0.1]"),
            rule("Install", "pterm", "[1.0,2.0)"),
            rule("Install", "pterm", "[5.0]"),
        ];

        let query = apply_channel_rules(
            &rules,
            &template_package("Install", "pterm"),
            PackageVersionQuery::latest("pterm"),
        );
        assert_eq!(query.version_range.as_deref(), Some("[1.0,2.0)"));
        assert_eq!(query.pre_release_tag, None);

        let untouched = apply_channel_rules(
            &rules,
            &template_package("Push", "pterm"),
            PackageVersionQuery::latest("pterm"),
        );
        assert_eq!(untouched, PackageVersionQuery::latest("pterm"));
    }

    #[test]
    fn test_result_display_without_channel() {
        let result = CreateReleaseResult {
            release_id: "Releases-7".to_string(),
            release_version: "1.0.0".to_string(),
            channel: None,
            packages: vec![],
            git_resources: vec![],
        };

        assert_eq!(result.to_string(), "Successfully created release version 1.0.0");
    }

    #[test]
    fn test_automation_command() {
        let command = CreateReleaseCommand {
            space_id_or_name: "Spaces-2".to_string(),
            project_name: "Deploy Site".to_string(),
            channel_name: "Beta".to_string(),
            release_version: "1.0.0".to_string(),
            packages: vec!["*:1.5.0".to_string(), "Install:pterm:2.0.0".to_string()],
            git_resources: vec!["Run Script:refs/heads/main".to_string()],
            git_ref: "refs/heads/main".to_string(),
            release_notes: "It's done".to_string(),
            ignore_if_already_exists: true,
            ..Default::default()
        };

        assert_eq!(
            automation_command(&command),
            "octopus release create --no-prompt --project 'Deploy Site' --space 'Spaces-2' \
             --git-ref 'refs/heads/main' --channel 'Beta' --release-notes 'It'\\''s done' \
             --package '*:1.5.0' --package 'Install:pterm:2.0.0' \
             --git-resource 'Run Script:refs/heads/main' --version '1.0.0' --ignore-existing"
        );
    }

    #[test]
    fn test_release_notes_are_read_from_file() {
        let path = std::env::temp_dir()
            .join(format!("octopus-release-notes-{}.md", std::process::id()));
        fs::write(&path, "# Fixed\n- the thing\n").unwrap();

        let args = args::Create {
            release_notes_file: Some(path.clone()),
            ..Default::default()
        };
        let notes = read_release_notes(&args);
        fs::remove_file(&path).unwrap();

        assert_eq!(notes.unwrap().as_deref(), Some("# Fixed\n- the thing\n"));
    }

    #[test]
    fn test_missing_release_notes_file_fails() {
        let args = args::Create {
            release_notes: Some("inline".to_string()),
            release_notes_file: Some("/nonexistent/octopus/notes.md".into()),
            ..Default::default()
        };

        let err = read_release_notes(&args).unwrap_err();

        assert_eq!(
            err.to_string(),
            "reading release notes from /nonexistent/octopus/notes.md"
        );
    }

    #[test]
    fn test_inline_release_notes_are_kept() {
        let args = args::Create {
            release_notes: Some("inline".to_string()),
            ..Default::default()
        };

        assert_eq!(read_release_notes(&args).unwrap().as_deref(), Some("inline"));
    }
}
