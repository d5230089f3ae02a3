use std::collections::{BTreeMap, HashMap};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    dependencies::FeedLookup,
    models::{PackageVersionQuery, ReleaseTemplateGitResource, ReleaseTemplatePackage},
    overrides::BaselineEntry,
};

#[derive(Debug, Error)]
pub enum BaselineError {
    #[error("failed to look up {what}: {cause:#}")]
    FeedLookup { what: String, cause: anyhow::Error },

    #[error("feed {0} referenced by the deployment process was not returned by the server")]
    MissingFeed(String),

    #[error("more than one version of {package_id} returned when only 1 was requested")]
    AmbiguousSearchResult { package_id: String },
}

/// Compute the default package versions for a release.
///
/// Packages with a fixed version are left out. Packages the server can't resolve (for example
/// ones whose id is a variable expression) are kept with an empty version and never queried.
/// Every other package gets the latest version matching its feed query; `refine` may narrow the
/// query per package, for example with a channel's version range.
///
/// Feeds are queried in id order, and identical queries against the same feed are only sent once.
/// Any lookup failure aborts the whole build.
pub async fn build_package_baseline<F, R>(
    feeds: &F,
    packages: &[ReleaseTemplatePackage],
    refine: R,
) -> Result<Vec<BaselineEntry>, BaselineError>
where
    F: FeedLookup + Sync + ?Sized,
    R: Fn(&ReleaseTemplatePackage, PackageVersionQuery) -> PackageVersionQuery + Send + Sync,
{
    let mut result = Vec::with_capacity(packages.len());

    // feed id -> packages to look up in it
    let mut by_feed: BTreeMap<&str, Vec<&ReleaseTemplatePackage>> = BTreeMap::new();
    for package in packages {
        if package.has_fixed_version() {
            trace!(package_id = package.package_id, "skipping package with fixed version");
            continue;
        }

        if !package.is_resolvable {
            result.push(package_entry(package, String::new()));
            continue;
        }

        by_feed
            .entry(package.feed_id.as_str())
            .or_default()
            .push(package);
    }

    if by_feed.is_empty() {
        return Ok(result);
    }

    let feed_ids: Vec<String> = by_feed.keys().map(ToString::to_string).collect();
    let found_feeds = feeds
        .get_feeds(feed_ids.clone())
        .await
        .map_err(|cause| BaselineError::FeedLookup {
            what: format!("feeds {}", feed_ids.join(", ")),
            cause,
        })?;

    let mut cache: HashMap<(String, PackageVersionQuery), String> = HashMap::new();
    for (feed_id, feed_packages) in by_feed {
        let feed = found_feeds
            .iter()
            .find(|feed| feed.id == feed_id)
            .ok_or_else(|| BaselineError::MissingFeed(feed_id.to_string()))?;

        for package in feed_packages {
            let query = refine(package, PackageVersionQuery::latest(&package.package_id));
            let key = (feed_id.to_string(), query);

            if let Some(version) = cache.get(&key) {
                trace!(?key, version, "package version cache hit");
                result.push(package_entry(package, version.clone()));
                continue;
            }

            let versions = feeds
                .search_package_versions(feed.clone(), key.1.clone())
                .await
                .map_err(|cause| BaselineError::FeedLookup {
                    what: format!("versions of {} in {}", package.package_id, feed_id),
                    cause,
                })?;

            let version = match versions.as_slice() {
                [] => String::new(),
                [version] => version.version.clone(),
                _ => {
                    return Err(BaselineError::AmbiguousSearchResult {
                        package_id: package.package_id.clone(),
                    });
                }
            };

            debug!(
                package_id = package.package_id,
                feed_id, version, "resolved package version"
            );
            cache.insert(key, version.clone());
            result.push(package_entry(package, version));
        }
    }

    Ok(result)
}

fn package_entry(package: &ReleaseTemplatePackage, version: String) -> BaselineEntry {
    BaselineEntry {
        action_name: package.action_name.clone(),
        resource_id: Some(package.package_id.clone()),
        secondary: package.package_reference_name.clone(),
        value: version,
    }
}

/// One entry per git resource, defaulting to the resource's default branch.
pub fn build_git_resource_baseline(git_resources: &[ReleaseTemplateGitResource]) -> Vec<BaselineEntry> {
    git_resources
        .iter()
        .map(|resource| {
            trace!(
                action_name = resource.action_name,
                repository_uri = resource.repository_uri,
                "git resource"
            );
            BaselineEntry {
                action_name: resource.action_name.clone(),
                resource_id: None,
                secondary: resource.name.clone(),
                value: resource.default_branch.clone(),
            }
        })
        .collect()
}
