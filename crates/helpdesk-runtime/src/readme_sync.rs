use helpdesk_shows::{render_shows_section, replace_readme_section};
use serde::Serialize;
use tracing::{debug, info};

use crate::collaborators::{IssueFilter, IssueStateFilter, IssueTracker, ReadmeRepository};
use crate::config::{HelpdeskConfig, README_COMMIT_MESSAGE};
use crate::error::ShowLifecycleError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadmeSyncReport {
    pub shows: usize,
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ReadmeSyncReport {
    pub fn summary_line(&self) -> String {
        format!(
            "helpdesk readme sync: shows={} updated={} unchanged={}",
            self.shows,
            join_or_none(&self.updated),
            join_or_none(&self.unchanged)
        )
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "none".to_string()
    } else {
        values.join(",")
    }
}

/// Rewrites the shows section of every configured README from all show issues.
pub async fn sync_readmes(
    config: &HelpdeskConfig,
    issues: &dyn IssueTracker,
    readmes: &dyn ReadmeRepository,
) -> Result<ReadmeSyncReport, ShowLifecycleError> {
    let filter = IssueFilter::shows(&config.show_label, IssueStateFilter::All);
    let shows = issues.list_shows(&filter).await?;
    let section = render_shows_section(&shows);

    let mut report = ReadmeSyncReport {
        shows: shows.len(),
        ..ReadmeSyncReport::default()
    };
    for target in &config.readme_targets {
        let slug = target.repo.as_slug();
        let current = readmes.fetch_readme(target).await?;
        let next = replace_readme_section(&current.content, &config.readme_section, &section)
            .map_err(|source| ShowLifecycleError::Readme {
                repo: slug.clone(),
                source,
            })?;
        if next == current.content {
            debug!(repo = %slug, "README already up to date");
            report.unchanged.push(slug);
            continue;
        }
        readmes
            .update_readme(target, &current, &next, README_COMMIT_MESSAGE)
            .await?;
        info!(repo = %slug, "README updated");
        report.updated.push(slug);
    }
    Ok(report)
}
