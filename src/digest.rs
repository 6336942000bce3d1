//! Markdown digest of a [`Snapshot`] for posting to a chat space.

use std::fmt::{self, Write};

use crate::snapshot::{items, Snapshot};
use crate::sources::terraform::workspace_url;

/// Entries shown for the repository, container and project sections.
pub const DIGEST_SECTION_LIMIT: usize = 5;

/// Render the digest message.
///
/// Failed sources render exactly like sources with no data. Entries missing
/// an optional field lose only the line that needs it.
pub fn format_digest(snapshot: &Snapshot) -> String {
    let mut message = String::new();
    // Writing into a String cannot fail
    let _ = write_digest(&mut message, snapshot);
    message
}

fn write_digest(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("DIY DevOps Dashboard:\n\n")?;

    write_repositories(message, snapshot)?;
    write_containers(message, snapshot)?;
    write_projects(message, snapshot)?;
    write_builds(message, snapshot)?;
    write_organizations(message, snapshot)?;
    write_deployments(message, snapshot)
}

fn write_repositories(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("GitHub Repositories and Latest Commits:\n\n")?;
    for repo in items(&snapshot.repositories).iter().take(DIGEST_SECTION_LIMIT) {
        writeln!(message, "- [{}]({})", repo.name, repo.url)?;
        match repo.latest_commit_date() {
            Some(date) => writeln!(message, "Latest Commit: {date}")?,
            None => message.write_str("Latest Commit: No commits\n")?,
        }
        message.write_char('\n')?;
    }
    Ok(())
}

fn write_containers(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("Docker Containers:\n\n")?;
    for container in items(&snapshot.containers).iter().take(DIGEST_SECTION_LIMIT) {
        writeln!(message, "- Name: {}", container.name)?;
        writeln!(message, "  Status: {}\n", container.status)?;
    }
    Ok(())
}

fn write_projects(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("GitLab Projects and Last Activity:\n\n")?;
    for project in items(&snapshot.projects).iter().take(DIGEST_SECTION_LIMIT) {
        writeln!(message, "- [{}]({})", project.name, project.web_url)?;
        if let Some((mdy, hms)) = project.last_activity() {
            writeln!(message, "  Last Activity: {mdy} {hms}")?;
        }
        message.write_char('\n')?;
    }
    Ok(())
}

fn write_builds(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("Jenkins Builds:\n")?;
    let jobs = snapshot
        .builds
        .as_ref()
        .map(|listing| listing.jobs.as_slice())
        .unwrap_or(&[]);

    for job in jobs {
        let (Some(name), Some(url)) = (&job.name, &job.url) else {
            continue;
        };
        writeln!(message, "\n- [{name}]({url})<br>")?;
        if let Some(color) = &job.color {
            writeln!(message, "\n  Status: {color}")?;
        }
    }
    message.write_char('\n')
}

fn write_organizations(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("Terraform Organizations and Workspaces:\n\n")?;
    for org in items(&snapshot.organizations) {
        if let Some(org_id) = &org.id {
            writeln!(message, "- Organization: {org_id}")?;
            message.write_str("  Workspaces:\n")?;
            for name in org.workspaces.iter().filter_map(|ws| ws.name()) {
                let url = workspace_url(&snapshot.terraform_url, org_id, name);
                writeln!(message, "  - [{name}]({url})")?;
            }
        }
        message.write_char('\n')?;
    }
    Ok(())
}

fn write_deployments(message: &mut String, snapshot: &Snapshot) -> fmt::Result {
    message.write_str("Elastic Cloud Deployments:\n\n")?;
    let deployments = snapshot
        .deployments
        .as_ref()
        .map(|listing| listing.deployments.as_slice())
        .unwrap_or(&[]);

    for deployment in deployments {
        if let Some(name) = &deployment.name {
            writeln!(message, "- Deployment: {name}")?;
            message.write_str("  Resources:\n")?;
            for ref_id in deployment
                .resources
                .iter()
                .flatten()
                .filter_map(|resource| resource.ref_id.as_deref())
            {
                writeln!(message, "    • Ref ID: {ref_id}")?;
            }
        }
        message.write_char('\n')?;
    }
    Ok(())
}
