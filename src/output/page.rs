use std::fmt::{self, Write};

use crate::snapshot::{Section, Snapshot};
use crate::sources::terraform::workspace_url;
use crate::sources::{
    BuildListing, Container, DeploymentListing, Organization, Project, Repository,
};

/// Renders the dashboard page for a snapshot.
///
/// Each source gets its own card. A card shows its rows, a note when the
/// source returned nothing, or the failure reason when the fetch failed.
pub fn render_dashboard(snapshot: &Snapshot) -> String {
    let mut html = String::new();
    // Writing into a String cannot fail
    let _ = write_page(&mut html, snapshot);
    html
}

fn write_page(out: &mut String, snapshot: &Snapshot) -> fmt::Result {
    writeln!(out, "<!DOCTYPE html>")?;
    writeln!(out, "<html lang=\"en\">")?;
    writeln!(out, "<head>")?;
    writeln!(out, "    <meta charset=\"UTF-8\">")?;
    writeln!(out, "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">")?;
    writeln!(out, "    <title>DIY DevOps Dashboard</title>")?;
    writeln!(out, "    <style>")?;
    writeln!(out, "        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; background: #f5f5f5; }}")?;
    writeln!(out, "        nav {{ display: flex; align-items: center; justify-content: space-between; background: #2c3e50; color: white; padding: 12px 30px; }}")?;
    writeln!(out, "        nav a {{ color: white; text-decoration: none; margin-left: 18px; }}")?;
    writeln!(out, "        .burger {{ display: none; cursor: pointer; font-size: 24px; }}")?;
    writeln!(out, "        @media (max-width: 800px) {{ .burger {{ display: block; }} .menu {{ display: none; }} .menu.show {{ display: block; }} }}")?;
    writeln!(out, "        .container {{ max-width: 1200px; margin: 30px auto; display: grid; grid-template-columns: repeat(auto-fit, minmax(360px, 1fr)); gap: 20px; }}")?;
    writeln!(out, "        .card {{ background: white; padding: 20px; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }}")?;
    writeln!(out, "        h2 {{ color: #34495e; margin-top: 0; }}")?;
    writeln!(out, "        table {{ width: 100%; border-collapse: collapse; }}")?;
    writeln!(out, "        th, td {{ padding: 8px; text-align: left; border-bottom: 1px solid #ddd; }}")?;
    writeln!(out, "        .note {{ color: #7f8c8d; font-style: italic; }}")?;
    writeln!(out, "        .unavailable {{ color: #e74c3c; }}")?;
    writeln!(out, "        .good {{ color: #27ae60; }}")?;
    writeln!(out, "        .warning {{ color: #f39c12; }}")?;
    writeln!(out, "        .bad {{ color: #e74c3c; }}")?;
    writeln!(out, "    </style>")?;
    writeln!(out, "</head>")?;
    writeln!(out, "<body>")?;
    writeln!(out, "    <nav>")?;
    writeln!(out, "        <strong>DIY DevOps Dashboard</strong>")?;
    writeln!(out, "        <span class=\"burger\">&#9776;</span>")?;
    writeln!(out, "        <div class=\"menu\">")?;
    for (anchor, label) in [
        ("github", "GitHub"),
        ("docker", "Docker"),
        ("gitlab", "GitLab"),
        ("jenkins", "Jenkins"),
        ("terraform", "Terraform"),
        ("elastic", "Elastic"),
    ] {
        writeln!(out, "            <a href=\"#{anchor}\">{label}</a>")?;
    }
    writeln!(out, "            <a href=\"/post_to_webex\">Post to Webex</a>")?;
    writeln!(out, "        </div>")?;
    writeln!(out, "    </nav>")?;
    writeln!(out, "    <div class=\"container\">")?;

    write_card(
        out,
        "github",
        "GitHub Repositories",
        &snapshot.repositories,
        |rows| rows.is_empty(),
        |out, rows| write_repositories(out, rows),
    )?;
    write_card(
        out,
        "docker",
        "Docker Containers",
        &snapshot.containers,
        |rows| rows.is_empty(),
        |out, rows| write_containers(out, rows),
    )?;
    write_card(
        out,
        "gitlab",
        "GitLab Projects",
        &snapshot.projects,
        |rows| rows.is_empty(),
        |out, rows| write_projects(out, rows),
    )?;
    write_card(
        out,
        "jenkins",
        "Jenkins Builds",
        &snapshot.builds,
        |listing| listing.jobs.is_empty(),
        write_builds,
    )?;
    write_card(
        out,
        "terraform",
        "Terraform Organizations",
        &snapshot.organizations,
        |orgs| orgs.is_empty(),
        |out, orgs| write_organizations(out, orgs, &snapshot.terraform_url),
    )?;
    write_card(
        out,
        "elastic",
        "Elastic Cloud Deployments",
        &snapshot.deployments,
        |listing| listing.deployments.is_empty(),
        write_deployments,
    )?;

    writeln!(out, "    </div>")?;
    writeln!(out, "    <script src=\"/static/script.js\"></script>")?;
    writeln!(out, "</body>")?;
    writeln!(out, "</html>")
}

fn write_card<T>(
    out: &mut String,
    anchor: &str,
    title: &str,
    section: &Section<T>,
    is_empty: impl Fn(&T) -> bool,
    write_rows: impl Fn(&mut String, &T) -> fmt::Result,
) -> fmt::Result {
    writeln!(out, "        <div class=\"card\" id=\"{anchor}\">")?;
    writeln!(out, "            <h2>{title}</h2>")?;
    match section {
        Err(failure) => writeln!(
            out,
            "            <p class=\"note unavailable\">Unavailable: {}</p>",
            escape(&failure.reason)
        )?,
        Ok(data) if is_empty(data) => {
            writeln!(out, "            <p class=\"note\">Nothing to show.</p>")?;
        }
        Ok(data) => write_rows(out, data)?,
    }
    writeln!(out, "        </div>")
}

fn write_repositories(out: &mut String, repositories: &[Repository]) -> fmt::Result {
    writeln!(out, "            <table>")?;
    writeln!(out, "                <tr><th>Repository</th><th>Language</th><th>Latest Commit</th></tr>")?;
    for repo in repositories {
        writeln!(
            out,
            "                <tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>",
            escape(&repo.url),
            escape(&repo.name),
            escape(repo.language.as_deref().unwrap_or("")),
            repo.latest_commit_date().unwrap_or_else(|| "No commits".to_string())
        )?;
    }
    writeln!(out, "            </table>")
}

fn write_containers(out: &mut String, containers: &[Container]) -> fmt::Result {
    writeln!(out, "            <table>")?;
    writeln!(out, "                <tr><th>ID</th><th>Name</th><th>Status</th></tr>")?;
    for container in containers {
        let class = match container.status.as_str() {
            "running" => "good",
            "restarting" | "paused" | "created" => "warning",
            _ => "bad",
        };
        writeln!(
            out,
            "                <tr><td><code>{}</code></td><td>{}</td><td class=\"{class}\">{}</td></tr>",
            escape(&container.container_id),
            escape(&container.name),
            escape(&container.status)
        )?;
    }
    writeln!(out, "            </table>")
}

fn write_projects(out: &mut String, projects: &[Project]) -> fmt::Result {
    writeln!(out, "            <table>")?;
    writeln!(out, "                <tr><th>Project</th><th>Last Activity</th></tr>")?;
    for project in projects {
        let activity = project
            .last_activity()
            .map(|(mdy, hms)| format!("{mdy} {hms}"))
            .unwrap_or_default();
        writeln!(
            out,
            "                <tr><td><a href=\"{}\">{}</a></td><td>{activity}</td></tr>",
            escape(&project.web_url),
            escape(&project.name)
        )?;
    }
    writeln!(out, "            </table>")
}

fn write_builds(out: &mut String, listing: &BuildListing) -> fmt::Result {
    writeln!(out, "            <table>")?;
    writeln!(out, "                <tr><th>Job</th><th>Status</th></tr>")?;
    for job in &listing.jobs {
        let Some(name) = &job.name else {
            continue;
        };
        let name = match &job.url {
            Some(url) => format!("<a href=\"{}\">{}</a>", escape(url), escape(name)),
            None => escape(name),
        };
        let color = job.color.as_deref().unwrap_or("");
        writeln!(
            out,
            "                <tr><td>{name}</td><td class=\"{}\">{}</td></tr>",
            build_class(color),
            escape(color)
        )?;
    }
    writeln!(out, "            </table>")
}

/// Maps a Jenkins ball color to a status class.
fn build_class(color: &str) -> &'static str {
    match color.trim_end_matches("_anime") {
        "blue" => "good",
        "yellow" | "aborted" => "warning",
        "red" => "bad",
        _ => "note",
    }
}

fn write_organizations(out: &mut String, organizations: &[Organization], terraform_url: &str) -> fmt::Result {
    for org in organizations {
        let Some(org_id) = &org.id else {
            continue;
        };
        writeln!(out, "            <h3>{}</h3>", escape(org_id))?;
        if org.workspaces.is_empty() {
            writeln!(out, "            <p class=\"note\">No workspaces.</p>")?;
            continue;
        }
        writeln!(out, "            <ul>")?;
        for name in org.workspaces.iter().filter_map(|ws| ws.name()) {
            writeln!(
                out,
                "                <li><a href=\"{}\">{}</a></li>",
                escape(&workspace_url(terraform_url, org_id, name)),
                escape(name)
            )?;
        }
        writeln!(out, "            </ul>")?;
    }
    Ok(())
}

fn write_deployments(out: &mut String, listing: &DeploymentListing) -> fmt::Result {
    for deployment in &listing.deployments {
        let Some(name) = &deployment.name else {
            continue;
        };
        writeln!(out, "            <h3>{}</h3>", escape(name))?;
        writeln!(out, "            <ul>")?;
        for resource in deployment.resources.iter().flatten() {
            let Some(ref_id) = &resource.ref_id else {
                continue;
            };
            let kind = resource.kind.as_deref().unwrap_or("resource");
            writeln!(out, "                <li>{}: {}</li>", escape(kind), escape(ref_id))?;
        }
        writeln!(out, "            </ul>")?;
    }
    Ok(())
}

/// Escapes text for use in HTML content and double-quoted attributes.
fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
