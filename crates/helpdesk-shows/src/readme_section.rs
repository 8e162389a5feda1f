use thiserror::Error;

use crate::show_record::ShowRecord;

pub const DEFAULT_README_SECTION: &str = "helpdesk-shows";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadmeSectionError {
    #[error("README has no '<!-- BEGIN section:{0} -->' marker")]
    MissingBeginMarker(String),
    #[error("README has no '<!-- END section:{0} -->' marker after its begin marker")]
    MissingEndMarker(String),
}

/// Renders upcoming (open) and past (closed) shows as the README Markdown block.
pub fn render_shows_section(shows: &[ShowRecord]) -> String {
    let mut upcoming = Vec::new();
    let mut past = Vec::new();
    for show in shows {
        let title = show.parsed_title();
        let link = format!("[{}]({})", title.title, show.html_url);
        let guest = title
            .guest
            .as_deref()
            .map(|guest| format!(" with [@{guest}](https://github.com/{guest})"))
            .unwrap_or_default();
        if show.is_open() {
            let datetime = title.datetime.as_deref().unwrap_or_default();
            upcoming.push(format!("- {datetime} — {link}{guest}"));
        } else {
            past.push(format!("- {link}{guest}"));
        }
    }
    format!(
        "\n\n## Upcoming shows\n\n{}\n\n## Past shows\n\n{}\n\n",
        upcoming.join("\n"),
        past.join("\n")
    )
}

/// Replaces everything between the named section markers with `content`.
pub fn replace_readme_section(
    readme: &str,
    section: &str,
    content: &str,
) -> Result<String, ReadmeSectionError> {
    let begin = format!("<!-- BEGIN section:{section} -->");
    let end = format!("<!-- END section:{section} -->");
    let begin_at = readme
        .find(&begin)
        .ok_or_else(|| ReadmeSectionError::MissingBeginMarker(section.to_string()))?;
    let content_start = begin_at + begin.len();
    let end_at = readme[content_start..]
        .find(&end)
        .map(|offset| content_start + offset)
        .ok_or_else(|| ReadmeSectionError::MissingEndMarker(section.to_string()))?;

    let mut output = String::with_capacity(readme.len() + content.len());
    output.push_str(&readme[..content_start]);
    output.push_str(content);
    output.push_str(&readme[end_at..]);
    Ok(output)
}
