//! Markdown rendering with heading ids, bare URL autolinking and TOC
//! generation.

use std::collections::HashSet;
use std::sync::LazyLock;

use pulldown_cmark::{
    CowStr, Event, HeadingLevel, LinkType, Parser, Tag, TagEnd, TextMergeStream, html,
};
use regex::Regex;
use serde::Serialize;

use crate::config::MarkdownOptions;

/// Matches bare URLs in text. Trailing punctuation is trimmed separately.
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:https?|ftp)://[^\s<>"]+"#).expect("URL pattern is valid")
});

/// Result of rendering markdown, containing both HTML and table of contents.
#[derive(Debug)]
pub struct MarkdownOutput {
    pub html: String,
    pub toc: Vec<TocEntry>,
}

/// A table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    /// The heading text
    pub text: String,
    /// The heading id (for anchor links)
    pub id: String,
    /// The heading level (1-6)
    pub level: u8,
}

/// Render markdown to an HTML fragment.
///
/// Rendering never fails: any input yields best-effort HTML.
pub fn render_markdown(markdown: &str, options: &MarkdownOptions) -> MarkdownOutput {
    let parser = TextMergeStream::new(Parser::new_ext(markdown, options.parser));

    let events: Vec<Event> = if options.autolink {
        autolink(parser)
    } else {
        parser.collect()
    };

    let (events, toc) = if options.heading_ids || options.toc {
        assign_heading_ids(events)
    } else {
        (events, Vec::new())
    };

    let mut html_output = String::new();
    if options.toc && !toc.is_empty() {
        html_output.push_str(&render_toc(&toc));
    }
    html::push_html(&mut html_output, events.into_iter());

    MarkdownOutput {
        html: html_output,
        toc,
    }
}

/// Turn bare URLs in plain text into links.
///
/// Text inside code blocks, links and images is left alone.
fn autolink<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut in_code_block = false;
    let mut link_depth = 0usize;

    events
        .flat_map(|event| match event {
            Event::Start(Tag::CodeBlock(_)) => {
                in_code_block = true;
                vec![event]
            }
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                vec![event]
            }
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                link_depth += 1;
                vec![event]
            }
            Event::End(TagEnd::Link | TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1);
                vec![event]
            }
            Event::Text(text) if !in_code_block && link_depth == 0 => link_urls(text),
            _ => vec![event],
        })
        .collect()
}

/// Split a text run into plain text and autolink events.
fn link_urls(text: CowStr<'_>) -> Vec<Event<'_>> {
    let mut events = Vec::new();
    let mut last = 0;

    for found in URL_PATTERN.find_iter(&text) {
        let url = trim_url(found.as_str());
        if url.is_empty() {
            continue;
        }
        let start = found.start();
        let end = start + url.len();

        if start > last {
            events.push(Event::Text(text[last..start].to_string().into()));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: url.to_string().into(),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        events.push(Event::Text(url.to_string().into()));
        events.push(Event::End(TagEnd::Link));
        last = end;
    }

    if last == 0 {
        return vec![Event::Text(text)];
    }
    if last < text.len() {
        events.push(Event::Text(text[last..].to_string().into()));
    }
    events
}

/// Strip trailing punctuation that is more likely prose than URL.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ':', ';', '!', '?', '\'', '’', '”']);
        let trimmed = if trimmed.ends_with(')')
            && trimmed.matches('(').count() < trimmed.matches(')').count()
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

/// Give every heading a unique `id` attribute and collect the TOC.
///
/// Explicit `{#id}` attributes are kept as written and reserved up front,
/// so generated ids never reuse them.
fn assign_heading_ids(events: Vec<Event<'_>>) -> (Vec<Event<'_>>, Vec<TocEntry>) {
    struct HeadingState<'a> {
        level: HeadingLevel,
        id: Option<String>,
        classes: Vec<String>,
        inner: Vec<Event<'a>>,
        text: String,
    }

    let mut used_heading_ids: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();

    let mut in_heading: Option<HeadingState> = None;
    let mut toc_entries: Vec<TocEntry> = Vec::new();
    let mut output = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level, id, classes, ..
            }) => {
                in_heading = Some(HeadingState {
                    level,
                    id: id.map(|id| id.to_string()),
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    inner: Vec::new(),
                    text: String::new(),
                });
            }
            Event::End(TagEnd::Heading(_)) if in_heading.is_some() => {
                let Some(state) = in_heading.take() else {
                    continue;
                };

                let id = match state.id {
                    Some(id) => id,
                    None => {
                        let mut base_id = slugify(&state.text);
                        if base_id.is_empty() {
                            base_id = "section".to_string();
                        }
                        let mut id = base_id.clone();
                        let mut suffix = 1;
                        while used_heading_ids.contains(&id) {
                            id = format!("{}-{}", base_id, suffix);
                            suffix += 1;
                        }
                        used_heading_ids.insert(id.clone());
                        id
                    }
                };

                toc_entries.push(TocEntry {
                    text: state.text.trim().to_string(),
                    id: id.clone(),
                    level: state.level as u8,
                });

                let class_attr = if state.classes.is_empty() {
                    String::new()
                } else {
                    format!(" class=\"{}\"", html_escape(&state.classes.join(" ")))
                };
                let mut inner_html = String::new();
                html::push_html(&mut inner_html, state.inner.into_iter());
                output.push(Event::Html(
                    format!(
                        "<h{level} id=\"{id}\"{class_attr}>{inner_html}</h{level}>\n",
                        level = state.level as u8,
                        id = html_escape(&id),
                    )
                    .into(),
                ));
            }
            _ => match in_heading.as_mut() {
                Some(state) => {
                    if let Event::Text(text) | Event::Code(text) = &event {
                        state.text.push_str(text);
                    }
                    state.inner.push(event);
                }
                None => output.push(event),
            },
        }
    }

    (output, toc_entries)
}

/// Render a nested `<nav>` list for the table of contents.
///
/// Levels are relative to the shallowest heading, so a document whose
/// first heading is `##` still starts at the outermost list.
pub fn render_toc(entries: &[TocEntry]) -> String {
    let Some(base) = entries.iter().map(|e| e.level).min() else {
        return String::new();
    };

    let mut out = String::from("<nav>\n");
    let mut depth = 0usize;

    for (index, entry) in entries.iter().enumerate() {
        let target = usize::from(entry.level - base) + 1;
        if index == 0 {
            while depth < target {
                out.push_str("<ul>\n<li>");
                depth += 1;
            }
        } else if target > depth {
            while depth < target {
                out.push_str("\n<ul>\n<li>");
                depth += 1;
            }
        } else {
            while depth > target {
                out.push_str("</li>\n</ul>\n");
                depth -= 1;
            }
            out.push_str("</li>\n<li>");
        }
        out.push_str(&format!(
            "<a href=\"#{}\">{}</a>",
            html_escape(&entry.id),
            html_escape(&entry.text)
        ));
    }

    while depth > 0 {
        out.push_str("</li>\n</ul>\n");
        depth -= 1;
    }
    out.push_str("</nav>\n\n");
    out
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-' && c != '_', "")
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
