use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::page::{
    COMPLETION_TEXT, EMPTY_STATE_TEXT, LeagueSection, MatchCard, Node, Page, UNAVAILABLE_TEXT,
};

/// Renders the results container the way the browser page lays it out.
pub fn render_html(page: &Page) -> String {
    let mut out = String::new();
    for node in &page.nodes {
        match node {
            Node::Heading(text) => {
                let _ = writeln!(out, "<h2>{}</h2>", escape(text));
            }
            Node::Loading => {
                let label = page.loading_label.as_deref().unwrap_or_default();
                let _ = writeln!(out, "<article aria-busy=\"true\">{}</article>", escape(label));
            }
            Node::League(section) => render_league(&mut out, section),
            Node::EmptyState => {
                let _ = writeln!(out, "<p>{}</p>", escape(EMPTY_STATE_TEXT));
            }
            Node::Completion => {
                let _ = writeln!(
                    out,
                    "<p class=\"feed-done\" style=\"text-align: center; color: var(--success); margin-top: 2em;\">{}</p>",
                    escape(COMPLETION_TEXT)
                );
            }
            Node::Error(text) => {
                let _ = writeln!(
                    out,
                    "<p class=\"feed-error\" style=\"color: var(--danger); text-align: center;\">{}</p>",
                    escape(text)
                );
            }
        }
    }
    out
}

/// Standalone document wrapping the results container.
pub fn render_document(page: &Page) -> String {
    let date = page.date_picker.iso();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Analyses {date}</title>\n</head>\n<body>\n<input type=\"date\" id=\"date-picker\" value=\"{date}\">\n<div id=\"resultados-container\">\n{}</div>\n</body>\n</html>\n",
        render_html(page)
    )
}

/// Writes `analysis-YYYY-MM-DD.html` into `dir` and returns its path.
pub fn export_html(page: &Page, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create export dir {}", dir.display()))?;
    let path = dir.join(format!("analysis-{}.html", page.date_picker.iso()));
    let tmp = path.with_extension("html.tmp");
    fs::write(&tmp, render_document(page)).context("write html export")?;
    fs::rename(&tmp, &path).context("swap html export")?;
    Ok(path)
}

fn render_league(out: &mut String, section: &LeagueSection) {
    let open = if section.open { " open" } else { "" };
    let _ = writeln!(out, "<details id=\"{}\"{open}>", escape(&section.id));
    out.push_str("<summary>");
    if let Some(flag) = &section.flag {
        let alt = section.country.as_deref().unwrap_or(&section.name);
        let _ = write!(
            out,
            "<img class=\"league-flag\" src=\"{}\" alt=\"{}\"> ",
            escape(flag),
            escape(alt)
        );
    }
    out.push_str(&escape(&section.name));
    out.push_str("</summary>\n<div class=\"grid league-grid\">\n");
    for card in &section.cards {
        render_card(out, card);
    }
    out.push_str("</div>\n</details>\n");
}

fn render_card(out: &mut String, card: &MatchCard) {
    out.push_str("<article class=\"match-card\">\n<div class=\"match-card-header\">\n");
    render_team(out, &card.home_team, &card.home_crest);
    out.push_str("<span class=\"vs\">vs</span>\n");
    render_team(out, &card.away_team, &card.away_crest);
    out.push_str("</div>\n");
    if let Some(kickoff) = &card.kickoff_time {
        let _ = writeln!(out, "<small class=\"kickoff\">{}</small>", escape(kickoff));
    }
    out.push_str("<footer>\n");
    let _ = writeln!(
        out,
        "<p><b>Likely scenario:</b> {}</p>",
        escape(&card.recommendation)
    );
    match &card.link {
        Some(href) => {
            let _ = writeln!(
                out,
                "<a href=\"{}\" role=\"button\" class=\"outline\">View analysis</a>",
                escape(href)
            );
        }
        None => {
            let _ = writeln!(
                out,
                "<button class=\"outline secondary\" disabled>{}</button>",
                escape(UNAVAILABLE_TEXT)
            );
        }
    }
    out.push_str("</footer>\n</article>\n");
}

fn render_team(out: &mut String, name: &str, crest: &str) {
    out.push_str("<div class=\"team\">\n");
    if !crest.is_empty() {
        let _ = writeln!(
            out,
            "<img src=\"{}\" alt=\"{} crest\">",
            escape(crest),
            escape(name)
        );
    }
    let _ = writeln!(out, "<strong>{}</strong>", escape(name));
    out.push_str("</div>\n");
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
