//! HTML for the search page.
//!
//! Plain `format!` templates; every interpolated value goes through
//! [`html_escape`].

use crate::models::Record;

const STYLESHEET: &str = "https://cdn.jsdelivr.net/npm/water.css@2/out/water.css";

/// Escapes text for use in HTML element content and quoted attributes.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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

/// Renders the home page: search form plus results, if any.
pub fn render_home(query: Option<&str>, results: &[Record]) -> String {
    let results_section = if results.is_empty() {
        String::new()
    } else {
        let items: String = results
            .iter()
            .map(|r| format!("<li>{}</li>", render_record(r)))
            .collect();
        format!(
            r#"<article><h2>Search Results</h2><ol style="display: flex; flex-direction: column; gap: 1rem">{}</ol></article>"#,
            items
        )
    };

    format!(
        r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>Val Town Search</title><link rel="stylesheet" href="{stylesheet}"></head><body><main><h1>Val Town Search</h1><form action="/" method="get"><label for="q">Query <input type="text" name="q" id="q" autocomplete="off" value="{query}"></label></form>{results}</main></body></html>"#,
        stylesheet = STYLESHEET,
        query = html_escape(query.unwrap_or_default()),
        results = results_section,
    )
}

fn render_record(record: &Record) -> String {
    format!(
        r#"<div style="display: grid; grid-template-rows: auto 1fr; padding: 1rem; box-shadow: #00000030 4px 4px 8px"><div style="display: flex; gap: 1rem; align-items: center"><a href="http://val.town/v/{id}">{handle}.{name}</a></div><div><pre>{body}</pre></div></div>"#,
        id = html_escape(&record.id),
        handle = html_escape(&record.handle),
        name = html_escape(&record.name),
        body = html_escape(&record.body),
    )
}
