//! HTML to Markdown conversion for article regions.
//!
//! Walks the parsed `scraper` tree of the article subtree and renders the
//! elements that carry reading content: headings, paragraphs, lists, links,
//! emphasis, quotes, code, images and simple tables. Page chrome such as
//! scripts, forms and embedded frames is dropped. Whitespace inside text
//! nodes is collapsed the way a browser would lay it out.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Node};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

const SKIPPED: [&str; 9] = [
    "script", "style", "noscript", "template", "svg", "iframe", "form", "button", "head",
];

/// Convert an HTML fragment to Markdown text.
///
/// Returns an empty string when the fragment carries no readable text.
pub fn html_to_markdown(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.root_element(), &mut out, 0);
    tidy(&out)
}

fn render_children(el: ElementRef<'_>, out: &mut String, depth: usize) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => push_text(out, &**text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    render_element(child_el, out, depth);
                }
            }
            _ => {}
        }
    }
}

fn render_element(el: ElementRef<'_>, out: &mut String, depth: usize) {
    let name = el.value().name();
    if SKIPPED.contains(&name) {
        return;
    }

    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let text = render_inline(el, depth);
            if !text.is_empty() {
                start_block(out);
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(&text);
                out.push_str("\n\n");
            }
        }
        "p" | "div" | "section" | "header" | "footer" | "figure" | "figcaption" | "main" => {
            start_block(out);
            render_children(el, out, depth);
            out.push_str("\n\n");
        }
        "br" => out.push('\n'),
        "hr" => {
            start_block(out);
            out.push_str("---\n\n");
        }
        "strong" | "b" => wrap_inline(el, out, depth, "**"),
        "em" | "i" => wrap_inline(el, out, depth, "_"),
        "code" => wrap_inline(el, out, depth, "`"),
        "a" => {
            let text = render_inline(el, depth);
            match el.value().attr("href") {
                Some(href) if is_followable(href) && !text.is_empty() => {
                    push_inline(out, el, &format!("[{}]({})", text, href));
                }
                _ => push_inline(out, el, &text),
            }
        }
        "img" => {
            if let Some(src) = el.value().attr("src") {
                let alt = el.value().attr("alt").unwrap_or_default();
                out.push_str(&format!("![{}]({})", alt.trim(), src));
            }
        }
        "ul" => render_list(el, out, depth, false),
        "ol" => render_list(el, out, depth, true),
        "blockquote" => {
            let inner = render_block(el, depth);
            if !inner.is_empty() {
                start_block(out);
                for line in inner.lines() {
                    if line.is_empty() {
                        out.push_str(">\n");
                    } else {
                        out.push_str("> ");
                        out.push_str(line);
                        out.push('\n');
                    }
                }
                out.push('\n');
            }
        }
        "pre" => {
            let code: String = el.text().collect();
            if !code.trim().is_empty() {
                start_block(out);
                out.push_str("```\n");
                out.push_str(code.trim_end());
                out.push_str("\n```\n\n");
            }
        }
        "table" => render_table(el, out, depth),
        _ => render_children(el, out, depth),
    }
}

fn render_inline(el: ElementRef<'_>, depth: usize) -> String {
    let mut buf = String::new();
    render_children(el, &mut buf, depth);
    WHITESPACE.replace_all(buf.trim(), " ").into_owned()
}

fn render_block(el: ElementRef<'_>, depth: usize) -> String {
    let mut buf = String::new();
    render_children(el, &mut buf, depth);
    tidy(&buf)
}

fn wrap_inline(el: ElementRef<'_>, out: &mut String, depth: usize, marker: &str) {
    let text = render_inline(el, depth);
    if text.is_empty() {
        push_inline(out, el, "");
        return;
    }
    push_inline(out, el, &format!("{}{}{}", marker, text, marker));
}

/// Push rendered inline markup, spaced the way the element's own text was.
fn push_inline(out: &mut String, el: ElementRef<'_>, rendered: &str) {
    let raw: String = el.text().collect();
    let leading = raw.starts_with(char::is_whitespace);
    let trailing = raw.ends_with(char::is_whitespace);

    if leading && needs_space(out) {
        out.push(' ');
    }
    out.push_str(rendered);
    if trailing && !rendered.is_empty() && needs_space(out) {
        out.push(' ');
    }
}

fn render_list(el: ElementRef<'_>, out: &mut String, depth: usize, ordered: bool) {
    if depth == 0 {
        start_block(out);
    } else if !out.ends_with('\n') {
        out.push('\n');
    }

    let items = el
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "li");
    for (n, item) in items.enumerate() {
        let mut buf = String::new();
        render_children(item, &mut buf, depth + 1);
        let body = tidy(&buf);
        if body.is_empty() {
            continue;
        }
        let marker = if ordered {
            format!("{}.", n + 1)
        } else {
            "-".to_string()
        };
        let indent = " ".repeat(marker.len() + 1);
        for (i, line) in body.lines().enumerate() {
            if i == 0 {
                out.push_str(&marker);
                out.push(' ');
            } else if !line.is_empty() {
                out.push_str(&indent);
            }
            out.push_str(line);
            out.push('\n');
        }
    }

    if depth == 0 {
        out.push('\n');
    }
}

fn render_table(el: ElementRef<'_>, out: &mut String, depth: usize) {
    let rows: Vec<Vec<String>> = el
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|node| node.value().name() == "tr")
        .map(|row| {
            row.children()
                .filter_map(ElementRef::wrap)
                .filter(|cell| matches!(cell.value().name(), "td" | "th"))
                .map(|cell| render_inline(cell, depth).replace('|', "\\|"))
                .collect()
        })
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    if rows.is_empty() {
        return;
    }

    start_block(out);
    for (i, row) in rows.iter().enumerate() {
        out.push_str("| ");
        out.push_str(&row.join(" | "));
        out.push_str(" |\n");
        if i == 0 {
            out.push('|');
            out.push_str(&" --- |".repeat(row.len()));
            out.push('\n');
        }
    }
    out.push('\n');
}

fn push_text(out: &mut String, text: &str) {
    let collapsed = WHITESPACE.replace_all(text, " ");
    if collapsed.trim().is_empty() {
        if !collapsed.is_empty() && needs_space(out) {
            out.push(' ');
        }
        return;
    }
    if out.is_empty() || out.ends_with('\n') || out.ends_with(' ') {
        out.push_str(collapsed.trim_start());
    } else {
        out.push_str(&collapsed);
    }
}

fn needs_space(out: &str) -> bool {
    !(out.is_empty() || out.ends_with(' ') || out.ends_with('\n'))
}

fn start_block(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    if out.is_empty() || out.ends_with("\n\n") {
        return;
    }
    if out.ends_with('\n') {
        out.push('\n');
    } else {
        out.push_str("\n\n");
    }
}

fn is_followable(href: &str) -> bool {
    !(href.is_empty() || href.starts_with('#') || href.starts_with("javascript:"))
}

fn tidy(text: &str) -> String {
    let trimmed: Vec<&str> = text.lines().map(str::trim_end).collect();
    let joined = trimmed.join("\n");
    BLANK_LINES.replace_all(&joined, "\n\n").trim().to_string()
}
