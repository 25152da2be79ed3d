//! Markdown report of an analysis.
//!
//! The report mirrors the result view: a header with the URL, the article
//! metadata and the trust verdict, then one section per aspect with its
//! conclusion and a `| Title | Source | Description |` table. Sources become
//! links only when their URL starts with `http`.
//!
//! Rows can be narrowed with a case-insensitive filter over title and
//! source, and ordered by title or source.

use crate::models::{Aspect, AspectStatus, RequestState, ResultItem, TrustLevel};
use crate::utils::{ensure_parent_dir, slugify_title};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Row ordering for the report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    TitleAsc,
    TitleDesc,
    SourceAsc,
    SourceDesc,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOptions {
    /// Keep rows whose title or source contains this text (case-insensitive).
    pub filter: Option<String>,
    pub sort: Option<SortKey>,
}

/// Apply the report filter and sort to one aspect's rows.
pub fn filter_and_sort<'a>(items: &'a [ResultItem], options: &ReportOptions) -> Vec<&'a ResultItem> {
    let needle = options
        .filter
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);

    let filtered = items.iter().filter(|item| match &needle {
        Some(needle) => {
            item.title.to_lowercase().contains(needle)
                || item.source.to_lowercase().contains(needle)
        }
        None => true,
    });

    match options.sort {
        None => filtered.collect(),
        Some(key) => filtered
            .sorted_by(|a, b| {
                let (left, right) = match key {
                    SortKey::TitleAsc | SortKey::TitleDesc => (&a.title, &b.title),
                    SortKey::SourceAsc | SortKey::SourceDesc => (&a.source, &b.source),
                };
                let ordering = left.to_lowercase().cmp(&right.to_lowercase());
                match key {
                    SortKey::TitleDesc | SortKey::SourceDesc => ordering.reverse(),
                    _ => ordering,
                }
            })
            .collect(),
    }
}

/// Make text safe for a single Markdown table cell.
pub fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
        .split_whitespace()
        .join(" ")
}

fn trust_badge(level: TrustLevel) -> &'static str {
    match level {
        TrustLevel::High => "🟢 High Trust",
        TrustLevel::Medium => "🟡 Medium Trust",
        TrustLevel::Low => "🔴 Low Trust",
        TrustLevel::Unknown => "⚪ Unknown Trust",
    }
}

fn source_cell(item: &ResultItem) -> String {
    let source = escape_cell(&item.source);
    if item.source_url.starts_with("http") {
        let label = if source.is_empty() {
            escape_cell(&item.source_url)
        } else {
            source
        };
        format!("[{}]({})", label, item.source_url.replace(' ', "%20"))
    } else {
        source
    }
}

/// Render a request state as a Markdown report.
///
/// # Arguments
///
/// * `state` - The finished request state
/// * `options` - Row filter and sort
/// * `generated_at` - Timestamp printed in the header
pub fn request_state_to_markdown(
    state: &RequestState,
    options: &ReportOptions,
    generated_at: DateTime<Utc>,
) -> Result<String, std::fmt::Error> {
    let mut md = String::new();

    writeln!(md, "# Analysis Result\n")?;
    writeln!(
        md,
        "This content has been evaluated against core journalistic principles.\n"
    )?;
    writeln!(md, "- **URL:** <{}>", state.url)?;
    if let Some(article) = &state.article {
        writeln!(md, "- **Title:** {}", article.title)?;
        if let Some(author) = &article.author {
            writeln!(md, "- **Author:** {}", author)?;
        }
        if let Some(date) = &article.date {
            writeln!(md, "- **Published:** {}", date)?;
        }
    }
    if let Some(trust) = &state.trust_level {
        writeln!(md, "- **Trust level:** {}", trust_badge(trust.trust_level))?;
        if let Some(description) = trust.trust_description.as_deref().filter(|d| !d.is_empty()) {
            writeln!(md, "- **Rationale:** {}", description)?;
        }
    }
    writeln!(md, "- **Generated:** {}", generated_at.to_rfc3339())?;

    let Some(result) = &state.result else {
        writeln!(md, "\n_No analysis result: the article could not be fetched or analysed._")?;
        return Ok(md);
    };

    if let Some(filter) = options.filter.as_deref().filter(|f| !f.trim().is_empty()) {
        writeln!(md, "- **Filter:** `{}`", filter.trim())?;
    }

    writeln!(md, "\n## Contents\n")?;
    for aspect in Aspect::ALL {
        writeln!(
            md,
            "- [{}](#{}) ({})",
            aspect.display_name(),
            slugify_title(aspect.display_name()),
            result.get(aspect).len()
        )?;
    }

    for aspect in Aspect::ALL {
        let summary = state.summary_for(aspect);
        let conclusion = summary
            .and_then(|s| s.conclusion.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(aspect.default_summary());
        let degraded = summary.is_some_and(|s| s.status == AspectStatus::Degraded);

        writeln!(md, "\n## {}\n", aspect.display_name())?;
        if degraded {
            writeln!(md, "_{}_ (extraction failed, no items)\n", conclusion)?;
        } else {
            writeln!(md, "_{}_\n", conclusion)?;
        }

        let items = result.get(aspect);
        let rows = filter_and_sort(items, options);
        if items.is_empty() {
            writeln!(md, "_No items._")?;
            continue;
        }
        if rows.is_empty() {
            writeln!(md, "_No items match the filter._")?;
            continue;
        }

        writeln!(md, "| Title | Source | Description |")?;
        writeln!(md, "| --- | --- | --- |")?;
        for item in rows {
            writeln!(
                md,
                "| {} | {} | {} |",
                escape_cell(&item.title),
                source_cell(item),
                escape_cell(&item.description)
            )?;
        }
    }

    Ok(md)
}

/// Render and write the Markdown report.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn write_report(
    state: &RequestState,
    options: &ReportOptions,
    path: &str,
) -> Result<(), Box<dyn Error>> {
    let md = request_state_to_markdown(state, options, Utc::now())?;
    let path = Path::new(path);
    ensure_parent_dir(path).await?;
    fs::write(path, md).await?;
    info!("Wrote Markdown report");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::normalize_outcomes;
    use crate::models::{
        AnalysisResult, Article, AspectResult, AspectOutcome, AspectSummary, Issue, TrustResult,
    };
    use chrono::TimeZone;

    fn item(title: &str, source: &str, source_url: &str) -> ResultItem {
        ResultItem {
            title: title.to_string(),
            source: source.to_string(),
            source_url: source_url.to_string(),
            description: format!("About {}", title),
        }
    }

    fn generated_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn analysed_state() -> RequestState {
        let outcomes = vec![
            (
                Aspect::Attribution,
                AspectOutcome::Extracted(AspectResult {
                    issues: vec![Issue {
                        title: "Anonymous official".to_string(),
                        claim: None,
                        source: Some("Unnamed | aide".to_string()),
                        source_url: None,
                        description: "Quoted without a name".to_string(),
                    }],
                    conclusion: Some("One anonymous quote".to_string()),
                }),
            ),
            (
                Aspect::Independence,
                AspectOutcome::Degraded {
                    reason: "timeout".to_string(),
                },
            ),
        ];

        let mut state = RequestState::new("https://example.com/a1");
        state.article = Some(Article {
            title: "Budget passes".to_string(),
            url: "https://example.com/a1".to_string(),
            body: None,
            author: Some("J. Doe".to_string()),
            date: None,
        });
        state.result = Some(normalize_outcomes(&outcomes));
        state.summaries = vec![
            AspectSummary {
                aspect: Aspect::Attribution,
                status: AspectStatus::Extracted,
                conclusion: Some("One anonymous quote".to_string()),
            },
            AspectSummary {
                aspect: Aspect::Independence,
                status: AspectStatus::Degraded,
                conclusion: None,
            },
        ];
        state.trust_level = Some(TrustResult {
            trust_level: TrustLevel::Medium,
            trust_description: Some("Mostly sourced".to_string()),
        });
        state
    }

    #[test]
    fn test_filter_matches_title_or_source() {
        let items = vec![
            item("Budget figures", "Reuters", ""),
            item("Minister quote", "AP", ""),
            item("Reuters poll", "Gallup", ""),
        ];
        let options = ReportOptions {
            filter: Some("REUTERS".to_string()),
            sort: None,
        };
        let rows = filter_and_sort(&items, &options);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Budget figures");
        assert_eq!(rows[1].title, "Reuters poll");
    }

    #[test]
    fn test_blank_filter_keeps_everything() {
        let items = vec![item("A", "x", ""), item("B", "y", "")];
        let options = ReportOptions {
            filter: Some("   ".to_string()),
            sort: None,
        };
        assert_eq!(filter_and_sort(&items, &options).len(), 2);
    }

    #[test]
    fn test_sort_by_source_desc() {
        let items = vec![
            item("One", "beta", ""),
            item("Two", "Alpha", ""),
            item("Three", "gamma", ""),
        ];
        let options = ReportOptions {
            filter: None,
            sort: Some(SortKey::SourceDesc),
        };
        let titles: Vec<&str> = filter_and_sort(&items, &options)
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Three", "One", "Two"]);
    }

    #[test]
    fn test_sort_by_title_asc() {
        let items = vec![item("b", "", ""), item("C", "", ""), item("a", "", "")];
        let options = ReportOptions {
            filter: None,
            sort: Some(SortKey::TitleAsc),
        };
        let titles: Vec<&str> = filter_and_sort(&items, &options)
            .iter()
            .map(|i| i.title.as_str())
            .collect();
        assert_eq!(titles, vec!["a", "b", "C"]);
    }

    #[test]
    fn test_escape_cell() {
        assert_eq!(escape_cell("a | b\nc"), "a \\| b c");
    }

    #[test]
    fn test_source_links_only_for_http_urls() {
        let linked = source_cell(&item("T", "Ministry", "https://gov.example/stats"));
        assert_eq!(linked, "[Ministry](https://gov.example/stats)");

        let plain = source_cell(&item("T", "Ministry", "gov.example/stats"));
        assert_eq!(plain, "Ministry");
    }

    #[test]
    fn test_report_sections() {
        let md = request_state_to_markdown(&analysed_state(), &ReportOptions::default(), generated_at())
            .unwrap();

        assert!(md.starts_with("# Analysis Result\n"));
        assert!(md.contains("- **URL:** <https://example.com/a1>"));
        assert!(md.contains("- **Title:** Budget passes"));
        assert!(md.contains("- **Author:** J. Doe"));
        assert!(md.contains("🟡 Medium Trust"));
        assert!(md.contains("- **Rationale:** Mostly sourced"));
        assert!(md.contains("- **Generated:** 2024-05-01T12:00:00+00:00"));
        assert!(md.contains("- [Truth and Accuracy](#truth-and-accuracy) (0)"));
        assert!(md.contains("- [Attribution](#attribution) (1)"));

        assert!(md.contains("## Attribution\n\n_One anonymous quote_"));
        assert!(md.contains("| Anonymous official | Unnamed \\| aide | Quoted without a name |"));
        assert!(md.contains(
            "## Independence\n\n_No obvious conflicts of interest detected_ (extraction failed, no items)"
        ));
        assert!(md.contains(
            "## Truth and Accuracy\n\n_The main claims are supported but require additional verification_\n\n_No items._"
        ));
    }

    #[test]
    fn test_report_filter_with_no_matches() {
        let options = ReportOptions {
            filter: Some("reuters".to_string()),
            sort: None,
        };
        let md = request_state_to_markdown(&analysed_state(), &options, generated_at()).unwrap();
        assert!(md.contains("- **Filter:** `reuters`"));
        assert!(md.contains("## Attribution\n\n_One anonymous quote_\n\n_No items match the filter._"));
    }

    #[test]
    fn test_report_without_result() {
        let state = RequestState::new("not a url");
        let md = request_state_to_markdown(&state, &ReportOptions::default(), generated_at()).unwrap();
        assert!(md.contains("_No analysis result"));
        assert!(!md.contains("## Contents"));
        assert!(!md.contains("Trust level"));
    }

    #[test]
    fn test_report_uses_default_summary_without_summaries() {
        let mut state = RequestState::new("https://example.com/a1");
        state.result = Some(AnalysisResult::default());
        let md = request_state_to_markdown(&state, &ReportOptions::default(), generated_at()).unwrap();
        assert!(md.contains("_Multiple viewpoints are presented_"));
    }
}
