//! AI-written reports over the analytics snapshot.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::ai::AiService;
use crate::analytics::Analytics;
pub use crate::models::DateRange;
use crate::models::{NewReport, Report};
use crate::store::{EntityStore, ListOptions};

pub const GENERATED_BY: &str = "System";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    UsageAnalytics,
    ContentSummary,
    SearchInsights,
    ProcessingStats,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::UsageAnalytics,
        ReportType::ContentSummary,
        ReportType::SearchInsights,
        ReportType::ProcessingStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::UsageAnalytics => "usage_analytics",
            ReportType::ContentSummary => "content_summary",
            ReportType::SearchInsights => "search_insights",
            ReportType::ProcessingStats => "processing_stats",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportType::UsageAnalytics => "Usage Analytics Report",
            ReportType::ContentSummary => "Content Summary Report",
            ReportType::SearchInsights => "Search Insights Report",
            ReportType::ProcessingStats => "Processing Statistics Report",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportType::UsageAnalytics => {
                "Detailed analysis of system usage, search patterns, and user activity"
            }
            ReportType::ContentSummary => {
                "Overview of all indexed content, categorization, and growth metrics"
            }
            ReportType::SearchInsights => {
                "Analysis of search queries, popular topics, and result effectiveness"
            }
            ReportType::ProcessingStats => {
                "System performance metrics, processing times, and efficiency analysis"
            }
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown report type '{}' (expected one of: usage_analytics, content_summary, search_insights, processing_stats)",
                    s
                )
            })
    }
}

pub fn report_prompt(kind: ReportType, analytics: &Analytics, range: &DateRange) -> String {
    format!(
        "Generate a comprehensive {kind} report for a Python knowledge base platform.

Current system statistics:
- Total Documents: {docs}
- Total Searches: {searches}
- Total Scraped Content: {scraped}
- Recent Documents (30 days): {recent_docs}
- Recent Searches (30 days): {recent_searches}
- Average Search Time: {avg:.2}ms

Date Range: {start} to {end}

Please provide:
1. Executive Summary (2-3 paragraphs)
2. Key Metrics and KPIs
3. Detailed Analysis (5-7 sections)
4. Recommendations (3-5 actionable items)
5. Trends and Insights
6. Performance Analysis

Make it professional and data-driven with specific insights for a Python developer knowledge base.",
        kind = kind.as_str().replace('_', " "),
        docs = analytics.total_documents,
        searches = analytics.total_searches,
        scraped = analytics.total_scraped,
        recent_docs = analytics.recent_documents,
        recent_searches = analytics.recent_searches,
        avg = analytics.avg_search_time,
        start = range.start_date,
        end = range.end_date,
    )
}

pub fn report_schema() -> Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    json!({
        "type": "object",
        "properties": {
            "executive_summary": { "type": "string" },
            "key_metrics": {
                "type": "object",
                "properties": {
                    "growth_rate": { "type": "string" },
                    "engagement_score": { "type": "string" },
                    "efficiency_rating": { "type": "string" },
                    "user_satisfaction": { "type": "string" }
                }
            },
            "detailed_analysis": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "section": { "type": "string" },
                        "content": { "type": "string" }
                    }
                }
            },
            "recommendations": strings.clone(),
            "trends": strings
        }
    })
}

/// Ask the AI service for a report and persist it.
///
/// Nothing is stored when the AI call fails.
pub async fn generate<S, A>(
    store: &S,
    ai: &A,
    kind: ReportType,
    analytics: &Analytics,
    range: DateRange,
) -> Result<Report>
where
    S: EntityStore + ?Sized,
    A: AiService + ?Sized,
{
    let data = ai
        .invoke(&report_prompt(kind, analytics, &range), &report_schema())
        .await?;
    debug!(report_type = %kind, "report generated");

    store
        .create_report(NewReport {
            report_type: kind.as_str().to_string(),
            title: kind.title().to_string(),
            data,
            generation_status: "completed".to_string(),
            date_range: range,
            generated_by: GENERATED_BY.to_string(),
        })
        .await
}

/// All reports, newest first.
pub async fn list<S: EntityStore + ?Sized>(store: &S) -> Result<Vec<Report>> {
    store.list_reports(ListOptions::newest_first()).await
}

/// Render a report as a Markdown document.
pub fn to_markdown(report: &Report) -> String {
    let data = &report.data;
    let mut out = format!(
        "# {}\nGenerated: {}\nDate Range: {} to {}\n\n",
        report.title,
        report.created_date.format("%Y-%m-%d %H:%M:%S UTC"),
        report.date_range.start_date,
        report.date_range.end_date,
    );

    out.push_str("## Executive Summary\n");
    out.push_str(
        data["executive_summary"]
            .as_str()
            .unwrap_or("No summary available"),
    );
    out.push_str("\n\n## Key Metrics\n");
    if let Some(metrics) = data["key_metrics"].as_object() {
        for (key, value) in metrics {
            let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
            out.push_str(&format!(
                "- {}: {}\n",
                key.replace('_', " ").to_uppercase(),
                value
            ));
        }
    }

    out.push_str("\n## Detailed Analysis\n");
    match data["detailed_analysis"].as_array() {
        Some(sections) if !sections.is_empty() => {
            let rendered: Vec<String> = sections
                .iter()
                .map(|s| {
                    format!(
                        "### {}\n{}",
                        s["section"].as_str().unwrap_or_default(),
                        s["content"].as_str().unwrap_or_default()
                    )
                })
                .collect();
            out.push_str(&rendered.join("\n\n"));
        }
        _ => out.push_str("No detailed analysis available"),
    }

    out.push_str("\n\n## Recommendations\n");
    out.push_str(&numbered(&data["recommendations"], "No recommendations available"));
    out.push_str("\n\n## Trends & Insights\n");
    out.push_str(&numbered(&data["trends"], "No trends available"));
    out.push('\n');
    out
}

fn numbered(items: &Value, fallback: &str) -> String {
    match items.as_array() {
        Some(items) if !items.is_empty() => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, item.as_str().unwrap_or_default()))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => fallback.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use crate::analytics::compute;
    use crate::store::memory::InMemoryStore;
    use crate::testing::{ts, ScriptedAi};

    fn sample_body() -> Value {
        json!({
            "executive_summary": "Usage is growing.",
            "key_metrics": { "growth_rate": "12%" },
            "detailed_analysis": [{ "section": "Search", "content": "Mostly hybrid." }],
            "recommendations": ["Add more tutorials"],
            "trends": []
        })
    }

    #[test]
    fn test_report_type_parse() {
        for kind in ReportType::ALL {
            assert_eq!(kind.as_str().parse::<ReportType>(), Ok(kind));
        }
        assert!("weekly".parse::<ReportType>().is_err());
        assert_eq!(ReportType::ProcessingStats.title(), "Processing Statistics Report");
    }

    #[test]
    fn test_prompt_embeds_stats_and_range() {
        let analytics = compute(&[], &[], 3, ts(0));
        let range = DateRange::last_days(ts(30), 30);
        let prompt = report_prompt(ReportType::SearchInsights, &analytics, &range);
        assert!(prompt.contains("comprehensive search insights report"));
        assert!(prompt.contains("Total Scraped Content: 3"));
        assert!(prompt.contains("Average Search Time: 0.00ms"));
        assert!(prompt.contains("Date Range: 2024-01-01 to 2024-01-31"));
    }

    #[tokio::test]
    async fn test_generate_persists_report() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![Ok(sample_body())]);
        let analytics = compute(&[], &[], 0, ts(0));
        let range = DateRange::last_days(ts(30), 30);

        let report = generate(&store, &ai, ReportType::UsageAnalytics, &analytics, range)
            .await
            .unwrap();

        assert_eq!(report.report_type, "usage_analytics");
        assert_eq!(report.title, "Usage Analytics Report");
        assert_eq!(report.generation_status, "completed");
        assert_eq!(report.generated_by, "System");
        assert_eq!(report.date_range, range);
        assert_eq!(list(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generate_failure_persists_nothing() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![Err(AiError::Disabled)]);
        let analytics = compute(&[], &[], 0, ts(0));
        let range = DateRange::last_days(ts(30), 30);

        assert!(generate(&store, &ai, ReportType::ContentSummary, &analytics, range)
            .await
            .is_err());
        assert!(list(&store).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_markdown_rendering() {
        let store = InMemoryStore::new();
        let ai = ScriptedAi::new(vec![Ok(sample_body())]);
        let analytics = compute(&[], &[], 0, ts(0));
        let report = generate(
            &store,
            &ai,
            ReportType::UsageAnalytics,
            &analytics,
            DateRange::last_days(ts(30), 30),
        )
        .await
        .unwrap();

        let md = to_markdown(&report);
        assert!(md.starts_with("# Usage Analytics Report\n"));
        assert!(md.contains("- GROWTH RATE: 12%"));
        assert!(md.contains("### Search\nMostly hybrid."));
        assert!(md.contains("1. Add more tutorials"));
        assert!(md.contains("No trends available"));
    }
}
