use std::fmt::Write;

use comfy_table::Cell;

use crate::insights::{HealthReport, RankedPair};

use super::styling::{bright, cyan, dim};
use super::tables::{color_coded_success_cell, create_table, header};

/// How many failure messages to list per workflow.
const TOP_MESSAGES: usize = 10;

/// Renders a human-readable summary of the report.
///
/// Rates are colour coded: green above 80%, yellow from 50%, red below.
pub fn render_summary(report: &HealthReport) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let mut overview = create_table();
    overview.set_header(header(&["Repository", "Window", "Job runs", "Success rate"]));
    overview.add_row(vec![
        Cell::new(&report.repository),
        Cell::new(format!(
            "{} → {}",
            report.window_start.format("%Y-%m-%d %H:%M"),
            report.window_end.format("%Y-%m-%d %H:%M")
        )),
        Cell::new(report.total_job_runs),
        color_coded_success_cell(report.global_success_rate),
    ]);
    let _ = writeln!(output, "{overview}\n");

    add_section_header(&mut output, "🔁", "Workflow success rates");
    let _ = writeln!(
        output,
        "{}\n",
        rate_table("Workflow", &report.workflow_success_rates)
    );

    add_section_header(&mut output, "🧪", "Job success rates");
    let _ = writeln!(output, "{}\n", rate_table("Job", &report.job_success_rates));

    add_section_header(&mut output, "🔥", "Failure messages");
    if report.workflows.is_empty() {
        let _ = writeln!(output, "  {}", dim("No annotations collected"));
    }
    for workflow in &report.workflows {
        let _ = writeln!(output, "  {}", cyan(&workflow.name));
        let mut table = create_table();
        table.set_header(header(&["Message", "Occurrences"]));
        for pair in workflow.messages.iter().take(TOP_MESSAGES) {
            table.add_row(vec![Cell::new(&pair.key), Cell::new(pair.value)]);
        }
        let _ = writeln!(output, "{table}\n");
    }

    output
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn rate_table(label: &str, rates: &[RankedPair]) -> comfy_table::Table {
    let mut table = create_table();
    table.set_header(header(&[label, "Success rate"]));
    for pair in rates {
        table.add_row(vec![
            Cell::new(&pair.key),
            color_coded_success_cell(pair.value),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insights::WorkflowSummary;
    use chrono::{TimeZone, Utc};

    fn report() -> HealthReport {
        HealthReport {
            provider: "GitHub Actions".to_string(),
            repository: "linkerd/linkerd2".to_string(),
            window_start: Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap(),
            window_end: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            collected_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            total_job_runs: 12,
            total_annotations: 3,
            global_success_rate: 75,
            workflow_success_rates: vec![RankedPair::new("Integration", 75)],
            job_success_rates: vec![
                RankedPair::new("kind", 50),
                RankedPair::new("Others", 100),
            ],
            workflows: vec![WorkflowSummary {
                id: "Integration".to_string(),
                name: "Integration".to_string(),
                messages: vec![RankedPair::new("pod never became ready", 3)],
            }],
        }
    }

    #[test]
    fn test_summary_lists_every_table() {
        let summary = console::strip_ansi_codes(&render_summary(&report())).to_string();
        assert!(summary.contains("linkerd/linkerd2"));
        assert!(summary.contains("Workflow success rates"));
        assert!(summary.contains("kind"));
        assert!(summary.contains("Others"));
        assert!(summary.contains("pod never became ready"));
        assert!(summary.contains("75%"));
    }

    #[test]
    fn test_summary_without_annotations() {
        let mut report = report();
        report.workflows.clear();
        let summary = console::strip_ansi_codes(&render_summary(&report)).to_string();
        assert!(summary.contains("No annotations collected"));
    }
}
