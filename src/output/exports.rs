use std::io::Write;

use minijinja::{context, Environment};

use crate::config::OutputFormat;
use crate::error::Result;
use crate::insights::HealthReport;

use super::summary::render_summary;

/// Writes the report in the requested format.
///
/// - HTML: self-contained static page (default)
/// - JSON: programmatic access
/// - Summary: colour-coded terminal tables
pub fn export_report(
    report: &HealthReport,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Html => export_html(report, output),
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Summary => {
            write!(output, "{}", render_summary(report))?;
            Ok(())
        }
    }
}

fn export_json(report: &HealthReport, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}

const REPORT_TEMPLATE: &str = "report.html";

fn rate_class(rate: u32) -> &'static str {
    if rate > 80 {
        "good"
    } else if rate >= 50 {
        "warning"
    } else {
        "bad"
    }
}

/// Template environment for the HTML page. The `.html` name turns on
/// automatic HTML escaping of every interpolated value.
fn templates() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.add_filter("rate_class", rate_class);
    env.add_template(REPORT_TEMPLATE, include_str!("templates/report.html"))?;
    Ok(env)
}

fn export_html(report: &HealthReport, output: &mut dyn Write) -> Result<()> {
    let env = templates()?;
    let page = env.get_template(REPORT_TEMPLATE)?.render(context! {
        report => report,
        window_start => report.window_start.to_rfc2822(),
        window_end => report.window_end.to_rfc2822(),
        generated => report.collected_at.to_rfc3339(),
    })?;

    writeln!(output, "{page}")?;
    Ok(())
}
