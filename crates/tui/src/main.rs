mod renderer;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context as _, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tripchart_core::config::{DosePolicy, ReportConfig};
use tripchart_core::parsers::table::{read_metadata_path, read_table_path};
use tripchart_core::report::{metadata_markdown, narrative_markdown};
use tripchart_core::selection::{SelectionController, SelectionState};
use tripchart_core::svg::render_chart_set_svg;
use tripchart_core::{Metadata, Session};

use renderer::{App, Panels};

const EXPORT_WIDTH: f64 = 960.0;
const EXPORT_CHART_HEIGHT: f64 = 200.0;

/// Charts a trip report's metric ratings over time, with dose markers.
#[derive(Debug, Parser)]
#[command(name = "tripchart", version)]
struct Args {
    /// Timeline table: `;`-separated time, dose, comment and metric columns.
    #[arg(long, value_name = "PATH")]
    timeline: PathBuf,
    /// Single-row metadata table.
    #[arg(long, value_name = "PATH")]
    metadata: Option<PathBuf>,
    /// Markdown shown as-is in the substance panel.
    #[arg(long, value_name = "PATH")]
    substance: Option<PathBuf>,
    /// Metrics to show at start, comma separated. Unknown names are an error.
    #[arg(long, value_delimiter = ',')]
    metrics: Option<Vec<String>>,
    /// Fail on a malformed dose cell instead of skipping the row.
    #[arg(long)]
    strict_doses: bool,
    /// Write the selected charts as SVG and exit.
    #[arg(long, value_name = "PATH")]
    export_svg: Option<PathBuf>,
    /// Write the narrative, metadata and substance panels as markdown and exit.
    #[arg(long, value_name = "PATH")]
    export_markdown: Option<PathBuf>,
    /// Dark palette for the SVG export.
    #[arg(long)]
    dark: bool,
    /// Where the interactive viewer logs to. `RUST_LOG` sets the level.
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn exporting(&self) -> bool {
        self.export_svg.is_some() || self.export_markdown.is_some()
    }

    fn config(&self) -> ReportConfig {
        ReportConfig {
            dose_policy: if self.strict_doses {
                DosePolicy::Abort
            } else {
                DosePolicy::Skip
            },
            ..ReportConfig::default()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = args.config();
    let table = read_table_path(&args.timeline)
        .with_context(|| format!("reading {}", args.timeline.display()))?;
    let session = Session::load(&table, config.dose_policy)
        .with_context(|| format!("loading {}", args.timeline.display()))?;

    let metadata = match &args.metadata {
        Some(path) => {
            read_metadata_path(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => Metadata::default(),
    };
    let substance = match &args.substance {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => String::new(),
    };

    let controller = match &args.metrics {
        Some(names) => SelectionController::new(
            session.timeline().clone(),
            session.doses().clone(),
            SelectionState::new(names),
        )?,
        None => SelectionController::for_session(&session, &config.default_metrics)?,
    };

    let panels = Panels {
        narrative: narrative_markdown(session.timeline()),
        metadata: metadata_markdown(&metadata),
        substance,
    };

    if args.exporting() {
        if let Some(path) = &args.export_svg {
            let svg = render_chart_set_svg(
                controller.charts(),
                EXPORT_WIDTH,
                EXPORT_CHART_HEIGHT,
                args.dark,
            );
            write_export(path, &svg)?;
        }
        if let Some(path) = &args.export_markdown {
            write_export(path, &panels.to_markdown())?;
        }
        return Ok(());
    }

    let status = match session.skipped_doses().len() {
        0 => String::new(),
        n => format!("{n} malformed dose rows skipped"),
    };
    renderer::run(App::new(controller, panels, status))
}

/// Export mode logs to stderr. The interactive viewer owns the terminal, so
/// it only logs when given a file.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.exporting() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("creating log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

fn write_export(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), bytes = contents.len(), "export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripchart_protocol::MetricName;

    #[test]
    fn parses_metric_list() {
        let args = Args::try_parse_from([
            "tripchart",
            "--timeline",
            "t.csv",
            "--metrics",
            "anxiety,euphoria",
            "--strict-doses",
        ])
        .unwrap();
        assert_eq!(
            args.metrics.as_deref(),
            Some(&["anxiety".to_string(), "euphoria".to_string()][..])
        );
        assert_eq!(args.config().dose_policy, DosePolicy::Abort);
        assert!(!args.exporting());
    }

    #[test]
    fn default_config_keeps_default_metrics() {
        let args = Args::try_parse_from(["tripchart", "--timeline", "t.csv"]).unwrap();
        let config = args.config();
        assert_eq!(config.dose_policy, DosePolicy::Skip);
        assert_eq!(
            config.default_metrics,
            ["intensity", "euphoria", "introspection", "anxiety"]
                .map(|name| MetricName::new(name).unwrap())
                .to_vec()
        );
    }
}
