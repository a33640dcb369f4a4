use clap::{Parser, Subcommand};
use research_core::{
    constants::{DEFAULT_FOOTER_TEXT, DEFAULT_RESEARCH_DATA_DIR, REPORTS_DIR_NAME},
    normalize,
    render::render_to_file,
    FileReportStore, RenderOptions, ReportDraft, ReportStore, StoredReport,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "research")]
#[command(about = "LibreResearch report tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recover a structured report from raw model output
    Normalize {
        /// File holding the raw model response
        input: PathBuf,
    },
    /// Render a report JSON file to PDF
    Render {
        /// Report JSON (a draft or a stored report)
        input: PathBuf,
        /// Output PDF path
        output: PathBuf,
        /// Report topic (defaults to the stored report's topic)
        #[arg(long)]
        topic: Option<String>,
        /// Footer attribution line
        #[arg(long)]
        footer: Option<String>,
    },
    /// List an owner's stored reports
    List {
        /// Owner identity
        owner: String,
        /// Research data directory
        #[arg(long, default_value = DEFAULT_RESEARCH_DATA_DIR)]
        data_dir: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Normalize { input }) => {
            let raw = std::fs::read_to_string(&input)?;
            let normalized = normalize(&raw);
            match normalized.strategy {
                Some(strategy) => eprintln!("Recovered report using strategy: {}", strategy),
                None => eprintln!("Could not recover a report; showing fallback"),
            }
            println!("{}", serde_json::to_string_pretty(&normalized.draft)?);
        }
        Some(Commands::Render {
            input,
            output,
            topic,
            footer,
        }) => {
            let (stored_topic, draft) = load_report(&input)?;
            let topic = topic.or(stored_topic).unwrap_or_default();
            let options = RenderOptions::today(footer.unwrap_or_else(|| DEFAULT_FOOTER_TEXT.into()));
            let pages = render_to_file(&topic, &draft, &options, &output)?;
            println!("Wrote {} pages to {}", pages, output.display());
        }
        Some(Commands::List { owner, data_dir }) => {
            let store = FileReportStore::new(data_dir.join(REPORTS_DIR_NAME));
            let reports = store.list(&owner)?;
            if reports.is_empty() {
                println!("No reports found.");
            } else {
                for report in reports {
                    println!(
                        "ID: {}, Topic: {}, Created: {}",
                        report.id,
                        report.topic,
                        report.created_at.format("%Y-%m-%d %H:%M")
                    );
                }
            }
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

/// Reads either a stored report (with its topic) or a bare draft.
fn load_report(path: &Path) -> Result<(Option<String>, ReportDraft), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    if let Ok(report) = serde_json::from_value::<StoredReport>(value.clone()) {
        return Ok((Some(report.topic.clone()), report.draft()));
    }
    ReportDraft::from_value(value)
        .map(|draft| (None, draft))
        .ok_or_else(|| format!("{} does not contain a report object", path.display()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_report_accepts_draft_and_stored_report() {
        let dir = TempDir::new().unwrap();

        let draft_path = dir.path().join("draft.json");
        std::fs::write(&draft_path, r#"{"summary": "S", "sections": [], "sources": []}"#).unwrap();
        let (topic, draft) = load_report(&draft_path).unwrap();
        assert_eq!(topic, None);
        assert_eq!(draft.summary, "S");

        let stored = StoredReport::new(
            research_core::ResearchId::new(),
            "alice",
            "Glaciers",
            draft,
            chrono::Utc::now(),
        )
        .unwrap();
        let stored_path = dir.path().join("stored.json");
        std::fs::write(&stored_path, serde_json::to_string(&stored).unwrap()).unwrap();
        let (topic, draft) = load_report(&stored_path).unwrap();
        assert_eq!(topic.as_deref(), Some("Glaciers"));
        assert_eq!(draft.summary, "S");
    }

    #[test]
    fn test_load_report_rejects_non_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(load_report(&path).is_err());
    }
}
