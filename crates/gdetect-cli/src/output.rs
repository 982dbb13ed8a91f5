//! Output formatting for gdetect (table, json)

use clap::ValueEnum;
use colored::Colorize;
use gdetect_client::AnalysisResult;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Key/value table (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Human-facing report links of a result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_view_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expert_view_url: Option<String>,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Whether decorations (spinners, banners) should be shown
    pub fn is_interactive(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Table
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print the uuid of an accepted submission
    pub fn print_uuid(&self, uuid: &str) {
        match self.format {
            OutputFormat::Table => println!("{}", uuid),
            OutputFormat::Json => println!("{}", serde_json::json!({ "uuid": uuid })),
        }
    }

    /// Print an analysis result in the configured format
    pub fn print_result(&self, result: &AnalysisResult, urls: &ViewUrls) {
        match self.format {
            OutputFormat::Table => {
                println!("{}", render_table(&result_rows(result, urls)));
                if result.done {
                    println!("{}", verdict(result));
                }
            }
            OutputFormat::Json => {
                let mut value = serde_json::to_value(result).unwrap_or_default();
                if let (Some(map), Ok(serde_json::Value::Object(links))) =
                    (value.as_object_mut(), serde_json::to_value(urls))
                {
                    map.extend(links);
                }
                self.print_json(&value);
            }
        }
    }

    /// Print a raw JSON document
    pub fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

// =============================================================================
// Display types
// =============================================================================

/// One line of the result table
#[derive(Debug, Tabled, Serialize, PartialEq, Eq)]
pub struct FieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl FieldRow {
    fn new(field: &str, value: impl ToString) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

/// Rows shown for a result, skipping fields the service left empty
pub fn result_rows(result: &AnalysisResult, urls: &ViewUrls) -> Vec<FieldRow> {
    let mut rows = vec![
        FieldRow::new("UUID", &result.uuid),
        FieldRow::new("Done", result.done),
    ];

    let text_fields = [
        ("SHA256", &result.sha256),
        ("SHA1", &result.sha1),
        ("MD5", &result.md5),
        ("SSDeep", &result.ssdeep),
        ("File type", &result.filetype),
    ];
    rows.extend(
        text_fields
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(field, value)| FieldRow::new(field, value)),
    );

    if result.size > 0 {
        rows.push(FieldRow::new("Size", result.size));
    }
    if !result.filenames.is_empty() {
        rows.push(FieldRow::new("Filenames", result.filenames.join(", ")));
    }
    if result.done {
        rows.push(FieldRow::new("Malware", result.is_malware));
        rows.push(FieldRow::new("Score", result.score));
    }
    if !result.malwares.is_empty() {
        rows.push(FieldRow::new("Malwares", result.malwares.join(", ")));
    }
    if result.duration > 0 {
        rows.push(FieldRow::new("Duration (ms)", result.duration));
    }
    if !result.error.is_empty() {
        rows.push(FieldRow::new("Error", &result.error));
    }

    let mut errors: Vec<_> = result.errors.iter().collect();
    errors.sort();
    for (service, error) in errors {
        rows.push(FieldRow::new(&format!("Error ({service})"), error));
    }

    if let Some(url) = &urls.token_view_url {
        rows.push(FieldRow::new("Token view", url));
    }
    if let Some(url) = &urls.expert_view_url {
        rows.push(FieldRow::new("Expert view", url));
    }
    rows
}

fn render_table(rows: &[FieldRow]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// One-line verdict, colored by outcome
fn verdict(result: &AnalysisResult) -> String {
    if result.is_malware() {
        let names = if result.malwares.is_empty() {
            String::new()
        } else {
            format!(" ({})", result.malwares.join(", "))
        };
        format!("MALWARE{names}").red().bold().to_string()
    } else {
        "No malware detected".green().to_string()
    }
}
