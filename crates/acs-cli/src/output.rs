use acs_core::domain::AccessLogEntry;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Trait for formatting CLI output
pub trait OutputFormatter {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    fn info(&self, message: &str);
    fn print_json(&self, value: &serde_json::Value);
    fn print_entries(&self, entries: &[AccessLogEntry]);
}

/// Human-readable output formatter with checkmarks and aligned columns
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn success(&self, message: &str) {
        println!("\u{2713} {}", message);
    }
    fn error(&self, message: &str) {
        eprintln!("\u{2717} Error: {}", message);
    }
    fn info(&self, message: &str) {
        println!("  {}", message);
    }
    fn print_json(&self, _value: &serde_json::Value) {}
    fn print_entries(&self, entries: &[AccessLogEntry]) {
        println!(
            "  {:>6}  {:<19}  {:<12}  {:<12}  {:<12}  {:<7}  Reason",
            "Id", "Timestamp", "Badge", "Employee", "Resource", "Verdict"
        );
        for entry in entries {
            println!("  {}", entry_row(entry));
        }
    }
}

/// JSON output formatter
pub struct JsonFormatter;

impl OutputFormatter for JsonFormatter {
    fn success(&self, message: &str) {
        println!(
            "{}",
            serde_json::json!({"success": true, "message": message})
        );
    }
    fn error(&self, message: &str) {
        eprintln!(
            "{}",
            serde_json::json!({"success": false, "error": message})
        );
    }
    fn info(&self, _message: &str) {}
    fn print_json(&self, value: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_default()
        );
    }
    fn print_entries(&self, entries: &[AccessLogEntry]) {
        let value = serde_json::to_value(entries).unwrap_or_default();
        self.print_json(&value);
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

/// One table row for a log entry; absent ids print as `-`
pub fn entry_row(entry: &AccessLogEntry) -> String {
    let dash = |s: &str| if s.is_empty() { "-".to_string() } else { s.to_string() };
    format!(
        "{:>6}  {:<19}  {:<12}  {:<12}  {:<12}  {:<7}  {}",
        entry
            .id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
        entry.timestamp().format("%Y-%m-%d %H:%M:%S").to_string(),
        dash(entry.badge_id()),
        entry
            .employee_id()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
        dash(entry.resource_id()),
        entry.decision().as_str(),
        entry.reason_code().as_str(),
    )
}
