use crate::{Cli, OutputFormat};
use chrono::{DateTime, Utc};
use colored::*;
use serde::Serialize;
use tabled::{Table, Tabled};

pub trait OutputDisplay {
    fn display(&self, cli: &Cli) -> anyhow::Result<()>;
}

impl<T> OutputDisplay for Vec<T>
where
    T: Tabled + Serialize,
{
    fn display(&self, cli: &Cli) -> anyhow::Result<()> {
        match cli.format {
            OutputFormat::Table => {
                if self.is_empty() {
                    println!("{}", "No items found".yellow());
                } else {
                    println!("{}", Table::new(self));
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(self)?);
            }
        }
        Ok(())
    }
}

impl OutputDisplay for serde_json::Value {
    fn display(&self, _cli: &Cli) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(self)?);
        Ok(())
    }
}

pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn display_single<T: Serialize>(item: &T, cli: &Cli) -> anyhow::Result<()> {
    let json_value = serde_json::to_value(item)?;
    json_value.display(cli)
}

/// Unix seconds as a UTC timestamp, `-` when absent.
pub fn format_timestamp(seconds: Option<i64>) -> String {
    seconds
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

pub fn format_lag(lag_seconds: Option<f64>) -> String {
    match lag_seconds {
        Some(lag) => format!("{}s", lag),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(Some(0)), "1970-01-01 00:00:00");
        assert_eq!(format_timestamp(Some(1_700_000_000)), "2023-11-14 22:13:20");
        assert_eq!(format_timestamp(None), "-");
    }

    #[test]
    fn test_format_lag() {
        assert_eq!(format_lag(Some(3.0)), "3s");
        assert_eq!(format_lag(Some(-1.0)), "-1s");
        assert_eq!(format_lag(None), "-");
    }
}
