use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Subcommand};
use uuid::Uuid;

use dreamclass_core::{CalendarEvent, ChangeChannel, Classroom, EventKind, RowStore};

use super::{CommandError, OutputFormat};

#[derive(Args)]
pub struct EventCommand {
    #[command(subcommand)]
    pub command: EventSubcommand,
}

#[derive(Subcommand)]
pub enum EventSubcommand {
    /// Add an event to the school calendar
    Add {
        /// Date (YYYY-MM-DD)
        date: String,

        /// Title
        title: String,

        /// Event type (holiday, event, exam, other)
        #[arg(long = "type", short = 't', value_name = "TYPE", default_value = "event")]
        kind: String,
    },

    /// List events for a month
    List {
        /// Month (YYYY-MM), defaults to the current month
        #[arg(long, short)]
        month: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Remove an event
    Remove {
        /// Event ID (UUID)
        id: String,
    },
}

impl EventCommand {
    pub fn run<B: RowStore + ChangeChannel>(
        &self,
        classroom: &mut Classroom<B>,
    ) -> Result<(), CommandError> {
        match &self.command {
            EventSubcommand::Add { date, title, kind } => {
                let date = parse_date(date)?;
                let kind: EventKind = kind.parse().map_err(CommandError::InvalidKind)?;

                let event = classroom.add_event(date, title.trim(), kind)?;
                println!("Added event:");
                println!("{}", event);
                println!("  id: {}", event.id);
                Ok(())
            }

            EventSubcommand::List { month, format } => {
                let (year, month) = match month {
                    Some(m) => parse_month(m)?,
                    None => {
                        let today = Local::now().date_naive();
                        (today.year(), today.month())
                    }
                };
                let events: Vec<&CalendarEvent> =
                    classroom.data().events_in_month(year, month);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&events)?);
                    }
                    OutputFormat::Text => {
                        println!("{}-{:02}", year, month);
                        println!("{}", "-".repeat(7));
                        if events.is_empty() {
                            println!("No events");
                            return Ok(());
                        }
                        for event in &events {
                            println!("{}", event);
                        }
                        println!("\nTotal: {} event(s)", events.len());
                    }
                }
                Ok(())
            }

            EventSubcommand::Remove { id } => {
                let uuid =
                    Uuid::parse_str(id).map_err(|_| CommandError::EventNotFound(id.clone()))?;
                let event = classroom.remove_event(uuid)?;
                println!("Removed event '{}' on {}", event.title, event.date);
                Ok(())
            }
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CommandError::InvalidDate(raw.to_string()))
}

/// Parses `YYYY-MM` into year and month.
fn parse_month(raw: &str) -> Result<(i32, u32), CommandError> {
    let first_day = NaiveDate::parse_from_str(&format!("{}-01", raw), "%Y-%m-%d")
        .map_err(|_| CommandError::InvalidMonth(raw.to_string()))?;
    Ok((first_day.year(), first_day.month()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month("2026-03").unwrap(), (2026, 3));
        assert!(matches!(
            parse_month("2026-13"),
            Err(CommandError::InvalidMonth(_))
        ));
        assert!(parse_month("March").is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-05-05").unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 5).unwrap()
        );
        assert!(matches!(
            parse_date("05/05/2026"),
            Err(CommandError::InvalidDate(_))
        ));
    }
}
