use clap::{Args, Subcommand};
use uuid::Uuid;

use dreamclass_core::{ChangeChannel, ClassData, Classroom, RowStore, Student};

use super::{confirm, CommandError, OutputFormat};

#[derive(Args)]
pub struct StudentCommand {
    #[command(subcommand)]
    pub command: StudentSubcommand,
}

#[derive(Subcommand)]
pub enum StudentSubcommand {
    /// Add a student to the class
    Add {
        /// Student name
        name: String,

        /// Roll number (defaults to the next free number)
        #[arg(long, short)]
        number: Option<u32>,
    },

    /// List students in roll-number order
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Give or take stickers
    Sticker {
        /// Student ID (UUID) or roll number
        student: String,

        /// Stickers to add; negative to take away
        #[arg(allow_hyphen_values = true, default_value_t = 1)]
        delta: i64,
    },

    /// Remove a student
    Remove {
        /// Student ID (UUID) or roll number
        student: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl StudentCommand {
    pub fn run<B: RowStore + ChangeChannel>(
        &self,
        classroom: &mut Classroom<B>,
    ) -> Result<(), CommandError> {
        match &self.command {
            StudentSubcommand::Add { name, number } => {
                let number = number.unwrap_or_else(|| next_number(classroom.data()));
                let student = classroom.add_student(name.trim(), number)?;
                println!("Added student:");
                println!("{}", student);
                Ok(())
            }

            StudentSubcommand::List { format } => {
                let mut students: Vec<&Student> = classroom.data().students.iter().collect();
                students.sort_by_key(|s| s.number);

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&students)?);
                    }
                    OutputFormat::Text => {
                        if students.is_empty() {
                            println!("No students yet");
                            return Ok(());
                        }
                        for student in &students {
                            println!("{}", student);
                        }
                        println!("\nTotal: {} student(s)", students.len());
                    }
                }
                Ok(())
            }

            StudentSubcommand::Sticker { student, delta } => {
                let target = find_student(classroom.data(), student)?;
                let (id, name) = (target.id, target.name.clone());
                let stickers = classroom.adjust_stickers(id, *delta)?;
                println!("{} now has {} sticker(s)", name, stickers);
                Ok(())
            }

            StudentSubcommand::Remove { student, force } => {
                let target = find_student(classroom.data(), student)?;
                let (id, name) = (target.id, target.name.clone());

                if !force && !confirm(&format!("Remove student '{}'?", name))? {
                    println!("Cancelled.");
                    return Ok(());
                }

                classroom.remove_student(id)?;
                println!("Removed student '{}'", name);
                Ok(())
            }
        }
    }
}

/// Resolves a UUID or a roll number to a student.
fn find_student<'a>(data: &'a ClassData, reference: &str) -> Result<&'a Student, CommandError> {
    let found = if let Ok(id) = Uuid::parse_str(reference) {
        data.student(id)
    } else if let Ok(number) = reference.parse::<u32>() {
        data.student_by_number(number)
    } else {
        None
    };
    found.ok_or_else(|| CommandError::StudentNotFound(reference.to_string()))
}

fn next_number(data: &ClassData) -> u32 {
    data.students
        .iter()
        .map(|s| s.number)
        .max()
        .map_or(1, |n| n.saturating_add(1))
}
