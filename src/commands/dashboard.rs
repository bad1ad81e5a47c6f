use chrono::{Datelike, Local, NaiveDate};

use dreamclass_core::{ChangeChannel, ClassData, Classroom, RowStore};

use super::CommandError;

const UPCOMING_LIMIT: usize = 3;

/// Prints student count, this month's events, the sticker leader and
/// what is coming up.
pub fn run<B: RowStore + ChangeChannel>(classroom: &Classroom<B>) -> Result<(), CommandError> {
    print!("{}", render(classroom.data(), Local::now().date_naive()));
    Ok(())
}

fn render(data: &ClassData, today: NaiveDate) -> String {
    let mut out = String::new();
    out.push_str("Dashboard\n");
    out.push_str("=========\n\n");

    let this_month = data.events_in_month(today.year(), today.month());
    let star = match data.top_student() {
        Some(top) if top.stickers > 0 => format!("{} ({} sticker(s))", top.name, top.stickers),
        _ => "-".to_string(),
    };
    out.push_str(&format!("{:<19}{}\n", "Students:", data.students.len()));
    out.push_str(&format!("{:<19}{}\n", "Events this month:", this_month.len()));
    out.push_str(&format!("{:<19}{}\n", "Sticker star:", star));

    out.push_str("\nUpcoming\n--------\n");
    let upcoming = data.upcoming_events(today, UPCOMING_LIMIT);
    if upcoming.is_empty() {
        out.push_str("Nothing scheduled\n");
    }
    for event in upcoming {
        out.push_str(&format!("{}\n", event));
    }
    out
}
