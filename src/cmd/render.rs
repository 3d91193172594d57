//! Terminal output for boards, members, calendar, account and notices.

use chrono::{Local, NaiveDate};
use console::style;

use taskflow::board::analytics::AnalyticsSummary;
use taskflow::board::models::{
    Column, Event, Notice, NoticeLevel, Priority, Profile, SettingKey, Task, TeamMember,
    UserSettings,
};

const WRAP_WIDTH: usize = 72;

pub fn short_id(task: &Task) -> String {
    task.id.simple().to_string()[..8].to_string()
}

fn priority_badge(priority: Priority) -> console::StyledObject<&'static str> {
    match priority {
        Priority::High => style(priority.label()).red(),
        Priority::Medium => style(priority.label()).yellow(),
        Priority::Low => style(priority.label()).green(),
    }
}

pub fn print_task(task: &Task) {
    let mut line = format!(
        "  {} {}  {}",
        style(short_id(task)).dim(),
        task.title,
        priority_badge(task.priority)
    );
    if let Some(assignee) = &task.assignee {
        line.push_str(&format!("  {}", style(format!("@{}", assignee)).cyan()));
    }
    println!("{}", line);
    if let Some(description) = &task.description {
        let options = textwrap::Options::new(WRAP_WIDTH)
            .initial_indent("           ")
            .subsequent_indent("           ");
        for wrapped in textwrap::wrap(description, options) {
            println!("{}", style(wrapped).dim());
        }
    }
}

pub fn print_board(columns: &[Column]) {
    for column in columns {
        println!();
        println!(
            "{} {}",
            style(&column.title).bold().cyan(),
            style(format!("({})", column.tasks.len())).dim()
        );
        if column.tasks.is_empty() {
            println!("  {}", style("No tasks").dim());
        }
        for task in &column.tasks {
            print_task(task);
        }
    }
    println!();
}

pub fn print_members(members: &[TeamMember]) {
    if members.is_empty() {
        println!("No team members yet. Invite one with 'taskflow invite'.");
        return;
    }
    for member in members {
        println!(
            "  {:<28} {:<20} {:<8} {}",
            member.email,
            member.full_name.as_deref().unwrap_or("-"),
            member.role.as_deref().unwrap_or("member"),
            style(member.status.as_deref().unwrap_or("active")).dim()
        );
    }
}

pub fn print_events(days: &[(NaiveDate, Vec<&Event>)]) {
    if days.is_empty() {
        println!("No upcoming events. Add one with 'taskflow event add'.");
        return;
    }
    for (day, events) in days {
        println!();
        println!("{}", style(day.format("%a %d %b %Y")).bold().cyan());
        for event in events {
            let start = event.start_date.with_timezone(&Local).format("%H:%M");
            let span = match event.end_date {
                Some(end) => format!("{}-{}", start, end.with_timezone(&Local).format("%H:%M")),
                None => start.to_string(),
            };
            println!(
                "  {:<11} {}  {}",
                style(span).dim(),
                event.title,
                priority_badge(event.priority())
            );
            if let Some(description) = &event.description {
                println!("              {}", style(description).dim());
            }
        }
    }
    println!();
}

pub fn print_profile(profile: &Profile) {
    println!();
    println!("{}", style("Profile").bold().cyan());
    println!("  Name:   {}", profile.full_name.as_deref().unwrap_or("-"));
    println!("  Email:  {}", profile.email.as_deref().unwrap_or("-"));
    println!("  Avatar: {}", profile.avatar_url.as_deref().unwrap_or("-"));
    println!();
}

pub fn print_settings(settings: &UserSettings) {
    println!();
    println!("{}", style("Settings").bold().cyan());
    for key in SettingKey::ALL {
        let value = if settings.get(key) {
            style("on").green()
        } else {
            style("off").dim()
        };
        println!("  {:<28} {}", key.as_str(), value);
    }
    println!();
}

pub fn print_summary(summary: &AnalyticsSummary) {
    println!();
    println!("{}", style("Board statistics").bold().cyan());
    println!("  Total tasks:      {}", summary.total_tasks);
    println!("  Completed:        {}", summary.completed_tasks);
    println!("  Pending:          {}", summary.pending_tasks);
    println!("  Completion rate:  {}%", summary.completion_rate);
    println!("  Created (7 days): {}", summary.tasks_this_week);
    println!("  Created (30 days): {}", summary.tasks_this_month);
    println!();
    println!("{}", style("By status").bold());
    for bucket in &summary.tasks_by_status {
        println!("  {:<12} {}", bucket.label, bucket.count);
    }
    println!("{}", style("By priority").bold());
    for bucket in &summary.tasks_by_priority {
        println!("  {:<12} {}", bucket.label, bucket.count);
    }
    println!();
}

/// Print drained notices: info to stdout, errors to stderr.
pub fn print_notices(notices: Vec<Notice>) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => println!(
                "{} {}",
                style(format!("{}:", notice.title)).green().bold(),
                notice.message
            ),
            NoticeLevel::Error => eprintln!(
                "{} {}",
                style(format!("{}:", notice.title)).red().bold(),
                notice.message
            ),
        }
    }
}
