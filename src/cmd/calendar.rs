//! Calendar commands: `taskflow cal`, `taskflow event add`.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};

use taskflow::board::calendar::{by_day, upcoming};
use taskflow::board::models::{Event, NewEvent, Priority};
use taskflow::config::TaskflowConfig;

use super::render::{print_events, print_notices};
use super::workspace::Workspace;

const LOCAL_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse a start or end time. RFC 3339 keeps its offset; anything else is
/// read as local time, and a bare date means local midnight.
pub fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
        });
    let Some(naive) = naive else {
        bail!("Invalid time '{}': use YYYY-MM-DD [HH:MM] or RFC 3339", raw);
    };
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .with_context(|| format!("'{}' does not exist in the local time zone", raw))
}

pub async fn cmd_cal(config: &TaskflowConfig, all: bool) -> Result<()> {
    let workspace = Workspace::open(config).await?;
    let mut events = workspace.event_store();
    let loaded = events.load(&workspace.session).await.map(|_| ());
    print_notices(events.take_notices());
    loaded?;

    let shown: Vec<&Event> = if all {
        events.events().iter().collect()
    } else {
        upcoming(events.events(), Utc::now())
    };
    print_events(&by_day(shown, &Local));
    Ok(())
}

pub async fn cmd_event_add(
    config: &TaskflowConfig,
    title: String,
    start: &str,
    end: Option<&str>,
    description: Option<String>,
    priority: Option<Priority>,
) -> Result<()> {
    let input = NewEvent {
        title,
        description,
        start_date: parse_when(start)?,
        end_date: end.map(parse_when).transpose()?,
        priority: priority.unwrap_or_default(),
    };
    let workspace = Workspace::open(config).await?;
    let mut events = workspace.event_store();
    let result = events.add(&workspace.session, input).await;
    print_notices(events.take_notices());
    let event = result?;
    print_events(&by_day([&event], &Local));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfc3339_keeps_offset() {
        let at = parse_when("2030-01-02T10:00:00+02:00").unwrap();
        assert_eq!(at.to_rfc3339(), "2030-01-02T08:00:00+00:00");
    }

    #[test]
    fn test_local_forms_agree() {
        let spaced = parse_when("2030-01-02 09:30").unwrap();
        let t_form = parse_when("2030-01-02T09:30").unwrap();
        assert_eq!(spaced, t_form);
        let midnight = parse_when("2030-01-02").unwrap();
        assert_eq!((spaced - midnight).num_minutes(), 9 * 60 + 30);
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = parse_when("next tuesday").unwrap_err();
        assert!(err.to_string().contains("Invalid time"));
    }
}
