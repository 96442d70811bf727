//! Schedule engine - resolves operator rules into a desired state
//!
//! Given all schedule entries targeting a display, the engine determines
//! which entries are active at a point in time, ranks them and derives
//! the desired power and content. When no entry is active, or an active
//! intent cannot be satisfied, the engine falls back to the fail-safe
//! default: power off, no content.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc};
use signage_domain::{DesiredState, DisplayContent, Result, ScheduleEntry};
use tracing::{debug, warn};

use super::ports::{ContentRepository, ScheduleRepository};

/// An entry active at the evaluation instant, with the concrete window
/// it produces on that day.
#[derive(Debug, Clone)]
struct ActiveEntry {
    entry: ScheduleEntry,
    window_len: Duration,
}

/// Derives desired display states from schedule entries.
pub struct ScheduleEngine {
    schedules: Arc<dyn ScheduleRepository>,
    contents: Arc<dyn ContentRepository>,
}

impl ScheduleEngine {
    pub fn new(schedules: Arc<dyn ScheduleRepository>, contents: Arc<dyn ContentRepository>) -> Self {
        Self { schedules, contents }
    }

    /// Resolve the desired state of a display at a point in time.
    ///
    /// Ranking among simultaneously active entries is deterministic:
    /// higher priority first, then the narrower concrete window, then
    /// the more recently created entry.
    pub async fn desired_state(&self, display_id: &str, at: DateTime<Utc>) -> Result<DesiredState> {
        let entries = self.schedules.entries_for_display(display_id).await?;

        let mut active: Vec<ActiveEntry> = Vec::new();
        for entry in entries {
            if let Err(e) = entry.validate() {
                warn!(entry = %entry.id, error = %e, "skipping invalid schedule entry");
                continue;
            }
            if let Some((lo, hi)) = concrete_window(&entry, at) {
                active.push(ActiveEntry { entry, window_len: hi - lo });
            }
        }

        if active.is_empty() {
            debug!(display = %display_id, "no active schedule entry; fail-safe default");
            return Ok(DesiredState::off());
        }

        active.sort_by(|a, b| {
            b.entry
                .priority
                .cmp(&a.entry.priority)
                .then_with(|| a.window_len.cmp(&b.window_len))
                .then_with(|| b.entry.created_at.cmp(&a.entry.created_at))
        });

        let winner = &active[0].entry;
        if !winner.power {
            return Ok(DesiredState { power: false, content: None });
        }
        if winner.content_id.is_none() {
            return Ok(DesiredState { power: true, content: None });
        }

        // The winner references content; use the first valid content item
        // down the ranking. If none resolves, showing a screen with no
        // usable content is worse than showing none: fail safe.
        for candidate in &active {
            let Some(content_id) = candidate.entry.content_id.as_deref() else {
                continue;
            };
            match self.contents.get(content_id).await? {
                Some(item) if item.is_valid_at(at) => {
                    return Ok(DesiredState { power: true, content: Some(DisplayContent::Item(item)) });
                }
                Some(_) => {
                    debug!(entry = %candidate.entry.id, content = %content_id, "content outside validity bounds");
                }
                None => {
                    warn!(entry = %candidate.entry.id, content = %content_id, "schedule references missing content");
                }
            }
        }

        warn!(display = %display_id, "no valid content resolvable for active schedule; fail-safe default");
        Ok(DesiredState::off())
    }
}

/// The concrete window an entry produces around `at`, if the entry is
/// active at that instant.
///
/// Entries with daily times produce that day's daily slice, entries with
/// only weekday recurrence produce the matching calendar day, and plain
/// entries produce their whole absolute window. Slices are clamped to
/// the absolute window.
fn concrete_window(entry: &ScheduleEntry, at: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if at < entry.window_start || at >= entry.window_end {
        return None;
    }
    if !entry.recurs_on(at.weekday()) {
        return None;
    }

    let day = at.date_naive();
    let (lo, hi) = match (entry.daily_start, entry.daily_stop) {
        (Some(start), Some(stop)) => {
            (day.and_time(start).and_utc(), day.and_time(stop).and_utc())
        }
        _ if entry.weekdays.is_some() => (
            day.and_time(NaiveTime::MIN).and_utc(),
            (day + Duration::days(1)).and_time(NaiveTime::MIN).and_utc(),
        ),
        _ => (entry.window_start, entry.window_end),
    };

    let lo = lo.max(entry.window_start);
    let hi = hi.min(entry.window_end);
    if at >= lo && at < hi {
        Some((lo, hi))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use chrono::{TimeZone, Weekday};
    use parking_lot::Mutex;
    use signage_domain::ContentItem;

    use super::*;

    fn ts(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, h, m, 0).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn entry(id: &str) -> ScheduleEntry {
        ScheduleEntry {
            id: id.into(),
            display_id: "lobby-1".into(),
            window_start: ts(1, 0, 0),
            window_end: ts(31, 0, 0),
            daily_start: None,
            daily_stop: None,
            weekdays: None,
            power: true,
            content_id: None,
            priority: 0,
            created_at: ts(1, 0, 0),
        }
    }

    struct FixedRepos {
        entries: Mutex<Vec<ScheduleEntry>>,
        contents: Mutex<Vec<ContentItem>>,
    }

    impl FixedRepos {
        fn new(entries: Vec<ScheduleEntry>, contents: Vec<ContentItem>) -> Arc<Self> {
            Arc::new(Self { entries: Mutex::new(entries), contents: Mutex::new(contents) })
        }
    }

    #[async_trait]
    impl ScheduleRepository for FixedRepos {
        async fn entries_for_display(&self, display_id: &str) -> Result<Vec<ScheduleEntry>> {
            Ok(self
                .entries
                .lock()
                .iter()
                .filter(|e| e.display_id == display_id)
                .cloned()
                .collect())
        }

        async fn upsert(&self, entry: &ScheduleEntry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() < before)
        }
    }

    #[async_trait]
    impl ContentRepository for FixedRepos {
        async fn get(&self, id: &str) -> Result<Option<ContentItem>> {
            Ok(self.contents.lock().iter().find(|c| c.id == id).cloned())
        }

        async fn upsert(&self, item: &ContentItem) -> Result<()> {
            self.contents.lock().push(item.clone());
            Ok(())
        }

        async fn delete(&self, id: &str) -> Result<bool> {
            let mut contents = self.contents.lock();
            let before = contents.len();
            contents.retain(|c| c.id != id);
            Ok(contents.len() < before)
        }
    }

    fn engine(entries: Vec<ScheduleEntry>, contents: Vec<ContentItem>) -> ScheduleEngine {
        let repos = FixedRepos::new(entries, contents);
        ScheduleEngine::new(repos.clone(), repos)
    }

    fn content(id: &str) -> ContentItem {
        ContentItem {
            id: id.into(),
            name: format!("Content {id}"),
            payload: serde_json::json!({"url": format!("https://cdn.example/{id}")}),
            valid_from: None,
            valid_until: None,
        }
    }

    #[tokio::test]
    async fn no_entries_yields_fail_safe_default() {
        let e = engine(vec![], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert_eq!(state, DesiredState::off());
    }

    #[tokio::test]
    async fn active_power_entry_turns_display_on() {
        let e = engine(vec![entry("on")], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power);
        assert!(state.content.is_none());
    }

    #[tokio::test]
    async fn entry_outside_window_is_inactive() {
        let mut late = entry("later");
        late.window_start = ts(10, 0, 0);
        let e = engine(vec![late], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert_eq!(state, DesiredState::off());
    }

    #[tokio::test]
    async fn higher_priority_wins() {
        let mut base = entry("base");
        base.priority = 0;
        let mut emergency = entry("emergency");
        emergency.priority = 100;
        emergency.power = false;

        let e = engine(vec![base, emergency], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(!state.power);
    }

    #[tokio::test]
    async fn narrower_daily_window_beats_wider_at_equal_priority() {
        // Business hours 08:00-18:00 vs a 12:00-13:00 lunch override.
        let mut hours = entry("hours");
        hours.daily_start = Some(hm(8, 0));
        hours.daily_stop = Some(hm(18, 0));
        let mut lunch = entry("lunch");
        lunch.daily_start = Some(hm(12, 0));
        lunch.daily_stop = Some(hm(13, 0));
        lunch.power = false;

        let e = engine(vec![hours.clone(), lunch], vec![]);

        let at_lunch = e.desired_state("lobby-1", ts(2, 12, 30)).await.unwrap();
        assert!(!at_lunch.power, "narrower window must win during overlap");

        let mid_morning = e.desired_state("lobby-1", ts(2, 9, 0)).await.unwrap();
        assert!(mid_morning.power);

        let night = e.desired_state("lobby-1", ts(2, 20, 0)).await.unwrap();
        assert_eq!(night, DesiredState::off());
    }

    #[tokio::test]
    async fn full_tie_broken_by_newest_entry() {
        let mut older = entry("older");
        older.created_at = ts(1, 0, 0);
        older.power = false;
        let mut newer = entry("newer");
        newer.created_at = ts(1, 6, 0);

        let e = engine(vec![older, newer], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power, "more recently created entry must win the tie");
    }

    #[tokio::test]
    async fn weekday_recurrence_limits_active_days() {
        let mut weekly = entry("monday-only");
        weekly.weekdays = Some(vec![Weekday::Mon]);

        let e = engine(vec![weekly], vec![]);
        // 2026-03-02 is a Monday.
        assert!(e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap().power);
        assert_eq!(e.desired_state("lobby-1", ts(3, 12, 0)).await.unwrap(), DesiredState::off());
    }

    #[tokio::test]
    async fn winner_content_is_resolved() {
        let mut with_content = entry("promo");
        with_content.content_id = Some("welcome".into());

        let e = engine(vec![with_content], vec![content("welcome")]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power);
        assert_eq!(state.content_id().as_deref(), Some("welcome"));
    }

    #[tokio::test]
    async fn expired_content_falls_back_down_ranking() {
        let mut expired_item = content("expired");
        expired_item.valid_until = Some(ts(1, 0, 0));

        let mut top = entry("top");
        top.priority = 10;
        top.content_id = Some("expired".into());
        let mut fallback = entry("fallback");
        fallback.priority = 5;
        fallback.content_id = Some("welcome".into());

        let e = engine(vec![top, fallback], vec![expired_item, content("welcome")]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power, "power still follows the top-ranked winner");
        assert_eq!(state.content_id().as_deref(), Some("welcome"));
    }

    #[tokio::test]
    async fn unresolvable_content_yields_fail_safe_default() {
        let mut broken = entry("broken");
        broken.content_id = Some("missing".into());

        let e = engine(vec![broken], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert_eq!(state, DesiredState::off());
    }

    #[tokio::test]
    async fn winner_without_content_ignores_lower_ranked_content() {
        let mut plain = entry("plain-power");
        plain.priority = 10;
        let mut promo = entry("promo");
        promo.priority = 5;
        promo.content_id = Some("welcome".into());

        let e = engine(vec![plain, promo], vec![content("welcome")]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power);
        assert!(state.content.is_none(), "pure power rule does not inherit content");
    }

    #[tokio::test]
    async fn invalid_entries_are_skipped() {
        let mut inverted = entry("inverted");
        inverted.window_start = ts(10, 0, 0);
        inverted.window_end = ts(5, 0, 0);
        inverted.priority = 100;

        let e = engine(vec![inverted, entry("sane")], vec![]);
        let state = e.desired_state("lobby-1", ts(2, 12, 0)).await.unwrap();
        assert!(state.power, "invalid entry must not shadow a valid one");
    }
}
