//! Progress reports composed from parsed plan entries.
//!
//! Everything here is formatting over `DayEntry` slices; delivery and
//! scheduling live in the gateway.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::HashMap;
use streak_ledger::{DayEntry, Status};

/// The Sunday-evening digest: summary, consistency, streak, score, topics.
///
/// On the last day of a month the month comparison is appended, so the
/// month-end digest doubles as the monthly report.
pub fn weekly_digest(entries: &[DayEntry], today: NaiveDate) -> String {
    let mut sections = vec![weekly_summary(entries, today)];
    if let Some(consistency) = consistency_score(entries) {
        sections.push(consistency);
    }
    sections.push(best_streak(entries));
    if let Some(score) = study_score(entries) {
        sections.push(score);
    }
    sections.push(hard_topic_analytics(entries));
    let last_of_month = (today + Duration::days(1)).day() == 1;
    if last_of_month {
        sections.push(month_comparison(entries, today));
    }
    sections.join("\n\n")
}

/// Done/missed counts and hard topics for the trailing week.
pub fn weekly_summary(entries: &[DayEntry], today: NaiveDate) -> String {
    let start = today - Duration::days(6);
    let mut done = 0;
    let mut missed = 0;
    let mut topics = Vec::new();

    for e in entries.iter().filter(|e| e.date >= start && e.date <= today) {
        match e.status {
            Status::Done => done += 1,
            Status::Missed => missed += 1,
            Status::Unset => {}
        }
        if e.has_topic() {
            topics.push(format!("• {}: {}", e.date, e.hard_topic.trim()));
        }
    }

    let topics = if topics.is_empty() {
        "None 🎉".to_string()
    } else {
        topics.join("\n")
    };
    format!("📌 Weekly summary\n\n✅ Done: {done}\n❌ Missed: {missed}\n\n🧠 Hard topics\n{topics}")
}

/// Share of answered days that were completed. None before any day is
/// answered.
pub fn consistency_score(entries: &[DayEntry]) -> Option<String> {
    let answered = entries
        .iter()
        .filter(|e| e.status != Status::Unset)
        .count();
    if answered == 0 {
        return None;
    }
    let done = entries.iter().filter(|e| e.status == Status::Done).count();
    let pct = done as f64 / answered as f64 * 100.0;
    Some(format!("📈 Consistency: {pct:.1}%"))
}

/// Longest run of consecutive completed days, in date order.
pub fn best_streak(entries: &[DayEntry]) -> String {
    let mut sorted: Vec<&DayEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.date);

    let mut best = 0u32;
    let mut current = 0u32;
    for e in sorted {
        if e.status == Status::Done {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    format!("🏆 Best streak: {best} days")
}

/// 10 points per answered day; a completed day scores 10, or 8 when a hard
/// topic was named. None before any day is answered.
pub fn study_score(entries: &[DayEntry]) -> Option<String> {
    let mut score = 0u32;
    let mut max_score = 0u32;
    for e in entries {
        if e.status == Status::Unset {
            continue;
        }
        max_score += 10;
        if e.status == Status::Done {
            score += if e.has_topic() { 8 } else { 10 };
        }
    }
    if max_score == 0 {
        return None;
    }
    let pct = score as f64 / max_score as f64 * 100.0;
    Some(format!("🧮 Study score: {pct:.1}%"))
}

/// The five most recurring hard topics.
pub fn hard_topic_analytics(entries: &[DayEntry]) -> String {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for e in entries.iter().filter(|e| e.has_topic()) {
        *counts.entry(e.hard_topic.trim()).or_default() += 1;
    }

    if counts.is_empty() {
        return "🧠 Hard topics: None 🎉".to_string();
    }

    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranked.truncate(5);

    let lines: Vec<String> = ranked
        .into_iter()
        .map(|(topic, n)| format!("• {topic} → {n}"))
        .collect();
    format!("🧠 Hard topic analytics\n\n{}", lines.join("\n"))
}

/// Completed-day counts for last month against the month before.
pub fn month_comparison(entries: &[DayEntry], today: NaiveDate) -> String {
    let first_of_current = match today.with_day(1) {
        Some(d) => d,
        None => today,
    };
    let last_month_end = first_of_current - Duration::days(1);
    let last_month_start = last_month_end.with_day(1).unwrap_or(last_month_end);
    let prev_month_end = last_month_start - Duration::days(1);
    let prev_month_start = prev_month_end.with_day(1).unwrap_or(prev_month_end);

    let count = |from: NaiveDate, to: NaiveDate| {
        entries
            .iter()
            .filter(|e| e.date >= from && e.date <= to && e.status == Status::Done)
            .count()
    };
    let last = count(last_month_start, last_month_end);
    let prev = count(prev_month_start, prev_month_end);

    let trend = match last.cmp(&prev) {
        std::cmp::Ordering::Greater => "📈 Improved",
        std::cmp::Ordering::Less => "📉 Declined",
        std::cmp::Ordering::Equal => "➖ Same",
    };
    format!(
        "🏅 Month comparison\n\n{}: {prev}\n{}: {last}\n\nTrend: {trend}",
        prev_month_start.format("%B %Y"),
        last_month_start.format("%B %Y"),
    )
}

/// One line per day across a date range.
pub fn range_report(entries: &[DayEntry], from: NaiveDate, to: NaiveDate) -> String {
    let mut sorted: Vec<&DayEntry> = entries
        .iter()
        .filter(|e| e.date >= from && e.date <= to)
        .collect();
    sorted.sort_by_key(|e| e.date);

    if sorted.is_empty() {
        return format!("No tracked days between {from} and {to}.");
    }

    let mut lines = vec![format!("Study report {from} to {to}")];
    for e in sorted {
        let status = match e.status {
            Status::Done => "DONE",
            Status::Missed => "MISS",
            Status::Unset => "-",
        };
        let hard = if e.has_topic() {
            e.hard_topic.trim()
        } else {
            "None"
        };
        lines.push(format!("{} | {status} | Hard: {hard}", e.date));
    }
    lines.join("\n")
}

/// Dispatch a bot command. None means "not a command of ours" (ignored as
/// stray input).
pub fn handle_command(text: &str, entries: &[DayEntry], today: NaiveDate) -> Option<String> {
    let mut parts = text.split_whitespace();
    let cmd = parts.next()?;
    // Strip the "@BotName" suffix Telegram appends in some clients.
    let cmd = cmd.split('@').next().unwrap_or(cmd);

    match cmd {
        "/summary" => Some(weekly_digest(entries, today)),
        "/score" => Some(match (study_score(entries), consistency_score(entries)) {
            (Some(score), Some(consistency)) => format!("{score}\n{consistency}"),
            _ => "No answered days yet.".to_string(),
        }),
        "/streak" => Some(best_streak(entries)),
        "/report" => {
            let usage = "Usage: /report YYYY-MM-DD YYYY-MM-DD";
            let (Some(from), Some(to)) = (parts.next(), parts.next()) else {
                return Some(usage.to_string());
            };
            let (Ok(from), Ok(to)) = (
                NaiveDate::parse_from_str(from, "%Y-%m-%d"),
                NaiveDate::parse_from_str(to, "%Y-%m-%d"),
            ) else {
                return Some(usage.to_string());
            };
            Some(range_report(entries, from, to))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(date: NaiveDate, status: Status, topic: &str) -> DayEntry {
        DayEntry {
            date,
            status,
            hard_topic: topic.to_string(),
        }
    }

    fn fixture() -> Vec<DayEntry> {
        vec![
            entry(d(2026, 7, 27), Status::Done, "None"),
            entry(d(2026, 7, 28), Status::Done, "recursion"),
            entry(d(2026, 7, 29), Status::Missed, ""),
            entry(d(2026, 7, 30), Status::Done, "recursion"),
            entry(d(2026, 7, 31), Status::Done, "graphs"),
            entry(d(2026, 8, 1), Status::Unset, ""),
            entry(d(2026, 8, 2), Status::Done, ""),
        ]
    }

    #[test]
    fn test_weekly_summary_counts_and_topics() {
        let today = d(2026, 8, 2);
        let summary = weekly_summary(&fixture(), today);
        // Window is 7/27..=8/2.
        assert!(summary.contains("✅ Done: 5"));
        assert!(summary.contains("❌ Missed: 1"));
        assert!(summary.contains("recursion"));
        assert!(summary.contains("graphs"));
        // The "None" sentinel is not a topic.
        assert!(!summary.contains("2026-07-27:"));
    }

    #[test]
    fn test_weekly_summary_no_topics() {
        let entries = vec![entry(d(2026, 8, 2), Status::Done, "None")];
        let summary = weekly_summary(&entries, d(2026, 8, 2));
        assert!(summary.contains("None 🎉"));
    }

    #[test]
    fn test_consistency_score() {
        // 5 done out of 6 answered.
        assert_eq!(
            consistency_score(&fixture()).unwrap(),
            "📈 Consistency: 83.3%"
        );
        assert!(consistency_score(&[]).is_none());
        let unanswered = vec![entry(d(2026, 8, 1), Status::Unset, "")];
        assert!(consistency_score(&unanswered).is_none());
    }

    #[test]
    fn test_best_streak_survives_unordered_input() {
        let mut entries = fixture();
        entries.reverse();
        // Date-ordered runs of done days are 2, 2, 1.
        assert_eq!(best_streak(&entries), "🏆 Best streak: 2 days");
    }

    #[test]
    fn test_study_score_penalizes_hard_topics() {
        // Answered: 6 → max 60. Done days: 10 + 8 + 8 + 8 + 10 = 44.
        assert_eq!(study_score(&fixture()).unwrap(), "🧮 Study score: 73.3%");
        assert!(study_score(&[]).is_none());
    }

    #[test]
    fn test_hard_topic_analytics_ranks_by_count() {
        let report = hard_topic_analytics(&fixture());
        let recursion = report.find("recursion → 2").expect("recursion ranked");
        let graphs = report.find("graphs → 1").expect("graphs ranked");
        assert!(recursion < graphs);
    }

    #[test]
    fn test_hard_topic_analytics_empty() {
        let entries = vec![entry(d(2026, 8, 2), Status::Done, "none")];
        assert_eq!(hard_topic_analytics(&entries), "🧠 Hard topics: None 🎉");
    }

    #[test]
    fn test_month_comparison_trend() {
        let entries = vec![
            entry(d(2026, 6, 10), Status::Done, ""),
            entry(d(2026, 7, 10), Status::Done, ""),
            entry(d(2026, 7, 11), Status::Done, ""),
        ];
        let report = month_comparison(&entries, d(2026, 8, 2));
        assert!(report.contains("June 2026: 1"));
        assert!(report.contains("July 2026: 2"));
        assert!(report.contains("📈 Improved"));
    }

    #[test]
    fn test_range_report_lines() {
        let report = range_report(&fixture(), d(2026, 7, 29), d(2026, 7, 31));
        assert!(report.contains("2026-07-29 | MISS | Hard: None"));
        assert!(report.contains("2026-07-30 | DONE | Hard: recursion"));
        assert!(!report.contains("2026-08-02"));
    }

    #[test]
    fn test_range_report_empty() {
        let report = range_report(&fixture(), d(2027, 1, 1), d(2027, 1, 7));
        assert!(report.contains("No tracked days"));
    }

    #[test]
    fn test_handle_command_dispatch() {
        let entries = fixture();
        let today = d(2026, 8, 2);
        assert!(handle_command("/summary", &entries, today)
            .unwrap()
            .contains("Weekly summary"));
        assert!(handle_command("/streak", &entries, today)
            .unwrap()
            .contains("Best streak"));
        assert!(handle_command("/score", &entries, today)
            .unwrap()
            .contains("Study score"));
        assert!(handle_command("/summary@StreakBot", &entries, today).is_some());
        assert!(handle_command("/unknown", &entries, today).is_none());
    }

    #[test]
    fn test_handle_command_report_usage() {
        let entries = fixture();
        let today = d(2026, 8, 2);
        assert!(handle_command("/report", &entries, today)
            .unwrap()
            .starts_with("Usage:"));
        assert!(handle_command("/report yesterday today", &entries, today)
            .unwrap()
            .starts_with("Usage:"));
        assert!(
            handle_command("/report 2026-07-29 2026-07-31", &entries, today)
                .unwrap()
                .contains("2026-07-30 | DONE")
        );
    }

    #[test]
    fn test_weekly_digest_sections() {
        let digest = weekly_digest(&fixture(), d(2026, 8, 2));
        assert!(digest.contains("Weekly summary"));
        assert!(digest.contains("Consistency"));
        assert!(digest.contains("Best streak"));
        assert!(digest.contains("Study score"));
        assert!(digest.contains("Hard topic analytics"));
        // Not month-end, so no comparison.
        assert!(!digest.contains("Month comparison"));
        // Month-end digest appends it.
        let month_end = weekly_digest(&fixture(), d(2026, 8, 31));
        assert!(month_end.contains("Month comparison"));
    }
}
