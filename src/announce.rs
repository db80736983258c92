//! Copy-ready announcement text for WhatsApp and Facebook posts.
//!
//! Times are shown in Indian Standard Time.

use crate::constants::IST_OFFSET_SECS;
use crate::types::{ContestRecord, Site};
use chrono::{DateTime, Datelike, FixedOffset, TimeZone};
use once_cell::sync::Lazy;
use serde::Serialize;

static IST: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset in range"));

/// Keep contests of one platform, or all of them for `None`.
pub fn filter_by_site(contests: &[ContestRecord], site: Option<Site>) -> Vec<ContestRecord> {
    contests
        .iter()
        .filter(|c| site.map_or(true, |s| c.site == s))
        .cloned()
        .collect()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// "2 hours", "1 hour 40 minutes", "30 minutes"
pub fn format_duration(duration_ms: i64) -> String {
    let total_secs = duration_ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;

    match (hours, minutes) {
        (0, 0) => "0 minutes".to_string(),
        (h, 0) => plural(h, "hour"),
        (0, m) => plural(m, "minute"),
        (h, m) => format!("{} {}", plural(h, "hour"), plural(m, "minute")),
    }
}

pub fn ordinal(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

/// Map ASCII letters and digits to Mathematical Bold code points.
pub fn to_fancy_text(text: &str) -> String {
    text.chars()
        .map(|c| {
            let mapped = match c {
                'A'..='Z' => char::from_u32(0x1D400 + (c as u32 - 'A' as u32)),
                'a'..='z' => char::from_u32(0x1D41A + (c as u32 - 'a' as u32)),
                '0'..='9' => char::from_u32(0x1D7CE + (c as u32 - '0' as u32)),
                _ => None,
            };
            mapped.unwrap_or(c)
        })
        .collect()
}

/// Start time broken into the parts announcements print
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartParts {
    pub day: u32,
    pub month: String,
    pub weekday: String,
    pub year: i32,
    /// "hh:mm AM"
    pub time: String,
}

impl StartParts {
    pub fn from_millis(start_time: i64) -> Self {
        let dt: DateTime<FixedOffset> = IST.timestamp_millis_opt(start_time).single().unwrap_or_default();

        Self {
            day: dt.day(),
            month: dt.format("%B").to_string(),
            weekday: dt.format("%A").to_string(),
            year: dt.year(),
            time: dt.format("%I:%M %p").to_string(),
        }
    }

    /// "1st February, 2025"
    pub fn date_line(&self) -> String {
        format!("{} {}, {}", ordinal(self.day), self.month, self.year)
    }
}

fn display_title(contest: &ContestRecord) -> String {
    match contest.site {
        Site::CodeChef => format!("Codechef {}", contest.title),
        _ => contest.title.clone(),
    }
}

pub fn whatsapp_message(contest: &ContestRecord) -> String {
    let parts = StartParts::from_millis(contest.start_time);
    format!(
        "{} will start on {} at {} IST.\nContest duration is {}.\n\nContest link: {}\nHappy Coding! 😀",
        display_title(contest),
        parts.date_line(),
        parts.time,
        format_duration(contest.duration),
        contest.url
    )
}

pub fn facebook_message(contest: &ContestRecord) -> String {
    let parts = StartParts::from_millis(contest.start_time);
    let date = format!("{} {}, {}, {}", ordinal(parts.day), parts.month, parts.weekday, parts.year);
    format!(
        "Upcoming Contest: {}\nDate: {}\nContest Timing: {} {}\nDuration: {}\nContest link: {}\n\nHappy Coding! 😀",
        to_fancy_text(&display_title(contest)),
        to_fancy_text(&date),
        to_fancy_text(&parts.time),
        to_fancy_text("IST"),
        to_fancy_text(&format_duration(contest.duration)),
        contest.url
    )
}

/// Both announcement formats for one contest
#[derive(Debug, Clone, Serialize)]
pub struct Announcement {
    pub site: Site,
    pub title: String,
    pub whatsapp: String,
    pub facebook: String,
}

impl From<&ContestRecord> for Announcement {
    fn from(contest: &ContestRecord) -> Self {
        Self {
            site: contest.site,
            title: contest.title.clone(),
            whatsapp: whatsapp_message(contest),
            facebook: facebook_message(contest),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn contest(site: Site) -> ContestRecord {
        ContestRecord {
            site,
            title: "Starters 171".to_string(),
            url: "https://www.codechef.com/START171".to_string(),
            // 2025-01-29 14:30 UTC = 20:00 IST, a Wednesday
            start_time: Utc.with_ymd_and_hms(2025, 1, 29, 14, 30, 0).unwrap().timestamp_millis(),
            duration: 7_200_000,
        }
    }

    #[test]
    fn durations_read_naturally() {
        assert_eq!(format_duration(0), "0 minutes");
        assert_eq!(format_duration(7_200_000), "2 hours");
        assert_eq!(format_duration(3_600_000), "1 hour");
        assert_eq!(format_duration(6_000_000), "1 hour 40 minutes");
        assert_eq!(format_duration(60_000), "1 minute");
        assert_eq!(format_duration(9_000_000), "2 hours 30 minutes");
    }

    #[test]
    fn ordinals() {
        let got: Vec<String> = [1, 2, 3, 4, 11, 12, 13, 21, 22, 23, 31].iter().map(|d| ordinal(*d)).collect();
        assert_eq!(got, ["1st", "2nd", "3rd", "4th", "11th", "12th", "13th", "21st", "22nd", "23rd", "31st"]);
    }

    #[test]
    fn fancy_text_maps_letters_and_digits_only() {
        assert_eq!(to_fancy_text("IST"), "𝐈𝐒𝐓");
        assert_eq!(to_fancy_text("a1 z9!"), "𝐚𝟏 𝐳𝟗!");
    }

    #[test]
    fn start_parts_are_in_ist() {
        let parts = StartParts::from_millis(contest(Site::CodeChef).start_time);
        assert_eq!(parts.date_line(), "29th January, 2025");
        assert_eq!(parts.weekday, "Wednesday");
        assert_eq!(parts.time, "08:00 PM");
    }

    #[test]
    fn whatsapp_prefixes_codechef_titles() {
        let msg = whatsapp_message(&contest(Site::CodeChef));
        assert_eq!(
            msg,
            "Codechef Starters 171 will start on 29th January, 2025 at 08:00 PM IST.\n\
             Contest duration is 2 hours.\n\n\
             Contest link: https://www.codechef.com/START171\nHappy Coding! 😀"
        );
        assert!(whatsapp_message(&contest(Site::Codeforces)).starts_with("Starters 171 will start"));
    }

    #[test]
    fn facebook_uses_bold_text() {
        let msg = facebook_message(&contest(Site::Codeforces));
        assert!(msg.starts_with("Upcoming Contest: 𝐒𝐭𝐚𝐫𝐭𝐞𝐫𝐬 𝟏𝟕𝟏\n"));
        assert!(msg.contains("Contest Timing: 𝟎𝟖:𝟎𝟎 𝐏𝐌 𝐈𝐒𝐓\n"));
        assert!(msg.contains("Duration: 𝟐 𝐡𝐨𝐮𝐫𝐬\n"));
        assert!(msg.ends_with("Contest link: https://www.codechef.com/START171\n\nHappy Coding! 😀"));
    }

    #[test]
    fn site_filter() {
        let all = vec![contest(Site::CodeChef), contest(Site::Codeforces)];
        assert_eq!(filter_by_site(&all, None).len(), 2);
        assert_eq!(filter_by_site(&all, Some(Site::Codeforces))[0].site, Site::Codeforces);
        assert!(filter_by_site(&all, Some(Site::AtCoder)).is_empty());
    }
}
