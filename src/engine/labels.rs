//! Section labels
//!
//! Picking a label is pure: [`resolve_label`] only looks at the ordering mode,
//! the group's day and the caller's notion of "today". Turning the result into
//! text is a separate [`LabelRenderer`] step so it can be localized.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};

use crate::i18n::I18n;
use crate::models::criteria::SortMode;

/// Format used for days that are neither today nor tomorrow
pub const DEFAULT_DATE_FORMAT: &str = "%A, %B %-d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupLabel {
    Today,
    Tomorrow,
    Day(NaiveDate),
    Caption(SortMode),
}

/// Choose the label for a group produced under `mode`.
pub fn resolve_label(mode: SortMode, group_date: Option<NaiveDate>, today: NaiveDate) -> GroupLabel {
    match (mode.is_date_mode(), group_date) {
        (true, Some(date)) if date == today => GroupLabel::Today,
        (true, Some(date)) if Some(date) == today.checked_add_signed(Duration::days(1)) => {
            GroupLabel::Tomorrow
        }
        (true, Some(date)) => GroupLabel::Day(date),
        _ => GroupLabel::Caption(mode),
    }
}

/// Resolve and render a label in English
pub fn label(mode: SortMode, group_date: Option<NaiveDate>, today: NaiveDate) -> String {
    EnglishLabels.render(&resolve_label(mode, group_date, today))
}

/// Turns a [`GroupLabel`] into display text
pub trait LabelRenderer: Send + Sync {
    fn render(&self, label: &GroupLabel) -> String;
}

/// Built-in English captions
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLabels;

impl EnglishLabels {
    fn caption(mode: SortMode) -> &'static str {
        match mode {
            SortMode::DateAscending => "Soonest first",
            SortMode::DateDescending => "Latest first",
            SortMode::DistanceAscending => "Nearest first",
            SortMode::RecencyDescending => "Recently added",
            SortMode::RecencyAscending => "Oldest first",
            SortMode::CapacityDescending => "Largest capacity",
            SortMode::PopularityDescending => "Most popular",
        }
    }
}

impl LabelRenderer for EnglishLabels {
    fn render(&self, label: &GroupLabel) -> String {
        match label {
            GroupLabel::Today => "Today".to_string(),
            GroupLabel::Tomorrow => "Tomorrow".to_string(),
            GroupLabel::Day(date) => date.format(DEFAULT_DATE_FORMAT).to_string(),
            GroupLabel::Caption(mode) => Self::caption(*mode).to_string(),
        }
    }
}

/// Labels looked up in a translation catalog for one language
#[derive(Debug, Clone)]
pub struct LocalizedLabels {
    i18n: Arc<I18n>,
    language: String,
}

impl LocalizedLabels {
    pub fn new(i18n: Arc<I18n>, language: impl Into<String>) -> Self {
        Self {
            i18n,
            language: language.into(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

impl LabelRenderer for LocalizedLabels {
    fn render(&self, label: &GroupLabel) -> String {
        match label {
            GroupLabel::Today => self.i18n.t("groups.today", &self.language, None),
            GroupLabel::Tomorrow => self.i18n.t("groups.tomorrow", &self.language, None),
            GroupLabel::Day(date) => {
                let format = self.i18n.t("groups.date_format", &self.language, None);
                if is_valid_date_format(&format) {
                    date.format(&format).to_string()
                } else {
                    date.format(DEFAULT_DATE_FORMAT).to_string()
                }
            }
            GroupLabel::Caption(mode) => {
                let key = format!("groups.captions.{}", mode.as_str().replace('-', "_"));
                self.i18n.t(&key, &self.language, None)
            }
        }
    }
}

// chrono panics when displaying a format with invalid items
fn is_valid_date_format(format: &str) -> bool {
    use chrono::format::{Item, StrftimeItems};
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, d).unwrap()
    }

    #[test]
    fn test_today_and_tomorrow() {
        let today = day(28);
        assert_eq!(resolve_label(SortMode::DateAscending, Some(day(28)), today), GroupLabel::Today);
        assert_eq!(resolve_label(SortMode::DateDescending, Some(day(29)), today), GroupLabel::Tomorrow);
        assert_eq!(label(SortMode::DateAscending, Some(day(29)), today), "Tomorrow");
    }

    #[test]
    fn test_other_days_use_full_date() {
        let today = day(1);
        assert_eq!(label(SortMode::DateAscending, Some(day(2)), today), "Tomorrow");
        // 2024-02-27 was a Tuesday
        assert_eq!(label(SortMode::DateAscending, Some(day(27)), today), "Tuesday, February 27");
        // yesterday is not special
        assert_eq!(label(SortMode::DateAscending, Some(day(1)), day(2)), "Thursday, February 1");
    }

    #[test]
    fn test_non_date_modes_use_captions() {
        let today = day(1);
        assert_eq!(label(SortMode::RecencyDescending, None, today), "Recently added");
        assert_eq!(label(SortMode::RecencyAscending, None, today), "Oldest first");
        assert_eq!(label(SortMode::DistanceAscending, None, today), "Nearest first");
        assert_eq!(label(SortMode::CapacityDescending, None, today), "Largest capacity");
        assert_eq!(label(SortMode::PopularityDescending, None, today), "Most popular");
        // a date is ignored outside date modes
        assert_eq!(
            resolve_label(SortMode::PopularityDescending, Some(today), today),
            GroupLabel::Caption(SortMode::PopularityDescending)
        );
    }

    #[test]
    fn test_localized_labels_match_english_catalog() {
        let i18n = Arc::new(I18n::with_builtin_catalog(&crate::config::I18nConfig::default()));
        let labels = LocalizedLabels::new(i18n, "en");
        for mode in SortMode::ALL {
            let caption = GroupLabel::Caption(mode);
            assert_eq!(labels.render(&caption), EnglishLabels.render(&caption));
        }
        assert_eq!(labels.render(&GroupLabel::Day(day(27))), "Tuesday, February 27");
    }
}
