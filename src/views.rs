use crate::{
    data::DataError,
    models::{Booking, Profile, VerificationRecord},
};

#[derive(Debug, Clone)]
pub enum ViewState<T> {
    Loaded(Vec<T>),
    Empty,
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Loaded(items)
        }
    }

    pub fn from_result(result: Result<Vec<T>, DataError>, failure: &str) -> Self {
        match result {
            Ok(items) => Self::from_items(items),
            Err(err) => {
                log::error!("{failure}: {err}");
                ViewState::Failed(failure.to_string())
            }
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            ViewState::Loaded(items) => items,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ViewState::Empty)
    }

    pub fn has_error(&self) -> bool {
        matches!(self, ViewState::Failed(_))
    }

    pub fn error_message(&self) -> &str {
        match self {
            ViewState::Failed(message) => message,
            _ => "",
        }
    }
}

pub trait Searchable {
    fn search_fields(&self) -> Vec<Option<&str>>;
}

impl Searchable for Profile {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![self.name.as_deref(), self.email.as_deref(), self.phone.as_deref()]
    }
}

impl Searchable for Booking {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.service_category.as_deref(),
            self.service_type.as_deref(),
            self.location.as_deref(),
            self.customer.as_ref().and_then(|customer| customer.name.as_deref()),
            self.provider.as_ref().and_then(|provider| provider.name.as_deref()),
        ]
    }
}

impl Searchable for VerificationRecord {
    fn search_fields(&self) -> Vec<Option<&str>> {
        vec![
            self.profile.as_ref().and_then(|profile| profile.name.as_deref()),
            self.city.as_deref(),
            self.field_of_work.as_deref(),
        ]
    }
}

// A blank query matches everything.
pub fn matches_query<T: Searchable>(item: &T, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    item.search_fields()
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
}

pub fn filter_by_query<T: Searchable>(items: Vec<T>, query: &str) -> Vec<T> {
    items
        .into_iter()
        .filter(|item| matches_query(item, query))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TabCount {
    pub value: String,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

pub fn tab_counts<T>(
    items: &[T],
    tabs: &[&str],
    selected: &str,
    key: impl Fn(&T) -> &str,
) -> Vec<TabCount> {
    tabs.iter()
        .map(|tab| TabCount {
            value: tab.to_string(),
            label: tab_label(tab),
            count: items.iter().filter(|item| key(*item) == *tab).count(),
            selected: *tab == selected,
        })
        .collect()
}

pub fn tabs_from_totals(totals: &[(String, i64)], tabs: &[&str], selected: &str) -> Vec<TabCount> {
    tabs.iter()
        .map(|tab| TabCount {
            value: tab.to_string(),
            label: tab_label(tab),
            count: total_for(totals, tab),
            selected: *tab == selected,
        })
        .collect()
}

pub fn total_for(totals: &[(String, i64)], key: &str) -> usize {
    totals
        .iter()
        .find(|(value, _)| value == key)
        .and_then(|(_, count)| usize::try_from(*count).ok())
        .unwrap_or(0)
}

pub fn tab_label(value: &str) -> String {
    let spaced = value.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
