use gtk::prelude::*;
use gtk::{Button, DropDown, Label, Orientation, SearchEntry};
use std::cell::RefCell;
use std::rc::Rc;

/// Radius choices offered next to the location box. "Everywhere" turns the
/// location filter off entirely.
pub const DISTANCE_CHOICES: &[(&str, f64)] = &[
    ("Everywhere", 0.0),
    ("5 km", 5.0),
    ("10 km", 10.0),
    ("25 km", 25.0),
    ("50 km", 50.0),
    ("100 km", 100.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub location: Option<String>,
    pub distance: f64,
}

/// Turns the raw form values into a query: a blank location is no location,
/// and the "everywhere" radius drops the location filter entirely.
pub fn normalize_query(location: &str, distance: f64) -> SearchQuery {
    if distance <= 0.0 {
        return SearchQuery {
            location: None,
            distance: 0.0,
        };
    }

    let location = location.trim();

    SearchQuery {
        location: (!location.is_empty()).then(|| location.to_string()),
        distance,
    }
}

type SearchCallback = Rc<dyn Fn(SearchQuery)>;

struct SearchState {
    callback: Option<SearchCallback>,
}

/// Location + radius form. Raises a single-subscriber callback on submit
/// and carries an inline feedback line for geocoding misses.
#[derive(Clone)]
pub struct SearchBar {
    container: gtk::Box,
    entry: SearchEntry,
    distance: DropDown,
    feedback: Label,
    state: Rc<RefCell<SearchState>>,
}

impl SearchBar {
    pub fn new() -> Self {
        let container = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(4)
            .build();

        let form = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(8)
            .build();

        let entry = SearchEntry::builder()
            .placeholder_text("Search by location...")
            .hexpand(true)
            .build();

        let labels: Vec<&str> = DISTANCE_CHOICES.iter().map(|(label, _)| *label).collect();
        let distance = DropDown::from_strings(&labels);

        let search_button = Button::builder().label("Search").build();
        search_button.add_css_class("suggested-action");

        form.append(&entry);
        form.append(&distance);
        form.append(&search_button);

        let feedback = Label::builder()
            .xalign(0.0)
            .wrap(true)
            .visible(false)
            .build();
        feedback.add_css_class("error");

        container.append(&form);
        container.append(&feedback);

        let state = Rc::new(RefCell::new(SearchState { callback: None }));

        let bar = Self {
            container,
            entry,
            distance,
            feedback,
            state,
        };

        let bar_for_entry = bar.clone();
        bar.entry.connect_activate(move |_| bar_for_entry.submit());

        let bar_for_button = bar.clone();
        search_button.connect_clicked(move |_| bar_for_button.submit());

        bar
    }

    pub fn widget(&self) -> &gtk::Box {
        &self.container
    }

    /// Single subscriber; registering a new callback replaces the old one.
    pub fn set_search_callback(&self, callback: impl Fn(SearchQuery) + 'static) {
        self.state.borrow_mut().callback = Some(Rc::new(callback));
    }

    pub fn set_location_error(&self, message: &str) {
        self.feedback.set_label(message);
        self.feedback.set_visible(true);
    }

    pub fn clear_errors(&self) {
        self.feedback.set_visible(false);
    }

    fn submit(&self) {
        let selected = self.distance.selected() as usize;
        let distance = DISTANCE_CHOICES
            .get(selected)
            .map(|(_, km)| *km)
            .unwrap_or(0.0);

        let query = normalize_query(&self.entry.text(), distance);

        self.clear_errors();

        let callback = self.state.borrow().callback.clone();
        if let Some(callback) = callback {
            callback(query);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_location_becomes_none() {
        let query = normalize_query("   ", 25.0);

        assert_eq!(query.location, None);
        assert_eq!(query.distance, 25.0);
    }

    #[test]
    fn everywhere_radius_drops_the_location() {
        let query = normalize_query("Amsterdam", 0.0);

        assert_eq!(query.location, None);
        assert_eq!(query.distance, 0.0);
    }

    #[test]
    fn location_text_is_trimmed() {
        let query = normalize_query("  Amsterdam ", 10.0);

        assert_eq!(query.location.as_deref(), Some("Amsterdam"));
        assert_eq!(query.distance, 10.0);
    }
}
