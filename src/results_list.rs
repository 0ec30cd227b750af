use gtk::prelude::*;
use gtk::{Align, Button, Label, ListBox, ListBoxRow, Orientation, ScrolledWindow};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::data::{Meeting, MeetingCallback, PAGE_SIZE};
use crate::icons::{self, IconCache};
use crate::paging::Pager;

/// Which meeting row is highlighted. At most one meeting holds the
/// highlight; focusing another hands it over, focusing the same one again
/// changes nothing.
#[derive(Debug, Default)]
pub struct FocusTracker {
    focused: Option<i32>,
}

pub struct FocusChange {
    /// Previously highlighted meeting that must be un-highlighted.
    pub unfocus: Option<i32>,
}

impl FocusTracker {
    pub fn focus(&mut self, id: i32) -> Option<FocusChange> {
        if self.focused == Some(id) {
            return None;
        }

        let unfocus = self.focused.replace(id);
        Some(FocusChange { unfocus })
    }

    pub fn focused(&self) -> Option<i32> {
        self.focused
    }

    pub fn clear(&mut self) {
        self.focused = None;
    }
}

struct ListState {
    pager: Pager,
    focus: FocusTracker,
    rows: HashMap<i32, ListBoxRow>,
    icons: IconCache<Option<gdk::Texture>>,
    loading: bool,
    view_on_map: Option<MeetingCallback>,
    show_info: Option<MeetingCallback>,
}

/// The paginated results list. Owns its pagination and focus state and the
/// rendered row handles, keyed by meeting id.
#[derive(Clone)]
pub struct ResultsList {
    container: gtk::Box,
    scrolled: ScrolledWindow,
    results: ListBox,
    loading_label: Label,
    prev_button: Button,
    next_button: Button,
    state: Rc<RefCell<ListState>>,
}

impl ResultsList {
    pub fn new() -> Self {
        let container = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(8)
            .build();

        let loading_label = Label::builder()
            .label("Loading meetings...")
            .margin_top(12)
            .margin_bottom(12)
            .build();
        loading_label.add_css_class("dim-label");

        let results = ListBox::builder()
            .selection_mode(gtk::SelectionMode::None)
            .build();
        results.add_css_class("boxed-list");

        let scrolled = ScrolledWindow::builder()
            .vexpand(true)
            .hexpand(true)
            .build();
        scrolled.set_child(Some(&results));

        let prev_button = Button::builder().label("Previous").build();
        let next_button = Button::builder().label("Next").build();

        let pagination = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(8)
            .halign(Align::Center)
            .margin_bottom(8)
            .build();
        pagination.append(&prev_button);
        pagination.append(&next_button);

        container.append(&loading_label);
        container.append(&scrolled);
        container.append(&pagination);

        let state = Rc::new(RefCell::new(ListState {
            pager: Pager::new(PAGE_SIZE),
            focus: FocusTracker::default(),
            rows: HashMap::new(),
            icons: IconCache::new(),
            loading: true,
            view_on_map: None,
            show_info: None,
        }));

        let list = Self {
            container,
            scrolled,
            results,
            loading_label,
            prev_button,
            next_button,
            state,
        };

        let list_for_prev = list.clone();
        list.prev_button.connect_clicked(move |_| list_for_prev.prev_page());

        let list_for_next = list.clone();
        list.next_button.connect_clicked(move |_| list_for_next.next_page());

        list.update_pagination_buttons();
        list
    }

    pub fn widget(&self) -> &gtk::Box {
        &self.container
    }

    /// Replaces the whole collection, clears any focus highlight, and shows
    /// the first page.
    pub fn set_meetings(&self, meetings: Vec<Rc<Meeting>>) {
        {
            let mut state = self.state.borrow_mut();
            state.focus.clear();
            state.pager.set_meetings(meetings);
        }

        self.render_current_page();
        self.scroll_to_top();
    }

    /// Appends meetings without resetting the current page.
    pub fn add_meetings(&self, meetings: Vec<Rc<Meeting>>) {
        self.state.borrow_mut().pager.add_meetings(meetings);
        self.render_current_page();
    }

    /// Switches to `page`; out-of-range requests are ignored.
    pub fn set_page(&self, page: i64) {
        let changed = self.state.borrow_mut().pager.set_page(page);

        if changed {
            self.render_current_page();
            self.scroll_to_top();
        }
    }

    pub fn next_page(&self) {
        let page = self.state.borrow().pager.current_page() as i64;
        self.set_page(page + 1);
    }

    pub fn prev_page(&self) {
        let page = self.state.borrow().pager.current_page() as i64;
        self.set_page(page - 1);
    }

    /// Toggles the loading indicator. Entering the loading state empties
    /// the rendered list; meetings cannot be added until loading is
    /// switched off again.
    pub fn set_loading(&self, loading: bool) {
        {
            let mut state = self.state.borrow_mut();
            state.loading = loading;

            if loading {
                self.remove_rendered_rows(&mut state);
            }
        }

        self.loading_label.set_visible(loading);
        self.update_pagination_buttons();
    }

    /// Highlights the row for `meeting` and clears the previous highlight.
    /// Focusing the already-focused meeting is a no-op.
    pub fn focus(&self, meeting: &Meeting) {
        let change = self.state.borrow_mut().focus.focus(meeting.id);
        let Some(change) = change else {
            return;
        };

        let state = self.state.borrow();

        if let Some(previous) = change.unfocus {
            if let Some(row) = state.rows.get(&previous) {
                row.remove_css_class("focused");
            }
        }

        if let Some(row) = state.rows.get(&meeting.id) {
            row.add_css_class("focused");
        }
    }

    /// Single subscriber; registering a new callback replaces the old one.
    pub fn set_view_on_map_callback(&self, callback: impl Fn(Rc<Meeting>) + 'static) {
        self.state.borrow_mut().view_on_map = Some(Rc::new(callback));
    }

    /// Single subscriber; registering a new callback replaces the old one.
    pub fn set_show_info_callback(&self, callback: impl Fn(Rc<Meeting>) + 'static) {
        self.state.borrow_mut().show_info = Some(Rc::new(callback));
    }

    /// Replaces the list contents with a status line, e.g. after a failed
    /// fetch or an empty search.
    pub fn show_message(&self, message: &str) {
        {
            let mut state = self.state.borrow_mut();
            self.remove_rendered_rows(&mut state);
        }

        let label = Label::builder()
            .label(message)
            .wrap(true)
            .margin_top(12)
            .margin_bottom(12)
            .build();
        label.add_css_class("dim-label");
        self.results.append(&label);
    }

    fn render_current_page(&self) {
        let mut state = self.state.borrow_mut();

        assert!(
            !state.loading,
            "cannot add meetings while loading, call set_loading(false) first"
        );

        self.remove_rendered_rows(&mut state);

        let ListState {
            pager,
            focus,
            rows,
            icons,
            ..
        } = &mut *state;

        for meeting in pager.visible() {
            let texture = icons.get_or_load(meeting.org, icons::load_logo_texture);
            let row = build_meeting_row(&self.state, meeting.clone(), texture.as_ref());

            if focus.focused() == Some(meeting.id) {
                row.add_css_class("focused");
            }

            rows.insert(meeting.id, row.clone());
            self.results.append(&row);
        }

        drop(state);
        self.update_pagination_buttons();
    }

    fn remove_rendered_rows(&self, state: &mut ListState) {
        state.rows.clear();

        while let Some(child) = self.results.first_child() {
            self.results.remove(&child);
        }
    }

    fn update_pagination_buttons(&self) {
        let state = self.state.borrow();

        self.prev_button.set_sensitive(state.pager.has_prev_page());
        self.next_button.set_sensitive(state.pager.has_next_page());

        self.prev_button.set_visible(!state.loading);
        self.next_button.set_visible(!state.loading);
    }

    fn scroll_to_top(&self) {
        self.scrolled.vadjustment().set_value(0.0);
    }
}

fn build_meeting_row(
    state: &Rc<RefCell<ListState>>,
    meeting: Rc<Meeting>,
    texture: Option<&gdk::Texture>,
) -> ListBoxRow {
    let card = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(10)
        .margin_top(6)
        .margin_bottom(6)
        .margin_start(8)
        .margin_end(8)
        .build();
    card.add_css_class("meeting-card");

    let logo = icons::logo_image(texture);
    logo.set_valign(Align::Start);
    card.append(&logo);

    let content = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(4)
        .hexpand(true)
        .build();

    let title_row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .build();

    let name_label = Label::builder()
        .label(&meeting.name)
        .wrap(true)
        .xalign(0.0)
        .hexpand(true)
        .build();
    name_label.add_css_class("meeting-name");
    title_row.append(&name_label);

    if !meeting.formatted_time.is_empty() {
        let time_label = Label::builder()
            .label(&meeting.formatted_time)
            .xalign(1.0)
            .build();
        time_label.add_css_class("dim-label");
        time_label.add_css_class("caption");
        title_row.append(&time_label);
    }

    content.append(&title_row);

    // Absent fields are left out entirely rather than rendered blank.
    let subtext = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(4)
        .build();

    if let Some(country) = &meeting.country {
        subtext.append(&badge(country, "badge-country"));
    }

    if let Some(region) = &meeting.region {
        subtext.append(&badge(region, "badge-region"));
    }

    if let Some(distance) = meeting.distance {
        subtext.append(&badge(&format!("{:.1} km", distance), "badge-distance"));
    }

    if meeting.online {
        subtext.append(&badge("Online", "badge-online"));
    }

    content.append(&subtext);

    let actions = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(6)
        .build();

    let info_button = Button::builder().label("Info").build();
    info_button.add_css_class("flat");

    let state_for_info = state.clone();
    let meeting_for_info = meeting.clone();
    info_button.connect_clicked(move |_| {
        let callback = state_for_info.borrow().show_info.clone();
        if let Some(callback) = callback {
            callback(meeting_for_info.clone());
        }
    });
    actions.append(&info_button);

    let view_button = Button::builder().label("View on map").build();
    view_button.add_css_class("flat");

    if meeting.position.is_none() {
        view_button.set_sensitive(false);
        view_button.set_tooltip_text(Some("No location available"));
    } else {
        let state_for_view = state.clone();
        let meeting_for_view = meeting.clone();
        view_button.connect_clicked(move |_| {
            let callback = state_for_view.borrow().view_on_map.clone();
            if let Some(callback) = callback {
                callback(meeting_for_view.clone());
            }
        });
    }
    actions.append(&view_button);

    content.append(&actions);
    card.append(&content);

    ListBoxRow::builder().child(&card).activatable(false).build()
}

fn badge(text: &str, class: &str) -> Label {
    let label = Label::builder().label(text).build();
    label.add_css_class("badge");
    label.add_css_class(class);
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focusing_twice_is_a_no_op_the_second_time() {
        let mut tracker = FocusTracker::default();

        let first = tracker.focus(7);
        assert!(first.is_some());
        assert_eq!(first.unwrap().unfocus, None);

        assert!(tracker.focus(7).is_none());
        assert_eq!(tracker.focused(), Some(7));
    }

    #[test]
    fn focusing_another_meeting_hands_over_the_highlight() {
        let mut tracker = FocusTracker::default();

        tracker.focus(1);
        let change = tracker.focus(2).unwrap();

        assert_eq!(change.unfocus, Some(1));
        assert_eq!(tracker.focused(), Some(2));
    }

    #[test]
    fn clearing_forgets_the_highlight() {
        let mut tracker = FocusTracker::default();

        tracker.focus(1);
        tracker.clear();

        assert_eq!(tracker.focused(), None);
        assert_eq!(tracker.focus(1).unwrap().unfocus, None);
    }
}
