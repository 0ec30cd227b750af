use std::rc::Rc;

use crate::data::Meeting;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub start: usize,
    pub count: usize,
    pub exceeds_bounds: bool,
}

/// Pagination state for the results list: the full backing collection, a
/// fixed page size, and the current page index. Page 0 is always valid,
/// even for an empty collection; every other index must fall within
/// `[0, ceil(total / page_size) - 1]`.
#[derive(Debug)]
pub struct Pager {
    meetings: Vec<Rc<Meeting>>,
    page: usize,
    page_size: usize,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        assert!(page_size > 0, "page size must be positive");

        Self {
            meetings: Vec::new(),
            page: 0,
            page_size,
        }
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }

    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Replaces the backing collection and resets to the first page.
    pub fn set_meetings(&mut self, meetings: Vec<Rc<Meeting>>) {
        self.meetings = meetings;
        self.page = 0;
    }

    /// Appends to the backing collection without touching the current page.
    pub fn add_meetings(&mut self, meetings: Vec<Rc<Meeting>>) {
        self.meetings.extend(meetings);
    }

    pub fn page_info(&self, page: i64) -> PageInfo {
        let total_pages = self.meetings.len().div_ceil(self.page_size) as i64;
        let exceeds_bounds = (page > total_pages - 1 || page < 0) && page != 0;

        if exceeds_bounds {
            return PageInfo {
                start: 0,
                count: 0,
                exceeds_bounds,
            };
        }

        let start = self.page_size * page as usize;
        let count = self
            .meetings
            .len()
            .saturating_sub(start)
            .min(self.page_size);

        PageInfo {
            start,
            count,
            exceeds_bounds,
        }
    }

    /// Moves to `page` and reports whether anything changed. Out-of-range
    /// requests are rejected silently, leaving the current page as-is.
    pub fn set_page(&mut self, page: i64) -> bool {
        if self.page_info(page).exceeds_bounds {
            return false;
        }

        self.page = page as usize;
        true
    }

    pub fn has_next_page(&self) -> bool {
        !self.page_info(self.page as i64 + 1).exceeds_bounds
    }

    pub fn has_prev_page(&self) -> bool {
        !self.page_info(self.page as i64 - 1).exceeds_bounds
    }

    /// The slice of meetings on the current page.
    pub fn visible(&self) -> &[Rc<Meeting>] {
        let info = self.page_info(self.page as i64);
        &self.meetings[info.start..info.start + info.count]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Organization, WeekDay};
    use chrono::NaiveTime;

    fn meeting(id: i32) -> Rc<Meeting> {
        Rc::new(Meeting {
            id,
            name: format!("Meeting {}", id),
            org: Organization::AnonymousAlcoholics,
            notes: None,
            source: String::new(),
            position: None,
            country: None,
            region: None,
            address: None,
            location_name: None,
            location_notes: None,
            distance: None,
            email: None,
            phone: None,
            online: false,
            online_url: None,
            online_notes: None,
            recurring: true,
            day: WeekDay::Monday,
            time: NaiveTime::MIN,
            duration_in_secs: None,
            formatted_time: String::new(),
        })
    }

    fn pager_with(total: i32, page_size: usize) -> Pager {
        let mut pager = Pager::new(page_size);
        pager.set_meetings((1..=total).map(meeting).collect());
        pager
    }

    #[test]
    fn every_valid_page_shows_the_expected_slice() {
        let mut pager = pager_with(45, 20);

        assert!(pager.set_page(0));
        assert_eq!(pager.visible().len(), 20);
        assert_eq!(pager.visible()[0].id, 1);

        assert!(pager.set_page(1));
        assert_eq!(pager.visible().len(), 20);
        assert_eq!(pager.visible()[0].id, 21);

        assert!(pager.set_page(2));
        assert_eq!(pager.visible().len(), 5);
        assert_eq!(pager.visible()[0].id, 41);
    }

    #[test]
    fn out_of_range_pages_leave_state_unchanged() {
        let mut pager = pager_with(45, 20);
        assert!(pager.set_page(1));

        assert!(!pager.set_page(-1));
        assert!(!pager.set_page(3));

        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.visible()[0].id, 21);
    }

    #[test]
    fn page_zero_is_valid_for_an_empty_collection() {
        let mut pager = Pager::new(20);

        assert!(pager.set_page(0));
        assert!(pager.visible().is_empty());
        assert!(!pager.has_next_page());
        assert!(!pager.has_prev_page());
    }

    #[test]
    fn set_meetings_resets_to_the_first_page() {
        let mut pager = pager_with(45, 20);
        pager.set_page(2);

        pager.set_meetings((1..=5).map(meeting).collect());

        assert_eq!(pager.current_page(), 0);
        assert_eq!(pager.visible().len(), 5);
    }

    #[test]
    fn add_meetings_keeps_the_current_page() {
        let mut pager = pager_with(25, 20);
        pager.set_page(1);

        pager.add_meetings((26..=30).map(meeting).collect());

        assert_eq!(pager.current_page(), 1);
        assert_eq!(pager.visible().len(), 10);
        assert_eq!(pager.len(), 30);
    }

    #[test]
    fn pagination_reachability_tracks_the_bounds() {
        let mut pager = pager_with(45, 20);

        assert!(!pager.has_prev_page());
        assert!(pager.has_next_page());

        pager.set_page(2);
        assert!(pager.has_prev_page());
        assert!(!pager.has_next_page());
    }

    #[test]
    fn exactly_full_last_page_has_no_next() {
        let mut pager = pager_with(40, 20);

        pager.set_page(1);
        assert_eq!(pager.visible().len(), 20);
        assert!(!pager.has_next_page());
        assert!(!pager.set_page(2));
    }
}
