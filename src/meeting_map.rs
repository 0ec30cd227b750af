use anyhow::Context;
use gtk::prelude::*;
use gtk::{Align, Label, Overlay};
use libshumate::prelude::{LocationExt, MarkerExt};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::cluster::{cluster_markers, sample_cluster_icons, Cluster, ClusterPoint};
use crate::config::Config;
use crate::data::{
    Meeting, MeetingCallback, Position, CLUSTER_ICON_CAP, CLUSTER_RADIUS_PX, FOCUS_ZOOM,
    INITIAL_ZOOM, MAX_ZOOM, MIN_ZOOM, SEARCH_ZOOM,
};
use crate::icons::{self, IconCache};

struct MapEntry {
    meeting: Rc<Meeting>,
    position: Position,
}

struct MapState {
    /// Added meetings in insertion order; clustering depends on it.
    entries: Vec<MapEntry>,
    /// Positions keyed by meeting id, for focus lookups.
    positions: HashMap<i32, Position>,
    icons: IconCache<Option<gdk::Texture>>,
    click_callback: Option<MeetingCallback>,
}

/// The interactive map. Meetings with a known position become markers,
/// grouped into clusters when they sit close together at the current zoom.
#[derive(Clone)]
pub struct MeetingMap {
    widget: libshumate::SimpleMap,
    map: libshumate::Map,
    marker_layer: libshumate::MarkerLayer,
    state: Rc<RefCell<MapState>>,
}

impl MeetingMap {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let widget = libshumate::SimpleMap::new();

        let map_source = libshumate::RasterRenderer::from_url(&config.tile_url);
        widget.set_map_source(Some(&map_source));

        let map = widget.map().context("map widget has no map view")?;
        let viewport = map.viewport().context("map widget has no viewport")?;

        let marker_layer = libshumate::MarkerLayer::new(&viewport);
        map.add_layer(&marker_layer);

        viewport.set_min_zoom_level(MIN_ZOOM);
        viewport.set_max_zoom_level(MAX_ZOOM);
        map.go_to_full(0.0, 0.0, INITIAL_ZOOM);

        widget.set_vexpand(true);
        widget.set_hexpand(true);

        let state = Rc::new(RefCell::new(MapState {
            entries: Vec::new(),
            positions: HashMap::new(),
            icons: IconCache::new(),
            click_callback: None,
        }));

        let meeting_map = Self {
            widget,
            map,
            marker_layer,
            state,
        };

        // Clusters form and dissolve with the zoom level.
        let map_for_zoom = meeting_map.clone();
        viewport.connect_zoom_level_notify(move |_| {
            map_for_zoom.rebuild_markers();
        });

        Ok(meeting_map)
    }

    pub fn widget(&self) -> &libshumate::SimpleMap {
        &self.widget
    }

    /// Adds a marker for `meeting`. Meetings without a position are skipped
    /// entirely; a later `focus` on them does nothing.
    pub fn add_meeting(&self, meeting: Rc<Meeting>) {
        if !self.record_meeting(meeting) {
            return;
        }

        self.rebuild_markers();
    }

    pub fn add_meetings(&self, meetings: &[Rc<Meeting>]) {
        let mut added = false;

        for meeting in meetings {
            added |= self.record_meeting(meeting.clone());
        }

        if added {
            self.rebuild_markers();
        }
    }

    fn record_meeting(&self, meeting: Rc<Meeting>) -> bool {
        let Some(position) = meeting.position else {
            log::debug!("meeting {} has no position, not placing it", meeting.id);
            return false;
        };

        let mut state = self.state.borrow_mut();
        state.positions.insert(meeting.id, position);
        state.entries.push(MapEntry { meeting, position });
        true
    }

    /// Flies to the meeting's marker. No-op when the meeting was never
    /// added, e.g. because it has no position.
    pub fn focus(&self, meeting: &Meeting) {
        let position = self.state.borrow().positions.get(&meeting.id).copied();

        if let Some(position) = position {
            self.map
                .go_to_full(position.latitude, position.longitude, FOCUS_ZOOM);
        }
    }

    /// Recenters on an arbitrary coordinate, e.g. a geocoded search origin.
    pub fn go_to_position(&self, position: Position) {
        self.map
            .go_to_full(position.latitude, position.longitude, SEARCH_ZOOM);
    }

    /// Removes every marker and forgets every added meeting; `focus` calls
    /// for previously added meetings become no-ops until re-added.
    pub fn clear(&self) {
        {
            let mut state = self.state.borrow_mut();
            state.entries.clear();
            state.positions.clear();
        }

        self.marker_layer.remove_all();
    }

    /// Single subscriber; registering a new callback replaces the old one.
    pub fn set_marker_click_callback(&self, callback: impl Fn(Rc<Meeting>) + 'static) {
        self.state.borrow_mut().click_callback = Some(Rc::new(callback));
    }

    fn rebuild_markers(&self) {
        let zoom = self
            .map
            .viewport()
            .map(|viewport| viewport.zoom_level())
            .unwrap_or(INITIAL_ZOOM);

        let clusters = {
            let state = self.state.borrow();

            let points: Vec<ClusterPoint> = state
                .entries
                .iter()
                .map(|entry| ClusterPoint {
                    id: entry.meeting.id,
                    org: entry.meeting.org,
                    position: entry.position,
                })
                .collect();

            cluster_markers(&points, zoom, CLUSTER_RADIUS_PX)
        };

        self.marker_layer.remove_all();

        for cluster in clusters {
            let marker = libshumate::Marker::new();
            marker.set_location(cluster.anchor.latitude, cluster.anchor.longitude);

            if cluster.members.len() == 1 {
                marker.set_child(Some(&self.build_single_marker(cluster.members[0].id)));
            } else {
                marker.set_child(Some(&self.build_cluster_marker(&cluster)));
            }

            self.marker_layer.add_marker(&marker);
        }
    }

    fn build_single_marker(&self, id: i32) -> gtk::Button {
        let (meeting, texture) = {
            let mut state = self.state.borrow_mut();

            let meeting = state
                .entries
                .iter()
                .find(|entry| entry.meeting.id == id)
                .map(|entry| entry.meeting.clone())
                .expect("marker built for a meeting that was never recorded");

            let texture = state.icons.get_or_load(meeting.org, icons::load_logo_texture);
            (meeting, texture)
        };

        let button = gtk::Button::builder()
            .child(&icons::logo_image(texture.as_ref()))
            .tooltip_text(&meeting.name)
            .build();
        button.add_css_class("map-marker");

        let state = self.state.clone();
        button.connect_clicked(move |_| {
            let callback = state.borrow().click_callback.clone();
            if let Some(callback) = callback {
                callback(meeting.clone());
            }
        });

        button
    }

    fn build_cluster_marker(&self, cluster: &Cluster) -> gtk::Button {
        let sample = sample_cluster_icons(&cluster.members, CLUSTER_ICON_CAP);

        const STACK_OFFSET: i32 = 12;

        let base = gtk::Box::builder()
            .width_request(icons::LOGO_SIZE + STACK_OFFSET * (sample.len() as i32 - 1))
            .height_request(icons::LOGO_SIZE)
            .build();

        let overlay = Overlay::new();
        overlay.set_child(Some(&base));

        // The sample comes back reversed; rendering it in order stacks the
        // distinct-organization logos last, i.e. on top.
        for (index, member) in sample.iter().enumerate() {
            let texture = self
                .state
                .borrow_mut()
                .icons
                .get_or_load(member.org, icons::load_logo_texture);

            let image = icons::logo_image(texture.as_ref());
            image.set_halign(Align::Start);
            image.set_valign(Align::Center);
            image.set_margin_start(STACK_OFFSET * index as i32);
            overlay.add_overlay(&image);
        }

        let count_label = Label::builder()
            .label(&cluster.members.len().to_string())
            .halign(Align::End)
            .valign(Align::Start)
            .build();
        count_label.add_css_class("cluster-count");
        overlay.add_overlay(&count_label);

        let button = gtk::Button::builder().child(&overlay).build();
        button.add_css_class("map-marker");
        button.add_css_class("map-cluster");

        // Clicking a cluster zooms toward its members.
        let map = self.map.clone();
        let anchor = cluster.anchor;
        button.connect_clicked(move |_| {
            let zoom = map
                .viewport()
                .map(|viewport| viewport.zoom_level())
                .unwrap_or(INITIAL_ZOOM);
            let target = (zoom + 2.0).min(MAX_ZOOM as f64);

            map.go_to_full(anchor.latitude, anchor.longitude, target);
        });

        button
    }
}
