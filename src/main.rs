use gtk::prelude::*;
use gtk::{glib, Application, Orientation};
use libadwaita::{prelude::*, ApplicationWindow, ColorScheme, HeaderBar, StyleManager, ToolbarView};
use std::cell::RefCell;
use std::rc::Rc;

mod api;
mod cluster;
mod config;
mod data;
mod details;
mod icons;
mod meeting_map;
mod paging;
mod results_list;
mod search_bar;

use api::DistanceOptions;
use config::Config;
use data::{Meeting, APP_ID};
use details::DetailsPopup;
use meeting_map::MeetingMap;
use results_list::ResultsList;
use search_bar::{SearchBar, SearchQuery};

fn main() -> glib::ExitCode {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Initialize Tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().unwrap();
    let _guard = rt.enter();

    let app = Application::builder().application_id(APP_ID).build();

    app.connect_activate(build_ui);

    let exit_code = app.run();

    // Keep runtime alive until app exits
    drop(_guard);
    drop(rt);

    exit_code
}

fn build_ui(app: &Application) {
    let style_manager = StyleManager::default();
    style_manager.set_color_scheme(ColorScheme::Default);

    let config = Rc::new(
        config::load().unwrap_or_else(|e| panic!("failed to load configuration: {:#}", e)),
    );

    let search_bar = SearchBar::new();
    let results_list = ResultsList::new();
    let meeting_map = MeetingMap::new(&config)
        .unwrap_or_else(|e| panic!("failed to initialise the map: {:#}", e));

    let sidebar = gtk::Box::builder()
        .orientation(Orientation::Vertical)
        .spacing(8)
        .margin_top(12)
        .margin_bottom(12)
        .margin_start(12)
        .margin_end(12)
        .build();
    sidebar.append(search_bar.widget());
    sidebar.append(results_list.widget());

    // Side-by-side on wide windows, stacked on narrow ones.
    let paned = gtk::Paned::builder()
        .orientation(Orientation::Horizontal)
        .wide_handle(true)
        .build();

    paned.set_start_child(Some(&sidebar));
    paned.set_resize_start_child(false);
    paned.set_shrink_start_child(false);

    paned.set_end_child(Some(meeting_map.widget()));
    paned.set_resize_end_child(true);
    paned.set_shrink_end_child(false);

    paned.set_position(380);

    let paned_weak = paned.downgrade();
    paned.add_tick_callback(move |_widget, _clock| {
        if let Some(paned) = paned_weak.upgrade() {
            let width = paned.width();
            let height = paned.height();

            if width > 0 && height > 0 {
                let should_be_horizontal = width > height;
                let is_horizontal = paned.orientation() == Orientation::Horizontal;

                if should_be_horizontal != is_horizontal {
                    if should_be_horizontal {
                        paned.set_orientation(Orientation::Horizontal);
                        paned.set_position(380);
                    } else {
                        paned.set_orientation(Orientation::Vertical);
                        paned.set_position(260);
                    }
                }
            }
        }
        glib::ControlFlow::Continue
    });

    let refresh_button = gtk::Button::builder()
        .icon_name("view-refresh-symbolic")
        .tooltip_text("Search again")
        .build();

    let header_bar = HeaderBar::builder().build();
    header_bar.pack_start(&refresh_button);

    let toolbar_view = ToolbarView::builder().build();
    toolbar_view.add_top_bar(&header_bar);
    toolbar_view.set_content(Some(&paned));

    let window = ApplicationWindow::builder()
        .application(app)
        .title("Meeting Finder")
        .default_width(1000)
        .default_height(700)
        .build();

    load_css(&window);
    window.set_content(Some(&toolbar_view));

    let details = DetailsPopup::new(&window);

    // Clicking "View on map" flies the map to the meeting and highlights
    // its row; marker clicks and "Info" both open the details window.
    results_list.set_view_on_map_callback({
        let meeting_map = meeting_map.clone();
        let results_list = results_list.clone();
        move |meeting| {
            meeting_map.focus(&meeting);
            results_list.focus(&meeting);
        }
    });

    results_list.set_show_info_callback({
        let details = details.clone();
        move |meeting| details.show_meeting(&meeting)
    });

    meeting_map.set_marker_click_callback({
        let details = details.clone();
        move |meeting| details.show_meeting(&meeting)
    });

    let current_query: Rc<RefCell<Option<SearchQuery>>> = Rc::new(RefCell::new(None));

    search_bar.set_search_callback({
        let config = config.clone();
        let search_bar = search_bar.clone();
        let results_list = results_list.clone();
        let meeting_map = meeting_map.clone();
        let current_query = current_query.clone();
        move |query| {
            *current_query.borrow_mut() = Some(query.clone());
            start_search(
                config.clone(),
                search_bar.clone(),
                results_list.clone(),
                meeting_map.clone(),
                Some(query),
            );
        }
    });

    refresh_button.connect_clicked({
        let config = config.clone();
        let search_bar = search_bar.clone();
        let results_list = results_list.clone();
        let meeting_map = meeting_map.clone();
        let current_query = current_query.clone();
        move |_| {
            let query = current_query.borrow().clone();
            start_search(
                config.clone(),
                search_bar.clone(),
                results_list.clone(),
                meeting_map.clone(),
                query,
            );
        }
    });

    // Initial load: everything, unfiltered.
    start_search(
        config.clone(),
        search_bar.clone(),
        results_list.clone(),
        meeting_map.clone(),
        None,
    );

    window.present();
}

fn start_search(
    config: Rc<Config>,
    search_bar: SearchBar,
    results_list: ResultsList,
    meeting_map: MeetingMap,
    query: Option<SearchQuery>,
) {
    glib::spawn_future_local(async move {
        run_search(&config, &search_bar, &results_list, &meeting_map, query).await;
    });
}

async fn run_search(
    config: &Config,
    search_bar: &SearchBar,
    results_list: &ResultsList,
    meeting_map: &MeetingMap,
    query: Option<SearchQuery>,
) {
    results_list.set_loading(true);
    meeting_map.clear();

    let mut distance_options = None;

    if let Some(query) = &query {
        if let Some(location) = &query.location {
            match api::fetch_position_by_query(config, location).await {
                Ok(Some(position)) => {
                    distance_options = Some(DistanceOptions {
                        position,
                        distance: query.distance,
                    });
                }
                Ok(None) => {
                    log::info!("no geocoding matches for {:?}", location);
                    search_bar.set_location_error("No matches found for this location");
                    results_list.set_loading(false);
                    results_list.show_message("Try a different location or radius.");
                    return;
                }
                Err(e) => {
                    log::error!("geocoding failed: {}", e);
                    search_bar.set_location_error("Location lookup failed, try again later");
                    results_list.set_loading(false);
                    return;
                }
            }
        }
    }

    match api::fetch_meetings(config, distance_options.as_ref()).await {
        Ok(meetings) => {
            let meetings: Vec<Rc<Meeting>> = meetings.into_iter().map(Rc::new).collect();
            log::info!("loaded {} meetings", meetings.len());

            results_list.set_loading(false);
            results_list.set_meetings(meetings.clone());

            if meetings.is_empty() {
                results_list.show_message("No meetings found for this search.");
            }

            meeting_map.add_meetings(&meetings);

            if let Some(options) = distance_options {
                meeting_map.go_to_position(options.position);
            }
        }
        Err(e) => {
            log::error!("failed to fetch meetings: {}", e);
            results_list.set_loading(false);
            results_list.show_message("Could not load meetings. Check that the meeting index is reachable.");
        }
    }
}

fn load_css(window: &ApplicationWindow) {
    let css_provider = gtk::CssProvider::new();
    css_provider.load_from_data(
        ".meeting-card {
            border-radius: 8px;
        }
        .meeting-name {
            font-size: 14px;
            font-weight: 600;
        }
        row.focused {
            background-color: alpha(@accent_bg_color, 0.2);
            border-radius: 8px;
        }
        .badge {
            background-color: alpha(@accent_bg_color, 0.15);
            border-radius: 6px;
            padding: 2px 8px;
            font-size: 10px;
            font-weight: 600;
            min-height: 0;
        }
        .badge-online {
            background-color: alpha(@success_bg_color, 0.2);
            color: @success_fg_color;
        }
        .badge-distance {
            background-color: alpha(@window_fg_color, 0.08);
            color: alpha(@window_fg_color, 0.7);
        }
        .map-marker {
            background-color: alpha(@window_bg_color, 0.75);
            border-radius: 16px;
            padding: 2px;
            min-height: 0;
            min-width: 0;
            box-shadow: 0 2px 6px alpha(black, 0.4);
        }
        .map-marker:hover {
            background-color: alpha(@window_bg_color, 0.95);
            box-shadow: 0 3px 8px alpha(black, 0.5);
        }
        .cluster-count {
            background-color: @accent_bg_color;
            color: @accent_fg_color;
            border-radius: 10px;
            padding: 1px 6px;
            font-size: 10px;
            font-weight: 700;
        }",
    );

    gtk::style_context_add_provider_for_display(
        &gtk::prelude::WidgetExt::display(window),
        &css_provider,
        gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
    );
}
