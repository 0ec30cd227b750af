use gtk::glib;
use gtk::prelude::*;
use gtk::{Align, Button, Label, Orientation, ScrolledWindow};
use libadwaita::{prelude::*, HeaderBar, ToolbarView};
use std::cell::RefCell;
use std::rc::Rc;

use crate::data::Meeting;
use crate::icons::{self, IconCache};

/// Modal window with the full record for one meeting. Rows for absent
/// fields are left out rather than rendered empty.
#[derive(Clone)]
pub struct DetailsPopup {
    parent: gtk::Window,
    icons: Rc<RefCell<IconCache<Option<gdk::Texture>>>>,
}

impl DetailsPopup {
    pub fn new(parent: &impl IsA<gtk::Window>) -> Self {
        Self {
            parent: parent.clone().upcast(),
            icons: Rc::new(RefCell::new(IconCache::new())),
        }
    }

    pub fn show_meeting(&self, meeting: &Meeting) {
        let content = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(10)
            .margin_top(12)
            .margin_bottom(12)
            .margin_start(16)
            .margin_end(16)
            .build();

        let header = gtk::Box::builder()
            .orientation(Orientation::Horizontal)
            .spacing(12)
            .build();

        let texture = self
            .icons
            .borrow_mut()
            .get_or_load(meeting.org, icons::load_logo_texture);
        header.append(&icons::logo_image(texture.as_ref()));

        let heading = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(2)
            .build();

        let name_label = Label::builder()
            .label(&meeting.name)
            .wrap(true)
            .xalign(0.0)
            .build();
        name_label.add_css_class("title-3");
        heading.append(&name_label);

        let org_label = Label::builder()
            .label(&meeting.org.to_string())
            .xalign(0.0)
            .build();
        org_label.add_css_class("dim-label");
        heading.append(&org_label);

        if !meeting.formatted_time.is_empty() {
            let time_label = Label::builder()
                .label(&meeting.formatted_time)
                .xalign(0.0)
                .build();
            time_label.add_css_class("dim-label");
            heading.append(&time_label);
        }

        header.append(&heading);
        content.append(&header);

        if let Some(notes) = &meeting.notes {
            content.append(&linkified_label(notes));
        }

        let location = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(4)
            .build();

        if let Some(location_name) = &meeting.location_name {
            location.append(&detail_row("Location", location_name));
        }

        if let Some(address) = &meeting.address {
            location.append(&detail_row("Address", address));
        }

        if let Some(region) = &meeting.region {
            location.append(&detail_row("Region", region));
        }

        if let Some(country) = &meeting.country {
            location.append(&detail_row("Country", country));
        }

        if let Some(distance) = meeting.distance {
            location.append(&detail_row("Distance", &format!("{:.1} km", distance)));
        }

        if let Some(location_notes) = &meeting.location_notes {
            location.append(&linkified_label(location_notes));
        }

        if location.first_child().is_some() {
            content.append(&section_label("Where"));
            content.append(&location);
        }

        if meeting.online {
            content.append(&section_label("Online"));

            if let Some(online_url) = &meeting.online_url {
                let join_button = Button::builder()
                    .label("Join online meeting")
                    .halign(Align::Start)
                    .build();
                join_button.add_css_class("suggested-action");

                let url = online_url.clone();
                join_button.connect_clicked(move |_| {
                    if let Err(e) = open::that(&url) {
                        log::warn!("failed to open {}: {}", url, e);
                    }
                });
                content.append(&join_button);
            }

            if let Some(online_notes) = &meeting.online_notes {
                content.append(&linkified_label(online_notes));
            }
        }

        let contact = gtk::Box::builder()
            .orientation(Orientation::Vertical)
            .spacing(4)
            .build();

        if let Some(email) = &meeting.email {
            contact.append(&link_row("Email", email, &format!("mailto:{}", email)));
        }

        if let Some(phone) = &meeting.phone {
            contact.append(&link_row("Phone", phone, &format!("tel:{}", phone)));
        }

        if contact.first_child().is_some() {
            content.append(&section_label("Contact"));
            content.append(&contact);
        }

        let source_button = Button::builder()
            .label("View source")
            .halign(Align::Start)
            .build();
        source_button.add_css_class("flat");
        source_button.set_tooltip_text(Some(&meeting.source));

        let source = meeting.source.clone();
        source_button.connect_clicked(move |_| {
            if let Err(e) = open::that(&source) {
                log::warn!("failed to open {}: {}", source, e);
            }
        });
        content.append(&source_button);

        let scrolled = ScrolledWindow::builder()
            .hscrollbar_policy(gtk::PolicyType::Never)
            .propagate_natural_height(true)
            .build();
        scrolled.set_child(Some(&content));

        let toolbar_view = ToolbarView::builder().build();
        toolbar_view.add_top_bar(&HeaderBar::builder().build());
        toolbar_view.set_content(Some(&scrolled));

        let window = libadwaita::Window::builder()
            .transient_for(&self.parent)
            .modal(true)
            .title("Meeting details")
            .default_width(420)
            .default_height(480)
            .build();
        window.set_content(Some(&toolbar_view));

        window.present();
    }
}

fn section_label(text: &str) -> Label {
    let label = Label::builder().label(text).xalign(0.0).build();
    label.add_css_class("heading");
    label
}

fn detail_row(name: &str, value: &str) -> gtk::Box {
    let row = gtk::Box::builder()
        .orientation(Orientation::Horizontal)
        .spacing(8)
        .build();

    let name_label = Label::builder().label(name).xalign(0.0).width_chars(9).build();
    name_label.add_css_class("dim-label");
    name_label.add_css_class("caption");
    name_label.set_valign(Align::Start);

    let value_label = Label::builder()
        .label(value)
        .wrap(true)
        .xalign(0.0)
        .hexpand(true)
        .build();

    row.append(&name_label);
    row.append(&value_label);
    row
}

fn link_row(name: &str, text: &str, href: &str) -> gtk::Box {
    let row = detail_row(name, "");

    let value = row.last_child().expect("detail row has a value label");
    let value = value.downcast::<Label>().expect("detail row value is a label");

    value.set_markup(&format!(
        "<a href=\"{}\">{}</a>",
        escape(href),
        escape(text)
    ));
    connect_open_on_activate(&value);

    row
}

fn linkified_label(text: &str) -> Label {
    let label = Label::builder().wrap(true).xalign(0.0).build();
    label.set_markup(&linkify_markup(text));
    connect_open_on_activate(&label);
    label
}

fn connect_open_on_activate(label: &Label) {
    label.connect_activate_link(|_, uri| {
        if let Err(e) = open::that(uri) {
            log::warn!("failed to open {}: {}", uri, e);
        }
        glib::Propagation::Stop
    });
}

fn escape(text: &str) -> String {
    glib::markup_escape_text(text).to_string()
}

/// Pango markup for free-form notes with URLs and email addresses wrapped
/// in links. Tokenizes on whitespace, so surrounding text keeps its exact
/// spacing.
pub fn linkify_markup(text: &str) -> String {
    let mut out = String::new();
    let mut token = String::new();

    for ch in text.chars() {
        if ch.is_whitespace() {
            render_token(&mut out, &token);
            token.clear();
            out.push(ch);
        } else {
            token.push(ch);
        }
    }

    render_token(&mut out, &token);
    out
}

fn render_token(out: &mut String, token: &str) {
    if token.is_empty() {
        return;
    }

    match link_target(token) {
        Some(href) => out.push_str(&format!(
            "<a href=\"{}\">{}</a>",
            escape(&href),
            escape(token)
        )),
        None => out.push_str(&escape(token)),
    }
}

fn link_target(token: &str) -> Option<String> {
    if token.starts_with("http://") || token.starts_with("https://") {
        return Some(token.to_string());
    }

    if token.starts_with("www.") && token.len() > 4 {
        return Some(format!("https://{}", token));
    }

    if is_email(token) {
        return Some(format!("mailto:{}", token));
    }

    None
}

fn is_email(token: &str) -> bool {
    let Some((user, domain)) = token.split_once('@') else {
        return false;
    };

    !user.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_become_links() {
        let markup = linkify_markup("join us at https://example.org/meet tonight");

        assert_eq!(
            markup,
            "join us at <a href=\"https://example.org/meet\">https://example.org/meet</a> tonight"
        );
    }

    #[test]
    fn bare_www_addresses_get_a_scheme() {
        let markup = linkify_markup("see www.example.org");

        assert_eq!(
            markup,
            "see <a href=\"https://www.example.org\">www.example.org</a>"
        );
    }

    #[test]
    fn email_addresses_become_mailto_links() {
        let markup = linkify_markup("write to host@example.org please");

        assert_eq!(
            markup,
            "write to <a href=\"mailto:host@example.org\">host@example.org</a> please"
        );
    }

    #[test]
    fn plain_text_is_escaped_not_linked() {
        let markup = linkify_markup("coffee & cake at 7");

        assert_eq!(markup, "coffee &amp; cake at 7");
    }

    #[test]
    fn spacing_is_preserved() {
        let markup = linkify_markup("a  b\nc");

        assert_eq!(markup, "a  b\nc");
    }

    #[test]
    fn handles_at_sign_without_domain_dot() {
        let markup = linkify_markup("meet @ the hall");

        assert_eq!(markup, "meet @ the hall");
    }
}
