use gtk::glib;
use std::collections::HashMap;

use crate::data::Organization;

pub const LOGO_SIZE: i32 = 40;

/// Lazily-filled organization → icon mapping, owned by the component that
/// renders the icons. Once an entry exists for an organization it is never
/// reloaded; `get_or_load` hands back the cached value itself.
#[derive(Debug, Default)]
pub struct IconCache<T> {
    icons: HashMap<Organization, T>,
}

impl<T: Clone> IconCache<T> {
    pub fn new() -> Self {
        Self {
            icons: HashMap::new(),
        }
    }

    pub fn get_or_load(&mut self, org: Organization, load: impl FnOnce(Organization) -> T) -> T {
        self.icons
            .entry(org)
            .or_insert_with(|| load(org))
            .clone()
    }
}

pub fn logo_bytes(org: Organization) -> &'static [u8] {
    match org {
        Organization::AnonymousAlcoholics => include_bytes!("../assets/logos/aa.svg"),
        Organization::DebtorsAnonymous => include_bytes!("../assets/logos/da.svg"),
        Organization::CrystalMethAnonymous => include_bytes!("../assets/logos/cma.svg"),
        Organization::CodependentsAnonymous => include_bytes!("../assets/logos/coda.svg"),
        Organization::NarcoticsAnonymous => include_bytes!("../assets/logos/na.svg"),
    }
}

/// Decodes the embedded logo for `org`. Returns `None` (and logs) when the
/// image loader cannot handle the asset, so callers can fall back to a
/// plain marker.
pub fn load_logo_texture(org: Organization) -> Option<gdk::Texture> {
    let bytes = glib::Bytes::from_static(logo_bytes(org));

    match gdk::Texture::from_bytes(&bytes) {
        Ok(texture) => Some(texture),
        Err(e) => {
            log::warn!("failed to load logo for {}: {}", org, e);
            None
        }
    }
}

/// A 40px image widget showing the organization logo, shared by list rows,
/// markers, and the details window.
pub fn logo_image(texture: Option<&gdk::Texture>) -> gtk::Image {
    let image = match texture {
        Some(texture) => gtk::Image::from_paintable(Some(texture)),
        None => gtk::Image::from_icon_name("mark-location-symbolic"),
    };

    image.set_pixel_size(LOGO_SIZE);
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn the_loader_runs_once_per_organization() {
        let mut cache: IconCache<Rc<&'static str>> = IconCache::new();
        let loads = Cell::new(0);

        for _ in 0..3 {
            cache.get_or_load(Organization::AnonymousAlcoholics, |_| {
                loads.set(loads.get() + 1);
                Rc::new("aa")
            });
        }

        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn repeated_lookups_return_the_identical_instance() {
        let mut cache: IconCache<Rc<&'static str>> = IconCache::new();

        let first = cache.get_or_load(Organization::NarcoticsAnonymous, |_| Rc::new("na"));
        let second = cache.get_or_load(Organization::NarcoticsAnonymous, |_| Rc::new("other"));

        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn each_organization_gets_its_own_entry() {
        let mut cache: IconCache<Rc<&'static str>> = IconCache::new();

        let aa = cache.get_or_load(Organization::AnonymousAlcoholics, |_| Rc::new("aa"));
        let na = cache.get_or_load(Organization::NarcoticsAnonymous, |_| Rc::new("na"));

        assert!(!Rc::ptr_eq(&aa, &na));
    }

    #[test]
    fn every_organization_has_logo_bytes() {
        for org in [
            Organization::AnonymousAlcoholics,
            Organization::DebtorsAnonymous,
            Organization::CrystalMethAnonymous,
            Organization::CodependentsAnonymous,
            Organization::NarcoticsAnonymous,
        ] {
            assert!(!logo_bytes(org).is_empty());
        }
    }
}
