//! Map reactor: pushes projected note points to a host map.
//!
//! # Responsibility
//! - Show visible notes on the `Notes` layer and frame them.
//! - Show the focused note on the `Focus` layer.
//!
//! # Invariants
//! - An empty `visible_locations` leaves the map untouched (keeps last view).
//! - `focus_location` is always pushed, including when empty.

use crate::geo::{bbox, BoundingBox};
use crate::projections::{Locations, NoteProjections};
use crate::reactive::{Effect, Runtime};
use log::debug;
use std::rc::Rc;

/// Padding around fitted bounds, in screen pixels.
pub const FIT_BOUNDS_PADDING: u32 = 100;

/// Map data sources the reactor writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapSource {
    Notes,
    Focus,
}

/// Host-side map renderer.
pub trait MapSurface {
    fn set_source_data(&self, source: MapSource, data: &Locations);
    fn fit_bounds(&self, bounds: BoundingBox, padding: u32);
}

/// Effects binding [`NoteProjections`] to a [`MapSurface`].
///
/// Mount once the host map has loaded; dropping the reactor stops updates.
pub struct MapReactor {
    _visible: Effect,
    _focus: Effect,
}

impl MapReactor {
    pub fn mount<S: MapSurface + 'static>(
        runtime: &Runtime,
        projections: &NoteProjections,
        surface: Rc<S>,
    ) -> Self {
        let visible = runtime.effect({
            let locations = projections.visible_locations.clone();
            let surface = surface.clone();
            move || {
                let locations = locations.get();
                let Some(bounds) = bbox(&locations) else {
                    return;
                };
                surface.set_source_data(MapSource::Notes, &locations);
                surface.fit_bounds(bounds, FIT_BOUNDS_PADDING);
                debug!(
                    "event=map_update module=map status=ok source=notes features={}",
                    locations.len()
                );
            }
        });

        let focus = runtime.effect({
            let location = projections.focus_location.clone();
            move || {
                let location = location.get();
                surface.set_source_data(MapSource::Focus, &location);
            }
        });

        Self {
            _visible: visible,
            _focus: focus,
        }
    }
}
