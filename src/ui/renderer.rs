//! Turns a gallery into rows on a surface.
//!
//! Initial renders and resize re-layouts swap rows in place. Switching to a
//! different gallery cross-fades: old rows fade out (bounded by a timer),
//! new rows are inserted hidden and fade in one after another.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{DataLoadError, InitError};
use crate::layout::{pack_rows, sequence_rows, RowLimits};
use crate::models::{FormatPreference, GalleryDefinition, MediaItem, Orientation, Row, RowPlan};
use crate::ui::surface::RowSurface;
use crate::ui::transition::{race_completion, TransitionEnd};

/// Receives a notification whenever the rendered gallery is replaced or
/// re-laid out.
///
/// The gallery passed in lists items in the order they appear on screen,
/// which differs from document order once rows are sequenced.
pub trait GalleryObserver {
    fn on_gallery_replaced(&self, gallery: &Arc<GalleryDefinition>);
}

/// Measures untagged items so they can be classified by aspect ratio.
pub trait OrientationProbe {
    fn dimensions(&self, item: &MediaItem) -> Option<(u32, u32)>;
}

#[derive(Debug, Clone)]
pub struct RendererSettings {
    pub transition: Duration,
    pub row_stagger: Duration,
    pub format_preference: FormatPreference,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            transition: Duration::from_millis(300),
            row_stagger: Duration::from_millis(60),
            format_preference: FormatPreference::default(),
        }
    }
}

pub struct GalleryRenderer {
    settings: RendererSettings,
    limits: RowLimits,
    gallery: Option<Arc<GalleryDefinition>>,
    probe: Option<Box<dyn OrientationProbe>>,
    // Aspect-ratio classifications for the current gallery, by item id.
    classified: HashMap<String, Orientation>,
    observers: Vec<Rc<dyn GalleryObserver>>,
}

impl GalleryRenderer {
    pub fn new(settings: RendererSettings, limits: RowLimits) -> Self {
        Self {
            settings,
            limits,
            gallery: None,
            probe: None,
            classified: HashMap::new(),
            observers: Vec::new(),
        }
    }

    pub fn with_probe(mut self, probe: Box<dyn OrientationProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn add_observer(&mut self, observer: Rc<dyn GalleryObserver>) {
        self.observers.push(observer);
    }

    pub fn gallery(&self) -> Option<&Arc<GalleryDefinition>> {
        self.gallery.as_ref()
    }

    pub fn limits(&self) -> RowLimits {
        self.limits
    }

    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    fn orientation_of(&mut self, item: &MediaItem) -> Orientation {
        if item.orientation_tagged {
            return item.orientation;
        }
        if let Some(known) = self.classified.get(&item.id) {
            return *known;
        }
        let Some(probe) = self.probe.as_ref() else {
            return item.orientation;
        };
        let orientation = match probe.dimensions(item) {
            Some((w, h)) => Orientation::classify(w, h),
            None => item.orientation,
        };
        self.classified.insert(item.id.clone(), orientation);
        orientation
    }

    /// Packs and sequences `gallery` under `limits`.
    pub fn plan(&mut self, gallery: &GalleryDefinition, limits: RowLimits) -> RowPlan {
        let mut landscape = Vec::new();
        let mut portrait = Vec::new();
        let mut pano = Vec::new();
        for item in &gallery.items {
            match self.orientation_of(item) {
                Orientation::Landscape => landscape.push(item.clone()),
                Orientation::Portrait => portrait.push(item.clone()),
                Orientation::Pano => pano.push(item.clone()),
            }
        }

        let to_rows = |class: Orientation, rows: Vec<Vec<MediaItem>>| -> Vec<Row> {
            rows.into_iter().map(|items| Row::new(class, items)).collect()
        };
        let landscape_rows = to_rows(
            Orientation::Landscape,
            pack_rows(landscape, limits.landscape_max, limits.min_images),
        );
        let portrait_rows = to_rows(
            Orientation::Portrait,
            pack_rows(portrait, limits.portrait_max, limits.min_images),
        );
        // Panoramas always take a row of their own.
        let pano_rows = to_rows(Orientation::Pano, pack_rows(pano, 1, 1));

        let plan = RowPlan::new(sequence_rows(landscape_rows, portrait_rows, pano_rows));
        debug!(
            gallery = %gallery.key,
            rows = plan.len(),
            items = plan.item_count(),
            "Planned gallery rows"
        );
        plan
    }

    fn notify_replaced(&self, gallery: &GalleryDefinition, plan: &RowPlan) {
        if self.observers.is_empty() {
            return;
        }
        let rendered = Arc::new(GalleryDefinition::new(
            gallery.key.clone(),
            gallery.name.clone(),
            plan.items().cloned().collect(),
        ));
        for observer in &self.observers {
            observer.on_gallery_replaced(&rendered);
        }
    }

    fn set_gallery(&mut self, gallery: Arc<GalleryDefinition>) {
        let changed = self
            .gallery
            .as_ref()
            .map_or(true, |current| !Arc::ptr_eq(current, &gallery));
        if changed {
            self.classified.clear();
        }
        self.gallery = Some(gallery);
    }

    /// First render: rows appear without a transition.
    pub fn render_initial(
        &mut self,
        gallery: Arc<GalleryDefinition>,
        surface: &mut dyn RowSurface,
    ) -> Result<RowPlan, InitError> {
        if !surface.is_mounted() {
            warn!("Gallery container missing, skipping render");
            return Err(InitError::MissingContainer);
        }
        self.set_gallery(Arc::clone(&gallery));
        let plan = self.plan(&gallery, self.limits);
        surface.replace_rows(&plan.display_rows(&self.settings.format_preference));
        info!(gallery = %gallery.key, rows = plan.len(), "Rendered gallery");
        self.notify_replaced(&gallery, &plan);
        Ok(plan)
    }

    /// Re-plans the current gallery under new limits and swaps rows in place.
    pub fn relayout(&mut self, limits: RowLimits, surface: &mut dyn RowSurface) -> Option<RowPlan> {
        self.limits = limits;
        let gallery = Arc::clone(self.gallery.as_ref()?);
        let plan = self.plan(&gallery, limits);
        surface.replace_rows(&plan.display_rows(&self.settings.format_preference));
        debug!(gallery = %gallery.key, ?limits, "Re-laid out gallery");
        self.notify_replaced(&gallery, &plan);
        Some(plan)
    }

    /// Cross-fades from the current rows to `gallery`.
    pub async fn switch_gallery(
        &mut self,
        gallery: Arc<GalleryDefinition>,
        surface: &mut dyn RowSurface,
    ) -> Result<RowPlan, InitError> {
        if !surface.is_mounted() {
            return Err(InitError::MissingContainer);
        }
        let transition = self.settings.transition;

        let signal = surface.fade_out_rows(transition);
        if race_completion(signal, transition).await == TransitionEnd::TimedOut {
            debug!(gallery = %gallery.key, "Fade-out finished on fallback timer");
        }
        surface.remove_rows();

        self.set_gallery(Arc::clone(&gallery));
        let plan = self.plan(&gallery, self.limits);
        let rows = plan.display_rows(&self.settings.format_preference);
        surface.insert_hidden_rows(&rows);
        for row in &rows {
            let delay = self.settings.row_stagger * row.row_index as u32;
            surface.fade_in_row(row.row_index, delay, transition);
        }

        info!(gallery = %gallery.key, rows = plan.len(), "Switched gallery");
        self.notify_replaced(&gallery, &plan);
        Ok(plan)
    }

    /// Keeps the page usable when the gallery document fails to load.
    ///
    /// Items already on the page become a single synthesized gallery; with
    /// nothing to show, the surface gets an inline error instead.
    pub fn recover_from_load_error(
        &mut self,
        error: &DataLoadError,
        surface: &mut dyn RowSurface,
    ) -> Option<RowPlan> {
        warn!(%error, "Gallery data unavailable");
        let items = surface.existing_items();
        if items.is_empty() {
            surface.show_error(&format!("Gallery unavailable: {error}"));
            return None;
        }
        let gallery = Arc::new(GalleryDefinition::synthesized(items));
        self.render_initial(gallery, surface).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MetadataResolver;
    use crate::ui::keybindings::Direction;
    use crate::ui::modal::{MediaModal, ModalTemplate, SharedModal, TriggerElement};
    use crate::ui::surface::{FadeSignal, SurfaceEvent, TextSurface};
    use std::cell::RefCell;

    fn item(id: &str, orientation: Orientation) -> MediaItem {
        MediaItem::new(id)
            .with_orientation(orientation)
            .with_source("jpg", format!("/img/{id}.jpg"))
    }

    fn sample_gallery() -> Arc<GalleryDefinition> {
        Arc::new(GalleryDefinition::new(
            "sample",
            "Sample",
            vec![
                item("A", Orientation::Landscape),
                item("B", Orientation::Landscape),
                item("C", Orientation::Portrait),
                item("D", Orientation::Portrait),
                item("E", Orientation::Pano),
            ],
        ))
    }

    fn ids(plan: &RowPlan) -> Vec<Vec<&str>> {
        plan.rows
            .iter()
            .map(|r| r.items.iter().map(|i| i.id.as_str()).collect())
            .collect()
    }

    #[derive(Default)]
    struct CountingObserver {
        seen: RefCell<Vec<String>>,
    }

    impl GalleryObserver for CountingObserver {
        fn on_gallery_replaced(&self, gallery: &Arc<GalleryDefinition>) {
            self.seen.borrow_mut().push(gallery.key.clone());
        }
    }

    struct FixedProbe;

    impl OrientationProbe for FixedProbe {
        fn dimensions(&self, item: &MediaItem) -> Option<(u32, u32)> {
            match item.id.as_str() {
                "wide" => Some((5000, 1000)),
                "tall" => Some((800, 1200)),
                _ => None,
            }
        }
    }

    #[test]
    fn test_plan_places_pano_between_rows() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::new(2, 2, 2));
        let gallery = sample_gallery();
        let plan = renderer.plan(&gallery, RowLimits::new(2, 2, 2));
        assert_eq!(ids(&plan), vec![vec!["A", "B"], vec!["E"], vec!["C", "D"]]);
    }

    #[test]
    fn test_untagged_items_use_probe() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::new(3, 3, 1))
            .with_probe(Box::new(FixedProbe));
        let gallery = GalleryDefinition::new(
            "g",
            "G",
            vec![
                MediaItem::new("wide"),
                MediaItem::new("tall"),
                MediaItem::new("unknown"),
                // An explicit tag wins over measurement.
                MediaItem::new("tall-tagged").with_orientation(Orientation::Landscape),
            ],
        );
        let plan = renderer.plan(&gallery, RowLimits::new(3, 3, 1));
        let class_of = |id: &str| {
            plan.rows
                .iter()
                .find(|r| r.items.iter().any(|i| i.id == id))
                .map(|r| r.row_class)
        };
        assert_eq!(class_of("wide"), Some(Orientation::Pano));
        assert_eq!(class_of("tall"), Some(Orientation::Portrait));
        assert_eq!(class_of("unknown"), Some(Orientation::Landscape));
        assert_eq!(class_of("tall-tagged"), Some(Orientation::Landscape));
    }

    #[test]
    fn test_initial_render_and_relayout_swap_in_place() {
        let observer = Rc::new(CountingObserver::default());
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::new(2, 2, 2));
        renderer.add_observer(observer.clone());
        let mut surface = TextSurface::new();

        renderer.render_initial(sample_gallery(), &mut surface).unwrap();
        assert_eq!(surface.rows().len(), 3);
        assert_eq!(surface.rows()[0].items[0].src.as_deref(), Some("/img/A.jpg"));

        let plan = renderer.relayout(RowLimits::new(1, 1, 1), &mut surface).unwrap();
        assert_eq!(plan.len(), 5);
        assert_eq!(
            surface.events(),
            &[SurfaceEvent::Replaced(3), SurfaceEvent::Replaced(5)]
        );
        assert_eq!(
            observer.seen.borrow().as_slice(),
            &["sample".to_string(), "sample".to_string()]
        );
    }

    #[test]
    fn test_modal_follows_rendered_order() {
        let modal = Rc::new(SharedModal::new(
            MediaModal::new(
                ModalTemplate::standard(),
                FormatPreference::default(),
                MetadataResolver::default(),
            )
            .unwrap(),
        ));
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::new(2, 2, 2));
        renderer.add_observer(modal.clone());
        let mut surface = TextSurface::new();

        let gallery = sample_gallery();
        let plan = renderer.render_initial(Arc::clone(&gallery), &mut surface).unwrap();
        let order: Vec<&str> = plan.items().map(|i| i.id.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "E", "C", "D"]);

        {
            let mut modal = modal.borrow_mut();
            modal
                .open(&TriggerElement::from_item(&gallery.items[1]), Vec::new())
                .unwrap();
            modal.mark_presented();
            assert_eq!(modal.current_index(), Some(1));
            let next = modal.navigate(Direction::Next).unwrap();
            assert_eq!(next.source, "/img/E.jpg");
            assert_eq!(modal.current_index(), Some(2));
        }

        // Re-layout reorders rows; the modal tracks the new order.
        let plan = renderer.relayout(RowLimits::new(1, 1, 1), &mut surface).unwrap();
        let order: Vec<String> = plan.items().map(|i| i.id.clone()).collect();
        let modal = modal.borrow();
        let seen: Vec<String> = modal
            .gallery()
            .unwrap()
            .items
            .iter()
            .map(|i| i.id.clone())
            .collect();
        assert_eq!(seen, order);
        assert_eq!(modal.current_index(), order.iter().position(|id| id == "E"));
    }

    #[test]
    fn test_relayout_without_gallery_is_noop() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::default());
        let mut surface = TextSurface::new();
        assert!(renderer.relayout(RowLimits::new(1, 1, 1), &mut surface).is_none());
        assert!(surface.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_fades_and_notifies() {
        let observer = Rc::new(CountingObserver::default());
        let settings = RendererSettings {
            row_stagger: Duration::from_millis(40),
            ..RendererSettings::default()
        };
        let mut renderer = GalleryRenderer::new(settings, RowLimits::new(2, 2, 2));
        renderer.add_observer(observer.clone());
        let mut surface = TextSurface::new();
        renderer.render_initial(sample_gallery(), &mut surface).unwrap();

        let next = Arc::new(GalleryDefinition::new(
            "next",
            "Next",
            vec![
                item("x", Orientation::Landscape),
                item("y", Orientation::Landscape),
            ],
        ));
        renderer.switch_gallery(next, &mut surface).await.unwrap();

        assert_eq!(
            &surface.events()[1..],
            &[
                SurfaceEvent::FadeOut,
                SurfaceEvent::Removed,
                SurfaceEvent::InsertedHidden(1),
                SurfaceEvent::FadeIn {
                    row: 0,
                    delay: Duration::ZERO
                },
            ]
        );
        assert!(surface.all_visible());
        assert_eq!(renderer.gallery().unwrap().key, "next");
        assert_eq!(
            observer.seen.borrow().as_slice(),
            &["sample".to_string(), "next".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_switch_progresses_when_signal_never_fires() {
        let settings = RendererSettings {
            transition: Duration::from_millis(250),
            row_stagger: Duration::from_millis(30),
            ..RendererSettings::default()
        };
        let mut renderer = GalleryRenderer::new(settings, RowLimits::new(1, 1, 1));
        let mut surface = TextSurface::new().with_fade_signal(FadeSignal::Never);
        renderer.render_initial(sample_gallery(), &mut surface).unwrap();

        let start = tokio::time::Instant::now();
        let plan = renderer.switch_gallery(sample_gallery(), &mut surface).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(250));
        assert_eq!(plan.len(), 5);

        let delays: Vec<Duration> = surface
            .events()
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::FadeIn { delay, .. } => Some(*delay),
                _ => None,
            })
            .collect();
        assert_eq!(delays.len(), 5);
        assert_eq!(delays[4], Duration::from_millis(120));
    }

    #[test]
    fn test_unmounted_surface_aborts_in_isolation() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::default());
        let mut surface = TextSurface::unmounted();
        let err = renderer.render_initial(sample_gallery(), &mut surface).unwrap_err();
        assert_eq!(err, InitError::MissingContainer);
        assert!(renderer.gallery().is_none());
    }

    #[test]
    fn test_load_error_falls_back_to_page_items() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::new(2, 2, 1));
        let mut surface = TextSurface::new().with_existing_items(vec![
            item("p1", Orientation::Landscape),
            item("p2", Orientation::Landscape),
        ]);
        let error = DataLoadError::Status {
            url: "galleries.json".into(),
            status: 500,
        };
        let plan = renderer.recover_from_load_error(&error, &mut surface).unwrap();
        assert_eq!(plan.item_count(), 2);
        assert_eq!(renderer.gallery().unwrap().name, "Gallery");
    }

    #[test]
    fn test_load_error_without_items_shows_inline_error() {
        let mut renderer = GalleryRenderer::new(RendererSettings::default(), RowLimits::default());
        let mut surface = TextSurface::new();
        let error = DataLoadError::Shape("bad".into());
        assert!(renderer.recover_from_load_error(&error, &mut surface).is_none());
        assert!(surface.error().unwrap().contains("Gallery unavailable"));
    }
}
