//! The lightbox viewer.
//!
//! Every load the modal starts carries a fresh [`LoadToken`]. Only the most
//! recent token is honored when results come back; earlier loads may still
//! finish but their results are dropped. `current_index` is set as soon as a
//! photo is requested and re-derived from the loaded path when the load lands.

use std::cell::{Ref, RefCell, RefMut};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::error::{ImageLoadError, InitError};
use crate::image_loader::LoadedImage;
use crate::metadata::{normalize_path, MetadataIndex, MetadataResolver};
use crate::models::{CandidateSources, FormatPreference, GalleryDefinition, MediaItem};
use crate::ui::caption::{compose_caption, Caption};
use crate::ui::focus::{ElementId, FocusTrap};
use crate::ui::keybindings::{Direction, ModalKey};
use crate::ui::renderer::GalleryObserver;

/// Identifies one image load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub token: LoadToken,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModalPhase {
    #[default]
    Closed,
    Opening,
    Open,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModalState {
    pub phase: ModalPhase,
    pub current_index: Option<usize>,
    pub active_load_token: Option<LoadToken>,
    pub trigger_origin: Option<ElementId>,
}

/// The clicked element that opened the modal.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerElement {
    pub id: ElementId,
    pub sources: CandidateSources,
    pub alt: Option<String>,
    pub title: Option<String>,
}

impl TriggerElement {
    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            id: ElementId::new(item.id.clone()),
            sources: item.sources.clone(),
            alt: item.alt.clone(),
            title: item.title.clone(),
        }
    }
}

/// What the modal currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayedImage {
    pub source: Option<String>,
    pub alt: Option<String>,
    pub title: Option<String>,
    pub loading: bool,
    pub dimensions: Option<(u32, u32)>,
    pub caption: Option<Caption>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Closed { restore_focus: Option<ElementId> },
    Navigated(LoadRequest),
    Focus(ElementId),
    Ignored,
}

/// Named slots the modal markup must provide.
#[derive(Debug, Clone, Default)]
pub struct ModalTemplate {
    slots: Vec<(String, ElementId)>,
}

impl ModalTemplate {
    pub const REQUIRED_SLOTS: [&'static str; 3] = ["image", "caption", "close"];

    const FOCUSABLE_SLOTS: [&'static str; 3] = ["close", "prev", "next"];

    pub fn new() -> Self {
        Self::default()
    }

    /// Image, caption, close, previous and next slots with `modal-*` ids.
    pub fn standard() -> Self {
        ["image", "caption", "close", "prev", "next"]
            .into_iter()
            .fold(Self::new(), |template, slot| {
                template.with_slot(slot, ElementId::new(format!("modal-{slot}")))
            })
    }

    pub fn with_slot(mut self, name: impl Into<String>, id: ElementId) -> Self {
        self.slots.push((name.into(), id));
        self
    }

    pub fn slot(&self, name: &str) -> Option<&ElementId> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, id)| id)
    }

    pub fn validate(&self) -> Result<(), InitError> {
        match Self::REQUIRED_SLOTS
            .into_iter()
            .find(|slot| self.slot(slot).is_none())
        {
            Some(missing) => Err(InitError::MissingTemplate(missing)),
            None => Ok(()),
        }
    }

    /// Buttons focus cycles through, in tab order.
    pub fn focusables(&self) -> Vec<ElementId> {
        Self::FOCUSABLE_SLOTS
            .into_iter()
            .filter_map(|slot| self.slot(slot).cloned())
            .collect()
    }
}

pub struct MediaModal {
    state: ModalState,
    template: ModalTemplate,
    preference: FormatPreference,
    resolver: MetadataResolver,
    metadata: Arc<MetadataIndex>,
    gallery: Option<Arc<GalleryDefinition>>,
    displayed: Option<DisplayedImage>,
    focus: FocusTrap,
    next_token: u64,
}

impl MediaModal {
    pub fn new(
        template: ModalTemplate,
        preference: FormatPreference,
        resolver: MetadataResolver,
    ) -> Result<Self, InitError> {
        if let Err(e) = template.validate() {
            warn!(error = %e, "Modal template incomplete, viewer disabled");
            return Err(e);
        }
        Ok(Self {
            state: ModalState::default(),
            template,
            preference,
            resolver,
            metadata: Arc::new(MetadataIndex::default()),
            gallery: None,
            displayed: None,
            focus: FocusTrap::default(),
            next_token: 0,
        })
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn phase(&self) -> ModalPhase {
        self.state.phase
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index
    }

    pub fn displayed(&self) -> Option<&DisplayedImage> {
        self.displayed.as_ref()
    }

    pub fn gallery(&self) -> Option<&Arc<GalleryDefinition>> {
        self.gallery.as_ref()
    }

    pub fn template(&self) -> &ModalTemplate {
        &self.template
    }

    pub fn set_metadata(&mut self, metadata: Arc<MetadataIndex>) {
        debug!(records = metadata.len(), "Modal metadata updated");
        self.metadata = metadata;
    }

    fn issue_token(&mut self) -> LoadToken {
        self.next_token = self.next_token.wrapping_add(1);
        LoadToken(self.next_token)
    }

    fn index_of_source(&self, source: &str) -> Option<usize> {
        let gallery = self.gallery.as_ref()?;
        let prefix = self.resolver.base_prefix();
        let target = normalize_path(source, prefix);
        gallery.items.iter().position(|item| {
            item.best_source(&self.preference)
                .is_some_and(|s| normalize_path(s, prefix) == target)
        })
    }

    /// Shows alt/title with a loading indicator and returns the request, if
    /// there is anything to load.
    fn begin_load(
        &mut self,
        source: Option<String>,
        alt: Option<String>,
        title: Option<String>,
    ) -> Option<LoadRequest> {
        let token = self.issue_token();
        let mut displayed = DisplayedImage {
            source: source.clone(),
            alt,
            title,
            loading: source.is_some(),
            ..DisplayedImage::default()
        };

        let request = match source {
            Some(source) => {
                self.state.active_load_token = Some(token);
                Some(LoadRequest { token, source })
            }
            None => {
                warn!("Photo has no candidate source");
                self.state.active_load_token = None;
                displayed.warning = Some("No image source available".into());
                displayed.caption = Some(compose_caption(
                    displayed.title.as_deref(),
                    &Default::default(),
                ));
                None
            }
        };
        self.displayed = Some(displayed);
        request
    }

    pub fn open(
        &mut self,
        trigger: &TriggerElement,
        focusables: Vec<ElementId>,
    ) -> Option<LoadRequest> {
        if self.state.phase == ModalPhase::Closed {
            self.state.phase = ModalPhase::Opening;
            self.state.trigger_origin = Some(trigger.id.clone());
        }
        self.focus = FocusTrap::new(focusables);

        let source = self.preference.pick(&trigger.sources).map(str::to_string);
        self.state.current_index = source.as_deref().and_then(|s| self.index_of_source(s));
        info!(trigger = %trigger.id, index = ?self.state.current_index, "Opening modal");

        self.begin_load(source, trigger.alt.clone(), trigger.title.clone())
    }

    /// The open animation finished; navigation is now accepted.
    pub fn mark_presented(&mut self) {
        if self.state.phase == ModalPhase::Opening {
            self.state.phase = ModalPhase::Open;
        }
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<LoadRequest> {
        if self.state.phase != ModalPhase::Open {
            return None;
        }
        let current = self.state.current_index?;
        let gallery = Arc::clone(self.gallery.as_ref()?);
        if gallery.is_empty() {
            return None;
        }

        let len = gallery.len() as isize;
        let target = (current as isize + direction.step()).rem_euclid(len) as usize;
        let item = &gallery.items[target];
        self.state.current_index = Some(target);
        debug!(from = current, to = target, "Navigating modal");

        let source = item.best_source(&self.preference).map(str::to_string);
        self.begin_load(source, item.alt.clone(), item.title.clone())
    }

    pub fn complete_load(
        &mut self,
        token: LoadToken,
        result: Result<LoadedImage, ImageLoadError>,
    ) -> LoadOutcome {
        if self.state.phase == ModalPhase::Closed || self.state.active_load_token != Some(token) {
            trace!(token = token.value(), "Discarding stale image load");
            return LoadOutcome::Stale;
        }
        self.state.active_load_token = None;

        let Some(mut displayed) = self.displayed.take() else {
            return LoadOutcome::Stale;
        };
        displayed.loading = false;
        let outcome = match result {
            Ok(image) => {
                displayed.dimensions = Some((image.width, image.height));
                displayed.source = Some(image.source);
                displayed.warning = None;
                LoadOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Image failed to load, showing fallback text");
                displayed.warning = Some(e.to_string());
                LoadOutcome::Failed
            }
        };

        if let Some(source) = displayed.source.as_deref() {
            self.state.current_index = self.index_of_source(source);
            let record = self.resolver.resolve(source, &self.metadata);
            displayed.caption = Some(compose_caption(displayed.title.as_deref(), &record));
        }
        self.displayed = Some(displayed);
        outcome
    }

    /// Closes the modal and hands back the element that should regain focus.
    pub fn close(&mut self) -> Option<ElementId> {
        if self.state.phase == ModalPhase::Closed {
            return None;
        }
        let trigger = self.state.trigger_origin.take();
        self.state = ModalState::default();
        self.displayed = None;
        self.focus = FocusTrap::default();
        info!(restore = ?trigger, "Closed modal");
        trigger
    }

    pub fn handle_key(&mut self, key: ModalKey, focused: Option<&ElementId>) -> KeyOutcome {
        if self.state.phase != ModalPhase::Open {
            return KeyOutcome::Ignored;
        }
        match key {
            ModalKey::Escape => KeyOutcome::Closed {
                restore_focus: self.close(),
            },
            ModalKey::ArrowLeft | ModalKey::ArrowRight => key
                .direction()
                .and_then(|d| self.navigate(d))
                .map_or(KeyOutcome::Ignored, KeyOutcome::Navigated),
            ModalKey::Tab { shift } => self
                .focus
                .next(focused, shift)
                .map_or(KeyOutcome::Ignored, KeyOutcome::Focus),
            ModalKey::Other => KeyOutcome::Ignored,
        }
    }

    pub fn replace_gallery(&mut self, gallery: Arc<GalleryDefinition>) {
        self.gallery = Some(gallery);
        self.state.current_index = self
            .displayed
            .as_ref()
            .and_then(|d| d.source.as_deref())
            .and_then(|s| self.index_of_source(s));
        debug!(index = ?self.state.current_index, "Modal gallery replaced");
    }

    pub fn teardown(&mut self) {
        self.state = ModalState::default();
        self.displayed = None;
        self.focus = FocusTrap::default();
    }
}

/// A [`MediaModal`] shared between the renderer and whoever drives it.
///
/// Gallery updates that arrive while the modal is borrowed are parked and
/// applied on the next borrow, so the index never stays stale.
pub struct SharedModal {
    modal: RefCell<MediaModal>,
    pending: RefCell<Option<Arc<GalleryDefinition>>>,
}

impl SharedModal {
    pub fn new(modal: MediaModal) -> Self {
        Self {
            modal: RefCell::new(modal),
            pending: RefCell::new(None),
        }
    }

    pub fn borrow(&self) -> Ref<'_, MediaModal> {
        if self.has_pending() {
            if let Ok(mut modal) = self.modal.try_borrow_mut() {
                self.apply_pending(&mut modal);
            }
        }
        self.modal.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, MediaModal> {
        let mut modal = self.modal.borrow_mut();
        self.apply_pending(&mut modal);
        modal
    }

    pub fn has_pending(&self) -> bool {
        self.pending.borrow().is_some()
    }

    fn apply_pending(&self, modal: &mut MediaModal) {
        let pending = self.pending.borrow_mut().take();
        if let Some(gallery) = pending {
            debug!(gallery = %gallery.key, "Applying deferred gallery update");
            modal.replace_gallery(gallery);
        }
    }
}

impl GalleryObserver for SharedModal {
    fn on_gallery_replaced(&self, gallery: &Arc<GalleryDefinition>) {
        match self.modal.try_borrow_mut() {
            Ok(mut modal) => {
                self.pending.borrow_mut().take();
                modal.replace_gallery(Arc::clone(gallery));
            }
            Err(_) => {
                debug!(gallery = %gallery.key, "Modal busy, deferring gallery update");
                *self.pending.borrow_mut() = Some(Arc::clone(gallery));
            }
        }
    }
}
