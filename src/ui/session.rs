//! Drives a [`SharedModal`] against an [`ImageLoader`].
//!
//! Loads run as spawned tasks and report `(token, result)` back over a
//! channel. The modal is only touched from the task that owns the session.

use std::rc::Rc;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::ImageLoadError;
use crate::image_loader::{ImageLoader, LoadedImage};
use crate::ui::focus::ElementId;
use crate::ui::keybindings::{Direction, ModalKey};
use crate::ui::modal::{
    KeyOutcome, LoadOutcome, LoadRequest, LoadToken, SharedModal, TriggerElement,
};

type LoadResult = (LoadToken, Result<LoadedImage, ImageLoadError>);

pub struct ModalSession<L: ImageLoader> {
    modal: Rc<SharedModal>,
    loader: Arc<L>,
    sender: flume::Sender<LoadResult>,
    receiver: flume::Receiver<LoadResult>,
    in_flight: usize,
}

impl<L: ImageLoader> ModalSession<L> {
    pub fn new(modal: Rc<SharedModal>, loader: Arc<L>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            modal,
            loader,
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn modal(&self) -> &Rc<SharedModal> {
        &self.modal
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Opens the modal on `trigger` and presents it right away.
    pub fn open(&mut self, trigger: &TriggerElement) -> Option<LoadToken> {
        let request = {
            let mut modal = self.modal.borrow_mut();
            let focusables = modal.template().focusables();
            let request = modal.open(trigger, focusables);
            modal.mark_presented();
            request
        };
        request.map(|r| self.dispatch(r))
    }

    pub fn navigate(&mut self, direction: Direction) -> Option<LoadToken> {
        let request = self.modal.borrow_mut().navigate(direction);
        request.map(|r| self.dispatch(r))
    }

    pub fn key(&mut self, key: ModalKey, focused: Option<&ElementId>) -> KeyOutcome {
        let outcome = self.modal.borrow_mut().handle_key(key, focused);
        if let KeyOutcome::Navigated(request) = &outcome {
            self.dispatch(request.clone());
        }
        outcome
    }

    pub fn close(&mut self) -> Option<ElementId> {
        self.modal.borrow_mut().close()
    }

    fn dispatch(&mut self, request: LoadRequest) -> LoadToken {
        let LoadRequest { token, source } = request;
        let loader = Arc::clone(&self.loader);
        let sender = self.sender.clone();
        self.in_flight += 1;
        trace!(token = token.value(), %source, "Dispatching image load");
        tokio::spawn(async move {
            let result = loader.load(&source).await;
            let _ = sender.send((token, result));
        });
        token
    }

    /// Waits for the next load to finish and applies it to the modal.
    ///
    /// Returns `None` once nothing is in flight.
    pub async fn settle_next(&mut self) -> Option<LoadOutcome> {
        if self.in_flight == 0 {
            return None;
        }
        let (token, result) = self.receiver.recv_async().await.ok()?;
        self.in_flight -= 1;
        let outcome = self.modal.borrow_mut().complete_load(token, result);
        debug!(token = token.value(), ?outcome, "Image load settled");
        Some(outcome)
    }

    /// Settles every outstanding load, returning their outcomes in arrival order.
    pub async fn settle_all(&mut self) -> Vec<LoadOutcome> {
        let mut outcomes = Vec::with_capacity(self.in_flight);
        while let Some(outcome) = self.settle_next().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}
