//! Sender-specific link handling: open completion, credit, settlement.

use tracing::{debug, trace};

use crate::condition::LocalError;
use crate::link::{Delivery, LinkEvent, LinkHandler, Target};
use crate::shared::{Action, Command, Notice};

/// Whether the owner has been told the link is open.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
enum LinkOpenState {
    /// No open-complete notice has been emitted yet
    Pending,
    /// Open-complete was emitted; it never fires again
    Signaled,
}

/// Lifecycle handling for a sending link.
///
/// Embeds the shared [`LinkHandler`] teardown behavior and adds the
/// sender-specific paths: exactly-once open completion, credit updates, and
/// the delivery settlement loop.
///
/// Open completion has two triggers because peers differ in ordering: the
/// first remote open carrying a target, or the first flow event, whichever
/// arrives first. The one-shot guard makes the notice fire exactly once
/// either way.
#[derive(Debug)]
pub struct SenderHandler {
    link: LinkHandler,
    open: LinkOpenState,
}

impl SenderHandler {
    /// Construct a handler for the sending link named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            link: LinkHandler::new(name),
            open: LinkOpenState::Pending,
        }
    }

    /// Link name used in diagnostics.
    pub fn name(&self) -> &str {
        self.link.name()
    }

    /// Consume one link event.
    pub fn handle_event(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::LocalOpen => {
                trace!(link = %self.link.name(), "link local open");
            }
            LinkEvent::RemoteOpen { target } => self.on_remote_open(target),
            LinkEvent::Flow { credit } => self.on_flow(credit),
            LinkEvent::Delivery { deliveries } => self.on_delivery(deliveries),
            teardown => self.link.handle_event(teardown),
        }
    }

    /// Report a locally-raised failure to the owner.
    pub fn fail(&mut self, error: LocalError) {
        self.link.fail(error);
    }

    /// Drain queued actions in emission order.
    pub fn poll(&mut self) -> Option<Action> {
        self.link.poll()
    }

    fn on_remote_open(&mut self, target: Option<Target>) {
        match target {
            Some(target) => {
                debug!(link = %self.link.name(), target = ?target.address, "link remote open");
                self.signal_open_complete();
            }
            // the peer withheld its target; the authoritative error arrives
            // with the coming close or detach
            None => {
                debug!(link = %self.link.name(), "link remote open without target, awaiting error");
            }
        }
    }

    fn on_flow(&mut self, credit: u32) {
        // some peers grant credit before echoing the target, so the first
        // flow also completes the open
        self.signal_open_complete();
        trace!(link = %self.link.name(), credit, "link flow");
        self.link.notify(Notice::Flow(credit));
    }

    fn on_delivery(&mut self, deliveries: Vec<Delivery>) {
        trace!(link = %self.link.name(), count = deliveries.len(), "delivery");
        for delivery in deliveries {
            // settle only after the owner has seen the outcome
            self.link.notify(Notice::SendComplete(delivery.remote_state));
            self.link.push(Command::Settle { tag: delivery.tag });
        }
    }

    // exactly once, whichever trigger arrives first
    fn signal_open_complete(&mut self) {
        if self.open == LinkOpenState::Pending {
            self.open = LinkOpenState::Signaled;
            self.link.notify(Notice::OpenComplete);
        }
    }
}
