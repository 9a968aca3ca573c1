//! Background service binding state. The OS bind/unbind calls belong to the host; this tracks
//! whether the service is bound and tells the app layer when that changes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{Action, PlatformCommand};
use crate::event::BindingEvent;
use crate::notification::Notification;

#[derive(Debug, Default)]
pub struct ServiceBinding {
    bound: Arc<AtomicBool>,
}

impl ServiceBinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::SeqCst)
    }

    /// Shared read handle on the bound flag, for status reporting outside the event loop.
    pub fn bound_flag(&self) -> Arc<AtomicBool> {
        self.bound.clone()
    }

    /// Ask the host to bind the service. The outcome arrives as `BindingEvent::BindRequested`.
    pub fn bind(&self) -> Vec<Action> {
        vec![Action::Command(PlatformCommand::BindService)]
    }

    /// Ask the host to unbind (only if bound) and always stop the service.
    pub fn unbind(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(2);
        if self.bound.swap(false, Ordering::SeqCst) {
            actions.push(Action::Command(PlatformCommand::UnbindService));
        }
        actions.push(Action::Command(PlatformCommand::StopService));
        actions
    }

    pub fn on_event(&self, event: BindingEvent) -> Vec<Action> {
        match event {
            BindingEvent::BindRequested { accepted } => {
                self.bound.store(accepted, Ordering::SeqCst);
                if !accepted {
                    warn!("service bind request was refused");
                }
                vec![]
            }
            BindingEvent::ServiceConnected => {
                self.bound.store(true, Ordering::SeqCst);
                info!("nearby service connected");
                vec![
                    Action::Command(PlatformCommand::InitService),
                    Action::Notify(Notification::BindingStateChanged(true)),
                ]
            }
            BindingEvent::ServiceDisconnected
            | BindingEvent::BindingDied
            | BindingEvent::NullBinding => {
                self.bound.store(false, Ordering::SeqCst);
                info!(reason = ?event, "nearby service lost");
                vec![Action::Notify(Notification::BindingStateChanged(false))]
            }
            BindingEvent::UnbindFailed { message } => {
                warn!(%message, "unbinding nearby service failed");
                vec![Action::Notify(Notification::OperationFailed {
                    operation: "unbind".into(),
                    message,
                })]
            }
        }
    }
}
