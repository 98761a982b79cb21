use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::error;

/// Error boundary around canvas drawing. A panic inside the guarded closure
/// is logged and remembered; the data layer is never touched.
#[derive(Default)]
pub(super) struct RenderSupervisor {
    failure: Option<String>,
}

impl RenderSupervisor {
    pub(super) fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Runs `render` unless an earlier call failed and has not been cleared.
    pub(super) fn guard<R>(&mut self, render: impl FnOnce() -> R) -> Option<R> {
        if self.failure.is_some() {
            return None;
        }

        match panic::catch_unwind(AssertUnwindSafe(render)) {
            Ok(value) => Some(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("canvas rendering panicked: {message}");
                self.failure = Some(message);
                None
            }
        }
    }

    pub(super) fn retry(&mut self) {
        self.failure = None;
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panics_are_contained_until_retry() {
        let mut supervisor = RenderSupervisor::default();
        assert_eq!(supervisor.guard(|| 7), Some(7));

        let result: Option<()> = supervisor.guard(|| panic!("bad label geometry"));
        assert!(result.is_none());
        assert_eq!(supervisor.failure(), Some("bad label geometry"));

        // stays tripped until retried
        assert_eq!(supervisor.guard(|| 1), None);
        supervisor.retry();
        assert_eq!(supervisor.guard(|| 2), Some(2));
        assert!(supervisor.failure().is_none());
    }

    #[test]
    fn formatted_panic_messages_are_kept() {
        let mut supervisor = RenderSupervisor::default();
        let id = "node-7";
        let _ = supervisor.guard(|| panic!("missing {id}"));
        assert_eq!(supervisor.failure(), Some("missing node-7"));
    }
}
