use stratus_core::{
    model::{ContainerAction, ServiceState},
    ops::Operations,
};

/// Holds a service's containers stopped for the duration of its workflow.
///
/// Stopping is the acquire, restarting the release. The guard is armed as
/// soon as it exists if the service has containers configured, whether or
/// not the stop itself succeeds, so that a failed or partial stop still gets
/// a restart. Async code can't restart from `Drop`, so the owner has to call
/// [`ContainerGuard::release`] on every path; dropping an armed guard only
/// logs.
#[derive(Debug)]
pub struct ContainerGuard<'a> {
    ops: &'a Operations,
    service: String,
    armed: bool,
}

impl<'a> ContainerGuard<'a> {
    pub fn new(ops: &'a Operations, state: &ServiceState) -> Self {
        let armed = state
            .resolved()
            .map_or(false, |resolved| !resolved.containers.is_empty());
        ContainerGuard {
            ops,
            service: state.display_name(),
            armed,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub async fn stop(&self, state: &mut ServiceState) {
        if self.armed {
            self.ops
                .manage_containers(state, ContainerAction::Stop)
                .await;
        }
    }

    pub async fn release(mut self, state: &mut ServiceState) {
        if self.armed {
            self.armed = false;
            self.ops
                .manage_containers(state, ContainerAction::Start)
                .await;
        }
    }
}

impl Drop for ContainerGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!(
                "containers of {} were stopped and never restarted",
                self.service
            );
        }
    }
}
