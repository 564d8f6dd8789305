//! Timed boot transitions.
//!
//! At most one timer is pending; arming a new one aborts the old. Each timer
//! also records the controller epoch it was armed at, and fires only if the
//! state machine has not moved since.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::task::AbortHandle;

use crate::config::BootTimings;
use crate::errors::AppError;
use crate::models::{LoginRequest, UserProfile};

use super::{BootEvent, BootState, SharedController};

#[derive(Clone)]
pub struct BootDriver {
    controller: SharedController,
    timings: BootTimings,
    /// The one pending boot timer, if any
    timer: Arc<Mutex<Option<AbortHandle>>>,
}

impl BootDriver {
    pub fn new(controller: SharedController, timings: BootTimings) -> Self {
        Self {
            controller,
            timings,
            timer: Arc::new(Mutex::new(None)),
        }
    }

    pub fn controller(&self) -> &SharedController {
        &self.controller
    }

    /// Arm the timer for whatever state the controller is in.
    pub async fn start(&self) {
        let (state, epoch) = {
            let ctl = self.controller.lock().await;
            (ctl.state(), ctl.epoch())
        };
        self.arm(state, epoch);
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<UserProfile, AppError> {
        let mut ctl = self.controller.lock().await;
        let profile = ctl.login(request).await?;
        self.arm(ctl.state(), ctl.epoch());
        Ok(profile)
    }

    pub async fn logout(&self) {
        let mut ctl = self.controller.lock().await;
        ctl.logout().await;
        self.arm(ctl.state(), ctl.epoch());
    }

    /// Spawn the timer for `state`, replacing whatever timer was pending.
    fn arm(&self, state: BootState, epoch: u64) {
        let handle = match state {
            BootState::Intro => {
                Some(self.spawn_event(self.timings.intro, epoch, BootEvent::IntroElapsed))
            }
            BootState::BiometricScan => {
                Some(self.spawn_event(self.timings.scan, epoch, BootEvent::ScanElapsed))
            }
            BootState::UpdateOverlay => {
                Some(self.spawn_event(self.timings.overlay, epoch, BootEvent::OverlayElapsed))
            }
            BootState::UpdateCheck => Some(self.spawn_update_check(epoch)),
            BootState::Unauthenticated | BootState::MainPlatform => None,
        };

        let mut slot = self.timer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        // When called from inside the expiring timer this aborts the caller,
        // which has no await left and finishes normally.
        if let Some(previous) = std::mem::replace(&mut *slot, handle) {
            previous.abort();
        }
    }

    fn spawn_event(&self, delay: Duration, epoch: u64, event: BootEvent) -> AbortHandle {
        let driver = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut ctl = driver.controller.lock().await;
            if let Some(next) = ctl.fire(epoch, event) {
                driver.arm(next, ctl.epoch());
            }
        })
        .abort_handle()
    }

    fn spawn_update_check(&self, epoch: u64) -> AbortHandle {
        let driver = self.clone();
        let defer = self.timings.update_defer;
        tokio::spawn(async move {
            tokio::time::sleep(defer).await;

            let (gate, bio) = {
                let ctl = driver.controller.lock().await;
                if ctl.epoch() != epoch {
                    return;
                }
                (ctl.update_gate(), ctl.bio())
            };

            let today = Local::now().date_naive();
            let update = gate.check_and_consume(today, bio.as_ref()).await;

            let mut ctl = driver.controller.lock().await;
            if let Some(next) = ctl.finish_update_check(epoch, update) {
                driver.arm(next, ctl.epoch());
            }
        })
        .abort_handle()
    }
}

/// Millisecond timings compressed for tests.
#[cfg(test)]
pub(crate) fn fast_timings() -> BootTimings {
    BootTimings {
        intro: Duration::from_millis(20),
        scan: Duration::from_millis(30),
        update_defer: Duration::from_millis(10),
        overlay: Duration::from_millis(50),
    }
}
