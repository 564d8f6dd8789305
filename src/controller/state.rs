//! Boot sequence state machine.

use serde::Serialize;

/// Top-level mode of the application. The sequence is strictly linear; logout
/// is the only way back.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BootState {
    Intro,
    Unauthenticated,
    BiometricScan,
    UpdateCheck,
    UpdateOverlay,
    MainPlatform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootEvent {
    IntroElapsed,
    LoginSucceeded,
    ScanElapsed,
    UpdateChecked { show: bool },
    OverlayElapsed,
    LoggedOut,
}

/// Transition table. `None` means the event does not apply in `from`.
pub fn transition(from: BootState, event: BootEvent, has_session: bool) -> Option<BootState> {
    use BootEvent::*;
    use BootState::*;

    match (from, event) {
        (_, LoggedOut) => Some(Intro),
        (Intro, IntroElapsed) if has_session => Some(UpdateCheck),
        (Intro, IntroElapsed) => Some(Unauthenticated),
        (Unauthenticated, LoginSucceeded) => Some(BiometricScan),
        (BiometricScan, ScanElapsed) => Some(UpdateCheck),
        (UpdateCheck, UpdateChecked { show: true }) => Some(UpdateOverlay),
        (UpdateCheck, UpdateChecked { show: false }) => Some(MainPlatform),
        (UpdateOverlay, OverlayElapsed) => Some(MainPlatform),
        _ => None,
    }
}
