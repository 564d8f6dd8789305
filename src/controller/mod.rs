//! Session/view controller.
//!
//! Owns the in-memory copy of every store and the boot state machine. All
//! mutations go through `&mut ViewController`, so sharing it behind a single
//! async mutex keeps the one-event-at-a-time semantics of the dashboard.
//!
//! External calls (AI, weather) never run while the controller is borrowed.
//! Callers take a [`CallTicket`] first and hand the result back with it; a
//! result whose ticket went stale in the meantime is dropped.

mod calls;
mod state;
mod timers;

pub use calls::*;
pub use state::{transition, BootEvent, BootState};
pub use timers::BootDriver;
#[cfg(test)]
pub(crate) use timers::fast_timings;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::ai::{BioService, CHAT_EMPTY_REPLY, CHAT_ERROR_REPLY, CHAT_GREETING};
use crate::audio::{cue_tones, AudioCue, SpeechCommand, SpeechToggle, Tone};
use crate::errors::AppError;
use crate::models::{
    ChatMessage, ChatRole, CollectionEntry, FileUpload, HistoryItem, LoginRequest, PlatformView,
    Preferences, PreferencesPatch, SearchStatus, Spotlight, SystemUpdate, UserProfile,
};
use crate::storage::Storage;
use crate::stores::{CollectionStore, HistoryStore, PreferenceStore, SessionStore, UpdateGate};
use crate::weather::WeatherReport;

pub type SharedController = Arc<Mutex<ViewController>>;

/// Collection size above which the notification badge lights up.
const BADGE_THRESHOLD: usize = 5;

/// Places that issue external calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallSite {
    Search,
    Image,
    Chat,
    Spotlight,
    Weather,
}

impl CallSite {
    /// View a result must still be on screen for.
    fn bound_view(&self) -> Option<PlatformView> {
        match self {
            CallSite::Search | CallSite::Image => Some(PlatformView::Search),
            _ => None,
        }
    }

    /// Chat replies are all kept; elsewhere only the newest call counts.
    fn latest_only(&self) -> bool {
        !matches!(self, CallSite::Chat)
    }
}

/// Proof that an external call was started under the current session and view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallTicket {
    site: CallSite,
    seq: u64,
    session: u64,
}

/// The most recent search, as shown in the search view.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub status: SearchStatus,
    pub query: String,
    pub result: Option<CollectionEntry>,
    pub image: Option<String>,
    pub generating_image: bool,
}

/// Everything the presentation layer needs to render a frame.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSnapshot {
    pub state: BootState,
    pub view: PlatformView,
    pub user: Option<UserProfile>,
    pub preferences: Preferences,
    pub system_info: Option<SystemUpdate>,
    pub search: SearchState,
    pub saved_current: bool,
    pub collection_size: usize,
    pub history_size: usize,
    pub notification_badge: bool,
    pub speaking: bool,
}

pub struct ViewController {
    preferences: PreferenceStore,
    session: SessionStore,
    collection: CollectionStore,
    history: HistoryStore,
    gate: UpdateGate,
    bio: Arc<dyn BioService>,

    state: BootState,
    /// Bumped on every boot transition; timers carry it to detect staleness.
    epoch: u64,
    /// Bumped on logout; invalidates every outstanding call ticket.
    session_generation: u64,
    call_seq: u64,
    latest_calls: HashMap<CallSite, u64>,

    view: PlatformView,
    search: SearchState,
    chat: Vec<ChatMessage>,
    speech: SpeechToggle,
    system_info: Option<SystemUpdate>,
    spotlight: Option<Spotlight>,
    weather: Option<WeatherReport>,
}

fn now_time() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

fn greeting() -> ChatMessage {
    ChatMessage {
        role: ChatRole::Model,
        text: CHAT_GREETING.to_string(),
        timestamp: now_time(),
    }
}

/// Storage write failures are reported but never block the user.
fn report_write(operation: &str, result: Result<(), AppError>) {
    if let Err(e) = result {
        tracing::warn!("Could not persist {}: {}", operation, e);
    }
}

impl ViewController {
    /// Read every store once and start at the intro screen.
    pub async fn load(storage: Arc<dyn Storage>, bio: Arc<dyn BioService>) -> Self {
        let preferences = PreferenceStore::load(storage.clone()).await;
        let session = SessionStore::load(storage.clone()).await;
        let collection = CollectionStore::load(storage.clone()).await;
        let history = HistoryStore::load(storage.clone()).await;

        tracing::info!(
            "Restored state: session={}, collection={}, history={}",
            session.is_active(),
            collection.len(),
            history.load_all().len()
        );

        Self {
            preferences,
            session,
            collection,
            history,
            gate: UpdateGate::new(storage),
            bio,
            state: BootState::Intro,
            epoch: 0,
            session_generation: 0,
            call_seq: 0,
            latest_calls: HashMap::new(),
            view: PlatformView::Dashboard,
            search: SearchState::default(),
            chat: vec![greeting()],
            speech: SpeechToggle::default(),
            system_info: None,
            spotlight: None,
            weather: None,
        }
    }

    pub fn into_shared(self) -> SharedController {
        Arc::new(Mutex::new(self))
    }

    // ==================== BOOT SEQUENCE ====================

    pub fn state(&self) -> BootState {
        self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn bio(&self) -> Arc<dyn BioService> {
        self.bio.clone()
    }

    /// Feed an event through the transition table.
    pub fn apply(&mut self, event: BootEvent) -> Option<BootState> {
        let next = transition(self.state, event, self.session.is_active());
        match next {
            Some(next) => {
                tracing::info!("Boot: {:?} -> {:?} on {:?}", self.state, next, event);
                self.state = next;
                self.epoch += 1;
            }
            None => tracing::debug!("Ignoring {:?} in {:?}", event, self.state),
        }
        next
    }

    /// Apply a timer event only if nothing moved the machine since it was armed.
    pub fn fire(&mut self, epoch: u64, event: BootEvent) -> Option<BootState> {
        if epoch != self.epoch {
            tracing::debug!("Dropping stale {:?} (epoch {} != {})", event, epoch, self.epoch);
            return None;
        }
        self.apply(event)
    }

    /// Handle for running the update check outside the controller lock.
    pub fn update_gate(&self) -> UpdateGate {
        self.gate.clone()
    }

    /// Record the update-check outcome and leave the check state.
    pub fn finish_update_check(&mut self, epoch: u64, update: SystemUpdate) -> Option<BootState> {
        if epoch != self.epoch || self.state != BootState::UpdateCheck {
            return None;
        }
        let show = update.show;
        self.system_info = Some(update);
        self.apply(BootEvent::UpdateChecked { show })
    }

    // ==================== SESSION ====================

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.current()
    }

    /// Accept any credentials and move on to the biometric scan.
    pub async fn login(&mut self, request: &LoginRequest) -> Result<UserProfile, AppError> {
        if self.state != BootState::Unauthenticated {
            return Err(AppError::Validation(format!(
                "Login is not available during {:?}",
                self.state
            )));
        }
        if request.identifier.trim().is_empty() {
            return Err(AppError::Validation("Identifier is required".to_string()));
        }

        let profile = UserProfile::from_login(request);
        report_write("session", self.session.save(profile.clone()).await);
        self.apply(BootEvent::LoginSucceeded);
        Ok(profile)
    }

    /// Clear the session and all per-session view state, then restart at the intro.
    pub async fn logout(&mut self) {
        report_write("session removal", self.session.clear().await);

        self.session_generation += 1;
        self.latest_calls.clear();
        self.view = PlatformView::Dashboard;
        self.search = SearchState::default();
        self.chat = vec![greeting()];
        self.speech = SpeechToggle::default();
        self.system_info = None;
        self.apply(BootEvent::LoggedOut);
    }

    /// Change the status label shown next to the avatar.
    pub async fn set_role(&mut self, role: &str) -> Result<UserProfile, AppError> {
        let role = role.trim().to_string();
        if role.is_empty() {
            return Err(AppError::Validation("Role is required".to_string()));
        }
        let no_session = || AppError::NotFound("No active session".to_string());
        if !self.session.is_active() {
            return Err(no_session());
        }

        let result = self.session.update(|profile| profile.role = role).await;
        report_write("session", result.map(|_| ()));
        self.session.current().cloned().ok_or_else(no_session)
    }

    // ==================== NAVIGATION ====================

    pub fn view(&self) -> PlatformView {
        self.view
    }

    fn ensure_platform(&self) -> Result<(), AppError> {
        if self.state == BootState::MainPlatform {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "The platform is not available during {:?}",
                self.state
            )))
        }
    }

    pub fn navigate(&mut self, view: PlatformView) -> Result<(), AppError> {
        self.ensure_platform()?;
        // The old collection page is an alias of BioDrive.
        self.view = match view {
            PlatformView::Collection => PlatformView::Drive,
            other => other,
        };
        Ok(())
    }

    // ==================== PREFERENCES ====================

    pub fn preferences(&self) -> Preferences {
        self.preferences.snapshot()
    }

    pub async fn update_preferences(&mut self, patch: &PreferencesPatch) -> Preferences {
        if let Some(theme) = patch.theme {
            report_write("theme", self.preferences.set_theme(theme).await);
        }
        if let Some(enabled) = patch.notifications_enabled {
            report_write("notifications", self.preferences.set_notifications(enabled).await);
        }
        if let Some(enabled) = patch.audio_enabled {
            report_write("audio", self.preferences.set_audio(enabled).await);
        }
        self.preferences.snapshot()
    }

    pub fn cue(&self, cue: AudioCue) -> Vec<Tone> {
        cue_tones(cue, self.preferences.audio_enabled())
    }

    pub fn notification_badge(&self) -> bool {
        self.preferences.notifications_enabled() && self.collection.len() > BADGE_THRESHOLD
    }

    // ==================== HISTORY & COLLECTION ====================

    pub fn history(&self) -> &[HistoryItem] {
        self.history.load_all()
    }

    pub async fn clear_history(&mut self) {
        report_write("history", self.history.clear().await);
    }

    pub fn collection(&self) -> &[CollectionEntry] {
        self.collection.load_all()
    }

    /// Save the entity on screen. Returns false if it was already saved.
    pub async fn save_current_result(&mut self) -> Result<bool, AppError> {
        let entry = self
            .search
            .result
            .clone()
            .ok_or_else(|| AppError::NotFound("No search result to save".to_string()))?;

        match self.collection.add(entry).await {
            Ok(added) => Ok(added),
            Err(e) => {
                // The entry is in memory even though the write failed.
                tracing::warn!("Could not persist collection: {}", e);
                Ok(true)
            }
        }
    }

    /// Store an uploaded file stand-in at the top of BioDrive and show it.
    pub async fn upload(&mut self, upload: &FileUpload) -> Result<CollectionEntry, AppError> {
        if upload.file_name.trim().is_empty() {
            return Err(AppError::Validation("File name is required".to_string()));
        }
        let today = Local::now().format("%d/%m/%Y").to_string();
        let entry = CollectionEntry::from_upload(upload, &today);

        report_write("collection", self.collection.prepend(entry.clone()).await);
        self.view = PlatformView::Drive;
        Ok(entry)
    }

    /// Replace BioDrive wholesale, e.g. when restoring an exported collection.
    pub async fn replace_collection(&mut self, entries: Vec<CollectionEntry>) {
        report_write("collection", self.collection.replace_all(entries).await);
    }

    /// Reopen a saved entity in the search view.
    pub fn open_saved(&mut self, scientific_name: &str) -> Result<CollectionEntry, AppError> {
        let entry = self
            .collection
            .find(scientific_name)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} is not saved", scientific_name)))?;

        self.drop_search_calls();
        self.search = SearchState {
            status: SearchStatus::Success,
            query: entry.display_name().to_string(),
            result: Some(entry.clone()),
            image: None,
            generating_image: false,
        };
        self.view = PlatformView::Search;
        Ok(entry)
    }

    // ==================== EXTERNAL CALLS ====================

    fn issue(&mut self, site: CallSite) -> CallTicket {
        self.call_seq += 1;
        self.latest_calls.insert(site, self.call_seq);
        CallTicket {
            site,
            seq: self.call_seq,
            session: self.session_generation,
        }
    }

    /// Orphan any lookup or image still running for the result on screen.
    fn drop_search_calls(&mut self) {
        self.latest_calls.remove(&CallSite::Search);
        self.latest_calls.remove(&CallSite::Image);
    }

    /// Whether a call's result may still be applied.
    pub fn is_current(&self, ticket: &CallTicket) -> bool {
        if ticket.session != self.session_generation {
            return false;
        }
        if ticket.site.latest_only() && self.latest_calls.get(&ticket.site) != Some(&ticket.seq) {
            return false;
        }
        match ticket.site.bound_view() {
            Some(view) => self.view == view,
            None => true,
        }
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    /// Start a search: log it, switch to the search view and clear the old result.
    ///
    /// Blank terms are ignored and yield `None`.
    pub async fn begin_search(&mut self, term: &str) -> Result<Option<CallTicket>, AppError> {
        self.ensure_platform()?;
        if term.trim().is_empty() {
            return Ok(None);
        }

        if let Err(e) = self.history.record(term).await {
            tracing::warn!("Could not persist history: {}", e);
        }
        self.view = PlatformView::Search;
        self.drop_search_calls();
        self.search = SearchState {
            status: SearchStatus::Loading,
            query: term.to_string(),
            ..Default::default()
        };
        Ok(Some(self.issue(CallSite::Search)))
    }

    /// Apply a lookup outcome. Returns false if the ticket went stale.
    pub fn complete_search(
        &mut self,
        ticket: CallTicket,
        outcome: Result<CollectionEntry, AppError>,
    ) -> bool {
        if !self.is_current(&ticket) {
            tracing::debug!("Discarding stale search result");
            return false;
        }

        match outcome {
            Ok(entry) if entry.is_valid => {
                self.search.status = SearchStatus::Success;
                self.search.result = Some(entry);
            }
            Ok(_) => self.search.status = SearchStatus::InvalidSearch,
            Err(e) => {
                tracing::warn!("Search for {:?} failed: {}", self.search.query, e);
                self.search.status = SearchStatus::Error;
            }
        }
        true
    }

    /// Start image generation for the entity on screen. Returns the term to draw.
    pub fn begin_image(&mut self) -> Result<(CallTicket, String), AppError> {
        self.ensure_platform()?;
        let result = self
            .search
            .result
            .as_ref()
            .ok_or_else(|| AppError::NotFound("No search result to illustrate".to_string()))?;

        let term = result
            .scientific_name
            .clone()
            .or_else(|| result.common_name.clone())
            .unwrap_or_else(|| self.search.query.clone());

        self.search.generating_image = true;
        self.search.image = None;
        Ok((self.issue(CallSite::Image), term))
    }

    pub fn complete_image(
        &mut self,
        ticket: CallTicket,
        outcome: Result<Option<String>, AppError>,
    ) -> Option<String> {
        if !self.is_current(&ticket) {
            return None;
        }

        self.search.generating_image = false;
        self.search.image = match outcome {
            Ok(image) => image.filter(|i| !i.is_empty()),
            Err(e) => {
                tracing::error!("Image generation failed: {}", e);
                None
            }
        };
        self.search.image.clone()
    }

    pub fn chat_log(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// Post a user message. Returns the ticket and the search context for the model.
    pub fn begin_chat(&mut self, message: &str) -> Result<Option<(CallTicket, String)>, AppError> {
        self.ensure_platform()?;
        if message.trim().is_empty() {
            return Ok(None);
        }

        self.chat.push(ChatMessage {
            role: ChatRole::User,
            text: message.to_string(),
            timestamp: now_time(),
        });
        let context = self
            .search
            .result
            .as_ref()
            .and_then(|r| r.scientific_name.clone())
            .unwrap_or_default();
        Ok(Some((self.issue(CallSite::Chat), context)))
    }

    pub fn complete_chat(
        &mut self,
        ticket: CallTicket,
        outcome: Result<String, AppError>,
    ) -> Option<ChatMessage> {
        if !self.is_current(&ticket) {
            return None;
        }

        let text = match outcome {
            Ok(reply) if !reply.trim().is_empty() => reply,
            Ok(_) => CHAT_EMPTY_REPLY.to_string(),
            Err(e) => {
                tracing::warn!("Chat failed: {}", e);
                CHAT_ERROR_REPLY.to_string()
            }
        };
        let reply = ChatMessage {
            role: ChatRole::Model,
            text,
            timestamp: now_time(),
        };
        self.chat.push(reply.clone());
        Some(reply)
    }

    pub fn begin_dashboard_call(&mut self, site: CallSite) -> CallTicket {
        self.issue(site)
    }

    pub fn spotlight(&self) -> Option<&Spotlight> {
        self.spotlight.as_ref()
    }

    pub fn complete_spotlight(&mut self, ticket: CallTicket, spotlight: Spotlight) {
        if self.is_current(&ticket) {
            self.spotlight = Some(spotlight);
        }
    }

    pub fn weather(&self) -> Option<&WeatherReport> {
        self.weather.as_ref()
    }

    pub fn complete_weather(&mut self, ticket: CallTicket, report: WeatherReport) {
        if self.is_current(&ticket) {
            self.weather = Some(report);
        }
    }

    // ==================== SPEECH ====================

    pub fn toggle_speech(&mut self, text: &str) -> SpeechCommand {
        self.speech.toggle(text)
    }

    pub fn speech_finished(&mut self) {
        self.speech.finished();
    }

    // ==================== SNAPSHOT ====================

    pub fn snapshot(&self) -> PlatformSnapshot {
        let saved_current = self
            .search
            .result
            .as_ref()
            .and_then(|r| r.key())
            .is_some_and(|key| self.collection.contains(key));

        PlatformSnapshot {
            state: self.state,
            view: self.view,
            user: self.session.current().cloned(),
            preferences: self.preferences.snapshot(),
            system_info: self.system_info.clone(),
            search: self.search.clone(),
            saved_current,
            collection_size: self.collection.len(),
            history_size: self.history.load_all().len(),
            notification_badge: self.notification_badge(),
            speaking: self.speech.is_speaking(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::stub::StubBio;
    use crate::models::Theme;
    use crate::storage::{keys, MemoryStorage};
    use chrono::NaiveDate;

    async fn controller_with(storage: Arc<dyn Storage>) -> ViewController {
        ViewController::load(storage, Arc::new(StubBio::new())).await
    }

    /// Drive a fresh controller to the main platform by hand.
    async fn on_platform(storage: Arc<dyn Storage>) -> ViewController {
        let mut ctl = controller_with(storage).await;
        ctl.apply(BootEvent::IntroElapsed);
        ctl.login(&LoginRequest {
            identifier: "bacterio".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        ctl.apply(BootEvent::ScanElapsed);
        let epoch = ctl.epoch();
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        ctl.finish_update_check(epoch, SystemUpdate::badge(day));
        assert_eq!(ctl.state(), BootState::MainPlatform);
        ctl
    }

    #[tokio::test]
    async fn test_login_requires_access_screen() {
        let mut ctl = controller_with(Arc::new(MemoryStorage::new())).await;
        let request = LoginRequest {
            identifier: "bacterio".into(),
            ..Default::default()
        };
        assert!(ctl.login(&request).await.is_err());

        ctl.apply(BootEvent::IntroElapsed);
        assert!(ctl
            .login(&LoginRequest::default())
            .await
            .is_err());
        let profile = ctl.login(&request).await.unwrap();
        assert_eq!(profile.name, "bacterio");
        assert_eq!(ctl.state(), BootState::BiometricScan);
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_returns_to_intro() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut ctl = on_platform(storage.clone()).await;
        ctl.navigate(PlatformView::Tools).unwrap();

        ctl.logout().await;
        assert_eq!(ctl.state(), BootState::Intro);
        assert_eq!(ctl.view(), PlatformView::Dashboard);
        assert!(ctl.user().is_none());
        assert!(SessionStore::load(storage.clone()).await.current().is_none());

        // Without a session the next boot lands on the access screen.
        ctl.apply(BootEvent::IntroElapsed);
        assert_eq!(ctl.state(), BootState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_restored_session_skips_login() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        on_platform(storage.clone()).await;

        let mut ctl = controller_with(storage).await;
        assert_eq!(ctl.state(), BootState::Intro);
        ctl.apply(BootEvent::IntroElapsed);
        assert_eq!(ctl.state(), BootState::UpdateCheck);
    }

    #[tokio::test]
    async fn test_navigation_only_on_platform() {
        let mut ctl = controller_with(Arc::new(MemoryStorage::new())).await;
        assert!(ctl.navigate(PlatformView::Maps).is_err());

        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        ctl.navigate(PlatformView::Collection).unwrap();
        assert_eq!(ctl.view(), PlatformView::Drive);
    }

    #[tokio::test]
    async fn test_stale_timer_events_are_dropped() {
        let mut ctl = controller_with(Arc::new(MemoryStorage::new())).await;
        let armed_at = ctl.epoch();
        ctl.logout().await;
        assert_eq!(ctl.fire(armed_at, BootEvent::IntroElapsed), None);
        assert_eq!(ctl.state(), BootState::Intro);

        let epoch = ctl.epoch();
        assert_eq!(
            ctl.fire(epoch, BootEvent::IntroElapsed),
            Some(BootState::Unauthenticated)
        );
    }

    #[tokio::test]
    async fn test_search_flow_and_save() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut ctl = on_platform(storage.clone()).await;

        assert!(ctl.begin_search("   ").await.unwrap().is_none());

        let ticket = ctl.begin_search("Escherichia coli").await.unwrap().unwrap();
        assert_eq!(ctl.view(), PlatformView::Search);
        assert_eq!(ctl.search_state().status, SearchStatus::Loading);

        let bio = ctl.bio();
        let outcome = bio.lookup_entity("Escherichia coli").await;
        assert!(ctl.complete_search(ticket, outcome));
        assert_eq!(ctl.search_state().status, SearchStatus::Success);

        assert!(ctl.save_current_result().await.unwrap());
        assert!(!ctl.save_current_result().await.unwrap());
        assert_eq!(ctl.collection().len(), 1);
        assert!(ctl.snapshot().saved_current);
        assert_eq!(ctl.history()[0].term, "Escherichia coli");
        assert_eq!(CollectionStore::load(storage).await.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_and_failed_searches() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        let bio = ctl.bio();

        let ticket = ctl.begin_search("xxqz").await.unwrap().unwrap();
        ctl.complete_search(ticket, bio.lookup_entity("xxqz").await);
        assert_eq!(ctl.search_state().status, SearchStatus::InvalidSearch);

        let ticket = ctl.begin_search("Vibrio").await.unwrap().unwrap();
        ctl.complete_search(ticket, Err(AppError::Upstream("down".into())));
        assert_eq!(ctl.search_state().status, SearchStatus::Error);
        assert!(ctl.search_state().result.is_none());
    }

    #[tokio::test]
    async fn test_results_after_navigation_or_logout_are_discarded() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        let bio = ctl.bio();

        let ticket = ctl.begin_search("Vibrio fischeri").await.unwrap().unwrap();
        ctl.navigate(PlatformView::Maps).unwrap();
        assert!(!ctl.complete_search(ticket, bio.lookup_entity("Vibrio fischeri").await));

        // A newer search supersedes an older one.
        ctl.navigate(PlatformView::Search).unwrap();
        let first = ctl.begin_search("Bacillus").await.unwrap().unwrap();
        let second = ctl.begin_search("Bacillus subtilis").await.unwrap().unwrap();
        assert!(!ctl.complete_search(first, bio.lookup_entity("Bacillus").await));
        assert!(ctl.complete_search(second, bio.lookup_entity("Bacillus subtilis").await));

        let (ticket, _context) = ctl.begin_chat("¿Qué come?").unwrap().unwrap();
        ctl.logout().await;
        assert!(ctl.complete_chat(ticket, Ok("Azúcares".into())).is_none());
        assert_eq!(ctl.chat_log().len(), 1);
    }

    #[tokio::test]
    async fn test_chat_uses_search_context_and_fallbacks() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        ctl.open_saved("missing").unwrap_err();

        let ticket = ctl.begin_search("Euglena").await.unwrap().unwrap();
        let bio = ctl.bio();
        ctl.complete_search(ticket, bio.lookup_entity("Euglena").await);

        let (first, context) = ctl.begin_chat("Hola").unwrap().unwrap();
        assert_eq!(context, "Euglena");
        let (second, _) = ctl.begin_chat("¿Sigues ahí?").unwrap().unwrap();

        let reply = ctl.complete_chat(second, Ok(String::new())).unwrap();
        assert_eq!(reply.text, CHAT_EMPTY_REPLY);
        let reply = ctl
            .complete_chat(first, Err(AppError::Upstream("down".into())))
            .unwrap();
        assert_eq!(reply.text, CHAT_ERROR_REPLY);
        assert_eq!(ctl.chat_log().len(), 5);
    }

    #[tokio::test]
    async fn test_image_failure_shows_placeholder() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        assert!(ctl.begin_image().is_err());

        let ticket = ctl.begin_search("Amoeba proteus").await.unwrap().unwrap();
        let bio = ctl.bio();
        ctl.complete_search(ticket, bio.lookup_entity("Amoeba proteus").await);

        let (ticket, term) = ctl.begin_image().unwrap();
        assert_eq!(term, "Amoeba proteus");
        assert!(ctl.search_state().generating_image);
        assert!(ctl
            .complete_image(ticket, Err(AppError::Upstream("quota".into())))
            .is_none());
        assert!(!ctl.search_state().generating_image);
    }

    #[tokio::test]
    async fn test_new_search_orphans_pending_image() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        let bio = ctl.bio();

        let ticket = ctl.begin_search("Amoeba proteus").await.unwrap().unwrap();
        ctl.complete_search(ticket, bio.lookup_entity("Amoeba proteus").await);
        let (image, _term) = ctl.begin_image().unwrap();

        let ticket = ctl.begin_search("Vibrio fischeri").await.unwrap().unwrap();
        assert!(ctl
            .complete_image(image, Ok(Some("data:amoeba".into())))
            .is_none());
        assert!(ctl.search_state().image.is_none());
        assert_eq!(ctl.search_state().status, SearchStatus::Loading);

        assert!(ctl.complete_search(ticket, bio.lookup_entity("Vibrio fischeri").await));
        assert_eq!(
            ctl.search_state().result.as_ref().unwrap().key(),
            Some("Vibrio fischeri")
        );
    }

    #[tokio::test]
    async fn test_reopening_saved_entry_orphans_pending_calls() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        let bio = ctl.bio();
        let upload = FileUpload {
            file_name: "gel.png".into(),
            mime_type: Some("image/png".into()),
            size_bytes: 512,
        };
        ctl.upload(&upload).await.unwrap();

        let ticket = ctl.begin_search("Amoeba proteus").await.unwrap().unwrap();
        ctl.complete_search(ticket, bio.lookup_entity("Amoeba proteus").await);
        let (image, _term) = ctl.begin_image().unwrap();
        let lookup = ctl.begin_search("Vibrio").await.unwrap().unwrap();

        ctl.open_saved("gel.png").unwrap();
        assert!(!ctl.complete_search(lookup, bio.lookup_entity("Vibrio").await));
        assert!(ctl.complete_image(image, Ok(Some("data:amoeba".into()))).is_none());

        let search = ctl.search_state();
        assert_eq!(search.query, "gel.png");
        assert_eq!(search.result.as_ref().unwrap().key(), Some("gel.png"));
        assert!(search.image.is_none());
    }

    #[tokio::test]
    async fn test_uploads_and_reopening() {
        let mut ctl = on_platform(Arc::new(MemoryStorage::new())).await;
        let upload = FileUpload {
            file_name: "placa.jpg".into(),
            mime_type: Some("image/jpeg".into()),
            size_bytes: 10_240,
        };
        ctl.upload(&upload).await.unwrap();
        ctl.upload(&upload).await.unwrap();
        assert_eq!(ctl.collection().len(), 1);
        assert_eq!(ctl.view(), PlatformView::Drive);

        let entry = ctl.open_saved("placa.jpg").unwrap();
        assert_eq!(entry.file_size.as_deref(), Some("10.0 KB"));
        assert_eq!(ctl.view(), PlatformView::Search);
        assert_eq!(ctl.search_state().query, "placa.jpg");
    }

    #[tokio::test]
    async fn test_preferences_badge_and_cues() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut ctl = on_platform(storage.clone()).await;

        for i in 0..6 {
            ctl.upload(&FileUpload {
                file_name: format!("muestra-{}.csv", i),
                mime_type: None,
                size_bytes: 1,
            })
            .await
            .unwrap();
        }
        assert!(ctl.notification_badge());

        let prefs = ctl
            .update_preferences(&PreferencesPatch {
                theme: Some(Theme::Dark),
                notifications_enabled: Some(false),
                audio_enabled: Some(false),
            })
            .await;
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!ctl.notification_badge());
        assert!(ctl.cue(AudioCue::Click).is_empty());
        assert_eq!(
            storage.get(keys::AUDIO).await.unwrap().as_deref(),
            Some("false")
        );
    }

    #[tokio::test]
    async fn test_role_update_persists() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let mut ctl = on_platform(storage.clone()).await;
        let profile = ctl.set_role("away").await.unwrap();
        assert_eq!(profile.role, "away");
        assert_eq!(
            SessionStore::load(storage).await.current().map(|p| p.role.clone()),
            Some("away".to_string())
        );
    }
}
