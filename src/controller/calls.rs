//! External call orchestration.
//!
//! Each helper takes a ticket under the controller lock, releases the lock
//! for the slow call, then reacquires it to hand the outcome back. The
//! controller decides whether the outcome is still wanted.

use crate::ai::{fallback_spotlight, PAGE_ERROR_HTML};
use crate::errors::AppError;
use crate::models::{ChatMessage, Spotlight};
use crate::weather::{WeatherClient, WeatherReport};

use super::{CallSite, SearchState, SharedController};

/// Run a search. Returns the search state after the lookup settled.
pub async fn run_search(controller: &SharedController, term: &str) -> Result<SearchState, AppError> {
    let (ticket, bio) = {
        let mut ctl = controller.lock().await;
        match ctl.begin_search(term).await? {
            Some(ticket) => (ticket, ctl.bio()),
            None => return Ok(ctl.search_state().clone()),
        }
    };

    let outcome = bio.lookup_entity(term).await;

    let mut ctl = controller.lock().await;
    ctl.complete_search(ticket, outcome);
    Ok(ctl.search_state().clone())
}

/// Send a chat message. `None` means the message was blank or the reply went stale.
pub async fn run_chat(
    controller: &SharedController,
    message: &str,
) -> Result<Option<ChatMessage>, AppError> {
    let (ticket, context, bio) = {
        let mut ctl = controller.lock().await;
        match ctl.begin_chat(message)? {
            Some((ticket, context)) => (ticket, context, ctl.bio()),
            None => return Ok(None),
        }
    };

    let outcome = bio.chat(message, &context).await;

    Ok(controller.lock().await.complete_chat(ticket, outcome))
}

/// Generate a microscope image for the current result. `None` shows the placeholder.
pub async fn run_image(controller: &SharedController) -> Result<Option<String>, AppError> {
    let (ticket, term, bio) = {
        let mut ctl = controller.lock().await;
        let (ticket, term) = ctl.begin_image()?;
        (ticket, term, ctl.bio())
    };

    let outcome = bio.microscope_image(&term).await;

    Ok(controller.lock().await.complete_image(ticket, outcome))
}

/// Return the cached spotlight, fetching it on first use.
pub async fn spotlight(controller: &SharedController) -> Spotlight {
    if let Some(cached) = controller.lock().await.spotlight().cloned() {
        return cached;
    }
    refresh_spotlight(controller).await
}

pub async fn refresh_spotlight(controller: &SharedController) -> Spotlight {
    let (ticket, bio) = {
        let mut ctl = controller.lock().await;
        (ctl.begin_dashboard_call(CallSite::Spotlight), ctl.bio())
    };

    let spotlight = match bio.weekly_spotlight().await {
        Ok(spotlight) => spotlight,
        Err(e) => {
            tracing::warn!("Spotlight generation failed, using fallback: {}", e);
            fallback_spotlight()
        }
    };

    controller
        .lock()
        .await
        .complete_spotlight(ticket, spotlight.clone());
    spotlight
}

pub async fn refresh_weather(
    controller: &SharedController,
    client: &WeatherClient,
    coords: Option<(f64, f64)>,
) -> WeatherReport {
    let (ticket, bio) = {
        let mut ctl = controller.lock().await;
        (ctl.begin_dashboard_call(CallSite::Weather), ctl.bio())
    };

    let report = client.report(coords, bio.as_ref()).await;

    controller
        .lock()
        .await
        .complete_weather(ticket, report.clone());
    report
}

/// Render a simulated article page. Failures render an error paragraph.
pub async fn render_page(controller: &SharedController, title: &str, query: &str) -> String {
    let bio = controller.lock().await.bio();
    match bio.article_page(title, query).await {
        Ok(html) => html,
        Err(e) => {
            tracing::warn!("Page generation for {:?} failed: {}", title, e);
            PAGE_ERROR_HTML.to_string()
        }
    }
}
