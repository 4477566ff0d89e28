//! Overlay controller: the headless state machine driving the in-page
//! surfaces.
//!
//! Hosts feed it pointer and keyboard interactions; it mutates bubble,
//! menu, and panel state, talks to the background gateway, and emits
//! [`OverlayEvent`]s for the host to render from. It never draws.

use std::sync::Arc;

use glint_gateway::{AuthState, ChatMessage, GatewayClient, Result as GatewayResult, Settings};

use crate::bubble::{Bubble, BubbleId, BubbleSet};
use crate::capture::{Capture, PageRenderer, RegionTracker, crop_region};
use crate::composer::PromptField;
use crate::events::{EventSender, OverlayEvent};
use crate::panel::{Clipboard, Confirm, CopyFeedback, Panel};
use crate::persistence::{PageInfo, save_bubble};

/// System instruction for the first exchange of a bubble
const INITIAL_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant analyzing text and images.";

/// System instruction for follow-up turns inside the panel
const CONTINUATION_SYSTEM_INSTRUCTION: &str =
    "You are a helpful assistant. Continue the conversation naturally based on the context provided.";

/// Prompt shown before clearing a conversation's history
const CLEAR_CONFIRM_PROMPT: &str = "Clear this conversation's history?";

/// Headless overlay state for one page
pub struct OverlayController {
    gateway: GatewayClient,
    renderer: Arc<dyn PageRenderer>,
    events: EventSender,
    page: PageInfo,
    device_pixel_ratio: f64,

    auth: AuthState,
    settings: Settings,

    bubbles: BubbleSet,
    panel: Option<Panel>,
    prompt: PromptField,
    tracker: RegionTracker,
    pending_capture: Option<Capture>,
    menu_visible: bool,
    last_interaction: (f64, f64),
}

impl OverlayController {
    pub fn new(
        gateway: GatewayClient,
        renderer: Arc<dyn PageRenderer>,
        page: PageInfo,
        device_pixel_ratio: f64,
    ) -> Self {
        Self {
            gateway,
            renderer,
            events: EventSender::default(),
            page,
            device_pixel_ratio,
            auth: AuthState::anonymous(),
            settings: Settings::default(),
            bubbles: BubbleSet::new(),
            panel: None,
            prompt: PromptField::new(),
            tracker: RegionTracker::new(),
            pending_capture: None,
            menu_visible: false,
            last_interaction: (0.0, 0.0),
        }
    }

    /// Subscribe to overlay events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<OverlayEvent> {
        self.events.subscribe()
    }

    /// Resolve identity and settings once at page load. Either lookup
    /// failing leaves the session usable: anonymous, built-in defaults.
    pub async fn init(&mut self) {
        match self.gateway.check_auth().await {
            Ok(state) => self.auth = state,
            Err(err) => {
                tracing::warn!(%err, "auth check failed, continuing anonymously");
                self.auth = AuthState::anonymous();
            }
        }
        self.events.emit(OverlayEvent::AuthChanged {
            authenticated: self.auth.authenticated,
        });

        if self.auth.authenticated {
            match self.gateway.get_settings().await {
                Ok(settings) => self.settings = settings,
                Err(err) => {
                    tracing::warn!(%err, "settings fetch failed, using defaults");
                    self.settings = Settings::default();
                }
            }
        }
    }

    pub fn auth_state(&self) -> &AuthState {
        &self.auth
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bubbles(&self) -> &BubbleSet {
        &self.bubbles
    }

    pub fn panel(&self) -> Option<&Panel> {
        self.panel.as_ref()
    }

    pub fn prompt_field(&self) -> &PromptField {
        &self.prompt
    }

    pub fn prompt_field_mut(&mut self) -> &mut PromptField {
        &mut self.prompt
    }

    pub fn is_menu_visible(&self) -> bool {
        self.menu_visible
    }

    pub fn is_region_active(&self) -> bool {
        self.tracker.is_active()
    }

    /// A right-click landed on the page. With a text selection the menu
    /// opens seeded from it; without one a region drag begins.
    pub fn right_click(&mut self, x: f64, y: f64, selected_text: Option<&str>) {
        self.last_interaction = (x, y);
        match selected_text.map(str::trim).filter(|s| !s.is_empty()) {
            Some(selection) => {
                self.prompt.populate_selection(selection);
                self.show_menu(x, y);
            }
            None => {
                self.tracker.begin(x, y);
                self.events.emit(OverlayEvent::RegionStarted { x, y });
            }
        }
    }

    /// Entry point for the browser-level context menu item: behaves like a
    /// selection right-click at the item's invocation point.
    pub fn trigger_ai(&mut self, x: f64, y: f64, selected_text: &str) {
        self.right_click(x, y, Some(selected_text));
    }

    /// The pointer moved during a region drag
    pub fn drag_update(&mut self, x: f64, y: f64) {
        if let Some(region) = self.tracker.update(x, y) {
            self.events.emit(OverlayEvent::RegionChanged { region });
        }
    }

    /// Abandon an in-progress drag (Escape, focus loss)
    pub fn cancel_region(&mut self) {
        if self.tracker.is_active() {
            self.tracker.cancel();
            self.events.emit(OverlayEvent::RegionEnded);
        }
    }

    /// The drag ended. A region meeting the minimum extent is rendered and
    /// cropped into a pending capture; anything else, including a render or
    /// crop failure, degrades to the plain menu at the release point. The
    /// live rectangle is removed on every path.
    pub async fn finish_region(&mut self, x: f64, y: f64) {
        if !self.tracker.is_active() {
            return;
        }
        let region = self.tracker.finish(x, y);
        self.events.emit(OverlayEvent::RegionEnded);

        let Some(region) = region else {
            self.show_menu(x, y);
            return;
        };

        let capture = match self.renderer.render_page().await {
            Ok(bitmap) => crop_region(&bitmap, region, self.device_pixel_ratio)
                .map(|png| Capture::Image { png, region }),
            Err(err) => Err(err),
        };

        match capture {
            Ok(capture) => {
                self.pending_capture = Some(capture);
                self.prompt.apply_screenshot_default();
                let (cx, cy) = region.center();
                self.show_menu(cx, cy);
            }
            Err(err) => {
                tracing::warn!(%err, "region capture failed");
                self.show_menu(x, y);
            }
        }
    }

    fn show_menu(&mut self, x: f64, y: f64) {
        self.last_interaction = (x, y);
        self.menu_visible = true;
        self.events.emit(OverlayEvent::MenuShown {
            x,
            y,
            has_preview: self.pending_capture.is_some(),
        });
    }

    /// Dismiss the menu, discarding the draft prompt and any pending capture
    pub fn hide_menu(&mut self) {
        if !self.menu_visible {
            return;
        }
        self.menu_visible = false;
        self.prompt.clear();
        self.pending_capture = None;
        self.events.emit(OverlayEvent::MenuHidden);
    }

    /// Submit the composed prompt: place a loading bubble at the menu's
    /// point, run the first gateway round trip, and resolve the bubble.
    /// Returns the bubble id, or `None` for an empty submission.
    pub async fn submit_prompt(&mut self) -> Option<BubbleId> {
        let prompt = self.prompt.take_submission()?;
        let capture = self.pending_capture.take();

        let (x, y) = self.last_interaction;
        let bubble = Bubble::new(x, y, prompt);
        let id = self.bubbles.insert(bubble);
        self.events.emit(OverlayEvent::BubbleCreated { id, x, y });

        self.menu_visible = false;
        self.events.emit(OverlayEvent::MenuHidden);

        let mut outbound = self
            .bubbles
            .get(id)
            .map(|b| b.conversation().to_outbound(INITIAL_SYSTEM_INSTRUCTION))
            .unwrap_or_default();
        if let Some(url) = capture.as_ref().and_then(Capture::data_url) {
            outbound.push(ChatMessage::user_image(url));
        }

        let result = self.complete(outbound).await;
        self.apply_round_trip(id, result).await;
        Some(id)
    }

    async fn complete(&self, messages: Vec<ChatMessage>) -> GatewayResult<String> {
        self.gateway
            .complete(
                messages,
                self.settings.default_model.clone(),
                self.settings.max_tokens,
            )
            .await
    }

    /// Resolve a finished round trip against whatever bubble still exists.
    /// A reply for a removed bubble is discarded; success and failure both
    /// land as a terminal message, so the bubble always leaves loading.
    pub async fn apply_round_trip(&mut self, id: BubbleId, result: GatewayResult<String>) {
        let Some(bubble) = self.bubbles.get_mut(id) else {
            tracing::debug!(bubble = %id, "reply for removed bubble discarded");
            return;
        };

        match result {
            Ok(reply) => {
                bubble.apply_reply(&reply);
                self.events.emit(OverlayEvent::BubbleUpdated { id });
                self.maybe_save(id).await;
            }
            Err(err) => {
                let auth_related = err.is_auth_related();
                bubble.apply_failure(&err.as_assistant_text());
                self.events.emit(OverlayEvent::BubbleUpdated { id });
                if auth_related {
                    self.events.emit(OverlayEvent::AuthPromptRequested);
                }
            }
        }
    }

    /// Mirror the bubble's conversation to the record store when the user
    /// is signed in and auto-save is on. Failures are logged and swallowed.
    async fn maybe_save(&self, id: BubbleId) {
        if !self.auth.authenticated || !self.settings.auto_save {
            return;
        }
        if let Some(bubble) = self.bubbles.get(id) {
            save_bubble(&self.gateway, bubble, &self.page).await;
        }
    }

    /// Open the conversation panel over a bubble. Loading bubbles refuse to
    /// expand; any previously open panel closes first.
    pub fn open_panel(&mut self, id: BubbleId) -> bool {
        let Some(bubble) = self.bubbles.get(id) else {
            return false;
        };
        if bubble.is_loading() {
            return false;
        }
        if let Some(open) = &self.panel {
            if open.bubble() == id {
                return true;
            }
            self.events.emit(OverlayEvent::PanelClosed);
        }
        self.panel = Some(Panel::new(id));
        self.events.emit(OverlayEvent::PanelOpened { bubble: id });
        true
    }

    /// Arm the outside-click listener once the host's open transition has
    /// completed, so the opening click cannot close the panel.
    pub fn arm_panel_guard(&mut self) {
        if let Some(panel) = &mut self.panel {
            panel.arm_outside_click();
        }
    }

    /// A click landed somewhere on the page while the panel is open
    pub fn outside_click(&mut self, inside_panel: bool, inside_anchor: bool) {
        let closes = self
            .panel
            .as_ref()
            .is_some_and(|p| p.closes_on_click(inside_panel, inside_anchor));
        if closes {
            self.close_panel();
        }
    }

    pub fn close_panel(&mut self) {
        if self.panel.take().is_some() {
            self.events.emit(OverlayEvent::PanelClosed);
        }
    }

    /// Send the panel's input as a follow-up turn. The input is disabled
    /// for the duration of the round trip and restored with focus after.
    pub async fn panel_send(&mut self) {
        let Some(panel) = &mut self.panel else {
            return;
        };
        let Some(text) = panel.take_input() else {
            return;
        };
        let id = panel.bubble();
        panel.begin_round_trip();

        let outbound = match self.bubbles.get_mut(id) {
            Some(bubble) => {
                bubble.conversation_mut().push_user(&text);
                self.events.emit(OverlayEvent::BubbleUpdated { id });
                bubble
                    .conversation()
                    .to_outbound(CONTINUATION_SYSTEM_INSTRUCTION)
            }
            None => {
                self.close_panel();
                return;
            }
        };

        let result = self.complete(outbound).await;
        self.apply_round_trip(id, result).await;

        if let Some(panel) = &mut self.panel {
            if panel.bubble() == id {
                panel.end_round_trip();
            }
        }
    }

    /// Clear the panel's conversation back to its first message, behind a
    /// confirmation.
    pub fn panel_clear(&mut self, confirm: &mut dyn Confirm) {
        let Some(panel) = &self.panel else {
            return;
        };
        let id = panel.bubble();
        if !confirm.confirm(CLEAR_CONFIRM_PROMPT) {
            return;
        }
        if let Some(bubble) = self.bubbles.get_mut(id) {
            bubble.conversation_mut().clear();
            self.events.emit(OverlayEvent::BubbleUpdated { id });
        }
    }

    /// Copy the panel's transcript to the clipboard, reporting the outcome
    /// through the copy control's feedback state.
    pub async fn panel_copy(&mut self, clipboard: &dyn Clipboard) {
        let Some(panel) = &self.panel else {
            return;
        };
        let transcript = match self.bubbles.get(panel.bubble()) {
            Some(bubble) => bubble.conversation().transcript(),
            None => return,
        };
        let feedback = match clipboard.write_text(&transcript).await {
            Ok(()) => CopyFeedback::Copied,
            Err(err) => {
                tracing::warn!(%err, "transcript copy failed");
                CopyFeedback::Failed
            }
        };
        if let Some(panel) = &mut self.panel {
            panel.set_copy_feedback(feedback);
        }
    }

    /// Remove a bubble from the page, closing the panel if it was open
    /// over it.
    pub fn remove_bubble(&mut self, id: BubbleId) {
        if self.panel.as_ref().is_some_and(|p| p.bubble() == id) {
            self.close_panel();
        }
        if self.bubbles.remove(id) {
            self.events.emit(OverlayEvent::BubbleRemoved { id });
        }
    }

    /// Page unload: drop every surface
    pub fn teardown(&mut self) {
        self.close_panel();
        self.hide_menu();
        self.cancel_region();
        self.bubbles.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use glint_gateway::{
        AuthUser, ConversationRecord, Error as GatewayError, GatewayRequest, Role,
    };
    use image::RgbaImage;

    use super::*;
    use crate::error::{Error, Result};

    /// Scripted reply for the completion action
    #[derive(Clone)]
    enum Reply {
        Text(String),
        Unauthenticated,
        Upstream,
    }

    struct Harness {
        client: GatewayClient,
        completes: Arc<Mutex<Vec<Vec<ChatMessage>>>>,
        saves: Arc<Mutex<Vec<ConversationRecord>>>,
    }

    fn scripted_gateway(auth: AuthState, settings: Settings, reply: Reply) -> Harness {
        let (client, mut rx) = GatewayClient::channel(8);
        let completes: Arc<Mutex<Vec<Vec<ChatMessage>>>> = Arc::default();
        let saves: Arc<Mutex<Vec<ConversationRecord>>> = Arc::default();

        let completes_task = completes.clone();
        let saves_task = saves.clone();
        tokio::spawn(async move {
            while let Some(req) = rx.recv().await {
                match req {
                    GatewayRequest::CheckAuth { reply } => {
                        let _ = reply.send(Ok(auth.clone()));
                    }
                    GatewayRequest::GetSettings { reply } => {
                        let _ = reply.send(Ok(settings.clone()));
                    }
                    GatewayRequest::Complete {
                        messages,
                        reply: tx,
                        ..
                    } => {
                        completes_task.lock().unwrap().push(messages);
                        let _ = tx.send(match &reply {
                            Reply::Text(text) => Ok(text.clone()),
                            Reply::Unauthenticated => Err(GatewayError::Unauthenticated),
                            Reply::Upstream => Err(GatewayError::upstream(500, "boom")),
                        });
                    }
                    GatewayRequest::SaveConversation { record, reply } => {
                        saves_task.lock().unwrap().push(record);
                        let _ = reply.send(Ok("conv-1".to_string()));
                    }
                }
            }
        });

        Harness {
            client,
            completes,
            saves,
        }
    }

    struct CheckerboardRenderer;

    #[async_trait]
    impl PageRenderer for CheckerboardRenderer {
        async fn render_page(&self) -> Result<RgbaImage> {
            Ok(RgbaImage::from_pixel(400, 400, image::Rgba([200, 200, 200, 255])))
        }
    }

    struct FailingRenderer;

    #[async_trait]
    impl PageRenderer for FailingRenderer {
        async fn render_page(&self) -> Result<RgbaImage> {
            Err(Error::Render("compositor unavailable".into()))
        }
    }

    struct OkClipboard {
        last: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Clipboard for OkClipboard {
        async fn write_text(&self, text: &str) -> Result<()> {
            *self.last.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    #[async_trait]
    impl Clipboard for BrokenClipboard {
        async fn write_text(&self, _text: &str) -> Result<()> {
            Err(Error::Clipboard("denied".into()))
        }
    }

    struct ScriptedConfirm {
        answer: bool,
        asked: bool,
    }

    impl Confirm for ScriptedConfirm {
        fn confirm(&mut self, _prompt: &str) -> bool {
            self.asked = true;
            self.answer
        }
    }

    fn signed_in() -> AuthState {
        AuthState::signed_in(AuthUser {
            uid: "u1".into(),
            email: "u1@example.com".into(),
            display_name: None,
        })
    }

    fn page() -> PageInfo {
        PageInfo::new("https://example.com/doc", "Doc", "example.com")
    }

    fn controller(harness: &Harness) -> OverlayController {
        OverlayController::new(
            harness.client.clone(),
            Arc::new(CheckerboardRenderer),
            page(),
            1.0,
        )
    }

    #[tokio::test]
    async fn test_init_caches_auth_and_settings() {
        let settings = Settings {
            default_model: "gpt-4o-mini".into(),
            ..Settings::default()
        };
        let harness = scripted_gateway(signed_in(), settings, Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        ctl.init().await;
        assert!(ctl.auth_state().authenticated);
        assert_eq!(ctl.settings().default_model, "gpt-4o-mini");
    }

    #[tokio::test]
    async fn test_init_anonymous_keeps_defaults() {
        let harness = scripted_gateway(
            AuthState::anonymous(),
            Settings::default(),
            Reply::Text("ok".into()),
        );
        let mut ctl = controller(&harness);

        ctl.init().await;
        assert!(!ctl.auth_state().authenticated);
        assert_eq!(ctl.settings().default_model, "gpt-4o");
    }

    #[tokio::test]
    async fn test_right_click_with_selection_opens_seeded_menu() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        ctl.right_click(100.0, 50.0, Some("lorem ipsum"));
        assert!(ctl.is_menu_visible());
        assert!(!ctl.is_region_active());
        assert_eq!(ctl.prompt_field().text(), "Explain this text: \"lorem ipsum\"");
    }

    #[tokio::test]
    async fn test_right_click_without_selection_starts_drag() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        ctl.right_click(100.0, 50.0, None);
        assert!(!ctl.is_menu_visible());
        assert!(ctl.is_region_active());

        // Whitespace selection counts as none
        let mut ctl = controller(&harness);
        ctl.right_click(0.0, 0.0, Some("   "));
        assert!(ctl.is_region_active());
    }

    #[tokio::test]
    async fn test_submit_runs_round_trip_and_saves() {
        let harness = scripted_gateway(
            signed_in(),
            Settings::default(),
            Reply::Text("It means placeholder text.".into()),
        );
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(30.0, 40.0, Some("lorem"));
        let id = ctl.submit_prompt().await.unwrap();

        let bubble = ctl.bubbles().get(id).unwrap();
        assert!(!bubble.is_loading());
        assert_eq!(bubble.position(), (30.0, 40.0));
        assert_eq!(bubble.conversation().len(), 2);
        assert!(!ctl.is_menu_visible());

        // System instruction leads the outbound sequence
        let completes = harness.completes.lock().unwrap();
        assert_eq!(completes.len(), 1);
        assert_eq!(completes[0][0].role, Role::System);
        assert_eq!(completes[0][0].text(), INITIAL_SYSTEM_INSTRUCTION);

        let saves = harness.saves.lock().unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].domain, "example.com");
    }

    #[tokio::test]
    async fn test_submit_empty_prompt_is_noop() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        assert!(ctl.submit_prompt().await.is_none());
        assert!(ctl.bubbles().is_empty());
    }

    #[tokio::test]
    async fn test_region_capture_attaches_image_to_outbound() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("a chart".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(10.0, 10.0, None);
        ctl.drag_update(90.0, 70.0);
        ctl.finish_region(90.0, 70.0).await;

        assert!(ctl.is_menu_visible());
        assert_eq!(
            ctl.prompt_field().text(),
            "Analyze this screenshot and explain what you see."
        );

        ctl.submit_prompt().await.unwrap();

        let completes = harness.completes.lock().unwrap();
        let last = completes[0].last().unwrap();
        assert!(last.has_image());
        assert_eq!(last.role, Role::User);
    }

    #[tokio::test]
    async fn test_tiny_region_degrades_to_plain_menu() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        ctl.right_click(10.0, 10.0, None);
        ctl.finish_region(14.0, 14.0).await;

        assert!(ctl.is_menu_visible());
        assert!(ctl.prompt_field().is_empty());
        assert!(!ctl.is_region_active());
    }

    #[tokio::test]
    async fn test_render_failure_degrades_to_plain_menu() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = OverlayController::new(
            harness.client.clone(),
            Arc::new(FailingRenderer),
            page(),
            1.0,
        );
        let mut rx = ctl.subscribe();

        ctl.right_click(10.0, 10.0, None);
        ctl.finish_region(200.0, 200.0).await;

        assert!(ctl.is_menu_visible());
        assert!(ctl.prompt_field().is_empty());

        // The live rectangle is removed even on failure
        let mut saw_region_ended = false;
        while let Ok(event) = rx.try_recv() {
            if event == OverlayEvent::RegionEnded {
                saw_region_ended = true;
            }
        }
        assert!(saw_region_ended);
    }

    #[tokio::test]
    async fn test_failed_round_trip_lands_as_error_message() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Upstream);
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();

        let bubble = ctl.bubbles().get(id).unwrap();
        assert!(!bubble.is_loading());
        let last = bubble.conversation().messages().last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.text().starts_with("Error:"));

        // Failed exchanges are never saved
        assert!(harness.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_requests_sign_in_prompt() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Unauthenticated);
        let mut ctl = controller(&harness);
        let mut rx = ctl.subscribe();

        ctl.right_click(0.0, 0.0, Some("text"));
        ctl.submit_prompt().await.unwrap();

        let mut prompted = false;
        while let Ok(event) = rx.try_recv() {
            if event == OverlayEvent::AuthPromptRequested {
                prompted = true;
            }
        }
        assert!(prompted);
    }

    #[tokio::test]
    async fn test_no_save_when_anonymous() {
        let harness = scripted_gateway(
            AuthState::anonymous(),
            Settings::default(),
            Reply::Text("ok".into()),
        );
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        ctl.submit_prompt().await.unwrap();

        assert!(harness.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_save_when_auto_save_off() {
        let settings = Settings {
            auto_save: false,
            ..Settings::default()
        };
        let harness = scripted_gateway(signed_in(), settings, Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        ctl.submit_prompt().await.unwrap();

        assert!(harness.saves.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stale_reply_for_removed_bubble_is_discarded() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.remove_bubble(id);

        // A late reply for the removed bubble changes nothing
        ctl.apply_round_trip(id, Ok("late".into())).await;
        assert!(ctl.bubbles().is_empty());
    }

    #[tokio::test]
    async fn test_panel_refuses_loading_bubble_and_allows_ready() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();

        assert!(ctl.open_panel(id));
        assert_eq!(ctl.panel().unwrap().bubble(), id);

        // A second bubble's panel replaces the first
        ctl.right_click(5.0, 5.0, Some("more"));
        let second = ctl.submit_prompt().await.unwrap();
        assert!(ctl.open_panel(second));
        assert_eq!(ctl.panel().unwrap().bubble(), second);
    }

    #[tokio::test]
    async fn test_panel_does_not_open_while_loading() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);

        let bubble = Bubble::new(0.0, 0.0, "pending");
        let id = ctl.bubbles.insert(bubble);
        assert!(!ctl.open_panel(id));
        assert!(ctl.panel().is_none());
    }

    #[tokio::test]
    async fn test_outside_click_respects_arming() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);

        // Before arming, outside clicks are ignored
        ctl.outside_click(false, false);
        assert!(ctl.panel().is_some());

        ctl.arm_panel_guard();
        ctl.outside_click(true, false);
        assert!(ctl.panel().is_some());
        ctl.outside_click(false, false);
        assert!(ctl.panel().is_none());
    }

    #[tokio::test]
    async fn test_panel_send_appends_turns_and_restores_input() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("again".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);

        ctl.panel.as_mut().unwrap().input_mut().set_text("tell me more");
        ctl.panel_send().await;

        let bubble = ctl.bubbles().get(id).unwrap();
        assert_eq!(bubble.conversation().len(), 4);
        let messages = bubble.conversation().messages();
        assert_eq!(messages[2].text(), "tell me more");
        assert_eq!(messages[3].text(), "again");

        let panel = ctl.panel().unwrap();
        assert!(!panel.input().is_disabled());
        assert!(panel.input().is_focused());

        // Follow-up turns use the continuation instruction
        let completes = harness.completes.lock().unwrap();
        let follow_up = completes.last().unwrap();
        assert_eq!(follow_up[0].text(), CONTINUATION_SYSTEM_INSTRUCTION);
    }

    #[tokio::test]
    async fn test_panel_clear_is_confirmation_gated() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);

        let mut declined = ScriptedConfirm {
            answer: false,
            asked: false,
        };
        ctl.panel_clear(&mut declined);
        assert!(declined.asked);
        assert_eq!(ctl.bubbles().get(id).unwrap().conversation().len(), 2);

        let mut accepted = ScriptedConfirm {
            answer: true,
            asked: false,
        };
        ctl.panel_clear(&mut accepted);
        assert_eq!(ctl.bubbles().get(id).unwrap().conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_panel_copy_reports_feedback() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("hi".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);

        let clipboard = OkClipboard {
            last: Mutex::new(None),
        };
        ctl.panel_copy(&clipboard).await;
        assert_eq!(ctl.panel().unwrap().copy_feedback(), CopyFeedback::Copied);
        let copied = clipboard.last.lock().unwrap().clone().unwrap();
        assert!(copied.starts_with("You: "));
        assert!(copied.contains("AI: hi"));

        ctl.panel_copy(&BrokenClipboard).await;
        assert_eq!(ctl.panel().unwrap().copy_feedback(), CopyFeedback::Failed);
    }

    #[tokio::test]
    async fn test_remove_bubble_closes_its_panel() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);

        ctl.remove_bubble(id);
        assert!(ctl.panel().is_none());
        assert!(ctl.bubbles().is_empty());
    }

    #[tokio::test]
    async fn test_teardown_drops_every_surface() {
        let harness = scripted_gateway(signed_in(), Settings::default(), Reply::Text("ok".into()));
        let mut ctl = controller(&harness);
        ctl.init().await;

        ctl.right_click(0.0, 0.0, Some("text"));
        let id = ctl.submit_prompt().await.unwrap();
        ctl.open_panel(id);
        ctl.right_click(5.0, 5.0, Some("more"));

        ctl.teardown();
        assert!(ctl.panel().is_none());
        assert!(!ctl.is_menu_visible());
        assert!(ctl.bubbles().is_empty());
        assert!(!ctl.is_region_active());
    }
}
