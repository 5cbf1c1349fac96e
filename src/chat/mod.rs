//! The chat application: context object, event loop and submission flow.
//!
//! [`ChatApp`] owns every piece of client state (session, transcript, plan,
//! input field, persona, speech adapters) and is driven by discrete events:
//! input lines, recognition callbacks and request completions. All state
//! changes happen on the task running [`ChatApp::run`]; requests run in
//! spawned tasks and report back through a channel.

mod status;

pub use status::ConversationStatus;

use crate::api::{ChatBackend, ChatRequest, ChatResponse};
use crate::config::{DeskConfig, OverlapPolicy};
use crate::error::Result;
use crate::persona::{Persona, PersonaSelector};
use crate::plan::{AccountPlan, RenderedPlan, render_plan};
use crate::session::SessionId;
use crate::speech::{
    Capability, ListenState, RecognitionUpdate, Speaker, SpeechInput, SpeechRecognizer,
    spoken_text,
};
use crate::transcript::{PlaceholderId, Role, Transcript};
use crate::ui::command::{HELP, UiCommand, parse_line};
use crate::ui::Surface;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shown instead of a reply when the request fails for any reason.
pub const BACKEND_ERROR_TEXT: &str =
    "Oops, something went wrong talking to the backend. Is the research service running?";

/// Caption of [`BACKEND_ERROR_TEXT`].
pub const ERROR_CAPTION: &str = "Error";

/// Welcome entry shown at startup.
pub const GREETING_TEXT: &str = "Hi, I'm your Company Research Assistant.\n\
Tell me a company name, like \"Research Zeta company\", and I'll research it \
and generate an account plan for you.";

/// Caption of [`GREETING_TEXT`].
pub const GREETING_CAPTION: &str = "Mode: discovery";

/// What [`ChatApp::submit`] did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The input was empty after trimming; nothing happened.
    Ignored,
    /// A request is in flight for this placeholder.
    Dispatched(PlaceholderId),
    /// Another request is in flight; the message waits its turn.
    Queued,
}

/// Whether the event loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// A finished request, reported back to the event loop.
#[derive(Debug)]
pub struct Completion {
    placeholder: PlaceholderId,
    outcome: Result<ChatResponse>,
}

/// Truncation applied to replies before they are spoken.
#[derive(Debug, Clone)]
struct SpokenLimit {
    max_chars: usize,
    suffix: String,
}

/// Application context of one client run.
pub struct ChatApp<S: Surface> {
    session: SessionId,
    backend: Arc<dyn ChatBackend>,
    surface: S,
    transcript: Transcript,
    plan: Option<AccountPlan>,
    rendered_plan: RenderedPlan,
    input: String,
    personas: PersonaSelector,
    voice_output: bool,
    speaker: Speaker,
    spoken_limit: SpokenLimit,
    mic: SpeechInput,
    recognition_rx: mpsc::UnboundedReceiver<RecognitionUpdate>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    overlap: OverlapPolicy,
    in_flight: usize,
    queued: VecDeque<String>,
    status: ConversationStatus,
    greeting: bool,
}

impl<S: Surface> ChatApp<S> {
    /// Build the application context.
    ///
    /// Speech capabilities are detected by the caller; an unavailable
    /// recognizer leaves the microphone control disabled and an unavailable
    /// synthesizer makes spoken replies a silent no-op.
    pub fn new(
        config: &DeskConfig,
        backend: Arc<dyn ChatBackend>,
        speaker: Speaker,
        recognizer: Capability<Arc<dyn SpeechRecognizer>>,
        surface: S,
    ) -> Self {
        let (recognition_tx, recognition_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: SessionId::generate(),
            backend,
            surface,
            transcript: Transcript::new(),
            plan: None,
            rendered_plan: RenderedPlan::default(),
            input: String::new(),
            personas: PersonaSelector::new(
                config.chat.personas.clone(),
                Persona::new(config.chat.persona.clone()),
            ),
            voice_output: config.chat.voice_output,
            speaker,
            spoken_limit: SpokenLimit {
                max_chars: config.speech_output.max_spoken_chars,
                suffix: config.speech_output.truncation_suffix.clone(),
            },
            mic: SpeechInput::new(recognizer, recognition_tx),
            recognition_rx,
            completions_tx,
            completions_rx,
            overlap: config.chat.overlap,
            in_flight: 0,
            queued: VecDeque::new(),
            status: ConversationStatus::default(),
            greeting: config.chat.greeting,
        }
    }

    /// Replace the generated session identifier.
    #[must_use]
    pub fn with_session(mut self, session: SessionId) -> Self {
        self.session = session;
        self
    }

    #[must_use]
    pub fn session(&self) -> &SessionId {
        &self.session
    }

    #[must_use]
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    #[must_use]
    pub fn plan(&self) -> Option<&AccountPlan> {
        self.plan.as_ref()
    }

    #[must_use]
    pub fn rendered_plan(&self) -> &RenderedPlan {
        &self.rendered_plan
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[must_use]
    pub fn persona(&self) -> &Persona {
        self.personas.current()
    }

    #[must_use]
    pub fn status(&self) -> &ConversationStatus {
        &self.status
    }

    #[must_use]
    pub fn voice_output(&self) -> bool {
        self.voice_output
    }

    #[must_use]
    pub fn listen_state(&self) -> ListenState {
        self.mic.state()
    }

    /// Requests sent but not yet resolved.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Messages waiting for the in-flight request to resolve.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queued.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Replace the input field's content.
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Print the startup banner, the welcome entry and the empty plan panel.
    pub fn greet(&mut self) {
        let banner = format!("Session: {}  Persona: {}", self.session, self.persona());
        self.surface.notice(&banner);
        match self.mic.unavailable_reason() {
            None => self.surface.notice("Microphone: /mic to talk"),
            Some(reason) => self
                .surface
                .notice(&format!("Microphone disabled: {reason}")),
        }
        if self.greeting {
            let entry = self.transcript.append(
                Role::Assistant,
                GREETING_TEXT,
                Some(GREETING_CAPTION.to_owned()),
            );
            self.surface.entry_appended(&entry);
        }
        self.surface.plan_rendered(&self.rendered_plan);
    }

    /// Send what is in the input field.
    pub fn submit(&mut self) -> SubmitOutcome {
        let text = self.input.trim().to_owned();
        if text.is_empty() {
            return SubmitOutcome::Ignored;
        }
        self.input.clear();

        if self.overlap == OverlapPolicy::Queue && self.in_flight > 0 {
            debug!(pending = self.queued.len() + 1, "request in flight; message queued");
            self.queued.push_back(text);
            self.surface
                .notice("(waiting for the previous reply before sending)");
            return SubmitOutcome::Queued;
        }
        SubmitOutcome::Dispatched(self.dispatch(text))
    }

    /// Render the user entry and placeholder, then send the request.
    fn dispatch(&mut self, text: String) -> PlaceholderId {
        let entry = self.transcript.append(Role::User, text.clone(), None);
        self.surface.entry_appended(&entry);

        let placeholder = self.transcript.push_placeholder();
        self.surface.placeholder_shown(placeholder);

        let request = ChatRequest {
            session_id: self.session.to_string(),
            message: text,
            persona: self.persona().to_string(),
        };
        info!(
            session_id = %request.session_id,
            persona = %request.persona,
            chars = request.message.chars().count(),
            "sending message"
        );

        let backend = Arc::clone(&self.backend);
        let completions = self.completions_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let outcome = backend.send(&request).await;
            let _ = completions.send(Completion {
                placeholder,
                outcome,
            });
        });
        placeholder
    }

    /// Resolve a finished request.
    pub fn complete(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.transcript.remove_placeholder(completion.placeholder) {
            self.surface.placeholder_removed(completion.placeholder);
        }

        match completion.outcome {
            Ok(response) => self.show_reply(response),
            Err(e) => {
                warn!(error = %e, "chat request failed");
                let entry = self.transcript.append(
                    Role::Assistant,
                    BACKEND_ERROR_TEXT,
                    Some(ERROR_CAPTION.to_owned()),
                );
                self.surface.entry_appended(&entry);
            }
        }

        if self.in_flight == 0
            && let Some(next) = self.queued.pop_front()
        {
            self.dispatch(next);
        }
    }

    fn show_reply(&mut self, response: ChatResponse) {
        let caption = response.caption();
        self.status.update(&response);
        let ChatResponse {
            reply,
            account_plan,
            ..
        } = response;

        let entry = self
            .transcript
            .append(Role::Assistant, reply.clone(), Some(caption));
        self.surface.entry_appended(&entry);

        if let Some(plan) = account_plan {
            self.rendered_plan = render_plan(Some(&plan));
            self.plan = Some(plan);
            self.surface.plan_rendered(&self.rendered_plan);
        }

        if self.voice_output {
            let spoken = spoken_text(
                &reply,
                self.spoken_limit.max_chars,
                &self.spoken_limit.suffix,
            );
            self.speaker.speak(&spoken);
        }
    }

    /// Apply a recognition callback; a final transcript is sent like typed input.
    pub fn handle_recognition(&mut self, update: RecognitionUpdate) {
        let before = self.mic.state();
        let transcript = self.mic.handle(update);
        if self.mic.state() != before {
            self.surface.listening_changed(self.mic.state());
        }
        if let Some(text) = transcript {
            self.set_input(text);
            self.surface.input_changed(&self.input);
            self.submit();
        }
    }

    /// Handle one terminal input line.
    pub fn handle_line(&mut self, line: &str) -> Flow {
        match parse_line(line) {
            UiCommand::Send(text) => {
                self.set_input(text);
                self.submit();
            }
            UiCommand::Mic => {
                if let Some(reason) = self.mic.unavailable_reason() {
                    let notice = format!("Microphone disabled: {reason}");
                    self.surface.notice(&notice);
                } else {
                    self.mic.toggle();
                }
            }
            UiCommand::Persona(None) => {
                let notice = format!("Persona: {}", self.persona());
                self.surface.notice(&notice);
            }
            UiCommand::Persona(Some(label)) => {
                let notice = match self.personas.select(&label) {
                    Some(persona) => format!("Persona: {persona}"),
                    None => format!(
                        "Unknown persona `{label}`; choose one of: {}",
                        self.personas.options().join(", ")
                    ),
                };
                self.surface.notice(&notice);
            }
            UiCommand::Personas => {
                let notice = if self.personas.options().is_empty() {
                    "Any persona label is accepted.".to_owned()
                } else {
                    format!("Personas: {}", self.personas.options().join(", "))
                };
                self.surface.notice(&notice);
            }
            UiCommand::Voice(setting) => {
                self.voice_output = setting.unwrap_or(!self.voice_output);
                if !self.voice_output {
                    self.speaker.cancel();
                }
                let notice = match (self.voice_output, self.speaker.is_available()) {
                    (true, true) => "Voice output: on",
                    (true, false) => "Voice output: on (no speech synthesizer available)",
                    (false, _) => "Voice output: off",
                };
                self.surface.notice(notice);
            }
            UiCommand::Plan => self.surface.plan_rendered(&self.rendered_plan),
            UiCommand::Session => {
                let notice = format!("Session: {}", self.session);
                self.surface.notice(&notice);
            }
            UiCommand::Status => {
                let notice = self.status.to_string();
                self.surface.notice(&notice);
            }
            UiCommand::Help => self.surface.notice(HELP),
            UiCommand::Quit => return Flow::Quit,
            UiCommand::Invalid(hint) => self.surface.notice(&hint),
        }
        Flow::Continue
    }

    /// Wait for the next request completion and apply it.
    ///
    /// Returns `false` when nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight == 0 {
            return false;
        }
        match self.completions_rx.recv().await {
            Some(completion) => {
                self.complete(completion);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is in flight or queued.
    pub async fn settle(&mut self) {
        while self.next_completion().await {}
    }

    /// Run the event loop until `/quit` or cancellation.
    ///
    /// When input ends the loop keeps going until every in-flight and queued
    /// message has its reply or error entry.
    pub async fn run(mut self, mut lines: mpsc::Receiver<String>, cancel: CancellationToken) -> S {
        self.greet();
        let mut input_open = true;
        loop {
            if !input_open && self.in_flight == 0 && self.queued.is_empty() {
                break;
            }
            tokio::select! {
                () = cancel.cancelled() => break,
                line = lines.recv(), if input_open => {
                    let Some(line) = line else {
                        debug!(in_flight = self.in_flight, "input closed; draining requests");
                        input_open = false;
                        continue;
                    };
                    if self.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                Some(event) = self.recognition_rx.recv() => self.handle_recognition(event),
                Some(completion) = self.completions_rx.recv() => self.complete(completion),
            }
        }
        self.speaker.cancel();
        info!(
            in_flight = self.in_flight,
            queued = self.queued.len(),
            "chat loop finished"
        );
        self.surface
    }
}
