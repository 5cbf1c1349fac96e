//! Microphone input.
//!
//! [`SpeechInput`] drives a platform recognizer through an explicit two-state
//! machine:
//!
//! ```text
//!          start() ─► [recognizer launched] ─► Started
//!   Idle ───────────────────────────────────────────────► Listening
//!   Idle ◄─────────────────────────────────────────────── Listening
//!          Ended (stop(), silence timeout, recognizer exit)
//! ```
//!
//! State changes only on the recognizer's `Started`/`Ended` events. Every
//! launch gets a fresh [`RecognitionRun`] id and events from any other run are
//! ignored, so a late `Ended` from a stopped run cannot end its successor. A
//! final transcript that arrives while listening is handed back to the caller,
//! which submits it exactly like typed input.

use super::{Capability, resolve_program};
use crate::config::SpeechInputConfig;
use crate::error::{DeskError, Result};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Environment variable carrying the language tag to the recognizer.
pub const LANG_ENV: &str = "ACCOUNT_DESK_LANG";

/// Recognition lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListenState {
    #[default]
    Idle,
    Listening,
}

impl fmt::Display for ListenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Listening => "listening",
        })
    }
}

/// Callbacks emitted by a running recognition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The recognizer is capturing audio.
    Started,
    /// A final, non-interim transcript.
    Result(String),
    /// Capture stopped (explicit stop, silence timeout or recognizer exit).
    Ended,
}

/// Identifies one launch of the recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecognitionRun(u64);

/// A lifecycle event tagged with the run that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionUpdate {
    pub run: RecognitionRun,
    pub event: RecognitionEvent,
}

/// A platform speech recognizer producing one final transcript per run.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn name(&self) -> &str;

    /// Capture one utterance. `Ok(None)` means nothing was recognised.
    async fn recognize(&self) -> Result<Option<String>>;
}

/// The microphone control's adapter.
pub struct SpeechInput {
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    unavailable_reason: Option<String>,
    state: ListenState,
    /// Run whose events are applied; set from launch until its `Ended`.
    current: Option<RecognitionRun>,
    next_run: u64,
    task: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<RecognitionUpdate>,
}

impl SpeechInput {
    /// Wire the adapter from a detection result. Lifecycle events are sent on `events`.
    pub fn new(
        recognizer: Capability<Arc<dyn SpeechRecognizer>>,
        events: mpsc::UnboundedSender<RecognitionUpdate>,
    ) -> Self {
        let (recognizer, unavailable_reason) = match recognizer {
            Capability::Available(r) => (Some(r), None),
            Capability::Unavailable { reason } => (None, Some(reason)),
        };
        Self {
            recognizer,
            unavailable_reason,
            state: ListenState::Idle,
            current: None,
            next_run: 0,
            task: None,
            events,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.recognizer.is_some()
    }

    /// Label for the disabled microphone control.
    #[must_use]
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }

    #[must_use]
    pub fn state(&self) -> ListenState {
        self.state
    }

    /// Launch recognition. Ignored when unavailable, listening, or already launching.
    pub fn start(&mut self) -> bool {
        let Some(recognizer) = self.recognizer.clone() else {
            debug!("speech input unavailable; start ignored");
            return false;
        };
        if self.current.is_some() {
            debug!(state = %self.state, "recognition already running; start ignored");
            return false;
        }

        let run = RecognitionRun(self.next_run);
        self.next_run += 1;
        self.current = Some(run);

        let events = self.events.clone();
        let send = move |event| {
            let _ = events.send(RecognitionUpdate { run, event });
        };
        self.task = Some(tokio::spawn(async move {
            send(RecognitionEvent::Started);
            match recognizer.recognize().await {
                Ok(Some(transcript)) => send(RecognitionEvent::Result(transcript)),
                Ok(None) => debug!(recognizer = recognizer.name(), "nothing recognised"),
                Err(e) => warn!(recognizer = recognizer.name(), error = %e, "recognition failed"),
            }
            send(RecognitionEvent::Ended);
        }));
        true
    }

    /// End recognition. Ignored when idle.
    pub fn stop(&mut self) -> bool {
        let Some(run) = self.current.filter(|_| self.state == ListenState::Listening) else {
            return false;
        };
        if let Some(task) = self.task.take() {
            // Aborting drops the recognizer future, which kills its process.
            task.abort();
        }
        let _ = self.events.send(RecognitionUpdate {
            run,
            event: RecognitionEvent::Ended,
        });
        true
    }

    /// The microphone button: start when idle, stop when listening.
    pub fn toggle(&mut self) -> bool {
        match self.state {
            ListenState::Idle => self.start(),
            ListenState::Listening => self.stop(),
        }
    }

    /// Apply a lifecycle event. Returns the transcript to submit, if any.
    pub fn handle(&mut self, update: RecognitionUpdate) -> Option<String> {
        if self.current != Some(update.run) {
            debug!(run = update.run.0, event = ?update.event, "event from a finished run; ignored");
            return None;
        }
        match update.event {
            RecognitionEvent::Started => {
                self.state = ListenState::Listening;
                info!("listening");
                None
            }
            RecognitionEvent::Ended => {
                if self.state == ListenState::Listening {
                    info!("stopped listening");
                }
                self.state = ListenState::Idle;
                self.current = None;
                self.task = None;
                None
            }
            RecognitionEvent::Result(transcript) => {
                if self.state != ListenState::Listening {
                    debug!("transcript arrived while idle; dropped");
                    return None;
                }
                let transcript = transcript.trim();
                (!transcript.is_empty()).then(|| transcript.to_owned())
            }
        }
    }
}

impl Drop for SpeechInput {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Recognizer that runs an external program for each utterance.
///
/// The program records until it decides the utterance is over and prints the
/// transcript on stdout; the first non-empty line is used.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
    lang: String,
}

impl CommandRecognizer {
    #[must_use]
    pub fn new(program: PathBuf, args: Vec<String>, lang: String) -> Self {
        Self {
            program,
            args,
            lang,
        }
    }

    /// Find the configured recognizer.
    pub fn detect(config: &SpeechInputConfig) -> Capability<Self> {
        if !config.enabled {
            return Capability::unavailable("speech input disabled in config");
        }
        let Some(program) = &config.program else {
            return Capability::unavailable(
                "speech recognition not supported: no recognizer configured (speech_input.program)",
            );
        };
        match resolve_program(program) {
            Some(path) => Capability::Available(Self::new(
                path,
                config.args.clone(),
                config.lang.clone(),
            )),
            None => Capability::unavailable(format!(
                "speech recognition not supported: `{}` not found",
                program.display()
            )),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recognizer")
    }

    async fn recognize(&self) -> Result<Option<String>> {
        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .env(LANG_ENV, &self.lang)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                DeskError::Speech(format!("failed to run {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            return Err(DeskError::Speech(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Ok(first_transcript_line(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// First non-blank line of recognizer output, trimmed.
#[must_use]
pub fn first_transcript_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::time::Duration;

    struct FixedRecognizer(Option<&'static str>);

    #[async_trait]
    impl SpeechRecognizer for FixedRecognizer {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn recognize(&self) -> Result<Option<String>> {
            Ok(self.0.map(str::to_owned))
        }
    }

    struct SlowRecognizer;

    #[async_trait]
    impl SpeechRecognizer for SlowRecognizer {
        fn name(&self) -> &str {
            "slow"
        }

        async fn recognize(&self) -> Result<Option<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some("too late".into()))
        }
    }

    fn input_with(
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> (SpeechInput, mpsc::UnboundedReceiver<RecognitionUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SpeechInput::new(Capability::Available(recognizer), tx), rx)
    }

    #[tokio::test]
    async fn recognised_transcript_is_returned_while_listening() {
        let (mut input, mut rx) = input_with(Arc::new(FixedRecognizer(Some(" Research Zeta "))));
        assert!(input.start());

        let started = rx.recv().await.unwrap();
        assert_eq!(started.event, RecognitionEvent::Started);
        assert_eq!(input.handle(started), None);
        assert_eq!(input.state(), ListenState::Listening);

        let result = rx.recv().await.unwrap();
        assert_eq!(input.handle(result), Some("Research Zeta".to_owned()));

        let ended = rx.recv().await.unwrap();
        assert_eq!(ended.event, RecognitionEvent::Ended);
        input.handle(ended);
        assert_eq!(input.state(), ListenState::Idle);
    }

    #[tokio::test]
    async fn nothing_recognised_still_ends() {
        let (mut input, mut rx) = input_with(Arc::new(FixedRecognizer(None)));
        input.start();
        assert_eq!(rx.recv().await.unwrap().event, RecognitionEvent::Started);
        assert_eq!(rx.recv().await.unwrap().event, RecognitionEvent::Ended);
    }

    #[tokio::test]
    async fn start_while_launching_or_listening_is_ignored() {
        let (mut input, mut rx) = input_with(Arc::new(SlowRecognizer));
        assert!(input.start());
        assert!(!input.start());

        let started = rx.recv().await.unwrap();
        input.handle(started);
        assert!(!input.start());
        assert_eq!(input.state(), ListenState::Listening);
    }

    #[tokio::test]
    async fn stop_while_idle_is_ignored() {
        let (mut input, _rx) = input_with(Arc::new(FixedRecognizer(Some("x"))));
        assert!(!input.stop());
        assert_eq!(input.state(), ListenState::Idle);
    }

    #[tokio::test]
    async fn stop_ends_a_running_recognition() {
        let (mut input, mut rx) = input_with(Arc::new(SlowRecognizer));
        input.start();
        let started = rx.recv().await.unwrap();
        input.handle(started);

        assert!(input.toggle());
        let ended = rx.recv().await.unwrap();
        assert_eq!(ended.event, RecognitionEvent::Ended);
        input.handle(ended);
        assert_eq!(input.state(), ListenState::Idle);

        // The aborted task never delivers its late transcript.
        let late = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(late.is_err());
    }

    #[tokio::test]
    async fn transcript_while_idle_is_dropped() {
        let (mut input, _rx) = input_with(Arc::new(FixedRecognizer(Some("x"))));
        let update = RecognitionUpdate {
            run: RecognitionRun(0),
            event: RecognitionEvent::Result("hello".into()),
        };
        assert_eq!(input.handle(update), None);
    }

    #[tokio::test]
    async fn stale_end_from_stopped_run_does_not_end_the_next_one() {
        let (mut input, mut rx) = input_with(Arc::new(FixedRecognizer(Some("x"))));
        assert!(input.start());
        let started = rx.recv().await.unwrap();
        input.handle(started);

        // The recognizer has already finished; its Result and Ended are queued.
        let result = rx.recv().await.unwrap();
        let ended = rx.recv().await.unwrap();
        assert_eq!(ended.event, RecognitionEvent::Ended);

        assert!(input.stop());
        input.handle(result);
        input.handle(ended);
        assert_eq!(input.state(), ListenState::Idle);

        assert!(input.start());
        let stop_ended = rx.recv().await.unwrap();
        assert_eq!(stop_ended.event, RecognitionEvent::Ended);
        assert_eq!(input.handle(stop_ended), None);

        // The second run is still tracked: no parallel launch, and stop works.
        assert!(!input.start());
        let started = rx.recv().await.unwrap();
        assert_eq!(started.event, RecognitionEvent::Started);
        input.handle(started);
        assert_eq!(input.state(), ListenState::Listening);
        assert!(input.stop());
    }

    #[test]
    fn unavailable_input_exposes_reason_and_ignores_start() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut input = SpeechInput::new(Capability::unavailable("no microphone"), tx);
        assert!(!input.is_available());
        assert_eq!(input.unavailable_reason(), Some("no microphone"));
        assert!(!input.start());
    }

    #[test]
    fn detect_without_program_is_unsupported() {
        let cap = CommandRecognizer::detect(&SpeechInputConfig::default());
        assert!(cap.reason().unwrap().contains("not supported"));
    }

    #[test]
    fn first_line_skips_blank_lines() {
        assert_eq!(
            first_transcript_line("\n  \n research zeta \nmore"),
            Some("research zeta".into())
        );
        assert_eq!(first_transcript_line("   \n"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_recognizer_reads_stdout() {
        let Ok(echo) = which::which("echo") else {
            return;
        };
        let recognizer =
            CommandRecognizer::new(echo, vec!["generate plan".into()], "en-US".into());
        assert_eq!(
            recognizer.recognize().await.unwrap(),
            Some("generate plan".into())
        );
    }
}
