//! Spoken replies.
//!
//! [`Speaker`] is the adapter the chat loop calls. It never queues: every
//! [`Speaker::speak`] cancels whatever is playing before starting the new
//! utterance. Truncation is the caller's job (see [`spoken_text`]).

use super::{Capability, resolve_program};
use crate::config::SpeechOutputConfig;
use crate::error::{DeskError, Result};
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Programs probed on `PATH` when none is configured, in order.
pub const CANDIDATE_PROGRAMS: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// Base words-per-minute for rate 1.0 on `say` and `espeak`.
const BASE_WPM: f32 = 175.0;

/// Neutral `espeak` pitch (0-99 scale).
const BASE_ESPEAK_PITCH: f32 = 50.0;

/// Text plus prosody for one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
}

/// A platform speech synthesizer.
pub trait SpeechSynthesizer: Send + Sync {
    /// Short name for logs and the capability report.
    fn name(&self) -> &str;

    /// Start speaking `utterance`. Returns once playback has started.
    ///
    /// # Errors
    ///
    /// Returns [`DeskError::Speech`] if playback could not start.
    fn start(&self, utterance: &Utterance) -> Result<()>;

    /// Stop anything queued or playing. No-op when idle.
    fn cancel(&self);
}

/// Cancel-then-speak adapter over an optional synthesizer.
#[derive(Clone)]
pub struct Speaker {
    synth: Option<Arc<dyn SpeechSynthesizer>>,
    rate: f32,
    pitch: f32,
}

impl Speaker {
    /// Wire the adapter from a detection result.
    pub fn new(synth: Capability<Arc<dyn SpeechSynthesizer>>, config: &SpeechOutputConfig) -> Self {
        Self {
            synth: synth.into_option(),
            rate: config.rate,
            pitch: config.pitch,
        }
    }

    /// An adapter with no synthesizer; [`speak`](Self::speak) is a no-op.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            synth: None,
            rate: 1.0,
            pitch: 1.0,
        }
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.synth.is_some()
    }

    /// Speak `text`, interrupting any earlier utterance.
    pub fn speak(&self, text: &str) {
        let Some(synth) = &self.synth else {
            return;
        };
        synth.cancel();
        let utterance = Utterance {
            text: text.to_owned(),
            rate: self.rate,
            pitch: self.pitch,
        };
        if let Err(e) = synth.start(&utterance) {
            warn!(synth = synth.name(), error = %e, "speech synthesis failed");
        }
    }

    /// Stop speaking.
    pub fn cancel(&self) {
        if let Some(synth) = &self.synth {
            synth.cancel();
        }
    }
}

/// Text to hand to [`Speaker::speak`] for a reply.
///
/// Replies longer than `limit` characters are cut to the first `limit`
/// characters with `suffix` appended; shorter replies pass through unchanged.
#[must_use]
pub fn spoken_text<'a>(reply: &'a str, limit: usize, suffix: &str) -> Cow<'a, str> {
    match reply.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{suffix}", &reply[..cut])),
        None => Cow::Borrowed(reply),
    }
}

/// Command-line conventions of the supported synthesizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthFlavor {
    /// macOS `say`.
    Say,
    /// `espeak` / `espeak-ng`.
    Espeak,
    /// speech-dispatcher's `spd-say`.
    SpdSay,
    /// Anything else: the text is the only argument.
    Generic,
}

impl SynthFlavor {
    #[must_use]
    pub fn from_program(program: &Path) -> Self {
        match program.file_stem().and_then(|s| s.to_str()) {
            Some("say") => Self::Say,
            Some("espeak" | "espeak-ng") => Self::Espeak,
            Some("spd-say") => Self::SpdSay,
            _ => Self::Generic,
        }
    }

    /// Arguments for speaking `utterance`. Known flavors end options with
    /// `--` so replies starting with `-` are spoken, not parsed.
    #[must_use]
    pub fn args(self, utterance: &Utterance) -> Vec<String> {
        let wpm = (BASE_WPM * utterance.rate).round().max(1.0) as u32;
        match self {
            Self::Say => vec![
                "-r".into(),
                wpm.to_string(),
                "--".into(),
                utterance.text.clone(),
            ],
            Self::Espeak => {
                let pitch = (BASE_ESPEAK_PITCH * utterance.pitch).round().clamp(0.0, 99.0) as u32;
                vec![
                    "-s".into(),
                    wpm.to_string(),
                    "-p".into(),
                    pitch.to_string(),
                    "--".into(),
                    utterance.text.clone(),
                ]
            }
            Self::SpdSay => {
                let rate = ((utterance.rate - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
                let pitch = ((utterance.pitch - 1.0) * 100.0).round().clamp(-100.0, 100.0) as i32;
                vec![
                    "-w".into(),
                    "-r".into(),
                    rate.to_string(),
                    "-p".into(),
                    pitch.to_string(),
                    "--".into(),
                    utterance.text.clone(),
                ]
            }
            Self::Generic => vec![utterance.text.clone()],
        }
    }
}

/// Synthesizer that runs a speech program per utterance.
///
/// Cancelling kills the running child process.
pub struct CommandSynthesizer {
    program: PathBuf,
    flavor: SynthFlavor,
    current: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    #[must_use]
    pub fn new(program: PathBuf) -> Self {
        let flavor = SynthFlavor::from_program(&program);
        Self {
            program,
            flavor,
            current: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn flavor(&self) -> SynthFlavor {
        self.flavor
    }

    /// Find a synthesizer according to `config`.
    pub fn detect(config: &SpeechOutputConfig) -> Capability<Self> {
        if !config.enabled {
            return Capability::unavailable("speech output disabled in config");
        }
        if let Some(program) = &config.program {
            return match resolve_program(program) {
                Some(path) => Capability::Available(Self::new(path)),
                None => Capability::unavailable(format!(
                    "speech synthesizer `{}` not found",
                    program.display()
                )),
            };
        }
        CANDIDATE_PROGRAMS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map_or_else(
                || {
                    Capability::unavailable(format!(
                        "no speech synthesizer found (tried {})",
                        CANDIDATE_PROGRAMS.join(", ")
                    ))
                },
                |path| Capability::Available(Self::new(path)),
            )
    }

    /// Whether an utterance is still playing.
    #[must_use]
    pub fn is_speaking(&self) -> bool {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        match current.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn name(&self) -> &str {
        self.program
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("synthesizer")
    }

    fn start(&self, utterance: &Utterance) -> Result<()> {
        let child = Command::new(&self.program)
            .args(self.flavor.args(utterance))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                DeskError::Speech(format!("failed to run {}: {e}", self.program.display()))
            })?;
        debug!(pid = child.id(), chars = utterance.text.chars().count(), "speaking");
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(mut previous) = current.replace(child) {
            let _ = previous.kill();
            let _ = previous.wait();
        }
        Ok(())
    }

    fn cancel(&self) {
        let previous = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(mut child) = previous {
            if matches!(child.try_wait(), Ok(None)) {
                info!(pid = child.id(), "cancelling utterance");
            }
            let _ = child.kill();
            let _ = child.wait();
        }
        if self.flavor == SynthFlavor::SpdSay {
            // speech-dispatcher keeps its own queue; flush it too.
            let _ = Command::new(&self.program)
                .arg("-C")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

impl Drop for CommandSynthesizer {
    fn drop(&mut self) {
        self.cancel();
    }
}
