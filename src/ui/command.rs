//! Terminal controls.
//!
//! Every input line is either a message to send or a slash command standing
//! in for one of the page controls (microphone toggle, persona selector,
//! voice-output checkbox, session display).
//!
//! | Line | Command |
//! |------|---------|
//! | `/mic` | [`UiCommand::Mic`] |
//! | `/persona [name]` | [`UiCommand::Persona`] |
//! | `/personas` | [`UiCommand::Personas`] |
//! | `/voice [on\|off]` | [`UiCommand::Voice`] |
//! | `/plan` | [`UiCommand::Plan`] |
//! | `/session` | [`UiCommand::Session`] |
//! | `/status` | [`UiCommand::Status`] |
//! | `/help` | [`UiCommand::Help`] |
//! | `/quit`, `/exit` | [`UiCommand::Quit`] |
//!
//! A leading `//` sends the rest of the line as a message starting with `/`.

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Put the text in the input field and press send.
    Send(String),
    /// Toggle the microphone.
    Mic,
    /// Show (`None`) or select a persona.
    Persona(Option<String>),
    /// List selectable personas.
    Personas,
    /// Toggle (`None`) or set voice output.
    Voice(Option<bool>),
    /// Show the current account plan.
    Plan,
    /// Show the session identifier.
    Session,
    /// Show the last reported mode and company.
    Status,
    Help,
    Quit,
    /// Unrecognised command or bad argument; carries the hint to print.
    Invalid(String),
}

/// Help text listing the commands.
pub const HELP: &str = "\
Type a message and press Enter to send it.
  /mic               start or stop listening
  /persona [name]    show or select the persona
  /personas          list personas
  /voice [on|off]    toggle spoken replies
  /plan              show the account plan
  /session           show the session id
  /status            show mode and company
  /quit              leave";

/// Parse one input line.
#[must_use]
pub fn parse_line(line: &str) -> UiCommand {
    let trimmed = line.trim();
    if let Some(escaped) = trimmed.strip_prefix("//") {
        return UiCommand::Send(format!("/{escaped}"));
    }
    let Some(rest) = trimmed.strip_prefix('/') else {
        return UiCommand::Send(line.to_owned());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|a| !a.is_empty())),
        None => (rest, None),
    };

    match name.to_ascii_lowercase().as_str() {
        "mic" => UiCommand::Mic,
        "persona" => UiCommand::Persona(arg.map(str::to_owned)),
        "personas" => UiCommand::Personas,
        "voice" => match arg.map(str::to_ascii_lowercase).as_deref() {
            None => UiCommand::Voice(None),
            Some("on" | "true" | "yes") => UiCommand::Voice(Some(true)),
            Some("off" | "false" | "no") => UiCommand::Voice(Some(false)),
            Some(other) => UiCommand::Invalid(format!("/voice takes on or off, not `{other}`")),
        },
        "plan" => UiCommand::Plan,
        "session" => UiCommand::Session,
        "status" => UiCommand::Status,
        "help" | "?" => UiCommand::Help,
        "quit" | "exit" => UiCommand::Quit,
        other => UiCommand::Invalid(format!("unknown command `/{other}`; try /help")),
    }
}
