//! Rendering surface.
//!
//! The chat loop never writes to the terminal directly; it reports every
//! visible change to a [`Surface`]. [`TerminalSurface`] prints those changes
//! as plain text to any writer.

pub mod command;

use crate::plan::RenderedPlan;
use crate::speech::ListenState;
use crate::transcript::{Entry, PlaceholderId, Role, THINKING_TEXT};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use command::{UiCommand, parse_line};

/// Everything the chat loop shows to the user.
pub trait Surface {
    /// A message was appended to the log.
    fn entry_appended(&mut self, entry: &Entry);

    /// A "thinking" placeholder was appended.
    fn placeholder_shown(&mut self, placeholder: PlaceholderId);

    /// A placeholder was removed.
    fn placeholder_removed(&mut self, placeholder: PlaceholderId);

    /// The plan panel was replaced.
    fn plan_rendered(&mut self, plan: &RenderedPlan);

    /// The microphone indicator changed.
    fn listening_changed(&mut self, state: ListenState);

    /// The input field's content was set programmatically.
    fn input_changed(&mut self, text: &str);

    /// Informational line outside the conversation log.
    fn notice(&mut self, text: &str);
}

/// Format an entry as terminal lines.
#[must_use]
pub fn format_entry(entry: &Entry) -> String {
    let label = match entry.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    let indent = " ".repeat(label.len() + 3);
    let mut out = String::new();
    for (i, line) in entry.lines().enumerate() {
        if i == 0 {
            out.push_str(&format!("{label} › {line}\n"));
        } else {
            out.push_str(&format!("{indent}{line}\n"));
        }
    }
    if let Some(caption) = &entry.caption {
        out.push_str(&format!("{indent}[{caption} · {}]\n", entry.at.format("%H:%M")));
    }
    out
}

/// Format the plan panel.
#[must_use]
pub fn format_plan(plan: &RenderedPlan) -> String {
    let mut out = String::from("=== Account plan ===\n");
    match plan {
        RenderedPlan::Placeholder(placeholder) => {
            out.push_str(placeholder.message());
            out.push('\n');
        }
        RenderedPlan::Sections(blocks) => {
            for block in blocks {
                out.push_str(&format!("## {}\n", block.title));
                for line in &block.lines {
                    out.push_str(&format!("  {line}\n"));
                }
            }
        }
    }
    out
}

/// Plain-text surface over any writer.
#[derive(Debug)]
pub struct TerminalSurface<W: Write> {
    out: W,
}

impl TerminalSurface<std::io::Stdout> {
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush())
        {
            tracing::warn!(error = %e, "failed to write to terminal");
        }
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn entry_appended(&mut self, entry: &Entry) {
        self.emit(&format_entry(entry));
    }

    fn placeholder_shown(&mut self, _placeholder: PlaceholderId) {
        self.emit(&format!("assistant › {THINKING_TEXT}\n"));
    }

    fn placeholder_removed(&mut self, _placeholder: PlaceholderId) {
        // Printed lines cannot be taken back; the reply follows directly.
    }

    fn plan_rendered(&mut self, plan: &RenderedPlan) {
        self.emit(&format_plan(plan));
    }

    fn listening_changed(&mut self, state: ListenState) {
        let line = match state {
            ListenState::Listening => "[mic ●] listening...\n",
            ListenState::Idle => "[mic ○] stopped\n",
        };
        self.emit(line);
    }

    fn input_changed(&mut self, text: &str) {
        if !text.is_empty() {
            self.emit(&format!("> {text}\n"));
        }
    }

    fn notice(&mut self, text: &str) {
        self.emit(&format!("{text}\n"));
    }
}

/// Forward stdin lines to `tx` until EOF or the receiver goes away.
pub fn spawn_stdin_reader(tx: mpsc::Sender<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    tracing::info!("stdin closed (EOF)");
                    break;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to read from stdin");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::plan::{AccountPlan, PlanSection, render_plan};
    use crate::transcript::Transcript;

    fn output(surface: TerminalSurface<Vec<u8>>) -> String {
        String::from_utf8(surface.into_inner()).unwrap()
    }

    #[test]
    fn entry_lines_are_indented_under_label() {
        let mut log = Transcript::new();
        let entry = log.append(Role::Assistant, "one\ntwo", Some("Mode: research".into()));
        let text = format_entry(&entry);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "assistant › one");
        assert_eq!(lines[1], "            two");
        assert!(lines[2].trim_start().starts_with("[Mode: research · "));
    }

    #[test]
    fn entry_without_caption_has_no_caption_line() {
        let mut log = Transcript::new();
        let entry = log.append(Role::User, "hello", None);
        assert_eq!(format_entry(&entry), "you › hello\n");
    }

    #[test]
    fn plan_panel_lists_sections_in_order() {
        let plan = AccountPlan::new()
            .with(PlanSection::NextSteps, "call")
            .with(PlanSection::CompanyOverview, "Zeta");
        let text = format_plan(&render_plan(Some(&plan)));
        let overview = text.find("## Company Overview").unwrap();
        let next = text.find("## Next Steps").unwrap();
        assert!(overview < next);
        assert!(text.contains("  Zeta\n"));
    }

    #[test]
    fn placeholder_panel_shows_message() {
        let text = format_plan(&render_plan(None));
        assert!(text.contains("No account plan yet."));
    }

    #[test]
    fn terminal_surface_writes_thinking_and_notices() {
        let mut surface = TerminalSurface::new(Vec::new());
        let mut log = Transcript::new();
        let ph = log.push_placeholder();
        surface.placeholder_shown(ph);
        surface.placeholder_removed(ph);
        surface.notice("persona: chatty");
        surface.input_changed("");
        surface.input_changed("generate plan");
        assert_eq!(
            output(surface),
            "assistant › Thinking...\npersona: chatty\n> generate plan\n"
        );
    }
}
