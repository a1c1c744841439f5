//! Line-oriented console front end.
//!
//! One command per line. The console answers the session's dialogs from the
//! same input stream, so a whole session can be scripted.

use std::io::{BufRead, Write};

use crate::app::controllers::session::{
    Notice, Prompter, SessionManager, SessionObserver, StatusLine, UnsavedChoice,
};
use crate::app::domain::document::DocumentId;
use crate::app::domain::messages::Message;
use crate::app::domain::styles::{Color, StyleKind};
use crate::app::infrastructure::error::{AppError, Result};

pub const HELP: &str = "\
Commands:
  new                 open a new Untitled tab
  open <path>         open a note from the notes directory
  save                save the active note
  save-as <title>     save under a new timestamped name
  list                list saved notes
  close               close the active tab
  next | prev         cycle tabs
  tab <id>            switch to a tab by id
  tabs                show open tabs
  type <text>         append text (\\n for a newline)
  insert <pos> <text> insert text at a character offset
  delete <a> <b>      delete characters [a, b)
  select <a> <b>      select characters [a, b)
  select-all          select the whole text
  bold | italic | underline
  color #rrggbb       text color for the selection
  bg #rrggbb          background color for the selection
  search <term>       highlight matches
  clear-search        remove search highlights
  undo | redo
  font <family>       session font family
  size <n>            session font size
  show                print the active text and its formatting
  help
  exit";

/// Turn one input line into a session command.
pub fn parse_command(line: &str) -> Result<Message> {
    let line = line.trim_end_matches(['\r', '\n']);
    let (cmd, rest) = match line.trim_start().split_once(' ') {
        Some((cmd, rest)) => (cmd, rest),
        None => (line.trim(), ""),
    };
    let arg = rest.trim();

    let message = match cmd {
        "new" => Message::FileNew,
        "open" => Message::FileOpen(required(arg, "Please enter a file to open.")?),
        "save" => Message::FileSave,
        "save-as" => Message::FileSaveAs(arg.to_string()),
        "list" => Message::ListNotes,
        "close" => Message::CloseTab,
        "next" => Message::NextTab,
        "prev" => Message::PrevTab,
        "tab" => Message::SwitchTab(DocumentId(number(arg)? as u64)),
        "type" => Message::Append(unescape(rest)),
        "insert" => {
            let (pos, text) = rest
                .trim_start()
                .split_once(' ')
                .ok_or_else(|| AppError::validation("Usage: insert <pos> <text>"))?;
            Message::Insert {
                pos: number(pos)?,
                text: unescape(text),
            }
        }
        "delete" => {
            let (start, end) = pair(arg)?;
            Message::Delete { start, end }
        }
        "select" => {
            let (start, end) = pair(arg)?;
            Message::Select { start, end }
        }
        "select-all" => Message::SelectAll,
        "bold" => Message::ToggleStyle(StyleKind::Bold),
        "italic" => Message::ToggleStyle(StyleKind::Italic),
        "underline" => Message::ToggleStyle(StyleKind::Underline),
        "color" => Message::SetTextColor(color(arg)?),
        "bg" => Message::SetBackground(color(arg)?),
        "search" => Message::Search(arg.to_string()),
        "clear-search" => Message::ClearSearch,
        "undo" => Message::EditUndo,
        "redo" => Message::EditRedo,
        "font" => Message::SetFontFamily(arg.to_string()),
        "size" => Message::SetFontSize(number(arg)? as u32),
        "exit" | "quit" => Message::FileQuit,
        other => {
            return Err(AppError::validation(format!(
                "Unknown command '{other}'. Type 'help' for a list."
            )));
        }
    };
    Ok(message)
}

fn required(arg: &str, msg: &str) -> Result<String> {
    if arg.is_empty() {
        Err(AppError::validation(msg))
    } else {
        Ok(arg.to_string())
    }
}

fn number(arg: &str) -> Result<usize> {
    arg.trim()
        .parse()
        .map_err(|_| AppError::validation(format!("'{}' is not a number.", arg.trim())))
}

fn pair(arg: &str) -> Result<(usize, usize)> {
    let mut parts = arg.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(a), Some(b), None) => Ok((number(a)?, number(b)?)),
        _ => Err(AppError::validation("Please give a start and an end offset.")),
    }
}

fn color(arg: &str) -> Result<Color> {
    Color::from_hex(arg)
        .ok_or_else(|| AppError::validation(format!("'{arg}' is not a color. Use #rrggbb.")))
}

fn unescape(text: &str) -> String {
    text.replace("\\n", "\n").replace("\\t", "\t")
}

/// Traces every status change.
pub struct StatusLog;

impl SessionObserver for StatusLog {
    fn status_changed(&mut self, status: &StatusLine) {
        tracing::debug!(document = status.document.0, dirty = status.dirty, "{}", status);
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                None
            }
        }
    }

    fn say(&mut self, text: &str) {
        if let Err(e) = writeln!(self.output, "{text}") {
            tracing::error!("Failed to write output: {}", e);
        }
    }

    fn ask(&mut self, question: &str) -> Option<String> {
        if let Err(e) = write!(self.output, "{question}").and_then(|_| self.output.flush()) {
            tracing::error!("Failed to write output: {}", e);
        }
        self.read_line()
    }

    fn choose(&mut self, question: &str) -> UnsavedChoice {
        let answer = self.ask(question).unwrap_or_default();
        match answer.trim().to_lowercase().as_str() {
            "s" | "save" | "save all" => UnsavedChoice::SaveAll,
            "d" | "discard" => UnsavedChoice::Discard,
            _ => UnsavedChoice::Cancel,
        }
    }

    fn show_tabs(&mut self, session: &SessionManager) {
        let active = session.tabs().active_id();
        let lines: Vec<String> = session
            .tabs()
            .documents()
            .iter()
            .map(|doc| {
                format!(
                    "{} {:>3}  {}{}",
                    if Some(doc.id) == active { "*" } else { " " },
                    doc.id.0,
                    doc.display_name(),
                    if doc.is_dirty() { " (modified)" } else { "" }
                )
            })
            .collect();
        for line in lines {
            self.say(&line);
        }
    }

    fn show_document(&mut self, session: &SessionManager) {
        let Some(doc) = session.active() else {
            return;
        };
        let text: Vec<char> = doc.text().chars().collect();
        let runs = session.styled_runs(doc.id).unwrap_or_default();

        let mut lines = vec![doc.text()];
        for run in runs {
            let style = &run.style;
            let mut attrs = vec![format!("{} {}", style.family, style.size)];
            if style.bold {
                attrs.push("bold".into());
            }
            if style.italic {
                attrs.push("italic".into());
            }
            if style.underline {
                attrs.push("underline".into());
            }
            if let Some(fg) = style.foreground {
                attrs.push(format!("color {}", fg.to_hex()));
            }
            if let Some(bg) = style.background {
                attrs.push(format!("bg {}", bg.to_hex()));
            }
            let snippet: String = text[run.range.clone()].iter().collect();
            lines.push(format!(
                "  [{}..{}] {:?}: {}",
                run.range.start,
                run.range.end,
                snippet,
                attrs.join(", ")
            ));
        }
        for line in lines {
            self.say(&line);
        }
    }

    /// Read commands until the session closes or the input ends.
    pub fn run(&mut self, session: &mut SessionManager) {
        self.say("QuillPad. Type 'help' for commands.");

        loop {
            if let Some(status) = session.status_line() {
                let marker = if status.dirty { "*" } else { "" };
                let status = format!("[{status}{marker}]");
                self.say(&status);
            }

            let Some(line) = self.ask("> ") else {
                if !session.dispatch(Message::FileQuit, self) {
                    tracing::warn!("input closed with unsaved changes left unresolved");
                }
                break;
            };

            match line.trim() {
                "" => continue,
                "help" => {
                    self.say(HELP);
                    continue;
                }
                "tabs" => {
                    self.show_tabs(session);
                    continue;
                }
                "show" => {
                    self.show_document(session);
                    continue;
                }
                _ => {}
            }

            match parse_command(&line) {
                Ok(message) => {
                    if session.dispatch(message, self) {
                        break;
                    }
                }
                Err(e) => self.notify(Notice::from_error(&e)),
            }
        }

        self.say("Goodbye.");
    }
}

impl<R: BufRead, W: Write> Prompter for Console<R, W> {
    fn confirm_unsaved(&mut self, names: &[String]) -> UnsavedChoice {
        self.say("You have unsaved changes in one or more tabs:");
        for name in names {
            self.say(&format!("  {name}"));
        }
        self.choose("[s]ave all, [d]iscard, [c]ancel? ")
    }

    fn confirm_close(&mut self, name: &str) -> UnsavedChoice {
        self.choose(&format!(
            "'{name}' has unsaved changes. [s]ave, [d]iscard, [c]ancel? "
        ))
    }

    fn ask_title(&mut self) -> Option<String> {
        self.ask("Note title: ")
            .filter(|title| !title.trim().is_empty())
    }

    fn notify(&mut self, notice: Notice) {
        let line = match &notice {
            Notice::Info { .. } => format!("{}: {}", notice.title(), notice.message()),
            Notice::Warning { .. } => format!("Warning ({}): {}", notice.title(), notice.message()),
            Notice::Error { .. } => format!("Error: {}", notice.message()),
        };
        self.say(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::domain::settings::AppSettings;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn run_script(script: &str) -> (TempDir, SessionManager, String) {
        let tmp = TempDir::new().unwrap();
        let settings = AppSettings::with_notes_directory(tmp.path().join("Notes"));
        let mut session = SessionManager::new(settings);
        let mut console = Console::new(Cursor::new(script.to_string()), Vec::new());
        console.run(&mut session);
        let output = String::from_utf8(console.into_output()).unwrap();
        (tmp, session, output)
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("new").unwrap(), Message::FileNew);
        assert_eq!(parse_command("  bold ").unwrap(), Message::ToggleStyle(StyleKind::Bold));
        assert_eq!(parse_command("exit\n").unwrap(), Message::FileQuit);
        assert_eq!(
            parse_command("save-as Weekly plan").unwrap(),
            Message::FileSaveAs("Weekly plan".into())
        );
        assert_eq!(
            parse_command("open /tmp/a b.txt").unwrap(),
            Message::FileOpen("/tmp/a b.txt".into())
        );
    }

    #[test]
    fn test_parse_text_keeps_spaces() {
        assert_eq!(
            parse_command("type  two  spaces\\n").unwrap(),
            Message::Append(" two  spaces\n".into())
        );
        assert_eq!(
            parse_command("insert 3 a b").unwrap(),
            Message::Insert { pos: 3, text: "a b".into() }
        );
    }

    #[test]
    fn test_parse_offsets_and_colors() {
        assert_eq!(
            parse_command("select 2 7").unwrap(),
            Message::Select { start: 2, end: 7 }
        );
        assert_eq!(
            parse_command("color #ff0000").unwrap(),
            Message::SetTextColor(Color::from_rgb(255, 0, 0))
        );
        assert_eq!(parse_command("size 14").unwrap(), Message::SetFontSize(14));
        assert_eq!(parse_command("tab 3").unwrap(), Message::SwitchTab(DocumentId(3)));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_command("select 1"), Err(AppError::Validation(_))));
        assert!(matches!(parse_command("select a b"), Err(AppError::Validation(_))));
        assert!(matches!(parse_command("bg red"), Err(AppError::Validation(_))));
        assert!(matches!(parse_command("open"), Err(AppError::Validation(_))));
        assert!(matches!(parse_command("frobnicate"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_scripted_session_saves_note() {
        let script = "type hello world\nselect 0 5\nbold\nsave\nMy note\nexit\n";
        let (_tmp, session, output) = run_script(script);

        assert!(session.is_closed());
        let notes = session.list_notes().unwrap();
        assert_eq!(notes.len(), 1);
        assert!(notes[0].ends_with("_My note.txt"));
        assert_eq!(session.store().load(&notes[0]).unwrap(), "hello world");
        assert!(output.contains("saved successfully"));
        assert!(output.contains("Goodbye."));
    }

    #[test]
    fn test_scripted_quit_can_be_cancelled() {
        let script = "type draft\nexit\nc\ntabs\nexit\nd\n";
        let (_tmp, session, output) = run_script(script);

        assert!(session.is_closed());
        assert!(session.list_notes().unwrap().is_empty());
        assert!(output.contains("You have unsaved changes"));
        assert!(output.contains("Untitled (modified)"));
    }

    #[test]
    fn test_errors_are_reported_and_loop_continues() {
        let script = "bold\nsearch\nwhat\nexit\n";
        let (_tmp, session, output) = run_script(script);

        assert!(session.is_closed());
        assert!(output.contains("Warning (Selection Error): Please select text first."));
        assert!(output.contains("Warning (Input Required)"));
        assert!(output.contains("Unknown command 'what'"));
    }

    #[test]
    fn test_end_of_input_quits() {
        let (_tmp, session, _output) = run_script("type x\n");
        assert!(!session.is_closed());

        let (_tmp, session, _output) = run_script("");
        assert!(session.is_closed());
    }

    #[test]
    fn test_show_prints_runs() {
        let script = "type abc\nselect 0 1\nitalic\nshow\nexit\nd\n";
        let (_tmp, _session, output) = run_script(script);
        assert!(output.contains("[0..1] \"a\": Arial 12, italic"));
        assert!(output.contains("[1..3] \"bc\": Arial 12"));
    }
}
