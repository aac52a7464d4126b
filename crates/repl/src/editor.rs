//! Edit bindings in an external editor, re-prompting on parse errors.

use crate::error::ReplError;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::Command;
use tether_lang::{Document, ParseError, parse_document, to_source};
use tracing::{debug, info};

/// Result of a completed edit.
#[derive(Debug)]
pub enum EditOutcome {
    /// The user emptied the file; keep the current bindings.
    Unchanged,
    /// The edited source parsed; install this document.
    Replaced(Document),
}

/// Runs an editor on a file and waits for it to exit.
pub trait Launcher {
    fn launch(&mut self, path: &Path) -> io::Result<()>;
}

/// Talks to the user between editor runs.
pub trait Prompt {
    fn report(&mut self, error: &ParseError);
    /// `Ok(false)` when the user declines to edit again.
    fn confirm_retry(&mut self) -> io::Result<bool>;
}

/// The editor command line from `$EDITOR`, split with shell quoting rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorCommand {
    program: String,
    args: Vec<String>,
}

impl EditorCommand {
    pub const DEFAULT: &'static str = "vi";

    pub fn from_env() -> Self {
        Self::parse(std::env::var("EDITOR").ok().as_deref())
    }

    /// `None`, blank or unsplittable values fall back to `vi`.
    pub fn parse(value: Option<&str>) -> Self {
        let mut parts = value
            .and_then(shlex::split)
            .unwrap_or_default()
            .into_iter();
        match parts.next() {
            Some(program) => Self {
                program,
                args: parts.collect(),
            },
            None => Self {
                program: Self::DEFAULT.to_string(),
                args: Vec::new(),
            },
        }
    }
}

impl Launcher for EditorCommand {
    fn launch(&mut self, path: &Path) -> io::Result<()> {
        debug!(program = %self.program, path = %path.display(), "launching editor");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .status()?;
        if status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "editor `{}` exited with {}",
                self.program, status
            )))
        }
    }
}

/// Prompts on the plain terminal while the TUI is suspended.
#[derive(Debug, Default)]
pub struct StdioPrompt;

impl Prompt for StdioPrompt {
    fn report(&mut self, error: &ParseError) {
        eprintln!("{}", error);
    }

    fn confirm_retry(&mut self) -> io::Result<bool> {
        let mut stdout = io::stdout();
        write!(stdout, "Edit again? [Y/n] ")?;
        stdout.flush()?;
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        Ok(!is_no(&answer))
    }
}

fn is_no(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "n" | "no")
}

/// Open `document` in an editor until it parses, the user empties the file,
/// or the user declines to retry.
///
/// The temp file is deleted when this returns, whatever the outcome.
pub fn edit_loop<L, P>(
    document: &Document,
    launcher: &mut L,
    prompt: &mut P,
) -> Result<EditOutcome, ReplError>
where
    L: Launcher + ?Sized,
    P: Prompt + ?Sized,
{
    let file = tempfile::Builder::new()
        .prefix("tether-")
        .suffix(".tether")
        .tempfile()?;
    let path = file.path();
    fs::write(path, to_source(document))?;

    loop {
        launcher.launch(path)?;
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            info!("edit cancelled: file left empty");
            return Ok(EditOutcome::Unchanged);
        }
        match parse_document(&content) {
            Ok(doc) => {
                info!(bindings = doc.root.entries.len(), "edit applied");
                return Ok(EditOutcome::Replaced(doc));
            }
            Err(error) => {
                prompt.report(&error);
                if !prompt.confirm_retry()? {
                    info!("edit declined after parse error");
                    return Err(ReplError::EditDeclined);
                }
                // The editor may have truncated or replaced the file
                fs::write(path, &content)?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Writes each scripted buffer in turn, remembering the paths it saw.
    struct ScriptedLauncher {
        buffers: Vec<&'static str>,
        seen: Vec<String>,
        paths: Vec<PathBuf>,
    }

    impl ScriptedLauncher {
        fn new(buffers: &[&'static str]) -> Self {
            Self {
                buffers: buffers.iter().rev().copied().collect(),
                seen: Vec::new(),
                paths: Vec::new(),
            }
        }
    }

    impl Launcher for ScriptedLauncher {
        fn launch(&mut self, path: &Path) -> io::Result<()> {
            self.seen.push(fs::read_to_string(path)?);
            self.paths.push(path.to_path_buf());
            let next = self
                .buffers
                .pop()
                .ok_or_else(|| io::Error::other("launched too often"))?;
            fs::write(path, next)
        }
    }

    struct FailingLauncher;

    impl Launcher for FailingLauncher {
        fn launch(&mut self, _path: &Path) -> io::Result<()> {
            Err(io::Error::other("editor exited with 1"))
        }
    }

    struct ScriptedPrompt {
        answers: Vec<bool>,
        reported: Vec<usize>,
    }

    impl ScriptedPrompt {
        fn new(answers: &[bool]) -> Self {
            Self {
                answers: answers.iter().rev().copied().collect(),
                reported: Vec::new(),
            }
        }
    }

    impl Prompt for ScriptedPrompt {
        fn report(&mut self, error: &ParseError) {
            self.reported.push(error.line);
        }

        fn confirm_retry(&mut self) -> io::Result<bool> {
            self.answers
                .pop()
                .ok_or_else(|| io::Error::other("asked too often"))
        }
    }

    fn document(src: &str) -> Result<Document, ParseError> {
        parse_document(src)
    }

    #[test]
    fn test_empty_file_is_unchanged() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("greeting = \"hello\"\n")?;
        let mut launcher = ScriptedLauncher::new(&["  \n"]);
        let mut prompt = ScriptedPrompt::new(&[]);
        let outcome = edit_loop(&doc, &mut launcher, &mut prompt)?;
        assert!(matches!(outcome, EditOutcome::Unchanged));
        assert_eq!(launcher.seen, vec!["greeting = \"hello\"\n"]);
        Ok(())
    }

    #[test]
    fn test_valid_edit_replaces() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("greeting = \"hello\"\n")?;
        let mut launcher = ScriptedLauncher::new(&["greeting = \"hi\"\nanswer = 42\n"]);
        let mut prompt = ScriptedPrompt::new(&[]);
        let EditOutcome::Replaced(new_doc) = edit_loop(&doc, &mut launcher, &mut prompt)? else {
            return Err("expected a replacement".into());
        };
        assert_eq!(new_doc.names().collect::<Vec<_>>(), vec!["greeting", "answer"]);
        Ok(())
    }

    #[test]
    fn test_parse_error_then_decline() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("greeting = \"hello\"\n")?;
        let mut launcher = ScriptedLauncher::new(&["ok = 1\nbroken {\n"]);
        let mut prompt = ScriptedPrompt::new(&[false]);
        let result = edit_loop(&doc, &mut launcher, &mut prompt);
        assert!(matches!(result, Err(ReplError::EditDeclined)));
        assert_eq!(prompt.reported.len(), 1);
        Ok(())
    }

    #[test]
    fn test_retry_sees_failed_content() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("greeting = \"hello\"\n")?;
        let mut launcher = ScriptedLauncher::new(&["}\n", "fixed = 1\n"]);
        let mut prompt = ScriptedPrompt::new(&[true]);
        let outcome = edit_loop(&doc, &mut launcher, &mut prompt)?;
        assert!(matches!(outcome, EditOutcome::Replaced(_)));
        assert_eq!(launcher.seen[1], "}\n");
        assert_eq!(prompt.reported, vec![1]);
        Ok(())
    }

    #[test]
    fn test_temp_file_removed() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("a = 1\n")?;
        let mut launcher = ScriptedLauncher::new(&["oops {\n"]);
        let mut prompt = ScriptedPrompt::new(&[false]);
        let _ = edit_loop(&doc, &mut launcher, &mut prompt);
        let path = launcher.paths.first().ok_or("never launched")?;
        assert!(!path.exists());
        Ok(())
    }

    #[test]
    fn test_launch_failure_is_io_error() -> Result<(), Box<dyn std::error::Error>> {
        let doc = document("a = 1\n")?;
        let mut prompt = ScriptedPrompt::new(&[]);
        let result = edit_loop(&doc, &mut FailingLauncher, &mut prompt);
        assert!(matches!(result, Err(ReplError::Io(_))));
        Ok(())
    }

    #[test]
    fn test_editor_command_parsing() {
        assert_eq!(EditorCommand::parse(None).program, "vi");
        assert_eq!(EditorCommand::parse(Some("   ")).program, "vi");

        let code = EditorCommand::parse(Some("code --wait"));
        assert_eq!(code.program, "code");
        assert_eq!(code.args, vec!["--wait"]);

        let quoted = EditorCommand::parse(Some("'/opt/my editor/bin/ed' -n"));
        assert_eq!(quoted.program, "/opt/my editor/bin/ed");
        assert_eq!(quoted.args, vec!["-n"]);
    }

    #[test]
    fn test_is_no() {
        assert!(is_no("n\n"));
        assert!(is_no(" No "));
        assert!(!is_no("\n"));
        assert!(!is_no("y"));
    }
}
