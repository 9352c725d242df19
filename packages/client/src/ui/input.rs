//! Line input, slash commands and confirmation prompts.
//!
//! `rustyline` is synchronous, so the editor lives on its own thread and
//! forwards [`UserCommand`]s to the session over a channel.

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    domain::{AttendeeId, CommandError, Confirm, NewPollDraft},
    usecase::{ClientSettings, UserCommand, commands},
};

use super::{formatter::ViewFormatter, renderer::PROMPT};

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Handled by the session directly
    Session(UserCommand),
    Open,
    Finish,
    AbortPoll,
    NewPoll,
    Kick(AttendeeId),
    Help,
}

/// Parse one line of input. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<InputAction>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(Some(InputAction::Session(UserCommand::Chat(
            line.to_string(),
        ))));
    };

    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let argument = parts.next();

    let action = match name {
        "vote" => {
            let number = argument
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n >= 1)
                .ok_or(CommandError::Usage("/vote <option number>"))?;
            InputAction::Session(UserCommand::Vote(number - 1))
        }
        "kick" => {
            let id = argument
                .and_then(|id| id.parse::<i64>().ok())
                .ok_or(CommandError::Usage("/kick <attendee id>"))?;
            InputAction::Kick(AttendeeId::new(id))
        }
        "users" => InputAction::Session(UserCommand::ShowAttendees),
        "disconnect" => InputAction::Session(UserCommand::Disconnect),
        "quit" | "exit" => InputAction::Session(UserCommand::Quit),
        "open" => InputAction::Open,
        "finish" => InputAction::Finish,
        "abortpoll" => InputAction::AbortPoll,
        "newpoll" => InputAction::NewPoll,
        "help" => InputAction::Help,
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };
    Ok(Some(action))
}

/// Yes/no questions asked on the input editor.
pub struct TerminalConfirm<'a> {
    editor: &'a mut DefaultEditor,
}

impl<'a> TerminalConfirm<'a> {
    pub fn new(editor: &'a mut DefaultEditor) -> Self {
        Self { editor }
    }
}

impl Confirm for TerminalConfirm<'_> {
    fn confirm(&mut self, prompt: &str) -> bool {
        match self.editor.readline(&format!("{} [y/N] ", prompt)) {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                tracing::debug!("Confirmation aborted: {}", e);
                false
            }
        }
    }

    fn warn(&mut self, message: &str) {
        println!("[warning] {}", message);
    }
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Fill the poll draft interactively, starting from what it already holds.
fn edit_draft(editor: &mut DefaultEditor, draft: &mut NewPollDraft) -> Result<(), ReadlineError> {
    draft.question = editor.readline_with_initial("Question: ", (&draft.question, ""))?;
    for (index, answer) in draft.answers.iter_mut().enumerate() {
        let prompt = format!("Answer {} (blank to skip): ", index + 1);
        *answer = editor.readline_with_initial(&prompt, (answer.as_str(), ""))?;
    }
    draft.minutes = editor.readline_with_initial("Minutes: ", (&draft.minutes, ""))?;
    Ok(())
}

/// Input thread state.
struct InputLoop {
    editor: DefaultEditor,
    settings: ClientSettings,
    draft: NewPollDraft,
    commands: mpsc::UnboundedSender<UserCommand>,
    online: watch::Receiver<bool>,
}

impl InputLoop {
    fn run(mut self) {
        loop {
            let line = match self.editor.readline(PROMPT) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            };
            if !line.trim().is_empty() {
                self.editor.add_history_entry(line.trim()).ok();
            }

            let command = match parse_line(&line) {
                Ok(Some(action)) => self.resolve(action),
                Ok(None) => continue,
                Err(e) => {
                    println!("[error] {}", e);
                    continue;
                }
            };
            let Some(command) = command else {
                continue;
            };
            let quit = command == UserCommand::Quit;
            if self.commands.send(command).is_err() || quit {
                break;
            }
        }
        let _ = self.commands.send(UserCommand::Quit);
    }

    /// Turn an action into a session command, asking for confirmation where
    /// needed. `None` when nothing should be sent.
    fn resolve(&mut self, action: InputAction) -> Option<UserCommand> {
        let settings = self.settings;
        let result = match action {
            InputAction::Session(command) => return Some(command),
            InputAction::Help => {
                print!("{}", ViewFormatter::format_help(settings.is_admin));
                return None;
            }
            InputAction::Open => {
                commands::open_meeting(&settings, &mut TerminalConfirm::new(&mut self.editor))
            }
            InputAction::Finish => {
                commands::finish_meeting(&settings, &mut TerminalConfirm::new(&mut self.editor))
            }
            InputAction::AbortPoll => {
                commands::abort_poll(&settings, &mut TerminalConfirm::new(&mut self.editor))
            }
            InputAction::Kick(target) => {
                commands::kick(&settings, &mut TerminalConfirm::new(&mut self.editor), target)
            }
            InputAction::NewPoll => {
                if !settings.is_admin {
                    Err(CommandError::NotAdministrator)
                } else if let Err(e) = edit_draft(&mut self.editor, &mut self.draft) {
                    tracing::debug!("Poll entry aborted: {}", e);
                    return None;
                } else {
                    let online = *self.online.borrow();
                    commands::new_poll(
                        &settings,
                        &mut TerminalConfirm::new(&mut self.editor),
                        &mut self.draft,
                        online,
                    )
                }
            }
        };

        match result {
            Ok(command) => command.map(UserCommand::Send),
            Err(e) => {
                println!("[error] {}", e);
                None
            }
        }
    }
}

/// Start the input thread.
///
/// Resolves once the editor is ready, or with the reason it could not be
/// created.
pub fn spawn_input_thread(
    settings: ClientSettings,
    commands: mpsc::UnboundedSender<UserCommand>,
    online: watch::Receiver<bool>,
) -> oneshot::Receiver<Result<(), String>> {
    let (ready_tx, ready_rx) = oneshot::channel();

    std::thread::spawn(move || {
        let editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                let _ = ready_tx.send(Err(e.to_string()));
                return;
            }
        };
        let _ = ready_tx.send(Ok(()));

        InputLoop {
            editor,
            settings,
            draft: NewPollDraft::default(),
            commands,
            online,
        }
        .run();
    });

    ready_rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_chat() {
        // テスト項目: スラッシュで始まらない入力はチャットになる
        // given (前提条件):
        let line = "  good morning ";

        // when (操作):
        let result = parse_line(line);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Some(InputAction::Session(UserCommand::Chat(
                "good morning".to_string()
            ))))
        );
    }

    #[test]
    fn test_blank_line_is_ignored() {
        // テスト項目: 空行は何もしない
        // given (前提条件):
        let line = "   ";

        // when (操作):
        let result = parse_line(line);

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_vote_is_one_based() {
        // テスト項目: /vote の番号は 1 始まりで、内部では 0 始まりになる
        // given (前提条件):
        let line = "/vote 2";

        // when (操作):
        let result = parse_line(line);

        // then (期待する結果):
        assert_eq!(
            result,
            Ok(Some(InputAction::Session(UserCommand::Vote(1))))
        );
    }

    #[test]
    fn test_vote_without_number_shows_usage() {
        // テスト項目: 番号のない /vote は使い方のエラーになる
        // given (前提条件):
        let lines = ["/vote", "/vote 0", "/vote x"];

        // when (操作):
        let results: Vec<_> = lines.iter().map(|line| parse_line(line)).collect();

        // then (期待する結果):
        for result in results {
            assert_eq!(result, Err(CommandError::Usage("/vote <option number>")));
        }
    }

    #[test]
    fn test_kick_takes_attendee_id() {
        // テスト項目: /kick は参加者 ID を受け取る
        // given (前提条件):
        let line = "/kick 42";

        // when (操作):
        let result = parse_line(line);

        // then (期待する結果):
        assert_eq!(result, Ok(Some(InputAction::Kick(AttendeeId::new(42)))));
    }

    #[test]
    fn test_admin_commands_are_recognized() {
        // テスト項目: 管理コマンドが解釈される
        // given (前提条件):
        let cases = [
            ("/open", InputAction::Open),
            ("/finish", InputAction::Finish),
            ("/abortpoll", InputAction::AbortPoll),
            ("/newpoll", InputAction::NewPoll),
            ("/users", InputAction::Session(UserCommand::ShowAttendees)),
            ("/disconnect", InputAction::Session(UserCommand::Disconnect)),
        ];

        for (line, expected) in cases {
            // when (操作):
            let result = parse_line(line);

            // then (期待する結果):
            assert_eq!(result, Ok(Some(expected)));
        }
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        // テスト項目: 未知のコマンドはエラーになる
        // given (前提条件):
        let line = "/dance";

        // when (操作):
        let result = parse_line(line);

        // then (期待する結果):
        assert_eq!(result, Err(CommandError::UnknownCommand("dance".to_string())));
    }

    #[test]
    fn test_yes_answers() {
        // テスト項目: y と yes のみが承認として扱われる
        // given (前提条件):
        let answers = ["y", "YES", " yes "];

        // when (操作):
        let accepted = answers.iter().all(|a| is_yes(a));

        // then (期待する結果):
        assert!(accepted);
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}
