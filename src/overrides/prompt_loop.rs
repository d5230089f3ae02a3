use std::{io::Write, rc::Rc};

use anyhow::Result;
use thiserror::Error;
use tracing::debug;

use crate::{
    interaction::{
        InputPrompt, InputPromptOptions, InputPromptResult, InputPromptValidator, InputValidator,
        InputValidatorResult,
    },
    overrides::{
        BaselineEntry, OverrideError, OverrideKind, OverrideOutcome, OverrideSession,
        ResolvedOverride, SecondaryMatch, parse_override, resolve_override,
    },
};

#[derive(Debug, Error)]
pub enum OverrideLoopError {
    #[error("prompt failed: {0:#}")]
    Prompt(anyhow::Error),
    #[error("writing to the terminal failed")]
    Output(#[from] std::io::Error),
    #[error("canceled by user")]
    Canceled,
    #[error(transparent)]
    Override(#[from] OverrideError),
}

/// An answer to the override question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopCommand {
    Accept,
    Help,
    Undo,
    Reset,
    Blank,
    Override(String),
}

pub fn interpret(answer: &str) -> LoopCommand {
    match answer.trim() {
        "y" => LoopCommand::Accept,
        "?" => LoopCommand::Help,
        "u" => LoopCommand::Undo,
        "r" => LoopCommand::Reset,
        "" => LoopCommand::Blank,
        _ => LoopCommand::Override(answer.to_string()),
    }
}

/// Accepts loop commands and override strings that resolve against the baseline.
struct OverrideCommandValidator<K: OverrideKind> {
    kind: K,
    baseline: Rc<[BaselineEntry]>,
}

impl<K: OverrideKind> InputValidator for OverrideCommandValidator<K> {
    fn validate(&self, input: &str) -> Result<InputValidatorResult> {
        let LoopCommand::Override(raw) = interpret(input) else {
            return Ok(InputValidatorResult::Valid);
        };

        let resolved = parse_override(&self.kind, &raw)
            .and_then(|ambiguous| resolve_override(&self.kind, &ambiguous, &self.baseline));

        Ok(match resolved {
            Ok(_) => InputValidatorResult::Valid,
            Err(e) => InputValidatorResult::Invalid(e.to_string()),
        })
    }
}

/// Accepts blank input (asked again) and valid values.
struct ValueValidator<K: OverrideKind> {
    kind: K,
}

impl<K: OverrideKind> InputValidator for ValueValidator<K> {
    fn validate(&self, input: &str) -> Result<InputValidatorResult> {
        let value = input.trim();
        if value.is_empty() || self.kind.validate_value(value).is_ok() {
            return Ok(InputValidatorResult::Valid);
        }

        Ok(InputValidatorResult::Invalid(format!(
            "\"{input}\" is not a valid {}",
            self.kind.value_noun()
        )))
    }
}

/// Ask `message` until a non-blank answer is given.
fn ask_until_answered<I: InputPrompt + ?Sized>(
    prompt: &I,
    message: &str,
    validator: &InputPromptValidator,
) -> Result<String, OverrideLoopError> {
    loop {
        let options = InputPromptOptions::builder()
            .message(message)
            .validator(validator.clone())
            .build();

        match prompt.input(options).map_err(OverrideLoopError::Prompt)? {
            InputPromptResult::Input(answer) if answer.trim().is_empty() => continue,
            InputPromptResult::Input(answer) => return Ok(answer),
            InputPromptResult::Canceled => return Err(OverrideLoopError::Canceled),
        }
    }
}

/// Let the user adjust the session's overrides until they accept them.
///
/// Each round prints the effective list, then asks for an override string or a command
/// (`y` accept, `?` help, `u` undo, `r` reset). Override strings are validated by the prompt
/// itself, so unparseable or unresolvable input is re-asked without leaving the question.
/// Entries without a value are asked for first, when the kind supports it.
///
/// Prompt failures and cancellation end the loop with an error; nothing is returned for a
/// partially edited session.
pub fn run_override_loop<K, I>(
    mut session: OverrideSession<K>,
    prompt: &I,
    out: &mut dyn Write,
) -> Result<OverrideOutcome, OverrideLoopError>
where
    K: OverrideKind,
    I: InputPrompt + ?Sized,
{
    let kind = session.kind();
    let command_validator = InputPromptValidator::new(OverrideCommandValidator {
        kind,
        baseline: Rc::from(session.baseline()),
    });
    let value_validator = InputPromptValidator::new(ValueValidator { kind });

    loop {
        write!(out, "{}", kind.table(session.effective()))?;

        let forced = session.first_unresolved().and_then(|entry| {
            kind.forced_resolution_question(entry)
                .map(|question| (entry.clone(), question))
        });
        if let Some((entry, question)) = forced {
            let value = ask_until_answered(prompt, &question, &value_validator)?;
            debug!(action_name = entry.action_name, value, "resolved missing value");

            session.push(ResolvedOverride {
                action_name: Some(entry.action_name),
                resource_id: None,
                secondary: if entry.secondary.is_empty() {
                    SecondaryMatch::Any
                } else {
                    SecondaryMatch::Exact(entry.secondary)
                },
                value: value.trim().to_string(),
            });
            continue;
        }

        let answer = ask_until_answered(prompt, kind.question(), &command_validator)?;
        match interpret(&answer) {
            LoopCommand::Accept => break,
            LoopCommand::Help => write!(out, "{}", kind.help_text())?,
            LoopCommand::Undo => {
                if !session.undo() {
                    writeln!(out, "nothing to undo")?;
                }
            }
            LoopCommand::Reset => session.reset(),
            LoopCommand::Blank => {}
            // the prompt only hands out answers the command validator accepted
            LoopCommand::Override(raw) => {
                let resolved = session.resolve(&raw)?;
                session.push(resolved);
            }
        }
    }

    debug!(count = session.applied().len(), "accepted {} overrides", kind.noun());
    Ok(session.finish())
}
