use anyhow::{Result, anyhow};
use console::style;
use inquire::{
    InquireError, Select, Text,
    error::CustomUserError,
    validator::{ErrorMessage, StringValidator, Validation},
};

use super::{
    InputPrompt, InputPromptOptions, InputPromptResult, InputPromptValidator,
    InputValidatorResult, Interaction, SelectPrompt, SelectPromptOptions, SelectPromptResult,
};

// Lets inquire run our validators on every submitted answer
impl StringValidator for InputPromptValidator {
    fn validate(&self, input: &str) -> Result<Validation, CustomUserError> {
        match self.0.validate(input)? {
            InputValidatorResult::Valid => Ok(Validation::Valid),
            InputValidatorResult::Invalid(message) => {
                Ok(Validation::Invalid(ErrorMessage::Custom(message)))
            }
        }
    }
}

/// Esc and Ctrl+C cancel the prompt, anything else is a failure of the terminal.
fn canceled_or_error<T>(error: InquireError, canceled: T, what: &str) -> Result<T> {
    match error {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => Ok(canceled),
        error => Err(anyhow!("error prompting for {what}: {error}")),
    }
}

impl InputPrompt for Interaction {
    fn input(&self, options: InputPromptOptions) -> Result<InputPromptResult> {
        // Answers given on the command line are echoed like a completed prompt
        if let Some(final_answer) = options.final_answer {
            eprintln!(
                "{} {} {}",
                style(">").green(),
                options.message,
                style(&final_answer).cyan()
            );
            return Ok(InputPromptResult::Input(final_answer));
        }

        let mut prompt = Text::new(&options.message);
        if let Some(default) = options.default.as_deref() {
            prompt = prompt.with_default(default);
        }
        if let Some(help_message) = options.help_message.as_deref() {
            prompt = prompt.with_help_message(help_message);
        }
        if let Some(validator) = options.validator {
            prompt = prompt.with_validator(validator);
        }

        prompt
            .prompt()
            .map(InputPromptResult::Input)
            .or_else(|error| canceled_or_error(error, InputPromptResult::Canceled, "input"))
    }
}

impl SelectPrompt for Interaction {
    fn select(&self, options: SelectPromptOptions) -> Result<SelectPromptResult> {
        Select::new(&options.message, options.options)
            .prompt()
            .map(SelectPromptResult::Selected)
            .or_else(|error| canceled_or_error(error, SelectPromptResult::Canceled, "selection"))
    }
}
