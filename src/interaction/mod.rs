use std::rc::Rc;

use anyhow::Result;
use typed_builder::TypedBuilder;

mod input;
mod spinner;

#[derive(Debug, Default, Clone)]
pub struct Interaction;

impl Interaction {
    pub fn new() -> Self {
        Default::default()
    }
}

#[derive(TypedBuilder)]
pub struct InputPromptOptions {
    #[builder(setter(into))]
    pub message: String,
    #[builder(default, setter(strip_option(fallback = default_opt)))]
    pub default: Option<String>,
    #[builder(default, setter(strip_option))]
    pub help_message: Option<String>,
    #[builder(default, setter(strip_option))]
    pub validator: Option<InputPromptValidator>,
    /// Answer already given on the command line; returned without prompting.
    #[builder(default)]
    pub final_answer: Option<String>,
}

#[derive(Clone)]
pub struct InputPromptValidator(Rc<dyn InputValidator>);

impl InputPromptValidator {
    pub fn new(validator: impl InputValidator + 'static) -> Self {
        Self(Rc::new(validator))
    }

    pub fn validate(&self, input: &str) -> Result<InputValidatorResult> {
        self.0.validate(input)
    }
}

pub trait InputValidator {
    fn validate(&self, input: &str) -> Result<InputValidatorResult>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputValidatorResult {
    Valid,
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPromptResult {
    Input(String),
    Canceled,
}

pub trait InputPrompt {
    fn input(&self, options: InputPromptOptions) -> Result<InputPromptResult>;
}

#[derive(Debug, PartialEq, Eq, TypedBuilder)]
pub struct SelectPromptOptions {
    #[builder(setter(transform = |s: impl Into<String>| s.into()))]
    pub message: String,
    #[builder(setter(transform = |items: impl IntoIterator<Item = impl Into<String>>| {
        items.into_iter().map(|s| s.into()).collect()
    }))]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectPromptResult {
    Selected(String),
    Canceled,
}

pub trait SelectPrompt {
    fn select(&self, options: SelectPromptOptions) -> Result<SelectPromptResult>;
}

pub struct SpinnerHandle {
    stop_spinner: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SpinnerHandle {
    pub fn new(stop_spinner: Box<dyn FnOnce() + Send + Sync>) -> Self {
        Self {
            stop_spinner: Some(stop_spinner),
        }
    }
}

impl Drop for SpinnerHandle {
    fn drop(&mut self) {
        if let Some(stop_spinner) = self.stop_spinner.take() {
            stop_spinner();
        }
    }
}

pub trait SpinnerInteraction {
    fn start_spinner(&self, message: String) -> Result<SpinnerHandle>;
}
