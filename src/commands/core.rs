//! Core command traits.
//!
//! - [`Command`] is what `main` runs.
//! - [`CommandWithOutput`] is implemented by the commands themselves; they return a result
//!   instead of printing it.
//!
//! [`CommandWithOutputExt::with_print_to_stdout`] bridges the two by rendering the result in
//! the requested [`Format`].

use anyhow::Result;
use async_trait::async_trait;

use crate::formatting::{Format, Formattable};

/// A unit of work that can be executed.
#[async_trait]
pub trait Command {
    async fn execute(&mut self) -> Result<()>;
}

/// A command that produces a result for the caller to render.
#[async_trait]
pub trait CommandWithOutput {
    type Output;

    async fn execute(&mut self) -> Result<Self::Output>;
}

pub trait CommandWithOutputExt {
    /// Wrap the command so its output is printed to stdout in `format` once it finishes.
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>>;
}

/// Runs the inner command and prints its formatted output.
pub struct PrintToStdoutCommand<C> {
    command: C,
    format: Format,
}

impl<C, O> PrintToStdoutCommand<C>
where
    C: CommandWithOutput<Output = O> + Send,
    O: Formattable,
{
    pub fn new(command: C, format: Format) -> Self {
        Self { command, format }
    }

    async fn render(&mut self) -> Result<String> {
        let output = self.command.execute().await?;
        output.format(self.format)
    }
}

#[async_trait]
impl<C, O> Command for PrintToStdoutCommand<C>
where
    C: CommandWithOutput<Output = O> + Send,
    O: Formattable + Send,
{
    async fn execute(&mut self) -> Result<()> {
        let rendered = self.render().await?;
        println!("{rendered}");
        Ok(())
    }
}

impl<C, O> CommandWithOutputExt for C
where
    C: CommandWithOutput<Output = O> + Send + 'static,
    O: Formattable + Send + 'static,
{
    fn with_print_to_stdout(self, format: Format) -> Result<Box<dyn Command>> {
        Ok(Box::new(PrintToStdoutCommand::new(self, format)))
    }
}
