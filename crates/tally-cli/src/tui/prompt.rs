//! Inline input prompts.

use crate::choice_arg;
use tally_core::session::{ChoiceDraft, MIN_CHOICES};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
}

impl TextInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn insert(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.value)
    }
}

/// Result of submitting the current line of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormStep {
    Continue,
    Invalid(String),
    Done {
        name: String,
        choices: Vec<ChoiceDraft>,
    },
}

/// Asks for a name, then one choice per line until an empty line.
#[derive(Debug, Clone, Default)]
pub struct NewSessionForm {
    pub name: Option<String>,
    pub choices: Vec<ChoiceDraft>,
    pub input: TextInput,
    pub error: Option<String>,
}

impl NewSessionForm {
    pub fn label(&self) -> String {
        match &self.name {
            None => "New session: name".to_string(),
            Some(name) => format!(
                "{name}: choice {} as [EMOJI:]TITLE[::NOTES] (empty line to finish)",
                self.choices.len() + 1
            ),
        }
    }

    pub fn submit(&mut self) -> FormStep {
        let line = self.input.take();
        let line = line.trim();
        let step = match &self.name {
            None if line.is_empty() => FormStep::Invalid("Name must not be empty".to_string()),
            None => {
                self.name = Some(line.to_string());
                FormStep::Continue
            }
            Some(_) if line.is_empty() && self.choices.len() < MIN_CHOICES => {
                FormStep::Invalid(format!("Add at least {MIN_CHOICES} choices"))
            }
            Some(name) if line.is_empty() => FormStep::Done {
                name: name.clone(),
                choices: std::mem::take(&mut self.choices),
            },
            Some(_) => match choice_arg::parse(line) {
                Ok(draft) => {
                    self.choices.push(draft);
                    FormStep::Continue
                }
                Err(e) => FormStep::Invalid(e),
            },
        };

        self.error = match &step {
            FormStep::Invalid(message) => Some(message.clone()),
            _ => None,
        };
        step
    }
}

/// Adds one choice to the open session.
#[derive(Debug, Clone, Default)]
pub struct ChoiceForm {
    pub input: TextInput,
    pub error: Option<String>,
}

impl ChoiceForm {
    pub fn submit(&mut self) -> Result<ChoiceDraft, String> {
        let line = self.input.take();
        choice_arg::parse(&line).inspect_err(|e| self.error = Some(e.clone()))
    }
}

#[derive(Debug, Clone)]
pub enum Prompt {
    NewSession(NewSessionForm),
    AddChoice(ChoiceForm),
    ConfirmDelete { session_id: String, name: String },
}

impl Prompt {
    pub fn title(&self) -> String {
        match self {
            Prompt::NewSession(form) => form.label(),
            Prompt::AddChoice(_) => "Add choice as [EMOJI:]TITLE[::NOTES]".to_string(),
            Prompt::ConfirmDelete { name, .. } => format!("Delete '{name}'? (y/N)"),
        }
    }

    pub fn input(&self) -> Option<&TextInput> {
        match self {
            Prompt::NewSession(form) => Some(&form.input),
            Prompt::AddChoice(form) => Some(&form.input),
            Prompt::ConfirmDelete { .. } => None,
        }
    }

    pub fn input_mut(&mut self) -> Option<&mut TextInput> {
        match self {
            Prompt::NewSession(form) => Some(&mut form.input),
            Prompt::AddChoice(form) => Some(&mut form.input),
            Prompt::ConfirmDelete { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Prompt::NewSession(form) => form.error.as_deref(),
            Prompt::AddChoice(form) => form.error.as_deref(),
            Prompt::ConfirmDelete { .. } => None,
        }
    }
}
