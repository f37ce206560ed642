use crate::app::PageEvent;
use crate::features::Feature;
use crate::scheduler::Scheduler;
use crate::surface::{ElementId, Surface};
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SUBMIT_DELAY_MS: f64 = 2000.0;
pub const TOAST_VISIBLE_MS: f64 = 5000.0;
pub const TOAST_EXIT_MS: f64 = 300.0;

const SUCCESS_MESSAGE: &str = "Thank you for your message! I'll get back to you soon.";
const FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Sends a validated form once the submission delay has passed.
pub type Delivery = Box<dyn FnMut(&ContactForm) -> anyhow::Result<()>>;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    Email,
    Subject,
    Message,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Subject, Field::Message];
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    #[error("Name must be at least 2 characters long")]
    NameTooShort,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Subject must be at least 5 characters long")]
    SubjectTooShort,
    #[error("Message must be at least 10 characters long")]
    MessageTooShort,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactForm {
    pub fn new(name: &str, email: &str, subject: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            email: email.to_string(),
            subject: subject.to_string(),
            message: message.to_string(),
        }
    }

    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Subject => &self.subject,
            Field::Message => &self.message,
        }
    }
}

/// Field-level validation failures, at most one per field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<Field, FieldError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, field: Field) -> Option<FieldError> {
        self.0.get(&field).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, FieldError)> + '_ {
        self.0.iter().map(|(f, e)| (*f, *e))
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL.is_match(value)
}

fn trimmed_len(value: &str) -> usize {
    value.trim().chars().count()
}

pub fn validate(form: &ContactForm) -> FormErrors {
    let mut errors = BTreeMap::new();
    if trimmed_len(&form.name) < 2 {
        errors.insert(Field::Name, FieldError::NameTooShort);
    }
    if !is_valid_email(&form.email) {
        errors.insert(Field::Email, FieldError::InvalidEmail);
    }
    if trimmed_len(&form.subject) < 5 {
        errors.insert(Field::Subject, FieldError::SubjectTooShort);
    }
    if trimmed_len(&form.message) < 10 {
        errors.insert(Field::Message, FieldError::MessageTooShort);
    }
    FormErrors(errors)
}

/// Looser check used for feedback while typing.
pub fn validate_input(field: Field, value: &str) -> bool {
    let value = value.trim();
    match field {
        Field::Email => is_valid_email(value),
        Field::Name | Field::Subject => value.chars().count() >= 2,
        Field::Message => !value.is_empty(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    fn class(self) -> &'static str {
        match self {
            ToastKind::Success => "message--success",
            ToastKind::Error => "message--error",
        }
    }

    fn background(self) -> &'static str {
        match self {
            ToastKind::Success => "#10b981",
            ToastKind::Error => "#ef4444",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FormTask {
    Delivered,
    ToastIn(ElementId),
    ToastOut(ElementId),
    ToastRemove(ElementId),
}

pub struct ContactFormController {
    inputs: BTreeMap<Field, ElementId>,
    error_labels: BTreeMap<Field, ElementId>,
    submit_button: Option<ElementId>,
    submitting: bool,
    outgoing: Option<ContactForm>,
    delivery: Delivery,
    tasks: Scheduler<FormTask>,
}

impl Default for ContactFormController {
    fn default() -> Self {
        Self::new()
    }
}

impl ContactFormController {
    pub fn new() -> Self {
        Self {
            inputs: BTreeMap::new(),
            error_labels: BTreeMap::new(),
            submit_button: None,
            submitting: false,
            outgoing: None,
            delivery: Box::new(|form: &ContactForm| -> anyhow::Result<()> {
                debug!("no transport configured, dropping message from {}", form.email);
                Ok(())
            }),
            tasks: Scheduler::new(),
        }
    }

    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn bind_input(&mut self, field: Field, element: ElementId, surface: &mut dyn Surface) {
        surface.set_attribute(element, "placeholder", " ");
        self.inputs.insert(field, element);
    }

    pub fn bind_error(&mut self, field: Field, element: ElementId) {
        self.error_labels.insert(field, element);
    }

    pub fn bind_submit(&mut self, element: ElementId) {
        self.submit_button = Some(element);
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Validates and, when clean, starts the delayed submission. Returns
    /// the validation result either way.
    pub fn submit(&mut self, form: &ContactForm, now: f64, surface: &mut dyn Surface) -> FormErrors {
        let errors = validate(form);
        self.display_errors(&errors, surface);
        if !errors.is_empty() {
            info!("Contact form rejected with {} field errors", errors.len());
            return errors;
        }
        if self.submitting {
            debug!("submission already in flight");
            return errors;
        }

        self.submitting = true;
        self.outgoing = Some(form.clone());
        if let Some(button) = self.submit_button {
            surface.add_class(button, "loading");
            surface.set_attribute(button, "disabled", "true");
        }
        self.tasks.schedule_after(now, SUBMIT_DELAY_MS, FormTask::Delivered);
        info!("Contact form submitted by {}", form.email);
        errors
    }

    fn display_errors(&self, errors: &FormErrors, surface: &mut dyn Surface) {
        for label in self.error_labels.values() {
            surface.set_text(*label, "");
            surface.remove_class(*label, "show");
        }
        for (field, error) in errors.iter() {
            if let Some(label) = self.error_labels.get(&field) {
                surface.set_text(*label, &error.to_string());
                surface.add_class(*label, "show");
            }
        }
    }

    fn input_changed(&self, element: ElementId, value: &str, surface: &mut dyn Surface) -> bool {
        let Some(field) = self
            .inputs
            .iter()
            .find(|(_, el)| **el == element)
            .map(|(f, _)| *f)
        else {
            return false;
        };
        let (add, remove) = if validate_input(field, value) {
            ("valid", "error")
        } else {
            ("error", "valid")
        };
        surface.remove_class(element, remove);
        surface.add_class(element, add);
        true
    }

    pub fn show_toast(&mut self, message: &str, kind: ToastKind, now: f64, surface: &mut dyn Surface) -> ElementId {
        let toast = surface.create_node(surface.root(), "div");
        surface.add_class(toast, "message");
        surface.add_class(toast, kind.class());
        surface.set_text(toast, message);
        surface.set_style(toast, "position", "fixed");
        surface.set_style(toast, "top", "20px");
        surface.set_style(toast, "right", "20px");
        surface.set_style(toast, "padding", "1rem 2rem");
        surface.set_style(toast, "border-radius", "0.5rem");
        surface.set_style(toast, "color", "white");
        surface.set_style(toast, "background", kind.background());
        surface.set_style(toast, "z-index", "9999");
        surface.set_style(toast, "transform", "translateX(100%)");
        surface.set_style(toast, "transition", "transform 0.3s ease");

        self.tasks.schedule(now, FormTask::ToastIn(toast));
        self.tasks
            .schedule_after(now, TOAST_VISIBLE_MS, FormTask::ToastOut(toast));
        toast
    }

    fn run(&mut self, task: FormTask, now: f64, surface: &mut dyn Surface) {
        match task {
            FormTask::Delivered => {
                let sent = match self.outgoing.take() {
                    Some(form) => (self.delivery)(&form),
                    None => Ok(()),
                };
                match sent {
                    Ok(()) => {
                        self.show_toast(SUCCESS_MESSAGE, ToastKind::Success, now, surface);
                        for input in self.inputs.values() {
                            surface.set_attribute(*input, "value", "");
                            surface.remove_class(*input, "valid");
                            surface.remove_class(*input, "error");
                        }
                        info!("Contact form delivered");
                    }
                    Err(e) => {
                        warn!("Contact form delivery failed: {:#}", e);
                        self.show_toast(FAILURE_MESSAGE, ToastKind::Error, now, surface);
                    }
                }
                if let Some(button) = self.submit_button {
                    surface.remove_class(button, "loading");
                    surface.remove_attribute(button, "disabled");
                }
                self.submitting = false;
            }
            FormTask::ToastIn(toast) => surface.set_style(toast, "transform", "translateX(0)"),
            FormTask::ToastOut(toast) => {
                surface.set_style(toast, "transform", "translateX(100%)");
                self.tasks
                    .schedule_after(now, TOAST_EXIT_MS, FormTask::ToastRemove(toast));
            }
            FormTask::ToastRemove(toast) => surface.remove_node(toast),
        }
    }
}

impl Feature for ContactFormController {
    fn name(&self) -> &'static str {
        "form"
    }

    fn update(&mut self, now: f64, surface: &mut dyn Surface) {
        for task in self.tasks.drain_due(now) {
            self.run(task, now, surface);
        }
    }

    fn handle_event(&mut self, event: &PageEvent, now: f64, surface: &mut dyn Surface) -> bool {
        match event {
            PageEvent::Submit(form) => {
                self.submit(form, now, surface);
                true
            }
            PageEvent::FieldInput { element, value } => self.input_changed(*element, value, surface),
            _ => false,
        }
    }

    fn is_animating(&self) -> bool {
        !self.tasks.is_empty()
    }

    fn teardown(&mut self, _surface: &mut dyn Surface) {
        self.tasks.clear();
        self.outgoing = None;
        self.submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::math::{Rect, Vec2};
    use crate::surface::headless::HeadlessSurface;
    use rstest::rstest;

    #[test]
    fn every_field_can_fail() {
        let errors = validate(&ContactForm::new("A", "bad", "hi", "short"));
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get(Field::Email), Some(FieldError::InvalidEmail));
        assert_eq!(
            errors.get(Field::Message).map(|e| e.to_string()).as_deref(),
            Some("Message must be at least 10 characters long")
        );
    }

    #[test]
    fn valid_form_has_no_errors() {
        let form = ContactForm::new("Jo", "a@b.co", "Hello there", "This is a long enough message.");
        assert!(validate(&form).is_empty());
    }

    #[test]
    fn whitespace_does_not_count_towards_length() {
        let form = ContactForm::new("  J  ", "a@b.co", "Hello", "         x          ");
        let errors = validate(&form);
        assert_eq!(errors.get(Field::Name), Some(FieldError::NameTooShort));
        assert_eq!(errors.get(Field::Subject), None);
        assert_eq!(errors.get(Field::Message), Some(FieldError::MessageTooShort));
    }

    #[rstest]
    #[case("a@b.co", true)]
    #[case("first.last@example.org", true)]
    #[case("no-at.example.org", false)]
    #[case("two@@example.org", false)]
    #[case("spa ce@example.org", false)]
    #[case("user@nodot", false)]
    fn email_pattern(#[case] email: &str, #[case] valid: bool) {
        assert_eq!(is_valid_email(email), valid);
    }

    #[rstest]
    #[case(Field::Name, "Al", true)]
    #[case(Field::Subject, " a ", false)]
    #[case(Field::Message, "x", true)]
    #[case(Field::Message, "   ", false)]
    #[case(Field::Email, " a@b.co ", true)]
    fn live_input_checks(#[case] field: Field, #[case] value: &str, #[case] valid: bool) {
        assert_eq!(validate_input(field, value), valid);
    }

    fn wired() -> (HeadlessSurface, ContactFormController, ElementId) {
        let mut surface = HeadlessSurface::new(Vec2::new(1200.0, 800.0), 3000.0);
        let mut form = ContactFormController::new();
        for field in Field::ALL {
            let input = surface.insert(&format!("{:?}-input", field), None, Rect::default(), None);
            let label = surface.insert(&format!("{:?}-error", field), None, Rect::default(), None);
            form.bind_input(field, input, &mut surface);
            form.bind_error(field, label);
        }
        let button = surface.insert("submit", None, Rect::default(), None);
        form.bind_submit(button);
        (surface, form, button)
    }

    #[test]
    fn invalid_submit_shows_errors_without_loading() {
        let (mut surface, mut form, button) = wired();
        let errors = form.submit(&ContactForm::new("A", "bad", "hi", "short"), 0.0, &mut surface);
        assert_eq!(errors.len(), 4);
        let label = surface.find("Name-error").unwrap();
        assert!(surface.has_class(label, "show"));
        assert_eq!(surface.text(label).as_deref(), Some("Name must be at least 2 characters long"));
        assert!(!surface.has_class(button, "loading"));
        assert!(!form.is_animating());

        form.submit(&ContactForm::new("Al", "bad", "hello", "long enough text"), 0.0, &mut surface);
        assert!(!surface.has_class(label, "show"));
        assert_eq!(surface.text(label).as_deref(), Some(""));
    }

    #[test]
    fn valid_submit_runs_the_delayed_flow() {
        let (mut surface, mut form, button) = wired();
        let data = ContactForm::new("Jo", "a@b.co", "Hello there", "This is a long enough message.");
        assert!(form.handle_event(&PageEvent::Submit(data), 0.0, &mut surface));
        assert!(form.is_submitting());
        assert!(surface.has_class(button, "loading"));
        assert_eq!(surface.attribute(button, "disabled"), Some("true"));

        form.update(1999.0, &mut surface);
        assert!(form.is_submitting());

        let before = surface.children(HeadlessSurface::ROOT).len();
        form.update(2000.0, &mut surface);
        assert!(!form.is_submitting());
        assert!(!surface.has_class(button, "loading"));
        assert_eq!(surface.attribute(button, "disabled"), None);
        let toast = *surface.children(HeadlessSurface::ROOT).last().unwrap();
        assert_eq!(surface.children(HeadlessSurface::ROOT).len(), before + 1);
        assert!(surface.has_class(toast, "message--success"));

        form.update(2016.0, &mut surface);
        assert_eq!(surface.style(toast, "transform"), Some("translateX(0)"));
        form.update(7000.0, &mut surface);
        assert_eq!(surface.style(toast, "transform"), Some("translateX(100%)"));
        assert!(surface.exists(toast));
        form.update(7300.0, &mut surface);
        assert!(!surface.exists(toast));
        assert!(!form.is_animating());
    }

    #[test]
    fn failed_delivery_keeps_the_input_and_reports_an_error() {
        let (mut surface, form, button) = wired();
        let mut form = form.with_delivery(Box::new(|_: &ContactForm| -> anyhow::Result<()> {
            anyhow::bail!("smtp unreachable")
        }));
        let name = surface.find("Name-input").unwrap();
        surface.set_attribute(name, "value", "Jo");

        let data = ContactForm::new("Jo", "a@b.co", "Hello there", "This is a long enough message.");
        assert!(form.submit(&data, 0.0, &mut surface).is_empty());
        form.update(SUBMIT_DELAY_MS, &mut surface);

        let toast = *surface.children(HeadlessSurface::ROOT).last().unwrap();
        assert!(surface.has_class(toast, "message--error"));
        assert_eq!(surface.text(toast).as_deref(), Some(FAILURE_MESSAGE));
        assert_eq!(surface.attribute(name, "value"), Some("Jo"));
        assert!(!surface.has_class(button, "loading"));
        assert!(!form.is_submitting());
    }

    #[test]
    fn typing_marks_inputs_valid_or_invalid() {
        let (mut surface, mut form, _) = wired();
        let email = surface.find("Email-input").unwrap();
        let typing = |value: &str| PageEvent::FieldInput {
            element: email,
            value: value.to_string(),
        };
        form.handle_event(&typing("a@"), 0.0, &mut surface);
        assert!(surface.has_class(email, "error"));
        form.handle_event(&typing("a@b.co"), 0.0, &mut surface);
        assert!(surface.has_class(email, "valid"));
        assert!(!surface.has_class(email, "error"));
    }
}
