use {
    super::{FieldId, Registry, ValidationError},
    crate::infra::observe,
    regex::Regex,
    std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

/// Message used when neither the input nor the registry can say what is wrong.
pub const INVALID_VALUE: &str = "Invalid value.";

/// Predicate deciding on its own whether a (trimmed) value is valid.
pub type CustomValidation = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// The native control a [`Field`] wraps. It owns the raw value and knows the
/// format constraints the control itself enforces (required, pattern, ...).
pub trait Input: Send {
    fn value(&self) -> &str;
    fn set_value(&mut self, value: String);
    /// Native format validity of the current value.
    fn check_validity(&self) -> bool;
    /// Why the current value is natively invalid.
    fn validation_message(&self) -> Option<String>;
    fn focus(&mut self);
}

/// Text input with the `required` and `pattern` constraints.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    required: bool,
    pattern: Option<Regex>,
    focused: bool,
}

impl TextInput {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Like the HTML attribute, the pattern has to match the whole value.
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self, regex::Error> {
        self.pattern = Some(Regex::new(&format!("^(?:{pattern})$"))?);
        Ok(self)
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }
}

impl Input for TextInput {
    fn value(&self) -> &str {
        &self.value
    }

    fn set_value(&mut self, value: String) {
        self.value = value;
    }

    fn check_validity(&self) -> bool {
        self.validation_message().is_none()
    }

    fn validation_message(&self) -> Option<String> {
        if self.value.is_empty() {
            // An empty optional value is never checked against the pattern.
            return self
                .required
                .then(|| "Please fill out this field.".to_owned());
        }
        match &self.pattern {
            Some(pattern) if !pattern.is_match(&self.value) => {
                Some("Please match the requested format.".to_owned())
            }
            _ => None,
        }
    }

    fn focus(&mut self) {
        self.focused = true;
    }
}

/// How a [`Field`] behaves over its lifetime.
#[derive(Clone)]
pub struct Config {
    /// Id of the input. Defaults to `textinput-{instance}`.
    pub id: Option<String>,
    /// Registry key of the field's error. Defaults to the input id.
    pub error_id: Option<FieldId>,
    /// Element describing the input while no error is shown.
    pub aria_described_by: Option<String>,
    /// Run a validation pass with hidden errors on mount.
    pub validate_on_mount: bool,
    pub focus_on_mount: bool,
    pub show_error: bool,
    pub custom_validation: Option<CustomValidation>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: None,
            error_id: None,
            aria_described_by: None,
            validate_on_mount: true,
            focus_on_mount: false,
            show_error: true,
            custom_validation: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("id", &self.id)
            .field("error_id", &self.error_id)
            .field("aria_described_by", &self.aria_described_by)
            .field("validate_on_mount", &self.validate_on_mount)
            .field("focus_on_mount", &self.focus_on_mount)
            .field("show_error", &self.show_error)
            .field("custom_validation", &self.custom_validation.is_some())
            .finish()
    }
}

fn next_instance_id() -> usize {
    static INSTANCE: AtomicUsize = AtomicUsize::new(0);
    INSTANCE.fetch_add(1, Ordering::Relaxed)
}

/// A mounted input whose validity is tracked in the [`Registry`]. The field
/// is unmounted when dropped, which removes its error from the registry.
pub struct Field<I: Input> {
    input: I,
    id: String,
    error_id: FieldId,
    config: Config,
    registry: Registry,
    on_change: Box<dyn FnMut(&str) + Send>,
}

impl<I: Input> Field<I> {
    /// Mounts `input`. Changed values are forwarded to `on_change`.
    pub fn mount(
        input: I,
        registry: Registry,
        config: Config,
        on_change: impl FnMut(&str) + Send + 'static,
    ) -> Self {
        let id = config
            .id
            .clone()
            .unwrap_or_else(|| format!("textinput-{}", next_instance_id()));
        let error_id = config
            .error_id
            .clone()
            .unwrap_or_else(|| FieldId(id.clone()));
        let mut field = Self {
            input,
            id,
            error_id,
            config,
            registry,
            on_change: Box::new(on_change),
        };
        observe::field_mounted(&field.error_id);
        if field.config.focus_on_mount {
            field.input.focus();
        }
        if field.config.validate_on_mount {
            field.validate(false);
        }
        field
    }

    /// Validates the current value and records the outcome in the registry.
    /// Errors stay hidden unless `reveal_errors` is set. Returns whether the
    /// value is valid.
    pub fn validate(&mut self, reveal_errors: bool) -> bool {
        let trimmed = self.input.value().trim().to_owned();
        self.input.set_value(trimmed);

        let valid = match &self.config.custom_validation {
            Some(custom) => custom(self.input.value()),
            None => self.input.check_validity(),
        };
        observe::field_validated(&self.error_id, valid);

        if valid {
            self.registry.clear(&self.error_id);
            return true;
        }
        let message = self
            .input
            .validation_message()
            .filter(|message| !message.is_empty())
            .or_else(|| {
                self.registry
                    .get(&self.error_id)
                    .map(|error| error.message)
            })
            .unwrap_or_else(|| INVALID_VALUE.to_owned());
        self.registry.set_errors([(
            self.error_id.clone(),
            ValidationError::new(message, !reveal_errors),
        )]);
        false
    }

    /// The user edited the value: the stale error is hidden until the next
    /// validation and the value is forwarded.
    pub fn on_change(&mut self, value: &str) {
        self.registry.hide(&self.error_id);
        self.input.set_value(value.to_owned());
        (self.on_change)(value);
    }

    pub fn on_blur(&mut self) -> bool {
        self.validate(true)
    }

    pub fn has_visible_error(&self) -> bool {
        self.registry
            .get(&self.error_id)
            .is_some_and(|error| !error.hidden)
    }

    /// The element that describes the input for assistive technology.
    pub fn described_by(&self) -> Option<String> {
        if self.config.show_error && self.has_visible_error() {
            if let Some(id) = self.registry.error_element_id(&self.error_id) {
                return Some(id);
            }
        }
        self.config.aria_described_by.clone()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn error_id(&self) -> &FieldId {
        &self.error_id
    }

    pub fn input(&self) -> &I {
        &self.input
    }
}

impl<I: Input> Drop for Field<I> {
    fn drop(&mut self) {
        self.registry.clear(&self.error_id);
        observe::field_unmounted(&self.error_id);
    }
}
