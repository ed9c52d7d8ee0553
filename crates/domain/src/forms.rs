//! Form validation.

use std::collections::{BTreeMap, HashMap};

use crate::draft::ContactDetails;

/// Minimum number of characters accepted for a first name.
pub const FIRST_NAME_MIN_LENGTH: usize = 2;

/// Field-level validation messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Records a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns the first message for a field, if any.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(field, messages)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

/// Submitted form values plus the errors found while validating them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Form {
    values: HashMap<String, String>,
    errors: FormErrors,
}

impl Form {
    /// Creates a form from submitted name/value pairs.
    pub fn new<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            errors: FormErrors::default(),
        }
    }

    /// Returns the submitted value, or `""` when the field was not sent.
    pub fn get(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    /// True when the field was sent and is not empty.
    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    /// Flags every listed field that is missing or blank.
    pub fn required(&mut self, fields: &[&str]) {
        for field in fields {
            if self.get(field).trim().is_empty() {
                self.errors.add(field, "This field cannot be empty");
            }
        }
    }

    /// Flags the field when it is shorter than `length` characters.
    pub fn min_length(&mut self, field: &str, length: usize) -> bool {
        if self.get(field).chars().count() < length {
            self.errors.add(
                field,
                format!("This field must be at least {length} characters long"),
            );
            return false;
        }
        true
    }

    /// Flags the field unless it looks like an email address.
    pub fn is_email(&mut self, field: &str) {
        if !looks_like_email(self.get(field)) {
            self.errors.add(field, "Invalid email address");
        }
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.is_empty() || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || local.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Applies the rent form rules to submitted contact details.
///
/// First name, last name and email are required; the first name needs at
/// least [`FIRST_NAME_MIN_LENGTH`] characters; the email must be well formed.
pub fn validate_contact(contact: &ContactDetails) -> Form {
    let mut form = Form::new([
        ("first_name", contact.first_name.as_str()),
        ("last_name", contact.last_name.as_str()),
        ("email", contact.email.as_str()),
        ("phone", contact.phone.as_str()),
    ]);
    form.required(&["first_name", "last_name", "email"]);
    form.min_length("first_name", FIRST_NAME_MIN_LENGTH);
    form.is_email("email");
    form
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(first: &str, last: &str, email: &str) -> ContactDetails {
        ContactDetails {
            first_name: first.into(),
            last_name: last.into(),
            email: email.into(),
            phone: "555-555-5555".into(),
        }
    }

    #[test]
    fn empty_form_is_valid() {
        let form = Form::new(Vec::<(String, String)>::new());
        assert!(form.valid());
        assert!(!form.has("anything"));
    }

    #[test]
    fn required_flags_blank_fields() {
        let mut form = Form::new([("a", "a"), ("b", "   ")]);
        form.required(&["a", "b", "c"]);
        assert!(!form.valid());
        assert!(form.errors().get("a").is_none());
        assert_eq!(form.errors().get("b"), Some("This field cannot be empty"));
        assert_eq!(form.errors().get("c"), Some("This field cannot be empty"));
    }

    #[test]
    fn min_length() {
        let mut form = Form::new([("x", "some value")]);
        assert!(!form.min_length("missing", 10));
        assert!(form.min_length("x", 3));
        assert_eq!(
            form.errors().get("missing"),
            Some("This field must be at least 10 characters long")
        );
        assert!(form.errors().get("x").is_none());
    }

    #[test]
    fn min_length_counts_characters_not_bytes() {
        let mut form = Form::new([("name", "É")]);
        assert!(!form.min_length("name", 2));

        let mut form = Form::new([("name", "Éa")]);
        assert!(form.min_length("name", 2));
    }

    #[test]
    fn email_format() {
        for good in ["me@here.com", "first.last+tag@sub.example.org"] {
            let mut form = Form::new([("email", good)]);
            form.is_email("email");
            assert!(form.valid(), "{good} should be accepted");
        }
        for bad in ["", "x", "me@", "@here.com", "me@here", "me@here..com", "m e@here.com"] {
            let mut form = Form::new([("email", bad)]);
            form.is_email("email");
            assert!(!form.valid(), "{bad} should be rejected");
        }
    }

    #[test]
    fn valid_contact_passes() {
        let form = validate_contact(&contact("John", "Smith", "john@smith.com"));
        assert!(form.valid());
        assert_eq!(form.get("phone"), "555-555-5555");
    }

    #[test]
    fn missing_email_is_reported_on_email_only() {
        let form = validate_contact(&contact("John", "Smith", ""));
        assert!(!form.valid());
        assert_eq!(form.errors().len(), 1);
        assert_eq!(form.errors().get("email"), Some("This field cannot be empty"));
    }

    #[test]
    fn short_first_name_is_reported() {
        let form = validate_contact(&contact("J", "Smith", "john@smith.com"));
        assert_eq!(
            form.errors().get("first_name"),
            Some("This field must be at least 2 characters long")
        );
    }
}
