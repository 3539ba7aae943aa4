//! Dialog and form state for channel actions.

use chanadmin_api_models::{AddDaysRequest, CreateChannelRequest, WebhookDomain};
use thiserror::Error;

use super::logic::{DEFAULT_EXTEND_DAYS, normalize_comment, parse_days_input};

/// Form validation failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    /// Days must be at least one.
    #[error("days must be at least 1")]
    InvalidDays {
        /// Rejected value.
        days: i64,
    },
    /// The chosen domain is already the channel's webhook.
    #[error("domain is already the current webhook address")]
    DomainIsCurrent {
        /// Rejected domain.
        domain: String,
    },
    /// The chosen domain is not in the configured list.
    #[error("domain is not configured")]
    UnknownDomain {
        /// Rejected domain.
        domain: String,
    },
    /// No channel is targeted by the dialog.
    #[error("no channel selected")]
    NoChannel,
    /// An update carried no fields.
    #[error("nothing to update")]
    NothingToUpdate,
}

/// Set-webhook dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebhookDomainDialog {
    /// Whether the dialog is shown.
    pub open: bool,
    /// Target channel.
    pub channel_id: Option<String>,
}

impl WebhookDomainDialog {
    /// Show the dialog for `channel_id`.
    pub fn open_for(&mut self, channel_id: &str) {
        self.open = true;
        self.channel_id = Some(channel_id.to_string());
    }

    /// Hide the dialog and forget the target.
    pub fn close(&mut self) {
        self.open = false;
        self.channel_id = None;
    }
}

/// One row of the domain picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainOption {
    /// Domain offered.
    pub domain: String,
    /// Priority weight.
    pub weight: i64,
    /// Whether this domain equals the channel's current webhook URL.
    pub is_current: bool,
}

impl DomainOption {
    /// Whether the option can be chosen.
    #[must_use]
    pub const fn selectable(&self) -> bool {
        !self.is_current
    }

    /// Whether the weight is worth surfacing.
    #[must_use]
    pub const fn shows_priority(&self) -> bool {
        self.weight > 1
    }
}

/// Build picker rows, marking the entry equal to `current_url`.
#[must_use]
pub fn domain_options(domains: &[WebhookDomain], current_url: Option<&str>) -> Vec<DomainOption> {
    domains
        .iter()
        .map(|domain| DomainOption {
            domain: domain.domain.clone(),
            weight: domain.weight,
            is_current: current_url.is_some_and(|url| !url.is_empty() && url == domain.domain),
        })
        .collect()
}

/// Check a picker choice before submitting it.
///
/// # Errors
///
/// Rejects domains that are current or not configured.
pub fn validate_domain_choice(
    domain: &str,
    domains: &[WebhookDomain],
    current_url: Option<&str>,
) -> Result<(), FormError> {
    let option = domain_options(domains, current_url)
        .into_iter()
        .find(|option| option.domain == domain)
        .ok_or_else(|| FormError::UnknownDomain {
            domain: domain.to_string(),
        })?;
    if option.selectable() {
        Ok(())
    } else {
        Err(FormError::DomainIsCurrent {
            domain: domain.to_string(),
        })
    }
}

/// Add-days form fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddDaysForm {
    /// Days to add.
    pub days: i64,
    /// Free-form comment; blank becomes `"no"` on submit.
    pub comment: String,
}

impl Default for AddDaysForm {
    fn default() -> Self {
        Self {
            days: DEFAULT_EXTEND_DAYS,
            comment: String::new(),
        }
    }
}

impl AddDaysForm {
    /// Form with explicit values.
    #[must_use]
    pub fn new(days: i64, comment: impl Into<String>) -> Self {
        Self {
            days,
            comment: comment.into(),
        }
    }

    /// Apply raw text from the days input.
    pub fn set_days_input(&mut self, input: &str) {
        self.days = parse_days_input(input);
    }

    /// Whether the submit control is enabled.
    #[must_use]
    pub const fn can_submit(&self, in_flight: bool) -> bool {
        self.days >= 1 && !in_flight
    }

    /// Build the request body.
    ///
    /// # Errors
    ///
    /// Returns [`FormError::InvalidDays`] when `days < 1`.
    pub fn to_request(&self) -> Result<AddDaysRequest, FormError> {
        if self.days < 1 {
            return Err(FormError::InvalidDays { days: self.days });
        }
        Ok(AddDaysRequest {
            days: self.days,
            comment: normalize_comment(&self.comment),
        })
    }
}

/// Add-days dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddDaysDialog {
    /// Whether the dialog is shown.
    pub open: bool,
    /// Target channel.
    pub channel_id: Option<String>,
    /// Form fields.
    pub form: AddDaysForm,
}

impl AddDaysDialog {
    /// Show the dialog for `channel_id` with a fresh form.
    pub fn open_for(&mut self, channel_id: &str) {
        self.open = true;
        self.channel_id = Some(channel_id.to_string());
        self.form = AddDaysForm::default();
    }

    /// Hide the dialog and reset the form.
    pub fn close(&mut self) {
        *self = Self::default();
    }
}

/// Create-channel form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateChannelForm {
    /// Display name.
    pub name: String,
    /// Description.
    pub description: String,
}

impl CreateChannelForm {
    /// Build the request body with trimmed fields.
    #[must_use]
    pub fn to_request(&self) -> CreateChannelRequest {
        CreateChannelRequest {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
        }
    }

    /// Clear both fields.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<WebhookDomain> {
        vec![
            WebhookDomain {
                domain: "https://a.example".into(),
                weight: 1,
            },
            WebhookDomain {
                domain: "https://b.example".into(),
                weight: 3,
            },
        ]
    }

    #[test]
    fn current_domain_is_marked_and_not_selectable() {
        let options = domain_options(&domains(), Some("https://b.example"));
        assert!(options[0].selectable());
        assert!(!options[1].selectable());
        assert!(options[1].shows_priority());
        assert!(!options[0].shows_priority());
    }

    #[test]
    fn empty_current_url_marks_nothing() {
        let options = domain_options(&domains(), Some(""));
        assert!(options.iter().all(DomainOption::selectable));
        let options = domain_options(&domains(), None);
        assert!(options.iter().all(DomainOption::selectable));
    }

    #[test]
    fn choosing_current_or_unknown_domain_is_rejected() {
        assert_eq!(
            validate_domain_choice("https://a.example", &domains(), Some("https://a.example")),
            Err(FormError::DomainIsCurrent {
                domain: "https://a.example".into()
            })
        );
        assert!(matches!(
            validate_domain_choice("https://z.example", &domains(), None),
            Err(FormError::UnknownDomain { .. })
        ));
        assert_eq!(
            validate_domain_choice("https://b.example", &domains(), Some("https://a.example")),
            Ok(())
        );
    }

    #[test]
    fn add_days_form_defaults_and_validation() {
        let mut form = AddDaysForm::default();
        assert_eq!(form.days, 7);
        assert!(form.can_submit(false));
        assert!(!form.can_submit(true));
        assert_eq!(
            form.to_request().expect("valid"),
            AddDaysRequest {
                days: 7,
                comment: "no".into()
            }
        );

        form.set_days_input("abc");
        assert_eq!(form.days, 0);
        assert!(!form.can_submit(false));
        assert_eq!(form.to_request(), Err(FormError::InvalidDays { days: 0 }));
    }

    #[test]
    fn add_days_dialog_resets_on_open_and_close() {
        let mut dialog = AddDaysDialog::default();
        dialog.open_for("C1");
        dialog.form = AddDaysForm::new(30, "renewal");
        dialog.close();
        assert_eq!(dialog, AddDaysDialog::default());

        dialog.form.days = 2;
        dialog.open_for("C2");
        assert_eq!(dialog.form, AddDaysForm::default());
        assert_eq!(dialog.channel_id.as_deref(), Some("C2"));
    }

    #[test]
    fn create_form_trims_fields() {
        let mut form = CreateChannelForm {
            name: " sales ".into(),
            description: "  eu  ".into(),
        };
        assert_eq!(
            form.to_request(),
            CreateChannelRequest {
                name: "sales".into(),
                description: "eu".into()
            }
        );
        form.reset();
        assert_eq!(form, CreateChannelForm::default());
    }
}
