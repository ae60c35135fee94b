//! Event catalog and registration form handling.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// Competitions open for registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    SpeedProgramming,
    WebDevelopment,
    PitchYourIdea,
    CaptureTheFlag,
    DataInsights,
    Hackathon,
}

impl Event {
    pub const ALL: [Event; 6] = [
        Event::SpeedProgramming,
        Event::WebDevelopment,
        Event::PitchYourIdea,
        Event::CaptureTheFlag,
        Event::DataInsights,
        Event::Hackathon,
    ];

    /// The form value submitted by the registration page.
    pub fn slug(self) -> &'static str {
        match self {
            Event::SpeedProgramming => "speed-programming",
            Event::WebDevelopment => "web-development",
            Event::PitchYourIdea => "pitch-your-idea",
            Event::CaptureTheFlag => "ctf",
            Event::DataInsights => "data-insights",
            Event::Hackathon => "hackathon",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Event::SpeedProgramming => "Speed Programming",
            Event::WebDevelopment => "Web Development",
            Event::PitchYourIdea => "Pitch Your Idea",
            Event::CaptureTheFlag => "Capture the Flag",
            Event::DataInsights => "Data Driven Insights",
            Event::Hackathon => "Hackathon",
        }
    }

    pub fn fee(self) -> u32 {
        match self {
            Event::PitchYourIdea => 1000,
            Event::Hackathon => 500,
            _ => 200,
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.slug() == slug)
    }

    /// Name stored with the registration, e.g. `"Hackathon (Fee: 500)"`.
    /// Unrecognised slugs are kept as `"Unknown Event"`.
    pub fn display_name_for(slug: &str) -> String {
        Self::from_slug(slug)
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown Event".to_string())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Fee: {})", self.title(), self.fee())
    }
}

/// The two documents uploaded with each registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// National identity card or student card.
    IdentityCard,
    PaymentSlip,
}

impl DocumentKind {
    /// Multipart field name carrying this document.
    pub fn form_field(self) -> &'static str {
        match self {
            DocumentKind::IdentityCard => "cnicOrStudentCard",
            DocumentKind::PaymentSlip => "paymentSlip",
        }
    }

    fn from_form_field(name: &str) -> Option<Self> {
        match name {
            "cnicOrStudentCard" => Some(DocumentKind::IdentityCard),
            "paymentSlip" => Some(DocumentKind::PaymentSlip),
            _ => None,
        }
    }
}

impl FromStr for DocumentKind {
    type Err = CoreError;

    /// Parses the `type` query value used by the image endpoint.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cnic" => Ok(DocumentKind::IdentityCard),
            "payment" => Ok(DocumentKind::PaymentSlip),
            other => Err(CoreError::InvalidDocumentKind(other.to_string())),
        }
    }
}

/// A validated registration ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRegistration {
    pub name: String,
    pub email: String,
    pub contact: String,
    pub program: String,
    pub semester: String,
    pub rollno: String,
    /// Display name from [`Event::display_name_for`].
    pub event: String,
    pub team: Option<String>,
    pub user_id: Option<String>,
    pub transaction_id: String,
    pub account_no: String,
    pub identity_document: Vec<u8>,
    pub payment_slip: Vec<u8>,
}

/// Accumulates multipart fields and files until [`RegistrationForm::finish`].
///
/// Repeated fields keep the first value.
#[derive(Debug, Default)]
pub struct RegistrationForm {
    name: Option<String>,
    email: Option<String>,
    contact: Option<String>,
    program: Option<String>,
    semester: Option<String>,
    rollno: Option<String>,
    event: Option<String>,
    team: Option<String>,
    user_id: Option<String>,
    transaction_id: Option<String>,
    account_no: Option<String>,
    identity_document: Option<Vec<u8>>,
    payment_slip: Option<Vec<u8>>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a text field. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        let slot = match name {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "contact" => &mut self.contact,
            "program" => &mut self.program,
            "semester" => &mut self.semester,
            "rollno" => &mut self.rollno,
            "event" => &mut self.event,
            "team" => &mut self.team,
            "userId" => &mut self.user_id,
            "transactionId" => &mut self.transaction_id,
            "accountNo" => &mut self.account_no,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Whether `name` is one of the document upload fields.
    pub fn is_document_field(name: &str) -> bool {
        DocumentKind::from_form_field(name).is_some()
    }

    /// Records an uploaded file. Returns `false` for unknown field names.
    pub fn set_document(&mut self, name: &str, data: Vec<u8>) -> bool {
        let Some(kind) = DocumentKind::from_form_field(name) else {
            return false;
        };
        let slot = match kind {
            DocumentKind::IdentityCard => &mut self.identity_document,
            DocumentKind::PaymentSlip => &mut self.payment_slip,
        };
        if slot.is_none() {
            *slot = Some(data);
        }
        true
    }

    /// Validates required fields and documents, reporting the first missing
    /// one in form order.
    pub fn finish(self) -> CoreResult<NewRegistration> {
        Ok(NewRegistration {
            name: required(self.name, "name")?,
            email: required(self.email, "email")?,
            contact: required(self.contact, "contact")?,
            program: required(self.program, "program")?,
            semester: required(self.semester, "semester")?,
            rollno: required(self.rollno, "rollno")?,
            event: Event::display_name_for(&required(self.event, "event")?),
            team: optional(self.team),
            user_id: optional(self.user_id),
            transaction_id: required(self.transaction_id, "transactionId")?,
            account_no: required(self.account_no, "accountNo")?,
            identity_document: required_bytes(self.identity_document, "cnicOrStudentCard")?,
            payment_slip: required_bytes(self.payment_slip, "paymentSlip")?,
        })
    }
}

fn required(value: Option<String>, field: &'static str) -> CoreResult<String> {
    optional(value).ok_or(CoreError::MissingField(field))
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_bytes(value: Option<Vec<u8>>, field: &'static str) -> CoreResult<Vec<u8>> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(CoreError::MissingField(field))
}

/// A stored registration without its documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub contact: String,
    pub program: String,
    pub semester: String,
    pub rollno: String,
    pub event: String,
    pub team: Option<String>,
    pub transaction_id: String,
    pub account_no: String,
    pub created_at: DateTime<Utc>,
}

/// Admin listing entry: the record plus which documents are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationSummary {
    #[serde(flatten)]
    pub record: RegistrationRecord,
    #[serde(rename = "cnicOrStudentCardUrl")]
    pub has_identity_document: bool,
    #[serde(rename = "paymentSlipUrl")]
    pub has_payment_slip: bool,
}
