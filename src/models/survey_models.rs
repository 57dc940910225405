use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Text,
    Email,
    Phone,
    Select,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InputConstraints {
    pub max_length: Option<usize>,
    pub pattern: Option<&'static str>,
}

/// One question of the lead-capture survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepDescriptor {
    pub label: &'static str,
    pub field: &'static str,
    pub required: bool,
    pub kind: InputKind,
    pub placeholder: Option<&'static str>,
    pub options: &'static [&'static str],
    pub constraints: Option<InputConstraints>,
}

/// Label of the empty option a select step starts on. Choosing it counts as no answer.
pub const SELECT_PLACEHOLDER: &str = "Select an option";

pub const SURVEY_STEPS: &[StepDescriptor] = &[
    StepDescriptor {
        label: "Your Name",
        field: "name",
        required: true,
        kind: InputKind::Text,
        placeholder: Some("Enter your name"),
        options: &[],
        constraints: None,
    },
    StepDescriptor {
        label: "Email Address",
        field: "email",
        required: true,
        kind: InputKind::Email,
        placeholder: Some("Enter your email"),
        options: &[],
        constraints: None,
    },
    StepDescriptor {
        label: "Phone (optional)",
        field: "phone",
        required: false,
        kind: InputKind::Phone,
        placeholder: Some("Enter your phone number"),
        options: &[],
        constraints: Some(InputConstraints {
            max_length: Some(10),
            pattern: Some("[0-9]*"),
        }),
    },
    StepDescriptor {
        label: "City",
        field: "city",
        required: true,
        kind: InputKind::Text,
        placeholder: Some("Which city do you live in?"),
        options: &[],
        constraints: None,
    },
    StepDescriptor {
        label: "How do you currently commute?",
        field: "commute",
        required: true,
        kind: InputKind::Text,
        placeholder: Some("e.g. Ola, Uber, Auto, Bus, etc."),
        options: &[],
        constraints: None,
    },
    StepDescriptor {
        label: "What features do you want in a ride-hailing app?",
        field: "features",
        required: false,
        kind: InputKind::Text,
        placeholder: Some("Your wishlist (optional)"),
        options: &[],
        constraints: None,
    },
    StepDescriptor {
        label: "Would you use ZETS when it launches?",
        field: "intent",
        required: true,
        kind: InputKind::Select,
        placeholder: Some(SELECT_PLACEHOLDER),
        options: &["Definitely!", "Maybe", "Not sure", "No"],
        constraints: None,
    },
    StepDescriptor {
        label: "Any other feedback?",
        field: "feedback",
        required: false,
        kind: InputKind::Text,
        placeholder: Some("Share your thoughts (optional)"),
        options: &[],
        constraints: None,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: &'static str,
    pub url: &'static str,
}

/// Shown in place of the form once a response is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfirmationView {
    pub headline: &'static str,
    pub body: &'static str,
    pub call_to_action: &'static str,
    pub details: &'static str,
    pub social_links: &'static [Link],
    pub home: Link,
}

pub const CONFIRMATION: ConfirmationView = ConfirmationView {
    headline: "Thank you for your feedback!",
    body: "You're helping shape the future of ZETS.",
    call_to_action: "Follow us on social media to stay tuned!",
    details: "Get exclusive updates, behind-the-scenes content, and be the first to know when ZETS launches!",
    social_links: &[
        Link { label: "Instagram", url: "https://instagram.com/zets.in" },
        Link { label: "X", url: "https://x.com/Zets.in" },
        Link { label: "Facebook", url: "https://facebook.com/zets" },
    ],
    home: Link { label: "Back to Home", url: "https://zets.in" },
};
