//! Local Capabilities
//!
//! The model may answer a turn by asking for one of these zero-argument
//! capabilities instead of writing free text. Each one resolves locally into a
//! locale-appropriate sentence, so no second round trip is ever needed.

use crate::{content::content, locale::Locale};
use serde::Serialize;

/// A named capability the model is allowed to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Returns the checkout link for the engagement.
    EngagementLink,
    /// Returns the consultant contact email.
    ContactEmail,
}

/// How a capability is advertised to the generation interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityDeclaration {
    pub name: &'static str,
    pub description: &'static str,
}

impl Capability {
    pub const ALL: [Capability; 2] = [Capability::EngagementLink, Capability::ContactEmail];

    /// The function name declared to the model.
    pub fn name(&self) -> &'static str {
        match self {
            Capability::EngagementLink => "getEngagementLink",
            Capability::ContactEmail => "getContactEmail",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Capability::EngagementLink => {
                "Returns the official Stripe payment link for the HIPAA Shield Unified Regulatory Alignment Engagement."
            }
            Capability::ContactEmail => {
                "Returns the official contact email for laser-focused compliance support."
            }
        }
    }

    /// Looks a capability up by the function name the model echoed back.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn declarations() -> Vec<CapabilityDeclaration> {
        Self::ALL
            .iter()
            .map(|c| CapabilityDeclaration {
                name: c.name(),
                description: c.description(),
            })
            .collect()
    }

    /// Formats the capability's static value into a sentence for `locale`.
    pub fn resolve(&self, locale: Locale) -> String {
        let local = content(locale);
        match self {
            Capability::EngagementLink => local.engagement_link_reply(),
            Capability::ContactEmail => local.contact_email_reply(),
        }
    }
}
