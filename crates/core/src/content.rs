//! Static, per-locale copy used by the advisor.
//!
//! Every user-visible string the core produces on its own (the greeting, the
//! canned capability replies, the offline notice) lives here so the
//! controller never hard-codes language.

use crate::locale::Locale;
use serde::Serialize;

/// Checkout link for the Unified Regulatory Alignment Engagement.
pub const ENGAGEMENT_PAYMENT_LINK: &str = "https://buy.stripe.com/4gM28q1zKblW9GJ2CX9sk00";
/// Inbox for custom reviews and enterprise questions.
pub const CONTACT_EMAIL: &str = "hippashield@gmail.com";

/// The single engagement on offer, as presented to the model's knowledge base.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PricingPlan {
    pub name: &'static str,
    pub price: &'static str,
    pub description: &'static str,
    pub features: &'static [&'static str],
}

/// A one-click shortcut the page can fire into the advisor.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SuggestedPrompt {
    pub label: &'static str,
    pub prompt: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct StatusLabels {
    pub loading: &'static str,
    pub active: &'static str,
}

/// All advisor copy for one locale.
#[derive(Debug)]
pub struct LocaleContent {
    pub greeting: &'static str,
    pub pricing_plan: PricingPlan,
    pub suggested_prompts: &'static [SuggestedPrompt],
    pub status: StatusLabels,
    idle_fallback: &'static str,
    offline_prefix: &'static str,
    engagement_link_prefix: &'static str,
    contact_email_prefix: &'static str,
}

impl LocaleContent {
    /// Reply used when the model answers with neither text nor a known capability.
    pub fn idle_fallback(&self) -> &'static str {
        self.idle_fallback
    }

    /// Reply substituted for any upstream failure other than a rejected credential.
    pub fn offline_notice(&self) -> String {
        format!("{}{}.", self.offline_prefix, CONTACT_EMAIL)
    }

    pub fn engagement_link_reply(&self) -> String {
        format!("{}{}", self.engagement_link_prefix, ENGAGEMENT_PAYMENT_LINK)
    }

    pub fn contact_email_reply(&self) -> String {
        format!("{}{}", self.contact_email_prefix, CONTACT_EMAIL)
    }

    pub fn status_label(&self, busy: bool) -> &'static str {
        if busy { self.status.loading } else { self.status.active }
    }
}

/// Returns the content table for `locale`.
pub fn content(locale: Locale) -> &'static LocaleContent {
    match locale {
        Locale::En => &EN,
        Locale::Es => &ES,
    }
}

static EN: LocaleContent = LocaleContent {
    greeting: "Welcome to the HIPAA SHIELD Advisory Interface. I am connected to all internal service artifacts, latest OCR guidance, and 42 CFR Part 2 SAMHSA updates. How can I assist with your regulatory alignment today?",
    pricing_plan: PricingPlan {
        name: "Unified Regulatory Alignment Engagement",
        price: "$3,000",
        description: "Audit-Prep Evidence Package",
        features: &[
            "42 CFR Part 2 impact mapping (where policies differ)",
            "HIPAA-aligned compliance framework materials",
            "Updated documentation & consent templates",
            "Logging posture verification (based on exports)",
            "Audit-response ready documentation summary",
        ],
    },
    suggested_prompts: &[
        SuggestedPrompt {
            label: "Part 2 Impact Mapping",
            prompt: "Explain the key differences between HIPAA and 42 CFR Part 2 alignment.",
        },
        SuggestedPrompt {
            label: "Consent Workflow Proof",
            prompt: "How do we document consent workflows for Part 2 compliance?",
        },
        SuggestedPrompt {
            label: "Disclosure Artifact Audit",
            prompt: "What artifacts are needed to prove compliant SUD record disclosures?",
        },
        SuggestedPrompt {
            label: "Vendor Compliance Review",
            prompt: "How should we audit vendors for 42 CFR Part 2 alignment?",
        },
        SuggestedPrompt {
            label: "Part 2 Impact Hub",
            prompt: "What's included in the $3,000 Alignment Evidence Package?",
        },
        SuggestedPrompt {
            label: "Is this right for my Clinic?",
            prompt: "How do I know if this alignment is right for my SUD facility?",
        },
    ],
    status: StatusLabels {
        loading: "Synthesizing Alignment...",
        active: "Alignment Network Active",
    },
    idle_fallback: "I'm ready to assist with your practice's regulatory alignment.",
    offline_prefix: "The Advisor is temporarily offline. Please check your connection or contact ",
    engagement_link_prefix: "I can help with that. You can secure your Unified Regulatory Alignment Engagement (Audit-Prep Evidence Package) through our official payment portal here: ",
    contact_email_prefix: "For custom reviews or enterprise questions, please contact our lead consultant at: ",
};

static ES: LocaleContent = LocaleContent {
    greeting: "Bienvenido a la Interfaz de Asesoría de HIPAA SHIELD. Estoy conectado a todos los artefactos de servicio, guía de la OCR y actualizaciones de SAMHSA sobre Parte 2. ¿Cómo puedo asistir hoy?",
    pricing_plan: PricingPlan {
        name: "Compromiso de Alineación Regulatoria Unificada",
        price: "$3,000",
        description: "Paquete de Evidencia de Preparación para Auditoría",
        features: &[
            "Mapeo de impacto de 42 CFR Parte 2 (donde las políticas difieren)",
            "Materiales del marco de cumplimiento alineados con HIPAA",
            "Plantillas actualizadas de documentación y consentimiento",
            "Verificación de postura de registro (basado en exportaciones)",
            "Resumen de documentación lista para respuesta a auditoría",
        ],
    },
    suggested_prompts: &[
        SuggestedPrompt {
            label: "Mapeo de Impacto Parte 2",
            prompt: "Explica las diferencias clave entre la alineación de HIPAA y 42 CFR Parte 2.",
        },
        SuggestedPrompt {
            label: "Prueba de Flujo de Consentimiento",
            prompt: "¿Cómo documentamos los flujos de consentimiento para el cumplimiento de la Parte 2?",
        },
        SuggestedPrompt {
            label: "Auditoría de Divulgación",
            prompt: "¿Qué artefactos se necesitan para demostrar divulgaciones de registros SUD conformes?",
        },
        SuggestedPrompt {
            label: "Revisión de Cumplimiento de Proveedores",
            prompt: "¿Cómo deberíamos auditar a los proveedores para la alineación con 42 CFR Parte 2?",
        },
        SuggestedPrompt {
            label: "Centro de Impacto Parte 2",
            prompt: "¿Qué se incluye en el Paquete de Evidencia de Preparación para Auditoría de $3,000?",
        },
        SuggestedPrompt {
            label: "¿Es adecuado para mi Centro?",
            prompt: "¿Cómo sé si este compromiso es adecuado para mi centro SUD?",
        },
    ],
    status: StatusLabels {
        loading: "Sintetizando Alineación...",
        active: "Red de Alineación Activa",
    },
    idle_fallback: "Estoy listo para asistir con la alineación regulatoria de su práctica.",
    offline_prefix: "El Asesor está temporalmente fuera de línea. Por favor verifique su conexión o contacte a ",
    engagement_link_prefix: "Puedo ayudar con eso. Puede asegurar su Compromiso de Alineación Regulatoria Unificada (Paquete de Evidencia de Preparación para Auditoría) a través de nuestro portal de pago oficial aquí: ",
    contact_email_prefix: "Para revisiones personalizadas o preguntas empresariales, por favor contacte a nuestro consultor principal en: ",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_replies_embed_constants() {
        for locale in Locale::ALL {
            let local = content(locale);
            assert!(local.engagement_link_reply().ends_with(ENGAGEMENT_PAYMENT_LINK));
            assert!(local.contact_email_reply().ends_with(CONTACT_EMAIL));
            assert!(local.offline_notice().contains(CONTACT_EMAIL));
        }
    }

    #[test]
    fn test_locales_carry_distinct_greetings() {
        assert_ne!(content(Locale::En).greeting, content(Locale::Es).greeting);
        assert_eq!(
            content(Locale::En).suggested_prompts.len(),
            content(Locale::Es).suggested_prompts.len()
        );
    }

    #[test]
    fn test_status_label_follows_busy_flag() {
        let local = content(Locale::En);
        assert_eq!(local.status_label(true), "Synthesizing Alignment...");
        assert_eq!(local.status_label(false), "Alignment Network Active");
    }
}
