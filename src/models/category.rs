use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// One predefined SOS request type. Read-only once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SosCategory {
    pub id: String,
    pub display_title: String,
    pub color: String,
    /// Alert text delivered alongside the request.
    pub message: String,
    /// Guidance shown to the user once the category is picked.
    pub help_message: String,
    pub requires_location: bool,
    /// Preset amounts. When present, a request must carry an amount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_amounts: Option<Vec<u32>>,
    pub priority: Priority,
}

impl SosCategory {
    pub fn requires_amount(&self) -> bool {
        self.allowed_amounts.is_some()
    }

    /// The stock categories shipped with the app.
    pub fn defaults() -> Vec<SosCategory> {
        vec![
            SosCategory {
                id: "danger".into(),
                display_title: "Je suis en danger".into(),
                color: "#FF4444".into(),
                message: "Je suis en danger. Aide-moi maintenant.".into(),
                help_message: "Mettez-vous en sécurité. Votre position sera partagée.".into(),
                requires_location: true,
                allowed_amounts: None,
                priority: Priority::High,
            },
            SosCategory {
                id: "medical".into(),
                display_title: "Détresse médicale".into(),
                color: "#FF6B3D".into(),
                message: "Je suis en détresse médicale. Aide-moi.".into(),
                help_message: "Installez-vous confortablement. Aide en route.".into(),
                requires_location: true,
                allowed_amounts: None,
                priority: Priority::High,
            },
            SosCategory {
                id: "pickup".into(),
                display_title: "Viens me chercher".into(),
                color: "#2AA5A0".into(),
                message: "Viens me chercher. Voici ma position.".into(),
                help_message: "Restez où vous êtes. Votre position sera envoyée.".into(),
                requires_location: true,
                allowed_amounts: None,
                priority: Priority::Medium,
            },
            SosCategory {
                id: "financial".into(),
                display_title: "Recharge ma carte".into(),
                color: "#4CAF50".into(),
                message: "J'ai besoin d'une recharge de carte.".into(),
                help_message: "Sélectionnez un montant puis validez la recharge.".into(),
                requires_location: false,
                allowed_amounts: Some(vec![20, 50, 100]),
                priority: Priority::Low,
            },
        ]
    }
}
