use serde::{Deserialize, Serialize};

use crate::engine::types::{AlertKind, PipelineState};

/// Language of the labels printed on alert cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CardLanguage {
    #[default]
    Pt,
    En,
}

struct Labels {
    failure_title: &'static str,
    recovery_title: &'static str,
    status: &'static str,
    executed_at: &'static str,
    account_id: &'static str,
    region: &'static str,
    view_pipeline: &'static str,
}

const PT: Labels = Labels {
    failure_title: "Notificação de Falha do AWS CodePipeline",
    recovery_title: "Notificação de Recuperação do AWS CodePipeline",
    status: "Status",
    executed_at: "Executado em",
    account_id: "ID da Conta AWS",
    region: "Região AWS",
    view_pipeline: "Visualizar Pipeline",
};

const EN: Labels = Labels {
    failure_title: "AWS CodePipeline Failure Notification",
    recovery_title: "AWS CodePipeline Recovery Notification",
    status: "Status",
    executed_at: "Executed at",
    account_id: "AWS Account ID",
    region: "AWS Region",
    view_pipeline: "View Pipeline",
};

impl CardLanguage {
    fn labels(self) -> &'static Labels {
        match self {
            CardLanguage::Pt => &PT,
            CardLanguage::En => &EN,
        }
    }
}

/// Office 365 connector `MessageCard`, the payload Teams incoming webhooks accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: String,
    #[serde(rename = "@context")]
    pub context: String,
    pub summary: String,
    #[serde(rename = "themeColor")]
    pub theme_color: String,
    pub title: String,
    pub sections: Vec<CardSection>,
    #[serde(rename = "potentialAction")]
    pub potential_action: Vec<CardAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardSection {
    #[serde(rename = "activityTitle")]
    pub activity_title: String,
    pub facts: Vec<CardFact>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFact {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardAction {
    #[serde(rename = "@type")]
    pub action_type: String,
    pub name: String,
    pub targets: Vec<ActionTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTarget {
    pub os: String,
    pub uri: String,
}

/// Values shown on a card.
pub struct CardDetails<'a> {
    pub pipeline: &'a str,
    pub state: &'a PipelineState,
    pub executed_at: &'a str,
    pub account_id: &'a str,
    pub region: &'a str,
    pub pipeline_url: &'a str,
}

/// Console link for a pipeline.
pub fn pipeline_console_url(console_url: &str, pipeline: &str, region: &str) -> String {
    format!(
        "{}/codesuite/codepipeline/pipelines/{}/view?region={}",
        console_url.trim_end_matches('/'),
        pipeline,
        region
    )
}

pub fn build_card(kind: AlertKind, details: &CardDetails<'_>, language: CardLanguage) -> MessageCard {
    let labels = language.labels();
    let (emoji, title, color) = match kind {
        AlertKind::Failure => ("🚨", labels.failure_title, "FF0000"),
        AlertKind::Recovery => ("✅", labels.recovery_title, "00FF00"),
    };
    let card_title = format!("{} {}", emoji, title);

    let fact = |name: &str, value: &str| CardFact {
        name: name.to_string(),
        value: value.to_string(),
    };

    MessageCard {
        card_type: "MessageCard".to_string(),
        context: "http://schema.org/extensions".to_string(),
        summary: card_title.clone(),
        theme_color: color.to_string(),
        title: card_title,
        sections: vec![CardSection {
            activity_title: format!("Pipeline: {}", details.pipeline),
            facts: vec![
                fact(labels.status, details.state.as_str()),
                fact(labels.executed_at, details.executed_at),
                fact(labels.account_id, details.account_id),
                fact(labels.region, details.region),
            ],
        }],
        potential_action: vec![CardAction {
            action_type: "OpenUri".to_string(),
            name: labels.view_pipeline.to_string(),
            targets: vec![ActionTarget {
                os: "default".to_string(),
                uri: details.pipeline_url.to_string(),
            }],
        }],
    }
}
