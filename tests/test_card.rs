use pipewatch::engine::types::{AlertKind, PipelineState};
use pipewatch::notify::card::*;

fn details<'a>(state: &'a PipelineState, url: &'a str) -> CardDetails<'a> {
    CardDetails {
        pipeline: "billing-api",
        state,
        executed_at: "05-03-2025 14:22:01",
        account_id: "123456789012",
        region: "sa-east-1",
        pipeline_url: url,
    }
}

#[test]
fn console_url_points_at_pipeline_view() {
    assert_eq!(
        pipeline_console_url("https://console.aws.amazon.com/", "billing-api", "sa-east-1"),
        "https://console.aws.amazon.com/codesuite/codepipeline/pipelines/billing-api/view?region=sa-east-1"
    );
}

#[test]
fn failure_card_json_shape() {
    let url = pipeline_console_url("https://console.aws.amazon.com", "billing-api", "sa-east-1");
    let card = build_card(
        AlertKind::Failure,
        &details(&PipelineState::Failed, &url),
        CardLanguage::Pt,
    );

    let value = serde_json::to_value(&card).unwrap();
    assert_eq!(
        value,
        serde_json::json!({
            "@type": "MessageCard",
            "@context": "http://schema.org/extensions",
            "summary": "🚨 Notificação de Falha do AWS CodePipeline",
            "themeColor": "FF0000",
            "title": "🚨 Notificação de Falha do AWS CodePipeline",
            "sections": [{
                "activityTitle": "Pipeline: billing-api",
                "facts": [
                    {"name": "Status", "value": "FAILED"},
                    {"name": "Executado em", "value": "05-03-2025 14:22:01"},
                    {"name": "ID da Conta AWS", "value": "123456789012"},
                    {"name": "Região AWS", "value": "sa-east-1"}
                ]
            }],
            "potentialAction": [{
                "@type": "OpenUri",
                "name": "Visualizar Pipeline",
                "targets": [{"os": "default", "uri": url}]
            }]
        })
    );
}

#[test]
fn recovery_card_is_green() {
    let card = build_card(
        AlertKind::Recovery,
        &details(&PipelineState::Succeeded, "https://x"),
        CardLanguage::Pt,
    );
    assert_eq!(card.theme_color, "00FF00");
    assert_eq!(card.title, "✅ Notificação de Recuperação do AWS CodePipeline");
    assert_eq!(card.summary, card.title);
    assert_eq!(card.sections[0].facts[0].value, "SUCCEEDED");
}

#[test]
fn english_labels() {
    let card = build_card(
        AlertKind::Recovery,
        &details(&PipelineState::Succeeded, "https://x"),
        CardLanguage::En,
    );
    assert_eq!(card.title, "✅ AWS CodePipeline Recovery Notification");

    let names: Vec<&str> = card.sections[0]
        .facts
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(names, ["Status", "Executed at", "AWS Account ID", "AWS Region"]);
    assert_eq!(card.potential_action[0].name, "View Pipeline");
}

#[test]
fn language_parses_from_config() {
    let lang: CardLanguage = serde_json::from_str("\"en\"").unwrap();
    assert_eq!(lang, CardLanguage::En);
    assert_eq!(CardLanguage::default(), CardLanguage::Pt);
}
