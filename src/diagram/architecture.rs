use crate::diagram::{Diagram, Direction, NodeKind};

pub const TITLE: &str = "AWS Infrastructure with CodePipeline Events and Teams Notifications";

/// The deployed notification system: CodePipeline events flow through
/// EventBridge and SNS into the relay function, which keeps state in DynamoDB,
/// reads the webhook from Secrets Manager and posts to Teams.
pub fn notification_system() -> Diagram {
    let mut d = Diagram::new(TITLE).direction(Direction::LeftToRight);

    let database = d.cluster("Database Services");
    let dynamo_service = d.node_in(database, NodeKind::DynamoDb, "DynamoDB");
    let dynamo_table = d.node_in(database, NodeKind::DynamoDbTable, "DynamoDBTable");
    d.connect(dynamo_service, dynamo_table);

    let messaging = d.cluster("Messaging");
    let sns_service = d.node_in(messaging, NodeKind::Sns, "SNS Service");
    let sns_topic = d.node_in(messaging, NodeKind::SnsTopic, "SNS Topic");
    d.connect(sns_service, sns_topic);

    let compute = d.cluster("Compute");
    let lambda = d.node_in(compute, NodeKind::Lambda, "Lambda");

    let monitoring = d.cluster("Monitoring");
    let cloudwatch = d.node_in(monitoring, NodeKind::CloudWatch, "CloudWatch");
    let log_group = d.node_in(
        monitoring,
        NodeKind::Custom {
            icon: "./aws_logs.png".to_string(),
        },
        "Log Group",
    );
    d.connect(cloudwatch, log_group);

    let orchestration = d.cluster("Event Orchestration");
    let event_bridge = d.node_in(orchestration, NodeKind::EventBridge, "EventBridge");
    let code_pipeline = d.node_in(orchestration, NodeKind::CodePipeline, "CodePipeline");
    d.chain(&[code_pipeline, event_bridge, sns_topic]);

    let security = d.cluster("Security");
    let iam_service = d.node_in(security, NodeKind::Iam, "IAM Service");
    let iam_role = d.node_in(security, NodeKind::IamRole, "Role");
    let iam_policy = d.node_in(security, NodeKind::IamPermissions, "Policy");
    let secrets = d.node_in(security, NodeKind::SecretsManager, "Secrets");
    d.chain(&[iam_service, iam_role, iam_policy])
        .fan_out(iam_policy, &[secrets, dynamo_service, cloudwatch]);

    d.connect(lambda, iam_role);
    d.connect(lambda, cloudwatch);
    d.connect(sns_topic, lambda);

    let webhook = d.node(
        NodeKind::Custom {
            icon: "./webhook.png".to_string(),
        },
        "Webhook",
    );
    let teams = d.node(NodeKind::Teams, "Microsoft Teams");
    d.chain(&[lambda, webhook, teams]);

    d.connect(lambda, dynamo_table);
    d
}
