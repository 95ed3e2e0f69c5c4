use crate::config::fragments::{Fields, ReceiverFragment, Value};
use crate::discovery::service::{Service, ServiceType};

/// Builds the starter receiver fragment for a discovered service, or `None`
/// if the service type has no built-in template (discovered but unrendered
/// — correlation still reports it, the generator just has nothing to turn
/// it into).
pub fn receiver_for(service: &Service) -> Option<ReceiverFragment> {
    match &service.service_type {
        ServiceType::Mysql => Some(mysql(&service.primary_endpoint)),
        ServiceType::Postgresql => Some(postgresql(&service.primary_endpoint)),
        ServiceType::Nginx => Some(nginx(&service.primary_endpoint)),
        ServiceType::Redis => Some(redis(&service.primary_endpoint)),
        ServiceType::Other(_) => None,
    }
}

/// The environment variable names a rendered receiver of this `kind`
/// requires at Collector start time (e.g. credentials the generator itself
/// never has access to).
pub fn required_env_for_kind(kind: &str) -> &'static [&'static str] {
    match kind {
        "mysql" => &["MYSQL_USER", "MYSQL_PASSWORD"],
        "postgresql" => &["POSTGRESQL_USER", "POSTGRESQL_PASSWORD"],
        "nginx" => &[],
        "redis" => &["REDIS_PASSWORD"],
        _ => &[],
    }
}

fn mysql(endpoint: &str) -> ReceiverFragment {
    let mut fields = Fields::new();
    fields.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
    fields.insert("username".to_string(), Value::String("${env:MYSQL_USER}".to_string()));
    fields.insert(
        "password".to_string(),
        Value::String("${env:MYSQL_PASSWORD}".to_string()),
    );
    fields.insert("collection_interval".to_string(), Value::Int(60));
    ReceiverFragment {
        name: "mysql".to_string(),
        kind: "mysql".to_string(),
        fields,
    }
}

fn postgresql(endpoint: &str) -> ReceiverFragment {
    let mut fields = Fields::new();
    fields.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
    fields.insert(
        "username".to_string(),
        Value::String("${env:POSTGRESQL_USER}".to_string()),
    );
    fields.insert(
        "password".to_string(),
        Value::String("${env:POSTGRESQL_PASSWORD}".to_string()),
    );
    fields.insert("collection_interval".to_string(), Value::Int(60));
    ReceiverFragment {
        name: "postgresql".to_string(),
        kind: "postgresql".to_string(),
        fields,
    }
}

fn nginx(endpoint: &str) -> ReceiverFragment {
    let mut fields = Fields::new();
    fields.insert(
        "endpoint".to_string(),
        Value::String(format!("http://{endpoint}/status")),
    );
    fields.insert("collection_interval".to_string(), Value::Int(30));
    ReceiverFragment {
        name: "nginx".to_string(),
        kind: "nginx".to_string(),
        fields,
    }
}

fn redis(endpoint: &str) -> ReceiverFragment {
    let mut fields = Fields::new();
    fields.insert("endpoint".to_string(), Value::String(endpoint.to_string()));
    fields.insert(
        "password".to_string(),
        Value::String("${env:REDIS_PASSWORD}".to_string()),
    );
    fields.insert("collection_interval".to_string(), Value::Int(30));
    ReceiverFragment {
        name: "redis".to_string(),
        kind: "redis".to_string(),
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::service::{Confidence, DiscoveryMethodKind};

    fn service(service_type: ServiceType) -> Service {
        Service {
            service_type,
            primary_endpoint: "127.0.0.1:1234".to_string(),
            confidence: Confidence::High,
            methods: vec![DiscoveryMethodKind::PortScan],
            config_path: None,
            process_name: None,
        }
    }

    #[test]
    fn mysql_template_requires_credentials() {
        let receiver = receiver_for(&service(ServiceType::Mysql)).unwrap();
        assert_eq!(required_env_for_kind(&receiver.kind), ["MYSQL_USER", "MYSQL_PASSWORD"]);
    }

    #[test]
    fn unknown_service_type_has_no_template() {
        assert!(receiver_for(&service(ServiceType::Other("memcached".to_string()))).is_none());
    }

    #[test]
    fn nginx_template_needs_no_credentials() {
        let receiver = receiver_for(&service(ServiceType::Nginx)).unwrap();
        assert!(required_env_for_kind(&receiver.kind).is_empty());
    }
}
