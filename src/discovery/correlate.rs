use std::collections::BTreeMap;

use crate::discovery::service::{Confidence, DiscoveryMethodKind, RawFinding, Service, ServiceType, SENTINEL_ENDPOINT};

/// Groups raw findings from every discovery method by `(service_type,
/// endpoint)`, merges each group into one [`Service`], and assigns
/// confidence by how many distinct methods corroborated it: three or more
/// is `High`, two is `Medium`, a single method is `Low`. Process AND port
/// agreeing is also `High` even with only those two methods (§4.3).
pub fn correlate(findings: Vec<RawFinding>) -> Vec<Service> {
    let mut groups: BTreeMap<(String, String), Vec<RawFinding>> = BTreeMap::new();

    for finding in findings {
        let key = (finding.service_type.to_string(), finding.endpoint.clone());
        groups.entry(key).or_default().push(finding);
    }

    fold_sentinel_groups_into_concrete_endpoints(&mut groups);

    let mut services: Vec<Service> = groups
        .into_values()
        .map(|group| {
            let mut methods: Vec<_> = group.iter().map(|f| f.method).collect();
            methods.sort();
            methods.dedup();

            let process_and_port_agree = methods.contains(&DiscoveryMethodKind::ProcessScan)
                && methods.contains(&DiscoveryMethodKind::PortScan);

            let confidence = if methods.len() >= 3 || process_and_port_agree {
                Confidence::High
            } else if methods.len() == 2 {
                Confidence::Medium
            } else {
                Confidence::Low
            };

            let service_type = group[0].service_type.clone();
            let primary_endpoint = group
                .iter()
                .map(|f| f.endpoint.clone())
                .filter(|endpoint| endpoint != SENTINEL_ENDPOINT)
                .min()
                .unwrap_or_else(|| SENTINEL_ENDPOINT.to_string());
            let config_path = group.iter().find_map(|f| f.config_path.clone());
            let process_name = group.iter().find_map(|f| f.process_name.clone());

            Service {
                service_type,
                primary_endpoint,
                confidence,
                methods,
                config_path,
                process_name,
            }
        })
        .collect();

    services.sort_by(|a, b| {
        (a.service_type.to_string(), &a.primary_endpoint)
            .cmp(&(b.service_type.to_string(), &b.primary_endpoint))
    });

    services
}

/// Methods that can't determine a port (process name, config file presence,
/// installed package) all report [`SENTINEL_ENDPOINT`]. When exactly one
/// concrete-endpoint group exists for that type, the sentinel findings are
/// folded into it so a process/config/package sighting corroborates the
/// port scanner's finding instead of forming its own separate service.
/// When zero or multiple concrete groups exist for the type, the sentinel
/// findings stay in their own group — there's no unambiguous target.
fn fold_sentinel_groups_into_concrete_endpoints(groups: &mut BTreeMap<(String, String), Vec<RawFinding>>) {
    let mut concrete_endpoints_by_type: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (service_type, endpoint) in groups.keys() {
        if endpoint != SENTINEL_ENDPOINT {
            concrete_endpoints_by_type
                .entry(service_type.clone())
                .or_default()
                .push(endpoint.clone());
        }
    }

    let sentinel_keys: Vec<(String, String)> = groups
        .keys()
        .filter(|(_, endpoint)| endpoint == SENTINEL_ENDPOINT)
        .cloned()
        .collect();

    for key in sentinel_keys {
        let Some(endpoints) = concrete_endpoints_by_type.get(&key.0) else {
            continue;
        };
        if endpoints.len() != 1 {
            continue;
        }
        let target = (key.0.clone(), endpoints[0].clone());
        if let Some(sentinel_findings) = groups.remove(&key) {
            groups.entry(target).or_default().extend(sentinel_findings);
        }
    }
}

/// Removes services whose type string appears in `excluded`, applied after
/// correlation so exclusions act on the merged, highest-confidence view
/// rather than on individual raw sightings.
pub fn drop_excluded(services: Vec<Service>, excluded: &std::collections::HashSet<String>) -> Vec<Service> {
    services
        .into_iter()
        .filter(|s| !excluded.contains(&s.service_type.to_string()))
        .collect()
}
