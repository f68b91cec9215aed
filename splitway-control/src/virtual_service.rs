//! The subset of the Istio `VirtualService` schema the reader needs.

use serde::Deserialize;
use splitway_core::{Cluster, ServiceId, WeightPair};

use crate::error::ControlPlaneError;

/// Index of the non-canary routing rule in the theater virtual services.
pub const DEFAULT_RULE_INDEX: usize = 1;

/// A `networking.istio.io` virtual service.
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualService {
    /// Resource specification.
    pub spec: VirtualServiceSpec,
}

/// The `spec` block of a virtual service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VirtualServiceSpec {
    /// Ordered HTTP routing rules.
    #[serde(default)]
    pub http: Vec<HttpRoute>,
}

/// One HTTP routing rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpRoute {
    /// Optional rule name, quoted in diagnostics.
    #[serde(default)]
    pub name: Option<String>,
    /// Weighted destinations of this rule.
    #[serde(default)]
    pub route: Vec<HttpRouteDestination>,
}

/// A weighted destination.
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRouteDestination {
    /// Where traffic goes.
    pub destination: Destination,
    /// Relative weight; omitted means zero.
    #[serde(default)]
    pub weight: u32,
}

/// A destination subset.
#[derive(Debug, Clone, Deserialize)]
pub struct Destination {
    /// Destination-rule subset, `ctx1` or `ctx2` for the theater services.
    #[serde(default)]
    pub subset: Option<String>,
}

impl HttpRoute {
    fn label(&self, index: usize) -> String {
        match &self.name {
            Some(name) => format!("rule {index} ('{name}')"),
            None => format!("rule {index}"),
        }
    }
}

impl VirtualService {
    /// Extract the `ctx1`/`ctx2` split of `service` from rule `rule_index`.
    ///
    /// The rule must carry at least two destinations and name both subsets;
    /// anything else is malformed, so a half-read split never replaces a
    /// complete one.
    pub fn extract_weights(
        &self,
        service: ServiceId,
        rule_index: usize,
    ) -> Result<WeightPair, ControlPlaneError> {
        let rule = self.spec.http.get(rule_index).ok_or_else(|| {
            ControlPlaneError::Malformed(format!(
                "expected routing rule at index {rule_index}, found {} rules",
                self.spec.http.len()
            ))
        })?;
        let label = rule.label(rule_index);
        if rule.route.len() < 2 {
            return Err(ControlPlaneError::Malformed(format!(
                "{label} has {} destinations, need 2",
                rule.route.len()
            )));
        }

        let mut primary = None;
        let mut secondary = None;
        for route in &rule.route {
            match route
                .destination
                .subset
                .as_deref()
                .and_then(Cluster::from_label)
            {
                Some(Cluster::Primary) => primary = Some(route.weight),
                Some(Cluster::Secondary) => secondary = Some(route.weight),
                None => {}
            }
        }

        match (primary, secondary) {
            (Some(primary), Some(secondary)) => Ok(WeightPair::new(service, primary, secondary)),
            (None, _) => Err(ControlPlaneError::Malformed(format!(
                "{label} has no ctx1 destination"
            ))),
            (_, None) => Err(ControlPlaneError::Malformed(format!(
                "{label} has no ctx2 destination"
            ))),
        }
    }
}
