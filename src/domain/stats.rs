use serde::{Deserialize, Serialize};

/// Either a computed score or the `"N/A"` placeholder the backend writes
/// before it has data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeliverabilityScore {
    Score(f64),
    Text(String),
}

impl Default for DeliverabilityScore {
    fn default() -> Self {
        DeliverabilityScore::Text("N/A".to_string())
    }
}

impl std::fmt::Display for DeliverabilityScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliverabilityScore::Score(s) => write!(f, "{s:.1}%"),
            DeliverabilityScore::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub total_accounts: u64,
    #[serde(default)]
    pub active_warmup: u64,
    #[serde(default)]
    pub deliverability_score: DeliverabilityScore,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_serializes_to_placeholder() {
        let v = serde_json::to_value(DashboardStats::default()).unwrap();
        assert_eq!(
            v,
            json!({"totalAccounts": 0, "activeWarmup": 0, "deliverabilityScore": "N/A"})
        );
    }

    #[test]
    fn numeric_score_parses() {
        let s: DashboardStats = serde_json::from_value(
            json!({"totalAccounts": 4, "activeWarmup": 2, "deliverabilityScore": 97.5}),
        )
        .unwrap();
        assert_eq!(s.deliverability_score, DeliverabilityScore::Score(97.5));
        assert_eq!(s.deliverability_score.to_string(), "97.5%");
    }
}
