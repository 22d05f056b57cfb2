use serde::{Deserialize, Serialize};

/// How a normalized status is compared against a group's variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchRule {
    /// Whole string equals a variant
    Exact,
    /// String starts with a variant ("APPROVED >>>>" is approved)
    Prefix,
}

/// Normalized status category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusGroup {
    WaitingQuote,
    InWork,
    Shipped,
    Approved,
    Archived,
}

const WAITING_QUOTE_VARIANTS: &[&str] = &[
    "WAITING QUOTE",
    "WAITING FOR QUOTE",
    "AWAITING QUOTE",
    "PENDING QUOTE",
    "QUOTE REQUESTED",
    "TEARDOWN / QUOTE",
    "UNDER EVALUATION",
];

const IN_WORK_VARIANTS: &[&str] = &[
    "IN WORK",
    "IN PROGRESS",
    "IN REPAIR",
    "BEING REPAIRED",
    "WORK IN PROGRESS",
    "WIP",
];

const SHIPPED_VARIANTS: &[&str] = &[
    "SHIPPED",
    "SHIPPED TO CUSTOMER",
    "IN TRANSIT",
    "CURRENTLY BEING SHIPPED",
];

const APPROVED_VARIANTS: &[&str] = &["APPROVED"];

const ARCHIVED_VARIANTS: &[&str] = &[
    "PAID",
    "CLOSED",
    "COMPLETE",
    "BER",
    "RAI",
    "RETURNED",
    "CANCELLED",
    "SCRAPPED",
];

/// Terminal statuses whose estimated cost is not counted as value in work:
/// paid, beyond economical repair, return awaiting inspection, returned.
pub const VALUE_EXCLUDED_STATUSES: &[&str] = &["PAID", "BER", "RAI", "RETURNED"];

impl StatusGroup {
    pub const ALL: [StatusGroup; 5] = [
        StatusGroup::WaitingQuote,
        StatusGroup::InWork,
        StatusGroup::Shipped,
        StatusGroup::Approved,
        StatusGroup::Archived,
    ];

    pub fn variants(&self) -> &'static [&'static str] {
        match self {
            StatusGroup::WaitingQuote => WAITING_QUOTE_VARIANTS,
            StatusGroup::InWork => IN_WORK_VARIANTS,
            StatusGroup::Shipped => SHIPPED_VARIANTS,
            StatusGroup::Approved => APPROVED_VARIANTS,
            StatusGroup::Archived => ARCHIVED_VARIANTS,
        }
    }

    pub fn match_rule(&self) -> MatchRule {
        match self {
            StatusGroup::Approved => MatchRule::Prefix,
            _ => MatchRule::Exact,
        }
    }

    /// Membership test on a raw status; `None` and blank match nothing
    pub fn matches(&self, status: Option<&str>) -> bool {
        match normalize_status(status) {
            Some(normalized) => self.matches_normalized(&normalized),
            None => false,
        }
    }

    fn matches_normalized(&self, normalized: &str) -> bool {
        let rule = self.match_rule();
        self.variants().iter().any(|v| match rule {
            MatchRule::Exact => normalized == *v,
            MatchRule::Prefix => normalized.starts_with(v),
        })
    }

    /// First group the status belongs to, if any
    pub fn of(status: Option<&str>) -> Option<StatusGroup> {
        let normalized = normalize_status(status)?;
        Self::ALL
            .into_iter()
            .find(|g| g.matches_normalized(&normalized))
    }
}

/// Uppercased and trimmed status, `None` when blank
pub fn normalize_status(status: Option<&str>) -> Option<String> {
    let trimmed = status?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Dashboard group membership of one status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMembership {
    pub waiting_quote: bool,
    pub in_work: bool,
    pub shipped: bool,
    pub approved: bool,
}

/// Classify a nullable free-text status. Pure and total.
pub fn classify(status: Option<&str>) -> StatusMembership {
    let Some(normalized) = normalize_status(status) else {
        return StatusMembership::default();
    };
    StatusMembership {
        waiting_quote: StatusGroup::WaitingQuote.matches_normalized(&normalized),
        in_work: StatusGroup::InWork.matches_normalized(&normalized),
        shipped: StatusGroup::Shipped.matches_normalized(&normalized),
        approved: StatusGroup::Approved.matches_normalized(&normalized),
    }
}

/// Whether the estimated cost of an order in this status counts as value in work
pub fn counts_toward_value_in_work(status: Option<&str>) -> bool {
    match normalize_status(status) {
        Some(normalized) => !VALUE_EXCLUDED_STATUSES.contains(&normalized.as_str()),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved_prefix_variants() {
        assert!(classify(Some("APPROVED")).approved);
        assert!(classify(Some("approved >>>>")).approved);
        assert!(classify(Some(" Approved  ")).approved);
        assert!(!classify(Some("APPROVE")).approved);
    }

    #[test]
    fn test_case_and_whitespace_invariance() {
        let samples = [
            "waiting quote",
            "In Work",
            "SHIPPED",
            "approved - pending PO",
            "paid",
            "unknown thing",
        ];
        for s in samples {
            let base = classify(Some(s));
            let padded = format!("  {}\t", s);
            assert_eq!(classify(Some(&padded)), base, "padding changed result for {s:?}");
            assert_eq!(classify(Some(&s.to_lowercase())), base, "lowercase changed {s:?}");
            assert_eq!(classify(Some(&s.to_uppercase())), base, "uppercase changed {s:?}");
        }
    }

    #[test]
    fn test_null_and_blank_match_nothing() {
        assert_eq!(classify(None), StatusMembership::default());
        assert_eq!(classify(Some("")), StatusMembership::default());
        assert_eq!(classify(Some("   ")), StatusMembership::default());
        assert_eq!(StatusGroup::of(None), None);
        assert!(!StatusGroup::Archived.matches(Some("  ")));
    }

    #[test]
    fn test_exact_groups_do_not_prefix_match() {
        assert!(classify(Some("SHIPPED")).shipped);
        assert!(!classify(Some("SHIPPED PARTIAL")).shipped);
        assert!(!classify(Some("IN WORKS")).in_work);
    }

    #[test]
    fn test_group_lookup_and_archive() {
        assert_eq!(StatusGroup::of(Some("in transit")), Some(StatusGroup::Shipped));
        assert_eq!(StatusGroup::of(Some("Paid")), Some(StatusGroup::Archived));
        assert_eq!(StatusGroup::of(Some("APPROVED >>>>")), Some(StatusGroup::Approved));
        assert_eq!(StatusGroup::of(Some("on hold")), None);
    }

    #[test]
    fn test_value_exclusions() {
        assert!(!counts_toward_value_in_work(Some(" paid ")));
        assert!(!counts_toward_value_in_work(Some("BER")));
        assert!(!counts_toward_value_in_work(Some("rai")));
        assert!(!counts_toward_value_in_work(Some("Returned")));
        assert!(counts_toward_value_in_work(Some("IN WORK")));
        assert!(counts_toward_value_in_work(None));
    }
}
