//! Building responses and aggregating results.

use crate::types::{
    Condition, ConditionStatus, FnResult, Request, Response, ResponseMeta, Severity, Target,
    format_ttl,
};
use std::time::Duration;

/// Condition type reporting whether the function succeeded.
pub const SUCCESS_CONDITION: &str = "FunctionSuccess";

impl Response {
    /// Start a response for `req`.
    ///
    /// The desired state and context are copied through unchanged; a
    /// function only overwrites what it actually modifies.
    pub fn to(req: &Request, ttl: Duration) -> Self {
        Self {
            meta: ResponseMeta {
                tag: req.meta.tag.clone(),
                ttl: format_ttl(ttl),
            },
            desired: req.desired.clone(),
            results: Vec::new(),
            requirements: Default::default(),
            conditions: Vec::new(),
            context: req.context.clone(),
        }
    }

    /// Append a result and return it for further targeting.
    pub fn push_result(&mut self, severity: Severity, message: impl Into<String>) -> &mut FnResult {
        self.results.push(FnResult {
            severity,
            message: message.into(),
            reason: None,
            target: Some(Target::Composite),
        });
        let last = self.results.len() - 1;
        &mut self.results[last]
    }

    /// Append a normal result.
    pub fn normal(&mut self, message: impl Into<String>) -> &mut FnResult {
        self.push_result(Severity::Normal, message)
    }

    /// Append a warning result.
    pub fn warning(&mut self, message: impl Into<String>) -> &mut FnResult {
        self.push_result(Severity::Warning, message)
    }

    /// Append a fatal result.
    pub fn fatal(&mut self, message: impl Into<String>) -> &mut FnResult {
        self.push_result(Severity::Fatal, message)
    }

    /// Set a condition, replacing any existing condition of the same type.
    pub fn set_condition(
        &mut self,
        condition_type: &str,
        status: impl Into<ConditionStatus>,
        reason: &str,
        message: Option<String>,
        target: Target,
    ) {
        self.conditions.retain(|c| c.r#type != condition_type);
        self.conditions.push(Condition {
            r#type: condition_type.to_string(),
            status: status.into(),
            reason: reason.to_string(),
            message,
            target: Some(target),
        });
    }

    /// Highest severity recorded so far, if any result exists.
    pub fn worst_severity(&self) -> Option<Severity> {
        self.results.iter().map(|r| r.severity).max()
    }

    /// Whether a fatal result was recorded.
    pub fn is_fatal(&self) -> bool {
        self.worst_severity() == Some(Severity::Fatal)
    }
}

/// Summarize the results of a completed invocation.
///
/// Any non-normal result turns the outcome into "processed with warnings"
/// with a false success condition on composite and claim; otherwise the
/// invocation is reported as fully successful.
pub fn finalize(rsp: &mut Response, processed: usize) {
    let warnings = rsp
        .results
        .iter()
        .filter(|r| r.severity != Severity::Normal)
        .count();

    if warnings > 0 {
        let message = format!(
            "Processed {processed} resource(s) with {warnings} warning(s); unresolved fields were left unchanged"
        );
        rsp.warning("Processed with warnings")
            .with_reason("ProcessedWithWarnings")
            .target_composite_and_claim();
        rsp.set_condition(
            SUCCESS_CONDITION,
            false,
            "ProcessedWithWarnings",
            Some(message),
            Target::CompositeAndClaim,
        );
    } else {
        rsp.normal(format!("Successfully processed {processed} resource(s)"));
        rsp.set_condition(
            SUCCESS_CONDITION,
            true,
            "Success",
            None,
            Target::CompositeAndClaim,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DEFAULT_TTL, Resource};
    use serde_json::json;

    fn request() -> Request {
        let mut req = Request::default();
        req.meta.tag = "t1".to_string();
        req.desired.resources.insert(
            "shift".to_string(),
            Resource::new(json!({"kind": "OnCallShift"})),
        );
        req
    }

    #[test]
    fn test_to_copies_desired_and_tag() {
        let req = request();
        let rsp = Response::to(&req, DEFAULT_TTL);
        assert_eq!(rsp.meta.tag, "t1");
        assert_eq!(rsp.meta.ttl, "60s");
        assert_eq!(rsp.desired, req.desired);
        assert!(rsp.results.is_empty());
    }

    #[test]
    fn test_warning_targets_claim() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        rsp.warning("team not found").target_composite_and_claim();
        assert_eq!(rsp.results[0].severity, Severity::Warning);
        assert_eq!(rsp.results[0].target, Some(Target::CompositeAndClaim));
    }

    #[test]
    fn test_worst_severity() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        assert_eq!(rsp.worst_severity(), None);
        rsp.normal("ok");
        rsp.warning("meh");
        assert_eq!(rsp.worst_severity(), Some(Severity::Warning));
        assert!(!rsp.is_fatal());
        rsp.fatal("boom");
        assert!(rsp.is_fatal());
    }

    #[test]
    fn test_set_condition_replaces_same_type() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        rsp.set_condition(SUCCESS_CONDITION, true, "Success", None, Target::Composite);
        rsp.set_condition(SUCCESS_CONDITION, false, "Broken", None, Target::Composite);
        assert_eq!(rsp.conditions.len(), 1);
        assert_eq!(rsp.conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn test_finalize_success() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        finalize(&mut rsp, 1);
        assert_eq!(rsp.worst_severity(), Some(Severity::Normal));
        assert_eq!(rsp.conditions[0].status, ConditionStatus::True);
        assert_eq!(rsp.conditions[0].reason, "Success");
    }

    #[test]
    fn test_finalize_with_warnings() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        rsp.warning("team payments not found").target_composite_and_claim();
        finalize(&mut rsp, 1);

        let summary = rsp.results.last().unwrap();
        assert_eq!(summary.message, "Processed with warnings");
        assert_eq!(summary.target, Some(Target::CompositeAndClaim));

        let condition = &rsp.conditions[0];
        assert_eq!(condition.r#type, SUCCESS_CONDITION);
        assert_eq!(condition.status, ConditionStatus::False);
        assert_eq!(condition.target, Some(Target::CompositeAndClaim));
        assert!(condition.message.as_deref().unwrap().contains("1 warning"));
    }

    #[test]
    fn test_response_serializes_wire_names() {
        let mut rsp = Response::to(&request(), DEFAULT_TTL);
        rsp.fatal("bad").target_composite_and_claim();
        let value = serde_json::to_value(&rsp).unwrap();
        assert_eq!(value["results"][0]["severity"], json!("SEVERITY_FATAL"));
        assert_eq!(value["meta"]["ttl"], json!("60s"));
        assert!(value.get("requirements").is_none());
    }
}
