//! Response classification
//!
//! Some non-2xx answers are expected business rejections rather than
//! faults. They are listed in [`SOFT_RULES`] and checked, in order, before
//! the generic status check.

use crate::catalog::Workload;
use orderload_http::ResponseBody;

/// Statuses accepted as success on every endpoint
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// Marker the API puts in rejections caused by a client change on the order
const CLIENT_CHANGED: &str = "client changed";

/// JSON fields that may carry the API's error message
const MESSAGE_FIELDS: [&str; 6] = ["message", "error", "mensagem", "erro", "title", "detail"];

/// Anticipated business rejection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftRejection {
    NoObservation,
    ItemNotFound,
    NotPrintable,
    CloseClientChanged,
    QuantityClientChanged,
}

impl SoftRejection {
    pub fn reason(&self) -> &'static str {
        match self {
            SoftRejection::NoObservation => "no observation for order",
            SoftRejection::ItemNotFound => "item not found in order",
            SoftRejection::NotPrintable => "order cannot be printed",
            SoftRejection::CloseClientChanged => "order cannot be closed, client changed",
            SoftRejection::QuantityClientChanged => "quantity cannot be changed, client changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Soft(SoftRejection),
    /// Status with no matching rule
    Unexpected,
}

#[derive(Debug, Clone, Copy)]
enum BodyPredicate {
    Any,
    /// The extracted error message mentions a client change
    ErrorMessageClientChanged,
    /// The raw body text mentions a client change
    TextClientChanged,
}

impl BodyPredicate {
    fn matches(&self, body: &ResponseBody) -> bool {
        match self {
            BodyPredicate::Any => true,
            BodyPredicate::ErrorMessageClientChanged => {
                contains_ignore_case(&error_message(body), CLIENT_CHANGED)
            }
            BodyPredicate::TextClientChanged => {
                contains_ignore_case(&body.text(), CLIENT_CHANGED)
            }
        }
    }
}

struct SoftRule {
    workloads: &'static [Workload],
    status: u16,
    predicate: BodyPredicate,
    rejection: SoftRejection,
}

const SOFT_RULES: &[SoftRule] = &[
    SoftRule {
        workloads: &[Workload::RecoverObservation],
        status: 404,
        predicate: BodyPredicate::Any,
        rejection: SoftRejection::NoObservation,
    },
    SoftRule {
        workloads: &[Workload::RemoveItem],
        status: 404,
        predicate: BodyPredicate::Any,
        rejection: SoftRejection::ItemNotFound,
    },
    SoftRule {
        workloads: &[Workload::PrintOrder, Workload::PrintRegistrationForm],
        status: 500,
        predicate: BodyPredicate::Any,
        rejection: SoftRejection::NotPrintable,
    },
    SoftRule {
        workloads: &[Workload::CloseOrder],
        status: 400,
        predicate: BodyPredicate::ErrorMessageClientChanged,
        rejection: SoftRejection::CloseClientChanged,
    },
    SoftRule {
        workloads: &[Workload::ChangeQuantity],
        status: 500,
        predicate: BodyPredicate::TextClientChanged,
        rejection: SoftRejection::QuantityClientChanged,
    },
];

/// Classify a response received for `workload`
pub fn classify(workload: Workload, status: u16, body: &ResponseBody) -> Classification {
    let soft = SOFT_RULES.iter().find(|rule| {
        rule.status == status && rule.workloads.contains(&workload) && rule.predicate.matches(body)
    });

    if let Some(rule) = soft {
        return Classification::Soft(rule.rejection);
    }

    if SUCCESS_STATUSES.contains(&status) {
        Classification::Success
    } else {
        Classification::Unexpected
    }
}

/// The API's error message: the first string among the usual JSON fields,
/// otherwise the whole body text
pub fn error_message(body: &ResponseBody) -> String {
    body.json()
        .and_then(|json| {
            MESSAGE_FIELDS
                .iter()
                .find_map(|field| json.get(field).and_then(|v| v.as_str()))
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.text())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> ResponseBody {
        ResponseBody::Text(s.to_string())
    }

    #[test]
    fn test_generic_statuses() {
        for status in SUCCESS_STATUSES {
            assert_eq!(classify(Workload::OrderTotal, status, &text("")), Classification::Success);
        }
        assert_eq!(classify(Workload::OrderTotal, 404, &text("")), Classification::Unexpected);
        assert_eq!(classify(Workload::CreateOrder, 500, &text("")), Classification::Unexpected);
        assert_eq!(classify(Workload::ListOpenOrders, 202, &text("")), Classification::Unexpected);
    }

    #[test]
    fn test_soft_404s_are_endpoint_specific() {
        assert_eq!(
            classify(Workload::RecoverObservation, 404, &text("")),
            Classification::Soft(SoftRejection::NoObservation)
        );
        assert_eq!(
            classify(Workload::RemoveItem, 404, &text("not found")),
            Classification::Soft(SoftRejection::ItemNotFound)
        );
        assert_eq!(classify(Workload::AddItem, 404, &text("")), Classification::Unexpected);
    }

    #[test]
    fn test_print_500_is_soft() {
        for workload in [Workload::PrintOrder, Workload::PrintRegistrationForm] {
            assert_eq!(
                classify(workload, 500, &text("boom")),
                Classification::Soft(SoftRejection::NotPrintable)
            );
        }
        assert_eq!(classify(Workload::PrintOrder, 502, &text("")), Classification::Unexpected);
    }

    #[test]
    fn test_close_requires_client_changed_message() {
        let body = ResponseBody::Json(json!({"message": "Order cannot be closed: Client Changed"}));
        assert_eq!(
            classify(Workload::CloseOrder, 400, &body),
            Classification::Soft(SoftRejection::CloseClientChanged)
        );

        let body = ResponseBody::Json(json!({"erro": "client changed since creation"}));
        assert_eq!(
            classify(Workload::CloseOrder, 400, &body),
            Classification::Soft(SoftRejection::CloseClientChanged)
        );

        let body = ResponseBody::Json(json!({"message": "missing payment condition"}));
        assert_eq!(classify(Workload::CloseOrder, 400, &body), Classification::Unexpected);

        // The marker in a non-message field does not count
        let body = ResponseBody::Json(json!({"message": "bad request", "hint": "client changed"}));
        assert_eq!(classify(Workload::CloseOrder, 400, &body), Classification::Unexpected);
    }

    #[test]
    fn test_change_quantity_matches_raw_text() {
        assert_eq!(
            classify(Workload::ChangeQuantity, 500, &text("System.Exception: client changed")),
            Classification::Soft(SoftRejection::QuantityClientChanged)
        );
        let body = ResponseBody::Json(json!({"detail": {"note": "client changed"}}));
        assert_eq!(
            classify(Workload::ChangeQuantity, 500, &body),
            Classification::Soft(SoftRejection::QuantityClientChanged)
        );
        assert_eq!(
            classify(Workload::ChangeQuantity, 500, &text("timeout")),
            Classification::Unexpected
        );
        assert_eq!(
            classify(Workload::ChangeQuantity, 400, &text("client changed")),
            Classification::Unexpected
        );
    }

    #[test]
    fn test_error_message_extraction() {
        let body = ResponseBody::Json(json!({"title": "Bad Request", "status": 400}));
        assert_eq!(error_message(&body), "Bad Request");
        assert_eq!(error_message(&text("plain")), "plain");
    }
}
