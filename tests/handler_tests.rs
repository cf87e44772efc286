use chrono::{TimeZone, Utc};

use tailgate_schedule_sync::handler::{Request, Response};
use tailgate_schedule_sync::model::sync_log::SyncSummary;
use tailgate_schedule_sync::trigger::{Trigger, TriggerOutcome};

#[test]
fn serde_trigger_lowercase() {
    let t: Trigger = serde_json::from_str("\"daily\"").unwrap();
    assert_eq!(t, Trigger::Daily);
    let t2: Trigger = serde_json::from_str("\"live\"").unwrap();
    assert_eq!(t2, Trigger::Live);
    assert!(serde_json::from_str::<Trigger>("\"hourly\"").is_err());
}

#[test]
fn request_defaults_to_daily_trigger() {
    // EventBridge scheduled events arrive without our payload
    let json = serde_json::json!({
        "version": "0",
        "detail-type": "Scheduled Event",
        "source": "aws.events",
        "detail": {}
    });
    let req: Request = serde_json::from_value(json).unwrap();
    assert_eq!(req.trigger, Trigger::Daily);

    let req2: Request = serde_json::from_value(serde_json::json!({ "trigger": "live" })).unwrap();
    assert_eq!(req2.trigger, Trigger::Live);
}

#[test]
fn response_carries_summary_when_run() {
    let summary = SyncSummary {
        updated: 2,
        added: 1,
        errors: vec!["game 2025-09-27 vs Kansas was deleted before it could be updated".to_string()],
        timestamp: Utc.with_ymd_and_hms(2025, 10, 12, 11, 0, 0).unwrap(),
    };
    let resp = Response::from_outcome(Trigger::Daily, TriggerOutcome::Ran(summary.clone()));
    assert_eq!(resp.message, "Daily sync: 2 updated, 1 added, 1 errors");
    assert_eq!(resp.summary, Some(summary));

    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["summary"]["updated"], 2);
    assert_eq!(json["summary"]["timestamp"], "2025-10-12T11:00:00Z");
}

#[test]
fn skipped_response_has_no_summary() {
    let resp = Response::from_outcome(Trigger::Live, TriggerOutcome::Skipped("Outside game hours".to_string()));
    assert_eq!(resp.message, "Outside game hours");
    let json = serde_json::to_value(&resp).unwrap();
    assert!(json.get("summary").is_none());
}
