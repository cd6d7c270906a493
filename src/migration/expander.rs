//! Expansion of a STATUS payload into flat RESPONSE records.

use crate::core::{PayloadError, TimeUuid};
use crate::storage::Document;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Groups older than this many whole days are expired.
pub const EXPIRY_THRESHOLD_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseState {
    Done,
    NotDone,
}

impl ResponseState {
    /// `"done"` maps to [`ResponseState::Done`]; anything else is not done.
    pub fn from_status(state: &str) -> Self {
        if state == "done" {
            ResponseState::Done
        } else {
            ResponseState::NotDone
        }
    }

    /// Same mapping for a raw payload value. Non-string states are not done.
    pub fn from_value(state: &Value) -> Self {
        state.as_str().map_or(ResponseState::NotDone, Self::from_status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LifeCycle {
    Active,
    Expired,
}

impl LifeCycle {
    /// Classify a group by the age of its earliest snapshot.
    pub fn for_window(min_snapshot: &TimeUuid, now: DateTime<Utc>) -> Self {
        if age_in_days(min_snapshot, now) > EXPIRY_THRESHOLD_DAYS {
            LifeCycle::Expired
        } else {
            LifeCycle::Active
        }
    }
}

/// Whole days elapsed between the token's timestamp and `now`.
pub fn age_in_days(token: &TimeUuid, now: DateTime<Utc>) -> i64 {
    (now - token.timestamp()).num_days()
}

/// One task's latest state for one user, as stored in a RESPONSE document.
///
/// Fields copied from the STATUS payload keep whatever JSON value they had
/// there; only `state` is normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    pub version: Value,
    pub alias: Value,
    pub deploy_id: Value,
    pub task_id: String,
    pub reason_id: Value,
    pub state: ResponseState,
    pub remark: Value,
    pub viewed: bool,
    pub update_date: Value,
    pub life_cycle: LifeCycle,
}

// A present `null` is a value, not a missing key, so these stay `Value`
// rather than `Option<Value>`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusPayload {
    version: Value,
    alias: Value,
    deploy_id: Value,
    actions: Map<String, Value>,
}

#[derive(Deserialize)]
struct ActionStates {
    states: Option<Vec<Value>>,
}

/// Fields shared by every response of one document.
#[derive(Debug)]
struct PayloadHeader {
    document_id: String,
    version: Value,
    alias: Value,
    deploy_id: Value,
    life_cycle: LifeCycle,
}

/// Parse the latest document of a group and return its responses.
///
/// The top-level payload is validated here; each leaf state is validated as
/// the returned iterator reaches it.
pub fn expand_responses(
    latest: &Document,
    min_snapshot: &TimeUuid,
    now: DateTime<Utc>,
) -> Result<ResponseIter, PayloadError> {
    let payload: StatusPayload =
        serde_json::from_str(&latest.content).map_err(|e| PayloadError::Malformed {
            document_id: latest.document_id.clone(),
            reason: e.to_string(),
        })?;

    let header = PayloadHeader {
        document_id: latest.document_id.clone(),
        version: payload.version,
        alias: payload.alias,
        deploy_id: payload.deploy_id,
        life_cycle: LifeCycle::for_window(min_snapshot, now),
    };

    Ok(ResponseIter {
        header,
        actions: payload.actions.into_iter(),
        current: None,
        failed: false,
    })
}

/// Responses of one STATUS document in payload order.
///
/// Yields one item per leaf state. After the first error the iterator is
/// exhausted.
pub struct ResponseIter {
    header: PayloadHeader,
    actions: serde_json::map::IntoIter,
    current: Option<(String, std::vec::IntoIter<Value>)>,
    failed: bool,
}

impl ResponseIter {
    pub fn life_cycle(&self) -> LifeCycle {
        self.header.life_cycle
    }

    fn fail(&mut self, err: PayloadError) -> Option<Result<ResponseRecord, PayloadError>> {
        self.failed = true;
        Some(Err(err))
    }

    fn malformed(&self, action_id: &str, reason: impl std::fmt::Display) -> PayloadError {
        PayloadError::Malformed {
            document_id: self.header.document_id.clone(),
            reason: format!("action '{}': {}", action_id, reason),
        }
    }

    fn missing(&self, action_id: &str, field: &'static str) -> PayloadError {
        PayloadError::MissingField {
            document_id: self.header.document_id.clone(),
            action_id: action_id.to_string(),
            field,
        }
    }

    fn build(&self, action_id: &str, leaf: Value) -> Result<ResponseRecord, PayloadError> {
        let mut leaf = match leaf {
            Value::Object(fields) => fields,
            other => {
                let reason = format!("expected a state object, got {}", other);
                return Err(self.malformed(action_id, reason));
            }
        };
        let state = leaf
            .remove("state")
            .ok_or_else(|| self.missing(action_id, "state"))?;
        let reason_id = leaf
            .remove("reasonId")
            .ok_or_else(|| self.missing(action_id, "reasonId"))?;
        let update_date = leaf
            .remove("updateDate")
            .ok_or_else(|| self.missing(action_id, "updateDate"))?;
        let remark = leaf
            .remove("remark")
            .unwrap_or_else(|| Value::String(String::new()));

        Ok(ResponseRecord {
            version: self.header.version.clone(),
            alias: self.header.alias.clone(),
            deploy_id: self.header.deploy_id.clone(),
            task_id: action_id.to_string(),
            reason_id,
            state: ResponseState::from_value(&state),
            remark,
            viewed: true,
            update_date,
            life_cycle: self.header.life_cycle,
        })
    }
}

impl Iterator for ResponseIter {
    type Item = Result<ResponseRecord, PayloadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            if let Some((action_id, states)) = &mut self.current {
                if let Some(leaf) = states.next() {
                    let action_id = action_id.clone();
                    return match self.build(&action_id, leaf) {
                        Ok(record) => Some(Ok(record)),
                        Err(err) => self.fail(err),
                    };
                }
            }

            let (action_id, action) = self.actions.next()?;
            let states = match serde_json::from_value::<ActionStates>(action) {
                Ok(ActionStates { states: Some(states) }) => states,
                Ok(ActionStates { states: None }) => {
                    let err = self.missing(&action_id, "states");
                    return self.fail(err);
                }
                Err(e) => {
                    let err = self.malformed(&action_id, e);
                    return self.fail(err);
                }
            };
            self.current = Some((action_id, states.into_iter()));
        }
    }
}
