//! Grammar of the `/api/queues/{qname}/...` path segments.
//!
//! Queues take `:pause` / `:resume` for POST. Collections are `{state}_tasks`,
//! optionally suffixed with `:{verb}` (`pending_tasks:batch_delete`,
//! `retry_tasks:run_all`). Items are task IDs,
//! suffixed with `:run`, `:archive` or `:cancel` for POST actions. Any
//! combination an operation does not support for that state is "not found".

use qdash_model::{TaskId, TaskOperation, TaskState};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    /// Explicit list of IDs in the request body.
    Batch,
    /// Every task currently in the state.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Collection {
    pub state: TaskState,
    pub action: Option<(TaskOperation, Scope)>,
}

pub(crate) fn parse_collection(segment: &str) -> Result<Collection, ApiError> {
    let (name, verb) = match segment.split_once(':') {
        Some((name, verb)) => (name, Some(verb)),
        None => (segment, None),
    };

    let state = TaskState::from_collection(name).ok_or_else(|| not_found(segment))?;
    let action = match verb {
        None => None,
        Some(verb) => {
            let (op, scope) = collection_verb(verb).ok_or_else(|| not_found(segment))?;
            if !op.allowed_in(state) {
                return Err(not_found(segment));
            }
            Some((op, scope))
        }
    };

    Ok(Collection { state, action })
}

fn collection_verb(verb: &str) -> Option<(TaskOperation, Scope)> {
    use TaskOperation::*;

    let parsed = match verb {
        "batch_delete" => (Delete, Scope::Batch),
        "batch_run" => (Run, Scope::Batch),
        "batch_archive" => (Archive, Scope::Batch),
        "batch_cancel" => (CancelProcessing, Scope::Batch),
        "delete_all" => (Delete, Scope::All),
        "run_all" => (Run, Scope::All),
        "archive_all" => (Archive, Scope::All),
        "cancel_all" => (CancelProcessing, Scope::All),
        _ => return None,
    };
    Some(parsed)
}

/// Parses `{task_id}:{verb}` for single-task POST actions.
pub(crate) fn parse_task_action(
    state: TaskState,
    segment: &str,
) -> Result<(TaskId, TaskOperation), ApiError> {
    let (id, verb) = segment.rsplit_once(':').ok_or_else(|| not_found(segment))?;
    let op = match verb {
        "run" => TaskOperation::Run,
        "archive" => TaskOperation::Archive,
        "cancel" => TaskOperation::CancelProcessing,
        _ => return Err(not_found(segment)),
    };
    if id.is_empty() || !op.allowed_in(state) {
        return Err(not_found(segment));
    }
    Ok((TaskId::from(id), op))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QueueAction {
    Pause,
    Resume,
}

/// Parses `{qname}:{pause|resume}`.
pub(crate) fn parse_queue_action(segment: &str) -> Result<(&str, QueueAction), ApiError> {
    let (queue, verb) = segment.rsplit_once(':').ok_or_else(|| not_found(segment))?;
    let action = match verb {
        "pause" => QueueAction::Pause,
        "resume" => QueueAction::Resume,
        _ => return Err(not_found(segment)),
    };
    if queue.is_empty() {
        return Err(not_found(segment));
    }
    Ok((queue, action))
}

pub(crate) fn parse_task_id(segment: &str) -> Result<TaskId, ApiError> {
    if segment.trim().is_empty() {
        return Err(ApiError::InvalidRequest("task_id cannot be empty".into()));
    }
    Ok(TaskId::from(segment))
}

pub(crate) fn not_found(segment: &str) -> ApiError {
    ApiError::NotFound(format!("no route for {segment:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_collection_has_no_action() {
        let c = parse_collection("retry_tasks").unwrap();
        assert_eq!(c.state, TaskState::Retry);
        assert_eq!(c.action, None);
    }

    #[test]
    fn batch_and_all_verbs() {
        let c = parse_collection("pending_tasks:batch_delete").unwrap();
        assert_eq!(c.action, Some((TaskOperation::Delete, Scope::Batch)));

        let c = parse_collection("active_tasks:cancel_all").unwrap();
        assert_eq!(c.action, Some((TaskOperation::CancelProcessing, Scope::All)));
    }

    #[test]
    fn verbs_are_limited_to_their_states() {
        assert!(parse_collection("active_tasks:batch_delete").is_err());
        assert!(parse_collection("pending_tasks:batch_run").is_err());
        assert!(parse_collection("archived_tasks:archive_all").is_err());
        assert!(parse_collection("retry_tasks:batch_cancel").is_err());
        assert!(parse_collection("completed_tasks:batch_delete").is_ok());
    }

    #[test]
    fn unknown_segments_are_not_found() {
        assert!(matches!(
            parse_collection("dead_tasks"),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            parse_collection("pending_tasks:explode"),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn queue_actions() {
        assert_eq!(
            parse_queue_action("critical:pause").unwrap(),
            ("critical", QueueAction::Pause)
        );
        assert_eq!(
            parse_queue_action("a:b:resume").unwrap(),
            ("a:b", QueueAction::Resume)
        );
        assert!(parse_queue_action("critical").is_err());
        assert!(parse_queue_action(":pause").is_err());
        assert!(parse_queue_action("critical:drain").is_err());
    }

    #[test]
    fn task_actions() {
        let (id, op) = parse_task_action(TaskState::Scheduled, "abc:run").unwrap();
        assert_eq!(id.as_str(), "abc");
        assert_eq!(op, TaskOperation::Run);

        assert!(parse_task_action(TaskState::Active, "abc:cancel").is_ok());
        assert!(parse_task_action(TaskState::Pending, "abc:run").is_err());
        assert!(parse_task_action(TaskState::Pending, "abc").is_err());
        assert!(parse_task_action(TaskState::Pending, ":archive").is_err());
    }
}
